use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display};

/// 트레이딩 신호 방향
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// 매수 신호
    Buy,
    /// 매도 신호
    Sell,
    /// 관망 (의견 없음)
    Hold,
}

impl Direction {
    /// Hold가 아닌 실제 방향성이 있는 신호인지 확인
    pub fn is_actionable(&self) -> bool {
        !matches!(self, Direction::Hold)
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Buy => write!(f, "Buy"),
            Direction::Sell => write!(f, "Sell"),
            Direction::Hold => write!(f, "Hold"),
        }
    }
}

/// 신호 신뢰도
///
/// 선언 순서대로 대소 비교가 가능합니다: `None < Low < Medium < High`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Confidence {
    None,
    Low,
    Medium,
    High,
}

impl Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Confidence::None => write!(f, "None"),
            Confidence::Low => write!(f, "Low"),
            Confidence::Medium => write!(f, "Medium"),
            Confidence::High => write!(f, "High"),
        }
    }
}

/// 분석 레이어 하나가 내놓은 (방향, 신뢰도) 의견
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LeafOpinion {
    pub direction: Direction,
    pub confidence: Confidence,
}

impl LeafOpinion {
    pub fn new(direction: Direction, confidence: Confidence) -> Self {
        LeafOpinion {
            direction,
            confidence,
        }
    }

    /// 데이터가 없거나 계산에 실패한 레이어의 의견 (Hold, None)
    pub fn neutral() -> Self {
        LeafOpinion::new(Direction::Hold, Confidence::None)
    }

    pub fn is_neutral(&self) -> bool {
        self.direction == Direction::Hold
    }
}

impl Default for LeafOpinion {
    fn default() -> Self {
        LeafOpinion::neutral()
    }
}

impl Display for LeafOpinion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.direction, self.confidence)
    }
}

/// 세 분석 레이어의 의견 묶음
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LeafOpinions {
    pub technical: LeafOpinion,
    pub pattern: LeafOpinion,
    pub sentiment: LeafOpinion,
}

impl LeafOpinions {
    pub fn new(technical: LeafOpinion, pattern: LeafOpinion, sentiment: LeafOpinion) -> Self {
        LeafOpinions {
            technical,
            pattern,
            sentiment,
        }
    }

    /// technical → pattern → sentiment 순서의 의견 배열
    pub fn as_array(&self) -> [LeafOpinion; 3] {
        [self.technical, self.pattern, self.sentiment]
    }
}

impl Display for LeafOpinions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Technical={}, Pattern={}, Sentiment={}",
            self.technical, self.pattern, self.sentiment
        )
    }
}

/// 융합 엔진이 만든 최종 신호
///
/// 분석할 때마다 새로 만들어지며 이후 변경되지 않습니다.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FusedSignal {
    pub symbol: String,
    pub direction: Direction,
    pub confidence: Confidence,
    pub price: f64,
    pub timestamp: DateTime<Utc>,
}

impl FusedSignal {
    pub fn new(
        symbol: impl Into<String>,
        direction: Direction,
        confidence: Confidence,
        price: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        FusedSignal {
            symbol: symbol.into(),
            direction,
            confidence,
            price,
            timestamp,
        }
    }
}

impl Display for FusedSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}({}) @ {:.4}",
            self.symbol, self.direction, self.confidence, self.price
        )
    }
}

/// 알림 수신자 식별자 (채팅방 ID)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecipientId(pub i64);

impl Display for RecipientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_ordering() {
        assert!(Confidence::None < Confidence::Low);
        assert!(Confidence::Low < Confidence::Medium);
        assert!(Confidence::Medium < Confidence::High);
        assert_eq!(
            [Confidence::High, Confidence::None, Confidence::Medium]
                .iter()
                .max(),
            Some(&Confidence::High)
        );
    }

    #[test]
    fn test_neutral_opinion() {
        let opinion = LeafOpinion::default();
        assert!(opinion.is_neutral());
        assert_eq!(opinion.confidence, Confidence::None);
        assert!(!opinion.direction.is_actionable());
    }
}
