use crate::analyzer::CandleAnalyzer;
use crate::candle::Candle;
use crate::candle_store::CandleStore;
use crate::config::IndicatorConfig;
use crate::fusion::{StrengthAccumulator, majority_ladder};
use crate::indicator::IndicatorError;
use crate::indicator::utils::{IndicatorSnapshot, IndicatorSnapshotBuilder};
use crate::model::{Direction, LeafOpinion};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// 기술적 레이어 내부 점수 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TechnicalScoring {
    /// RSI, MACD, EMA 세 표를 다수결로 집계
    #[default]
    MajorityCount,
    /// RSI, MACD, EMA, 볼린저 밴드를 순서대로 강도 누적
    StrengthAccumulation,
}

/// 지표별 방향 표
///
/// 조건에 해당하지 않는 지표는 Hold로 기권합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TechnicalVotes {
    pub rsi: Direction,
    pub macd: Direction,
    pub ema: Direction,
    pub bband: Direction,
}

impl TechnicalVotes {
    pub fn from_snapshot(snapshot: &IndicatorSnapshot, overbought: f64, oversold: f64) -> Self {
        let rsi = if snapshot.rsi.is_oversold(oversold) {
            Direction::Buy
        } else if snapshot.rsi.is_overbought(overbought) {
            Direction::Sell
        } else {
            Direction::Hold
        };

        let macd = if snapshot.macd.is_above_signal() {
            Direction::Buy
        } else if snapshot.macd.is_below_signal() {
            Direction::Sell
        } else {
            Direction::Hold
        };

        let (short, long) = (snapshot.ema_short_value(), snapshot.ema_long_value());
        let ema = if short > long {
            Direction::Buy
        } else if short < long {
            Direction::Sell
        } else {
            Direction::Hold
        };

        let bband = if snapshot.bband.is_below_lower(snapshot.close) {
            Direction::Buy
        } else if snapshot.bband.is_above_upper(snapshot.close) {
            Direction::Sell
        } else {
            Direction::Hold
        };

        TechnicalVotes {
            rsi,
            macd,
            ema,
            bband,
        }
    }
}

impl TechnicalScoring {
    /// 표를 하나의 의견으로 축약합니다.
    pub fn reduce(&self, votes: &TechnicalVotes) -> LeafOpinion {
        match self {
            TechnicalScoring::MajorityCount => {
                let ballots = [votes.rsi, votes.macd, votes.ema];
                let bullish = ballots.iter().filter(|d| **d == Direction::Buy).count();
                let bearish = ballots.iter().filter(|d| **d == Direction::Sell).count();
                majority_ladder(bullish, bearish)
            }
            TechnicalScoring::StrengthAccumulation => {
                let mut acc = StrengthAccumulator::new();
                for vote in [votes.rsi, votes.macd, votes.ema, votes.bband] {
                    acc.push(vote);
                }
                acc.opinion()
            }
        }
    }
}

/// 기술적 지표 분석기
#[derive(Debug)]
pub struct TechnicalAnalyzer<C: Candle> {
    builder: IndicatorSnapshotBuilder<C>,
    overbought: f64,
    oversold: f64,
    scoring: TechnicalScoring,
}

impl<C: Candle> TechnicalAnalyzer<C> {
    pub fn new(config: &IndicatorConfig) -> Self {
        TechnicalAnalyzer {
            builder: IndicatorSnapshotBuilder::new(config),
            overbought: config.rsi_overbought,
            oversold: config.rsi_oversold,
            scoring: config.scoring,
        }
    }

    /// 의견을 내기 위해 필요한 최소 캔들 수
    pub fn lookback(&self) -> usize {
        self.builder.lookback()
    }

    /// 지표 스냅샷 계산
    pub fn snapshot(&self, storage: &CandleStore<C>) -> Result<IndicatorSnapshot, IndicatorError> {
        self.builder.from_storage(storage)
    }

    /// 이미 계산된 스냅샷으로 의견 생성
    pub fn opinion_from_snapshot(&self, snapshot: &IndicatorSnapshot) -> LeafOpinion {
        let votes = TechnicalVotes::from_snapshot(snapshot, self.overbought, self.oversold);
        let opinion = self.scoring.reduce(&votes);
        debug!("기술적 분석: {} → {:?} → {}", snapshot, votes, opinion);
        opinion
    }
}

impl<C: Candle> CandleAnalyzer<C> for TechnicalAnalyzer<C> {
    fn name(&self) -> &'static str {
        "technical"
    }

    fn analyze(&self, storage: &CandleStore<C>) -> LeafOpinion {
        match self.snapshot(storage) {
            Ok(snapshot) => self.opinion_from_snapshot(&snapshot),
            Err(e) => {
                warn!("기술적 분석 불가: {}", e);
                LeafOpinion::neutral()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Confidence;

    fn votes(rsi: Direction, macd: Direction, ema: Direction, bband: Direction) -> TechnicalVotes {
        TechnicalVotes {
            rsi,
            macd,
            ema,
            bband,
        }
    }

    #[test]
    fn test_majority_count_ignores_bband() {
        let v = votes(Direction::Hold, Direction::Buy, Direction::Hold, Direction::Buy);
        assert_eq!(
            TechnicalScoring::MajorityCount.reduce(&v),
            LeafOpinion::new(Direction::Buy, Confidence::Medium)
        );

        let tie = votes(Direction::Sell, Direction::Buy, Direction::Hold, Direction::Hold);
        assert_eq!(
            TechnicalScoring::MajorityCount.reduce(&tie),
            LeafOpinion::neutral()
        );
    }

    #[test]
    fn test_strength_accumulation_counts_bband() {
        let v = votes(Direction::Hold, Direction::Sell, Direction::Buy, Direction::Sell);
        assert_eq!(
            TechnicalScoring::StrengthAccumulation.reduce(&v),
            LeafOpinion::new(Direction::Sell, Confidence::Medium)
        );

        let all = votes(Direction::Buy, Direction::Buy, Direction::Buy, Direction::Hold);
        assert_eq!(
            TechnicalScoring::StrengthAccumulation.reduce(&all),
            LeafOpinion::new(Direction::Buy, Confidence::High)
        );

        let lone = votes(Direction::Hold, Direction::Hold, Direction::Hold, Direction::Buy);
        assert_eq!(
            TechnicalScoring::StrengthAccumulation.reduce(&lone),
            LeafOpinion::neutral()
        );
    }
}
