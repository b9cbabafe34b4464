use crate::config::FusionConfig;
use crate::model::{Confidence, Direction, LeafOpinion, LeafOpinions};
use log::debug;
use serde::{Deserialize, Serialize};

/// 세 레이어의 의견을 하나로 합치는 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FusionPolicy {
    /// 기준 신뢰도 이상인 레이어 수로 다수결
    #[default]
    MajorityOfThree,
    /// 첫 결정 방향에 동의하는 레이어 수를 누적
    StrengthAccumulation,
}

/// 강세/약세 카운트를 다수결 규칙으로 (방향, 신뢰도)로 변환합니다.
///
/// * 2개 이상 동의 → High
/// * 한쪽만 1개 → Medium
/// * 1대1 동률이나 아무것도 없으면 → (Hold, None)
pub fn majority_ladder(bullish: usize, bearish: usize) -> LeafOpinion {
    if bullish >= 2 {
        LeafOpinion::new(Direction::Buy, Confidence::High)
    } else if bearish >= 2 {
        LeafOpinion::new(Direction::Sell, Confidence::High)
    } else if bullish == 1 && bearish == 0 {
        LeafOpinion::new(Direction::Buy, Confidence::Medium)
    } else if bearish == 1 && bullish == 0 {
        LeafOpinion::new(Direction::Sell, Confidence::Medium)
    } else {
        LeafOpinion::neutral()
    }
}

/// 강도 누적기
///
/// 처음 들어온 방향이 결정되고, 같은 방향이 들어올 때마다 강도가 1씩 오릅니다.
/// 반대 방향은 무시됩니다. 결정한 체크 자체가 강도 1로 계산됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrengthAccumulator {
    direction: Direction,
    strength: u32,
}

impl Default for StrengthAccumulator {
    fn default() -> Self {
        StrengthAccumulator {
            direction: Direction::Hold,
            strength: 0,
        }
    }
}

impl StrengthAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 체크 결과 하나를 반영합니다. Hold는 아무 영향이 없습니다.
    pub fn push(&mut self, direction: Direction) {
        if !direction.is_actionable() {
            return;
        }

        if self.direction == Direction::Hold {
            self.direction = direction;
            self.strength = 1;
        } else if self.direction == direction {
            self.strength += 1;
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn strength(&self) -> u32 {
        self.strength
    }

    /// 강도 3 이상 High, 2 Medium, 그 외는 (Hold, None)
    pub fn opinion(&self) -> LeafOpinion {
        match self.strength {
            s if s >= 3 => LeafOpinion::new(self.direction, Confidence::High),
            2 => LeafOpinion::new(self.direction, Confidence::Medium),
            _ => LeafOpinion::neutral(),
        }
    }
}

/// 신호 융합 엔진
///
/// 상태가 없으므로 같은 입력에 대해 항상 같은 결과를 돌려줍니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalFusion {
    policy: FusionPolicy,
    count_floor: Confidence,
}

impl Default for SignalFusion {
    fn default() -> Self {
        SignalFusion::new(FusionPolicy::MajorityOfThree, Confidence::Medium)
    }
}

impl SignalFusion {
    /// # Arguments
    /// * `policy` - 융합 방식
    /// * `count_floor` - 집계에 포함되기 위한 레이어의 최소 신뢰도
    pub fn new(policy: FusionPolicy, count_floor: Confidence) -> Self {
        SignalFusion {
            policy,
            count_floor,
        }
    }

    pub fn from_config(config: &FusionConfig) -> Self {
        Self::new(config.policy, config.count_floor)
    }

    pub fn policy(&self) -> FusionPolicy {
        self.policy
    }

    fn counts(&self, opinion: &LeafOpinion) -> bool {
        opinion.direction.is_actionable() && opinion.confidence >= self.count_floor
    }

    /// 세 레이어의 의견을 하나의 (방향, 신뢰도)로 합칩니다.
    pub fn fuse(&self, opinions: &LeafOpinions) -> LeafOpinion {
        let counted = opinions
            .as_array()
            .into_iter()
            .filter(|opinion| self.counts(opinion));

        let fused = match self.policy {
            FusionPolicy::MajorityOfThree => {
                let (bullish, bearish) =
                    counted.fold((0, 0), |(bull, bear), opinion| match opinion.direction {
                        Direction::Buy => (bull + 1, bear),
                        Direction::Sell => (bull, bear + 1),
                        Direction::Hold => (bull, bear),
                    });
                majority_ladder(bullish, bearish)
            }
            FusionPolicy::StrengthAccumulation => {
                let mut acc = StrengthAccumulator::new();
                counted.for_each(|opinion| acc.push(opinion.direction));
                acc.opinion()
            }
        };

        debug!("융합 결과: {} ← {}", fused, opinions);
        fused
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(direction: Direction, confidence: Confidence) -> LeafOpinion {
        LeafOpinion::new(direction, confidence)
    }

    #[test]
    fn test_majority_ladder() {
        assert_eq!(majority_ladder(3, 0), op(Direction::Buy, Confidence::High));
        assert_eq!(majority_ladder(2, 1), op(Direction::Buy, Confidence::High));
        assert_eq!(majority_ladder(0, 2), op(Direction::Sell, Confidence::High));
        assert_eq!(majority_ladder(1, 0), op(Direction::Buy, Confidence::Medium));
        assert_eq!(majority_ladder(0, 1), op(Direction::Sell, Confidence::Medium));
        assert_eq!(majority_ladder(1, 1), LeafOpinion::neutral());
        assert_eq!(majority_ladder(0, 0), LeafOpinion::neutral());
    }

    #[test]
    fn test_accumulator_first_decider_wins() {
        let mut acc = StrengthAccumulator::new();
        acc.push(Direction::Hold);
        acc.push(Direction::Sell);
        acc.push(Direction::Buy);
        acc.push(Direction::Buy);
        assert_eq!(acc.direction(), Direction::Sell);
        assert_eq!(acc.strength(), 1);
        assert_eq!(acc.opinion(), LeafOpinion::neutral());

        acc.push(Direction::Sell);
        assert_eq!(acc.opinion(), op(Direction::Sell, Confidence::Medium));
        acc.push(Direction::Sell);
        assert_eq!(acc.opinion(), op(Direction::Sell, Confidence::High));
    }

    #[test]
    fn test_strict_floor_ignores_medium_leaves() {
        let fusion = SignalFusion::new(FusionPolicy::MajorityOfThree, Confidence::High);
        let opinions = LeafOpinions::new(
            op(Direction::Buy, Confidence::Medium),
            op(Direction::Buy, Confidence::Medium),
            op(Direction::Sell, Confidence::High),
        );
        assert_eq!(fusion.fuse(&opinions), op(Direction::Sell, Confidence::Medium));
    }

    #[test]
    fn test_strength_policy_at_top_level() {
        let fusion = SignalFusion::new(FusionPolicy::StrengthAccumulation, Confidence::Medium);

        let agree = LeafOpinions::new(
            op(Direction::Buy, Confidence::High),
            op(Direction::Buy, Confidence::Medium),
            op(Direction::Hold, Confidence::None),
        );
        assert_eq!(fusion.fuse(&agree), op(Direction::Buy, Confidence::Medium));

        let single = LeafOpinions::new(
            op(Direction::Hold, Confidence::None),
            op(Direction::Sell, Confidence::High),
            op(Direction::Hold, Confidence::None),
        );
        assert_eq!(fusion.fuse(&single), LeafOpinion::neutral());
    }
}
