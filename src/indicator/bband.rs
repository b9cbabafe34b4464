use crate::candle::Candle;
use crate::indicator::utils::moving_average;
use crate::indicator::{IndicatorError, TABuilder, checked_closes};
use std::fmt::{Debug, Display};
use std::marker::PhantomData;

/// 표준편차 계산 함수 (모표준편차, 마지막 period개 기준)
fn calculate_standard_deviation(values: &[f64], period: usize) -> f64 {
    if values.len() < period || period == 0 {
        return 0.0;
    }

    let slice = &values[values.len() - period..];
    let mean = slice.iter().sum::<f64>() / period as f64;

    let variance = slice
        .iter()
        .map(|&x| {
            let diff = x - mean;
            diff * diff
        })
        .sum::<f64>()
        / period as f64;

    variance.sqrt()
}

/// 볼린저 밴드 계산 빌더
///
/// 볼린저 밴드는 가격의 변동성을 측정하는 기술적 지표로,
/// 이동평균선과 그 주변의 표준편차 기반 밴드로 구성됩니다.
#[derive(Debug)]
pub struct BollingerBandsBuilder<C: Candle> {
    /// 계산 기간
    period: usize,
    /// 표준편차 승수
    multiplier: f64,
    _phantom: PhantomData<C>,
}

/// 볼린저 밴드 기술적 지표
///
/// 상단, 중간, 하단 밴드로 구성된 볼린저 밴드 값
#[derive(Clone, Debug)]
pub struct BollingerBands {
    pub middle: f64,
    pub upper: f64,
    pub lower: f64,
    /// 계산 기간
    period: usize,
    /// 표준편차 승수
    multiplier: f64,
}

impl BollingerBands {
    /// 현재 밴드폭 계산
    ///
    /// # Returns
    /// * `f64` - 밴드폭 (상단 - 하단) / 중간
    pub fn bandwidth(&self) -> f64 {
        if self.middle.abs() < f64::EPSILON {
            return 0.0;
        }
        (self.upper - self.lower) / self.middle
    }

    /// 가격의 상대적 위치 계산 (%B)
    ///
    /// # Returns
    /// * `f64` - 상대적 위치 (0: 하단 밴드, 0.5: 중간 밴드, 1: 상단 밴드)
    pub fn percent_b(&self, price: f64) -> f64 {
        let range = self.upper - self.lower;
        if range.abs() < f64::EPSILON {
            return 0.5;
        }

        (price - self.lower) / range
    }

    /// 가격이 상단 밴드를 돌파했는지
    pub fn is_above_upper(&self, price: f64) -> bool {
        price > self.upper
    }

    /// 가격이 하단 밴드를 이탈했는지
    pub fn is_below_lower(&self, price: f64) -> bool {
        price < self.lower
    }
}

impl Display for BollingerBands {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BB({},{}: {:.2}, {:.2}, {:.2})",
            self.period, self.multiplier, self.middle, self.upper, self.lower
        )
    }
}

impl<C> BollingerBandsBuilder<C>
where
    C: Candle,
{
    /// 새 볼린저 밴드 빌더 생성
    ///
    /// # Arguments
    /// * `period` - 계산 기간 (일반적으로 20)
    /// * `multiplier` - 표준편차 승수 (일반적으로 2.0)
    ///
    /// # Panics
    /// * 유효하지 않은 매개변수가 제공되면 패닉 발생
    pub fn new(period: usize, multiplier: f64) -> Self {
        if period == 0 {
            panic!("볼린저 밴드 기간은 0보다 커야 합니다");
        }

        if multiplier <= 0.0 {
            panic!("볼린저 밴드 승수는 0보다 커야 합니다");
        }

        Self {
            period,
            multiplier,
            _phantom: PhantomData,
        }
    }
}

impl<C> TABuilder<BollingerBands, C> for BollingerBandsBuilder<C>
where
    C: Candle,
{
    fn lookback(&self) -> usize {
        self.period
    }

    fn build(&self, data: &[C]) -> Result<BollingerBands, IndicatorError> {
        let values = checked_closes("BBand", data, self.lookback())?;

        let middle = moving_average::last_sma(&values, self.period)?;
        let std_dev = calculate_standard_deviation(&values, self.period);

        Ok(BollingerBands {
            middle,
            upper: middle + std_dev * self.multiplier,
            lower: middle - std_dev * self.multiplier,
            period: self.period,
            multiplier: self.multiplier,
        })
    }
}
