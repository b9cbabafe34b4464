use crate::candle::Candle;
use crate::indicator::ma::MA;
use crate::indicator::utils::moving_average;
use crate::indicator::{IndicatorError, TABuilder, checked_closes};
use std::fmt::Display;
use std::marker::PhantomData;

/// 지수이동평균(EMA) 계산 빌더
///
/// 지수이동평균은 최근 데이터에 더 높은 가중치를 부여하는 이동평균입니다.
#[derive(Debug)]
pub struct EMABuilder<C: Candle> {
    /// EMA 계산 기간
    pub period: usize,
    _phantom: PhantomData<C>,
}

/// 지수이동평균(EMA) 기술적 지표
#[derive(Clone, Debug)]
pub struct EMA {
    period: usize,
    ema: f64,
}

impl Display for EMA {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EMA({}: {:.2})", self.period, self.ema)
    }
}

impl MA for EMA {
    fn get(&self) -> f64 {
        self.ema
    }

    fn period(&self) -> usize {
        self.period
    }
}

impl<C> EMABuilder<C>
where
    C: Candle,
{
    /// 새 EMA 빌더 생성
    ///
    /// # Panics
    /// * 기간이 0이면 패닉 발생
    pub fn new(period: usize) -> Self {
        if period == 0 {
            panic!("EMA 기간은 0보다 커야 합니다");
        }

        EMABuilder {
            period,
            _phantom: PhantomData,
        }
    }
}

impl<C> TABuilder<EMA, C> for EMABuilder<C>
where
    C: Candle,
{
    fn lookback(&self) -> usize {
        self.period
    }

    fn build(&self, data: &[C]) -> Result<EMA, IndicatorError> {
        let values = checked_closes("EMA", data, self.lookback())?;
        let series = moving_average::ema_series(&values, self.period)?;

        Ok(EMA {
            period: self.period,
            ema: *series.last().unwrap_or(&0.0),
        })
    }
}
