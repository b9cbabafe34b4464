use crate::candle::Candle;
use crate::indicator::{IndicatorError, TABuilder, checked_closes};
use std::fmt::Display;
use std::marker::PhantomData;

/// RSI 계산 함수 (Wilder 평활)
///
/// `values`는 최소 period + 1개여야 합니다.
fn calculate_rsi(values: &[f64], period: usize) -> f64 {
    let mut gains = Vec::with_capacity(values.len());
    let mut losses = Vec::with_capacity(values.len());

    // 가격 변화량 계산
    for i in 1..values.len() {
        let change = values[i] - values[i - 1];
        gains.push(if change > 0.0 { change } else { 0.0 });
        losses.push(if change < 0.0 { -change } else { 0.0 });
    }

    // 첫 번째 평균 게인/로스 계산
    let mut avg_gain = gains.iter().take(period).sum::<f64>() / period as f64;
    let mut avg_loss = losses.iter().take(period).sum::<f64>() / period as f64;

    // 나머지 기간에 대해 지수이동평균으로 업데이트
    let smoothing_factor = 1.0 / period as f64;
    for i in period..gains.len() {
        avg_gain = (avg_gain * (1.0 - smoothing_factor)) + (gains[i] * smoothing_factor);
        avg_loss = (avg_loss * (1.0 - smoothing_factor)) + (losses[i] * smoothing_factor);
    }

    if avg_loss < 0.000001 {
        // 변동이 전혀 없으면 중립
        if avg_gain < 0.000001 {
            return 50.0;
        }
        return 100.0;
    }

    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}

/// 상대강도지수(RSI) 기술적 지표 빌더
#[derive(Debug)]
pub struct RSIBuilder<C: Candle> {
    /// RSI 계산 기간
    period: usize,
    _phantom: PhantomData<C>,
}

/// 상대강도지수(RSI) 기술적 지표
///
/// RSI는 가격 변동의 상대적 강도를 측정하여 과매수/과매도 상태를 판단
#[derive(Clone, Debug)]
pub struct RSI {
    /// RSI 계산 기간
    period: usize,
    /// RSI 값 (0-100)
    pub value: f64,
}

impl Display for RSI {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RSI({}: {:.2})", self.period, self.value)
    }
}

impl RSI {
    /// RSI가 과매수 기준을 넘었는지 확인
    ///
    /// # Arguments
    /// * `threshold` - 과매수 기준값 (일반적으로 70)
    pub fn is_overbought(&self, threshold: f64) -> bool {
        self.value > threshold
    }

    /// RSI가 과매도 기준 아래인지 확인
    ///
    /// # Arguments
    /// * `threshold` - 과매도 기준값 (일반적으로 30)
    pub fn is_oversold(&self, threshold: f64) -> bool {
        self.value < threshold
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

impl<C> RSIBuilder<C>
where
    C: Candle,
{
    /// 새 RSI 빌더 생성
    ///
    /// # Panics
    /// * 기간이 0이면 패닉 발생
    pub fn new(period: usize) -> Self {
        if period == 0 {
            panic!("RSI 기간은 0보다 커야 합니다");
        }

        Self {
            period,
            _phantom: PhantomData,
        }
    }
}

impl<C> TABuilder<RSI, C> for RSIBuilder<C>
where
    C: Candle,
{
    fn lookback(&self) -> usize {
        self.period + 1
    }

    fn build(&self, data: &[C]) -> Result<RSI, IndicatorError> {
        let values = checked_closes("RSI", data, self.lookback())?;
        Ok(RSI {
            period: self.period,
            value: calculate_rsi(&values, self.period),
        })
    }
}
