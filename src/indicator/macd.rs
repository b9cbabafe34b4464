use crate::candle::Candle;
use crate::indicator::utils::moving_average;
use crate::indicator::{IndicatorError, TABuilder, checked_closes};
use std::fmt::Display;
use std::marker::PhantomData;

/// MACD(Moving Average Convergence Divergence) 계산을 위한 빌더
///
/// MACD는 두 개의 이동평균선(빠른 EMA와 느린 EMA)의 차이를 계산하고,
/// 이 값에 대한 시그널 라인(MACD의 EMA)을 제공하는 기술적 지표입니다.
#[derive(Debug)]
pub struct MACDBuilder<C: Candle> {
    /// 빠른 EMA 기간 (일반적으로 12)
    fast_period: usize,
    /// 느린 EMA 기간 (일반적으로 26)
    slow_period: usize,
    /// 시그널 라인 기간 (일반적으로 9)
    signal_period: usize,
    _phantom: PhantomData<C>,
}

/// MACD 기술적 지표
#[derive(Clone, Debug)]
pub struct MACD {
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
    /// MACD 라인 (빠른 EMA - 느린 EMA)
    pub macd_line: f64,
    /// 시그널 라인 (MACD의 EMA)
    pub signal_line: f64,
    /// 히스토그램 (MACD - 시그널)
    pub histogram: f64,
}

impl Display for MACD {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "MACD({},{},{}: {:.2}, {:.2}, {:.2})",
            self.fast_period,
            self.slow_period,
            self.signal_period,
            self.macd_line,
            self.signal_line,
            self.histogram
        )
    }
}

impl MACD {
    /// MACD 라인이 시그널 라인 위에 있는지
    pub fn is_above_signal(&self) -> bool {
        self.macd_line > self.signal_line
    }

    /// MACD 라인이 시그널 라인 아래에 있는지
    pub fn is_below_signal(&self) -> bool {
        self.macd_line < self.signal_line
    }
}

/// MACD 계산 함수
///
/// 반환값: (MACD 라인, 시그널 라인, 히스토그램)
fn calculate_macd(
    values: &[f64],
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
) -> Result<(f64, f64, f64), IndicatorError> {
    let fast = moving_average::ema_series(values, fast_period)?;
    let slow = moving_average::ema_series(values, slow_period)?;

    // 두 EMA 시계열을 최신 값 기준으로 맞춤
    let offset = fast.len() - slow.len();
    let macd_lines = slow
        .iter()
        .enumerate()
        .map(|(i, slow_ema)| fast[i + offset] - slow_ema)
        .collect::<Vec<_>>();

    let signal_series = moving_average::ema_series(&macd_lines, signal_period)?;
    let macd_line = *macd_lines.last().unwrap_or(&0.0);
    let signal_line = *signal_series.last().unwrap_or(&0.0);

    Ok((macd_line, signal_line, macd_line - signal_line))
}

impl<C> MACDBuilder<C>
where
    C: Candle,
{
    /// 새 MACD 빌더 생성
    ///
    /// # Arguments
    /// * `fast_period` - 빠른 EMA 기간 (기본값 12)
    /// * `slow_period` - 느린 EMA 기간 (기본값 26)
    /// * `signal_period` - 시그널 라인 기간 (기본값 9)
    ///
    /// # Panics
    /// * 기간이 0이거나 빠른 기간이 느린 기간보다 크거나 같으면 패닉 발생
    pub fn new(fast_period: usize, slow_period: usize, signal_period: usize) -> Self {
        if fast_period == 0 || slow_period == 0 || signal_period == 0 {
            panic!("MACD 기간은 0보다 커야 합니다");
        }

        if fast_period >= slow_period {
            panic!("빠른 기간은 느린 기간보다 작아야 합니다");
        }

        Self {
            fast_period,
            slow_period,
            signal_period,
            _phantom: PhantomData,
        }
    }
}

impl<C> TABuilder<MACD, C> for MACDBuilder<C>
where
    C: Candle,
{
    /// 시그널 라인까지 계산하려면 느린 EMA 첫 값 이후 signal_period - 1개가 더 필요
    fn lookback(&self) -> usize {
        self.slow_period + self.signal_period - 1
    }

    fn build(&self, data: &[C]) -> Result<MACD, IndicatorError> {
        let values = checked_closes("MACD", data, self.lookback())?;
        let (macd_line, signal_line, histogram) = calculate_macd(
            &values,
            self.fast_period,
            self.slow_period,
            self.signal_period,
        )?;

        Ok(MACD {
            fast_period: self.fast_period,
            slow_period: self.slow_period,
            signal_period: self.signal_period,
            macd_line,
            signal_line,
            histogram,
        })
    }
}
