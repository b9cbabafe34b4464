use crate::candle::Candle;
use crate::candle_store::CandleStore;
use crate::config::IndicatorConfig;
use crate::indicator::bband::{BollingerBands, BollingerBandsBuilder};
use crate::indicator::ma::MA;
use crate::indicator::ma::ema::{EMA, EMABuilder};
use crate::indicator::macd::{MACD, MACDBuilder};
use crate::indicator::rsi::{RSI, RSIBuilder};
use crate::indicator::{IndicatorError, TABuilder};
use std::fmt::Display;

/// 공통 이동평균 계산 함수들
///
/// 계산은 ta-lib에 맡기고, 그 앞에서 길이를 검사합니다.
pub mod moving_average {
    use crate::indicator::IndicatorError;
    use ta_lib::{exponential_moving_average, simple_moving_average};

    fn ensure_len(
        indicator: &'static str,
        values: &[f64],
        period: usize,
    ) -> Result<(), IndicatorError> {
        if period == 0 || values.len() < period {
            return Err(IndicatorError::InsufficientData {
                indicator,
                required: period.max(1),
                actual: values.len(),
            });
        }
        Ok(())
    }

    /// SMA 시계열
    ///
    /// 결과의 i번째 값은 `values[i..i + period]`의 평균입니다.
    ///
    /// # Arguments
    /// * `values` - 시간 순서의 가격 데이터
    /// * `period` - 계산 기간
    ///
    /// # Returns
    /// * `Result<Vec<f64>, IndicatorError>` - 길이 `values.len() - period + 1`의 시계열
    pub fn sma_series(values: &[f64], period: usize) -> Result<Vec<f64>, IndicatorError> {
        ensure_len("SMA", values, period)?;

        let (series, _) = simple_moving_average(values, Some(period))
            .map_err(|_| IndicatorError::Computation { indicator: "SMA" })?;
        Ok(series)
    }

    /// EMA 시계열
    ///
    /// 첫 period개 값의 SMA로 시작합니다. 마지막 값이 최신 EMA입니다.
    pub fn ema_series(values: &[f64], period: usize) -> Result<Vec<f64>, IndicatorError> {
        ensure_len("EMA", values, period)?;

        let (series, _) = exponential_moving_average(values, Some(period))
            .map_err(|_| IndicatorError::Computation { indicator: "EMA" })?;
        Ok(series)
    }

    /// 마지막 period개의 SMA
    pub fn last_sma(values: &[f64], period: usize) -> Result<f64, IndicatorError> {
        sma_series(values, period)?
            .last()
            .copied()
            .ok_or(IndicatorError::Computation { indicator: "SMA" })
    }
}

/// 기술적 분석 레이어가 사용하는 지표 스냅샷
#[derive(Debug, Clone)]
pub struct IndicatorSnapshot {
    pub close: f64,
    pub rsi: RSI,
    pub macd: MACD,
    pub ema_short: EMA,
    pub ema_long: EMA,
    pub bband: BollingerBands,
}

impl IndicatorSnapshot {
    pub fn ema_short_value(&self) -> f64 {
        self.ema_short.get()
    }

    pub fn ema_long_value(&self) -> f64 {
        self.ema_long.get()
    }
}

impl Display for IndicatorSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "close={:.4}, {}, {}, {}, {}, {}",
            self.close, self.rsi, self.macd, self.ema_short, self.ema_long, self.bband
        )
    }
}

/// 여러 지표를 한 번에 계산하는 빌더
#[derive(Debug)]
pub struct IndicatorSnapshotBuilder<C: Candle> {
    rsi_builder: RSIBuilder<C>,
    macd_builder: MACDBuilder<C>,
    ema_short_builder: EMABuilder<C>,
    ema_long_builder: EMABuilder<C>,
    bband_builder: BollingerBandsBuilder<C>,
}

impl<C: Candle> IndicatorSnapshotBuilder<C> {
    pub fn new(config: &IndicatorConfig) -> Self {
        IndicatorSnapshotBuilder {
            rsi_builder: RSIBuilder::new(config.rsi_period),
            macd_builder: MACDBuilder::new(config.macd_fast, config.macd_slow, config.macd_signal),
            ema_short_builder: EMABuilder::new(config.ema_short),
            ema_long_builder: EMABuilder::new(config.ema_long),
            bband_builder: BollingerBandsBuilder::new(config.bb_period, config.bb_std),
        }
    }

    /// 모든 지표 중 가장 긴 룩백
    pub fn lookback(&self) -> usize {
        [
            self.rsi_builder.lookback(),
            self.macd_builder.lookback(),
            self.ema_short_builder.lookback(),
            self.ema_long_builder.lookback(),
            self.bband_builder.lookback(),
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }

    /// 저장소의 캔들로 전체 지표를 계산합니다.
    ///
    /// 가장 긴 룩백보다 짧은 시계열이면 어떤 지표도 계산하지 않고 오류를 돌려줍니다.
    pub fn from_storage(&self, storage: &CandleStore<C>) -> Result<IndicatorSnapshot, IndicatorError> {
        let required = self.lookback();
        if storage.len() < required {
            return Err(IndicatorError::InsufficientData {
                indicator: "snapshot",
                required,
                actual: storage.len(),
            });
        }

        let data = storage.get_time_ordered_items();
        let close = data
            .last()
            .map(|candle| candle.close_price())
            .ok_or(IndicatorError::InsufficientData {
                indicator: "snapshot",
                required,
                actual: 0,
            })?;

        Ok(IndicatorSnapshot {
            close,
            rsi: self.rsi_builder.build(&data)?,
            macd: self.macd_builder.build(&data)?,
            ema_short: self.ema_short_builder.build(&data)?,
            ema_long: self.ema_long_builder.build(&data)?,
            bband: self.bband_builder.build(&data)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::moving_average::*;
    use crate::indicator::IndicatorError;

    #[test]
    fn test_sma_series() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let series = sma_series(&values, 2).unwrap();
        assert_eq!(series.len(), 4);
        assert!((series[0] - 1.5).abs() < 1e-9);
        assert!((series[3] - 4.5).abs() < 1e-9);
        assert!((last_sma(&values, 5).unwrap() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_short_input_is_rejected_before_computation() {
        let values = vec![1.0, 2.0, 3.0];
        assert_eq!(
            sma_series(&values, 6).unwrap_err(),
            IndicatorError::InsufficientData {
                indicator: "SMA",
                required: 6,
                actual: 3,
            }
        );
        assert!(matches!(
            ema_series(&values, 0),
            Err(IndicatorError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_ema_series_seeded_with_sma() {
        let values = vec![2.0, 4.0, 6.0, 8.0];
        let series = ema_series(&values, 3).unwrap();
        assert_eq!(series.len(), 2);
        assert!((series[0] - 4.0).abs() < 1e-9);
        // alpha = 0.5 => 0.5 * 8 + 0.5 * 4
        assert!((series[1] - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_ema_constant_series() {
        let values = vec![10.0; 30];
        let series = ema_series(&values, 9).unwrap();
        assert!(series.iter().all(|v| (v - 10.0).abs() < 1e-9));
    }
}
