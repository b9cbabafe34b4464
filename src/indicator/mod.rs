// 기술적 지표 모듈
// RSI, MACD, EMA, 볼린저 밴드를 캔들 시계열로부터 계산합니다.

pub mod bband;
pub mod ma;
pub mod macd;
pub mod rsi;
pub mod utils;

use crate::candle::Candle;
use crate::candle_store::CandleStore;
use thiserror::Error;

/// 지표 계산 오류
///
/// 어느 쪽이든 호출한 분석 레이어는 (Hold, None)으로 물러납니다.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndicatorError {
    #[error("{indicator}: 데이터 부족 (필요 {required}, 실제 {actual})")]
    InsufficientData {
        indicator: &'static str,
        required: usize,
        actual: usize,
    },
    #[error("{indicator}: 유한하지 않은 입력값")]
    NonFiniteInput { indicator: &'static str },
    #[error("{indicator}: 계산 실패")]
    Computation { indicator: &'static str },
}

/// 기술적 지표 생성 인터페이스
///
/// 빌더는 파라미터만 보관하므로 같은 입력에 대해 항상 같은 결과를 돌려줍니다.
pub trait TABuilder<T, C: Candle>: Send + Sync + std::fmt::Debug {
    /// 계산에 필요한 최소 캔들 수
    fn lookback(&self) -> usize;

    /// 시간 순서(오래된 것부터)의 캔들에서 지표 생성
    ///
    /// # Arguments
    /// * `data` - 캔들 데이터 슬라이스
    ///
    /// # Returns
    /// * `Result<T, IndicatorError>` - 계산된 지표 또는 데이터 부족/오염 오류
    fn build(&self, data: &[C]) -> Result<T, IndicatorError>;

    /// 저장소에서 지표 생성
    fn from_storage(&self, storage: &CandleStore<C>) -> Result<T, IndicatorError> {
        self.build(&storage.get_time_ordered_items())
    }
}

/// 캔들에서 종가 목록을 뽑으면서 길이와 유한성을 검증합니다.
pub(crate) fn checked_closes<C: Candle>(
    indicator: &'static str,
    data: &[C],
    required: usize,
) -> Result<Vec<f64>, IndicatorError> {
    if data.len() < required {
        return Err(IndicatorError::InsufficientData {
            indicator,
            required,
            actual: data.len(),
        });
    }

    let closes = data.iter().map(|c| c.close_price()).collect::<Vec<_>>();
    if closes.iter().any(|value| !value.is_finite()) {
        return Err(IndicatorError::NonFiniteInput { indicator });
    }

    Ok(closes)
}
