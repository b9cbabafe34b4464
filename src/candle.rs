use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display};

/// 캔들 데이터에 접근하기 위한 공통 인터페이스
///
/// 지표, 패턴 분석기, 캔들 저장소는 모두 이 트레이트에만 의존합니다.
pub trait Candle: Clone + Debug + Display + PartialEq + Send + Sync {
    /// 종목 식별자 (예: `BTC/USDT`)
    fn market(&self) -> &str;

    /// 캔들 시작 시각
    fn datetime(&self) -> DateTime<Utc>;

    /// 시가
    fn open_price(&self) -> f64;

    /// 고가
    fn high_price(&self) -> f64;

    /// 저가
    fn low_price(&self) -> f64;

    /// 종가
    fn close_price(&self) -> f64;

    /// 거래량
    fn volume(&self) -> f64;

    /// 몸통 크기 (|종가 - 시가|)
    fn body(&self) -> f64 {
        (self.close_price() - self.open_price()).abs()
    }

    /// 양봉 여부
    fn is_bullish(&self) -> bool {
        self.close_price() > self.open_price()
    }

    /// 음봉 여부
    fn is_bearish(&self) -> bool {
        self.close_price() < self.open_price()
    }

    /// 모든 가격 필드가 유한한 값인지 확인
    fn is_finite(&self) -> bool {
        [
            self.open_price(),
            self.high_price(),
            self.low_price(),
            self.close_price(),
            self.volume(),
        ]
        .iter()
        .all(|value| value.is_finite())
    }
}

/// 거래소에서 받아온 OHLCV 캔들
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcvCandle {
    pub symbol: String,
    pub open_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl OhlcvCandle {
    pub fn new(
        symbol: impl Into<String>,
        open_time: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        OhlcvCandle {
            symbol: symbol.into(),
            open_time,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

impl Display for OhlcvCandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}[{}] O:{:.4} H:{:.4} L:{:.4} C:{:.4} V:{:.2}",
            self.symbol,
            self.open_time.format("%Y-%m-%d %H:%M"),
            self.open,
            self.high,
            self.low,
            self.close,
            self.volume
        )
    }
}

impl Candle for OhlcvCandle {
    fn market(&self) -> &str {
        &self.symbol
    }

    fn datetime(&self) -> DateTime<Utc> {
        self.open_time
    }

    fn open_price(&self) -> f64 {
        self.open
    }

    fn high_price(&self) -> f64 {
        self.high
    }

    fn low_price(&self) -> f64 {
        self.low
    }

    fn close_price(&self) -> f64 {
        self.close
    }

    fn volume(&self) -> f64 {
        self.volume
    }
}
