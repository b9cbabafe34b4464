// 외부 협력자 모듈
// 가격 데이터, 감성 텍스트, 알림 전송을 좁은 트레이트 뒤로 숨깁니다.

pub mod binance;
pub mod news;
pub mod telegram;

pub use binance::{BinancePriceSource, BinancePriceSourceFactory};
pub use news::{CryptoPanicSource, RedditSource};
pub use telegram::TelegramNotifier;

use crate::candle::OhlcvCandle;
use crate::model::RecipientId;
use async_trait::async_trait;
use std::fmt::Display;
use std::time::Duration;
use thiserror::Error;

/// 데이터 조회 오류
///
/// 분석 파이프라인에서는 모두 "데이터 없음"으로 취급됩니다.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP 오류: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP 상태 {status}: {endpoint}")]
    Status { status: u16, endpoint: String },
    #[error("응답 형식 오류: {0}")]
    Decode(String),
    #[error("지원하지 않는 심볼: {0}")]
    InvalidSymbol(String),
}

/// 알림 전송 오류
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP 오류: {0}")]
    Http(#[from] reqwest::Error),
    #[error("메신저 API 오류: {0}")]
    Api(String),
}

/// 가격 데이터 소스
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// 최근 캔들 조회 (오래된 것부터)
    ///
    /// # Arguments
    /// * `symbol` - 종목 (예: `BTC/USDT`)
    /// * `interval` - 캔들 간격 (예: `1h`)
    /// * `limit` - 캔들 수
    async fn fetch_candles(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<Vec<OhlcvCandle>, SourceError>;
}

/// 모니터링 태스크마다 자기 연결을 만들기 위한 팩토리
#[async_trait]
pub trait PriceSourceFactory: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn PriceSource>, SourceError>;
}

/// 감성 텍스트의 출처 분류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SentimentChannel {
    News,
    Social,
}

impl Display for SentimentChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SentimentChannel::News => write!(f, "news"),
            SentimentChannel::Social => write!(f, "social"),
        }
    }
}

/// 감성 텍스트 소스
///
/// 빈 목록은 오류가 아닌 정상 응답입니다.
#[async_trait]
pub trait SentimentSource: Send + Sync {
    fn name(&self) -> &'static str;

    fn channel(&self) -> SentimentChannel;

    async fn fetch_texts(&self, symbol: &str) -> Result<Vec<String>, SourceError>;
}

/// 알림 전송자
///
/// 실패 시 재시도하지 않습니다.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, recipient: RecipientId, text: &str) -> Result<(), NotifyError>;
}

/// 요청 타임아웃이 걸린 공용 HTTP 클라이언트 생성
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("signal-broadcaster/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// `BTC/USDT` 형태에서 기초 자산 (`BTC`)
pub fn base_asset(symbol: &str) -> Option<&str> {
    symbol
        .split('/')
        .next()
        .map(str::trim)
        .filter(|asset| !asset.is_empty())
}
