use crate::candle::OhlcvCandle;
use crate::source::{PriceSource, PriceSourceFactory, SourceError, http_client};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use log::debug;
use reqwest::Client;
use serde::Deserialize;
use serde::de::IgnoredAny;
use serde_json::Value;
use std::time::Duration;

const KLINES_ENDPOINT: &str = "/api/v3/klines";

/// `BTC/USDT` → `BTCUSDT`
pub fn to_exchange_symbol(symbol: &str) -> Result<String, SourceError> {
    let converted = symbol.replace('/', "").trim().to_uppercase();
    if converted.is_empty() || !converted.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(SourceError::InvalidSymbol(symbol.to_string()));
    }
    Ok(converted)
}

/// `GET /api/v3/klines` 응답의 한 행
///
/// 12개 원소 배열이며 앞의 6개(시작 시각과 OHLCV)만 사용합니다.
#[derive(Deserialize)]
struct KlineRow {
    open_time: i64,
    open: String,
    high: String,
    low: String,
    close: String,
    volume: String,
    _close_time: IgnoredAny,
    _quote_volume: IgnoredAny,
    _trades: IgnoredAny,
    _taker_base_volume: IgnoredAny,
    _taker_quote_volume: IgnoredAny,
    _unused: IgnoredAny,
}

fn decimal(name: &str, raw: &str) -> Result<f64, SourceError> {
    raw.parse::<f64>()
        .map_err(|e| SourceError::Decode(format!("kline {} '{}': {}", name, raw, e)))
}

impl KlineRow {
    fn into_candle(self, symbol: &str) -> Result<OhlcvCandle, SourceError> {
        let open_time = Utc
            .timestamp_millis_opt(self.open_time)
            .single()
            .ok_or_else(|| SourceError::Decode(format!("잘못된 시각: {}", self.open_time)))?;

        Ok(OhlcvCandle::new(
            symbol,
            open_time,
            decimal("open", &self.open)?,
            decimal("high", &self.high)?,
            decimal("low", &self.low)?,
            decimal("close", &self.close)?,
            decimal("volume", &self.volume)?,
        ))
    }
}

/// Binance kline 응답을 캔들 목록으로 변환합니다.
pub fn parse_klines(symbol: &str, body: Value) -> Result<Vec<OhlcvCandle>, SourceError> {
    let rows = serde_json::from_value::<Vec<KlineRow>>(body)
        .map_err(|e| SourceError::Decode(format!("kline 응답 형식 오류: {}", e)))?;

    rows.into_iter().map(|row| row.into_candle(symbol)).collect()
}

/// Binance 현물 REST 가격 소스
#[derive(Debug, Clone)]
pub struct BinancePriceSource {
    client: Client,
    base_url: String,
}

impl BinancePriceSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SourceError> {
        Ok(BinancePriceSource {
            client: http_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl PriceSource for BinancePriceSource {
    async fn fetch_candles(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<Vec<OhlcvCandle>, SourceError> {
        let exchange_symbol = to_exchange_symbol(symbol)?;
        let limit = limit.to_string();
        let url = format!("{}{}", self.base_url, KLINES_ENDPOINT);

        debug!("캔들 조회: {} {} x{}", exchange_symbol, interval, limit);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("symbol", exchange_symbol.as_str()),
                ("interval", interval),
                ("limit", limit.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                endpoint: KLINES_ENDPOINT.to_string(),
            });
        }

        let body: Value = response.json().await?;
        parse_klines(symbol, body)
    }
}

/// 태스크마다 새 HTTP 클라이언트를 만드는 팩토리
#[derive(Debug, Clone)]
pub struct BinancePriceSourceFactory {
    base_url: String,
    timeout: Duration,
}

impl BinancePriceSourceFactory {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        BinancePriceSourceFactory {
            base_url: base_url.into(),
            timeout,
        }
    }
}

#[async_trait]
impl PriceSourceFactory for BinancePriceSourceFactory {
    async fn connect(&self) -> Result<Box<dyn PriceSource>, SourceError> {
        let source = BinancePriceSource::new(self.base_url.clone(), self.timeout)?;
        Ok(Box::new(source))
    }
}
