#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_lot::Mutex;
use signal_broadcaster::analyzer::CandleAnalyzer;
use signal_broadcaster::analyzer::sentiment_analyzer::SentimentProvider;
use signal_broadcaster::candle::{Candle, OhlcvCandle};
use signal_broadcaster::candle_store::CandleStore;
use signal_broadcaster::config::AppConfig;
use signal_broadcaster::model::{LeafOpinion, RecipientId};
use signal_broadcaster::source::{
    Notifier, NotifyError, PriceSource, PriceSourceFactory, SourceError,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestCandle {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl std::fmt::Display for TestCandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "TestCandle(t={}, o={}, h={}, l={}, c={}, v={})",
            self.timestamp, self.open, self.high, self.low, self.close, self.volume
        )
    }
}

impl Candle for TestCandle {
    fn market(&self) -> &str {
        "test"
    }
    fn datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.timestamp, 0).unwrap_or_default()
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

impl TestCandle {
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        TestCandle {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

pub fn create_uptrend_candles(count: usize, base_price: f64, step: f64) -> Vec<TestCandle> {
    let mut candles = Vec::with_capacity(count);
    for i in 0..count {
        let price = base_price + (i as f64 * step);
        candles.push(TestCandle {
            timestamp: i as i64,
            open: price - step / 2.0,
            high: price + step,
            low: price - step,
            close: price + step / 2.0,
            volume: 1000.0,
        });
    }
    candles
}

pub fn create_downtrend_candles(count: usize, base_price: f64, step: f64) -> Vec<TestCandle> {
    let mut candles = Vec::with_capacity(count);
    for i in 0..count {
        let price = base_price - (i as f64 * step);
        candles.push(TestCandle {
            timestamp: i as i64,
            open: price + step / 2.0,
            high: price + step,
            low: price - step,
            close: price - step / 2.0,
            volume: 1000.0,
        });
    }
    candles
}

/// 종가 목록으로 저장소 생성 (시가는 직전 종가)
pub fn store_from_closes(closes: &[f64]) -> CandleStore<TestCandle> {
    let candles = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            TestCandle::new(
                i as i64 * 3600,
                open,
                open.max(close) + 0.5,
                open.min(close) - 0.5,
                close,
                1000.0,
            )
        })
        .collect::<Vec<_>>();
    let len = candles.len().max(1);
    CandleStore::new(candles, len, false)
}

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// 1시간 간격 OHLCV 캔들 (마지막 종가가 `last_close`)
pub fn ohlcv_series(symbol: &str, count: usize, last_close: f64) -> Vec<OhlcvCandle> {
    (0..count)
        .map(|i| {
            let close = last_close - (count - 1 - i) as f64 * 0.5;
            OhlcvCandle::new(
                symbol,
                t0() + Duration::hours(i as i64),
                close - 0.25,
                close + 1.0,
                close - 1.0,
                close,
                100.0,
            )
        })
        .collect()
}

/// 테스트용 설정: 대기 시간 없이 한 종목만 감시
pub fn test_config(watch_list: &[&str]) -> AppConfig {
    let mut config = AppConfig::default();
    config.watch_list = watch_list.iter().map(|s| s.to_string()).collect();
    config.timing.inter_instrument_delay_ms = 0;
    config.timing.analysis_interval_secs = 1;
    config.timing.error_backoff_secs = 1;
    config
}

/// 항상 같은 의견을 내는 분석기
#[derive(Debug, Clone, Copy)]
pub struct FixedAnalyzer(pub LeafOpinion);

impl<C: Candle> CandleAnalyzer<C> for FixedAnalyzer {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn analyze(&self, _storage: &CandleStore<C>) -> LeafOpinion {
        self.0
    }
}

/// 항상 같은 의견을 내는 감성 레이어
#[derive(Debug, Clone, Copy)]
pub struct FixedSentiment(pub LeafOpinion);

#[async_trait]
impl SentimentProvider for FixedSentiment {
    async fn opinion(&self, _symbol: &str) -> LeafOpinion {
        self.0
    }
}

/// 메모리 기반 가격 소스
///
/// 등록되지 않은 종목은 조회 오류를 돌려줍니다.
#[derive(Debug, Clone, Default)]
pub struct MockPriceSource {
    candles: Arc<HashMap<String, Vec<OhlcvCandle>>>,
    calls: Arc<AtomicUsize>,
}

impl MockPriceSource {
    pub fn new(entries: Vec<(&str, Vec<OhlcvCandle>)>) -> Self {
        MockPriceSource {
            candles: Arc::new(
                entries
                    .into_iter()
                    .map(|(symbol, candles)| (symbol.to_string(), candles))
                    .collect(),
            ),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceSource for MockPriceSource {
    async fn fetch_candles(
        &self,
        symbol: &str,
        _interval: &str,
        limit: usize,
    ) -> Result<Vec<OhlcvCandle>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let candles = self
            .candles
            .get(symbol)
            .ok_or_else(|| SourceError::InvalidSymbol(symbol.to_string()))?;

        let skip = candles.len().saturating_sub(limit);
        Ok(candles[skip..].to_vec())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockPriceSourceFactory {
    pub source: MockPriceSource,
    connects: Arc<AtomicUsize>,
}

impl MockPriceSourceFactory {
    pub fn new(source: MockPriceSource) -> Self {
        MockPriceSourceFactory {
            source,
            connects: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceSourceFactory for MockPriceSourceFactory {
    async fn connect(&self) -> Result<Box<dyn PriceSource>, SourceError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(self.source.clone()))
    }
}

/// 전송된 메시지를 기록하는 알림 전송자
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(RecipientId, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(RecipientId, String)> {
        self.sent.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().len()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn deliver(&self, recipient: RecipientId, text: &str) -> Result<(), NotifyError> {
        self.sent.lock().push((recipient, text.to_string()));
        Ok(())
    }
}

/// 항상 실패하는 알림 전송자
#[derive(Debug, Default)]
pub struct FailingNotifier {
    attempts: AtomicUsize,
}

impl FailingNotifier {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Notifier for FailingNotifier {
    async fn deliver(&self, _recipient: RecipientId, _text: &str) -> Result<(), NotifyError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(NotifyError::Api("chat not found".to_string()))
    }
}
