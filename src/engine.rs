use crate::analyzer::sentiment_analyzer::SentimentProvider;
use crate::analyzer::{CandleAnalyzer, PatternAnalyzer, TechnicalAnalyzer};
use crate::candle::OhlcvCandle;
use crate::candle_store::CandleStore;
use crate::config::{AppConfig, MarketConfig};
use crate::fusion::SignalFusion;
use crate::indicator::utils::{IndicatorSnapshot, IndicatorSnapshotBuilder};
use crate::model::{FusedSignal, LeafOpinions};
use crate::source::{PriceSource, SourceError};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::fmt::Debug;
use thiserror::Error;

/// 한 번의 분석 결과
#[derive(Debug, Clone)]
pub struct Analysis {
    pub signal: FusedSignal,
    pub opinions: LeafOpinions,
    /// 캔들이 부족하면 None
    pub indicators: Option<IndicatorSnapshot>,
    pub patterns: Vec<String>,
}

/// 분석 실패
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{symbol}: 캔들 데이터 없음")]
    NoData { symbol: String },
    #[error("{symbol}: 최신 종가가 유효하지 않음")]
    InvalidPrice { symbol: String },
    #[error("{symbol}: 가격 조회 실패: {source}")]
    Source {
        symbol: String,
        #[source]
        source: SourceError,
    },
}

/// 세 분석 레이어와 융합기를 묶은 상태 없는 엔진
///
/// 모든 모니터링 태스크가 `Arc`로 공유합니다.
pub struct SignalEngine {
    technical: Box<dyn CandleAnalyzer<OhlcvCandle>>,
    pattern: Box<dyn CandleAnalyzer<OhlcvCandle>>,
    sentiment: Box<dyn SentimentProvider>,
    snapshot_builder: IndicatorSnapshotBuilder<OhlcvCandle>,
    fusion: SignalFusion,
    market: MarketConfig,
}

impl Debug for SignalEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalEngine")
            .field("technical", &self.technical.name())
            .field("pattern", &self.pattern.name())
            .field("fusion", &self.fusion)
            .field("market", &self.market)
            .finish()
    }
}

impl SignalEngine {
    /// 설정에 따라 기본 기술적/패턴 분석기로 엔진 생성
    pub fn new(config: &AppConfig, sentiment: Box<dyn SentimentProvider>) -> Self {
        Self::with_analyzers(
            config,
            Box::new(TechnicalAnalyzer::new(&config.indicators)),
            Box::new(PatternAnalyzer::new(&config.patterns)),
            sentiment,
        )
    }

    /// 분석기를 직접 지정해 엔진 생성
    pub fn with_analyzers(
        config: &AppConfig,
        technical: Box<dyn CandleAnalyzer<OhlcvCandle>>,
        pattern: Box<dyn CandleAnalyzer<OhlcvCandle>>,
        sentiment: Box<dyn SentimentProvider>,
    ) -> Self {
        SignalEngine {
            technical,
            pattern,
            sentiment,
            snapshot_builder: IndicatorSnapshotBuilder::new(&config.indicators),
            fusion: SignalFusion::from_config(&config.fusion),
            market: config.market.clone(),
        }
    }

    /// 이미 받은 캔들로 분석합니다.
    ///
    /// 캔들이 지표 룩백보다 짧으면 해당 레이어만 (Hold, None)이 되고
    /// 나머지 레이어로 융합합니다.
    pub async fn analyze(
        &self,
        symbol: &str,
        candles: Vec<OhlcvCandle>,
        now: DateTime<Utc>,
    ) -> Result<Analysis, EngineError> {
        let limit = candles.len().max(self.market.candle_limit);
        let storage = CandleStore::new(candles, limit, true);

        let price = storage.last_close().ok_or_else(|| EngineError::NoData {
            symbol: symbol.to_string(),
        })?;
        if !price.is_finite() {
            return Err(EngineError::InvalidPrice {
                symbol: symbol.to_string(),
            });
        }

        let technical = self.technical.analyze(&storage);
        let (pattern, patterns) = self.pattern.analyze_detailed(&storage);
        let sentiment = self.sentiment.opinion(symbol).await;
        let opinions = LeafOpinions::new(technical, pattern, sentiment);

        let fused = self.fusion.fuse(&opinions);
        let indicators = match self.snapshot_builder.from_storage(&storage) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                debug!("{} 지표 스냅샷 없음: {}", symbol, e);
                None
            }
        };

        info!("{} 분석: {} → {}({})", symbol, opinions, fused.direction, fused.confidence);

        Ok(Analysis {
            signal: FusedSignal::new(symbol, fused.direction, fused.confidence, price, now),
            opinions,
            indicators,
            patterns,
        })
    }

    /// 가격 소스에서 캔들을 받아 분석합니다.
    pub async fn fetch_and_analyze(
        &self,
        source: &dyn PriceSource,
        symbol: &str,
        now: DateTime<Utc>,
    ) -> Result<Analysis, EngineError> {
        let candles = source
            .fetch_candles(symbol, &self.market.interval, self.market.candle_limit)
            .await
            .map_err(|e| {
                warn!("{} 가격 조회 실패: {}", symbol, e);
                EngineError::Source {
                    symbol: symbol.to_string(),
                    source: e,
                }
            })?;

        self.analyze(symbol, candles, now).await
    }
}
