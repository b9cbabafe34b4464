use crate::analyzer::technical_analyzer::TechnicalScoring;
use crate::config_loader::{ConfigError, ConfigResult, ConfigValidation};
use crate::fusion::FusionPolicy;
use crate::gatekeeper::{DeliveryFloor, KeyMode, RedeliveryPolicy};
use crate::model::Confidence;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// 애플리케이션 전체 설정
///
/// 시작 시 한 번 로드되며 이후에는 읽기 전용으로 모든 모니터링 태스크가 공유합니다.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// 매 사이클마다 분석할 종목 목록 (순서대로 처리)
    pub watch_list: Vec<String>,
    pub market: MarketConfig,
    pub timing: TimingConfig,
    pub indicators: IndicatorConfig,
    pub patterns: PatternConfig,
    pub sentiment: SentimentConfig,
    pub fusion: FusionConfig,
    pub gatekeeper: GatekeeperConfig,
    pub api: ApiConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            watch_list: [
                "BTC/USDT",
                "ETH/USDT",
                "BNB/USDT",
                "SOL/USDT",
                "ADA/USDT",
                "XRP/USDT",
                "DOT/USDT",
                "DOGE/USDT",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            market: MarketConfig::default(),
            timing: TimingConfig::default(),
            indicators: IndicatorConfig::default(),
            patterns: PatternConfig::default(),
            sentiment: SentimentConfig::default(),
            fusion: FusionConfig::default(),
            gatekeeper: GatekeeperConfig::default(),
            api: ApiConfig::default(),
        }
    }
}

/// 캔들 조회 설정
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MarketConfig {
    /// 캔들 간격 (예: "1h")
    pub interval: String,
    /// 한 번에 조회할 캔들 수
    pub candle_limit: usize,
}

impl Default for MarketConfig {
    fn default() -> Self {
        MarketConfig {
            interval: "1h".to_string(),
            candle_limit: 100,
        }
    }
}

/// 주기 및 쿨다운 설정 (초 단위)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimingConfig {
    /// 같은 키에 대한 두 알림 사이의 최소 간격 (MIN_SIGNAL_INTERVAL)
    pub min_signal_interval_secs: u64,
    /// 마지막 알림이 만료되는 시간 (SIGNAL_EXPIRY)
    pub signal_expiry_secs: u64,
    /// 한 사이클이 끝난 뒤 다음 사이클까지 대기 (ANALYSIS_INTERVAL)
    pub analysis_interval_secs: u64,
    /// 종목 사이 대기 (밀리초)
    pub inter_instrument_delay_ms: u64,
    /// 사이클 단위 오류 후 재시도까지 대기
    pub error_backoff_secs: u64,
    /// 수익 추적 보존 기간
    pub profit_retention_secs: u64,
    /// N 사이클마다 수익 리포트 전송 (0이면 비활성)
    pub profit_report_every_cycles: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            min_signal_interval_secs: 3600,
            signal_expiry_secs: 7200,
            analysis_interval_secs: 900,
            inter_instrument_delay_ms: 1000,
            error_backoff_secs: 60,
            profit_retention_secs: 24 * 3600,
            profit_report_every_cycles: 0,
        }
    }
}

impl TimingConfig {
    pub fn min_signal_interval(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.min_signal_interval_secs as i64)
    }

    pub fn signal_expiry(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.signal_expiry_secs as i64)
    }

    pub fn profit_retention(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.profit_retention_secs as i64)
    }

    pub fn analysis_interval(&self) -> Duration {
        Duration::from_secs(self.analysis_interval_secs)
    }

    pub fn inter_instrument_delay(&self) -> Duration {
        Duration::from_millis(self.inter_instrument_delay_ms)
    }

    pub fn error_backoff(&self) -> Duration {
        Duration::from_secs(self.error_backoff_secs)
    }
}

/// 기술적 지표 파라미터
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IndicatorConfig {
    pub rsi_period: usize,
    pub rsi_overbought: f64,
    pub rsi_oversold: f64,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub ema_short: usize,
    pub ema_long: usize,
    pub bb_period: usize,
    pub bb_std: f64,
    /// 기술적 레이어 내부 점수 방식
    pub scoring: TechnicalScoring,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        IndicatorConfig {
            rsi_period: 14,
            rsi_overbought: 70.0,
            rsi_oversold: 30.0,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            ema_short: 9,
            ema_long: 21,
            bb_period: 20,
            bb_std: 2.0,
            scoring: TechnicalScoring::MajorityCount,
        }
    }
}

impl IndicatorConfig {
    /// 모든 지표를 계산하는 데 필요한 최소 캔들 수
    pub fn max_lookback(&self) -> usize {
        [
            self.rsi_period + 1,
            self.macd_slow + self.macd_signal.saturating_sub(1),
            self.ema_short,
            self.ema_long,
            self.bb_period,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }
}

/// 차트 패턴 파라미터
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PatternConfig {
    /// 이중 천장/바닥 및 어깨 대칭 허용 상대 오차
    pub similarity_threshold: f64,
    /// 스타 패턴에서 두 번째 캔들 몸통의 최대 비율 (첫 캔들 몸통 대비)
    pub star_body_ratio: f64,
    /// 이중 천장/바닥 탐색 구간
    pub double_window: usize,
    /// 헤드앤숄더 탐색 구간
    pub head_shoulders_window: usize,
    pub trend_short_sma: usize,
    pub trend_long_sma: usize,
    /// 단기 SMA 단조 증가/감소를 확인할 봉 수
    pub trend_confirm_bars: usize,
}

impl Default for PatternConfig {
    fn default() -> Self {
        PatternConfig {
            similarity_threshold: 0.02,
            star_body_ratio: 0.3,
            double_window: 20,
            head_shoulders_window: 30,
            trend_short_sma: 20,
            trend_long_sma: 50,
            trend_confirm_bars: 5,
        }
    }
}

/// 감성 분석 파라미터
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SentimentConfig {
    pub enabled: bool,
    /// |점수|가 이 값을 넘으면 Medium
    pub medium_threshold: f64,
    /// |점수|가 이 값을 넘으면 High (None이면 단일 단계)
    pub high_threshold: Option<f64>,
    /// 소스별 최대 텍스트 수
    pub sample_size: usize,
}

impl Default for SentimentConfig {
    fn default() -> Self {
        SentimentConfig {
            enabled: true,
            medium_threshold: 0.1,
            high_threshold: Some(0.3),
            sample_size: 100,
        }
    }
}

impl SentimentConfig {
    /// ±0.2 단일 단계 변형
    pub fn single_tier() -> Self {
        SentimentConfig {
            medium_threshold: 0.2,
            high_threshold: None,
            ..SentimentConfig::default()
        }
    }
}

/// 신호 융합 설정
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FusionConfig {
    pub policy: FusionPolicy,
    /// 이 신뢰도 이상인 레이어만 집계에 포함
    pub count_floor: Confidence,
}

impl Default for FusionConfig {
    fn default() -> Self {
        FusionConfig {
            policy: FusionPolicy::MajorityOfThree,
            count_floor: Confidence::Medium,
        }
    }
}

/// 알림 게이트키퍼 설정
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GatekeeperConfig {
    pub key_mode: KeyMode,
    pub redelivery: RedeliveryPolicy,
    pub delivery_floor: DeliveryFloor,
}

impl Default for GatekeeperConfig {
    fn default() -> Self {
        GatekeeperConfig {
            key_mode: KeyMode::RecipientInstrument,
            redelivery: RedeliveryPolicy::DirectionChange,
            delivery_floor: DeliveryFloor::Strict,
        }
    }
}

/// 외부 API 설정
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    pub binance_base_url: String,
    pub cryptopanic_base_url: String,
    pub reddit_base_url: String,
    pub reddit_subreddit: String,
    pub telegram_base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            binance_base_url: "https://api.binance.com".to_string(),
            cryptopanic_base_url: "https://cryptopanic.com/api/v1".to_string(),
            reddit_base_url: "https://www.reddit.com".to_string(),
            reddit_subreddit: "CryptoCurrency".to_string(),
            telegram_base_url: "https://api.telegram.org".to_string(),
            request_timeout_secs: 10,
        }
    }
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(msg.into())
}

impl ConfigValidation for AppConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.watch_list.is_empty() {
            return Err(invalid("watch_list가 비어 있습니다"));
        }

        let mut seen = HashSet::new();
        for symbol in &self.watch_list {
            if symbol.trim().is_empty() {
                return Err(invalid("watch_list에 빈 심볼이 있습니다"));
            }
            if !seen.insert(symbol.as_str()) {
                return Err(invalid(format!("watch_list에 중복 심볼: {}", symbol)));
            }
        }

        if self.market.interval.trim().is_empty() {
            return Err(invalid("market.interval이 비어 있습니다"));
        }

        let ind = &self.indicators;
        if ind.rsi_period == 0
            || ind.macd_fast == 0
            || ind.macd_slow == 0
            || ind.macd_signal == 0
            || ind.ema_short == 0
            || ind.ema_long == 0
            || ind.bb_period == 0
        {
            return Err(invalid("지표 기간은 0보다 커야 합니다"));
        }
        if ind.macd_fast >= ind.macd_slow {
            return Err(invalid("macd_fast는 macd_slow보다 작아야 합니다"));
        }
        if ind.ema_short >= ind.ema_long {
            return Err(invalid("ema_short는 ema_long보다 작아야 합니다"));
        }
        if !(0.0..=100.0).contains(&ind.rsi_oversold)
            || !(0.0..=100.0).contains(&ind.rsi_overbought)
            || ind.rsi_oversold >= ind.rsi_overbought
        {
            return Err(invalid("RSI 과매도/과매수 기준이 올바르지 않습니다"));
        }
        if ind.bb_std <= 0.0 {
            return Err(invalid("bb_std는 0보다 커야 합니다"));
        }

        if self.market.candle_limit < ind.max_lookback() {
            return Err(invalid(format!(
                "candle_limit({})이 지표 룩백({})보다 작습니다",
                self.market.candle_limit,
                ind.max_lookback()
            )));
        }

        let pat = &self.patterns;
        if pat.similarity_threshold <= 0.0 || pat.star_body_ratio <= 0.0 {
            return Err(invalid("패턴 임계값은 0보다 커야 합니다"));
        }
        if pat.double_window < 3 || pat.head_shoulders_window < 5 {
            return Err(invalid("패턴 탐색 구간이 너무 짧습니다"));
        }
        if pat.trend_short_sma == 0 || pat.trend_short_sma >= pat.trend_long_sma {
            return Err(invalid("trend_short_sma는 0보다 크고 trend_long_sma보다 작아야 합니다"));
        }

        let sen = &self.sentiment;
        if sen.medium_threshold < 0.0 {
            return Err(invalid("sentiment.medium_threshold는 음수일 수 없습니다"));
        }
        if sen
            .high_threshold
            .is_some_and(|high| high <= sen.medium_threshold)
        {
            return Err(invalid(
                "sentiment.high_threshold는 medium_threshold보다 커야 합니다",
            ));
        }

        if self.fusion.count_floor == Confidence::None {
            return Err(invalid("fusion.count_floor는 None일 수 없습니다"));
        }

        if self.timing.min_signal_interval_secs == 0 || self.timing.signal_expiry_secs == 0 {
            return Err(invalid("알림 간격과 만료 시간은 0보다 커야 합니다"));
        }

        if self.api.request_timeout_secs == 0 {
            return Err(invalid("api.request_timeout_secs는 0보다 커야 합니다"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config_loader::{ConfigFormat, ConfigLoader};

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.timing.min_signal_interval_secs, 3600);
        assert_eq!(config.timing.signal_expiry_secs, 7200);
        assert_eq!(config.indicators.max_lookback(), 34);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let toml_str = r#"
            watch_list = ["BTC/USDT", "ETH/USDT"]

            [gatekeeper]
            redelivery = "Expiry"
            key_mode = "Recipient"

            [sentiment]
            medium_threshold = 0.2
        "#;
        let config =
            ConfigLoader::load_from_string::<AppConfig>(toml_str, ConfigFormat::Toml).unwrap();
        assert_eq!(config.watch_list, vec!["BTC/USDT", "ETH/USDT"]);
        assert_eq!(config.gatekeeper.redelivery, RedeliveryPolicy::Expiry);
        assert_eq!(config.gatekeeper.key_mode, KeyMode::Recipient);
        assert_eq!(config.gatekeeper.delivery_floor, DeliveryFloor::Strict);
        assert_eq!(config.sentiment.high_threshold, Some(0.3));
        assert_eq!(config.market.candle_limit, 100);
    }

    #[test]
    fn test_duplicate_symbol_is_rejected() {
        let config = AppConfig {
            watch_list: vec!["BTC/USDT".to_string(), "BTC/USDT".to_string()],
            ..AppConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_candle_limit_below_lookback_is_rejected() {
        let mut config = AppConfig::default();
        config.market.candle_limit = 20;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_single_tier_sentiment_is_valid() {
        let config = AppConfig {
            sentiment: SentimentConfig::single_tier(),
            ..AppConfig::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.sentiment.high_threshold, None);
    }
}
