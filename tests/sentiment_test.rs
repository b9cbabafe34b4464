use async_trait::async_trait;
use signal_broadcaster::analyzer::SentimentAnalyzer;
use signal_broadcaster::analyzer::sentiment_analyzer::SentimentProvider;
use signal_broadcaster::config::SentimentConfig;
use signal_broadcaster::model::{Confidence, Direction, LeafOpinion};
use signal_broadcaster::source::{SentimentChannel, SentimentSource, SourceError};
use std::sync::Arc;

struct StaticSource {
    channel: SentimentChannel,
    texts: Option<Vec<&'static str>>,
}

#[async_trait]
impl SentimentSource for StaticSource {
    fn name(&self) -> &'static str {
        "static"
    }

    fn channel(&self) -> SentimentChannel {
        self.channel
    }

    async fn fetch_texts(&self, _symbol: &str) -> Result<Vec<String>, SourceError> {
        match &self.texts {
            Some(texts) => Ok(texts.iter().map(|t| t.to_string()).collect()),
            None => Err(SourceError::Decode("unavailable".to_string())),
        }
    }
}

fn source(channel: SentimentChannel, texts: Option<Vec<&'static str>>) -> Arc<dyn SentimentSource> {
    Arc::new(StaticSource { channel, texts })
}

const BULLISH: &str = "Bitcoin rally continues, bullish breakout";
const BEARISH: &str = "Exchange hacked, market crash";

#[tokio::test]
async fn test_failed_channel_is_ignored() {
    let analyzer = SentimentAnalyzer::new(
        vec![
            source(SentimentChannel::News, Some(vec![BULLISH])),
            source(SentimentChannel::Social, None),
        ],
        &SentimentConfig::default(),
    );

    assert_eq!(
        analyzer.opinion("BTC/USDT").await,
        LeafOpinion::new(Direction::Buy, Confidence::High)
    );
}

#[tokio::test]
async fn test_bearish_social_only() {
    let analyzer = SentimentAnalyzer::new(
        vec![source(SentimentChannel::Social, Some(vec![BEARISH, BEARISH]))],
        &SentimentConfig::default(),
    );

    assert_eq!(
        analyzer.opinion("ETH/USDT").await,
        LeafOpinion::new(Direction::Sell, Confidence::High)
    );
}

#[tokio::test]
async fn test_all_channels_failing_is_neutral() {
    let analyzer = SentimentAnalyzer::new(
        vec![
            source(SentimentChannel::News, None),
            source(SentimentChannel::Social, None),
        ],
        &SentimentConfig::default(),
    );
    assert_eq!(analyzer.opinion("BTC/USDT").await, LeafOpinion::neutral());
}

#[tokio::test]
async fn test_empty_texts_are_neutral() {
    let analyzer = SentimentAnalyzer::new(
        vec![source(SentimentChannel::News, Some(Vec::new()))],
        &SentimentConfig::default(),
    );
    assert_eq!(analyzer.opinion("BTC/USDT").await, LeafOpinion::neutral());
}

#[tokio::test]
async fn test_disabled_layer_is_neutral() {
    let config = SentimentConfig {
        enabled: false,
        ..SentimentConfig::default()
    };
    let analyzer = SentimentAnalyzer::new(
        vec![source(SentimentChannel::News, Some(vec![BULLISH]))],
        &config,
    );
    assert_eq!(analyzer.opinion("BTC/USDT").await, LeafOpinion::neutral());
}
