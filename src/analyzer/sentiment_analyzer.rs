use crate::config::SentimentConfig;
use crate::model::{Confidence, Direction, LeafOpinion};
use crate::source::{SentimentChannel, SentimentSource};
use async_trait::async_trait;
use log::{debug, warn};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

/// 단어별 극성 (-1.0 ~ 1.0)
static LEXICON: Lazy<HashMap<&'static str, f64>> = Lazy::new(|| {
    [
        // 긍정
        ("bull", 0.5),
        ("bullish", 0.7),
        ("rally", 0.6),
        ("rallies", 0.6),
        ("surge", 0.6),
        ("surges", 0.6),
        ("soar", 0.7),
        ("soars", 0.7),
        ("gain", 0.4),
        ("gains", 0.4),
        ("growth", 0.4),
        ("breakout", 0.5),
        ("adoption", 0.4),
        ("approve", 0.5),
        ("approved", 0.5),
        ("approval", 0.5),
        ("record", 0.3),
        ("high", 0.16),
        ("strong", 0.43),
        ("positive", 0.23),
        ("good", 0.7),
        ("great", 0.8),
        ("best", 1.0),
        ("profit", 0.5),
        ("profits", 0.5),
        ("up", 0.2),
        ("moon", 0.6),
        ("optimistic", 0.6),
        ("buy", 0.3),
        ("success", 0.6),
        ("win", 0.8),
        ("recover", 0.4),
        ("recovery", 0.4),
        ("support", 0.2),
        ("upgrade", 0.5),
        ("inflows", 0.4),
        ("partnership", 0.4),
        // 부정
        ("bear", -0.5),
        ("bearish", -0.7),
        ("crash", -0.8),
        ("crashes", -0.8),
        ("dump", -0.6),
        ("plunge", -0.7),
        ("plunges", -0.7),
        ("drop", -0.4),
        ("drops", -0.4),
        ("fall", -0.4),
        ("falls", -0.4),
        ("loss", -0.5),
        ("losses", -0.5),
        ("low", -0.16),
        ("weak", -0.4),
        ("negative", -0.3),
        ("bad", -0.7),
        ("worst", -1.0),
        ("fear", -0.6),
        ("panic", -0.7),
        ("hack", -0.8),
        ("hacked", -0.8),
        ("scam", -0.9),
        ("fraud", -0.9),
        ("ban", -0.6),
        ("banned", -0.6),
        ("lawsuit", -0.5),
        ("sell", -0.3),
        ("selloff", -0.6),
        ("down", -0.2),
        ("worried", -0.5),
        ("risk", -0.3),
        ("delay", -0.3),
        ("delayed", -0.3),
        ("reject", -0.5),
        ("rejected", -0.5),
        ("liquidation", -0.5),
        ("liquidations", -0.5),
        ("outflows", -0.4),
        ("downgrade", -0.5),
    ]
    .into_iter()
    .collect()
});

/// 바로 뒤 극성 단어의 부호를 뒤집고 세기를 줄이는 단어
const NEGATIONS: [&str; 8] = [
    "not", "no", "never", "isn't", "don't", "doesn't", "won't", "can't",
];

/// 바로 뒤 극성 단어를 강조하는 단어와 배율
static INTENSIFIERS: Lazy<HashMap<&'static str, f64>> = Lazy::new(|| {
    [
        ("very", 1.3),
        ("extremely", 1.5),
        ("really", 1.2),
        ("highly", 1.3),
        ("massive", 1.4),
        ("huge", 1.3),
    ]
    .into_iter()
    .collect()
});

/// 어휘 사전 기반 극성 점수기
#[derive(Debug, Clone, Copy, Default)]
pub struct PolarityScorer;

impl PolarityScorer {
    pub fn new() -> Self {
        PolarityScorer
    }

    /// 텍스트 하나의 극성 (-1.0 ~ 1.0)
    ///
    /// 극성 단어가 없으면 0.0입니다. 부정어 뒤의 단어는 -0.5배,
    /// 강조어 뒤의 단어는 배율만큼 커집니다.
    pub fn score(&self, text: &str) -> f64 {
        let lowered = text.to_lowercase();
        let tokens = lowered
            .split(|c: char| !(c.is_alphanumeric() || c == '\''))
            .filter(|t| !t.is_empty());

        let mut modifier = 1.0;
        let mut polarities = Vec::new();

        for token in tokens {
            if NEGATIONS.iter().any(|n| *n == token) {
                modifier *= -0.5;
                continue;
            }
            if let Some(factor) = INTENSIFIERS.get(token) {
                modifier *= factor;
                continue;
            }
            if let Some(polarity) = LEXICON.get(token) {
                polarities.push((polarity * modifier).clamp(-1.0, 1.0));
            }
            modifier = 1.0;
        }

        if polarities.is_empty() {
            return 0.0;
        }
        polarities.iter().sum::<f64>() / polarities.len() as f64
    }

    /// 텍스트 목록의 평균 극성. 목록이 비어 있으면 None.
    pub fn average(&self, texts: &[String]) -> Option<f64> {
        if texts.is_empty() {
            return None;
        }
        Some(texts.iter().map(|t| self.score(t)).sum::<f64>() / texts.len() as f64)
    }
}

/// 종목 심볼로 감성 의견을 내는 제공자
#[async_trait]
pub trait SentimentProvider: Send + Sync {
    async fn opinion(&self, symbol: &str) -> LeafOpinion;
}

/// 뉴스/소셜 텍스트 기반 감성 분석기
pub struct SentimentAnalyzer {
    sources: Vec<Arc<dyn SentimentSource>>,
    scorer: PolarityScorer,
    config: SentimentConfig,
}

impl Debug for SentimentAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentimentAnalyzer")
            .field(
                "sources",
                &self.sources.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .field("config", &self.config)
            .finish()
    }
}

impl SentimentAnalyzer {
    pub fn new(sources: Vec<Arc<dyn SentimentSource>>, config: &SentimentConfig) -> Self {
        SentimentAnalyzer {
            sources,
            scorer: PolarityScorer::new(),
            config: config.clone(),
        }
    }

    /// 채널 점수 중 값이 있는 것만 평균합니다.
    ///
    /// 데이터가 없는 채널은 0점으로 세지 않고 평균에서 뺍니다.
    /// 한 채널만 응답해도 점수가 절반으로 줄지 않습니다.
    pub fn combine(channel_scores: &[Option<f64>]) -> Option<f64> {
        let present = channel_scores.iter().flatten().collect::<Vec<_>>();
        if present.is_empty() {
            return None;
        }
        Some(present.iter().copied().sum::<f64>() / present.len() as f64)
    }

    /// 합산 점수를 임계값에 따라 의견으로 변환합니다.
    pub fn opinion_from_score(&self, score: f64) -> LeafOpinion {
        if !score.is_finite() {
            return LeafOpinion::neutral();
        }

        if let Some(high) = self.config.high_threshold {
            if score > high {
                return LeafOpinion::new(Direction::Buy, Confidence::High);
            }
            if score < -high {
                return LeafOpinion::new(Direction::Sell, Confidence::High);
            }
        }

        let medium = self.config.medium_threshold;
        if score > medium {
            LeafOpinion::new(Direction::Buy, Confidence::Medium)
        } else if score < -medium {
            LeafOpinion::new(Direction::Sell, Confidence::Medium)
        } else {
            LeafOpinion::neutral()
        }
    }

    async fn channel_score(&self, channel: SentimentChannel, symbol: &str) -> Option<f64> {
        let mut texts = Vec::new();
        for source in self.sources.iter().filter(|s| s.channel() == channel) {
            match source.fetch_texts(symbol).await {
                Ok(mut fetched) => {
                    fetched.truncate(self.config.sample_size);
                    texts.extend(fetched);
                }
                Err(e) => warn!("{} 조회 실패 ({}): {}", source.name(), symbol, e),
            }
        }
        self.scorer.average(&texts)
    }
}

#[async_trait]
impl SentimentProvider for SentimentAnalyzer {
    async fn opinion(&self, symbol: &str) -> LeafOpinion {
        if !self.config.enabled || self.sources.is_empty() {
            return LeafOpinion::neutral();
        }

        let news = self.channel_score(SentimentChannel::News, symbol).await;
        let social = self.channel_score(SentimentChannel::Social, symbol).await;

        match Self::combine(&[news, social]) {
            Some(score) => {
                let opinion = self.opinion_from_score(score);
                debug!(
                    "감성 분석 {}: news={:?}, social={:?}, score={:.3} → {}",
                    symbol, news, social, score, opinion
                );
                opinion
            }
            None => {
                debug!("감성 데이터 없음: {}", symbol);
                LeafOpinion::neutral()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polarity_scorer() {
        let scorer = PolarityScorer::new();
        assert!(scorer.score("Bitcoin rally continues, bullish breakout") > 0.5);
        assert!(scorer.score("Exchange hacked, market crash") < -0.5);
        assert_eq!(scorer.score("Bitcoin trades sideways today"), 0.0);
    }

    #[test]
    fn test_negation_flips_polarity() {
        let scorer = PolarityScorer::new();
        assert!(scorer.score("this is good") > 0.0);
        assert!(scorer.score("this is not good") < 0.0);
        assert!(scorer.score("very bad") < scorer.score("bad"));
    }

    #[test]
    fn test_combine_uses_only_present_channels() {
        assert_eq!(SentimentAnalyzer::combine(&[Some(0.4), None]), Some(0.4));
        assert_eq!(SentimentAnalyzer::combine(&[Some(0.4), Some(0.0)]), Some(0.2));
        assert_eq!(SentimentAnalyzer::combine(&[None, None]), None);
    }

    #[test]
    fn test_two_tier_thresholds() {
        let analyzer = SentimentAnalyzer::new(Vec::new(), &SentimentConfig::default());
        assert_eq!(
            analyzer.opinion_from_score(0.35),
            LeafOpinion::new(Direction::Buy, Confidence::High)
        );
        assert_eq!(
            analyzer.opinion_from_score(0.2),
            LeafOpinion::new(Direction::Buy, Confidence::Medium)
        );
        assert_eq!(
            analyzer.opinion_from_score(-0.31),
            LeafOpinion::new(Direction::Sell, Confidence::High)
        );
        assert_eq!(analyzer.opinion_from_score(0.1), LeafOpinion::neutral());
        assert_eq!(analyzer.opinion_from_score(f64::NAN), LeafOpinion::neutral());
    }

    #[test]
    fn test_single_tier_thresholds() {
        let analyzer = SentimentAnalyzer::new(Vec::new(), &SentimentConfig::single_tier());
        assert_eq!(
            analyzer.opinion_from_score(0.9),
            LeafOpinion::new(Direction::Buy, Confidence::Medium)
        );
        assert_eq!(
            analyzer.opinion_from_score(-0.25),
            LeafOpinion::new(Direction::Sell, Confidence::Medium)
        );
        assert_eq!(analyzer.opinion_from_score(0.15), LeafOpinion::neutral());
    }
}
