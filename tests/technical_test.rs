mod common_test_utils;
use common_test_utils::*;

use signal_broadcaster::analyzer::{CandleAnalyzer, PatternAnalyzer, TechnicalAnalyzer, TechnicalScoring};
use signal_broadcaster::candle_store::CandleStore;
use signal_broadcaster::config::{IndicatorConfig, PatternConfig};
use signal_broadcaster::model::{Confidence, Direction, LeafOpinion};

fn technical(scoring: TechnicalScoring) -> TechnicalAnalyzer<TestCandle> {
    let config = IndicatorConfig {
        scoring,
        ..IndicatorConfig::default()
    };
    TechnicalAnalyzer::new(&config)
}

fn quadratic(count: usize, sign: f64) -> Vec<f64> {
    (0..count)
        .map(|i| 1000.0 + sign * 0.05 * (i * i) as f64)
        .collect()
}

#[test]
fn test_series_shorter_than_lookback_is_neutral() {
    let analyzer = technical(TechnicalScoring::MajorityCount);
    let lookback = analyzer.lookback();
    assert_eq!(lookback, IndicatorConfig::default().max_lookback());

    for len in [0, 1, 10, lookback - 1] {
        let store = store_from_closes(&quadratic(len, 1.0));
        assert_eq!(analyzer.analyze(&store), LeafOpinion::neutral(), "len {}", len);
    }
}

#[test]
fn test_exact_lookback_produces_opinion() {
    let analyzer = technical(TechnicalScoring::MajorityCount);
    let store = store_from_closes(&quadratic(analyzer.lookback(), 1.0));
    assert!(analyzer.snapshot(&store).is_ok());
}

#[test]
fn test_non_finite_prices_are_neutral() {
    let analyzer = technical(TechnicalScoring::MajorityCount);
    let mut closes = quadratic(60, 1.0);
    closes[59] = f64::NAN;
    let store = store_from_closes(&closes);
    assert_eq!(analyzer.analyze(&store), LeafOpinion::neutral());
}

#[test]
fn test_accelerating_uptrend_is_bullish() {
    // RSI는 과매수(매도 표)지만 MACD와 EMA가 매수 표
    let analyzer = technical(TechnicalScoring::MajorityCount);
    let store = store_from_closes(&quadratic(60, 1.0));
    assert_eq!(
        analyzer.analyze(&store),
        LeafOpinion::new(Direction::Buy, Confidence::High)
    );
}

#[test]
fn test_accelerating_downtrend_is_bearish() {
    let analyzer = technical(TechnicalScoring::MajorityCount);
    let store = store_from_closes(&quadratic(60, -1.0));
    assert_eq!(
        analyzer.analyze(&store),
        LeafOpinion::new(Direction::Sell, Confidence::High)
    );
}

#[test]
fn test_flat_series_is_neutral_under_both_scorings() {
    let closes = vec![250.0; 60];
    let store = store_from_closes(&closes);

    for scoring in [TechnicalScoring::MajorityCount, TechnicalScoring::StrengthAccumulation] {
        assert_eq!(technical(scoring).analyze(&store), LeafOpinion::neutral());
    }
}

#[test]
fn test_strength_accumulation_first_vote_decides() {
    // 상승 추세에서는 RSI 과매수가 먼저 Sell로 결정하고 이후 매수 표는 무시됨
    let analyzer = technical(TechnicalScoring::StrengthAccumulation);
    let store = store_from_closes(&quadratic(60, 1.0));
    let opinion = analyzer.analyze(&store);
    assert_ne!(opinion.direction, Direction::Buy);
}

#[test]
fn test_pattern_leaf_degrades_on_tiny_series() {
    let analyzer = PatternAnalyzer::<TestCandle>::new(&PatternConfig::default());

    let empty = CandleStore::<TestCandle>::new(Vec::new(), 10, false);
    assert_eq!(analyzer.analyze(&empty), LeafOpinion::neutral());

    let single = store_from_closes(&[100.0]);
    assert_eq!(analyzer.analyze(&single), LeafOpinion::neutral());
    assert!(analyzer.detect(&single).is_empty());
}

#[test]
fn test_pattern_leaf_sees_steady_uptrend() {
    let analyzer = PatternAnalyzer::<TestCandle>::new(&PatternConfig::default());
    let store = CandleStore::new(create_uptrend_candles(80, 100.0, 1.0), 80, false);

    let (opinion, patterns) = analyzer.analyze_detailed(&store);
    assert!(patterns.iter().any(|p| p == "Uptrend"));
    assert_eq!(opinion.direction, Direction::Buy);
}
