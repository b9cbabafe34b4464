use crate::analyzer::CandleAnalyzer;
use crate::candle::Candle;
use crate::candle_store::CandleStore;
use crate::config::PatternConfig;
use crate::indicator::utils::moving_average;
use crate::model::{Confidence, Direction, LeafOpinion};
use log::{debug, warn};
use std::fmt::Display;
use std::marker::PhantomData;

/// 감지 대상 차트 패턴 목록
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartPattern {
    BullishEngulfing,
    BearishEngulfing,
    MorningStar,
    EveningStar,
    DoubleBottom,
    DoubleTop,
    InverseHeadAndShoulders,
    HeadAndShoulders,
    UpTrend,
    DownTrend,
}

impl ChartPattern {
    /// 패턴이 가리키는 방향
    pub fn direction(&self) -> Direction {
        match self {
            ChartPattern::BullishEngulfing
            | ChartPattern::MorningStar
            | ChartPattern::DoubleBottom
            | ChartPattern::InverseHeadAndShoulders
            | ChartPattern::UpTrend => Direction::Buy,
            ChartPattern::BearishEngulfing
            | ChartPattern::EveningStar
            | ChartPattern::DoubleTop
            | ChartPattern::HeadAndShoulders
            | ChartPattern::DownTrend => Direction::Sell,
        }
    }

    /// 패턴별 기본 신뢰도 (0.0 ~ 1.0)
    pub fn base_confidence(&self) -> f64 {
        match self {
            ChartPattern::MorningStar | ChartPattern::EveningStar => 0.9,
            ChartPattern::BullishEngulfing
            | ChartPattern::BearishEngulfing
            | ChartPattern::HeadAndShoulders
            | ChartPattern::InverseHeadAndShoulders => 0.8,
            ChartPattern::DoubleTop | ChartPattern::DoubleBottom => 0.7,
            ChartPattern::UpTrend | ChartPattern::DownTrend => 0.6,
        }
    }
}

impl Display for ChartPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ChartPattern::BullishEngulfing => "Bullish Engulfing",
            ChartPattern::BearishEngulfing => "Bearish Engulfing",
            ChartPattern::MorningStar => "Morning Star",
            ChartPattern::EveningStar => "Evening Star",
            ChartPattern::DoubleBottom => "Double Bottom",
            ChartPattern::DoubleTop => "Double Top",
            ChartPattern::InverseHeadAndShoulders => "Inverse Head and Shoulders",
            ChartPattern::HeadAndShoulders => "Head and Shoulders",
            ChartPattern::UpTrend => "Uptrend",
            ChartPattern::DownTrend => "Downtrend",
        };
        write!(f, "{}", name)
    }
}

/// 감지된 패턴 목록을 하나의 의견으로 축약합니다.
///
/// 한쪽 방향만 있으면 High, 양쪽이 섞이면 가장 강한 패턴의 기본 신뢰도가
/// 더 높은 쪽이 Medium으로 이깁니다. 동률이면 Sell입니다.
pub fn opinion_from_patterns(patterns: &[ChartPattern]) -> LeafOpinion {
    let strongest = |direction: Direction| {
        patterns
            .iter()
            .filter(|p| p.direction() == direction)
            .map(|p| p.base_confidence())
            .fold(None, |acc: Option<f64>, c| Some(acc.map_or(c, |a| a.max(c))))
    };

    match (strongest(Direction::Buy), strongest(Direction::Sell)) {
        (Some(_), None) => LeafOpinion::new(Direction::Buy, Confidence::High),
        (None, Some(_)) => LeafOpinion::new(Direction::Sell, Confidence::High),
        (Some(bull), Some(bear)) if bull > bear => {
            LeafOpinion::new(Direction::Buy, Confidence::Medium)
        }
        (Some(_), Some(_)) => LeafOpinion::new(Direction::Sell, Confidence::Medium),
        (None, None) => LeafOpinion::neutral(),
    }
}

fn relative_diff(a: f64, b: f64) -> Option<f64> {
    if a.abs() < f64::EPSILON {
        return None;
    }
    Some((a - b).abs() / a.abs())
}

/// 양옆 `reach`개 값보다 모두 엄격히 큰(또는 작은) 지점 (인덱스, 값)
fn local_extrema(values: &[f64], reach: usize, maxima: bool) -> Vec<(usize, f64)> {
    if values.len() < reach * 2 + 1 {
        return Vec::new();
    }

    (reach..values.len() - reach)
        .filter(|&i| {
            (1..=reach).all(|d| {
                let (left, right) = (values[i - d], values[i + d]);
                if maxima {
                    values[i] > left && values[i] > right
                } else {
                    values[i] < left && values[i] < right
                }
            })
        })
        .map(|i| (i, values[i]))
        .collect()
}

fn is_monotonic(values: &[f64], increasing: bool) -> bool {
    values.windows(2).all(|w| {
        if increasing {
            w[1] >= w[0]
        } else {
            w[1] <= w[0]
        }
    })
}

/// 차트 패턴 분석기
#[derive(Debug)]
pub struct PatternAnalyzer<C: Candle> {
    config: PatternConfig,
    _phantom: PhantomData<C>,
}

impl<C: Candle> PatternAnalyzer<C> {
    pub fn new(config: &PatternConfig) -> Self {
        PatternAnalyzer {
            config: config.clone(),
            _phantom: PhantomData,
        }
    }

    /// 저장소에서 감지되는 모든 패턴 (목록 순서대로)
    pub fn detect(&self, storage: &CandleStore<C>) -> Vec<ChartPattern> {
        if !storage.is_well_formed() {
            warn!("유한하지 않은 캔들이 있어 패턴 분석을 건너뜁니다");
            return Vec::new();
        }

        let data = storage.get_time_ordered_items();
        let mut found = Vec::new();

        if let [.., prev, curr] = data.as_slice() {
            if Self::is_bullish_engulfing(prev, curr) {
                found.push(ChartPattern::BullishEngulfing);
            }
            if Self::is_bearish_engulfing(prev, curr) {
                found.push(ChartPattern::BearishEngulfing);
            }
        }

        if let [.., first, second, third] = data.as_slice() {
            if self.is_star(first, second, third, Direction::Buy) {
                found.push(ChartPattern::MorningStar);
            }
            if self.is_star(first, second, third, Direction::Sell) {
                found.push(ChartPattern::EveningStar);
            }
        }

        let highs = data.iter().map(|c| c.high_price()).collect::<Vec<_>>();
        let lows = data.iter().map(|c| c.low_price()).collect::<Vec<_>>();
        let closes = data.iter().map(|c| c.close_price()).collect::<Vec<_>>();

        if self.is_double_extreme(&lows, false) {
            found.push(ChartPattern::DoubleBottom);
        }
        if self.is_double_extreme(&highs, true) {
            found.push(ChartPattern::DoubleTop);
        }
        if self.is_head_and_shoulders(&lows, false) {
            found.push(ChartPattern::InverseHeadAndShoulders);
        }
        if self.is_head_and_shoulders(&highs, true) {
            found.push(ChartPattern::HeadAndShoulders);
        }
        if self.is_trend(&closes, true) {
            found.push(ChartPattern::UpTrend);
        }
        if self.is_trend(&closes, false) {
            found.push(ChartPattern::DownTrend);
        }

        found
    }

    fn is_bullish_engulfing(prev: &C, curr: &C) -> bool {
        prev.is_bearish()
            && curr.is_bullish()
            && curr.open_price() < prev.close_price()
            && curr.close_price() > prev.open_price()
    }

    fn is_bearish_engulfing(prev: &C, curr: &C) -> bool {
        prev.is_bullish()
            && curr.is_bearish()
            && curr.open_price() > prev.close_price()
            && curr.close_price() < prev.open_price()
    }

    /// Buy면 모닝 스타, Sell이면 이브닝 스타
    fn is_star(&self, first: &C, second: &C, third: &C, direction: Direction) -> bool {
        let midpoint = (first.open_price() + first.close_price()) / 2.0;
        let small_middle = second.body() < first.body() * self.config.star_body_ratio;

        match direction {
            Direction::Buy => {
                first.is_bearish()
                    && small_middle
                    && third.is_bullish()
                    && third.close_price() > midpoint
            }
            Direction::Sell => {
                first.is_bullish()
                    && small_middle
                    && third.is_bearish()
                    && third.close_price() < midpoint
            }
            Direction::Hold => false,
        }
    }

    /// 최근 구간에서 가장 극단적인 두 고점(저점)이 비슷한 높이인지 확인
    fn is_double_extreme(&self, values: &[f64], tops: bool) -> bool {
        let window = self.config.double_window;
        if values.len() < window {
            return false;
        }

        let mut extrema = local_extrema(&values[values.len() - window..], 1, tops);
        if extrema.len() < 2 {
            return false;
        }

        extrema.sort_by(|a, b| {
            let ord = a.1.total_cmp(&b.1);
            if tops { ord.reverse() } else { ord }
        });

        relative_diff(extrema[0].1, extrema[1].1)
            .is_some_and(|diff| diff < self.config.similarity_threshold)
    }

    /// 가장 극단적인 세 봉우리를 위치 순으로 놓았을 때 가운데가 머리이고
    /// 양 어깨 높이가 비슷한지 확인
    fn is_head_and_shoulders(&self, values: &[f64], tops: bool) -> bool {
        let window = self.config.head_shoulders_window;
        if values.len() < window {
            return false;
        }

        let mut extrema = local_extrema(&values[values.len() - window..], 2, tops);
        if extrema.len() < 3 {
            return false;
        }

        extrema.sort_by(|a, b| {
            let ord = a.1.total_cmp(&b.1);
            if tops { ord.reverse() } else { ord }
        });
        let mut three = extrema[..3].to_vec();
        three.sort_by_key(|(idx, _)| *idx);

        let (left, head, right) = (three[0].1, three[1].1, three[2].1);
        let head_is_extreme = if tops {
            head > left && head > right
        } else {
            head < left && head < right
        };

        head_is_extreme
            && relative_diff(left, right)
                .is_some_and(|diff| diff < self.config.similarity_threshold)
    }

    /// 종가가 단기/장기 SMA와 정배열(역배열)이고 단기 SMA가 최근 단조 증가(감소)인지 확인
    fn is_trend(&self, closes: &[f64], up: bool) -> bool {
        let (Ok(short), Ok(long)) = (
            moving_average::sma_series(closes, self.config.trend_short_sma),
            moving_average::sma_series(closes, self.config.trend_long_sma),
        ) else {
            return false;
        };
        let confirm = self.config.trend_confirm_bars;

        let (Some(&close), Some(&short_last), Some(&long_last)) =
            (closes.last(), short.last(), long.last())
        else {
            return false;
        };

        if short.len() < confirm {
            return false;
        }

        let aligned = if up {
            close > short_last && short_last > long_last
        } else {
            close < short_last && short_last < long_last
        };

        aligned && is_monotonic(&short[short.len() - confirm..], up)
    }
}

impl<C: Candle> CandleAnalyzer<C> for PatternAnalyzer<C> {
    fn name(&self) -> &'static str {
        "pattern"
    }

    fn analyze(&self, storage: &CandleStore<C>) -> LeafOpinion {
        self.analyze_detailed(storage).0
    }

    fn analyze_detailed(&self, storage: &CandleStore<C>) -> (LeafOpinion, Vec<String>) {
        let patterns = self.detect(storage);
        let opinion = opinion_from_patterns(&patterns);

        if !patterns.is_empty() {
            debug!("감지된 패턴: {:?} → {}", patterns, opinion);
        }

        (
            opinion,
            patterns.iter().map(|p| p.to_string()).collect(),
        )
    }
}
