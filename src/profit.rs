use crate::model::{Direction, FusedSignal};
use chrono::{DateTime, Duration, Utc};
use log::debug;
use std::collections::HashMap;

/// 전송된 신호 이후의 가격 움직임 추적
#[derive(Debug, Clone, PartialEq)]
pub struct ProfitTrack {
    pub symbol: String,
    pub entry_price: f64,
    pub direction: Direction,
    pub entry_time: DateTime<Utc>,
    pub last_price: f64,
    pub last_update: DateTime<Utc>,
}

impl ProfitTrack {
    /// 방향을 반영한 수익률 (%)
    ///
    /// Buy는 상승이, Sell은 하락이 이익입니다.
    pub fn profit_pct(&self) -> f64 {
        if self.entry_price.abs() < f64::EPSILON {
            return 0.0;
        }

        let raw = (self.last_price - self.entry_price) / self.entry_price * 100.0;
        match self.direction {
            Direction::Sell => -raw,
            _ => raw,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>, retention: Duration) -> bool {
        now - self.entry_time >= retention
    }
}

/// 종목별 수익 추적기
///
/// 모니터링 태스크 하나가 소유합니다.
#[derive(Debug, Clone)]
pub struct ProfitTracker {
    retention: Duration,
    tracks: HashMap<String, ProfitTrack>,
}

impl ProfitTracker {
    pub fn new(retention: Duration) -> Self {
        ProfitTracker {
            retention,
            tracks: HashMap::new(),
        }
    }

    /// 전송된 신호로 추적을 시작합니다. 같은 종목의 이전 추적은 덮어씁니다.
    pub fn open(&mut self, signal: &FusedSignal) {
        if !signal.direction.is_actionable() {
            return;
        }

        self.tracks.insert(
            signal.symbol.clone(),
            ProfitTrack {
                symbol: signal.symbol.clone(),
                entry_price: signal.price,
                direction: signal.direction,
                entry_time: signal.timestamp,
                last_price: signal.price,
                last_update: signal.timestamp,
            },
        );
    }

    /// 추적 중인 종목이면 최신 가격으로 갱신합니다.
    pub fn refresh(&mut self, symbol: &str, price: f64, now: DateTime<Utc>) {
        if !price.is_finite() {
            return;
        }

        if let Some(track) = self.tracks.get_mut(symbol) {
            track.last_price = price;
            track.last_update = now;
        }
    }

    /// 진입 후 보존 기간이 지난 추적을 제거합니다.
    pub fn prune_expired(&mut self, now: DateTime<Utc>) {
        let retention = self.retention;
        let before = self.tracks.len();
        self.tracks.retain(|_, track| !track.is_expired(now, retention));

        if self.tracks.len() != before {
            debug!("만료된 수익 추적 {}건 제거", before - self.tracks.len());
        }
    }

    pub fn retain_instruments(&mut self, watch_list: &[String]) {
        self.tracks.retain(|symbol, _| watch_list.contains(symbol));
    }

    pub fn get(&self, symbol: &str) -> Option<&ProfitTrack> {
        self.tracks.get(symbol)
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// 종목 이름 순으로 정렬된 추적 목록
    pub fn tracks(&self) -> Vec<&ProfitTrack> {
        let mut tracks = self.tracks.values().collect::<Vec<_>>();
        tracks.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        tracks
    }
}
