use crate::config::{GatekeeperConfig, TimingConfig};
use crate::model::{Confidence, Direction, RecipientId};
use chrono::{DateTime, Duration, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt::Display;

/// 쿨다운 키 단위
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum KeyMode {
    /// 수신자당 하나의 기록 (종목 무관)
    Recipient,
    /// 수신자 + 종목마다 기록
    #[default]
    RecipientInstrument,
}

/// 쿨다운이 끝난 뒤 재전송 조건
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RedeliveryPolicy {
    /// 마지막으로 보낸 방향과 달라야 전송
    #[default]
    DirectionChange,
    /// 마지막 전송이 만료된 뒤에만 전송 (방향 무관)
    Expiry,
}

/// 전송 가능한 최소 신뢰도
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DeliveryFloor {
    /// High만 전송
    #[default]
    Strict,
    /// None보다 높으면 전송
    Relaxed,
}

impl DeliveryFloor {
    pub fn admits(&self, confidence: Confidence) -> bool {
        match self {
            DeliveryFloor::Strict => confidence == Confidence::High,
            DeliveryFloor::Relaxed => confidence > Confidence::None,
        }
    }
}

/// 게이트키퍼 기록 키
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GateKey {
    pub recipient: RecipientId,
    /// `KeyMode::Recipient`이면 None
    pub instrument: Option<String>,
}

impl Display for GateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.instrument {
            Some(instrument) => write!(f, "{}:{}", self.recipient, instrument),
            None => write!(f, "{}", self.recipient),
        }
    }
}

/// 마지막으로 전송된 신호
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalRecord {
    /// Hold는 기록되지 않음
    pub direction: Direction,
    pub delivered_at: DateTime<Utc>,
}

/// 키별 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Unseen,
    Cooling,
    Eligible,
}

/// 쿨다운/중복 제거 게이트키퍼
///
/// 모니터링 태스크 하나가 소유하므로 내부 잠금이 없습니다.
#[derive(Debug, Clone)]
pub struct Gatekeeper {
    key_mode: KeyMode,
    redelivery: RedeliveryPolicy,
    floor: DeliveryFloor,
    min_interval: Duration,
    expiry: Duration,
    records: HashMap<GateKey, SignalRecord>,
}

impl Gatekeeper {
    pub fn new(config: &GatekeeperConfig, timing: &TimingConfig) -> Self {
        Self::with_params(
            config.key_mode,
            config.redelivery,
            config.delivery_floor,
            timing.min_signal_interval(),
            timing.signal_expiry(),
        )
    }

    pub fn with_params(
        key_mode: KeyMode,
        redelivery: RedeliveryPolicy,
        floor: DeliveryFloor,
        min_interval: Duration,
        expiry: Duration,
    ) -> Self {
        Gatekeeper {
            key_mode,
            redelivery,
            floor,
            min_interval,
            expiry,
            records: HashMap::new(),
        }
    }

    pub fn redelivery(&self) -> RedeliveryPolicy {
        self.redelivery
    }

    /// 키 단위 설정에 맞는 키 생성
    pub fn key(&self, recipient: RecipientId, instrument: &str) -> GateKey {
        GateKey {
            recipient,
            instrument: match self.key_mode {
                KeyMode::Recipient => None,
                KeyMode::RecipientInstrument => Some(instrument.to_string()),
            },
        }
    }

    pub fn last_record(&self, key: &GateKey) -> Option<&SignalRecord> {
        self.records.get(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 현재 시각 기준 키 상태
    pub fn state(&self, key: &GateKey, now: DateTime<Utc>) -> GateState {
        match self.records.get(key) {
            None => GateState::Unseen,
            Some(record) if now - record.delivered_at < self.min_interval => GateState::Cooling,
            Some(_) => GateState::Eligible,
        }
    }

    /// 제안된 신호를 전송해도 되는지 판단합니다. 상태는 바꾸지 않습니다.
    pub fn should_deliver(
        &self,
        key: &GateKey,
        direction: Direction,
        confidence: Confidence,
        now: DateTime<Utc>,
    ) -> bool {
        if !direction.is_actionable() || !self.floor.admits(confidence) {
            return false;
        }

        let decision = match (self.state(key, now), self.records.get(key)) {
            (GateState::Unseen, _) => true,
            (GateState::Cooling, _) => false,
            (GateState::Eligible, Some(record)) => match self.redelivery {
                RedeliveryPolicy::DirectionChange => record.direction != direction,
                RedeliveryPolicy::Expiry => now - record.delivered_at >= self.expiry,
            },
            (GateState::Eligible, None) => true,
        };

        debug!(
            "게이트키퍼 {}: {}({}) → {}",
            key,
            direction,
            confidence,
            if decision { "전송" } else { "억제" }
        );
        decision
    }

    /// 전송 성공 후 기록을 덮어씁니다.
    pub fn record(&mut self, key: GateKey, direction: Direction, now: DateTime<Utc>) {
        if !direction.is_actionable() {
            warn!("Hold 신호는 기록하지 않습니다: {}", key);
            return;
        }

        self.records.insert(
            key,
            SignalRecord {
                direction,
                delivered_at: now,
            },
        );
    }

    /// 감시 목록에 없는 종목의 기록을 제거합니다.
    pub fn retain_instruments(&mut self, watch_list: &[String]) {
        let watched = watch_list.iter().map(String::as_str).collect::<HashSet<_>>();
        let before = self.records.len();

        self.records.retain(|key, _| match &key.instrument {
            Some(instrument) => watched.contains(instrument.as_str()),
            None => true,
        });

        if self.records.len() != before {
            debug!("감시 해제 종목 기록 {}건 제거", before - self.records.len());
        }
    }

    /// Expiry 정책에서 더 이상 판단에 영향이 없는 오래된 기록을 제거합니다.
    ///
    /// DirectionChange 정책에서는 마지막 방향이 계속 필요하므로 아무것도 지우지 않습니다.
    pub fn prune_expired(&mut self, now: DateTime<Utc>) {
        if self.redelivery != RedeliveryPolicy::Expiry {
            return;
        }

        let horizon = self.min_interval.max(self.expiry);
        self.records
            .retain(|_, record| now - record.delivered_at < horizon);
    }
}
