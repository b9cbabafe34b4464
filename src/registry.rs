use crate::broadcaster::{BroadcastContext, Broadcaster};
use crate::engine::{Analysis, EngineError};
use crate::model::RecipientId;
use chrono::Utc;
use log::{info, warn};
use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// 시작/중지 요청 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorStatus {
    Started,
    AlreadyRunning,
    Stopped,
    NotRunning,
}

struct MonitorHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// 수신자별 모니터링 태스크 관리자
///
/// 수신자당 최대 하나의 태스크만 실행됩니다.
pub struct Registry {
    ctx: BroadcastContext,
    monitors: Mutex<HashMap<RecipientId, MonitorHandle>>,
}

impl Registry {
    pub fn new(ctx: BroadcastContext) -> Self {
        Registry {
            ctx,
            monitors: Mutex::new(HashMap::new()),
        }
    }

    pub fn context(&self) -> &BroadcastContext {
        &self.ctx
    }

    /// 수신자의 모니터링 태스크를 시작합니다.
    ///
    /// 이미 실행 중이면 아무것도 하지 않습니다. 스스로 끝난 태스크는 새로 시작합니다.
    /// tokio 런타임 안에서 호출해야 합니다.
    pub fn start_monitoring(&self, recipient: RecipientId) -> MonitorStatus {
        let mut monitors = self.monitors.lock();

        if let Some(handle) = monitors.get(&recipient) {
            if !handle.task.is_finished() {
                return MonitorStatus::AlreadyRunning;
            }
            monitors.remove(&recipient);
        }

        let (stop, running) = watch::channel(true);
        let broadcaster = Broadcaster::new(recipient, self.ctx.clone(), running);
        let task = tokio::spawn(broadcaster.run_forever());

        monitors.insert(recipient, MonitorHandle { stop, task });
        info!("모니터링 등록: {} (활성 {}명)", recipient, monitors.len());
        MonitorStatus::Started
    }

    /// 수신자의 모니터링 태스크에 중지를 알립니다.
    ///
    /// 진행 중인 조회는 끝까지 기다리지 않으며, 반환 후에는 새 신호가 전송되지 않습니다.
    pub fn stop_monitoring(&self, recipient: RecipientId) -> MonitorStatus {
        let handle = self.monitors.lock().remove(&recipient);

        match handle {
            Some(handle) => {
                // 수신 측이 이미 종료되었으면 전송 실패는 무시
                let _ = handle.stop.send(false);
                info!("모니터링 해제: {}", recipient);
                MonitorStatus::Stopped
            }
            None => MonitorStatus::NotRunning,
        }
    }

    pub fn is_monitoring(&self, recipient: RecipientId) -> bool {
        self.monitors
            .lock()
            .get(&recipient)
            .is_some_and(|handle| !handle.task.is_finished())
    }

    /// 활성 수신자 목록 (id 순)
    pub fn active_recipients(&self) -> Vec<RecipientId> {
        let mut recipients = self
            .monitors
            .lock()
            .iter()
            .filter(|(_, handle)| !handle.task.is_finished())
            .map(|(recipient, _)| *recipient)
            .collect::<Vec<_>>();
        recipients.sort_by_key(|recipient| recipient.0);
        recipients
    }

    /// 게이트키퍼를 거치지 않는 일회성 분석
    ///
    /// 게이트키퍼 상태를 바꾸지 않으므로 반복 호출해도 결과에 영향이 없습니다.
    pub async fn analyze_once(&self, symbol: &str) -> Result<Analysis, EngineError> {
        let source = self
            .ctx
            .price_sources
            .connect()
            .await
            .map_err(|e| EngineError::Source {
                symbol: symbol.to_string(),
                source: e,
            })?;

        self.ctx
            .engine
            .fetch_and_analyze(source.as_ref(), symbol, Utc::now())
            .await
    }

    /// 모든 태스크를 중지하고 종료를 기다립니다.
    pub async fn shutdown(&self) {
        let handles = self
            .monitors
            .lock()
            .drain()
            .map(|(_, handle)| handle)
            .collect::<Vec<_>>();

        for handle in &handles {
            let _ = handle.stop.send(false);
        }

        for handle in handles {
            if let Err(e) = handle.task.await {
                warn!("모니터링 태스크 종료 오류: {}", e);
            }
        }
        info!("모든 모니터링 종료");
    }
}
