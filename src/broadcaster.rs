use crate::config::AppConfig;
use crate::engine::{EngineError, SignalEngine};
use crate::gatekeeper::Gatekeeper;
use crate::message;
use crate::model::RecipientId;
use crate::profit::ProfitTracker;
use crate::source::{Notifier, PriceSource, PriceSourceFactory, SourceError};
use chrono::Utc;
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;

/// 사이클 단위 오류
#[derive(Debug, Error)]
pub enum BroadcastError {
    #[error("가격 소스 연결 실패: {0}")]
    Connect(#[source] SourceError),
    #[error("감시 종목 {0}개 모두 데이터 없음")]
    AllInstrumentsUnavailable(usize),
    #[error("모니터링 중지 요청")]
    Stopped,
}

/// 모든 모니터링 태스크가 공유하는 읽기 전용 의존성
#[derive(Clone)]
pub struct BroadcastContext {
    pub config: Arc<AppConfig>,
    pub engine: Arc<SignalEngine>,
    pub notifier: Arc<dyn Notifier>,
    pub price_sources: Arc<dyn PriceSourceFactory>,
}

/// 한 사이클의 처리 결과
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub analyzed: usize,
    pub delivered: usize,
    pub suppressed: usize,
    pub unavailable: usize,
    pub delivery_failed: usize,
}

enum InstrumentOutcome {
    Delivered,
    Suppressed,
    NoSignal,
    Unavailable,
    DeliveryFailed,
}

/// 중지 신호가 오면 즉시 깨어나는 대기
///
/// 대기 후에도 계속 실행 중이면 true
async fn interruptible_sleep(running: &mut watch::Receiver<bool>, duration: Duration) -> bool {
    if !*running.borrow() {
        return false;
    }
    if duration.is_zero() {
        return true;
    }

    let stopped = tokio::select! {
        _ = tokio::time::sleep(duration) => false,
        _ = running.wait_for(|running| !*running) => true,
    };

    !stopped && *running.borrow()
}

/// 수신자 한 명을 위한 브로드캐스트 루프
///
/// 게이트키퍼와 수익 추적기를 소유하며 종목을 순서대로 하나씩 처리합니다.
pub struct Broadcaster {
    recipient: RecipientId,
    ctx: BroadcastContext,
    gatekeeper: Gatekeeper,
    profits: ProfitTracker,
    running: watch::Receiver<bool>,
    cycles: u64,
}

impl Broadcaster {
    pub fn new(recipient: RecipientId, ctx: BroadcastContext, running: watch::Receiver<bool>) -> Self {
        let gatekeeper = Gatekeeper::new(&ctx.config.gatekeeper, &ctx.config.timing);
        let profits = ProfitTracker::new(ctx.config.timing.profit_retention());

        Broadcaster {
            recipient,
            ctx,
            gatekeeper,
            profits,
            running,
            cycles: 0,
        }
    }

    pub fn recipient(&self) -> RecipientId {
        self.recipient
    }

    pub fn gatekeeper(&self) -> &Gatekeeper {
        &self.gatekeeper
    }

    pub fn profits(&self) -> &ProfitTracker {
        &self.profits
    }

    fn is_running(&self) -> bool {
        *self.running.borrow()
    }

    async fn pause(&mut self, duration: Duration) -> bool {
        interruptible_sleep(&mut self.running, duration).await
    }

    /// 중지될 때까지 사이클을 반복합니다.
    ///
    /// 일시적인 오류로는 종료하지 않으며, 가격 소스 연결은 태스크가 끝날 때 해제됩니다.
    pub async fn run_forever(mut self) {
        info!("모니터링 시작: {}", self.recipient);
        let timing = self.ctx.config.timing.clone();
        let mut source: Option<Box<dyn PriceSource>> = None;

        while self.is_running() {
            let result = match source.as_deref() {
                Some(connected) => self.run_cycle(connected).await,
                None => match self.ctx.price_sources.connect().await {
                    Ok(connected) => {
                        debug!("가격 소스 연결: {}", self.recipient);
                        source = Some(connected);
                        continue;
                    }
                    Err(e) => Err(BroadcastError::Connect(e)),
                },
            };

            let wait = match result {
                Ok(report) => {
                    info!(
                        "사이클 완료 ({}): 분석 {}, 전송 {}, 억제 {}, 데이터 없음 {}, 전송 실패 {}",
                        self.recipient,
                        report.analyzed,
                        report.delivered,
                        report.suppressed,
                        report.unavailable,
                        report.delivery_failed
                    );
                    timing.analysis_interval()
                }
                Err(BroadcastError::Stopped) => break,
                Err(e) => {
                    error!("사이클 오류 ({}): {}", self.recipient, e);
                    // 다음 시도에서 새 연결을 맺음
                    source = None;
                    timing.error_backoff()
                }
            };

            if !self.pause(wait).await {
                break;
            }
        }

        info!("모니터링 종료: {}", self.recipient);
    }

    /// 감시 목록 전체를 한 번 처리합니다.
    pub async fn run_cycle(&mut self, source: &dyn PriceSource) -> Result<CycleReport, BroadcastError> {
        let config = Arc::clone(&self.ctx.config);
        let started = Utc::now();

        self.gatekeeper.retain_instruments(&config.watch_list);
        self.gatekeeper.prune_expired(started);
        self.profits.retain_instruments(&config.watch_list);
        self.profits.prune_expired(started);

        let mut report = CycleReport::default();
        let delay = config.timing.inter_instrument_delay();

        for (idx, symbol) in config.watch_list.iter().enumerate() {
            if !self.is_running() {
                return Err(BroadcastError::Stopped);
            }
            if idx > 0 && !self.pause(delay).await {
                return Err(BroadcastError::Stopped);
            }

            match self.process_instrument(source, symbol).await? {
                InstrumentOutcome::Delivered => {
                    report.analyzed += 1;
                    report.delivered += 1;
                }
                InstrumentOutcome::Suppressed => {
                    report.analyzed += 1;
                    report.suppressed += 1;
                }
                InstrumentOutcome::NoSignal => report.analyzed += 1,
                InstrumentOutcome::Unavailable => report.unavailable += 1,
                InstrumentOutcome::DeliveryFailed => {
                    report.analyzed += 1;
                    report.delivery_failed += 1;
                }
            }
        }

        self.cycles += 1;
        self.send_profit_report().await;

        if report.analyzed == 0 && report.unavailable > 0 {
            return Err(BroadcastError::AllInstrumentsUnavailable(report.unavailable));
        }
        Ok(report)
    }

    async fn process_instrument(
        &mut self,
        source: &dyn PriceSource,
        symbol: &str,
    ) -> Result<InstrumentOutcome, BroadcastError> {
        let now = Utc::now();
        let analysis = match self.ctx.engine.fetch_and_analyze(source, symbol, now).await {
            Ok(analysis) => analysis,
            Err(EngineError::Source { .. }) => return Ok(InstrumentOutcome::Unavailable),
            Err(e) => {
                warn!("{} 분석 건너뜀: {}", symbol, e);
                return Ok(InstrumentOutcome::Unavailable);
            }
        };

        // 조회 중 중지되었다면 전송하지 않음
        if !self.is_running() {
            return Err(BroadcastError::Stopped);
        }

        let signal = &analysis.signal;
        self.profits.refresh(symbol, signal.price, now);

        let key = self.gatekeeper.key(self.recipient, symbol);
        if !self
            .gatekeeper
            .should_deliver(&key, signal.direction, signal.confidence, now)
        {
            return Ok(if signal.direction.is_actionable() {
                InstrumentOutcome::Suppressed
            } else {
                InstrumentOutcome::NoSignal
            });
        }

        let text = message::render_signal(&analysis);
        match self.ctx.notifier.deliver(self.recipient, &text).await {
            Ok(()) => {
                self.gatekeeper.record(key, signal.direction, now);
                self.profits.open(signal);
                info!("신호 전송 ({}): {}", self.recipient, signal);
                Ok(InstrumentOutcome::Delivered)
            }
            Err(e) => {
                error!("신호 전송 실패 ({}): {} - {}", self.recipient, signal, e);
                Ok(InstrumentOutcome::DeliveryFailed)
            }
        }
    }

    async fn send_profit_report(&mut self) {
        let every = self.ctx.config.timing.profit_report_every_cycles;
        if every == 0 || self.cycles % every != 0 || self.profits.is_empty() {
            return;
        }

        let text = message::render_profit_report(&self.profits.tracks());
        if let Err(e) = self.ctx.notifier.deliver(self.recipient, &text).await {
            warn!("수익 리포트 전송 실패 ({}): {}", self.recipient, e);
        }
    }
}
