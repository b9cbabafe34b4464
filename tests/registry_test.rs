mod common_test_utils;
use common_test_utils::*;

use signal_broadcaster::broadcaster::BroadcastContext;
use signal_broadcaster::command::{self, Command};
use signal_broadcaster::engine::{EngineError, SignalEngine};
use signal_broadcaster::model::{Confidence, Direction, LeafOpinion, RecipientId};
use signal_broadcaster::registry::{MonitorStatus, Registry};
use std::sync::Arc;

const SYMBOL: &str = "BTC/USDT";

struct Fixture {
    registry: Registry,
    notifier: Arc<RecordingNotifier>,
    factory: MockPriceSourceFactory,
}

fn fixture() -> Fixture {
    let mut config = test_config(&[SYMBOL]);
    config.timing.analysis_interval_secs = 3600;

    let engine = SignalEngine::with_analyzers(
        &config,
        Box::new(FixedAnalyzer(LeafOpinion::new(Direction::Sell, Confidence::High))),
        Box::new(FixedAnalyzer(LeafOpinion::new(Direction::Sell, Confidence::High))),
        Box::new(FixedSentiment(LeafOpinion::new(Direction::Buy, Confidence::Medium))),
    );
    let notifier = Arc::new(RecordingNotifier::new());
    let factory = MockPriceSourceFactory::new(MockPriceSource::new(vec![(
        SYMBOL,
        ohlcv_series(SYMBOL, 60, 43_000.0),
    )]));

    let registry = Registry::new(BroadcastContext {
        config: Arc::new(config),
        engine: Arc::new(engine),
        notifier: notifier.clone(),
        price_sources: Arc::new(factory.clone()),
    });

    Fixture {
        registry,
        notifier,
        factory,
    }
}

#[tokio::test]
async fn test_start_and_stop_are_idempotent() {
    let fx = fixture();
    let recipient = RecipientId(42);

    assert_eq!(fx.registry.stop_monitoring(recipient), MonitorStatus::NotRunning);
    assert_eq!(fx.registry.start_monitoring(recipient), MonitorStatus::Started);
    assert_eq!(
        fx.registry.start_monitoring(recipient),
        MonitorStatus::AlreadyRunning
    );
    assert!(fx.registry.is_monitoring(recipient));
    assert_eq!(fx.registry.active_recipients(), vec![recipient]);

    assert_eq!(fx.registry.stop_monitoring(recipient), MonitorStatus::Stopped);
    assert_eq!(fx.registry.stop_monitoring(recipient), MonitorStatus::NotRunning);
    assert!(!fx.registry.is_monitoring(recipient));

    fx.registry.shutdown().await;
}

#[tokio::test]
async fn test_recipients_are_monitored_independently() {
    let fx = fixture();

    fx.registry.start_monitoring(RecipientId(2));
    fx.registry.start_monitoring(RecipientId(1));
    assert_eq!(
        fx.registry.active_recipients(),
        vec![RecipientId(1), RecipientId(2)]
    );

    fx.registry.stop_monitoring(RecipientId(1));
    assert_eq!(fx.registry.active_recipients(), vec![RecipientId(2)]);

    fx.registry.shutdown().await;
    assert!(fx.registry.active_recipients().is_empty());
}

#[tokio::test]
async fn test_each_task_delivers_to_its_own_recipient() {
    let fx = fixture();

    fx.registry.start_monitoring(RecipientId(1));
    fx.registry.start_monitoring(RecipientId(2));

    for _ in 0..100 {
        if fx.notifier.count() >= 2 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    fx.registry.shutdown().await;

    let mut recipients = fx
        .notifier
        .sent()
        .into_iter()
        .map(|(recipient, _)| recipient)
        .collect::<Vec<_>>();
    recipients.sort();
    assert_eq!(recipients, vec![RecipientId(1), RecipientId(2)]);
    assert_eq!(fx.factory.connects(), 2);
}

#[tokio::test]
async fn test_analyze_once_is_read_only() {
    let fx = fixture();

    let first = fx.registry.analyze_once(SYMBOL).await.unwrap();
    let second = fx.registry.analyze_once(SYMBOL).await.unwrap();

    assert_eq!(first.signal.direction, Direction::Sell);
    assert_eq!(first.signal.confidence, Confidence::High);
    assert_eq!(first.signal.direction, second.signal.direction);
    assert_eq!(first.signal.confidence, second.signal.confidence);
    assert_eq!(first.opinions, second.opinions);
    assert_eq!(fx.notifier.count(), 0);
}

#[tokio::test]
async fn test_analyze_once_unknown_symbol() {
    let fx = fixture();
    let result = fx.registry.analyze_once("NOPE/USDT").await;
    assert!(matches!(result, Err(EngineError::Source { .. })));
}

#[tokio::test]
async fn test_chat_commands() {
    let fx = fixture();
    let recipient = RecipientId(9);

    let replies = command::dispatch(&fx.registry, recipient, Command::Monitor).await;
    assert!(replies[0].starts_with("✅ Started monitoring"));
    let replies = command::dispatch(&fx.registry, recipient, Command::Monitor).await;
    assert_eq!(replies, vec!["Monitoring is already active in this chat."]);

    let replies = command::dispatch(&fx.registry, recipient, Command::StopMonitor).await;
    assert_eq!(replies, vec!["Stopped monitoring in this chat."]);
    let replies = command::dispatch(&fx.registry, recipient, Command::StopMonitor).await;
    assert_eq!(replies, vec!["No active monitoring in this chat."]);

    let replies = command::dispatch(&fx.registry, recipient, Command::Analyze(None)).await;
    assert!(replies[0].contains("Please provide a symbol"));

    fx.registry.shutdown().await;
}

#[tokio::test]
async fn test_analyze_command_sends_wait_notice_then_result() {
    let fx = fixture();
    let recipient = RecipientId(9);

    command::handle_text(&fx.registry, recipient, "/analyze btc")
        .await
        .unwrap();

    let sent = fx.notifier.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].1, "Analyzing BTC/USDT... Please wait.");
    assert!(sent[1].1.contains("Analysis for BTC/USDT"));
    assert!(sent[1].1.contains("Sell"));
}

#[tokio::test]
async fn test_commands_from_different_chats_run_concurrently() {
    let fx = fixture();
    let registry = Arc::new(fx.registry);

    let tasks = [RecipientId(1), RecipientId(2)].map(|recipient| {
        let registry = Arc::clone(&registry);
        tokio::spawn(async move {
            command::handle_text(&registry, recipient, "/analyze btc").await
        })
    });
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let sent = fx.notifier.sent();
    assert_eq!(sent.len(), 4);
    for recipient in [RecipientId(1), RecipientId(2)] {
        let replies = sent
            .iter()
            .filter(|(to, _)| *to == recipient)
            .map(|(_, text)| text.as_str())
            .collect::<Vec<_>>();
        assert_eq!(replies[0], "Analyzing BTC/USDT... Please wait.");
        assert!(replies[1].contains("Analysis for BTC/USDT"));
    }
}
