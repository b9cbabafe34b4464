use log::{debug, error, info, warn};
use signal_broadcaster::analyzer::SentimentAnalyzer;
use signal_broadcaster::broadcaster::BroadcastContext;
use signal_broadcaster::command;
use signal_broadcaster::config_loader::{ConfigLoader, Secrets};
use signal_broadcaster::engine::SignalEngine;
use signal_broadcaster::registry::Registry;
use signal_broadcaster::source::{
    BinancePriceSourceFactory, CryptoPanicSource, RedditSource, SentimentSource, TelegramNotifier,
};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// 설정 파일 경로 환경 변수
const CONFIG_PATH_VAR: &str = "SIGNAL_CONFIG";
/// getUpdates 롱 폴링 대기 시간
const POLL_TIMEOUT: Duration = Duration::from_secs(30);

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() {
    // 로그 초기화
    env_logger::init();

    if let Err(e) = run().await {
        error!("실행 실패: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), BoxError> {
    info!("시그널 봇 시작");

    // 커맨드 라인 인수 또는 환경 변수로 설정 파일 지정
    let config_path = env::args()
        .nth(1)
        .or_else(|| env::var(CONFIG_PATH_VAR).ok())
        .map(PathBuf::from);
    debug!("설정 파일 경로: {:?}", config_path);

    let config = Arc::new(ConfigLoader::load_app_config(config_path.as_deref())?);
    let secrets = Secrets::from_env()?;
    info!("감시 종목: {}", config.watch_list.join(", "));

    let api = &config.api;
    let timeout = api.request_timeout();

    let mut sources: Vec<Arc<dyn SentimentSource>> = Vec::new();
    if let Some(token) = &secrets.cryptopanic_token {
        sources.push(Arc::new(CryptoPanicSource::new(
            api.cryptopanic_base_url.as_str(),
            token.as_str(),
            timeout,
        )?));
    }
    sources.push(Arc::new(RedditSource::new(
        api.reddit_base_url.as_str(),
        api.reddit_subreddit.as_str(),
        config.sentiment.sample_size,
        timeout,
    )?));

    let sentiment = SentimentAnalyzer::new(sources, &config.sentiment);
    let engine = Arc::new(SignalEngine::new(&config, Box::new(sentiment)));
    let notifier = Arc::new(TelegramNotifier::new(
        api.telegram_base_url.as_str(),
        secrets.telegram_token.as_str(),
        timeout,
    )?);
    let factory = Arc::new(BinancePriceSourceFactory::new(
        api.binance_base_url.as_str(),
        timeout,
    ));

    let registry = Arc::new(Registry::new(BroadcastContext {
        config: Arc::clone(&config),
        engine,
        notifier: notifier.clone(),
        price_sources: factory,
    }));

    tokio::select! {
        _ = poll_commands(&registry, &notifier) => {}
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!("종료 신호 대기 실패: {}", e);
            }
            info!("종료 신호 수신");
        }
    }

    registry.shutdown().await;
    info!("시그널 봇 종료");
    Ok(())
}

/// 채팅 명령을 롱 폴링으로 받아 처리합니다.
///
/// 업데이트마다 별도 태스크에서 처리하므로 느린 `/analyze`가 다른 채팅을 막지 않습니다.
async fn poll_commands(registry: &Arc<Registry>, notifier: &TelegramNotifier) {
    let backoff = registry.context().config.timing.error_backoff();
    let mut offset = 0_i64;

    loop {
        let updates = match notifier.get_updates(offset, POLL_TIMEOUT).await {
            Ok(updates) => updates,
            Err(e) => {
                error!("업데이트 조회 실패: {}", e);
                tokio::time::sleep(backoff).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);

            let Some((recipient, text)) = update.text_message() else {
                continue;
            };
            let registry = Arc::clone(registry);
            let text = text.to_string();
            tokio::spawn(async move {
                if let Err(e) = command::handle_text(&registry, recipient, &text).await {
                    error!("명령 응답 전송 실패 ({}): {}", recipient, e);
                }
            });
        }
    }
}
