use crate::message;
use crate::model::RecipientId;
use crate::registry::{MonitorStatus, Registry};
use crate::source::NotifyError;
use log::{error, info};

const WELCOME: &str = "Welcome to the Crypto Trading Bot! 🚀\n\n\
Available commands:\n\
/analyze <symbol> - Analyze a cryptocurrency (e.g., /analyze BTC/USDT)\n\
/monitor - Start monitoring all pairs in this chat\n\
/stop_monitor - Stop monitoring in this chat\n\
/help - Show this help message";

const HELP: &str = "🤖 Crypto Trading Bot Help\n\n\
Commands:\n\
/analyze <symbol> - Analyze a cryptocurrency\n\
Example: /analyze BTC/USDT\n\n\
/monitor - Start automatic monitoring of all pairs\n\
/stop_monitor - Stop automatic monitoring\n\n\
The bot uses multiple analysis layers:\n\
1. Technical Analysis (RSI, MACD, EMA, BB)\n\
2. Pattern Recognition\n\
3. Market Sentiment\n\n\
Signals are generated based on the confluence of these factors.";

const USAGE: &str = "Please use one of the available commands:\n\
/start - Start the bot\n\
/help - Show help message\n\
/analyze <symbol> - Analyze a cryptocurrency\n\
/monitor - Start monitoring\n\
/stop_monitor - Stop monitoring";

const MISSING_SYMBOL: &str = "Please provide a symbol (e.g., /analyze BTC/USDT)";

/// 기본 견적 통화
const DEFAULT_QUOTE: &str = "USDT";

/// 채팅 명령
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    /// 심볼이 없으면 None
    Analyze(Option<String>),
    Monitor,
    StopMonitor,
    /// 명령이 아닌 텍스트 또는 알 수 없는 명령
    Unknown,
}

impl Command {
    /// 메시지 텍스트를 명령으로 해석합니다.
    ///
    /// `/analyze@my_bot btc` 처럼 봇 이름이 붙은 형태도 허용합니다.
    pub fn parse(text: &str) -> Self {
        let mut parts = text.split_whitespace();
        let Some(head) = parts.next() else {
            return Command::Unknown;
        };
        let Some(name) = head.strip_prefix('/') else {
            return Command::Unknown;
        };
        let name = name.split('@').next().unwrap_or_default();

        match name.to_ascii_lowercase().as_str() {
            "start" => Command::Start,
            "help" => Command::Help,
            "analyze" => Command::Analyze(parts.next().and_then(normalize_symbol)),
            "monitor" => Command::Monitor,
            "stop_monitor" => Command::StopMonitor,
            _ => Command::Unknown,
        }
    }
}

/// 대문자로 바꾸고, 견적 통화가 없으면 USDT를 붙입니다.
pub fn normalize_symbol(raw: &str) -> Option<String> {
    let symbol = raw.trim().to_ascii_uppercase();
    if symbol.is_empty() || symbol.starts_with('/') || symbol.ends_with('/') {
        return None;
    }

    if symbol.contains('/') {
        Some(symbol)
    } else {
        Some(format!("{}/{}", symbol, DEFAULT_QUOTE))
    }
}

/// 명령을 처리하고 응답 목록을 순서대로 반환합니다.
pub async fn dispatch(registry: &Registry, recipient: RecipientId, command: Command) -> Vec<String> {
    info!("명령 수신 ({}): {:?}", recipient, command);

    match command {
        Command::Start => vec![WELCOME.to_string()],
        Command::Help => vec![HELP.to_string()],
        Command::Unknown => vec![USAGE.to_string()],
        Command::Analyze(None) => vec![MISSING_SYMBOL.to_string()],
        Command::Analyze(Some(symbol)) => match registry.analyze_once(&symbol).await {
            Ok(analysis) => vec![message::render_analysis(&analysis)],
            Err(e) => {
                error!("{} 일회성 분석 실패: {}", symbol, e);
                vec![format!(
                    "Error fetching price data for {}. Please try again later.",
                    symbol
                )]
            }
        },
        Command::Monitor => match registry.start_monitoring(recipient) {
            MonitorStatus::AlreadyRunning => {
                vec!["Monitoring is already active in this chat.".to_string()]
            }
            _ => vec![
                "✅ Started monitoring all pairs in this chat.\n\
                 You will receive automatic signals when trading opportunities are detected."
                    .to_string(),
            ],
        },
        Command::StopMonitor => match registry.stop_monitoring(recipient) {
            MonitorStatus::NotRunning => vec!["No active monitoring in this chat.".to_string()],
            _ => vec!["Stopped monitoring in this chat.".to_string()],
        },
    }
}

/// 텍스트를 해석하고 응답을 알림 전송자로 보냅니다.
///
/// 분석 명령은 결과 전에 대기 안내를 먼저 보냅니다.
pub async fn handle_text(
    registry: &Registry,
    recipient: RecipientId,
    text: &str,
) -> Result<(), NotifyError> {
    let command = Command::parse(text);
    let notifier = registry.context().notifier.clone();

    if let Command::Analyze(Some(symbol)) = &command {
        notifier
            .deliver(recipient, &format!("Analyzing {}... Please wait.", symbol))
            .await?;
    }

    for reply in dispatch(registry, recipient, command).await {
        notifier.deliver(recipient, &reply).await?;
    }
    Ok(())
}
