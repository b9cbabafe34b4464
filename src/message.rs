use crate::engine::Analysis;
use crate::indicator::ma::MA;
use crate::model::Direction;
use crate::profit::ProfitTrack;
use std::fmt::Write;

const DISCLAIMER: &str =
    "⚠️ Disclaimer: This is not financial advice. Always do your own research before trading.";

/// 진입/손절/익절 가격
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradingLevels {
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
}

impl TradingLevels {
    /// Buy는 1% 아래 진입, 3% 손절/익절. Sell은 대칭. Hold는 None.
    pub fn for_direction(direction: Direction, price: f64) -> Option<Self> {
        match direction {
            Direction::Buy => Some(TradingLevels {
                entry: price * 0.99,
                stop_loss: price * 0.97,
                take_profit: price * 1.03,
            }),
            Direction::Sell => Some(TradingLevels {
                entry: price * 1.01,
                stop_loss: price * 1.03,
                take_profit: price * 0.97,
            }),
            Direction::Hold => None,
        }
    }
}

/// 1 미만 가격은 소수점 6자리, 나머지는 2자리
pub fn format_price(price: f64) -> String {
    if price.abs() < 1.0 {
        format!("${:.6}", price)
    } else {
        format!("${:.2}", price)
    }
}

fn write_indicators(out: &mut String, analysis: &Analysis) {
    let Some(ind) = &analysis.indicators else {
        return;
    };

    let _ = writeln!(out, "📊 Technical Indicators:");
    let _ = writeln!(out, "RSI: {:.2}", ind.rsi.value());
    let _ = writeln!(
        out,
        "MACD: {:.2} (signal {:.2})",
        ind.macd.macd_line, ind.macd.signal_line
    );
    let _ = writeln!(
        out,
        "EMA ({}/{}): {:.2}/{:.2}",
        ind.ema_short.period(),
        ind.ema_long.period(),
        ind.ema_short_value(),
        ind.ema_long_value()
    );
    let _ = writeln!(
        out,
        "BB: {:.2} / {:.2} / {:.2}",
        ind.bband.lower, ind.bband.middle, ind.bband.upper
    );
    let _ = writeln!(
        out,
        "BB %B: {:.2}, width {:.2}%",
        ind.bband.percent_b(ind.close),
        ind.bband.bandwidth() * 100.0
    );
    out.push('\n');
}

fn write_patterns(out: &mut String, analysis: &Analysis) {
    if analysis.patterns.is_empty() {
        return;
    }
    let _ = writeln!(out, "🧩 Patterns: {}\n", analysis.patterns.join(", "));
}

fn write_levels(out: &mut String, direction: Direction, price: f64) {
    if let Some(levels) = TradingLevels::for_direction(direction, price) {
        let _ = writeln!(out, "🎯 Trading Levels:");
        let _ = writeln!(out, "Entry: {}", format_price(levels.entry));
        let _ = writeln!(out, "Stop Loss: {}", format_price(levels.stop_loss));
        let _ = writeln!(out, "Take Profit: {}\n", format_price(levels.take_profit));
    }
}

/// 브로드캐스트용 신호 메시지
pub fn render_signal(analysis: &Analysis) -> String {
    let signal = &analysis.signal;
    let mut out = String::new();

    let _ = writeln!(out, "🔔 Trading Signal for {}\n", signal.symbol);
    let _ = writeln!(out, "Signal: {}", signal.direction);
    let _ = writeln!(out, "Confidence: {}", signal.confidence);
    let _ = writeln!(out, "Current Price: {}\n", format_price(signal.price));

    write_indicators(&mut out, analysis);
    write_patterns(&mut out, analysis);
    write_levels(&mut out, signal.direction, signal.price);

    out.push_str(DISCLAIMER);
    out
}

/// `/analyze` 응답용 메시지 (레이어별 의견 포함)
pub fn render_analysis(analysis: &Analysis) -> String {
    let signal = &analysis.signal;
    let opinions = &analysis.opinions;
    let mut out = String::new();

    let _ = writeln!(out, "🔍 Analysis for {}\n", signal.symbol);
    let _ = writeln!(out, "Signal: {}", signal.direction);
    let _ = writeln!(out, "Confidence: {}", signal.confidence);
    let _ = writeln!(out, "Current Price: {}\n", format_price(signal.price));
    let _ = writeln!(out, "Technical: {}", opinions.technical);
    let _ = writeln!(out, "Pattern: {}", opinions.pattern);
    let _ = writeln!(out, "Sentiment: {}\n", opinions.sentiment);

    write_indicators(&mut out, analysis);
    write_patterns(&mut out, analysis);
    write_levels(&mut out, signal.direction, signal.price);

    out.push_str(DISCLAIMER);
    out
}

/// 열린 수익 추적 요약
pub fn render_profit_report(tracks: &[&ProfitTrack]) -> String {
    let mut out = String::from("📈 Signal Performance\n\n");

    if tracks.is_empty() {
        out.push_str("No open signals.");
        return out;
    }

    for track in tracks {
        let _ = writeln!(
            out,
            "{} {}: {} → {} ({:+.2}%)",
            track.symbol,
            track.direction,
            format_price(track.entry_price),
            format_price(track.last_price),
            track.profit_pct()
        );
    }
    out.trim_end().to_string()
}
