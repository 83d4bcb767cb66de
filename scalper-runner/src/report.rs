//! Human-readable reports: signal panel lines, order ticket, backtest summary.

use scalper_core::domain::{BacktestResults, ExecutionParams, Gates, Setup, SignalState, TrendTag};
use scalper_core::execution_params::PositionSizing;
use scalper_core::indicators::IndicatorSet;
use scalper_core::state::AppState;

/// Price with precision by magnitude: 4 decimals under 1, 2 under 100,
/// otherwise rounded with thousands separators. Zero and NaN read `$0.0000`.
pub fn format_price(price: f64) -> String {
    if price == 0.0 || price.is_nan() {
        return "$0.0000".to_string();
    }
    if price < 1.0 {
        return format!("${price:.4}");
    }
    if price < 100.0 {
        return format!("${price:.2}");
    }
    format!("${}", group_thousands(price.round() as i64))
}

fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value < 0 {
        grouped.insert(0, '-');
    }
    grouped
}

/// Quote currency stripped from the symbol (`SOLUSDT` → `SOL`).
pub fn base_asset(symbol: &str) -> String {
    symbol.replacen("USDT", "", 1)
}

/// Trend tag from the latest value of each EMA series.
pub fn trend_tag(indicators: &IndicatorSet) -> TrendTag {
    TrendTag::classify(
        indicators.ema8.last_value(),
        indicators.ema21.last_value(),
        indicators.ema50.last_value(),
    )
}

/// One-line reason and risk note for the current signal.
pub fn signal_comment(state: SignalState, gates: &Gates) -> String {
    let passed = gates.passed_labels();
    if passed.is_empty() {
        return "Reason: waiting for signal. Risk: no active risk.".to_string();
    }

    let risk = if state == SignalState::NoTrade {
        "no active risk"
    } else if passed.len() < 4 {
        "standard market risk"
    } else {
        "check volatility / news"
    };

    let joined = passed.join("/");
    if passed.len() == 4 {
        format!("Reason: all gates passed ({joined}). Risk: {risk}.")
    } else {
        format!("Reason: partial setup ({joined}). Risk: {risk}.")
    }
}

/// Entry, stop, targets and trailing stop as display lines.
pub fn signal_lines(state: &AppState) -> Vec<String> {
    let p = &state.execution_params;
    let direction = p.direction.map_or("NONE", |d| d.as_str());
    let trailing_active = state.signal_engine == SignalState::Entry;
    vec![
        format!(
            "Entry: {} | Direction: {direction} | Market: {}",
            format_price(p.entry),
            format_price(p.current_market_price.unwrap_or(0.0))
        ),
        format!("SL: {} (≈1×ATR14)", format_price(p.stop_loss)),
        format!(
            "TP1: {} (1R) | TP2: {} (2R)",
            format_price(p.tp1),
            format_price(p.tp2)
        ),
        format!(
            "TS: {} (0.5×ATR) active: {trailing_active}",
            format_price(p.trailing_stop)
        ),
    ]
}

/// Plain-text order ticket for manual entry on an exchange.
pub fn order_ticket(params: &ExecutionParams, symbol: &str, sizing: &PositionSizing) -> String {
    let direction = params.direction.map_or("NONE", |d| d.as_str());
    let lines = [
        "--- Scalper Order ---".to_string(),
        format!("Direction: {direction}"),
        format!("Symbol: {symbol}"),
        format!(
            "Position Size: {:.4} {} ({:.2} USDT)",
            sizing.position_size,
            base_asset(symbol),
            sizing.notional
        ),
        format!("Max Risk: ${:.2}", sizing.max_risk),
        String::new(),
        format!("Entry: {}", params.entry),
        format!("Stop Loss: {}", params.stop_loss),
        format!("Take Profit 1: {}", params.tp1),
        format!("Take Profit 2: {}", params.tp2),
        format!("Trailing Stop: {}", params.trailing_stop),
        "---------------------".to_string(),
    ];
    lines.join("\n")
}

/// Statistics block followed by one line per setup.
pub fn backtest_summary(results: &BacktestResults) -> String {
    let mut out = format!(
        "setups: {}\nhit rate: {:.1}%\navg R: {:.2}\nexpectancy: {:.2}\nmax DD: {:.1}%\nvariance R: {:.2}\nrule adherence: {:.0}",
        results.setups.len(),
        results.hit_rate,
        results.avg_r,
        results.expectancy,
        results.max_dd,
        results.variance_r,
        results.rule_adherence
    );
    for (n, setup) in results.setups.iter().enumerate() {
        let line = match setup {
            Setup::Sampled(s) => format!(
                "{:>3}. entry {:.4} stop {:.4} tp {:.4} r {:+.2}",
                n + 1,
                s.entry,
                s.stop,
                s.tp,
                s.r
            ),
            Setup::Historical(h) => format!(
                "{:>3}. {} {} entry {:.4} stop {:.4} tp1 {:.4} tp2 {:.4} atr {:.4} vol×{:.2}",
                n + 1,
                h.time,
                h.direction.as_str(),
                h.entry,
                h.stop,
                h.tp1,
                h.tp2,
                h.atr,
                h.volume_ratio
            ),
        };
        out.push('\n');
        out.push_str(&line);
    }
    out
}
