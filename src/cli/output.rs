//! Terminal output
//!
//! [`ConsoleEventSink`] prints the human-facing lines as events arrive and
//! forwards every event to the structured sink it wraps.

use rust_decimal::Decimal;

use crate::domain::{ExchangeAck, StrategyKind};
use crate::strategy::{EventSink, ExecutionEvent, OrderRole, PlanMetadata, RunReport};

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const RESET: &str = "\x1b[0m";

/// Plan description printed before TWAP and grid execution
pub fn render_plan(symbol: &str, metadata: &PlanMetadata) -> Vec<String> {
    match metadata {
        PlanMetadata::Twap {
            total_quantity,
            chunk_size,
            num_chunks,
            remainder,
            interval,
        } => {
            let mut lines = vec![
                format!("TWAP plan for {symbol}: {total_quantity} total"),
                format!("  Chunks:    {num_chunks} x {chunk_size}"),
            ];
            if *remainder > Decimal::ZERO {
                lines.push(format!("  Remainder: {remainder}"));
            }
            lines.push(format!("  Interval:  {:.1}s", interval.as_secs_f64()));
            lines
        }
        PlanMetadata::Grid {
            current_price,
            price_low,
            price_high,
            step,
            quantity_per_level,
        } => vec![
            format!("Grid plan for {symbol}"),
            format!("  Current price: {current_price}"),
            format!("  Range:         {price_low} - {price_high}"),
            format!("  Step:          {}", step.normalize()),
            format!("  Qty per level: {quantity_per_level}"),
        ],
        PlanMetadata::Single | PlanMetadata::Bracket { .. } => Vec::new(),
    }
}

fn role_label(strategy: StrategyKind, role: OrderRole) -> String {
    match role {
        OrderRole::Single => format!("{} order", strategy.display_name()),
        OrderRole::BracketLimit => "Take-profit limit".to_string(),
        OrderRole::BracketStop => "Protective stop".to_string(),
        OrderRole::GridLevel { level, total } => format!("Grid order {level}/{total}"),
        OrderRole::TwapChunk { chunk, total } => format!("TWAP chunk {chunk}/{total}"),
        OrderRole::TwapRemainder => "TWAP remainder".to_string(),
    }
}

/// Lines describing one acknowledged order
pub fn render_ack(strategy: StrategyKind, role: OrderRole, ack: &ExchangeAck) -> Vec<String> {
    let dash = "-";
    let mut detail = format!(
        "id {} | {} {} {}",
        ack.order_id_display(),
        ack.side.as_deref().unwrap_or(dash),
        ack.orig_qty.as_deref().unwrap_or(dash),
        ack.symbol.as_deref().unwrap_or(dash),
    );
    if let Some(price) = ack.price.as_deref().filter(|p| !is_zero(p)) {
        detail.push_str(&format!(" @ {price}"));
    }
    if let Some(stop) = ack.stop_price.as_deref().filter(|p| !is_zero(p)) {
        detail.push_str(&format!(" stop {stop}"));
    }
    detail.push_str(&format!(" | {}", ack.status.as_deref().unwrap_or(dash)));

    let mut lines = vec![format!("✓ {}: {}", role_label(strategy, role), detail)];
    if let Some(executed) = ack.executed_price() {
        lines.push(format!(
            "    executed {} @ {}",
            ack.executed_qty.as_deref().unwrap_or(dash),
            executed
        ));
    }
    for fill in ack.fills.iter().flatten() {
        lines.push(format!(
            "    fill {} @ {}",
            fill.qty.as_deref().unwrap_or(dash),
            fill.price.as_deref().unwrap_or(dash)
        ));
    }
    lines
}

fn is_zero(raw: &str) -> bool {
    raw.parse::<Decimal>().map(|d| d.is_zero()).unwrap_or(false)
}

/// Closing lines for a finished run
pub fn render_summary(report: &RunReport) -> Vec<String> {
    let summary = &report.summary;
    let mut lines = vec![summary.headline()];
    if summary.failed > 0 {
        lines.push(format!("  Failed orders: {}", summary.failed));
    }
    if summary.skipped() > 0 {
        lines.push(format!("  Not attempted: {}", summary.skipped()));
    }
    if report.cancelled() {
        lines.push("  Run cancelled before all orders were placed".to_string());
    }
    if report.plan.strategy == StrategyKind::Bracket && summary.succeeded > 0 {
        lines.push(
            "  Reminder: bracket legs are independent orders. Cancel the other leg manually once one fills."
                .to_string(),
        );
    }
    lines
}

pub fn print_summary(report: &RunReport) {
    let color = if report.overall_success() && !report.cancelled() {
        GREEN
    } else {
        YELLOW
    };
    let mut lines = render_summary(report).into_iter();
    if let Some(headline) = lines.next() {
        println!("\n{color}{headline}{RESET}");
    }
    for line in lines {
        println!("{line}");
    }
}

/// Prints human output for each event, then forwards it
pub struct ConsoleEventSink<S> {
    inner: S,
}

impl<S: EventSink> ConsoleEventSink<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S: EventSink> EventSink for ConsoleEventSink<S> {
    fn emit(&self, event: &ExecutionEvent) {
        match event {
            ExecutionEvent::ConnectionEstablished { .. } => {
                println!("{CYAN}Connected to exchange{RESET}");
            }
            ExecutionEvent::PlanInitialized {
                symbol, metadata, ..
            } => {
                for line in render_plan(symbol, metadata) {
                    println!("{line}");
                }
            }
            ExecutionEvent::UnlinkedBracket => {
                println!("{YELLOW}Bracket legs are placed as two separate orders{RESET}");
            }
            ExecutionEvent::OrderPlaced {
                strategy, role, ack, ..
            } => {
                let mut lines = render_ack(*strategy, *role, ack).into_iter();
                if let Some(first) = lines.next() {
                    println!("{GREEN}{first}{RESET}");
                }
                for line in lines {
                    println!("{line}");
                }
            }
            ExecutionEvent::ExecutionFailed { error_type, error } => {
                println!("{RED}✗ {error_type}: {error}{RESET}");
            }
            ExecutionEvent::ValidationFailed { reason, .. } => {
                println!("{RED}✗ Invalid parameters: {reason}{RESET}");
            }
            ExecutionEvent::Cancelled { attempted, planned } => {
                println!("{YELLOW}Cancelled after {attempted}/{planned} orders{RESET}");
            }
            ExecutionEvent::MarketSnapshot { .. }
            | ExecutionEvent::RequestIssued { .. }
            | ExecutionEvent::ExecutionCompleted { .. } => {}
        }
        self.inner.emit(event);
    }
}
