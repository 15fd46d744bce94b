//! Outcome aggregation

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{json, Value};

use super::engine::ExecutionLedger;
use super::planner::ExecutionPlan;
use crate::domain::StrategyKind;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub strategy: StrategyKind,
    pub symbol: String,
    pub planned: usize,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// `succeeded / planned`, as a percentage with two decimals
    pub success_rate: Decimal,
}

impl Summary {
    /// Planned orders that were never attempted (halted chunks, cancellation)
    pub fn skipped(&self) -> usize {
        self.planned.saturating_sub(self.attempted)
    }

    pub fn log_fields(&self) -> Value {
        json!({
            "order_type": self.strategy.as_str().to_uppercase(),
            "symbol": self.symbol,
            "planned_orders": self.planned,
            "attempted_orders": self.attempted,
            "successful_orders": self.succeeded,
            "failed_orders": self.failed,
            "success_rate": format!("{}%", self.success_rate),
        })
    }

    /// One-line human summary
    pub fn headline(&self) -> String {
        format!(
            "{} execution complete: {}/{} orders placed ({}% success)",
            self.strategy.display_name(),
            self.succeeded,
            self.planned,
            self.success_rate
        )
    }
}

pub fn summarize(ledger: &ExecutionLedger, plan: &ExecutionPlan) -> Summary {
    let attempted = ledger.outcomes.len();
    let succeeded = ledger.outcomes.iter().filter(|o| o.success()).count();
    let planned = plan.len();

    let success_rate = if planned == 0 {
        Decimal::ZERO
    } else {
        (Decimal::from(succeeded as u64) * Decimal::ONE_HUNDRED / Decimal::from(planned as u64))
            .round_dp(2)
            .normalize()
    };

    Summary {
        strategy: plan.strategy,
        symbol: plan.symbol.clone(),
        planned,
        attempted,
        succeeded,
        failed: attempted - succeeded,
        success_rate,
    }
}
