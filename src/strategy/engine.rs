//! The generic execution engine
//!
//! Every strategy goes through the same pipeline: validate, probe the
//! exchange, snapshot the price if the planner needs one, plan, then submit
//! the planned orders one by one. Strategy differences live in the planner
//! and in [`FailurePolicy`]; nothing here branches on a concrete strategy
//! except the bracket warning.

use super::events::{EventSink, ExecutionEvent};
use super::planner::{self, ExecutionPlan, FailurePolicy, OrderRole, PlannedOrder};
use super::report::{self, Summary};
use super::validator;
use crate::coordination::{PauseOutcome, Pacer};
use crate::domain::{ExchangeAck, OrderSpec, StrategyKind, StrategyParameters};
use crate::error::{GatewayError, Result};
use crate::exchange::ExchangeGateway;

/// Result of one submission attempt
#[derive(Debug, Clone, PartialEq)]
pub struct OrderOutcome {
    pub spec: OrderSpec,
    pub role: OrderRole,
    pub result: std::result::Result<ExchangeAck, GatewayError>,
}

impl OrderOutcome {
    pub fn new(
        item: &PlannedOrder,
        result: std::result::Result<ExchangeAck, GatewayError>,
    ) -> Self {
        Self {
            spec: item.spec.clone(),
            role: item.role,
            result,
        }
    }

    pub fn success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn response(&self) -> Option<&ExchangeAck> {
        self.result.as_ref().ok()
    }

    pub fn error(&self) -> Option<&GatewayError> {
        self.result.as_ref().err()
    }
}

/// Append-only record of attempts, in submission order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionLedger {
    pub outcomes: Vec<OrderOutcome>,
    /// A cancellation stopped the loop before the plan was exhausted
    pub cancelled: bool,
    /// A failed TWAP chunk stopped the remaining main-loop chunks
    pub halted: bool,
}

impl ExecutionLedger {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &OrderOutcome> {
        self.outcomes.iter().filter(|o| o.success())
    }
}

/// Everything one invocation produced
#[derive(Debug, Clone)]
pub struct RunReport {
    pub plan: ExecutionPlan,
    pub ledger: ExecutionLedger,
    pub summary: Summary,
}

impl RunReport {
    pub fn cancelled(&self) -> bool {
        self.ledger.cancelled
    }

    /// Grid and TWAP count as successful once they ran; single-order
    /// strategies need every planned order accepted.
    pub fn overall_success(&self) -> bool {
        match self.plan.strategy {
            StrategyKind::Grid | StrategyKind::Twap => true,
            StrategyKind::Market
            | StrategyKind::Limit
            | StrategyKind::StopLimit
            | StrategyKind::Bracket => {
                self.summary.succeeded == self.summary.planned && self.summary.planned > 0
            }
        }
    }
}

/// Submit every planned order once, in order.
///
/// Per-order failures are recorded and never escape; the returned ledger has
/// at most `plan.len()` outcomes.
pub async fn execute(
    plan: &ExecutionPlan,
    gateway: &dyn ExchangeGateway,
    events: &dyn EventSink,
    pacer: &dyn Pacer,
) -> ExecutionLedger {
    let mut ledger = ExecutionLedger::default();
    let policy = plan.failure_policy();
    let interval = plan.pacing_interval();

    for (index, item) in plan.items.iter().enumerate() {
        if ledger.halted && item.role.is_twap_chunk() {
            continue;
        }
        if pacer.is_cancelled() {
            ledger.cancelled = true;
            break;
        }

        events.emit(&ExecutionEvent::RequestIssued {
            action: item.role.action(plan.strategy),
            params: item.spec.log_params(),
        });

        let result = gateway.submit_order(&item.spec).await;
        let accepted = result.is_ok();
        match &result {
            Ok(ack) => events.emit(&ExecutionEvent::OrderPlaced {
                strategy: plan.strategy,
                role: item.role,
                ack: ack.clone(),
                limit_price: item.spec.price,
            }),
            Err(err) => events.emit(&ExecutionEvent::ExecutionFailed {
                error_type: item.role.error_label(),
                error: err.clone(),
            }),
        }
        ledger.outcomes.push(OrderOutcome::new(item, result));

        if !accepted {
            if policy == FailurePolicy::HaltChunks && item.role.is_twap_chunk() {
                ledger.halted = true;
            }
            continue;
        }

        let has_next = index + 1 < plan.items.len();
        if let (Some(interval), true) = (interval, has_next) {
            if pacer.pause(interval).await == PauseOutcome::Cancelled {
                ledger.cancelled = true;
                break;
            }
        }
    }

    if ledger.cancelled {
        events.emit(&ExecutionEvent::Cancelled {
            attempted: ledger.len(),
            planned: plan.len(),
        });
    }
    ledger
}

/// Validate, probe, plan, execute and summarize one strategy invocation.
///
/// Validation, probe and snapshot failures abort before anything is placed;
/// per-order failures only show up in the returned report.
pub async fn run_strategy(
    params: &StrategyParameters,
    gateway: &dyn ExchangeGateway,
    events: &dyn EventSink,
    pacer: &dyn Pacer,
) -> Result<RunReport> {
    let strategy = match validator::parse_strategy(params) {
        Ok(strategy) => strategy,
        Err(err) => {
            events.emit(&ExecutionEvent::ValidationFailed {
                strategy: params.kind(),
                reason: err.reason.clone(),
                parameters: params.log_fields(),
            });
            return Err(err.into());
        }
    };

    let server_time = gateway.server_time().await.map_err(|err| {
        events.emit(&ExecutionEvent::ExecutionFailed {
            error_type: "Connection_Error".to_string(),
            error: err.clone(),
        });
        err
    })?;
    events.emit(&ExecutionEvent::ConnectionEstablished { server_time });

    let market_price = if strategy.needs_market_price() {
        let price = gateway
            .ticker_price(strategy.symbol())
            .await
            .map_err(|err| {
                events.emit(&ExecutionEvent::ExecutionFailed {
                    error_type: "Market_Data_Error".to_string(),
                    error: err.clone(),
                });
                err
            })?;
        events.emit(&ExecutionEvent::MarketSnapshot {
            symbol: strategy.symbol().to_string(),
            current_price: price,
        });
        Some(price)
    } else {
        None
    };

    let plan = planner::plan(&strategy, market_price)?;
    if plan.strategy == StrategyKind::Bracket {
        events.emit(&ExecutionEvent::UnlinkedBracket);
    }
    events.emit(&ExecutionEvent::PlanInitialized {
        strategy: plan.strategy,
        symbol: plan.symbol.clone(),
        planned: plan.len(),
        metadata: plan.metadata.clone(),
    });

    let ledger = execute(&plan, gateway, events, pacer).await;
    let summary = report::summarize(&ledger, &plan);
    events.emit(&ExecutionEvent::ExecutionCompleted {
        strategy: plan.strategy,
        fields: summary.log_fields(),
    });

    Ok(RunReport {
        plan,
        ledger,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordination::RecordingPacer;
    use crate::error::StratexError;
    use crate::exchange::MockExchangeGateway;
    use crate::strategy::events::RecordingEventSink;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn twap_params(total: &str, duration: &str, chunk: &str) -> StrategyParameters {
        StrategyParameters::Twap {
            symbol: "BTCUSDT".into(),
            side: "BUY".into(),
            total_quantity: total.into(),
            duration_seconds: duration.into(),
            chunk_size: chunk.into(),
        }
    }

    /// Gateway whose n-th submission (zero-based) fails with `err`
    fn failing_at(index: usize, err: GatewayError) -> MockExchangeGateway {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut gateway = MockExchangeGateway::new();
        gateway.expect_server_time().returning(|| Ok(1));
        gateway.expect_submit_order().returning(move |spec| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n == index {
                Err(err.clone())
            } else {
                Ok(ExchangeAck::synthetic(spec, n as i64))
            }
        });
        gateway
    }

    #[tokio::test]
    async fn invalid_parameters_never_touch_the_gateway() {
        let mut gateway = MockExchangeGateway::new();
        gateway.expect_server_time().never();
        gateway.expect_submit_order().never();
        let events = RecordingEventSink::new();

        let params = StrategyParameters::Market {
            symbol: "BTCUSDT".into(),
            side: "buy".into(),
            quantity: "0.01".into(),
        };
        let err = run_strategy(&params, &gateway, &events, &RecordingPacer::new())
            .await
            .unwrap_err();

        assert!(matches!(err, StratexError::Validation(_)));
        assert_eq!(events.names(), vec!["validation_failed"]);
    }

    #[tokio::test]
    async fn failed_probe_is_fatal() {
        let mut gateway = MockExchangeGateway::new();
        gateway
            .expect_server_time()
            .returning(|| Err(GatewayError::server_unavailable("connection refused")));
        gateway.expect_submit_order().never();
        let events = RecordingEventSink::new();

        let params = StrategyParameters::Limit {
            symbol: "BTCUSDT".into(),
            side: "SELL".into(),
            quantity: "0.01".into(),
            price: "46000".into(),
        };
        let err = run_strategy(&params, &gateway, &events, &RecordingPacer::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StratexError::Gateway(GatewayError::ServerUnavailable { .. })
        ));
        assert_eq!(events.count("execution_failed"), 1);
    }

    #[tokio::test]
    async fn twap_halts_chunks_after_failure_but_tries_remainder() {
        let gateway = failing_at(1, GatewayError::client_rejected(-2019, "Margin is insufficient."));
        let events = RecordingEventSink::new();
        let pacer = RecordingPacer::new();

        let report = run_strategy(&twap_params("0.045", "50", "0.01"), &gateway, &events, &pacer)
            .await
            .unwrap();

        // four chunks plus a remainder of 0.005
        assert_eq!(report.plan.len(), 5);
        let roles: Vec<OrderRole> = report.ledger.outcomes.iter().map(|o| o.role).collect();
        assert_eq!(
            roles,
            vec![
                OrderRole::TwapChunk { chunk: 1, total: 4 },
                OrderRole::TwapChunk { chunk: 2, total: 4 },
                OrderRole::TwapRemainder,
            ]
        );
        assert!(report.ledger.halted);
        assert!(report.ledger.outcomes[2].success());
        assert_eq!(report.ledger.outcomes[2].spec.quantity, dec!(0.005));

        // one pause after chunk 1, none after the failed chunk or the last item
        assert_eq!(pacer.pauses(), vec![Duration::from_secs(10)]);
        assert!(report.overall_success());
        assert_eq!(report.summary.succeeded, 2);
    }

    #[tokio::test]
    async fn cancellation_during_pause_stops_the_loop() {
        let gateway = failing_at(usize::MAX, GatewayError::unclassified("unused"));
        let events = RecordingEventSink::new();
        let pacer = RecordingPacer::cancel_after(2);

        let report = run_strategy(&twap_params("0.04", "40", "0.01"), &gateway, &events, &pacer)
            .await
            .unwrap();

        assert!(report.cancelled());
        assert_eq!(report.ledger.len(), 2);
        assert_eq!(report.summary.skipped(), 2);
        assert_eq!(events.count("execution_cancelled"), 1);
    }

    #[tokio::test]
    async fn bracket_second_leg_runs_after_first_fails() {
        let gateway = failing_at(0, GatewayError::client_rejected(-4014, "Price not increased by tick size."));
        let events = RecordingEventSink::new();

        let params = StrategyParameters::Bracket {
            symbol: "BTCUSDT".into(),
            side: "SELL".into(),
            quantity: "0.01".into(),
            price: "46000.00".into(),
            stop_price: "44000.00".into(),
            stop_limit_price: "43500.00".into(),
        };
        let report = run_strategy(&params, &gateway, &events, &RecordingPacer::new())
            .await
            .unwrap();

        assert_eq!(report.ledger.len(), 2);
        assert!(!report.ledger.outcomes[0].success());
        assert!(report.ledger.outcomes[1].success());
        assert!(!report.overall_success());
        assert_eq!(events.count("bracket_unlinked"), 1);
        assert_eq!(events.count("request_issued"), 2);
    }

    #[tokio::test]
    async fn grid_reads_price_once_and_isolates_failures() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut gateway = MockExchangeGateway::new();
        gateway.expect_server_time().returning(|| Ok(1));
        gateway
            .expect_ticker_price()
            .withf(|symbol| symbol.to_string() == "BTCUSDT")
            .times(1)
            .returning(|_| Ok(dec!(45000)));
        gateway.expect_submit_order().times(5).returning(move |spec| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n == 2 {
                Err(GatewayError::server_unavailable("503 Service Unavailable"))
            } else {
                Ok(ExchangeAck::synthetic(spec, n as i64))
            }
        });
        let events = RecordingEventSink::new();

        let params = StrategyParameters::Grid {
            symbol: "BTCUSDT".into(),
            price_low: "44000".into(),
            price_high: "46000".into(),
            levels: "5".into(),
            quantity_per_level: "0.01".into(),
        };
        let report = run_strategy(&params, &gateway, &events, &RecordingPacer::new())
            .await
            .unwrap();

        assert_eq!(report.ledger.len(), 5);
        assert_eq!(report.summary.failed, 1);
        assert_eq!(
            report.ledger.outcomes[2].role,
            OrderRole::GridLevel { level: 3, total: 5 }
        );
        assert_eq!(events.count("grid_level_placed"), 4);
        assert!(report.overall_success());
    }
}
