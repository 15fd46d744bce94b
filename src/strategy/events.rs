//! Structured execution events
//!
//! The engine reports through an injected [`EventSink`] instead of a global
//! logger. [`TracingEventSink`] forwards to `tracing`; [`RecordingEventSink`]
//! keeps events in memory for tests.

use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::sync::Mutex;
use tracing::{error, info, warn};

use super::planner::{OrderRole, PlanMetadata};
use crate::domain::{ExchangeAck, StrategyKind};
use crate::error::GatewayError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventLevel {
    Info,
    Warn,
    Error,
}

impl EventLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warn => "WARNING",
            Self::Error => "ERROR",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionEvent {
    ConnectionEstablished {
        server_time: i64,
    },
    MarketSnapshot {
        symbol: String,
        current_price: Decimal,
    },
    ValidationFailed {
        strategy: StrategyKind,
        reason: String,
        parameters: Value,
    },
    PlanInitialized {
        strategy: StrategyKind,
        symbol: String,
        planned: usize,
        metadata: PlanMetadata,
    },
    /// Bracket legs are placed as two independent orders
    UnlinkedBracket,
    RequestIssued {
        action: String,
        params: Value,
    },
    OrderPlaced {
        strategy: StrategyKind,
        role: OrderRole,
        ack: ExchangeAck,
        limit_price: Option<Decimal>,
    },
    ExecutionFailed {
        error_type: String,
        error: GatewayError,
    },
    Cancelled {
        attempted: usize,
        planned: usize,
    },
    ExecutionCompleted {
        strategy: StrategyKind,
        fields: Value,
    },
}

impl ExecutionEvent {
    pub fn level(&self) -> EventLevel {
        match self {
            Self::ValidationFailed { .. } | Self::ExecutionFailed { .. } => EventLevel::Error,
            Self::UnlinkedBracket | Self::Cancelled { .. } => EventLevel::Warn,
            _ => EventLevel::Info,
        }
    }

    /// Short name of the event category
    pub fn name(&self) -> &'static str {
        match self {
            Self::ConnectionEstablished { .. } => "connection_established",
            Self::MarketSnapshot { .. } => "market_snapshot",
            Self::ValidationFailed { .. } => "validation_failed",
            Self::PlanInitialized { .. } => "plan_initialized",
            Self::UnlinkedBracket => "bracket_unlinked",
            Self::RequestIssued { .. } => "request_issued",
            Self::OrderPlaced {
                role: OrderRole::GridLevel { .. },
                ..
            } => "grid_level_placed",
            Self::OrderPlaced {
                role: OrderRole::TwapChunk { .. } | OrderRole::TwapRemainder,
                ..
            } => "twap_chunk_executed",
            Self::OrderPlaced { .. } => "request_succeeded",
            Self::ExecutionFailed { .. } => "execution_failed",
            Self::Cancelled { .. } => "execution_cancelled",
            Self::ExecutionCompleted { .. } => "execution_completed",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::ConnectionEstablished { .. } => "Connected to exchange".to_string(),
            Self::MarketSnapshot { .. } => "Grid strategy market data retrieved".to_string(),
            Self::ValidationFailed { strategy, .. } => {
                format!("Validation failed: {}_order_validation", strategy.as_str())
            }
            Self::PlanInitialized { strategy, .. } => {
                format!("{} execution plan initialized", strategy.display_name())
            }
            Self::UnlinkedBracket => {
                "OCO orders require manual management in futures - placing two separate orders"
                    .to_string()
            }
            Self::RequestIssued { action, .. } => format!("API request: {action}"),
            Self::OrderPlaced { strategy, role, .. } => match role {
                OrderRole::GridLevel { level, total } => format!("Grid order {level}/{total} placed"),
                OrderRole::TwapChunk { chunk, total } => format!("TWAP chunk {chunk}/{total} executed"),
                OrderRole::TwapRemainder => "TWAP remaining quantity executed".to_string(),
                OrderRole::BracketLimit => "Bracket limit leg placed".to_string(),
                OrderRole::BracketStop => "Bracket stop leg placed".to_string(),
                OrderRole::Single => {
                    format!("{} order executed successfully", strategy.display_name())
                }
            },
            Self::ExecutionFailed { error_type, .. } => {
                format!("Order execution failed: {error_type}")
            }
            Self::Cancelled { .. } => "Execution cancelled before completion".to_string(),
            Self::ExecutionCompleted { strategy, .. } => {
                format!("{} order execution completed", strategy.display_name())
            }
        }
    }

    pub fn data(&self) -> Value {
        match self {
            Self::ConnectionEstablished { server_time } => json!({
                "server_time": server_time,
                "connection_status": "success",
            }),
            Self::MarketSnapshot {
                symbol,
                current_price,
            } => json!({
                "symbol": symbol,
                "current_price": current_price,
            }),
            Self::ValidationFailed {
                strategy,
                reason,
                parameters,
            } => json!({
                "error_type": format!("{}_order_validation", strategy.as_str()),
                "details": {
                    "parameters": parameters,
                    "error_message": reason,
                },
            }),
            Self::PlanInitialized {
                strategy,
                symbol,
                planned,
                metadata,
            } => json!({
                "order_type": strategy.as_str().to_uppercase(),
                "symbol": symbol,
                "planned_orders": planned,
                "metadata": metadata,
            }),
            Self::ExecutionCompleted { fields, .. } => fields.clone(),
            Self::UnlinkedBracket => json!({
                "order_type": "OCO",
                "implementation": "manual_management",
                "note": "placing_separate_orders",
            }),
            Self::RequestIssued { action, params } => json!({
                "action": action,
                "parameters": params,
            }),
            Self::OrderPlaced {
                strategy,
                role,
                ack,
                limit_price,
            } => {
                let mut data = ack.summary_fields();
                data["order_type"] = json!(strategy.as_str().to_uppercase());
                match role {
                    OrderRole::GridLevel { level, total } => {
                        data["grid_level"] = json!(level);
                        data["total_levels"] = json!(total);
                        data["grid_price"] = json!(limit_price);
                    }
                    OrderRole::TwapChunk { chunk, total } => {
                        data["chunk_number"] = json!(chunk);
                        data["total_chunks"] = json!(total);
                    }
                    OrderRole::TwapRemainder => {
                        data["chunk_number"] = json!("remaining");
                    }
                    OrderRole::BracketLimit | OrderRole::BracketStop | OrderRole::Single => {}
                }
                data
            }
            Self::ExecutionFailed { error_type, error } => {
                let mut data = json!({
                    "error_type": error_type,
                    "error_kind": error.kind(),
                    "details": error.message(),
                });
                if let Some(code) = error.api_code() {
                    data["api_code"] = json!(code);
                }
                data
            }
            Self::Cancelled { attempted, planned } => json!({
                "attempted": attempted,
                "planned_orders": planned,
            }),
        }
    }
}

/// Receiver of execution events
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &ExecutionEvent);
}

/// Forwards every event to `tracing` with its payload in the `data` field
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: &ExecutionEvent) {
        let message = event.message();
        let data = event.data().to_string();
        let name = event.name();
        match event.level() {
            EventLevel::Info => info!(event = name, data = %data, "{}", message),
            EventLevel::Warn => warn!(event = name, data = %data, "{}", message),
            EventLevel::Error => error!(event = name, data = %data, "{}", message),
        }
    }
}

/// Keeps events in memory, in emission order
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<ExecutionEvent>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ExecutionEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.events().iter().map(ExecutionEvent::name).collect()
    }

    pub fn count(&self, name: &str) -> usize {
        self.events().iter().filter(|e| e.name() == name).count()
    }
}

impl EventSink for RecordingEventSink {
    fn emit(&self, event: &ExecutionEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn grid_success_carries_level_and_price() {
        let event = ExecutionEvent::OrderPlaced {
            strategy: StrategyKind::Grid,
            role: OrderRole::GridLevel { level: 2, total: 5 },
            ack: ExchangeAck {
                order_id: Some(7),
                status: Some("NEW".into()),
                ..Default::default()
            },
            limit_price: Some(dec!(44500)),
        };
        assert_eq!(event.name(), "grid_level_placed");
        assert_eq!(event.message(), "Grid order 2/5 placed");

        let data = event.data();
        assert_eq!(data["grid_level"], 2);
        assert_eq!(data["grid_price"], "44500");
        assert_eq!(data["order_id"], 7);
        assert_eq!(data["order_type"], "GRID");
        assert!(data["executed_price"].is_null());
    }

    #[test]
    fn failure_includes_api_code_only_when_known() {
        let rejected = ExecutionEvent::ExecutionFailed {
            error_type: "Order_Error".into(),
            error: GatewayError::client_rejected(-1111, "Precision is over the maximum"),
        };
        assert_eq!(rejected.level(), EventLevel::Error);
        assert_eq!(rejected.data()["api_code"], -1111);

        let down = ExecutionEvent::ExecutionFailed {
            error_type: "Order_Error".into(),
            error: GatewayError::server_unavailable("timed out"),
        };
        assert!(down.data().get("api_code").is_none());
        assert_eq!(down.data()["error_kind"], "ServerUnavailable");
    }

    #[test]
    fn recording_sink_preserves_order() {
        let sink = RecordingEventSink::new();
        sink.emit(&ExecutionEvent::ConnectionEstablished { server_time: 1 });
        sink.emit(&ExecutionEvent::UnlinkedBracket);
        assert_eq!(sink.names(), vec!["connection_established", "bracket_unlinked"]);
        assert_eq!(sink.count("bracket_unlinked"), 1);
    }
}
