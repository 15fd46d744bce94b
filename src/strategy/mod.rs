//! Strategy module
//!
//! Turns raw strategy parameters into placed orders.
//!
//! ## Architecture
//!
//! - `validator` - pure parameter checks, raw strings in, typed [`Strategy`] out
//! - `planner` - deterministic order schedule for a validated strategy
//! - `engine` - the single execution loop shared by every strategy
//! - `report` - ledger aggregation
//! - `events` - structured events and the sinks that receive them
//!
//! ## Usage
//!
//! ```bash
//! stratex grid BTCUSDT 44000.00 46000.00 5 0.01
//! stratex twap BTCUSDT BUY 0.1 300 0.01
//! ```

pub mod engine;
pub mod events;
pub mod planner;
pub mod report;
pub mod types;
pub mod validator;

pub use engine::{execute, run_strategy, ExecutionLedger, OrderOutcome, RunReport};
pub use events::{EventLevel, EventSink, ExecutionEvent, RecordingEventSink, TracingEventSink};
pub use planner::{
    grid_step, plan, twap_split, ExecutionPlan, MAX_PLANNED_ORDERS, FailurePolicy, OrderRole, PlanMetadata,
    PlannedOrder,
};
pub use report::{summarize, Summary};
pub use types::{
    BracketParams, GridParams, LimitParams, MarketParams, StopLimitParams, Strategy, TwapParams,
};
pub use validator::{parse_strategy, validate, ValidationResult};
