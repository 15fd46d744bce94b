pub mod adapters;
pub mod cli;
pub mod config;
pub mod coordination;
pub mod domain;
pub mod error;
pub mod exchange;
pub mod logging;
pub mod signing;
pub mod strategy;

pub use adapters::BinanceFuturesClient;
pub use config::AppConfig;
pub use coordination::{CancellablePacer, Pacer, PauseOutcome};
pub use domain::{ExchangeAck, OrderSide, OrderSpec, OrderType, StrategyKind, StrategyParameters};
pub use error::{GatewayError, Result, StratexError, ValidationError};
pub use exchange::{ExchangeGateway, ScriptedGateway};
pub use strategy::{run_strategy, EventSink, ExecutionPlan, RunReport, Strategy, Summary};
