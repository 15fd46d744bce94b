use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::{ExchangeAck, OrderSpec};
use crate::error::GatewayError;

/// The three exchange capabilities an invocation needs.
///
/// Every call is a single attempt; failures come back classified and are
/// never retried here.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExchangeGateway: Send + Sync {
    /// Whether submissions are synthesized locally instead of sent
    fn is_dry_run(&self) -> bool;

    /// Connectivity probe, returns exchange time in epoch milliseconds
    async fn server_time(&self) -> Result<i64, GatewayError>;

    /// Latest traded price for `symbol`
    async fn ticker_price(&self, symbol: &str) -> Result<Decimal, GatewayError>;

    /// Place one order
    async fn submit_order(&self, spec: &OrderSpec) -> Result<ExchangeAck, GatewayError>;
}
