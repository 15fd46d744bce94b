//! In-process gateway with scripted responses
//!
//! Used by the integration tests and handy for exercising strategies without
//! a network. Submissions are numbered from zero in call order.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Mutex;

use super::ExchangeGateway;
use crate::domain::{ExchangeAck, OrderSpec};
use crate::error::GatewayError;

const FIRST_ORDER_ID: i64 = 1000;

#[derive(Debug)]
pub struct ScriptedGateway {
    server_time: Result<i64, GatewayError>,
    price: Result<Decimal, GatewayError>,
    failures: HashMap<usize, GatewayError>,
    submitted: Mutex<Vec<OrderSpec>>,
    price_requests: Mutex<Vec<String>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self {
            server_time: Ok(1_700_000_000_000),
            price: Ok(Decimal::ZERO),
            failures: HashMap::new(),
            submitted: Mutex::new(Vec::new()),
            price_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_price(mut self, price: Decimal) -> Self {
        self.price = Ok(price);
        self
    }

    pub fn with_price_error(mut self, err: GatewayError) -> Self {
        self.price = Err(err);
        self
    }

    pub fn with_probe_error(mut self, err: GatewayError) -> Self {
        self.server_time = Err(err);
        self
    }

    /// Fail the submission at `index` (zero-based, in call order)
    pub fn fail_submission(mut self, index: usize, err: GatewayError) -> Self {
        self.failures.insert(index, err);
        self
    }

    /// Every spec handed to `submit_order`, including failed ones
    pub fn submitted(&self) -> Vec<OrderSpec> {
        self.submitted
            .lock()
            .map(|specs| specs.clone())
            .unwrap_or_default()
    }

    pub fn price_requests(&self) -> Vec<String> {
        self.price_requests
            .lock()
            .map(|symbols| symbols.clone())
            .unwrap_or_default()
    }
}

impl Default for ScriptedGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExchangeGateway for ScriptedGateway {
    fn is_dry_run(&self) -> bool {
        true
    }

    async fn server_time(&self) -> Result<i64, GatewayError> {
        self.server_time.clone()
    }

    async fn ticker_price(&self, symbol: &str) -> Result<Decimal, GatewayError> {
        if let Ok(mut requests) = self.price_requests.lock() {
            requests.push(symbol.to_string());
        }
        self.price.clone()
    }

    async fn submit_order(&self, spec: &OrderSpec) -> Result<ExchangeAck, GatewayError> {
        let index = {
            let mut submitted = self
                .submitted
                .lock()
                .map_err(|_| GatewayError::unclassified("scripted gateway state poisoned"))?;
            submitted.push(spec.clone());
            submitted.len() - 1
        };

        match self.failures.get(&index) {
            Some(err) => Err(err.clone()),
            None => Ok(ExchangeAck::synthetic(spec, FIRST_ORDER_ID + index as i64)),
        }
    }
}
