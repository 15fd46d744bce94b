//! Binance USD-M futures REST adapter.
//!
//! Three endpoints are used: server time as the connectivity probe, the
//! ticker price for grid planning, and signed order placement. Responses are
//! classified into [`GatewayError`] here so the engine never sees HTTP.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::str::FromStr;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::ExchangeConfig;
use crate::domain::{ExchangeAck, OrderSpec};
use crate::error::{GatewayError, Result, StratexError};
use crate::exchange::ExchangeGateway;
use crate::signing::HmacAuth;

const TIME_PATH: &str = "/fapi/v1/time";
const TICKER_PRICE_PATH: &str = "/fapi/v1/ticker/price";
const ORDER_PATH: &str = "/fapi/v1/order";

/// Error body returned by Binance on rejected requests
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: i64,
    msg: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerTimeResponse {
    server_time: i64,
}

#[derive(Debug, Deserialize)]
struct TickerPriceResponse {
    price: String,
}

/// Map a non-success HTTP response to a classified error.
///
/// 4xx is a rejection (Binance `{code,msg}` when present, HTTP status
/// otherwise), 5xx is an outage, anything else is unclassified.
pub fn classify_response(status: StatusCode, body: &str) -> GatewayError {
    if status.is_client_error() {
        return match serde_json::from_str::<ApiErrorBody>(body) {
            Ok(err) => GatewayError::client_rejected(err.code, err.msg),
            Err(_) => GatewayError::client_rejected(i64::from(status.as_u16()), body.trim()),
        };
    }
    if status.is_server_error() {
        return GatewayError::server_unavailable(format!("HTTP {}: {}", status, body.trim()));
    }
    GatewayError::unclassified(format!("unexpected HTTP {}: {}", status, body.trim()))
}

/// Decimal as sent on the wire, truncated to `scale` places when one is configured
pub fn format_decimal(value: Decimal, scale: Option<u32>) -> String {
    match scale {
        Some(dp) => value
            .round_dp_with_strategy(dp, RoundingStrategy::ToZero)
            .normalize()
            .to_string(),
        None => value.to_string(),
    }
}

pub struct BinanceFuturesClient {
    http: Client,
    base_url: String,
    auth: HmacAuth,
    recv_window_ms: u64,
    price_scale: Option<u32>,
    quantity_scale: Option<u32>,
    dry_run: bool,
    next_dry_run_id: AtomicI64,
}

impl BinanceFuturesClient {
    pub fn new(cfg: &ExchangeConfig, auth: HmacAuth, dry_run: bool) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("stratex/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_millis(cfg.request_timeout_ms))
            .build()
            .map_err(|e| StratexError::Internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            auth,
            recv_window_ms: cfg.recv_window_ms,
            price_scale: cfg.price_scale,
            quantity_scale: cfg.quantity_scale,
            dry_run,
            next_dry_run_id: AtomicI64::new(1),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Order parameters in submission order, without timestamp or signature
    pub fn order_params(&self, spec: &OrderSpec) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("symbol", spec.symbol.clone()),
            ("side", spec.side.as_str().to_string()),
            ("type", spec.order_type.as_str().to_string()),
            ("quantity", format_decimal(spec.quantity, self.quantity_scale)),
        ];
        if let Some(price) = spec.price {
            params.push(("price", format_decimal(price, self.price_scale)));
        }
        if let Some(stop_price) = spec.stop_price {
            params.push(("stopPrice", format_decimal(stop_price, self.price_scale)));
        }
        if let Some(tif) = spec.time_in_force {
            params.push(("timeInForce", tif.as_str().to_string()));
        }
        params.push(("newClientOrderId", spec.client_order_id.clone()));
        params
    }

    async fn get_public<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> std::result::Result<T, GatewayError> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self.http.get(&url).query(query).send().await?;
        Self::decode(resp).await
    }

    async fn decode<T: DeserializeOwned>(
        resp: reqwest::Response,
    ) -> std::result::Result<T, GatewayError> {
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(classify_response(status, &text));
        }

        serde_json::from_str(&text).map_err(|e| {
            GatewayError::unclassified(format!("invalid JSON response: {} (body: {})", e, text))
        })
    }
}

#[async_trait]
impl ExchangeGateway for BinanceFuturesClient {
    fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    async fn server_time(&self) -> std::result::Result<i64, GatewayError> {
        let resp: ServerTimeResponse = self.get_public(TIME_PATH, &[]).await?;
        debug!(server_time = resp.server_time, "Exchange time received");
        Ok(resp.server_time)
    }

    async fn ticker_price(&self, symbol: &str) -> std::result::Result<Decimal, GatewayError> {
        let resp: TickerPriceResponse = self
            .get_public(TICKER_PRICE_PATH, &[("symbol", symbol)])
            .await?;
        Decimal::from_str(&resp.price).map_err(|e| {
            GatewayError::unclassified(format!("invalid ticker price {:?}: {}", resp.price, e))
        })
    }

    async fn submit_order(&self, spec: &OrderSpec) -> std::result::Result<ExchangeAck, GatewayError> {
        if self.dry_run {
            let order_id = self.next_dry_run_id.fetch_add(1, Ordering::SeqCst);
            info!(
                symbol = %spec.symbol,
                side = %spec.side,
                order_type = %spec.order_type,
                quantity = %spec.quantity,
                "Dry run: order acknowledged locally, not sent"
            );
            return Ok(ExchangeAck::synthetic(spec, order_id));
        }

        let mut params = self.order_params(spec);
        params.push(("recvWindow", self.recv_window_ms.to_string()));
        params.push(("timestamp", Utc::now().timestamp_millis().to_string()));
        let body = self
            .auth
            .signed_query(&params)
            .map_err(|e| GatewayError::unclassified(e.to_string()))?;

        let url = format!("{}{}", self.base_url, ORDER_PATH);
        let resp = self
            .http
            .post(&url)
            .header("X-MBX-APIKEY", self.auth.api_key())
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await?;

        Self::decode(resp).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OrderSide;
    use crate::signing::ApiCredentials;
    use rust_decimal_macros::dec;

    fn client(price_scale: Option<u32>, quantity_scale: Option<u32>) -> BinanceFuturesClient {
        let cfg = ExchangeConfig {
            price_scale,
            quantity_scale,
            ..ExchangeConfig::default()
        };
        let auth = HmacAuth::new(ApiCredentials::new("key", "secret"));
        BinanceFuturesClient::new(&cfg, auth, true).unwrap()
    }

    #[test]
    fn test_classify_binance_rejection() {
        let err = classify_response(
            StatusCode::BAD_REQUEST,
            r#"{"code":-1121,"msg":"Invalid symbol."}"#,
        );
        assert_eq!(err, GatewayError::client_rejected(-1121, "Invalid symbol."));
    }

    #[test]
    fn test_classify_without_error_body_uses_status() {
        let err = classify_response(StatusCode::FORBIDDEN, "<html>WAF</html>");
        assert_eq!(err.api_code(), Some(403));

        let err = classify_response(StatusCode::SERVICE_UNAVAILABLE, "");
        assert_eq!(err.kind(), "ServerUnavailable");

        let err = classify_response(StatusCode::MOVED_PERMANENTLY, "");
        assert_eq!(err.kind(), "Unclassified");
    }

    #[test]
    fn test_format_decimal_truncates_to_scale() {
        assert_eq!(format_decimal(dec!(0.0123456), Some(3)), "0.012");
        assert_eq!(format_decimal(dec!(45000.00), Some(1)), "45000");
        assert_eq!(format_decimal(dec!(45000.00), None), "45000.00");
    }

    #[test]
    fn test_order_params_follow_order_type() {
        let client = client(Some(1), Some(3));
        let spec = OrderSpec::stop_limit("BTCUSDT", OrderSide::Buy, dec!(0.0105), dec!(45000.55), dec!(44000));
        let params = client.order_params(&spec);
        let keys: Vec<&str> = params.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            keys,
            vec!["symbol", "side", "type", "quantity", "price", "stopPrice", "timeInForce", "newClientOrderId"]
        );
        assert_eq!(params[3].1, "0.01");
        assert_eq!(params[5].1, "45000.5");

        let market = client.order_params(&OrderSpec::market("BTCUSDT", OrderSide::Sell, dec!(1)));
        assert!(!market.iter().any(|(k, _)| *k == "price" || *k == "timeInForce"));
    }

    #[tokio::test]
    async fn test_dry_run_ids_are_sequential() {
        let client = client(None, None);
        let spec = OrderSpec::market("BTCUSDT", OrderSide::Buy, dec!(0.01));
        let first = client.submit_order(&spec).await.unwrap();
        let second = client.submit_order(&spec).await.unwrap();
        assert_eq!(first.order_id, Some(1));
        assert_eq!(second.order_id, Some(2));
        assert_eq!(first.status.as_deref(), Some("FILLED"));
        assert!(client.is_dry_run());
    }
}
