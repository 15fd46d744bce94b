use hmac::{Hmac, Mac};
use rust_decimal_macros::dec;
use serde_json::json;
use sha2::Sha256;
use std::time::Duration;
use stratex::adapters::BinanceFuturesClient;
use stratex::config::ExchangeConfig;
use stratex::domain::{OrderSide, OrderSpec};
use stratex::error::GatewayError;
use stratex::exchange::ExchangeGateway;
use stratex::signing::{ApiCredentials, HmacAuth};
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

const API_KEY: &str = "test-api-key";
const API_SECRET: &str = "test-api-secret";

fn client(server: &MockServer, dry_run: bool) -> BinanceFuturesClient {
    let cfg = ExchangeConfig {
        base_url: server.uri(),
        request_timeout_ms: 500,
        ..ExchangeConfig::default()
    };
    let auth = HmacAuth::new(ApiCredentials::new(API_KEY, API_SECRET));
    BinanceFuturesClient::new(&cfg, auth, dry_run).unwrap()
}

/// Accepts a form body only if its trailing signature is the HMAC of the rest
struct ValidSignature;

impl Match for ValidSignature {
    fn matches(&self, request: &Request) -> bool {
        let body = String::from_utf8_lossy(&request.body);
        let Some((query, signature)) = body.rsplit_once("&signature=") else {
            return false;
        };
        let mut mac = Hmac::<Sha256>::new_from_slice(API_SECRET.as_bytes()).unwrap();
        mac.update(query.as_bytes());
        hex::encode(mac.finalize().into_bytes()) == signature
    }
}

#[tokio::test]
async fn server_time_probe() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fapi/v1/time"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"serverTime": 1_700_000_000_123_i64})))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(client(&server, false).server_time().await.unwrap(), 1_700_000_000_123);
}

#[tokio::test]
async fn ticker_price_is_parsed_as_decimal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fapi/v1/ticker/price"))
        .and(query_param("symbol", "BTCUSDT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "symbol": "BTCUSDT",
            "price": "45000.10",
            "time": 1_700_000_000_000_i64
        })))
        .mount(&server)
        .await;

    assert_eq!(
        client(&server, false).ticker_price("BTCUSDT").await.unwrap(),
        dec!(45000.10)
    );
}

#[tokio::test]
async fn signed_order_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/fapi/v1/order"))
        .and(header("X-MBX-APIKEY", API_KEY))
        .and(body_string_contains("symbol=BTCUSDT&side=BUY&type=STOP&quantity=0.01&price=44000.00&stopPrice=45000.00&timeInForce=GTC"))
        .and(body_string_contains("recvWindow=5000"))
        .and(body_string_contains("timestamp="))
        .and(ValidSignature)
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "orderId": 4_051_221_i64,
            "symbol": "BTCUSDT",
            "status": "NEW",
            "clientOrderId": "abc",
            "price": "44000.00",
            "avgPrice": "0.00",
            "origQty": "0.010",
            "executedQty": "0",
            "type": "STOP",
            "side": "BUY",
            "stopPrice": "45000.00",
            "updateTime": 1_700_000_000_000_i64
        })))
        .expect(1)
        .mount(&server)
        .await;

    let spec = OrderSpec::stop_limit("BTCUSDT", OrderSide::Buy, dec!(0.01), dec!(45000.00), dec!(44000.00));
    let ack = client(&server, false).submit_order(&spec).await.unwrap();

    assert_eq!(ack.order_id, Some(4_051_221));
    assert_eq!(ack.status.as_deref(), Some("NEW"));
    assert_eq!(ack.stop_price.as_deref(), Some("45000.00"));
    assert_eq!(ack.executed_price(), None);
    assert!(ack.fills.is_none());
    assert!(ack.extra.contains_key("updateTime"));
}

#[tokio::test]
async fn binance_rejection_is_client_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/fapi/v1/order"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": -1121,
            "msg": "Invalid symbol."
        })))
        .mount(&server)
        .await;

    let spec = OrderSpec::market("NOPEUSDT", OrderSide::Buy, dec!(1));
    let err = client(&server, false).submit_order(&spec).await.unwrap_err();
    assert_eq!(err, GatewayError::client_rejected(-1121, "Invalid symbol."));
}

#[tokio::test]
async fn server_error_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fapi/v1/time"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .mount(&server)
        .await;

    let err = client(&server, false).server_time().await.unwrap_err();
    assert!(matches!(err, GatewayError::ServerUnavailable { .. }), "{err:?}");
}

#[tokio::test]
async fn undecodable_success_body_is_unclassified() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/fapi/v1/order"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let spec = OrderSpec::market("BTCUSDT", OrderSide::Sell, dec!(0.01));
    let err = client(&server, false).submit_order(&spec).await.unwrap_err();
    assert_eq!(err.kind(), "Unclassified");
}

#[tokio::test]
async fn slow_response_times_out_as_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fapi/v1/time"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"serverTime": 1}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let err = client(&server, false).server_time().await.unwrap_err();
    assert!(matches!(err, GatewayError::ServerUnavailable { .. }), "{err:?}");
}

#[tokio::test]
async fn dry_run_never_posts_orders() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/fapi/v1/order"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let spec = OrderSpec::limit("BTCUSDT", OrderSide::Buy, dec!(0.01), dec!(44000));
    let ack = client(&server, true).submit_order(&spec).await.unwrap();
    assert_eq!(ack.status.as_deref(), Some("NEW"));
    assert_eq!(ack.client_order_id.as_deref(), Some(spec.client_order_id.as_str()));
}
