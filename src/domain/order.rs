use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Order side (buy or sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderSide::Buy => "BUY",
            OrderSide::Sell => "SELL",
        }
    }

    /// Exact, case-sensitive parse; case folding belongs to the CLI
    pub fn parse_exact(raw: &str) -> Option<Self> {
        match raw {
            "BUY" => Some(OrderSide::Buy),
            "SELL" => Some(OrderSide::Sell),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    Market,
    Limit,
    /// Stop-limit: triggers at `stop_price`, rests at `price`
    Stop,
    StopMarket,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Market => "MARKET",
            OrderType::Limit => "LIMIT",
            OrderType::Stop => "STOP",
            OrderType::StopMarket => "STOP_MARKET",
        }
    }

    pub fn requires_price(&self) -> bool {
        matches!(self, OrderType::Limit | OrderType::Stop)
    }

    pub fn requires_stop_price(&self) -> bool {
        matches!(self, OrderType::Stop | OrderType::StopMarket)
    }
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time in force
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeInForce {
    /// Good Till Cancelled
    GTC,
    /// Immediate Or Cancel
    IOC,
    /// Fill Or Kill
    FOK,
}

impl TimeInForce {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeInForce::GTC => "GTC",
            TimeInForce::IOC => "IOC",
            TimeInForce::FOK => "FOK",
        }
    }
}

/// One concrete order to submit.
///
/// Built only through the typed constructors, which keep the price fields
/// consistent with `order_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSpec {
    #[serde(rename = "newClientOrderId")]
    pub client_order_id: String,
    pub symbol: String,
    pub side: OrderSide,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub quantity: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_in_force: Option<TimeInForce>,
}

impl OrderSpec {
    fn base(symbol: &str, side: OrderSide, order_type: OrderType, quantity: Decimal) -> Self {
        Self {
            client_order_id: Uuid::new_v4().simple().to_string(),
            symbol: symbol.to_string(),
            side,
            order_type,
            quantity,
            price: None,
            stop_price: None,
            time_in_force: None,
        }
    }

    pub fn market(symbol: &str, side: OrderSide, quantity: Decimal) -> Self {
        Self::base(symbol, side, OrderType::Market, quantity)
    }

    pub fn limit(symbol: &str, side: OrderSide, quantity: Decimal, price: Decimal) -> Self {
        Self {
            price: Some(price),
            time_in_force: Some(TimeInForce::GTC),
            ..Self::base(symbol, side, OrderType::Limit, quantity)
        }
    }

    pub fn stop_limit(
        symbol: &str,
        side: OrderSide,
        quantity: Decimal,
        stop_price: Decimal,
        limit_price: Decimal,
    ) -> Self {
        Self {
            price: Some(limit_price),
            stop_price: Some(stop_price),
            time_in_force: Some(TimeInForce::GTC),
            ..Self::base(symbol, side, OrderType::Stop, quantity)
        }
    }

    pub fn stop_market(symbol: &str, side: OrderSide, quantity: Decimal, stop_price: Decimal) -> Self {
        Self {
            stop_price: Some(stop_price),
            ..Self::base(symbol, side, OrderType::StopMarket, quantity)
        }
    }

    /// LIMIT/STOP carry `price`, STOP/STOP_MARKET carry `stop_price`, MARKET carries neither
    pub fn has_consistent_price_fields(&self) -> bool {
        self.price.is_some() == self.order_type.requires_price()
            && self.stop_price.is_some() == self.order_type.requires_stop_price()
    }

    /// Outgoing parameters as logged with each request
    pub fn log_params(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Accept a JSON string or number and keep it as text.
///
/// Exchange payloads are pass-through data; numeric fields are reported, never computed on.
fn de_opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// A fill reported inside an acknowledgment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AckFill {
    #[serde(default, deserialize_with = "de_opt_text")]
    pub price: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub qty: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Order acknowledgment returned by the exchange.
///
/// Every field is optional; unknown fields are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeAck {
    #[serde(default)]
    pub order_id: Option<i64>,
    #[serde(default)]
    pub client_order_id: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub side: Option<String>,
    #[serde(default, rename = "type")]
    pub order_type: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub orig_qty: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub executed_qty: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub price: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub stop_price: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub avg_price: Option<String>,
    #[serde(default)]
    pub time_in_force: Option<String>,
    #[serde(default)]
    pub fills: Option<Vec<AckFill>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ExchangeAck {
    /// Acknowledgment for an order accepted without contacting the exchange
    pub fn synthetic(spec: &OrderSpec, order_id: i64) -> Self {
        let filled = spec.order_type == OrderType::Market;
        Self {
            order_id: Some(order_id),
            client_order_id: Some(spec.client_order_id.clone()),
            symbol: Some(spec.symbol.clone()),
            status: Some(if filled { "FILLED" } else { "NEW" }.to_string()),
            side: Some(spec.side.as_str().to_string()),
            order_type: Some(spec.order_type.as_str().to_string()),
            orig_qty: Some(spec.quantity.to_string()),
            executed_qty: Some(if filled {
                spec.quantity.to_string()
            } else {
                "0".to_string()
            }),
            price: spec.price.map(|p| p.to_string()),
            stop_price: spec.stop_price.map(|p| p.to_string()),
            time_in_force: spec.time_in_force.map(|t| t.as_str().to_string()),
            ..Default::default()
        }
    }

    pub fn order_id_display(&self) -> String {
        self.order_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string())
    }

    /// Price of the first fill, falling back to a non-zero `avgPrice`
    pub fn executed_price(&self) -> Option<&str> {
        let first_fill = self
            .fills
            .as_deref()
            .and_then(|fills| fills.first())
            .and_then(|fill| fill.price.as_deref());

        first_fill.or_else(|| {
            self.avg_price
                .as_deref()
                .filter(|p| p.parse::<Decimal>().map(|d| !d.is_zero()).unwrap_or(false))
        })
    }

    /// Fields reported in success events
    pub fn summary_fields(&self) -> Value {
        serde_json::json!({
            "symbol": self.symbol,
            "side": self.side,
            "quantity": self.orig_qty,
            "order_id": self.order_id,
            "status": self.status,
            "executed_qty": self.executed_qty,
            "executed_price": self.executed_price(),
        })
    }
}
