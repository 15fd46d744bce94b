//! Validated, typed strategy parameters
//!
//! A [`Strategy`] can only be produced by the validator, so the planner never
//! sees a negative quantity or an inverted price range.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::{OrderSide, StrategyKind};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketParams {
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LimitParams {
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: Decimal,
    pub price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopLimitParams {
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: Decimal,
    pub stop_price: Decimal,
    pub limit_price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BracketParams {
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: Decimal,
    /// Take-profit leg limit price
    pub price: Decimal,
    /// Protective leg trigger price
    pub stop_price: Decimal,
    /// Checked for presence only; futures brackets use a STOP_MARKET leg
    pub stop_limit_price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridParams {
    pub symbol: String,
    pub price_low: Decimal,
    pub price_high: Decimal,
    pub levels: u32,
    pub quantity_per_level: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TwapParams {
    pub symbol: String,
    pub side: OrderSide,
    pub total_quantity: Decimal,
    pub duration_seconds: u64,
    pub chunk_size: Decimal,
}

/// Strategy-tagged variant driving the generic engine
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum Strategy {
    Market(MarketParams),
    Limit(LimitParams),
    StopLimit(StopLimitParams),
    Bracket(BracketParams),
    Grid(GridParams),
    Twap(TwapParams),
}

impl Strategy {
    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::Market(_) => StrategyKind::Market,
            Self::Limit(_) => StrategyKind::Limit,
            Self::StopLimit(_) => StrategyKind::StopLimit,
            Self::Bracket(_) => StrategyKind::Bracket,
            Self::Grid(_) => StrategyKind::Grid,
            Self::Twap(_) => StrategyKind::Twap,
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            Self::Market(p) => &p.symbol,
            Self::Limit(p) => &p.symbol,
            Self::StopLimit(p) => &p.symbol,
            Self::Bracket(p) => &p.symbol,
            Self::Grid(p) => &p.symbol,
            Self::Twap(p) => &p.symbol,
        }
    }

    /// Only the grid needs a live price before it can be planned
    pub fn needs_market_price(&self) -> bool {
        matches!(self, Self::Grid(_))
    }
}
