//! Schedule planning: validated strategy in, ordered order list out
//!
//! Planning is deterministic. The grid's live price is the only market input
//! and is passed in by the caller; nothing here touches the network.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use std::time::Duration;

use super::types::{GridParams, Strategy, TwapParams};
use crate::domain::{OrderSide, OrderSpec, StrategyKind};
use crate::error::{Result, StratexError};

/// Upper bound on orders a single grid or TWAP plan may contain
pub const MAX_PLANNED_ORDERS: u32 = 10_000;

/// Where a planned order sits within its strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum OrderRole {
    Single,
    BracketLimit,
    BracketStop,
    /// 1-based level
    GridLevel { level: u32, total: u32 },
    /// 1-based chunk of the main loop
    TwapChunk { chunk: u32, total: u32 },
    TwapRemainder,
}

impl OrderRole {
    /// Request label used in structured events
    pub fn action(&self, strategy: StrategyKind) -> String {
        match self {
            Self::Single => format!("place_{}_order", strategy.as_str()),
            Self::BracketLimit => "place_bracket_limit_order".to_string(),
            Self::BracketStop => "place_bracket_stop_order".to_string(),
            Self::GridLevel { level, .. } => format!("place_grid_order_{level}"),
            Self::TwapChunk { chunk, .. } => format!("place_twap_chunk_{chunk}"),
            Self::TwapRemainder => "place_twap_remaining".to_string(),
        }
    }

    /// Label used when a submission fails
    pub fn error_label(&self) -> String {
        match self {
            Self::Single => "Order_Error".to_string(),
            Self::BracketLimit => "Bracket_Limit_Error".to_string(),
            Self::BracketStop => "Bracket_Stop_Error".to_string(),
            Self::GridLevel { level, .. } => format!("Grid_Order_{level}_Error"),
            Self::TwapChunk { chunk, .. } => format!("TWAP_Chunk_{chunk}_Error"),
            Self::TwapRemainder => "TWAP_Remaining_Error".to_string(),
        }
    }

    pub fn is_twap_chunk(&self) -> bool {
        matches!(self, Self::TwapChunk { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedOrder {
    pub spec: OrderSpec,
    pub role: OrderRole,
}

/// Strategy facts needed for pacing and reporting
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlanMetadata {
    Single,
    Bracket {
        stop_limit_price: Decimal,
    },
    Grid {
        current_price: Decimal,
        price_low: Decimal,
        price_high: Decimal,
        step: Decimal,
        quantity_per_level: Decimal,
    },
    Twap {
        total_quantity: Decimal,
        chunk_size: Decimal,
        num_chunks: u32,
        remainder: Decimal,
        #[serde(rename = "interval_seconds", serialize_with = "ser_secs")]
        interval: Duration,
    },
}

fn ser_secs<S: serde::Serializer>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

/// How the execution loop reacts to a failed submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Record it and move on to the next planned order
    Isolate,
    /// Record it, skip the remaining main-loop TWAP chunks, still try the remainder
    HaltChunks,
}

/// Fully computed order schedule for one invocation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionPlan {
    pub strategy: StrategyKind,
    pub symbol: String,
    pub items: Vec<PlannedOrder>,
    pub metadata: PlanMetadata,
}

impl ExecutionPlan {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn specs(&self) -> impl Iterator<Item = &OrderSpec> {
        self.items.iter().map(|item| &item.spec)
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        match self.strategy {
            StrategyKind::Twap => FailurePolicy::HaltChunks,
            _ => FailurePolicy::Isolate,
        }
    }

    /// Pause between successive submissions, TWAP only
    pub fn pacing_interval(&self) -> Option<Duration> {
        match &self.metadata {
            PlanMetadata::Twap { interval, .. } => Some(*interval),
            _ => None,
        }
    }
}

/// Derive the order schedule for a validated strategy.
///
/// `market_price` is required for the grid and ignored by everything else.
pub fn plan(strategy: &Strategy, market_price: Option<Decimal>) -> Result<ExecutionPlan> {
    let kind = strategy.kind();
    let symbol = strategy.symbol().to_string();

    let (items, metadata) = match strategy {
        Strategy::Market(p) => (
            vec![single(OrderSpec::market(&p.symbol, p.side, p.quantity))],
            PlanMetadata::Single,
        ),
        Strategy::Limit(p) => (
            vec![single(OrderSpec::limit(&p.symbol, p.side, p.quantity, p.price))],
            PlanMetadata::Single,
        ),
        Strategy::StopLimit(p) => (
            vec![single(OrderSpec::stop_limit(
                &p.symbol,
                p.side,
                p.quantity,
                p.stop_price,
                p.limit_price,
            ))],
            PlanMetadata::Single,
        ),
        Strategy::Bracket(p) => (
            vec![
                PlannedOrder {
                    spec: OrderSpec::limit(&p.symbol, p.side, p.quantity, p.price),
                    role: OrderRole::BracketLimit,
                },
                PlannedOrder {
                    spec: OrderSpec::stop_market(&p.symbol, p.side, p.quantity, p.stop_price),
                    role: OrderRole::BracketStop,
                },
            ],
            PlanMetadata::Bracket {
                stop_limit_price: p.stop_limit_price,
            },
        ),
        Strategy::Grid(p) => {
            let current_price = market_price.ok_or_else(|| {
                StratexError::Planning("grid planning requires a current market price".into())
            })?;
            plan_grid(p, current_price)?
        }
        Strategy::Twap(p) => plan_twap(p)?,
    };

    Ok(ExecutionPlan {
        strategy: kind,
        symbol,
        items,
        metadata,
    })
}

fn single(spec: OrderSpec) -> PlannedOrder {
    PlannedOrder {
        spec,
        role: OrderRole::Single,
    }
}

/// Evenly spaced LIMIT ladder: buys below the live price, sells at or above it
fn plan_grid(p: &GridParams, current_price: Decimal) -> Result<(Vec<PlannedOrder>, PlanMetadata)> {
    if p.levels > MAX_PLANNED_ORDERS {
        return Err(StratexError::Planning(format!(
            "grid of {} levels exceeds the limit of {} orders",
            p.levels, MAX_PLANNED_ORDERS
        )));
    }
    let step = grid_step(p.price_low, p.price_high, p.levels);

    let items = (0..p.levels)
        .map(|i| {
            let price = if i + 1 == p.levels {
                p.price_high
            } else {
                p.price_low + step * Decimal::from(i)
            };
            let side = if price < current_price {
                OrderSide::Buy
            } else {
                OrderSide::Sell
            };
            PlannedOrder {
                spec: OrderSpec::limit(&p.symbol, side, p.quantity_per_level, price),
                role: OrderRole::GridLevel {
                    level: i + 1,
                    total: p.levels,
                },
            }
        })
        .collect();

    let metadata = PlanMetadata::Grid {
        current_price,
        price_low: p.price_low,
        price_high: p.price_high,
        step,
        quantity_per_level: p.quantity_per_level,
    };
    Ok((items, metadata))
}

pub fn grid_step(price_low: Decimal, price_high: Decimal, levels: u32) -> Decimal {
    (price_high - price_low) / Decimal::from(levels.saturating_sub(1).max(1))
}

/// Split a TWAP into full chunks and a trailing remainder
///
/// Returns `(num_chunks, remainder)` with `num_chunks * chunk + remainder == total`,
/// or `None` when the chunk count does not fit.
pub fn twap_split(total: Decimal, chunk: Decimal) -> Option<(u32, Decimal)> {
    let num_chunks = total.checked_div(chunk)?.floor().to_u32()?;
    let remainder = total.checked_sub(chunk.checked_mul(Decimal::from(num_chunks))?)?;
    Some((num_chunks, remainder))
}

fn plan_twap(p: &TwapParams) -> Result<(Vec<PlannedOrder>, PlanMetadata)> {
    let (num_chunks, remainder) = twap_split(p.total_quantity, p.chunk_size).ok_or_else(|| {
        StratexError::Planning(format!(
            "TWAP of {} in chunks of {} needs too many orders",
            p.total_quantity, p.chunk_size
        ))
    })?;
    let has_remainder = remainder > Decimal::ZERO;
    let slots = num_chunks.saturating_add(u32::from(has_remainder));
    if slots > MAX_PLANNED_ORDERS {
        return Err(StratexError::Planning(format!(
            "TWAP of {} in chunks of {} needs {} orders, limit is {}",
            p.total_quantity, p.chunk_size, slots, MAX_PLANNED_ORDERS
        )));
    }

    let interval_secs = (Decimal::from(p.duration_seconds) / Decimal::from(slots.max(1)))
        .to_f64()
        .unwrap_or(0.0);
    let interval = Duration::from_secs_f64(interval_secs.max(0.0));

    let mut items: Vec<PlannedOrder> = (1..=num_chunks)
        .map(|chunk| PlannedOrder {
            spec: OrderSpec::market(&p.symbol, p.side, p.chunk_size),
            role: OrderRole::TwapChunk {
                chunk,
                total: num_chunks,
            },
        })
        .collect();

    if has_remainder {
        items.push(PlannedOrder {
            spec: OrderSpec::market(&p.symbol, p.side, remainder),
            role: OrderRole::TwapRemainder,
        });
    }

    let metadata = PlanMetadata::Twap {
        total_quantity: p.total_quantity,
        chunk_size: p.chunk_size,
        num_chunks,
        remainder,
        interval,
    };
    Ok((items, metadata))
}
