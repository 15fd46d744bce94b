//! stratex CLI - one subcommand per strategy
//!
//! Commands:
//! - `stratex market` - market order
//! - `stratex limit` - resting GTC limit order
//! - `stratex stop-limit` - stop order that rests at a limit price once triggered
//! - `stratex bracket` - take-profit limit plus protective stop-market, unlinked
//! - `stratex grid` - ladder of limit orders around the current price
//! - `stratex twap` - market order split into paced chunks

pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::domain::StrategyParameters;

/// Strategy-driven order placement for Binance USD-M futures
#[derive(Parser, Debug)]
#[command(name = "stratex")]
#[command(author, version, about = "Strategy-driven order placement for Binance USD-M futures")]
pub struct Cli {
    /// Configuration directory (default.toml, <STRATEX_ENV>.toml)
    #[arg(long, global = true, default_value = "config")]
    pub config: PathBuf,

    /// Acknowledge orders locally instead of sending them
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Place a market order
    Market {
        symbol: String,
        side: String,
        #[arg(allow_negative_numbers = true)]
        quantity: String,
    },

    /// Place a GTC limit order
    Limit {
        symbol: String,
        side: String,
        #[arg(allow_negative_numbers = true)]
        quantity: String,
        #[arg(allow_negative_numbers = true)]
        price: String,
    },

    /// Place a stop-limit order (BUY: stop above limit, SELL: stop below limit)
    StopLimit {
        symbol: String,
        side: String,
        #[arg(allow_negative_numbers = true)]
        quantity: String,
        #[arg(allow_negative_numbers = true)]
        stop_price: String,
        #[arg(allow_negative_numbers = true)]
        limit_price: String,
    },

    /// Place a take-profit limit and a stop-market as two separate orders
    Bracket {
        symbol: String,
        side: String,
        #[arg(allow_negative_numbers = true)]
        quantity: String,
        #[arg(allow_negative_numbers = true)]
        price: String,
        #[arg(allow_negative_numbers = true)]
        stop_price: String,
        #[arg(allow_negative_numbers = true)]
        stop_limit_price: String,
    },

    /// Place evenly spaced limit orders between two prices
    Grid {
        symbol: String,
        #[arg(allow_negative_numbers = true)]
        price_low: String,
        #[arg(allow_negative_numbers = true)]
        price_high: String,
        #[arg(allow_negative_numbers = true)]
        grid_levels: String,
        #[arg(allow_negative_numbers = true)]
        quantity_per_level: String,
    },

    /// Split a market order into chunks spread over a duration
    Twap {
        symbol: String,
        side: String,
        #[arg(allow_negative_numbers = true)]
        total_quantity: String,
        #[arg(allow_negative_numbers = true)]
        duration_seconds: String,
        #[arg(allow_negative_numbers = true)]
        chunk_size: String,
    },
}

/// Worked example for a subcommand name, shown after a usage error
pub fn usage_example(subcommand: &str) -> Option<&'static str> {
    Some(match subcommand {
        "market" => "stratex market BTCUSDT BUY 0.01",
        "limit" => "stratex limit BTCUSDT SELL 0.01 46000.00",
        "stop-limit" => "stratex stop-limit BTCUSDT BUY 0.01 45000.00 44000.00",
        "bracket" => "stratex bracket BTCUSDT SELL 0.01 46000.00 44000.00 43500.00",
        "grid" => "stratex grid BTCUSDT 44000.00 46000.00 5 0.01",
        "twap" => "stratex twap BTCUSDT BUY 0.1 300 0.01",
        _ => return None,
    })
}

impl Commands {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Market { .. } => "market",
            Self::Limit { .. } => "limit",
            Self::StopLimit { .. } => "stop-limit",
            Self::Bracket { .. } => "bracket",
            Self::Grid { .. } => "grid",
            Self::Twap { .. } => "twap",
        }
    }

    /// Raw parameters for the validator; symbol and side are upper-cased here
    pub fn into_parameters(self) -> StrategyParameters {
        let up = |s: String| s.trim().to_uppercase();
        match self {
            Self::Market {
                symbol,
                side,
                quantity,
            } => StrategyParameters::Market {
                symbol: up(symbol),
                side: up(side),
                quantity,
            },
            Self::Limit {
                symbol,
                side,
                quantity,
                price,
            } => StrategyParameters::Limit {
                symbol: up(symbol),
                side: up(side),
                quantity,
                price,
            },
            Self::StopLimit {
                symbol,
                side,
                quantity,
                stop_price,
                limit_price,
            } => StrategyParameters::StopLimit {
                symbol: up(symbol),
                side: up(side),
                quantity,
                stop_price,
                limit_price,
            },
            Self::Bracket {
                symbol,
                side,
                quantity,
                price,
                stop_price,
                stop_limit_price,
            } => StrategyParameters::Bracket {
                symbol: up(symbol),
                side: up(side),
                quantity,
                price,
                stop_price,
                stop_limit_price,
            },
            Self::Grid {
                symbol,
                price_low,
                price_high,
                grid_levels,
                quantity_per_level,
            } => StrategyParameters::Grid {
                symbol: up(symbol),
                price_low,
                price_high,
                levels: grid_levels,
                quantity_per_level,
            },
            Self::Twap {
                symbol,
                side,
                total_quantity,
                duration_seconds,
                chunk_size,
            } => StrategyParameters::Twap {
                symbol: up(symbol),
                side: up(side),
                total_quantity,
                duration_seconds,
                chunk_size,
            },
        }
    }
}
