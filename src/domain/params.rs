use serde::Serialize;
use serde_json::Value;

/// The execution strategies this tool can run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Market,
    Limit,
    StopLimit,
    Bracket,
    Grid,
    Twap,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Market => "market",
            Self::Limit => "limit",
            Self::StopLimit => "stop_limit",
            Self::Bracket => "bracket",
            Self::Grid => "grid",
            Self::Twap => "twap",
        }
    }

    /// Name used in human-readable output
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Market => "Market",
            Self::Limit => "Limit",
            Self::StopLimit => "Stop-Limit",
            Self::Bracket => "OCO-style",
            Self::Grid => "Grid",
            Self::Twap => "TWAP",
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw, user-supplied strategy parameters, exactly as typed.
///
/// Numbers stay strings here so the validator can tell a malformed number
/// apart from one that is out of range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum StrategyParameters {
    Market {
        symbol: String,
        side: String,
        quantity: String,
    },
    Limit {
        symbol: String,
        side: String,
        quantity: String,
        price: String,
    },
    StopLimit {
        symbol: String,
        side: String,
        quantity: String,
        stop_price: String,
        limit_price: String,
    },
    Bracket {
        symbol: String,
        side: String,
        quantity: String,
        price: String,
        stop_price: String,
        stop_limit_price: String,
    },
    Grid {
        symbol: String,
        price_low: String,
        price_high: String,
        levels: String,
        quantity_per_level: String,
    },
    Twap {
        symbol: String,
        side: String,
        total_quantity: String,
        duration_seconds: String,
        chunk_size: String,
    },
}

impl StrategyParameters {
    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::Market { .. } => StrategyKind::Market,
            Self::Limit { .. } => StrategyKind::Limit,
            Self::StopLimit { .. } => StrategyKind::StopLimit,
            Self::Bracket { .. } => StrategyKind::Bracket,
            Self::Grid { .. } => StrategyKind::Grid,
            Self::Twap { .. } => StrategyKind::Twap,
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            Self::Market { symbol, .. }
            | Self::Limit { symbol, .. }
            | Self::StopLimit { symbol, .. }
            | Self::Bracket { symbol, .. }
            | Self::Grid { symbol, .. }
            | Self::Twap { symbol, .. } => symbol,
        }
    }

    /// Raw fields, attached to validation-failed events
    pub fn log_fields(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
