//! Parameter validation for every strategy
//!
//! Pure functions, no I/O. Parsing and range checking happen together so a
//! malformed number and an out-of-range number get different reasons.

use rust_decimal::Decimal;
use serde::Serialize;
use std::str::FromStr;

use super::types::{
    BracketParams, GridParams, LimitParams, MarketParams, StopLimitParams, Strategy, TwapParams,
};
use crate::domain::{OrderSide, StrategyParameters};
use crate::error::ValidationError;

type Checked<T> = std::result::Result<T, ValidationError>;

/// Outcome of [`validate`]: `reason` is empty when `ok`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub ok: bool,
    pub reason: String,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self {
            ok: true,
            reason: String::new(),
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        Self {
            ok: false,
            reason: reason.into(),
        }
    }
}

impl<T> From<&Checked<T>> for ValidationResult {
    fn from(checked: &Checked<T>) -> Self {
        match checked {
            Ok(_) => Self::valid(),
            Err(e) => Self::invalid(e.reason.clone()),
        }
    }
}

/// Validate raw parameters without keeping the typed result
pub fn validate(params: &StrategyParameters) -> ValidationResult {
    ValidationResult::from(&parse_strategy(params))
}

/// Validate raw parameters and convert them into a typed [`Strategy`]
pub fn parse_strategy(params: &StrategyParameters) -> Checked<Strategy> {
    match params {
        StrategyParameters::Market {
            symbol,
            side,
            quantity,
        } => {
            let symbol = check_symbol(symbol)?;
            let side = check_side(side)?;
            let quantity = check_quantity(quantity)?;
            Ok(Strategy::Market(MarketParams {
                symbol,
                side,
                quantity,
            }))
        }
        StrategyParameters::Limit {
            symbol,
            side,
            quantity,
            price,
        } => {
            let symbol = check_symbol(symbol)?;
            let side = check_side(side)?;
            let quantity = check_quantity(quantity)?;
            let price = parse_decimal(price)
                .ok_or_else(|| ValidationError::format("Invalid price format"))?;
            if price <= Decimal::ZERO {
                return Err(ValidationError::range("Price must be positive"));
            }
            Ok(Strategy::Limit(LimitParams {
                symbol,
                side,
                quantity,
                price,
            }))
        }
        StrategyParameters::StopLimit {
            symbol,
            side,
            quantity,
            stop_price,
            limit_price,
        } => {
            let symbol = check_symbol(symbol)?;
            let side = check_side(side)?;
            let quantity = check_quantity(quantity)?;
            let [stop_price, limit_price] = check_prices([stop_price, limit_price])?;
            check_stop_relation(side, stop_price, limit_price)?;
            Ok(Strategy::StopLimit(StopLimitParams {
                symbol,
                side,
                quantity,
                stop_price,
                limit_price,
            }))
        }
        StrategyParameters::Bracket {
            symbol,
            side,
            quantity,
            price,
            stop_price,
            stop_limit_price,
        } => {
            let symbol = check_symbol(symbol)?;
            let side = check_side(side)?;
            let quantity = check_quantity(quantity)?;
            let [price, stop_price, stop_limit_price] =
                check_prices([price, stop_price, stop_limit_price])?;
            Ok(Strategy::Bracket(BracketParams {
                symbol,
                side,
                quantity,
                price,
                stop_price,
                stop_limit_price,
            }))
        }
        StrategyParameters::Grid {
            symbol,
            price_low,
            price_high,
            levels,
            quantity_per_level,
        } => {
            let symbol = check_symbol(symbol)?;
            let numeric = || ValidationError::format("Invalid numeric format");
            let price_low = parse_decimal(price_low).ok_or_else(numeric)?;
            let price_high = parse_decimal(price_high).ok_or_else(numeric)?;
            let levels = parse_whole(levels).ok_or_else(numeric)?;
            let quantity_per_level = parse_decimal(quantity_per_level).ok_or_else(numeric)?;

            if price_low <= Decimal::ZERO || price_high <= Decimal::ZERO {
                return Err(ValidationError::range("Prices must be positive"));
            }
            if price_low >= price_high {
                return Err(ValidationError::range(
                    "Low price must be less than high price",
                ));
            }
            if levels < 2 {
                return Err(ValidationError::range("Grid levels must be at least 2"));
            }
            if quantity_per_level <= Decimal::ZERO {
                return Err(ValidationError::range(
                    "Quantity per level must be positive",
                ));
            }
            let levels = u32::try_from(levels).map_err(|_| numeric())?;

            Ok(Strategy::Grid(GridParams {
                symbol,
                price_low,
                price_high,
                levels,
                quantity_per_level,
            }))
        }
        StrategyParameters::Twap {
            symbol,
            side,
            total_quantity,
            duration_seconds,
            chunk_size,
        } => {
            let symbol = check_symbol(symbol)?;
            let side = check_side(side)?;
            let numeric = || ValidationError::format("Invalid numeric format");
            let total_quantity = parse_decimal(total_quantity).ok_or_else(numeric)?;
            let chunk_size = parse_decimal(chunk_size).ok_or_else(numeric)?;
            let duration = parse_whole(duration_seconds).ok_or_else(numeric)?;

            if total_quantity <= Decimal::ZERO || chunk_size <= Decimal::ZERO {
                return Err(ValidationError::range("Quantities must be positive"));
            }
            if duration <= 0 {
                return Err(ValidationError::range("Time duration must be positive"));
            }
            if chunk_size > total_quantity {
                return Err(ValidationError::range(
                    "Chunk size cannot be larger than total quantity",
                ));
            }

            Ok(Strategy::Twap(TwapParams {
                symbol,
                side,
                total_quantity,
                duration_seconds: duration.unsigned_abs(),
                chunk_size,
            }))
        }
    }
}

fn check_symbol(raw: &str) -> Checked<String> {
    if raw.trim().is_empty() {
        return Err(ValidationError::range("Invalid symbol"));
    }
    Ok(raw.to_string())
}

fn check_side(raw: &str) -> Checked<OrderSide> {
    OrderSide::parse_exact(raw).ok_or_else(|| ValidationError::range("Side must be BUY or SELL"))
}

fn check_quantity(raw: &str) -> Checked<Decimal> {
    let quantity =
        parse_decimal(raw).ok_or_else(|| ValidationError::format("Invalid quantity format"))?;
    if quantity <= Decimal::ZERO {
        return Err(ValidationError::range("Quantity must be positive"));
    }
    Ok(quantity)
}

/// Parse every price first, then require all of them to be positive
fn check_prices<const N: usize>(raw: [&String; N]) -> Checked<[Decimal; N]> {
    let mut out = [Decimal::ZERO; N];
    for (slot, value) in out.iter_mut().zip(raw) {
        *slot = parse_decimal(value)
            .ok_or_else(|| ValidationError::format("Invalid price format"))?;
    }
    if out.iter().any(|p| *p <= Decimal::ZERO) {
        return Err(ValidationError::range("All prices must be positive"));
    }
    Ok(out)
}

/// A BUY stop triggers above its limit, a SELL stop below it
fn check_stop_relation(side: OrderSide, stop_price: Decimal, limit_price: Decimal) -> Checked<()> {
    match side {
        OrderSide::Buy if stop_price <= limit_price => Err(ValidationError::range(
            "For BUY orders: stop price must be higher than limit price",
        )),
        OrderSide::Sell if stop_price >= limit_price => Err(ValidationError::range(
            "For SELL orders: stop price must be lower than limit price",
        )),
        _ => Ok(()),
    }
}

/// Plain or scientific decimal notation
fn parse_decimal(raw: &str) -> Option<Decimal> {
    let raw = raw.trim();
    Decimal::from_str(raw)
        .ok()
        .or_else(|| Decimal::from_scientific(raw).ok())
}

/// Signed whole number; fractional input is a format error
fn parse_whole(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationErrorKind;
    use rust_decimal_macros::dec;

    fn stop_limit(side: &str, stop: &str, limit: &str) -> StrategyParameters {
        StrategyParameters::StopLimit {
            symbol: "BTCUSDT".into(),
            side: side.into(),
            quantity: "0.01".into(),
            stop_price: stop.into(),
            limit_price: limit.into(),
        }
    }

    fn grid(low: &str, high: &str, levels: &str, qty: &str) -> StrategyParameters {
        StrategyParameters::Grid {
            symbol: "BTCUSDT".into(),
            price_low: low.into(),
            price_high: high.into(),
            levels: levels.into(),
            quantity_per_level: qty.into(),
        }
    }

    fn twap(total: &str, duration: &str, chunk: &str) -> StrategyParameters {
        StrategyParameters::Twap {
            symbol: "BTCUSDT".into(),
            side: "BUY".into(),
            total_quantity: total.into(),
            duration_seconds: duration.into(),
            chunk_size: chunk.into(),
        }
    }

    #[test]
    fn stop_limit_relation_is_strict() {
        assert_eq!(
            validate(&stop_limit("BUY", "100", "100")),
            ValidationResult::invalid("For BUY orders: stop price must be higher than limit price")
        );
        assert!(validate(&stop_limit("BUY", "101", "100")).ok);
        assert!(validate(&stop_limit("SELL", "99", "100")).ok);
        assert_eq!(
            validate(&stop_limit("SELL", "100", "100")),
            ValidationResult::invalid("For SELL orders: stop price must be lower than limit price")
        );
    }

    #[test]
    fn format_and_range_failures_have_distinct_reasons() {
        let malformed = StrategyParameters::Market {
            symbol: "BTCUSDT".into(),
            side: "BUY".into(),
            quantity: "abc".into(),
        };
        let err = parse_strategy(&malformed).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::Format);
        assert_eq!(err.reason, "Invalid quantity format");

        let negative = StrategyParameters::Market {
            symbol: "BTCUSDT".into(),
            side: "BUY".into(),
            quantity: "-1".into(),
        };
        let err = parse_strategy(&negative).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::Range);
        assert_eq!(err.reason, "Quantity must be positive");
    }

    #[test]
    fn side_is_case_sensitive() {
        let lower = StrategyParameters::Limit {
            symbol: "BTCUSDT".into(),
            side: "buy".into(),
            quantity: "1".into(),
            price: "100".into(),
        };
        assert_eq!(validate(&lower).reason, "Side must be BUY or SELL");
    }

    #[test]
    fn empty_symbol_is_rejected_first() {
        let params = StrategyParameters::Limit {
            symbol: "".into(),
            side: "nope".into(),
            quantity: "x".into(),
            price: "y".into(),
        };
        assert_eq!(validate(&params).reason, "Invalid symbol");
    }

    #[test]
    fn limit_price_checks() {
        let params = |price: &str| StrategyParameters::Limit {
            symbol: "BTCUSDT".into(),
            side: "SELL".into(),
            quantity: "0.5".into(),
            price: price.into(),
        };
        assert_eq!(validate(&params("4e4x")).reason, "Invalid price format");
        assert_eq!(validate(&params("0")).reason, "Price must be positive");
        match parse_strategy(&params("4.5e4")).unwrap() {
            Strategy::Limit(p) => assert_eq!(p.price, dec!(45000)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn bracket_requires_all_prices_positive() {
        let params = |stop_limit: &str| StrategyParameters::Bracket {
            symbol: "BTCUSDT".into(),
            side: "SELL".into(),
            quantity: "0.01".into(),
            price: "46000".into(),
            stop_price: "44000".into(),
            stop_limit_price: stop_limit.into(),
        };
        assert_eq!(validate(&params("0")).reason, "All prices must be positive");
        assert_eq!(validate(&params("")).reason, "Invalid price format");
        assert!(validate(&params("43500")).ok);
    }

    #[test]
    fn grid_rules() {
        assert!(validate(&grid("44000", "46000", "5", "0.01")).ok);
        assert_eq!(
            validate(&grid("44000", "46000", "2.5", "0.01")).reason,
            "Invalid numeric format"
        );
        assert_eq!(
            validate(&grid("0", "46000", "5", "0.01")).reason,
            "Prices must be positive"
        );
        assert_eq!(
            validate(&grid("46000", "46000", "5", "0.01")).reason,
            "Low price must be less than high price"
        );
        assert_eq!(
            validate(&grid("44000", "46000", "1", "0.01")).reason,
            "Grid levels must be at least 2"
        );
        assert_eq!(
            validate(&grid("44000", "46000", "3", "-0.01")).reason,
            "Quantity per level must be positive"
        );
    }

    #[test]
    fn twap_rules() {
        assert!(validate(&twap("0.1", "300", "0.01")).ok);
        assert_eq!(validate(&twap("0.1", "300s", "0.01")).reason, "Invalid numeric format");
        assert_eq!(validate(&twap("0.1", "300", "0")).reason, "Quantities must be positive");
        assert_eq!(validate(&twap("0.1", "0", "0.01")).reason, "Time duration must be positive");
        assert_eq!(
            validate(&twap("0.1", "300", "0.2")).reason,
            "Chunk size cannot be larger than total quantity"
        );
        assert!(validate(&twap("0.1", "300", "0.1")).ok);
    }

    #[test]
    fn validation_is_idempotent() {
        let inputs = [
            stop_limit("BUY", "100", "100"),
            grid("44000", "46000", "5", "0.01"),
            twap("1", "x", "1"),
        ];
        for params in &inputs {
            assert_eq!(validate(params), validate(params));
        }
    }
}
