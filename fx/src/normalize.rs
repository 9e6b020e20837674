//! Shapes rate API payloads into a [`RateTable`].
//!
//! Recognized shapes, first match wins:
//!
//! 1. `{"rates": {"eur": 0.92, ...}}` (ExchangeRate-API and friends)
//! 2. `{"usd": {"eur": 0.92, ...}}`, keyed by the lower-case base
//! 3. `{"eur": 0.92, "gbp": 0.79}`, a flat map of numbers
//!
//! Anything else yields an empty table.

use std::str::FromStr;

use ratekit_common::Currency;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use tracing::trace;

use crate::table::RateTable;

/// Normalize a payload fetched for `base`.
pub fn normalize(payload: &Value, base: &Currency) -> RateTable {
    let Some(object) = payload.as_object() else {
        return RateTable::new();
    };

    if let Some(Value::Object(rates)) = object.get("rates") {
        trace!(shape = "rates", "Matched payload shape");
        return collect_rates(rates);
    }

    if let Some(Value::Object(rates)) = object.get(&base.lower()) {
        trace!(shape = "keyed_by_base", "Matched payload shape");
        return collect_rates(rates);
    }

    if !object.is_empty() && object.values().all(Value::is_number) {
        trace!(shape = "flat", "Matched payload shape");
        return collect_rates(object);
    }

    RateTable::new()
}

fn collect_rates(map: &Map<String, Value>) -> RateTable {
    map.iter()
        .filter_map(|(code, value)| match parse_entry(code, value) {
            Ok(entry) => Some(entry),
            Err(reason) => {
                trace!(code = %code, value = %value, reason, "Skipping rate entry");
                None
            }
        })
        .collect()
}

/// One `code: rate` pair, or the reason it is unusable.
fn parse_entry(code: &str, value: &Value) -> Result<(Currency, Decimal), &'static str> {
    let currency = Currency::parse(code).map_err(|_| "not a currency code")?;
    let rate = to_decimal(value).ok_or("not a number")?;
    if rate <= Decimal::ZERO {
        return Err("not positive");
    }
    Ok((currency, rate))
}

/// Parse a JSON number into a decimal using its textual form, so 0.9 stays 0.9.
fn to_decimal(value: &Value) -> Option<Decimal> {
    let Value::Number(n) = value else {
        return None;
    };
    let text = n.to_string();
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_rates_field() {
        let table = normalize(&json!({"result": "success", "rates": {"eur": 0.9}}), &Currency::usd());

        assert_eq!(table.len(), 1);
        assert_eq!(table.get(&Currency::eur()), Some(dec!(0.9)));
    }

    #[test]
    fn test_keyed_by_lower_base() {
        let payload = json!({"date": "2024-03-01", "usd": {"eur": 0.9, "gbp": 0.8}});
        let table = normalize(&payload, &Currency::usd());

        assert_eq!(table.get(&Currency::eur()), Some(dec!(0.9)));
        assert_eq!(table.get(&Currency::gbp()), Some(dec!(0.8)));
    }

    #[test]
    fn test_keyed_by_other_base_does_not_match() {
        let payload = json!({"date": "2024-03-01", "eur": {"usd": 1.1}});
        assert!(normalize(&payload, &Currency::usd()).is_empty());
    }

    #[test]
    fn test_flat_numeric_map() {
        let table = normalize(&json!({"eur": 0.9, "gbp": 0.8}), &Currency::usd());

        assert_eq!(table.len(), 2);
        assert_eq!(table.get(&Currency::eur()), Some(dec!(0.9)));
        assert_eq!(table.get(&Currency::gbp()), Some(dec!(0.8)));
    }

    #[test]
    fn test_rates_field_wins_over_flat() {
        let payload = json!({"rates": {"EUR": 0.9}, "usd": {"eur": 0.5}});
        let table = normalize(&payload, &Currency::usd());

        assert_eq!(table.get(&Currency::eur()), Some(dec!(0.9)));
    }

    #[test]
    fn test_unrecognized_shapes() {
        let usd = Currency::usd();
        assert!(normalize(&json!({}), &usd).is_empty());
        assert!(normalize(&json!([0.9, 0.8]), &usd).is_empty());
        assert!(normalize(&json!({"eur": 0.9, "note": "mixed"}), &usd).is_empty());
        assert!(normalize(&json!({"rates": [1, 2]}), &usd).is_empty());
        assert!(normalize(&json!("oops"), &usd).is_empty());
    }

    #[test]
    fn test_skips_invalid_entries() {
        let payload = json!({"rates": {
            "eur": 0.9,
            "gbp": 0,
            "jpy": -150.0,
            "cad": "1.36",
            "bitcoin": 0.00001,
            "idr": 15500.5
        }});
        let table = normalize(&payload, &Currency::usd());

        assert_eq!(table.currencies(), vec![Currency::eur(), Currency::new("IDR")]);
        assert_eq!(table.get(&Currency::new("IDR")), Some(dec!(15500.5)));
    }

    #[test]
    fn test_skip_reasons() {
        assert_eq!(parse_entry("1inch", &json!(0.3)).unwrap_err(), "not a currency code");
        assert_eq!(parse_entry("cad", &json!("1.36")).unwrap_err(), "not a number");
        assert_eq!(parse_entry("gbp", &json!(0)).unwrap_err(), "not positive");
        assert_eq!(parse_entry("eur", &json!(0.9)).unwrap(), (Currency::eur(), dec!(0.9)));

        let payload = json!({"usd": {"1inch": 0.3, "eur": 0.9}});
        assert_eq!(normalize(&payload, &Currency::usd()).len(), 1);
    }

    #[test]
    fn test_scientific_notation() {
        let table = normalize(&json!({"rates": {"btc": 1.5e-5}}), &Currency::usd());
        assert_eq!(table.get(&Currency::new("BTC")), Some(dec!(0.000015)));
    }
}
