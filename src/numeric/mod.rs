//! Lossless conversion between base-unit integers and decimal token amounts.
//!
//! # Data Flow
//! ```text
//! "12.5" (request body)
//!     → decimal_to_base_units (exact, rejects excess precision)
//!     → U256 base units (call data, event values)
//!     → base_units_to_decimal (exact, trailing zeros trimmed)
//!     → "12.5" (response body)
//! ```
//!
//! # Design Decisions
//! - Pure string/integer arithmetic; no floating point anywhere
//! - Canonical decimal output: no trailing fractional zeros, no dangling point
//! - Wire serialisation helpers live in [`wire`]

pub mod wire;

use alloy::primitives::U256;
use serde::Serialize;

use crate::error::{GatewayError, GatewayResult};

/// Largest integer a JSON consumer backed by IEEE-754 doubles holds exactly.
pub const MAX_SAFE_INTEGER: u64 = (1 << 53) - 1;

/// Largest precision whose scale factor fits in 256 bits.
pub const MAX_DECIMALS: u8 = 77;

/// Convert a decimal token amount into base units.
///
/// Accepts `digits` or `digits.digits`. Signs, exponents, whitespace and
/// fractions finer than `decimals` are rejected rather than rounded.
pub fn decimal_to_base_units(input: &str, decimals: u8) -> GatewayResult<U256> {
    if decimals > MAX_DECIMALS {
        return Err(GatewayError::InvalidAmount(format!(
            "precision of {} decimals is not representable",
            decimals
        )));
    }
    if input.is_empty() {
        return Err(GatewayError::InvalidAmount("amount is empty".to_string()));
    }
    if input.starts_with('-') {
        return Err(GatewayError::InvalidAmount(format!(
            "amount '{}' is negative",
            input
        )));
    }

    let (whole, fraction) = match input.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (input, None),
    };

    if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return Err(GatewayError::InvalidAmount(format!(
            "amount '{}' is not a decimal number",
            input
        )));
    }

    let fraction = fraction.unwrap_or("");
    if input.contains('.') && fraction.is_empty() {
        return Err(GatewayError::InvalidAmount(format!(
            "amount '{}' has an empty fractional part",
            input
        )));
    }
    if !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return Err(GatewayError::InvalidAmount(format!(
            "amount '{}' is not a decimal number",
            input
        )));
    }
    if fraction.len() > decimals as usize {
        return Err(GatewayError::InvalidAmount(format!(
            "amount '{}' has more than {} fractional digits",
            input, decimals
        )));
    }

    let mut digits = String::with_capacity(whole.len() + decimals as usize);
    digits.push_str(whole);
    digits.push_str(fraction);
    digits.extend(std::iter::repeat('0').take(decimals as usize - fraction.len()));

    U256::from_str_radix(&digits, 10).map_err(|_| {
        GatewayError::InvalidAmount(format!("amount '{}' overflows 256 bits", input))
    })
}

/// Format base units as a decimal token amount. Never rounds.
pub fn base_units_to_decimal(value: U256, decimals: u8) -> String {
    let digits = value.to_string();
    let scale = decimals as usize;
    if scale == 0 {
        return digits;
    }

    let padded = if digits.len() <= scale {
        format!("{}{}", "0".repeat(scale + 1 - digits.len()), digits)
    } else {
        digits
    };

    let (whole, fraction) = padded.split_at(padded.len() - scale);
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        whole.to_string()
    } else {
        format!("{}.{}", whole, fraction)
    }
}

/// String-in, string-out form of [`decimal_to_base_units`].
pub fn decimal_str_to_base_units_str(input: &str, decimals: u8) -> GatewayResult<String> {
    decimal_to_base_units(input, decimals).map(|v| v.to_string())
}

/// String-in, string-out form of [`base_units_to_decimal`].
pub fn base_units_str_to_decimal_str(input: &str, decimals: u8) -> GatewayResult<String> {
    if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
        return Err(GatewayError::InvalidAmount(format!(
            "'{}' is not a base-unit integer",
            input
        )));
    }
    let value = U256::from_str_radix(input, 10).map_err(|_| {
        GatewayError::InvalidAmount(format!("'{}' overflows 256 bits", input))
    })?;
    Ok(base_units_to_decimal(value, decimals))
}

/// Codec bound to one token's precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumericCodec {
    decimals: u8,
}

impl NumericCodec {
    pub fn new(decimals: u8) -> Self {
        Self { decimals }
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn to_base_units(&self, amount: &str) -> GatewayResult<U256> {
        decimal_to_base_units(amount, self.decimals)
    }

    pub fn to_decimal(&self, value: U256) -> String {
        base_units_to_decimal(value, self.decimals)
    }

    /// Pair a base-unit value with its decimal rendering for responses.
    pub fn amount(&self, value: U256) -> TokenAmount {
        TokenAmount {
            base_units: value,
            decimal: self.to_decimal(value),
        }
    }
}

/// An amount as it leaves the gateway: exact base units plus the display form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenAmount {
    #[serde(with = "wire::u256_string")]
    pub base_units: U256,
    pub decimal: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn wei(s: &str) -> U256 {
        U256::from_str_radix(s, 10).unwrap()
    }

    #[test]
    fn test_whole_and_fractional_amounts() {
        assert_eq!(decimal_to_base_units("1", 18).unwrap(), wei("1000000000000000000"));
        assert_eq!(decimal_to_base_units("0.5", 18).unwrap(), wei("500000000000000000"));
        assert_eq!(
            decimal_to_base_units("0.000000000000000001", 18).unwrap(),
            U256::from(1u64)
        );
        assert_eq!(decimal_to_base_units("0", 18).unwrap(), U256::ZERO);
        assert_eq!(decimal_to_base_units("42", 0).unwrap(), U256::from(42u64));
    }

    #[test]
    fn test_rejects_invalid_input() {
        for bad in ["", "-1", "-0.5", "abc", "1e18", "1.", ".5", "1.2.3", " 1", "+1", "0x10", "1,5"] {
            let err = decimal_to_base_units(bad, 18).unwrap_err();
            assert!(
                matches!(err, GatewayError::InvalidAmount(_)),
                "expected InvalidAmount for {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_rejects_excess_precision() {
        let err = decimal_to_base_units("0.0000000000000000001", 18).unwrap_err();
        assert!(err.to_string().contains("more than 18 fractional digits"));
        assert!(decimal_to_base_units("1.5", 0).is_err());
    }

    #[test]
    fn test_rejects_overflow() {
        let huge = "9".repeat(80);
        assert!(matches!(
            decimal_to_base_units(&huge, 0),
            Err(GatewayError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_format_trims_trailing_zeros() {
        assert_eq!(base_units_to_decimal(wei("1500000000000000000"), 18), "1.5");
        assert_eq!(base_units_to_decimal(wei("1000000000000000000"), 18), "1");
        assert_eq!(base_units_to_decimal(U256::from(1u64), 18), "0.000000000000000001");
        assert_eq!(base_units_to_decimal(U256::ZERO, 18), "0");
        assert_eq!(base_units_to_decimal(U256::from(123u64), 0), "123");
    }

    #[test]
    fn test_values_above_2_pow_53_stay_exact() {
        let big = "123456789012345678901234567890.123456789012345678";
        let units = decimal_to_base_units(big, 18).unwrap();
        assert!(units > U256::from(MAX_SAFE_INTEGER));
        assert_eq!(base_units_to_decimal(units, 18), big);

        assert_eq!(
            base_units_str_to_decimal_str("9007199254740993", 0).unwrap(),
            "9007199254740993"
        );
        assert_eq!(
            decimal_str_to_base_units_str("9007199254740993", 0).unwrap(),
            "9007199254740993"
        );
    }

    #[test]
    fn test_u256_max_formats() {
        let s = base_units_to_decimal(U256::MAX, 18);
        assert_eq!(decimal_to_base_units(&s, 18).unwrap(), U256::MAX);
    }

    #[test]
    fn test_base_units_str_rejects_garbage() {
        assert!(base_units_str_to_decimal_str("12.5", 18).is_err());
        assert!(base_units_str_to_decimal_str("", 18).is_err());
    }

    #[test]
    fn test_codec_amount() {
        let codec = NumericCodec::new(6);
        let amount = codec.amount(U256::from(2_500_000u64));
        assert_eq!(amount.decimal, "2.5");
        let json = serde_json::to_value(&amount).unwrap();
        assert_eq!(json["baseUnits"], "2500000");
        assert_eq!(json["decimal"], "2.5");
    }

    fn canonical_decimal() -> impl Strategy<Value = String> {
        ("(0|[1-9][0-9]{0,40})", proptest::option::of("[0-9]{0,17}[1-9]")).prop_map(
            |(whole, fraction)| match fraction {
                Some(f) => format!("{}.{}", whole, f),
                None => whole,
            },
        )
    }

    proptest! {
        #[test]
        fn test_decimal_round_trip(d in canonical_decimal()) {
            let units = decimal_to_base_units(&d, 18).unwrap();
            prop_assert_eq!(base_units_to_decimal(units, 18), d);
        }

        #[test]
        fn test_base_units_round_trip(raw in any::<[u64; 4]>(), decimals in 0u8..=30) {
            let value = U256::from_limbs(raw);
            let text = base_units_to_decimal(value, decimals);
            prop_assert_eq!(decimal_to_base_units(&text, decimals).unwrap(), value);
        }
    }
}
