//! Serde adapters that keep wide integers exact on the wire.
//!
//! JSON consumers commonly parse numbers into doubles, so anything that can
//! exceed [`MAX_SAFE_INTEGER`] is written as a string here, at serialisation
//! time, instead of trusting each call site.

use super::MAX_SAFE_INTEGER;

/// `U256` as a base-10 string. Deserialises from base-10 or `0x` hex strings.
pub mod u256_string {
    use alloy::primitives::U256;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let text = String::deserialize(deserializer)?;
        let parsed = match text.strip_prefix("0x") {
            Some(hex) => U256::from_str_radix(hex, 16),
            None => U256::from_str_radix(&text, 10),
        };
        parsed.map_err(|e| D::Error::custom(format!("invalid integer '{}': {}", text, e)))
    }
}

/// `u64` as a JSON number while it is exactly representable, otherwise a string.
pub mod safe_u64 {
    use super::MAX_SAFE_INTEGER;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        if *value <= MAX_SAFE_INTEGER {
            serializer.serialize_u64(*value)
        } else {
            serializer.collect_str(value)
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(u64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        match NumberOrString::deserialize(deserializer)? {
            NumberOrString::Number(n) => Ok(n),
            NumberOrString::Text(s) => s
                .parse()
                .map_err(|e| D::Error::custom(format!("invalid integer '{}': {}", s, e))),
        }
    }
}

/// [`safe_u64`] for optional fields.
pub mod option_safe_u64 {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => super::safe_u64::serialize(v, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
        #[derive(Deserialize)]
        struct Wrapped(#[serde(with = "super::safe_u64")] u64);

        Ok(Option::<Wrapped>::deserialize(deserializer)?.map(|Wrapped(v)| v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::U256;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        #[serde(with = "u256_string")]
        amount: U256,
        #[serde(with = "safe_u64")]
        block: u64,
        #[serde(with = "option_safe_u64", default)]
        timestamp: Option<u64>,
    }

    #[test]
    fn test_wide_values_serialize_as_strings() {
        let sample = Sample {
            amount: U256::from(u128::MAX),
            block: MAX_SAFE_INTEGER + 2,
            timestamp: Some(1_700_000_000),
        };
        let json = serde_json::to_value(&sample).unwrap();
        assert_eq!(json["amount"], "340282366920938463463374607431768211455");
        assert_eq!(json["block"], "9007199254740993");
        assert_eq!(json["timestamp"], 1_700_000_000u64);

        let back: Sample = serde_json::from_value(json).unwrap();
        assert_eq!(back, sample);
    }

    #[test]
    fn test_hex_amount_accepted() {
        let back: Sample =
            serde_json::from_str(r#"{"amount":"0xde0b6b3a7640000","block":1}"#).unwrap();
        assert_eq!(back.amount, U256::from(1_000_000_000_000_000_000u64));
        assert_eq!(back.timestamp, None);
    }

    #[test]
    fn test_numeric_amount_rejected() {
        let result: Result<Sample, _> = serde_json::from_str(r#"{"amount":1,"block":1}"#);
        assert!(result.is_err());
    }
}
