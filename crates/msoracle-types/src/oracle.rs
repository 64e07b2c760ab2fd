//! Oracle instance, sample and submission structures.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Address, Rate};

/// Identifier of a registry instance within a directory.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OracleId(pub u64);

impl fmt::Display for OracleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "oracle#{}", self.0)
    }
}

impl fmt::Debug for OracleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OracleId({})", self.0)
    }
}

/// The aggregate read from an oracle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    /// Number of providers with a submitted value.
    pub count: usize,
    /// Median of the active values, or the truncated average of the two
    /// middle values when `count` is even.
    #[serde(with = "rate_serde")]
    pub aggregate: Rate,
}

/// Human-readable metadata of an oracle instance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleMetadata {
    /// Unique ticker, at most 32 bytes. Immutable after creation.
    pub symbol: String,
    /// Unique display name.
    pub name: String,
    /// Decimal precision of the provided rates.
    pub decimals: u8,
    /// The unit the rates are denominated in.
    pub token: Address,
    pub maintainer: String,
}

/// One entry of a batch submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvideRequest {
    pub oracle: OracleId,
    #[serde(with = "rate_serde")]
    pub value: Rate,
}

/// An added provider as seen by read queries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub address: Address,
    pub name: String,
    /// `None` until the provider submits its first value.
    #[serde(with = "opt_rate_serde", default)]
    pub value: Option<Rate>,
}

/// Serde adapter for [`Rate`]: written as a decimal string, read from a
/// decimal string or a JSON integer.
pub mod rate_serde {
    use std::fmt;

    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};

    use crate::Rate;

    pub fn serialize<S: Serializer>(value: &Rate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Rate, D::Error> {
        deserializer.deserialize_any(RateVisitor)
    }

    struct RateVisitor;

    impl<'de> Visitor<'de> for RateVisitor {
        type Value = Rate;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an unsigned integer or a decimal string")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Rate, E> {
            Ok(Rate::from(v))
        }

        fn visit_u128<E: de::Error>(self, v: u128) -> Result<Rate, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Rate, E> {
            Rate::try_from(v).map_err(|_| E::custom(format!("negative rate: {v}")))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Rate, E> {
            v.trim()
                .parse::<Rate>()
                .map_err(|e| E::custom(format!("invalid rate {v:?}: {e}")))
        }
    }
}

/// [`rate_serde`] for optional rates; `null` maps to `None`.
pub mod opt_rate_serde {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::Rate;

    pub fn serialize<S: Serializer>(value: &Option<Rate>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.collect_str(v),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Rate>, D::Error> {
        #[derive(Deserialize)]
        struct Wrapped(#[serde(with = "super::rate_serde")] Rate);

        Ok(Option::<Wrapped>::deserialize(deserializer)?.map(|Wrapped(v)| v))
    }
}
