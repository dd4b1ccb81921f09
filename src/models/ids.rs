//! Strongly-typed ID wrappers for all entity types
//!
//! IDs are allocated by the store as increasing integers. Using newtype
//! wrappers prevents accidentally mixing up order and line item IDs at
//! compile time.

use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Macro to generate ID newtype wrappers
macro_rules! define_id {
    ($name:ident, $display_prefix:literal) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Wrap a raw store-allocated value
            pub const fn from_raw(raw: u64) -> Self {
                Self(raw)
            }

            /// Get the raw value
            pub const fn get(&self) -> u64 {
                self.0
            }

            /// Parse an ID from a string
            pub fn parse(s: &str) -> Result<Self, std::num::ParseIntError> {
                s.parse()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $display_prefix, self.0)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                let s = s.strip_prefix($display_prefix).unwrap_or(s);
                Ok(Self(s.parse()?))
            }
        }
    };
}

define_id!(OrderId, "ord-");
define_id!(LineItemId, "item-");

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(u64),
    Text(String),
}

/// Deserialize an optional ID that may arrive as a number, a numeric string,
/// an empty string or null. Empty strings and null both mean "no ID".
pub fn deserialize_optional_id<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + From<u64>,
    T::Err: fmt::Display,
{
    match Option::<RawId>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawId::Number(raw)) => Ok(Some(T::from(raw))),
        Some(RawId::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(RawId::Text(text)) => text.parse().map(Some).map_err(de::Error::custom),
    }
}
