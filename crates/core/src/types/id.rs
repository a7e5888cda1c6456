//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different entity types.

/// Error returned when a string cannot be parsed into a typed ID.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid id: {0:?}")]
pub struct ParseIdError(pub String);

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `i64` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `Ord`
/// - Conversion methods: `new()`, `as_i64()`, `coerce()`
/// - `From<i64>`, `Into<i64>` and `FromStr` implementations
///
/// # Example
///
/// ```rust
/// # use aurum_core::define_id;
/// define_id!(RingId);
/// define_id!(ChainId);
///
/// let ring = RingId::new(1);
/// let chain = ChainId::new(1);
///
/// // These are different types, so this won't compile:
/// // let _: RingId = chain;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Create a new ID from an i64 value.
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Get the underlying i64 value.
            #[must_use]
            pub const fn as_i64(&self) -> i64 {
                self.0
            }

            /// Coerce a loosely-typed JSON value into an ID.
            ///
            /// Accepts integers and strings holding an integer (surrounding
            /// whitespace is ignored). Anything else yields `None`.
            #[must_use]
            pub fn coerce(value: &::serde_json::Value) -> Option<Self> {
                match value {
                    ::serde_json::Value::Number(n) => n.as_i64().map(Self),
                    ::serde_json::Value::String(s) => s.trim().parse::<i64>().ok().map(Self),
                    _ => None,
                }
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::types::id::ParseIdError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                s.trim()
                    .parse::<i64>()
                    .map(Self)
                    .map_err(|_| $crate::types::id::ParseIdError(s.to_owned()))
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

// Define standard entity IDs
define_id!(UserId);
define_id!(ProductId);
define_id!(OrderId);
define_id!(AddressId);
