//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different entity types. Orders additionally
//! carry a public [`OrderNumber`] that customers see and poll with.

use core::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `i32` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `Ord`
/// - Conversion methods: `new()`, `as_i32()`
/// - `From<i32>`, `Into<i32>` and `FromStr` implementations
/// - `sqlx` `Type`, `Encode`, and `Decode` implementations (with `postgres` feature)
///
/// # Example
///
/// ```rust
/// # use keystall_core::define_id;
/// define_id!(WidgetId);
/// define_id!(GadgetId);
///
/// let widget = WidgetId::new(1);
/// let gadget = GadgetId::new(1);
///
/// // These are different types, so this won't compile:
/// // let _: WidgetId = gadget;
/// # let _ = (widget, gadget);
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
        pub struct $name(i32);

        impl $name {
            /// Create a new ID from an i32 value.
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            /// Get the underlying i32 value.
            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::core::num::ParseIntError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                s.trim().parse::<i32>().map(Self)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <i32 as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <i32 as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
                let id = <i32 as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
                Ok(Self(id))
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <i32 as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

define_id!(ProfileId);
define_id!(ProductId);
define_id!(VariantId);
define_id!(StockKeyId);
define_id!(OrderId);
define_id!(BannerId);
define_id!(MembershipId);
define_id!(PremiumContentId);

/// Alphabet for order number suffixes (no 0/O, 1/I/L).
pub const ORDER_NUMBER_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

/// Length of the random part of an order number.
pub const ORDER_NUMBER_SUFFIX_LEN: usize = 6;

/// Error parsing an [`OrderNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid order number: {0}")]
pub struct OrderNumberError(String);

/// Public order reference, e.g. `KS-260114-7XK2QP`.
///
/// The numeric [`OrderId`] never leaves the back-office; customers poll their
/// order with this value, so it has to be unguessable enough that nobody can
/// enumerate other customers' orders.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrderNumber(String);

impl OrderNumber {
    const PREFIX: &'static str = "KS";

    /// Build an order number from its creation date and a random suffix.
    ///
    /// # Errors
    ///
    /// Returns an error if the suffix has the wrong length or contains
    /// characters outside [`ORDER_NUMBER_ALPHABET`].
    pub fn new(date: NaiveDate, suffix: &str) -> Result<Self, OrderNumberError> {
        let candidate = format!("{}-{}-{suffix}", Self::PREFIX, date.format("%y%m%d"));
        Self::parse(&candidate)
    }

    /// Parse and validate an order number.
    ///
    /// Lowercase input is accepted and normalized.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not `KS-YYMMDD-XXXXXX`.
    pub fn parse(s: &str) -> Result<Self, OrderNumberError> {
        let normalized = s.trim().to_ascii_uppercase();
        let mut parts = normalized.split('-');

        let (Some(prefix), Some(date), Some(suffix), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(OrderNumberError(s.to_owned()));
        };

        let valid = prefix == Self::PREFIX
            && date.len() == 6
            && date.bytes().all(|b| b.is_ascii_digit())
            && suffix.len() == ORDER_NUMBER_SUFFIX_LEN
            && suffix.bytes().all(|b| ORDER_NUMBER_ALPHABET.contains(&b));

        if valid {
            Ok(Self(normalized))
        } else {
            Err(OrderNumberError(s.to_owned()))
        }
    }

    /// Returns the order number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for OrderNumber {
    type Error = OrderNumberError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<OrderNumber> for String {
    fn from(value: OrderNumber) -> Self {
        value.0
    }
}

impl std::str::FromStr for OrderNumber {
    type Err = OrderNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for OrderNumber {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for OrderNumber {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::parse(&s)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for OrderNumber {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 14).unwrap()
    }

    #[test]
    fn test_id_from_str_trims() {
        let id: ProductId = " 42 ".parse().unwrap();
        assert_eq!(id.as_i32(), 42);
        assert!("abc".parse::<ProductId>().is_err());
    }

    #[test]
    fn test_order_number_new() {
        let number = OrderNumber::new(date(), "7XK2QP").unwrap();
        assert_eq!(number.as_str(), "KS-260114-7XK2QP");
    }

    #[test]
    fn test_order_number_rejects_ambiguous_characters() {
        // 0, O, 1, I and L are excluded from the alphabet
        assert!(OrderNumber::new(date(), "7XK2Q0").is_err());
        assert!(OrderNumber::new(date(), "IIIIII").is_err());
    }

    #[test]
    fn test_order_number_rejects_bad_shapes() {
        assert!(OrderNumber::parse("").is_err());
        assert!(OrderNumber::parse("KS-260114").is_err());
        assert!(OrderNumber::parse("XX-260114-7XK2QP").is_err());
        assert!(OrderNumber::parse("KS-26011-7XK2QP").is_err());
        assert!(OrderNumber::parse("KS-260114-7XK2QP-9").is_err());
    }

    #[test]
    fn test_order_number_normalizes_case() {
        let number = OrderNumber::parse("ks-260114-7xk2qp").unwrap();
        assert_eq!(number.to_string(), "KS-260114-7XK2QP");
    }

    #[test]
    fn test_order_number_serde_validates() {
        let json = "\"KS-260114-7XK2QP\"";
        let parsed: OrderNumber = serde_json::from_str(json).unwrap();
        assert_eq!(serde_json::to_string(&parsed).unwrap(), json);
        assert!(serde_json::from_str::<OrderNumber>("\"nope\"").is_err());
    }
}
