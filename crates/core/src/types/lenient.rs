//! Tolerant decoding for closed text enums.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// A value read from a text column that is expected to be one of `T`'s
/// variants but may hold something else.
///
/// Writes always use `T` directly; `Lenient` only appears on rows read back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Lenient<T> {
    /// A recognized value.
    Known(T),
    /// Stored text that no variant matches.
    Unrecognized(String),
}

impl<T: FromStr> Lenient<T> {
    /// Classify raw stored text.
    #[must_use]
    pub fn from_text(s: &str) -> Self {
        s.parse()
            .map_or_else(|_| Self::Unrecognized(s.to_owned()), Self::Known)
    }
}

impl<T: Copy> Lenient<T> {
    /// The recognized value, if any.
    #[must_use]
    pub const fn known(&self) -> Option<T> {
        match self {
            Self::Known(value) => Some(*value),
            Self::Unrecognized(_) => None,
        }
    }
}

impl<T> Lenient<T> {
    /// Returns `true` if the stored text matched a variant.
    #[must_use]
    pub const fn is_known(&self) -> bool {
        matches!(self, Self::Known(_))
    }
}

impl<T> From<T> for Lenient<T> {
    fn from(value: T) -> Self {
        Self::Known(value)
    }
}

impl<T: fmt::Display> fmt::Display for Lenient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(value) => value.fmt(f),
            Self::Unrecognized(raw) => f.write_str(raw),
        }
    }
}

#[cfg(feature = "postgres")]
impl<T> sqlx::Type<sqlx::Postgres> for Lenient<T> {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r, T: FromStr> sqlx::Decode<'r, sqlx::Postgres> for Lenient<T> {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let raw = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::from_text(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Category, OrderStatus};

    #[test]
    fn test_known_value() {
        let status = Lenient::<OrderStatus>::from_text("shipped");
        assert_eq!(status, Lenient::Known(OrderStatus::Shipped));
        assert_eq!(status.known(), Some(OrderStatus::Shipped));
        assert_eq!(status.to_string(), "shipped");
    }

    #[test]
    fn test_legacy_value_is_kept_verbatim() {
        let category = Lenient::<Category>::from_text("Amigurumi");
        assert!(!category.is_known());
        assert_eq!(category.known(), None);
        assert_eq!(category.to_string(), "Amigurumi");
    }
}
