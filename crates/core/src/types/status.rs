//! Closed value sets for products, orders, and inquiries.
//!
//! All three are stored as plain text columns. Writes go through these enums
//! so only known values reach the database; reads wrap them in
//! [`Lenient`](crate::Lenient) so rows written by older tooling still load.

use serde::{Deserialize, Serialize};

/// Error returned when a string is not one of an enum's known values.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value}")]
pub struct ParseValueError {
    /// Which value set was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

/// Implements `as_str`, `Display`, `FromStr` and text encoding for a
/// unit-only enum with snake_case wire names.
macro_rules! text_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal, $label:literal),+ $(,)? }) => {
        impl $name {
            /// Every value, in display order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The stored (snake_case) representation.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }

            /// Human-readable label for templates.
            #[must_use]
            pub const fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ParseValueError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($text => Ok(Self::$variant),)+
                    other => Err(ParseValueError {
                        kind: $kind,
                        value: other.to_owned(),
                    }),
                }
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <String as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <String as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <&str as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
            }
        }
    };
}

/// Product category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Plushies,
    Wearables,
    HomeDecor,
    Custom,
}

text_enum!(Category, "category", {
    Plushies => "plushies", "Plushies",
    Wearables => "wearables", "Wearables",
    HomeDecor => "home_decor", "Home Decor",
    Custom => "custom", "Custom",
});

/// Order lifecycle status.
///
/// Transitions are unrestricted: the back office may move an order from any
/// status to any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Paid,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

text_enum!(OrderStatus, "order status", {
    Pending => "pending", "Pending",
    Paid => "paid", "Paid",
    Processing => "processing", "Processing",
    Shipped => "shipped", "Shipped",
    Delivered => "delivered", "Delivered",
    Cancelled => "cancelled", "Cancelled",
});

/// Contact inquiry status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InquiryStatus {
    #[default]
    New,
    Responded,
    Closed,
}

text_enum!(InquiryStatus, "inquiry status", {
    New => "new", "New",
    Responded => "responded", "Responded",
    Closed => "closed", "Closed",
});

impl InquiryStatus {
    /// Whether moving into this status records the response time.
    #[must_use]
    pub const fn stamps_response(self) -> bool {
        matches!(self, Self::Responded | Self::Closed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trip_through_text() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), *category);
        }
        assert_eq!(Category::HomeDecor.to_string(), "home_decor");
        assert_eq!(Category::HomeDecor.label(), "Home Decor");
    }

    #[test]
    fn test_unknown_values_are_rejected() {
        let err = "amigurumi".parse::<Category>().unwrap_err();
        assert_eq!(err.kind, "category");
        assert_eq!(err.value, "amigurumi");
        assert!("refunded".parse::<OrderStatus>().is_err());
        assert!("NEW".parse::<InquiryStatus>().is_err());
    }

    #[test]
    fn test_order_status_defaults_to_pending() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
        assert_eq!(OrderStatus::ALL.len(), 6);
    }

    #[test]
    fn test_inquiry_status_stamps_response() {
        assert!(!InquiryStatus::New.stamps_response());
        assert!(InquiryStatus::Responded.stamps_response());
        assert!(InquiryStatus::Closed.stamps_response());
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&Category::HomeDecor).unwrap();
        assert_eq!(json, "\"home_decor\"");
    }
}
