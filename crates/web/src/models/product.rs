//! Product model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crumb_core::{Category, Lenient, ProductId, format_money};

/// A catalog product.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub category: Option<Lenient<Category>>,
    pub image_url: Option<String>,
    /// Informational only; checkout does not decrement it.
    pub stock_quantity: i32,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Price formatted for display.
    #[must_use]
    pub fn display_price(&self) -> String {
        format_money(self.price)
    }

    /// Category label, or the stored text for unrecognized values.
    #[must_use]
    pub fn category_label(&self) -> String {
        match &self.category {
            Some(Lenient::Known(category)) => category.label().to_string(),
            Some(Lenient::Unrecognized(raw)) => raw.clone(),
            None => String::new(),
        }
    }
}

/// Fields for inserting a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub category: Option<Category>,
    pub image_url: Option<String>,
    pub stock_quantity: i32,
}

/// Partial update for a product.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub category: Option<Category>,
    pub image_url: Option<String>,
    pub stock_quantity: Option<i32>,
}

impl ProductPatch {
    /// Returns `true` if no field would change.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.category.is_none()
            && self.image_url.is_none()
            && self.stock_quantity.is_none()
    }
}
