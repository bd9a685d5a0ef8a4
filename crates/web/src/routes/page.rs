//! Per-page data shared by every template.

use tower_sessions::Session;

use crate::content::{self, SiteConfig};
use crate::models::{Cart, CurrentAdmin, Flash};

/// Storefront chrome: site identity, pending notices and the cart badge.
#[derive(Debug, Clone)]
pub struct StorePage {
    pub site: SiteConfig,
    pub flashes: Vec<Flash>,
    pub cart_count: u32,
}

impl StorePage {
    /// Consume pending flashes and read the cart size.
    pub async fn load(session: &Session) -> Self {
        let cart = Cart::load(session).await;
        Self {
            site: content::SITE,
            flashes: Flash::take(session).await,
            cart_count: cart.item_count(),
        }
    }
}

/// Back office chrome: who is logged in, pending notices and the active nav item.
#[derive(Debug, Clone)]
pub struct AdminPage {
    pub admin: CurrentAdmin,
    pub flashes: Vec<Flash>,
    pub current_path: &'static str,
}

impl AdminPage {
    /// Consume pending flashes for an admin page.
    pub async fn load(session: &Session, admin: CurrentAdmin, current_path: &'static str) -> Self {
        Self {
            admin,
            flashes: Flash::take(session).await,
            current_path,
        }
    }

    /// Whether `path` is the active nav section.
    #[must_use]
    pub fn is_active(&self, path: &str) -> bool {
        self.current_path == path
    }
}

/// An option in a `<select>`.
#[derive(Debug, Clone)]
pub struct SelectOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

impl SelectOption {
    /// Build options from `(value, label)` pairs, marking `current` as selected.
    pub fn list(
        values: impl IntoIterator<Item = (&'static str, &'static str)>,
        current: Option<&str>,
    ) -> Vec<Self> {
        values
            .into_iter()
            .map(|(value, label)| Self {
                value,
                label,
                selected: current == Some(value),
            })
            .collect()
    }
}

/// Treat blank form input as absent.
#[must_use]
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}
