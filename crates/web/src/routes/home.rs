//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tower_sessions::Session;
use tracing::instrument;

use crate::content::{self, GalleryItem};
use crate::db::{Page, ProductRepository};
use crate::filters;
use crate::models::Product;
use crate::state::AppState;

use super::page::StorePage;

/// Number of products featured on the home page.
const FEATURED_COUNT: i64 = 6;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub page: StorePage,
    pub gallery: &'static [GalleryItem],
    pub featured: Vec<Product>,
}

/// Display the home page.
///
/// In mock mode the fixture gallery replaces the catalog query.
#[instrument(skip(state, session))]
pub async fn home(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    let mock_mode = state.config().mock_mode;

    let featured = if mock_mode {
        Vec::new()
    } else {
        ProductRepository::new(state.pool())
            .list(None, Page::first(FEATURED_COUNT))
            .await
            .unwrap_or_else(|e| {
                tracing::error!("Failed to load featured products: {e}");
                Vec::new()
            })
    };

    HomeTemplate {
        page: StorePage::load(&session).await,
        gallery: content::gallery(mock_mode),
        featured,
    }
}
