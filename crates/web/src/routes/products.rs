//! Catalog route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crumb_core::{Category, ProductId};

use crate::db::{Page, ProductRepository};
use crate::filters;
use crate::models::{Flash, FlashLevel, Product};
use crate::state::AppState;

use super::page::{SelectOption, StorePage, non_blank};

/// Catalog query parameters.
#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    pub category: Option<String>,
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub page: StorePage,
    pub products: Vec<Product>,
    pub categories: Vec<SelectOption>,
    pub category: Option<Category>,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub page: StorePage,
    pub product: Product,
}

/// Category filter options for the catalog nav.
pub fn category_options(current: Option<Category>) -> Vec<SelectOption> {
    SelectOption::list(
        Category::ALL.iter().map(|c| (c.as_str(), c.label())),
        current.map(Category::as_str),
    )
}

/// Parse an optional category filter, flashing a notice for unknown values.
pub async fn parse_category(session: &Session, raw: Option<String>) -> Option<Category> {
    let raw = non_blank(raw)?;
    match raw.parse::<Category>() {
        Ok(category) => Some(category),
        Err(e) => {
            tracing::debug!("Ignoring category filter: {e}");
            Flash::push(
                session,
                FlashLevel::Warning,
                format!("Unknown category \"{raw}\"; showing everything."),
            )
            .await;
            None
        }
    }
}

/// Display the product listing.
#[instrument(skip(state, session))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CatalogQuery>,
) -> impl IntoResponse {
    let category = parse_category(&session, query.category).await;

    let products = ProductRepository::new(state.pool())
        .list(category, Page::default())
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to list products: {e}");
            Vec::new()
        });

    ProductsIndexTemplate {
        page: StorePage::load(&session).await,
        products,
        categories: category_options(category),
        category,
    }
}

/// Display a product.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ProductId>,
) -> Response {
    match ProductRepository::new(state.pool()).get_by_id(id).await {
        Ok(Some(product)) => ProductShowTemplate {
            page: StorePage::load(&session).await,
            product,
        }
        .into_response(),
        Ok(None) => {
            Flash::push(&session, FlashLevel::Error, "Product not found.").await;
            Redirect::to("/products").into_response()
        }
        Err(e) => {
            tracing::error!("Failed to load product {id}: {e}");
            Flash::push(
                &session,
                FlashLevel::Error,
                "We couldn't load that product right now.",
            )
            .await;
            Redirect::to("/products").into_response()
        }
    }
}
