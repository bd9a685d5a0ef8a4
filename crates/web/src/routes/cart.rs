//! Cart route handlers.
//!
//! The cart lives in the session as product ids and quantities. Every view
//! prices it from the current catalog.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crumb_core::ProductId;

use crate::db::ProductRepository;
use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::models::{Cart, CartError, Flash, FlashLevel};
use crate::state::AppState;

use super::page::StorePage;

/// Cart item display data for templates.
#[derive(Debug, Clone)]
pub struct CartItemView {
    pub product_id: ProductId,
    pub name: String,
    pub image_url: Option<String>,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub line_total: Decimal,
}

/// Cart display data for templates.
#[derive(Debug, Clone, Default)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: Decimal,
    pub item_count: u32,
}

impl CartView {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Price the session cart from the catalog.
///
/// Lines whose product has been deleted are dropped from the cart.
pub async fn load_cart_view(state: &AppState, session: &Session) -> CartView {
    let mut cart = Cart::load(session).await;
    if cart.is_empty() {
        return CartView::default();
    }

    let products = match ProductRepository::new(state.pool())
        .get_many(&cart.product_ids())
        .await
    {
        Ok(products) => products,
        Err(e) => {
            tracing::error!("Failed to price cart: {e}");
            return CartView::default();
        }
    };

    let mut view = CartView::default();
    let mut stale = Vec::new();
    for line in cart.lines() {
        let Some(product) = products.iter().find(|p| p.id == line.product_id) else {
            stale.push(line.product_id);
            continue;
        };
        let line_total = product.price * Decimal::from(line.quantity);
        view.subtotal += line_total;
        view.item_count += line.quantity;
        view.items.push(CartItemView {
            product_id: product.id,
            name: product.name.clone(),
            image_url: product.image_url.clone(),
            unit_price: product.price,
            quantity: line.quantity,
            line_total,
        });
    }

    if !stale.is_empty() {
        for id in stale {
            cart.remove(id);
        }
        if let Err(e) = cart.save(session).await {
            tracing::warn!("Failed to drop stale cart lines: {e}");
        }
        Flash::push(
            session,
            FlashLevel::Info,
            "Some items are no longer available and were removed from your cart.",
        )
        .await;
    }

    view
}

/// Quantity form data.
#[derive(Debug, Deserialize)]
pub struct QuantityForm {
    pub quantity: Option<u32>,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub page: StorePage,
    pub cart: CartView,
}

fn cart_error_message(err: &CartError) -> String {
    match err {
        CartError::ZeroQuantity => "Please choose a quantity of at least 1.".to_string(),
        CartError::TooMany => format!("Sorry, {err}."),
    }
}

/// Display cart page.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    let cart = load_cart_view(&state, &session).await;
    CartShowTemplate {
        page: StorePage::load(&session).await,
        cart,
    }
}

/// Add a product to the cart.
///
/// Adding a product already in the cart increases that line's quantity.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ProductId>,
    Form(form): Form<QuantityForm>,
) -> Result<Response, AppError> {
    let product = match ProductRepository::new(state.pool()).get_by_id(id).await {
        Ok(Some(product)) => product,
        Ok(None) => {
            Flash::push(&session, FlashLevel::Error, "Product not found.").await;
            return Ok(Redirect::to("/products").into_response());
        }
        Err(e) => {
            tracing::error!("Failed to load product {id}: {e}");
            Flash::push(
                &session,
                FlashLevel::Error,
                "We couldn't add that item right now. Please try again.",
            )
            .await;
            return Ok(Redirect::to("/products").into_response());
        }
    };

    let quantity = form.quantity.unwrap_or(1);
    let mut cart = Cart::load(&session).await;
    if let Err(e) = cart.add(id, quantity) {
        Flash::push(&session, FlashLevel::Error, cart_error_message(&e)).await;
        return Ok(Redirect::to(&format!("/products/{id}")).into_response());
    }
    cart.save(&session).await?;

    let product_id = id.to_string();
    add_breadcrumb("cart", "Added to cart", Some(&[("product_id", product_id.as_str())]));
    Flash::push(
        &session,
        FlashLevel::Success,
        format!("Added {} to your cart.", product.name),
    )
    .await;
    Ok(Redirect::to("/cart").into_response())
}

/// Set a line's quantity; zero removes it.
#[instrument(skip(session))]
pub async fn update(
    session: Session,
    Path(id): Path<ProductId>,
    Form(form): Form<QuantityForm>,
) -> Result<Redirect, AppError> {
    let mut cart = Cart::load(&session).await;
    match cart.set_quantity(id, form.quantity.unwrap_or(0)) {
        Ok(true) => {
            cart.save(&session).await?;
            Flash::push(&session, FlashLevel::Success, "Cart updated.").await;
        }
        Ok(false) => {
            Flash::push(&session, FlashLevel::Warning, "That item is not in your cart.").await;
        }
        Err(e) => Flash::push(&session, FlashLevel::Error, cart_error_message(&e)).await,
    }
    Ok(Redirect::to("/cart"))
}

/// Remove a line from the cart.
#[instrument(skip(session))]
pub async fn remove(session: Session, Path(id): Path<ProductId>) -> Result<Redirect, AppError> {
    let mut cart = Cart::load(&session).await;
    if cart.remove(id) {
        cart.save(&session).await?;
        Flash::push(&session, FlashLevel::Success, "Item removed from your cart.").await;
    }
    Ok(Redirect::to("/cart"))
}
