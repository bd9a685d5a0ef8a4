//! Checkout route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crumb_core::{Email, OrderId};

use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::models::{Cart, Flash, FlashLevel, session_keys};
use crate::services::checkout::{CheckoutDetails, CheckoutError, CheckoutService};
use crate::state::AppState;

use super::cart::{CartView, load_cart_view};
use super::page::{StorePage, non_blank};

/// Longest accepted name.
const MAX_NAME_LEN: usize = 100;

/// Checkout form data.
#[derive(Debug, Default, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl CheckoutForm {
    /// Validate the form into checkout details, or a list of problems.
    fn validate(&self) -> Result<CheckoutDetails, Vec<String>> {
        let mut errors = Vec::new();

        let name = self.name.trim();
        if name.is_empty() {
            errors.push("Please enter your name.".to_string());
        } else if name.chars().count() > MAX_NAME_LEN {
            errors.push(format!("Name must be at most {MAX_NAME_LEN} characters."));
        }

        let email = Email::parse(&self.email);
        if email.is_err() {
            errors.push("Please enter a valid email address.".to_string());
        }

        match email {
            Ok(email) if errors.is_empty() => Ok(CheckoutDetails {
                name: name.to_owned(),
                email,
                phone: non_blank(self.phone.clone()),
                address: non_blank(self.address.clone()),
            }),
            _ => Err(errors),
        }
    }
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout.html")]
pub struct CheckoutTemplate {
    pub page: StorePage,
    pub cart: CartView,
    pub form: CheckoutForm,
    pub errors: Vec<String>,
    pub payment_public_key: String,
}

/// Display the checkout form. An empty cart goes back to the cart page.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Response {
    let cart = load_cart_view(&state, &session).await;
    if cart.is_empty() {
        Flash::push(&session, FlashLevel::Info, "Your cart is empty.").await;
        return Redirect::to("/cart").into_response();
    }

    CheckoutTemplate {
        page: StorePage::load(&session).await,
        cart,
        form: CheckoutForm::default(),
        errors: Vec::new(),
        payment_public_key: state.payments().public_key().to_owned(),
    }
    .into_response()
}

/// Place the order.
///
/// The cart is cleared only once the order has been committed.
#[instrument(skip(state, session, form))]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CheckoutForm>,
) -> Result<Response, AppError> {
    let cart = Cart::load(&session).await;
    if cart.is_empty() {
        Flash::push(&session, FlashLevel::Info, "Your cart is empty.").await;
        return Ok(Redirect::to("/cart").into_response());
    }

    let details = match form.validate() {
        Ok(details) => details,
        Err(errors) => {
            return Ok(CheckoutTemplate {
                page: StorePage::load(&session).await,
                cart: load_cart_view(&state, &session).await,
                form,
                errors,
                payment_public_key: state.payments().public_key().to_owned(),
            }
            .into_response());
        }
    };

    let placed = match CheckoutService::new(state.pool(), state.payments())
        .place_order(&cart, &details)
        .await
    {
        Ok(placed) => placed,
        Err(CheckoutError::EmptyCart) => return Ok(Redirect::to("/cart").into_response()),
        Err(CheckoutError::UnknownProduct(id)) => {
            let mut cart = cart;
            cart.remove(id);
            cart.save(&session).await?;
            Flash::push(
                &session,
                FlashLevel::Warning,
                "An item in your cart is no longer available and was removed. Please review your cart.",
            )
            .await;
            return Ok(Redirect::to("/cart").into_response());
        }
        Err(e) => {
            tracing::error!("Checkout failed: {e}");
            Flash::push(
                &session,
                FlashLevel::Error,
                "We couldn't place your order. You have not been charged; please try again.",
            )
            .await;
            return Ok(Redirect::to("/checkout").into_response());
        }
    };

    Cart::clear(&session).await?;
    remember_order(&session, placed.order_id).await?;

    let order_id = placed.order_id.to_string();
    add_breadcrumb("checkout", "Order placed", Some(&[("order_id", order_id.as_str())]));
    Flash::push(
        &session,
        FlashLevel::Success,
        "Thank you! Your order has been placed.",
    )
    .await;

    Ok(Redirect::to(&format!("/order/{}", placed.order_id)).into_response())
}

/// Record an order as viewable from this session.
async fn remember_order(
    session: &Session,
    order_id: OrderId,
) -> Result<(), tower_sessions::session::Error> {
    let mut placed = placed_orders(session).await;
    placed.push(order_id);
    session.insert(session_keys::PLACED_ORDERS, placed).await
}

/// Orders placed from this session.
pub async fn placed_orders(session: &Session) -> Vec<OrderId> {
    session
        .get::<Vec<OrderId>>(session_keys::PLACED_ORDERS)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_trims_and_drops_blanks() {
        let form = CheckoutForm {
            name: "  Ada Lovelace ".to_string(),
            email: "ada@crumb.test".to_string(),
            phone: Some(String::new()),
            address: Some("1 Yarn Lane".to_string()),
        };
        let details = form.validate().unwrap_or_else(|e| panic!("{e:?}"));
        assert_eq!(details.name, "Ada Lovelace");
        assert_eq!(details.phone, None);
        assert_eq!(details.address.as_deref(), Some("1 Yarn Lane"));
    }

    #[test]
    fn test_validate_collects_errors() {
        let form = CheckoutForm {
            email: "not-an-email".to_string(),
            ..CheckoutForm::default()
        };
        let errors = form.validate().err().unwrap_or_default();
        assert_eq!(errors.len(), 2);
    }
}
