//! Order confirmation route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use crumb_core::OrderId;

use crate::db::{OrderItemRepository, OrderRepository};
use crate::filters;
use crate::models::{Flash, FlashLevel, OrderItemDetail, OrderSummary};
use crate::state::AppState;

use super::checkout::placed_orders;
use super::page::StorePage;

/// Order confirmation page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/confirmation.html")]
pub struct ConfirmationTemplate {
    pub page: StorePage,
    pub order: OrderSummary,
    pub items: Vec<OrderItemDetail>,
}

/// Display an order placed from this session.
#[instrument(skip(state, session))]
pub async fn confirmation(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<OrderId>,
) -> Response {
    if !placed_orders(&session).await.contains(&id) {
        Flash::push(&session, FlashLevel::Error, "Order not found.").await;
        return Redirect::to("/").into_response();
    }

    let order = OrderRepository::new(state.pool()).get_by_id(id).await;
    let items = OrderItemRepository::new(state.pool()).list_for_order(id).await;

    match (order, items) {
        (Ok(Some(order)), Ok(items)) => ConfirmationTemplate {
            page: StorePage::load(&session).await,
            order,
            items,
        }
        .into_response(),
        (Ok(None), _) => {
            Flash::push(&session, FlashLevel::Error, "Order not found.").await;
            Redirect::to("/").into_response()
        }
        (Err(e), _) | (_, Err(e)) => {
            tracing::error!("Failed to load order {id}: {e}");
            Flash::push(
                &session,
                FlashLevel::Error,
                "We couldn't load your order right now. It has been placed.",
            )
            .await;
            Redirect::to("/").into_response()
        }
    }
}
