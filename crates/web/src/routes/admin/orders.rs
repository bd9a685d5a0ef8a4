//! Order management handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crumb_core::{OrderId, OrderStatus};

use crate::db::{OrderItemRepository, OrderRepository, Page, RepositoryError};
use crate::error::add_breadcrumb;
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::models::{Flash, FlashLevel, OrderItemDetail, OrderSummary};
use crate::routes::page::{AdminPage, SelectOption, non_blank};
use crate::services::payments::PaymentGateway;
use crate::state::AppState;

use super::PER_PAGE;

const NAV_PATH: &str = "/admin/orders";

/// Order list query parameters.
#[derive(Debug, Deserialize)]
pub struct OrdersQuery {
    pub status: Option<String>,
    pub page: Option<u32>,
}

/// Status change form.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    #[serde(default)]
    pub status: String,
}

/// Order list template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/orders/index.html")]
pub struct OrdersIndexTemplate {
    pub page: AdminPage,
    pub orders: Vec<OrderSummary>,
    pub statuses: Vec<SelectOption>,
    pub status: Option<OrderStatus>,
    pub page_number: u32,
    pub has_next: bool,
}

/// Order detail template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/orders/show.html")]
pub struct OrderShowTemplate {
    pub page: AdminPage,
    pub order: OrderSummary,
    pub items: Vec<OrderItemDetail>,
    pub statuses: Vec<SelectOption>,
    pub refundable: bool,
}

fn status_options(current: Option<OrderStatus>) -> Vec<SelectOption> {
    SelectOption::list(
        OrderStatus::ALL.iter().map(|s| (s.as_str(), s.label())),
        current.map(OrderStatus::as_str),
    )
}

/// List orders, optionally by status.
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<OrdersQuery>,
) -> impl IntoResponse {
    let status = match non_blank(query.status) {
        Some(raw) => match raw.parse::<OrderStatus>() {
            Ok(status) => Some(status),
            Err(e) => {
                tracing::debug!("Ignoring status filter: {e}");
                Flash::push(
                    &session,
                    FlashLevel::Warning,
                    format!("Unknown status \"{raw}\"; showing all orders."),
                )
                .await;
                None
            }
        },
        None => None,
    };
    let page_number = query.page.unwrap_or(1).max(1);

    let orders = OrderRepository::new(state.pool())
        .list(status, Page::numbered(page_number, PER_PAGE))
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to list orders: {e}");
            Vec::new()
        });
    let has_next = i64::try_from(orders.len()).is_ok_and(|n| n == PER_PAGE);

    OrdersIndexTemplate {
        page: AdminPage::load(&session, admin, NAV_PATH).await,
        orders,
        statuses: status_options(status),
        status,
        page_number,
        has_next,
    }
}

/// Order detail with its lines.
#[instrument(skip(admin, state, session))]
pub async fn show(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<OrderId>,
) -> Response {
    let order = match OrderRepository::new(state.pool()).get_by_id(id).await {
        Ok(Some(order)) => order,
        Ok(None) => {
            Flash::push(&session, FlashLevel::Error, "Order not found.").await;
            return Redirect::to(NAV_PATH).into_response();
        }
        Err(e) => {
            tracing::error!("Failed to load order {id}: {e}");
            Flash::push(&session, FlashLevel::Error, "Could not load that order.").await;
            return Redirect::to(NAV_PATH).into_response();
        }
    };

    let items = OrderItemRepository::new(state.pool())
        .list_for_order(id)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to load items for order {id}: {e}");
            Vec::new()
        });

    let current = order.order.status.known();
    let refundable =
        order.order.payment_intent_id.is_some() && current != Some(OrderStatus::Cancelled);

    OrderShowTemplate {
        page: AdminPage::load(&session, admin, NAV_PATH).await,
        order,
        items,
        statuses: status_options(current),
        refundable,
    }
    .into_response()
}

/// Change an order's status. Any status may replace any other.
#[instrument(skip(_admin, state, session, form))]
pub async fn update_status(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<OrderId>,
    Form(form): Form<StatusForm>,
) -> Redirect {
    let detail = format!("{NAV_PATH}/{id}");

    let Ok(status) = form.status.parse::<OrderStatus>() else {
        Flash::push(
            &session,
            FlashLevel::Error,
            format!("\"{}\" is not a valid order status.", form.status),
        )
        .await;
        return Redirect::to(&detail);
    };

    match OrderRepository::new(state.pool())
        .update_status(id, status)
        .await
    {
        Ok(_) => {
            tracing::info!(order_id = %id, status = %status, "Order status updated");
            Flash::push(
                &session,
                FlashLevel::Success,
                format!("Order marked {}.", status.label()),
            )
            .await;
            Redirect::to(&detail)
        }
        Err(RepositoryError::NotFound) => {
            Flash::push(&session, FlashLevel::Error, "Order not found.").await;
            Redirect::to(NAV_PATH)
        }
        Err(e) => {
            tracing::error!("Failed to update order {id}: {e}");
            Flash::push(&session, FlashLevel::Error, "Could not update the order.").await;
            Redirect::to(&detail)
        }
    }
}

/// Refund an order's charge in full and cancel it.
#[instrument(skip(_admin, state, session))]
pub async fn refund(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<OrderId>,
) -> Redirect {
    let detail = format!("{NAV_PATH}/{id}");
    let orders = OrderRepository::new(state.pool());

    let order = match orders.get_by_id(id).await {
        Ok(Some(summary)) => summary.order,
        Ok(None) => {
            Flash::push(&session, FlashLevel::Error, "Order not found.").await;
            return Redirect::to(NAV_PATH);
        }
        Err(e) => {
            tracing::error!("Failed to load order {id}: {e}");
            Flash::push(&session, FlashLevel::Error, "Could not load that order.").await;
            return Redirect::to(&detail);
        }
    };

    if order.status.known() == Some(OrderStatus::Cancelled) {
        Flash::push(&session, FlashLevel::Info, "This order is already cancelled.").await;
        return Redirect::to(&detail);
    }

    let Some(intent_id) = order.payment_intent_id.as_deref() else {
        Flash::push(
            &session,
            FlashLevel::Error,
            "This order has no payment to refund.",
        )
        .await;
        return Redirect::to(&detail);
    };

    let refund = match state.payments().refund(intent_id, None).await {
        Ok(refund) => refund,
        Err(e) => {
            tracing::error!("Refund failed for order {id}: {e}");
            Flash::push(&session, FlashLevel::Error, "The refund could not be processed.").await;
            return Redirect::to(&detail);
        }
    };

    let order_id = id.to_string();
    add_breadcrumb(
        "admin",
        "Refunded order",
        Some(&[("order_id", &order_id), ("refund_id", &refund.id)]),
    );

    if let Err(e) = orders.update_status(id, OrderStatus::Cancelled).await {
        tracing::error!(refund_id = %refund.id, "Refunded order {id} but could not cancel it: {e}");
        Flash::push(
            &session,
            FlashLevel::Warning,
            "The payment was refunded but the order status could not be updated.",
        )
        .await;
        return Redirect::to(&detail);
    }

    tracing::info!(order_id = %id, refund_id = %refund.id, "Order refunded");
    Flash::push(
        &session,
        FlashLevel::Success,
        "Payment refunded and order cancelled.",
    )
    .await;
    Redirect::to(&detail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_options_cover_every_status() {
        let options = status_options(Some(OrderStatus::Shipped));
        assert_eq!(options.len(), OrderStatus::ALL.len());
        let selected: Vec<_> = options.iter().filter(|o| o.selected).collect();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].value, "shipped");
    }
}
