//! Dashboard route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use rust_decimal::Decimal;
use tower_sessions::Session;
use tracing::instrument;

use crumb_core::InquiryStatus;

use crate::db::{
    CustomerRepository, InquiryRepository, OrderRepository, Page, ProductRepository,
    RepositoryError,
};
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::models::{Inquiry, OrderSummary};
use crate::routes::page::AdminPage;
use crate::state::AppState;

/// Rows shown in each dashboard panel.
const RECENT_LIMIT: i64 = 5;

/// Headline numbers.
#[derive(Debug, Clone, Default)]
pub struct DashboardStats {
    pub customers: i64,
    pub products: i64,
    pub orders: i64,
    /// Sum of order totals, cancelled orders excluded.
    pub revenue: Decimal,
    pub new_inquiries: i64,
}

/// Dashboard page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub page: AdminPage,
    pub stats: DashboardStats,
    pub recent_orders: Vec<OrderSummary>,
    pub new_inquiries: Vec<Inquiry>,
}

async fn load_stats(state: &AppState) -> Result<DashboardStats, RepositoryError> {
    let pool = state.pool();
    let customers = CustomerRepository::new(pool);
    let products = ProductRepository::new(pool);
    let orders = OrderRepository::new(pool);
    let inquiries = InquiryRepository::new(pool);

    let (customers, products, orders, revenue, new_inquiries) = tokio::try_join!(
        customers.count(),
        products.count(),
        orders.count(),
        orders.revenue(),
        inquiries.count_by_status(InquiryStatus::New),
    )?;

    Ok(DashboardStats {
        customers,
        products,
        orders,
        revenue,
        new_inquiries,
    })
}

/// Dashboard page handler.
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
) -> impl IntoResponse {
    let stats = load_stats(&state).await.unwrap_or_else(|e| {
        tracing::error!("Failed to load dashboard stats: {e}");
        DashboardStats::default()
    });

    let recent_orders = OrderRepository::new(state.pool())
        .list(None, Page::first(RECENT_LIMIT))
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to load recent orders: {e}");
            Vec::new()
        });

    let new_inquiries = InquiryRepository::new(state.pool())
        .list(Some(InquiryStatus::New), Page::first(RECENT_LIMIT))
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to load new inquiries: {e}");
            Vec::new()
        });

    DashboardTemplate {
        page: AdminPage::load(&session, admin, "/admin").await,
        stats,
        recent_orders,
        new_inquiries,
    }
}
