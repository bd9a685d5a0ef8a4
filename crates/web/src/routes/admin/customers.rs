//! Customer management handlers.

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

use crumb_core::{CustomerId, Email};

use crate::db::customers::DEFAULT_SEARCH_LIMIT;
use crate::db::{CustomerRepository, OrderRepository, Page, RepositoryError};
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::models::{Customer, CustomerPatch, Flash, FlashLevel, Order};
use crate::routes::page::{AdminPage, non_blank};
use crate::state::AppState;

use super::PER_PAGE;

const NAV_PATH: &str = "/admin/customers";

/// Customer list query parameters.
#[derive(Debug, Deserialize)]
pub struct CustomersQuery {
    pub search: Option<String>,
    pub page: Option<u32>,
}

/// Customer list template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/customers/index.html")]
pub struct CustomersIndexTemplate {
    pub page: AdminPage,
    pub customers: Vec<Customer>,
    pub search: String,
    pub page_number: u32,
    pub has_next: bool,
}

/// Customer detail template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/customers/show.html")]
pub struct CustomerShowTemplate {
    pub page: AdminPage,
    pub customer: Customer,
    pub orders: Vec<Order>,
}

/// Customer edit form. Blank fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct CustomerForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl CustomerForm {
    /// Convert into a patch, rejecting a malformed email.
    fn into_patch(self) -> Result<CustomerPatch, String> {
        let email = non_blank(self.email)
            .map(|raw| Email::parse(&raw).map_err(|e| format!("Invalid email: {e}.")))
            .transpose()?;

        Ok(CustomerPatch {
            name: non_blank(self.name),
            email,
            phone: non_blank(self.phone),
            address: non_blank(self.address),
        })
    }
}

/// List or search customers.
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CustomersQuery>,
) -> impl IntoResponse {
    let repo = CustomerRepository::new(state.pool());
    let search = non_blank(query.search);
    let page_number = query.page.unwrap_or(1).max(1);

    let result = match search.as_deref() {
        Some(q) => repo.search(q, DEFAULT_SEARCH_LIMIT).await,
        None => repo.list(Page::numbered(page_number, PER_PAGE)).await,
    };
    let customers = result.unwrap_or_else(|e| {
        tracing::error!("Failed to list customers: {e}");
        Vec::new()
    });

    let has_next = search.is_none() && i64::try_from(customers.len()).is_ok_and(|n| n == PER_PAGE);

    CustomersIndexTemplate {
        page: AdminPage::load(&session, admin, NAV_PATH).await,
        customers,
        search: search.unwrap_or_default(),
        page_number,
        has_next,
    }
}

/// Customer detail with order history.
#[instrument(skip(admin, state, session))]
pub async fn show(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<CustomerId>,
) -> Response {
    let customer = match CustomerRepository::new(state.pool()).get_by_id(id).await {
        Ok(Some(customer)) => customer,
        Ok(None) => {
            Flash::push(&session, FlashLevel::Error, "Customer not found.").await;
            return Redirect::to(NAV_PATH).into_response();
        }
        Err(e) => {
            tracing::error!("Failed to load customer {id}: {e}");
            Flash::push(&session, FlashLevel::Error, "Could not load that customer.").await;
            return Redirect::to(NAV_PATH).into_response();
        }
    };

    let orders = OrderRepository::new(state.pool())
        .get_by_customer(id)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to load orders for customer {id}: {e}");
            Vec::new()
        });

    CustomerShowTemplate {
        page: AdminPage::load(&session, admin, NAV_PATH).await,
        customer,
        orders,
    }
    .into_response()
}

/// Apply edits to a customer.
#[instrument(skip(_admin, state, session, form))]
pub async fn update(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<CustomerId>,
    Form(form): Form<CustomerForm>,
) -> Redirect {
    let detail = format!("{NAV_PATH}/{id}");

    let patch = match form.into_patch() {
        Ok(patch) => patch,
        Err(message) => {
            Flash::push(&session, FlashLevel::Error, message).await;
            return Redirect::to(&detail);
        }
    };

    match CustomerRepository::new(state.pool()).update(id, &patch).await {
        Ok(customer) => {
            tracing::info!(customer_id = %customer.id, "Customer updated");
            Flash::push(&session, FlashLevel::Success, "Customer updated.").await;
            Redirect::to(&detail)
        }
        Err(RepositoryError::NothingToUpdate) => {
            Flash::push(&session, FlashLevel::Info, "Nothing to update.").await;
            Redirect::to(&detail)
        }
        Err(RepositoryError::Conflict(_)) => {
            Flash::push(
                &session,
                FlashLevel::Error,
                "Another customer already uses that email address.",
            )
            .await;
            Redirect::to(&detail)
        }
        Err(RepositoryError::NotFound) => {
            Flash::push(&session, FlashLevel::Error, "Customer not found.").await;
            Redirect::to(NAV_PATH)
        }
        Err(e) => {
            tracing::error!("Failed to update customer {id}: {e}");
            Flash::push(&session, FlashLevel::Error, "Could not update the customer.").await;
            Redirect::to(&detail)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_fields_are_unchanged() {
        let form = CustomerForm {
            name: Some("  ".to_string()),
            email: Some(String::new()),
            phone: Some("555-0100".to_string()),
            address: None,
        };
        let patch = form.into_patch().unwrap_or_default();
        assert_eq!(patch.name, None);
        assert_eq!(patch.email, None);
        assert_eq!(patch.phone.as_deref(), Some("555-0100"));
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_bad_email_rejected() {
        let form = CustomerForm {
            email: Some("not-an-email".to_string()),
            ..CustomerForm::default()
        };
        assert!(form.into_patch().is_err());
    }

    #[test]
    fn test_empty_form_is_empty_patch() {
        let patch = CustomerForm::default().into_patch().unwrap_or_default();
        assert!(patch.is_empty());
    }
}
