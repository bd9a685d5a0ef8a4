//! Inquiry management handlers.

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

use crumb_core::{InquiryId, InquiryStatus};

use crate::db::{InquiryRepository, Page, RepositoryError};
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::models::{Flash, FlashLevel, Inquiry};
use crate::routes::page::{AdminPage, SelectOption, non_blank};
use crate::state::AppState;

use super::PER_PAGE;
use super::orders::StatusForm;

const NAV_PATH: &str = "/admin/inquiries";

/// Inquiry list query parameters.
#[derive(Debug, Deserialize)]
pub struct InquiriesQuery {
    pub status: Option<String>,
    pub page: Option<u32>,
}

/// Inquiry list template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/inquiries/index.html")]
pub struct InquiriesIndexTemplate {
    pub page: AdminPage,
    pub inquiries: Vec<Inquiry>,
    pub statuses: Vec<SelectOption>,
    pub status: Option<InquiryStatus>,
    pub page_number: u32,
    pub has_next: bool,
}

/// Inquiry detail template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/inquiries/show.html")]
pub struct InquiryShowTemplate {
    pub page: AdminPage,
    pub inquiry: Inquiry,
    pub statuses: Vec<SelectOption>,
}

fn status_options(current: Option<InquiryStatus>) -> Vec<SelectOption> {
    SelectOption::list(
        InquiryStatus::ALL.iter().map(|s| (s.as_str(), s.label())),
        current.map(InquiryStatus::as_str),
    )
}

/// List inquiries, optionally by status.
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<InquiriesQuery>,
) -> impl IntoResponse {
    let status = match non_blank(query.status) {
        Some(raw) => match raw.parse::<InquiryStatus>() {
            Ok(status) => Some(status),
            Err(e) => {
                tracing::debug!("Ignoring status filter: {e}");
                Flash::push(
                    &session,
                    FlashLevel::Warning,
                    format!("Unknown status \"{raw}\"; showing all inquiries."),
                )
                .await;
                None
            }
        },
        None => None,
    };
    let page_number = query.page.unwrap_or(1).max(1);

    let inquiries = InquiryRepository::new(state.pool())
        .list(status, Page::numbered(page_number, PER_PAGE))
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to list inquiries: {e}");
            Vec::new()
        });
    let has_next = i64::try_from(inquiries.len()).is_ok_and(|n| n == PER_PAGE);

    InquiriesIndexTemplate {
        page: AdminPage::load(&session, admin, NAV_PATH).await,
        inquiries,
        statuses: status_options(status),
        status,
        page_number,
        has_next,
    }
}

/// Inquiry detail.
#[instrument(skip(admin, state, session))]
pub async fn show(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<InquiryId>,
) -> Response {
    match InquiryRepository::new(state.pool()).get_by_id(id).await {
        Ok(Some(inquiry)) => {
            let statuses = status_options(inquiry.status.known());
            InquiryShowTemplate {
                page: AdminPage::load(&session, admin, NAV_PATH).await,
                inquiry,
                statuses,
            }
            .into_response()
        }
        Ok(None) => {
            Flash::push(&session, FlashLevel::Error, "Inquiry not found.").await;
            Redirect::to(NAV_PATH).into_response()
        }
        Err(e) => {
            tracing::error!("Failed to load inquiry {id}: {e}");
            Flash::push(&session, FlashLevel::Error, "Could not load that inquiry.").await;
            Redirect::to(NAV_PATH).into_response()
        }
    }
}

/// Change an inquiry's status.
///
/// Moving to responded or closed records the response time.
#[instrument(skip(_admin, state, session, form))]
pub async fn update_status(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<InquiryId>,
    Form(form): Form<StatusForm>,
) -> Redirect {
    let detail = format!("{NAV_PATH}/{id}");

    let Ok(status) = form.status.parse::<InquiryStatus>() else {
        Flash::push(
            &session,
            FlashLevel::Error,
            format!("\"{}\" is not a valid inquiry status.", form.status),
        )
        .await;
        return Redirect::to(&detail);
    };

    match InquiryRepository::new(state.pool())
        .update_status(id, status)
        .await
    {
        Ok(inquiry) => {
            tracing::info!(
                inquiry_id = %id,
                status = %status,
                responded = inquiry.responded_at.is_some(),
                "Inquiry status updated"
            );
            Flash::push(
                &session,
                FlashLevel::Success,
                format!("Inquiry marked {}.", status.label()),
            )
            .await;
            Redirect::to(&detail)
        }
        Err(RepositoryError::NotFound) => {
            Flash::push(&session, FlashLevel::Error, "Inquiry not found.").await;
            Redirect::to(NAV_PATH)
        }
        Err(e) => {
            tracing::error!("Failed to update inquiry {id}: {e}");
            Flash::push(&session, FlashLevel::Error, "Could not update the inquiry.").await;
            Redirect::to(&detail)
        }
    }
}
