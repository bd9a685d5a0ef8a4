//! Admin login and logout.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::content::{self, SiteConfig};
use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::auth::{clear_current_admin, current_admin, set_current_admin};
use crate::models::{CurrentAdmin, Flash, FlashLevel};
use crate::state::AppState;

/// Login form data.
#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/login.html")]
pub struct LoginTemplate {
    pub site: SiteConfig,
    pub flashes: Vec<Flash>,
}

/// Render the login page, or go straight to the dashboard when logged in.
#[instrument(skip(session))]
pub async fn login_page(session: Session) -> Response {
    if current_admin(&session).await.is_some() {
        return Redirect::to("/admin").into_response();
    }

    LoginTemplate {
        site: content::SITE,
        flashes: Flash::take(&session).await,
    }
    .into_response()
}

/// Check credentials and mark the session as logged in.
#[instrument(skip(state, session, form), fields(username = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Redirect, AppError> {
    if let Err(e) = state.admin().verify(form.username.trim(), &form.password) {
        tracing::warn!("Admin login failed: {e}");
        Flash::push(&session, FlashLevel::Error, "Invalid username or password.").await;
        return Ok(Redirect::to("/admin/login"));
    }

    let admin = CurrentAdmin {
        username: state.admin().username().to_owned(),
        logged_in_at: Utc::now(),
    };
    set_current_admin(&session, &admin).await?;
    set_sentry_user(&admin.username);

    tracing::info!(username = %admin.username, "Admin logged in");
    Flash::push(&session, FlashLevel::Success, "Welcome back!").await;
    Ok(Redirect::to("/admin"))
}

/// Log out. The shopper's cart in the same session is kept.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Redirect, AppError> {
    clear_current_admin(&session).await?;
    clear_sentry_user();

    Flash::push(&session, FlashLevel::Info, "You have been logged out.").await;
    Ok(Redirect::to("/admin/login"))
}
