//! Admin authentication extractor and session helpers.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{CurrentAdmin, Flash, FlashLevel, session_keys};

/// Where unauthenticated admin requests are sent.
pub const LOGIN_PATH: &str = "/admin/login";

/// Notice shown after a guard redirect.
pub const LOGIN_REQUIRED_MESSAGE: &str = "Please log in to access the admin area.";

/// Extractor that requires a logged-in admin.
///
/// If no admin is in the session, queues a flash notice and redirects to the
/// login page without running the handler.
///
/// # Example
///
/// ```rust,ignore
/// async fn dashboard(RequireAdmin(admin): RequireAdmin) -> impl IntoResponse {
///     format!("Hello, {}!", admin.username)
/// }
/// ```
pub struct RequireAdmin(pub CurrentAdmin);

/// Rejection for [`RequireAdmin`].
pub enum AdminAuthRejection {
    /// Not logged in.
    RedirectToLogin,
    /// The session layer is missing; a wiring bug.
    MissingSession,
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::MissingSession => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AdminAuthRejection::MissingSession)?;

        match current_admin(session).await {
            Some(admin) => Ok(Self(admin)),
            None => {
                tracing::debug!(path = %parts.uri.path(), "Admin login required");
                Flash::push(session, FlashLevel::Warning, LOGIN_REQUIRED_MESSAGE).await;
                Err(AdminAuthRejection::RedirectToLogin)
            }
        }
    }
}

/// The admin stored in the session, if any.
pub async fn current_admin(session: &Session) -> Option<CurrentAdmin> {
    session
        .get::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
        .await
        .ok()
        .flatten()
}

/// Mark the session as logged in.
///
/// The session id is cycled first so a pre-login id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_ADMIN, admin).await
}

/// Remove the login from the session. The cart and other state survive.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
        .await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use tower_sessions::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn test_login_logout_cycle() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        assert!(current_admin(&session).await.is_none());

        let admin = CurrentAdmin {
            username: "admin".to_string(),
            logged_in_at: Utc::now(),
        };
        set_current_admin(&session, &admin).await.unwrap();
        assert_eq!(current_admin(&session).await.unwrap().username, "admin");

        clear_current_admin(&session).await.unwrap();
        assert!(current_admin(&session).await.is_none());
    }
}
