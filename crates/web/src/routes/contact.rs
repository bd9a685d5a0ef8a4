//! Contact form route handlers.

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

use crumb_core::Email;

use crate::content::{self, ContactInfo};
use crate::db::InquiryRepository;
use crate::filters;
use crate::models::{Flash, FlashLevel, NewInquiry};
use crate::services::event_log::InquiryEvent;
use crate::state::AppState;

use super::page::StorePage;

/// Longest accepted name.
const MAX_NAME_LEN: usize = 100;
/// Longest accepted message.
const MAX_MESSAGE_LEN: usize = 5000;

/// Contact form data.
#[derive(Debug, Default, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
}

impl ContactForm {
    /// Validate the form into an inquiry, or a list of problems.
    fn validate(&self) -> Result<NewInquiry, Vec<String>> {
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

        let message = self.message.trim();
        if message.is_empty() {
            errors.push("Please enter a message.".to_string());
        } else if message.chars().count() > MAX_MESSAGE_LEN {
            errors.push(format!("Message must be at most {MAX_MESSAGE_LEN} characters."));
        }

        match email {
            Ok(email) if errors.is_empty() => Ok(NewInquiry {
                name: name.to_owned(),
                email,
                message: message.to_owned(),
            }),
            _ => Err(errors),
        }
    }
}

/// Contact page template.
#[derive(Template, WebTemplate)]
#[template(path = "contact.html")]
pub struct ContactTemplate {
    pub page: StorePage,
    pub contact: Option<&'static ContactInfo>,
    pub form: ContactForm,
    pub errors: Vec<String>,
}

/// Display the contact form.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    ContactTemplate {
        page: StorePage::load(&session).await,
        contact: content::contact(state.config().mock_mode),
        form: ContactForm::default(),
        errors: Vec::new(),
    }
}

/// Record an inquiry.
///
/// Invalid input re-renders the form with what was entered. A stored inquiry
/// is also sent to the event log in the background.
#[instrument(skip(state, session, form))]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ContactForm>,
) -> Response {
    let inquiry = match form.validate() {
        Ok(inquiry) => inquiry,
        Err(errors) => {
            return ContactTemplate {
                page: StorePage::load(&session).await,
                contact: content::contact(state.config().mock_mode),
                form,
                errors,
            }
            .into_response();
        }
    };

    match InquiryRepository::new(state.pool()).create(&inquiry).await {
        Ok(inquiry_id) => {
            tracing::info!(inquiry_id = %inquiry_id, "Inquiry received");
            state.event_log().record_inquiry(InquiryEvent {
                inquiry_id,
                name: inquiry.name,
                email: inquiry.email,
                timestamp: Utc::now(),
            });
            Flash::push(
                &session,
                FlashLevel::Success,
                "Thank you for your message! We'll get back to you soon.",
            )
            .await;
        }
        Err(e) => {
            tracing::error!("Failed to store inquiry: {e}");
            Flash::push(
                &session,
                FlashLevel::Error,
                "Sorry, your message couldn't be sent. Please try again later.",
            )
            .await;
        }
    }

    Redirect::to("/contact").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_form() {
        let form = ContactForm {
            name: "Ada".to_string(),
            email: " ada@crumb.test ".to_string(),
            message: "Do you take commissions?".to_string(),
        };
        let inquiry = form.validate().unwrap_or_else(|e| panic!("{e:?}"));
        assert_eq!(inquiry.email.as_str(), "ada@crumb.test");
    }

    #[test]
    fn test_every_field_required() {
        let errors = ContactForm::default().validate().err().unwrap_or_default();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_message_length_limit() {
        let form = ContactForm {
            name: "Ada".to_string(),
            email: "ada@crumb.test".to_string(),
            message: "x".repeat(MAX_MESSAGE_LEN + 1),
        };
        assert!(form.validate().is_err());
    }
}
