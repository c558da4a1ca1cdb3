//! Registration form lifecycle.
//!
//! `Editing -> Success | EditingWithError`; the request in flight is the
//! submitting phase. The controller repeats the intake checks locally so an
//! invalid form never reaches the submitter, and it never retries on its own.
//! Leaving the confirmation is a fresh `GET /register`, either from the
//! "Submit another response" link or the page's own refresh after
//! [`AUTO_RESET_AFTER`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::database::RegistrationStore;
use crate::models::RegistrationPayload;
use crate::services::registration_service;
use crate::web::routes::register::{reply_for, RegisterReply};

/// How long the confirmation stays up before the form comes back by itself.
pub const AUTO_RESET_AFTER: Duration = Duration::from_secs(5);

pub const SETUP_REQUIRED_MESSAGE: &str = "Database table is not yet set up. Please follow \
the setup instructions in README.md to initialize the database.";
const FALLBACK_ERROR: &str = "Registration failed. Please try again.";
const TRANSPORT_ERROR: &str = "An error occurred. Please try again.";

pub const EVENTS: &[&str] = &[
    "PaperXpo",
    "Tech Escape",
    "Error Auction",
    "Web Architect",
    "Prompt Olympia",
    "Short Film",
    "E-Sports (Free Fire)",
    "Meme Marathon",
    "Connection",
    "Treasure Hunt",
];

pub const DEPARTMENTS: &[&str] = &[
    "Computer Science and Engineering",
    "Electronics and Communication",
    "Mechanical Engineering",
    "Electrical Engineering",
    "Civil Engineering",
    "Information Technology",
];

pub const YEARS: &[&str] = &["1st Year", "2nd Year", "3rd Year", "4th Year"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FormFields {
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub college_name: String,
    pub department: String,
    pub year_semester: String,
    pub event_selection: String,
    pub additional_notes: String,
}

impl FormFields {
    pub fn to_payload(&self) -> RegistrationPayload {
        RegistrationPayload {
            full_name: Some(self.full_name.clone()),
            email: Some(self.email.clone()),
            phone_number: Some(self.phone_number.clone()),
            college_name: Some(self.college_name.clone()),
            department: Some(self.department.clone()),
            year_semester: Some(self.year_semester.clone()),
            event_selection: Some(self.event_selection.clone()),
            additional_notes: Some(self.additional_notes.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormState {
    Editing,
    Success,
    EditingWithError(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmitReply {
    pub status: StatusCode,
    pub body: RegisterReply,
}

#[derive(Debug, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Whatever carries a payload to the intake service.
#[async_trait]
pub trait Submitter: Send + Sync {
    async fn submit(&self, payload: &RegistrationPayload) -> Result<SubmitReply, TransportError>;
}

/// Calls the intake service directly, producing the same reply `/register` would.
#[derive(Clone)]
pub struct InProcessSubmitter {
    store: Arc<dyn RegistrationStore>,
}

impl InProcessSubmitter {
    pub fn new(store: Arc<dyn RegistrationStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Submitter for InProcessSubmitter {
    async fn submit(&self, payload: &RegistrationPayload) -> Result<SubmitReply, TransportError> {
        let result = registration_service::submit(self.store.as_ref(), payload).await;
        let (status, body) = reply_for(result);
        Ok(SubmitReply { status, body })
    }
}

fn reply_error_message(reply: &SubmitReply) -> String {
    let error = reply.body.error.as_deref();
    if reply.status == StatusCode::INTERNAL_SERVER_ERROR
        && error.is_some_and(|e| e.contains("does not exist"))
    {
        return SETUP_REQUIRED_MESSAGE.to_string();
    }
    error.unwrap_or(FALLBACK_ERROR).to_string()
}

#[derive(Debug, Clone)]
pub struct RegistrationForm {
    fields: FormFields,
    state: FormState,
}

impl Default for RegistrationForm {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistrationForm {
    pub fn new() -> Self {
        Self::with_fields(FormFields::default())
    }

    pub fn with_fields(fields: FormFields) -> Self {
        Self {
            fields,
            state: FormState::Editing,
        }
    }

    pub fn fields(&self) -> &FormFields {
        &self.fields
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            FormState::EditingWithError(message) => Some(message),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.state == FormState::Success
    }

    /// First problem in field order: name, email presence, email shape, phone.
    pub fn validate(&self) -> Result<(), &'static str> {
        let fields = &self.fields;
        if fields.full_name.trim().is_empty() {
            return Err("Full name is required");
        }
        if fields.email.trim().is_empty() {
            return Err("Email is required");
        }
        if !registration_service::is_valid_email(&fields.email) {
            return Err("Please enter a valid email address");
        }
        if fields.phone_number.trim().is_empty() {
            return Err("Phone number is required");
        }
        Ok(())
    }

    /// A form that already succeeded is left alone.
    pub async fn submit<S>(&mut self, submitter: &S) -> &FormState
    where
        S: Submitter + ?Sized,
    {
        if self.is_success() {
            return &self.state;
        }

        if let Err(message) = self.validate() {
            self.state = FormState::EditingWithError(message.to_string());
            return &self.state;
        }

        self.state = match submitter.submit(&self.fields.to_payload()).await {
            Ok(reply) if reply.status.is_success() && reply.body.success => {
                self.fields = FormFields::default();
                FormState::Success
            }
            Ok(reply) => FormState::EditingWithError(reply_error_message(&reply)),
            Err(e) => {
                warn!("Submit error: {}", e);
                FormState::EditingWithError(TRANSPORT_ERROR.to_string())
            }
        };
        &self.state
    }
}
