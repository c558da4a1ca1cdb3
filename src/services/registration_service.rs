use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::database::{RegistrationStore, REGISTRATIONS_TABLE};
use crate::error::StoreError;
use crate::models::{NewRegistration, RegistrationPayload, RegistrationRow};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
});

pub const FULL_NAME: &str = "full_name";
pub const EMAIL: &str = "email";
pub const PHONE_NUMBER: &str = "phone_number";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("Missing required fields")]
    MissingFields(Vec<&'static str>),

    #[error("Please enter a valid email address")]
    InvalidEmail,

    #[error("Registration table does not exist. Initialize the database first.")]
    NotInitialized,

    #[error("Failed to register. Please try again.")]
    Storage,
}

impl RegistrationError {
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            RegistrationError::MissingFields(_) | RegistrationError::InvalidEmail
        )
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

/// Checks required fields and the email shape. Values are kept verbatim;
/// absent optional fields become empty strings.
pub fn validate(payload: &RegistrationPayload) -> Result<NewRegistration, RegistrationError> {
    let missing: Vec<&'static str> = [
        (FULL_NAME, &payload.full_name),
        (EMAIL, &payload.email),
        (PHONE_NUMBER, &payload.phone_number),
    ]
    .into_iter()
    .filter(|(_, value)| is_blank(value))
    .map(|(name, _)| name)
    .collect();

    if !missing.is_empty() {
        return Err(RegistrationError::MissingFields(missing));
    }

    let email = payload.email.clone().unwrap_or_default();
    if !is_valid_email(&email) {
        return Err(RegistrationError::InvalidEmail);
    }

    Ok(NewRegistration {
        full_name: payload.full_name.clone().unwrap_or_default(),
        email,
        phone_number: payload.phone_number.clone().unwrap_or_default(),
        college_name: payload.college_name.clone().unwrap_or_default(),
        department: payload.department.clone().unwrap_or_default(),
        year_semester: payload.year_semester.clone().unwrap_or_default(),
        event_selection: payload.event_selection.clone().unwrap_or_default(),
        additional_notes: payload.additional_notes.clone().unwrap_or_default(),
    })
}

/// Validates and stores one registration.
///
/// There is no idempotency key: a client that retries after a timeout may
/// create a second row for the same person.
pub async fn submit(
    store: &dyn RegistrationStore,
    payload: &RegistrationPayload,
) -> Result<RegistrationRow, RegistrationError> {
    let row = validate(payload).map_err(|e| {
        warn!("Registration rejected: {:?}", e);
        e
    })?;

    match store.insert(REGISTRATIONS_TABLE, &row).await {
        Ok(created) => {
            info!(id = created.id, event = %created.event_selection, "registration stored");
            Ok(created)
        }
        Err(StoreError::RelationNotFound(table)) => {
            error!("Registration insert failed: relation {} does not exist", table);
            Err(RegistrationError::NotInitialized)
        }
        Err(e) => {
            error!("Registration insert failed: {}", e);
            Err(RegistrationError::Storage)
        }
    }
}
