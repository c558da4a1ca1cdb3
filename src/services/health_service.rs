use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::database::{RegistrationStore, REGISTRATIONS_TABLE};
use crate::error::StoreError;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HealthReport {
    Healthy {
        #[serde(rename = "registrationCount")]
        registration_count: i64,
        timestamp: DateTime<Utc>,
    },
    NotInitialized {
        message: String,
    },
    Error {
        message: String,
    },
}

/// Read-only storage check. Every failure is folded into the report.
pub async fn check_health(store: &dyn RegistrationStore) -> HealthReport {
    match store.count(REGISTRATIONS_TABLE).await {
        Ok(registration_count) => HealthReport::Healthy {
            registration_count,
            timestamp: Utc::now(),
        },
        Err(StoreError::RelationNotFound(_)) => HealthReport::NotInitialized {
            message: "Database table does not exist".to_string(),
        },
        Err(e) => {
            warn!("Health check failed: {}", e);
            HealthReport::Error {
                message: e.to_string(),
            }
        }
    }
}
