use serde::Serialize;
use tracing::{info, warn};

use crate::database::{RegistrationStore, REGISTRATIONS_SCHEMA, REGISTRATIONS_TABLE};
use crate::error::StoreError;

pub const SETUP_INSTRUCTIONS: &str = "Please run the SQL migration manually in your database \
dashboard. Open the SQL editor, paste the statements from the `sql` field and run them, \
or set POSTGRES_URL and call POST /init-db again.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ProvisionReport {
    Ready {
        success: bool,
        message: String,
        #[serde(rename = "registrationCount")]
        registration_count: i64,
    },
    NotInitialized {
        success: bool,
        message: String,
        instructions: String,
        sql: String,
    },
}

impl ProvisionReport {
    pub fn is_ready(&self) -> bool {
        matches!(self, ProvisionReport::Ready { .. })
    }
}

/// Makes sure `event_registrations`, its indexes and its two policies exist.
///
/// Safe to call any number of times. When the store cannot run schema
/// statements and the relation is missing, the report carries the SQL an
/// operator has to run by hand.
pub async fn ensure_schema(store: &dyn RegistrationStore) -> Result<ProvisionReport, StoreError> {
    match store.apply_schema(&REGISTRATIONS_SCHEMA).await {
        Ok(()) => info!("Schema plan for {} applied", REGISTRATIONS_TABLE),
        Err(StoreError::SchemaUnsupported) => {
            info!("Storage client is data-only, probing {}", REGISTRATIONS_TABLE)
        }
        Err(e) => return Err(e),
    }

    match store.probe(REGISTRATIONS_TABLE).await {
        Ok(()) => {}
        Err(StoreError::RelationNotFound(table)) => {
            warn!("Relation {} is missing and cannot be created from here", table);
            return Ok(ProvisionReport::NotInitialized {
                success: false,
                message: "Table does not exist".to_string(),
                instructions: SETUP_INSTRUCTIONS.to_string(),
                sql: REGISTRATIONS_SCHEMA.to_sql(),
            });
        }
        Err(e) => return Err(e),
    }

    let registration_count = store.count(REGISTRATIONS_TABLE).await?;
    Ok(ProvisionReport::Ready {
        success: true,
        message: "Database is properly configured".to_string(),
        registration_count,
    })
}
