use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::database::schema::SchemaPlan;
use crate::database::RegistrationStore;
use crate::error::StoreError;
use crate::models::{NewRegistration, RegistrationRow};

#[derive(Debug, Default)]
struct MemoryRelation {
    rows: Vec<RegistrationRow>,
    last_id: i64,
    indexes: BTreeSet<String>,
    row_level_security: bool,
    policies: Vec<String>,
}

/// Schema objects of one relation, as seen by tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaSnapshot {
    pub indexes: Vec<String>,
    pub row_level_security: bool,
    pub policies: Vec<String>,
}

#[derive(Debug, Default)]
struct Inner {
    relations: HashMap<String, MemoryRelation>,
    failure: Option<String>,
    inserts: usize,
}

/// In-process stand-in for the hosted database.
#[derive(Debug)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    schema_statements: bool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// A store that accepts schema plans, like a direct connection.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            schema_statements: true,
        }
    }

    /// A store limited to data operations, like the REST client.
    pub fn data_only() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            schema_statements: false,
        }
    }

    /// Creates `table` with no indexes or policies, as if provisioned by hand.
    pub fn create_relation(&self, table: &str) {
        self.lock().relations.entry(table.to_string()).or_default();
    }

    /// Makes every following call fail with `message` until cleared with `None`.
    pub fn set_failure(&self, message: Option<&str>) {
        self.lock().failure = message.map(str::to_string);
    }

    /// Number of insert calls that reached the store, successful or not.
    pub fn insert_calls(&self) -> usize {
        self.lock().inserts
    }

    pub fn rows(&self, table: &str) -> Vec<RegistrationRow> {
        self.lock()
            .relations
            .get(table)
            .map(|r| r.rows.clone())
            .unwrap_or_default()
    }

    pub fn schema_snapshot(&self, table: &str) -> Option<SchemaSnapshot> {
        self.lock().relations.get(table).map(|r| SchemaSnapshot {
            indexes: r.indexes.iter().cloned().collect(),
            row_level_security: r.row_level_security,
            policies: r.policies.clone(),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn failed(inner: &Inner) -> Result<(), StoreError> {
    match &inner.failure {
        Some(message) => Err(StoreError::Other(message.clone())),
        None => Ok(()),
    }
}

#[async_trait]
impl RegistrationStore for MemoryStore {
    async fn insert(
        &self,
        table: &str,
        row: &NewRegistration,
    ) -> Result<RegistrationRow, StoreError> {
        let mut inner = self.lock();
        inner.inserts += 1;
        failed(&inner)?;

        let relation = inner
            .relations
            .get_mut(table)
            .ok_or_else(|| StoreError::RelationNotFound(table.to_string()))?;

        relation.last_id += 1;
        let stored = row.clone().into_row(relation.last_id, Utc::now());
        relation.rows.push(stored.clone());
        Ok(stored)
    }

    async fn count(&self, table: &str) -> Result<i64, StoreError> {
        let inner = self.lock();
        failed(&inner)?;

        inner
            .relations
            .get(table)
            .map(|r| r.rows.len() as i64)
            .ok_or_else(|| StoreError::RelationNotFound(table.to_string()))
    }

    async fn probe(&self, table: &str) -> Result<(), StoreError> {
        let inner = self.lock();
        failed(&inner)?;

        if inner.relations.contains_key(table) {
            Ok(())
        } else {
            Err(StoreError::RelationNotFound(table.to_string()))
        }
    }

    async fn apply_schema(&self, plan: &SchemaPlan) -> Result<(), StoreError> {
        if !self.schema_statements {
            return Err(StoreError::SchemaUnsupported);
        }

        let mut inner = self.lock();
        failed(&inner)?;

        let relation = inner.relations.entry(plan.relation.to_string()).or_default();
        for index in plan.indexes {
            relation.indexes.insert(index.name.to_string());
        }
        relation.row_level_security = true;
        for policy in plan.policies {
            relation.policies.retain(|p| p != policy.name);
        }
        for policy in plan.policies {
            relation.policies.push(policy.name.to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{REGISTRATIONS_SCHEMA, REGISTRATIONS_TABLE};

    fn new_row(name: &str) -> NewRegistration {
        NewRegistration {
            full_name: name.to_string(),
            email: "a@b.co".to_string(),
            phone_number: "1".to_string(),
            college_name: String::new(),
            department: String::new(),
            year_semester: String::new(),
            event_selection: String::new(),
            additional_notes: String::new(),
        }
    }

    #[tokio::test]
    async fn ids_are_assigned_in_sequence() {
        let store = MemoryStore::new();
        store.create_relation(REGISTRATIONS_TABLE);

        let a = store.insert(REGISTRATIONS_TABLE, &new_row("a")).await.unwrap();
        let b = store.insert(REGISTRATIONS_TABLE, &new_row("b")).await.unwrap();

        assert_eq!((a.id, b.id), (1, 2));
        assert_eq!(store.count(REGISTRATIONS_TABLE).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn missing_relation_is_reported() {
        let store = MemoryStore::new();

        let err = store.probe(REGISTRATIONS_TABLE).await.unwrap_err();
        assert!(err.is_relation_not_found());
        let err = store
            .insert(REGISTRATIONS_TABLE, &new_row("a"))
            .await
            .unwrap_err();
        assert!(err.is_relation_not_found());
    }

    #[tokio::test]
    async fn data_only_store_rejects_schema_plans() {
        let store = MemoryStore::data_only();
        let err = store.apply_schema(&REGISTRATIONS_SCHEMA).await.unwrap_err();
        assert!(matches!(err, StoreError::SchemaUnsupported));
        assert!(store.schema_snapshot(REGISTRATIONS_TABLE).is_none());
    }

    #[tokio::test]
    async fn reapplying_a_plan_keeps_existing_rows() {
        let store = MemoryStore::new();
        store.apply_schema(&REGISTRATIONS_SCHEMA).await.unwrap();
        store.insert(REGISTRATIONS_TABLE, &new_row("a")).await.unwrap();
        store.apply_schema(&REGISTRATIONS_SCHEMA).await.unwrap();

        assert_eq!(store.rows(REGISTRATIONS_TABLE).len(), 1);
    }
}
