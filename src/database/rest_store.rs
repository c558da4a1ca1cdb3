use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_RANGE, CONTENT_TYPE};
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use sqlx::PgPool;

use crate::database::schema::SchemaPlan;
use crate::database::{schema_repo, RegistrationStore};
use crate::error::StoreError;
use crate::models::{NewRegistration, RegistrationRow};

// PostgREST / Postgres codes that mean the relation is not there.
const RELATION_MISSING_CODES: &[&str] = &["PGRST116", "PGRST205", "42P01"];

#[derive(Debug, Deserialize, Default)]
struct RestErrorBody {
    code: Option<String>,
    message: Option<String>,
}

/// Client for the hosted database's REST interface. Data operations only;
/// schema statements need the optional direct pool.
#[derive(Clone)]
pub struct RestStore {
    client: reqwest::Client,
    base_url: String,
    direct: Option<PgPool>,
}

impl RestStore {
    pub fn new(base_url: &str, service_key: &str) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .default_headers(auth_headers(service_key)?)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            direct: None,
        })
    }

    pub fn with_direct_pool(mut self, pool: PgPool) -> Self {
        self.direct = Some(pool);
        self
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }
}

fn auth_headers(service_key: &str) -> Result<HeaderMap, StoreError> {
    let key = HeaderValue::from_str(service_key)
        .map_err(|_| StoreError::Other("service key is not a valid header value".into()))?;
    let bearer = HeaderValue::from_str(&format!("Bearer {}", service_key))
        .map_err(|_| StoreError::Other("service key is not a valid header value".into()))?;

    let mut headers = HeaderMap::new();
    headers.insert("apikey", key);
    headers.insert(AUTHORIZATION, bearer);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(headers)
}

pub(crate) fn classify_error(table: &str, status: StatusCode, body: &str) -> StoreError {
    let parsed: RestErrorBody = serde_json::from_str(body).unwrap_or_default();

    let missing = match parsed.code.as_deref() {
        Some(code) => RELATION_MISSING_CODES.contains(&code),
        None => status == StatusCode::NOT_FOUND,
    };
    if missing {
        return StoreError::RelationNotFound(table.to_string());
    }

    let message = parsed
        .message
        .unwrap_or_else(|| format!("storage responded with {}", status));
    StoreError::Other(message)
}

/// Total from a `Content-Range` header such as `0-24/3573` or `*/0`.
pub(crate) fn parse_content_range_total(value: &str) -> Option<i64> {
    value.rsplit_once('/')?.1.trim().parse().ok()
}

async fn check(table: &str, resp: Response) -> Result<Response, StoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(classify_error(table, status, &body))
}

#[async_trait]
impl RegistrationStore for RestStore {
    async fn insert(
        &self,
        table: &str,
        row: &NewRegistration,
    ) -> Result<RegistrationRow, StoreError> {
        let resp = self
            .client
            .post(self.table_url(table))
            .header("Prefer", "return=representation")
            .json(&[row])
            .send()
            .await?;

        let created: Vec<RegistrationRow> = check(table, resp).await?.json().await?;
        created
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Other("insert returned no representation".into()))
    }

    async fn count(&self, table: &str) -> Result<i64, StoreError> {
        let resp = self
            .client
            .get(self.table_url(table))
            .query(&[("select", "*"), ("limit", "0")])
            .header("Prefer", "count=exact")
            .send()
            .await?;

        let resp = check(table, resp).await?;
        resp.headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total)
            .ok_or_else(|| StoreError::Other("count missing from Content-Range".into()))
    }

    async fn probe(&self, table: &str) -> Result<(), StoreError> {
        let resp = self
            .client
            .get(self.table_url(table))
            .query(&[("select", "id"), ("limit", "1")])
            .send()
            .await?;

        check(table, resp).await.map(|_| ())
    }

    async fn apply_schema(&self, plan: &SchemaPlan) -> Result<(), StoreError> {
        let Some(pool) = self.direct.as_ref() else {
            return Err(StoreError::SchemaUnsupported);
        };
        schema_repo::apply_schema_plan(pool, plan).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use mockito::{Matcher, Server, ServerGuard};
    use serde_json::json;

    use super::*;

    #[test]
    fn relation_missing_codes_are_classified() {
        for code in RELATION_MISSING_CODES {
            let body = format!(r#"{{"code":"{code}","message":"missing"}}"#);
            let err = classify_error("event_registrations", StatusCode::BAD_REQUEST, &body);
            assert!(err.is_relation_not_found(), "{code}");
        }
    }

    #[test]
    fn bare_not_found_means_missing_relation() {
        let err = classify_error("event_registrations", StatusCode::NOT_FOUND, "");
        assert!(err.is_relation_not_found());
    }

    #[test]
    fn other_errors_keep_the_message() {
        let err = classify_error(
            "event_registrations",
            StatusCode::UNAUTHORIZED,
            r#"{"code":"42501","message":"permission denied for table event_registrations"}"#,
        );
        match err {
            StoreError::Other(msg) => assert!(msg.contains("permission denied")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn content_range_total_is_parsed() {
        assert_eq!(parse_content_range_total("*/0"), Some(0));
        assert_eq!(parse_content_range_total("0-24/3573"), Some(3573));
        assert_eq!(parse_content_range_total("0-24/*"), None);
        assert_eq!(parse_content_range_total("garbage"), None);
    }

    #[test]
    fn table_url_ignores_trailing_slash() {
        let store = RestStore::new("https://demo.supabase.co/", "key").unwrap();
        assert_eq!(
            store.table_url("event_registrations"),
            "https://demo.supabase.co/rest/v1/event_registrations"
        );
    }

    #[tokio::test]
    async fn schema_is_unsupported_without_direct_pool() {
        let store = RestStore::new("https://demo.supabase.co", "key").unwrap();
        let err = store
            .apply_schema(&crate::database::REGISTRATIONS_SCHEMA)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::SchemaUnsupported));
    }

    const TABLE: &str = "event_registrations";
    const PATH: &str = "/rest/v1/event_registrations";
    const TABLE_MISSING: &str =
        r#"{"code":"PGRST205","message":"Could not find the table 'public.event_registrations' in the schema cache"}"#;

    fn asha() -> NewRegistration {
        NewRegistration {
            full_name: "Asha R".into(),
            email: "asha@example.com".into(),
            phone_number: "9999999999".into(),
            college_name: String::new(),
            department: String::new(),
            year_semester: String::new(),
            event_selection: "Tech Escape".into(),
            additional_notes: String::new(),
        }
    }

    fn store_for(server: &ServerGuard) -> RestStore {
        RestStore::new(&server.url(), "test-key").unwrap()
    }

    #[tokio::test]
    async fn insert_returns_the_stored_representation() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", PATH)
            .match_header("apikey", "test-key")
            .match_header("authorization", "Bearer test-key")
            .match_header("prefer", "return=representation")
            .match_body(Matcher::Json(json!([asha()])))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(
                json!([{
                    "id": 42,
                    "full_name": "Asha R",
                    "email": "asha@example.com",
                    "phone_number": "9999999999",
                    "college_name": "",
                    "department": null,
                    "year_semester": "",
                    "event_selection": "Tech Escape",
                    "additional_notes": "",
                    "created_at": "2024-02-01T10:00:00+00:00",
                    "updated_at": "2024-02-01T10:00:00+00:00"
                }])
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let row = store_for(&server).insert(TABLE, &asha()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(row.id, 42);
        assert_eq!(row.full_name, "Asha R");
        assert_eq!(row.department, "");
        assert_eq!(row.event_selection, "Tech Escape");
    }

    #[tokio::test]
    async fn count_reads_the_content_range_total() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", PATH)
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("select".into(), "*".into()),
                Matcher::UrlEncoded("limit".into(), "0".into()),
            ]))
            .match_header("apikey", "test-key")
            .match_header("prefer", "count=exact")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_header("content-range", "*/7")
            .with_body("[]")
            .expect(1)
            .create_async()
            .await;

        let total = store_for(&server).count(TABLE).await.unwrap();

        mock.assert_async().await;
        assert_eq!(total, 7);
    }

    #[tokio::test]
    async fn count_without_content_range_is_an_error() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", PATH)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let err = store_for(&server).count(TABLE).await.unwrap_err();

        assert!(matches!(err, StoreError::Other(_)));
    }

    #[tokio::test]
    async fn missing_table_is_reported_by_every_operation() {
        let mut server = Server::new_async().await;
        let reads = server
            .mock("GET", PATH)
            .match_query(Matcher::Any)
            .with_status(404)
            .with_header("content-type", "application/json")
            .with_body(TABLE_MISSING)
            .expect(2)
            .create_async()
            .await;
        let writes = server
            .mock("POST", PATH)
            .with_status(404)
            .with_header("content-type", "application/json")
            .with_body(TABLE_MISSING)
            .expect(1)
            .create_async()
            .await;
        let store = store_for(&server);

        let count = store.count(TABLE).await.unwrap_err();
        let probe = store.probe(TABLE).await.unwrap_err();
        let insert = store.insert(TABLE, &asha()).await.unwrap_err();

        reads.assert_async().await;
        writes.assert_async().await;
        for err in [count, probe, insert] {
            assert!(err.is_relation_not_found(), "{err:?}");
        }
    }

    #[tokio::test]
    async fn existence_check_passes_on_an_empty_table() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", PATH)
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("select".into(), "id".into()),
                Matcher::UrlEncoded("limit".into(), "1".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .expect(1)
            .create_async()
            .await;

        store_for(&server).probe(TABLE).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn permission_errors_are_not_a_missing_table() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", PATH)
            .with_status(401)
            .with_header("content-type", "application/json")
            .with_body(r#"{"code":"42501","message":"permission denied for table event_registrations"}"#)
            .create_async()
            .await;

        let err = store_for(&server).insert(TABLE, &asha()).await.unwrap_err();

        assert!(!err.is_relation_not_found());
    }
}
