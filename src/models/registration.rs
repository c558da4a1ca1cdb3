use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// Older tables were provisioned with nullable optional columns.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// A stored row of `event_registrations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationRow {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub college_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub department: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub year_semester: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub event_selection: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub additional_notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Submission as received from a client. Every attribute may be absent;
/// unknown attributes are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationPayload {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub college_name: Option<String>,
    pub department: Option<String>,
    pub year_semester: Option<String>,
    pub event_selection: Option<String>,
    pub additional_notes: Option<String>,
}

/// Validated row ready for insertion. `id` and timestamps are left to storage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewRegistration {
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub college_name: String,
    pub department: String,
    pub year_semester: String,
    pub event_selection: String,
    pub additional_notes: String,
}

impl NewRegistration {
    pub fn into_row(self, id: i64, now: DateTime<Utc>) -> RegistrationRow {
        RegistrationRow {
            id,
            full_name: self.full_name,
            email: self.email,
            phone_number: self.phone_number,
            college_name: self.college_name,
            department: self.department,
            year_semester: self.year_semester,
            event_selection: self.event_selection,
            additional_notes: self.additional_notes,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_ignores_unknown_fields_and_defaults_missing_ones() {
        let payload: RegistrationPayload = serde_json::from_str(
            r#"{"full_name":"Asha R","email":"asha@example.com","team":"blue"}"#,
        )
        .unwrap();

        assert_eq!(payload.full_name.as_deref(), Some("Asha R"));
        assert_eq!(payload.phone_number, None);
        assert_eq!(payload.additional_notes, None);
    }

    #[test]
    fn row_deserializes_rest_representation() {
        let row: RegistrationRow = serde_json::from_str(
            r#"{
                "id": 7,
                "full_name": "Asha R",
                "email": "asha@example.com",
                "phone_number": "9999999999",
                "college_name": "",
                "department": "",
                "year_semester": "",
                "event_selection": "Tech Escape",
                "additional_notes": null,
                "created_at": "2026-02-01T10:15:00.123456+00:00",
                "updated_at": "2026-02-01T10:15:00.123456+00:00"
            }"#,
        )
        .unwrap_or_else(|e| panic!("row should parse: {e}"));

        assert_eq!(row.id, 7);
        assert_eq!(row.event_selection, "Tech Escape");
        assert_eq!(row.additional_notes, "");
    }
}
