use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::role::{self, Role};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    pub date: String,
    #[serde(default)]
    pub volunteers: Vec<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
}

impl Event {
    pub fn starts_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.date)
    }

    pub fn has_volunteer(&self, email: &str) -> bool {
        self.volunteers.iter().any(|v| v.eq_ignore_ascii_case(email))
    }
}

/// Payload for creating or editing an event from the admin dashboard.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct EventDraft {
    pub title: String,
    pub description: String,
    pub location: String,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volunteers: Option<Vec<String>>,
}

impl EventDraft {
    /// Editable fields of an existing event. The date is cut to `YYYY-MM-DD`
    /// when it parses; volunteers are left out so an edit never resets them.
    pub fn from_event(event: &Event) -> Self {
        Self {
            title: event.title.clone(),
            description: event.description.clone(),
            location: event.location.clone(),
            date: event
                .starts_at()
                .map(|t| t.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| event.date.clone()),
            image: event.image.clone(),
            created_by: event.created_by.clone(),
            volunteers: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DonationStatus {
    Succeeded,
    #[default]
    Pending,
    Failed,
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Donation {
    #[serde(rename = "_id")]
    pub id: String,
    pub donor_email: String,
    #[serde(default)]
    pub donor_name: Option<String>,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: DonationStatus,
    pub donated_at: String,
}

impl DonationStatus {
    pub fn label(&self) -> &'static str {
        match self {
            DonationStatus::Succeeded => "Succeeded",
            DonationStatus::Pending => "Pending",
            DonationStatus::Failed => "Failed",
            DonationStatus::Unknown => "Unknown",
        }
    }
}

impl Donation {
    pub fn donated_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.donated_at)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewDonation {
    pub donor_email: String,
    pub donor_name: Option<String>,
    pub amount: f64,
    pub message: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default, deserialize_with = "role::lenient")]
    pub role: Option<Role>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl User {
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at.as_deref().and_then(parse_timestamp)
    }
}

/// Record posted to `/users` after a successful sign-in.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub photo: Option<String>,
    pub role: Role,
    pub created_at: String,
}

/// Body of `GET /users/role/{email}`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct RoleResponse {
    #[serde(default, deserialize_with = "role::lenient")]
    pub role: Option<Role>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: String,
    pub event_id: String,
    pub user_email: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub user_photo: Option<String>,
    pub content: String,
    pub created_at: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub event_id: String,
    pub user_email: String,
    pub user_name: String,
    pub user_photo: Option<String>,
    pub content: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub photo: Option<String>,
    pub event_count: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DonorWallEntry {
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub photo: Option<String>,
    pub total_amount: f64,
    #[serde(default)]
    pub donation_count: u32,
    #[serde(default)]
    pub last_donation: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Accepts RFC 3339 timestamps and bare `YYYY-MM-DD` dates (taken as midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    #[test]
    fn event_decodes_backend_shape() {
        let raw = json!({
            "_id": "e1",
            "title": "Beach cleanup",
            "description": "Bring gloves",
            "location": "Cox's Bazar",
            "date": "2025-03-14",
            "volunteers": ["a@x.org", "B@x.org"],
            "image": null,
            "createdBy": "admin@x.org"
        });
        let event: Event = serde_json::from_value(raw).unwrap();
        assert_eq!(event.id, "e1");
        assert_eq!(event.created_by.as_deref(), Some("admin@x.org"));
        assert!(event.has_volunteer("b@x.org"));
        assert_eq!(event.starts_at().unwrap().day(), 14);
    }

    #[test]
    fn edit_draft_keeps_volunteers_out_of_the_payload() {
        let event: Event = serde_json::from_value(json!({
            "_id": "e3",
            "title": "Tree planting",
            "location": "Sylhet",
            "date": "2025-05-20T08:00:00.000Z",
            "volunteers": ["a@x.org"],
            "createdBy": "admin@x.org"
        }))
        .unwrap();
        let draft = EventDraft::from_event(&event);
        assert_eq!(draft.date, "2025-05-20");
        assert_eq!(draft.volunteers, None);

        let body = serde_json::to_value(&draft).unwrap();
        assert!(body.get("volunteers").is_none());
        assert_eq!(body["createdBy"], "admin@x.org");
    }

    #[test]
    fn event_without_volunteers_defaults_to_empty() {
        let event: Event =
            serde_json::from_value(json!({"_id": "e2", "title": "t", "date": "2025-01-01"}))
                .unwrap();
        assert!(event.volunteers.is_empty());
    }

    #[test]
    fn donation_status_tolerates_unknown_values() {
        let donation: Donation = serde_json::from_value(json!({
            "_id": "d1",
            "donorEmail": "d@x.org",
            "amount": 25.5,
            "status": "refunded",
            "donatedAt": "2025-02-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(donation.status, DonationStatus::Unknown);
        assert_eq!(donation.donated_at().unwrap().hour(), 10);
    }

    #[test]
    fn user_with_unrecognised_role_has_no_role() {
        let user: User = serde_json::from_value(json!({
            "_id": "u1",
            "name": "Rin",
            "email": "rin@x.org",
            "role": "superuser"
        }))
        .unwrap();
        assert_eq!(user.role, None);
    }

    #[test]
    fn user_role_is_case_insensitive() {
        let user: User = serde_json::from_value(json!({
            "_id": "u1",
            "email": "rin@x.org",
            "role": "Volunteer"
        }))
        .unwrap();
        assert_eq!(user.role, Some(Role::Volunteer));
    }

    #[test]
    fn missing_required_field_is_rejected() {
        let result = serde_json::from_value::<Comment>(json!({"_id": "c1", "content": "hi"}));
        assert!(result.is_err());
    }

    #[test]
    fn parses_both_timestamp_shapes() {
        assert!(parse_timestamp("2024-12-31T23:59:59.000Z").is_some());
        assert!(parse_timestamp("2024-12-31").is_some());
        assert!(parse_timestamp("next tuesday").is_none());
    }
}
