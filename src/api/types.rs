use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::summary::EntryRecord;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    #[serde(default)]
    pub user_id: Option<i64>,
    pub username: String,
    #[serde(default)]
    pub is_admin: bool,
}

/// One point of the per-date series returned by `/api/stats`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DateScore {
    pub date: String,
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub avg_score: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stats {
    pub total_days: u32,
    pub total_activities: u32,
    pub avg_score: f64,
    pub activities_by_date: Vec<DateScore>,
}

/// A stored daily entry as the server returns it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: i64,
    pub date: String,
    pub activity_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub duration: Option<i64>,
    #[serde(default)]
    pub progress_score: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Structured answers, present when the server keeps unknown fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checklist: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Activity {
    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }

    pub fn notes(&self) -> &str {
        self.notes.as_deref().unwrap_or_default()
    }
}

/// Body of `POST /api/activities`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewActivity {
    pub date: String,
    pub activity_name: String,
    pub description: String,
    pub duration: i64,
    pub progress_score: u8,
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checklist: Option<EntryRecord>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Created {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub id: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MilestoneInsights {
    pub milestone_day: u32,
    pub total_activities: u32,
    pub avg_progress_score: f64,
    pub unique_activity_types: u32,
    pub total_duration_hours: f64,
    pub activity_distribution: BTreeMap<String, u32>,
}

/// Downloaded workbook.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportFile {
    /// Name from `Content-Disposition`, when the server sent one.
    pub filename: Option<String>,
    pub bytes: Vec<u8>,
}

/// `GET /api/activities` answers with a bare array; older builds wrapped it.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum ActivitiesPayload {
    Bare(Vec<Activity>),
    Wrapped { activities: Vec<Activity> },
}

impl ActivitiesPayload {
    pub fn into_vec(self) -> Vec<Activity> {
        match self {
            ActivitiesPayload::Bare(activities) => activities,
            ActivitiesPayload::Wrapped { activities } => activities,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AuthResponse {
    pub success: bool,
    pub username: Option<String>,
    pub is_admin: bool,
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activities_accept_both_payload_shapes() {
        let bare = r#"[{"id":1,"date":"2025-01-05","activity_name":"Daily Checklist",
            "description":"⏰ Woke up: After 07:30","duration":0,"progress_score":8,"notes":null,
            "user_id":3,"created_at":"2025-01-05 08:00:00"}]"#;
        let wrapped = r#"{"activities":[{"id":2,"date":"2025-01-06","activity_name":"Run"}]}"#;

        let bare: ActivitiesPayload = serde_json::from_str(bare).unwrap();
        let bare = bare.into_vec();
        assert_eq!(bare[0].progress_score, Some(8));
        assert_eq!(bare[0].notes(), "");

        let wrapped: ActivitiesPayload = serde_json::from_str(wrapped).unwrap();
        let wrapped = wrapped.into_vec();
        assert_eq!(wrapped[0].id, 2);
        assert_eq!(wrapped[0].description(), "");
    }

    #[test]
    fn stats_tolerate_null_averages() {
        let raw = r#"{"total_days":2,"total_activities":3,"avg_score":7.5,
            "activities_by_date":[{"date":"2025-01-05","count":2,"avg_score":null}]}"#;
        let stats: Stats = serde_json::from_str(raw).unwrap();
        assert_eq!(stats.activities_by_date[0].avg_score, None);
        assert_eq!(stats.total_activities, 3);
    }

    #[test]
    fn new_activity_omits_missing_checklist() {
        let body = NewActivity {
            date: "2025-01-05".into(),
            activity_name: "Daily Checklist".into(),
            description: String::new(),
            duration: 0,
            progress_score: 0,
            notes: String::new(),
            checklist: None,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert!(value.get("checklist").is_none());
        assert_eq!(value["progress_score"], 0);
    }
}
