#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use daily_checklist::{
    api::{
        Activity, ActivityApi, CurrentUser, DateScore, ExportFile, MilestoneInsights,
        NewActivity, Stats, MILESTONE_DAYS,
    },
    catalog::build_catalog,
    custom_items::CustomItem,
    errors::{ChecklistError, Result},
    storage::{KeyValueStore, MemoryStore},
    time::ManualClock,
    wizard::{WizardSession, WizardTimings},
};
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Creates an isolated data directory for one test.
pub fn setup_test_env() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

pub fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("valid test date")
}

pub fn memory_store() -> Arc<dyn KeyValueStore> {
    Arc::new(MemoryStore::new())
}

/// Session with zero delays, so every transition fires immediately.
pub fn instant_session(items: &[CustomItem]) -> WizardSession {
    let timings = WizardTimings {
        auto_advance: std::time::Duration::ZERO,
        transition: std::time::Duration::ZERO,
    };
    WizardSession::new(
        build_catalog(items),
        timings,
        Arc::new(ManualClock::new(date("2025-01-05"))),
    )
}

#[derive(Default)]
pub struct FakeState {
    pub activities: Vec<Activity>,
    pub next_id: i64,
    /// Every call fails with a network error.
    pub offline: bool,
    /// Store the structured record the way an updated server would.
    pub keep_checklist: bool,
}

/// In-memory stand-in for the activity service, aggregating like the real one.
#[derive(Default)]
pub struct FakeApi {
    pub state: Mutex<FakeState>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keeping_checklist() -> Self {
        let api = Self::default();
        api.state.lock().unwrap().keep_checklist = true;
        api
    }

    pub fn set_offline(&self, offline: bool) {
        self.state.lock().unwrap().offline = offline;
    }

    pub fn insert(&self, date: &str, description: &str, score: i64, notes: &str) -> i64 {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = state.next_id;
        state.activities.push(Activity {
            id,
            date: date.to_string(),
            activity_name: "Daily Checklist".into(),
            description: Some(description.to_string()),
            duration: Some(0),
            progress_score: Some(score),
            notes: Some(notes.to_string()),
            checklist: None,
            created_at: None,
        });
        id
    }

    pub fn stored(&self) -> Vec<Activity> {
        self.state.lock().unwrap().activities.clone()
    }

    fn online(&self) -> Result<std::sync::MutexGuard<'_, FakeState>> {
        let state = self.state.lock().unwrap();
        if state.offline {
            return Err(ChecklistError::Network("connection refused".into()));
        }
        Ok(state)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl ActivityApi for FakeApi {
    fn current_user(&self) -> Result<CurrentUser> {
        self.online()?;
        Ok(CurrentUser {
            user_id: Some(1),
            username: "tester".into(),
            is_admin: false,
        })
    }

    fn stats(&self) -> Result<Stats> {
        let state = self.online()?;
        let days: BTreeSet<&str> = state.activities.iter().map(|a| a.date.as_str()).collect();
        let scored: Vec<f64> = state
            .activities
            .iter()
            .filter_map(|a| a.progress_score.filter(|score| *score > 0))
            .map(|score| score as f64)
            .collect();
        let avg_score = if scored.is_empty() {
            0.0
        } else {
            round2(scored.iter().sum::<f64>() / scored.len() as f64)
        };

        let mut by_date: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
        for activity in &state.activities {
            by_date
                .entry(activity.date.as_str())
                .or_default()
                .push(activity.progress_score.unwrap_or(0) as f64);
        }
        let activities_by_date = by_date
            .into_iter()
            .map(|(date, scores)| DateScore {
                date: date.to_string(),
                count: scores.len() as u32,
                avg_score: Some(scores.iter().sum::<f64>() / scores.len() as f64),
            })
            .collect();

        Ok(Stats {
            total_days: days.len() as u32,
            total_activities: state.activities.len() as u32,
            avg_score,
            activities_by_date,
        })
    }

    fn activities(&self) -> Result<Vec<Activity>> {
        let state = self.online()?;
        let mut activities = state.activities.clone();
        activities.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        Ok(activities)
    }

    fn create_activity(&self, activity: &NewActivity) -> Result<Option<i64>> {
        let mut state = self.online()?;
        state.next_id += 1;
        let id = state.next_id;
        let checklist = if state.keep_checklist {
            activity
                .checklist
                .as_ref()
                .and_then(|record| serde_json::to_value(record).ok())
        } else {
            None
        };
        state.activities.push(Activity {
            id,
            date: activity.date.clone(),
            activity_name: activity.activity_name.clone(),
            description: Some(activity.description.clone()),
            duration: Some(activity.duration),
            progress_score: Some(i64::from(activity.progress_score)),
            notes: Some(activity.notes.clone()),
            checklist,
            created_at: None,
        });
        Ok(Some(id))
    }

    fn delete_activity(&self, id: i64) -> Result<()> {
        let mut state = self.online()?;
        let before = state.activities.len();
        state.activities.retain(|activity| activity.id != id);
        if state.activities.len() == before {
            return Err(ChecklistError::Api {
                status: 404,
                message: "Activity not found".into(),
            });
        }
        Ok(())
    }

    fn milestone(&self, days: u32) -> Result<MilestoneInsights> {
        let state = self.online()?;
        if !MILESTONE_DAYS.contains(&days) {
            return Err(ChecklistError::Api {
                status: 400,
                message: "Invalid milestone day".into(),
            });
        }
        let total = state.activities.len() as u32;
        let score_sum: i64 = state
            .activities
            .iter()
            .filter_map(|a| a.progress_score)
            .sum();
        let duration: i64 = state.activities.iter().filter_map(|a| a.duration).sum();
        let mut distribution = BTreeMap::new();
        for activity in &state.activities {
            *distribution.entry(activity.activity_name.clone()).or_insert(0) += 1;
        }
        Ok(MilestoneInsights {
            milestone_day: days,
            total_activities: total,
            avg_progress_score: round2(score_sum as f64 / f64::from(total.max(1))),
            unique_activity_types: distribution.len() as u32,
            total_duration_hours: round2(duration as f64 / 60.0),
            activity_distribution: distribution,
        })
    }

    fn export_excel(&self) -> Result<ExportFile> {
        let state = self.online()?;
        Ok(ExportFile {
            filename: None,
            bytes: format!("PK{} rows", state.activities.len()).into_bytes(),
        })
    }
}
