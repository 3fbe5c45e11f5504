//! Page-level flows: saving the day's log, reopening an entry for editing,
//! the dashboard and the remaining activity calls.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::api::{
    Activity, ActivityApi, CurrentUser, MilestoneInsights, NewActivity, Stats, MILESTONE_DAYS,
};
use crate::catalog::keys;
use crate::custom_items::CustomItem;
use crate::errors::{ChecklistError, Result};
use crate::storage::KeyValueStore;
use crate::summary::{decode, encode, EntryRecord};
use crate::utils::persistence::{ensure_dir, write_atomic_bytes};
use crate::wizard::{WizardAnswers, WizardSession};

pub const DEFAULT_ACTIVITY_NAME: &str = "Daily Checklist";
const ENTRY_CACHE_PREFIX: &str = "entry:";
const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn entry_cache_key(activity_id: i64) -> String {
    format!("{ENTRY_CACHE_PREFIX}{activity_id}")
}

/// Locally cached record of one saved entry. The description pins it to the
/// server row it was written for.
#[derive(Debug, Serialize, Deserialize)]
struct CachedEntry {
    description: String,
    record: serde_json::Value,
}

/// Rating 1–5 doubled onto the 0–10 scale; 0 when unrated.
pub fn progress_score(answers: &WizardAnswers) -> u8 {
    answers
        .text(keys::DAY_RATING)
        .and_then(|raw| raw.trim().parse::<u8>().ok())
        .filter(|rating| (1..=5).contains(rating))
        .map_or(0, |rating| rating * 2)
}

/// `2025-01-05` becomes `Jan 5, 2025`; anything unparsable is returned as is.
pub fn format_date_label(raw: &str) -> String {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map(|date| date.format("%b %-d, %Y").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

#[derive(Clone, Debug, PartialEq)]
pub struct TrendPoint {
    pub label: String,
    pub score: f64,
}

pub fn trend_series(stats: &Stats) -> Vec<TrendPoint> {
    stats
        .activities_by_date
        .iter()
        .map(|point| TrendPoint {
            label: format_date_label(&point.date),
            score: point.avg_score.unwrap_or(0.0),
        })
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DateIndicator {
    Today,
    Past,
    Future,
}

impl DateIndicator {
    pub fn for_date(date: NaiveDate, today: NaiveDate) -> Self {
        match date.cmp(&today) {
            std::cmp::Ordering::Equal => DateIndicator::Today,
            std::cmp::Ordering::Less => DateIndicator::Past,
            std::cmp::Ordering::Greater => DateIndicator::Future,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DateIndicator::Today => "📅 Today",
            DateIndicator::Past => "📆 Past Entry",
            DateIndicator::Future => "🔮 Future Date",
        }
    }
}

pub fn shift_date(date: NaiveDate, days: i64) -> NaiveDate {
    date.checked_add_signed(Duration::days(days)).unwrap_or(date)
}

pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| ChecklistError::InvalidInput(format!("`{raw}` is not a YYYY-MM-DD date")))
}

pub fn export_file_name(now: NaiveDateTime) -> String {
    format!("neural_log_export_{}.xlsx", now.format("%Y%m%d_%H%M%S"))
}

/// Where the answers of a reopened entry came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnswerSource {
    Server,
    LocalCache,
    Summary,
}

#[derive(Clone, Debug, PartialEq)]
pub enum LoadOutcome {
    Loaded {
        activity_id: i64,
        source: AnswerSource,
    },
    Fresh,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub id: Option<i64>,
    /// Previous entry for the same date that was removed after saving.
    pub replaced: Option<i64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Dashboard {
    pub user: CurrentUser,
    pub stats: Stats,
    pub trend: Vec<TrendPoint>,
}

pub struct DailyLog<A: ActivityApi> {
    api: A,
    store: Arc<dyn KeyValueStore>,
    activity_name: String,
}

impl<A: ActivityApi> DailyLog<A> {
    pub fn new(api: A, store: Arc<dyn KeyValueStore>, activity_name: impl Into<String>) -> Self {
        Self {
            api,
            store,
            activity_name: activity_name.into(),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn build_submission(
        &self,
        date: NaiveDate,
        answers: &WizardAnswers,
        items: &[CustomItem],
    ) -> NewActivity {
        NewActivity {
            date: date.format(DATE_FORMAT).to_string(),
            activity_name: self.activity_name.clone(),
            description: encode(answers, items),
            duration: 0,
            progress_score: progress_score(answers),
            notes: answers.text(keys::NOTES).unwrap_or_default().to_string(),
            checklist: Some(EntryRecord::new(answers.clone())),
        }
    }

    /// Sends the session's answers for `date`. On success the structured
    /// record is cached, the entry being edited (if any) is replaced and the
    /// session is reset. On failure the session is left as it was.
    pub fn submit(
        &self,
        date: NaiveDate,
        session: &mut WizardSession,
        items: &[CustomItem],
        replacing: Option<i64>,
    ) -> Result<SubmitOutcome> {
        let body = self.build_submission(date, session.answers(), items);
        let id = self.api.create_activity(&body).map_err(|err| {
            error!(%date, error = %err, "saving daily log failed");
            err
        })?;

        match (id, &body.checklist) {
            (Some(id), Some(record)) => self.cache_record(id, &body.description, record),
            _ => debug!(%date, "server returned no id; entry record not cached"),
        }

        let replaced = match replacing {
            Some(old) if Some(old) != id => match self.api.delete_activity(old) {
                Ok(()) => {
                    self.forget_record(old);
                    Some(old)
                }
                Err(err) => {
                    warn!(old, error = %err, "previous entry could not be removed");
                    None
                }
            },
            _ => None,
        };

        session.reset();
        info!(%date, ?id, ?replaced, score = body.progress_score, "daily log saved");
        Ok(SubmitOutcome { id, replaced })
    }

    /// Pre-fills the session with the first entry stored for `date`, or resets
    /// it for a new entry when there is none.
    pub fn load_for_date(
        &self,
        date: NaiveDate,
        session: &mut WizardSession,
        items: &[CustomItem],
    ) -> Result<LoadOutcome> {
        let wanted = date.format(DATE_FORMAT).to_string();
        let activities = self.api.activities()?;
        match activities.iter().find(|activity| activity.date == wanted) {
            Some(activity) => {
                let (answers, source) = self.answers_from_activity(activity, items);
                session.load(answers);
                info!(%date, id = activity.id, ?source, "entry loaded for editing");
                Ok(LoadOutcome::Loaded {
                    activity_id: activity.id,
                    source,
                })
            }
            None => {
                session.reset();
                Ok(LoadOutcome::Fresh)
            }
        }
    }

    /// Structured record from the server, then from the local cache, then a
    /// best-effort parse of the summary text.
    pub fn answers_from_activity(
        &self,
        activity: &Activity,
        items: &[CustomItem],
    ) -> (WizardAnswers, AnswerSource) {
        if let Some(record) = activity.checklist.as_ref().and_then(EntryRecord::from_value) {
            return (record.answers, AnswerSource::Server);
        }
        if let Some(record) = self.cached_record(activity) {
            return (record.answers, AnswerSource::LocalCache);
        }

        let mut answers = decode(activity.description(), items);
        if answers.text(keys::DAY_RATING).is_none() {
            let score = activity.progress_score.unwrap_or(0);
            if score > 0 {
                let rating = ((score as f64) / 2.0).round().clamp(1.0, 5.0) as u8;
                answers.set(keys::DAY_RATING, rating.to_string());
            }
        }
        if !activity.notes().trim().is_empty() {
            answers.set(keys::NOTES, activity.notes());
        }
        (answers, AnswerSource::Summary)
    }

    fn cache_record(&self, id: i64, description: &str, record: &EntryRecord) {
        let cached = serde_json::to_value(record)
            .and_then(|record| {
                serde_json::to_string(&CachedEntry {
                    description: description.to_string(),
                    record,
                })
            })
            .map_err(ChecklistError::from)
            .and_then(|json| self.store.set(&entry_cache_key(id), &json));
        if let Err(err) = cached {
            warn!(id, error = %err, "could not cache entry record");
        }
    }

    /// The cached record for `activity`, only if it was written for this very
    /// row and its description is unchanged.
    fn cached_record(&self, activity: &Activity) -> Option<EntryRecord> {
        let raw = match self.store.get(&entry_cache_key(activity.id)) {
            Ok(raw) => raw?,
            Err(err) => {
                warn!(id = activity.id, error = %err, "entry cache unreadable");
                return None;
            }
        };
        let entry: CachedEntry = serde_json::from_str(&raw).ok()?;
        if entry.description != activity.description() {
            debug!(id = activity.id, "cached record does not match the stored summary");
            return None;
        }
        EntryRecord::from_value(&entry.record)
    }

    fn forget_record(&self, id: i64) {
        if let Err(err) = self.store.remove(&entry_cache_key(id)) {
            warn!(id, error = %err, "could not drop cached entry record");
        }
    }

    pub fn recent_activities(&self, limit: usize) -> Result<Vec<Activity>> {
        let mut activities = self.api.activities()?;
        activities.truncate(limit);
        Ok(activities)
    }

    pub fn delete_activity(&self, id: i64) -> Result<()> {
        self.api.delete_activity(id).map_err(|err| {
            error!(id, error = %err, "deleting entry failed");
            err
        })?;
        self.forget_record(id);
        Ok(())
    }

    pub fn dashboard(&self) -> Result<Dashboard> {
        let user = self.api.current_user()?;
        let stats = self.api.stats()?;
        let trend = trend_series(&stats);
        Ok(Dashboard { user, stats, trend })
    }

    pub fn milestone(&self, days: u32) -> Result<MilestoneInsights> {
        if !MILESTONE_DAYS.contains(&days) {
            return Err(ChecklistError::InvalidInput(format!(
                "milestone must be one of {MILESTONE_DAYS:?}"
            )));
        }
        self.api.milestone(days)
    }

    /// Downloads the workbook into `dir` and returns the written path.
    pub fn export_excel(&self, dir: &Path, now: NaiveDateTime) -> Result<PathBuf> {
        let export = self.api.export_excel()?;
        let name = export
            .filename
            .filter(|name| !name.contains(['/', '\\']))
            .unwrap_or_else(|| export_file_name(now));
        ensure_dir(dir)?;
        let path = dir.join(name);
        write_atomic_bytes(&path, &export.bytes)?;
        info!(path = %path.display(), "export written");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, DATE_FORMAT).unwrap()
    }

    #[test]
    fn progress_score_doubles_valid_ratings_only() {
        let mut answers = WizardAnswers::new();
        assert_eq!(progress_score(&answers), 0);
        for rating in 1..=5u8 {
            answers.set(keys::DAY_RATING, rating.to_string());
            assert_eq!(progress_score(&answers), rating * 2);
        }
        answers.set(keys::DAY_RATING, "9");
        assert_eq!(progress_score(&answers), 0);
        answers.set(keys::DAY_RATING, "");
        assert_eq!(progress_score(&answers), 0);
    }

    #[test]
    fn trend_labels_and_missing_scores() {
        let stats: Stats = serde_json::from_str(
            r#"{"activities_by_date":[
                {"date":"2025-01-05","count":1,"avg_score":8.0},
                {"date":"2025-01-06","count":1,"avg_score":null}]}"#,
        )
        .unwrap();
        let trend = trend_series(&stats);
        assert_eq!(trend[0].label, "Jan 5, 2025");
        assert_eq!(trend[0].score, 8.0);
        assert_eq!(trend[1].score, 0.0);
        assert_eq!(format_date_label("not-a-date"), "not-a-date");
    }

    #[test]
    fn date_helpers() {
        let today = date("2025-03-01");
        assert_eq!(DateIndicator::for_date(today, today), DateIndicator::Today);
        assert_eq!(
            DateIndicator::for_date(shift_date(today, -1), today),
            DateIndicator::Past
        );
        assert_eq!(shift_date(today, -1), date("2025-02-28"));
        assert_eq!(
            DateIndicator::for_date(shift_date(today, 1), today),
            DateIndicator::Future
        );
        assert!(parse_date("03/01/2025").is_err());
        assert_eq!(entry_cache_key(42), "entry:42");
    }

    #[test]
    fn export_name_uses_timestamp() {
        let now = date("2025-01-05").and_hms_opt(8, 30, 15).unwrap();
        assert_eq!(export_file_name(now), "neural_log_export_20250105_083015.xlsx");
    }
}
