//! One-line text summary of a day's answers, plus the structured record sent
//! alongside it.
//!
//! The summary is a display artifact. [`decode`] recovers what it can by
//! pattern matching and is only used for entries saved without an
//! [`EntryRecord`].

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{keys, rating_face, FollowUpKind, YES};
use crate::custom_items::{CustomItem, CustomItemKind};
use crate::wizard::{AnswerValue, WizardAnswers};

pub const SEPARATOR: &str = " | ";
pub const ENTRY_RECORD_VERSION: u32 = 1;

/// Built-in yes/no lines: answer key, follow-up key, line prefix.
const YES_NO_LINES: [(&str, &str, &str); 3] = [
    (keys::COFFEE, keys::COFFEE_TIME, "☕ Coffee"),
    (keys::BREAKFAST, keys::BREAKFAST_TIME, "🍳 Breakfast"),
    (keys::EXERCISE, keys::EXERCISE_TYPE, "💪 Exercise"),
];

static WAKE_RE: Lazy<Regex> = Lazy::new(|| field_pattern("⏰ Woke up"));
static LUNCH_RE: Lazy<Regex> = Lazy::new(|| field_pattern("🍱 Lunch"));
static DINNER_RE: Lazy<Regex> = Lazy::new(|| field_pattern("🍽️ Dinner"));
static YES_NO_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    YES_NO_LINES
        .iter()
        .map(|(_, _, prefix)| {
            Regex::new(&format!(r"{}: ([^(|]+)(?:\(([^)]+)\))?", regex::escape(prefix))).unwrap()
        })
        .collect()
});
static RATING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"⭐ Day Rating: [^|(]*\((\d+)/5\)").unwrap());
static OUT_OF_FIVE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\((\d+)/5\)").unwrap());
static WITH_DETAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^(]+?)\s*\(([^)]*)\)$").unwrap());

fn field_pattern(prefix: &str) -> Regex {
    Regex::new(&format!(r"{}: ([^|]+)", regex::escape(prefix))).unwrap()
}

/// Structured copy of the answers, stored next to the summary so an entry can
/// be reopened without parsing text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryRecord {
    pub version: u32,
    pub answers: WizardAnswers,
}

impl EntryRecord {
    pub fn new(answers: WizardAnswers) -> Self {
        Self {
            version: ENTRY_RECORD_VERSION,
            answers,
        }
    }

    /// Accepts records of the current version only.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        let record: EntryRecord = serde_json::from_value(value.clone()).ok()?;
        (record.version == ENTRY_RECORD_VERSION).then_some(record)
    }

    pub fn from_json(raw: &str) -> Option<Self> {
        let value: serde_json::Value = serde_json::from_str(raw).ok()?;
        Self::from_value(&value)
    }
}

fn rating_text(raw: &str) -> Option<String> {
    let rating: u8 = raw.trim().parse().ok()?;
    rating_face(rating).map(|face| format!("{face} ({rating}/5)"))
}

fn with_follow_up(answer: &str, follow_up: Option<String>) -> String {
    match follow_up {
        Some(detail) if answer == YES && !detail.trim().is_empty() => format!("{answer} ({detail})"),
        _ => answer.to_string(),
    }
}

fn custom_value(item: &CustomItem, answers: &WizardAnswers) -> Option<String> {
    let answer = answers.text(&item.step_key())?;
    match item.kind {
        CustomItemKind::Rating => rating_text(answer),
        CustomItemKind::YesNo if item.follow_up.is_some() => {
            let detail = answers.get(&item.follow_up_key()).map(AnswerValue::display);
            Some(with_follow_up(answer, detail))
        }
        _ => Some(answer.to_string()),
    }
}

/// Renders the answered questions as `"<icon> <label>: <value>"` parts joined
/// by [`SEPARATOR`]. Notes are not included.
pub fn encode(answers: &WizardAnswers, items: &[CustomItem]) -> String {
    let mut parts = Vec::new();

    if let Some(wake) = answers.text(keys::WAKE_TIME) {
        parts.push(format!("⏰ Woke up: {wake}"));
    }
    for (key, follow_up_key, prefix) in YES_NO_LINES {
        if let Some(answer) = answers.text(key) {
            let detail = answers.get(follow_up_key).map(AnswerValue::display);
            parts.push(format!("{prefix}: {}", with_follow_up(answer, detail)));
        }
    }
    if let Some(lunch) = answers.text(keys::LUNCH) {
        parts.push(format!("🍱 Lunch: {lunch}"));
    }
    if let Some(dinner) = answers.text(keys::DINNER) {
        parts.push(format!("🍽️ Dinner: {dinner}"));
    }
    for item in items {
        if let Some(value) = custom_value(item, answers) {
            parts.push(format!("{} {}: {}", item.icon, item.name, value));
        }
    }
    if let Some(rating) = answers.text(keys::DAY_RATING).and_then(rating_text) {
        parts.push(format!("⭐ Day Rating: {rating}"));
    }

    parts.join(SEPARATOR)
}

/// Best-effort inverse of [`encode`]. Parts that do not match are left unset.
pub fn decode(text: &str, items: &[CustomItem]) -> WizardAnswers {
    let mut answers = WizardAnswers::new();

    let capture_into = |re: &Regex, key: &str, answers: &mut WizardAnswers| {
        if let Some(value) = re.captures(text).and_then(|caps| caps.get(1)) {
            answers.set(key, value.as_str().trim());
        }
    };
    capture_into(&WAKE_RE, keys::WAKE_TIME, &mut answers);
    capture_into(&LUNCH_RE, keys::LUNCH, &mut answers);
    capture_into(&DINNER_RE, keys::DINNER, &mut answers);

    for ((key, follow_up_key, _), re) in YES_NO_LINES.iter().zip(YES_NO_RES.iter()) {
        let Some(caps) = re.captures(text) else {
            continue;
        };
        if let Some(answer) = caps.get(1) {
            answers.set(*key, answer.as_str().trim());
        }
        if let Some(detail) = caps.get(2) {
            answers.set(*follow_up_key, detail.as_str().trim());
        }
    }

    if let Some(rating) = RATING_RE.captures(text).and_then(|caps| caps.get(1)) {
        answers.set(keys::DAY_RATING, rating.as_str());
    }

    for item in items {
        decode_custom(text, item, &mut answers);
    }

    debug!(recovered = answers.len(), "summary decoded");
    answers
}

fn decode_custom(text: &str, item: &CustomItem, answers: &mut WizardAnswers) {
    let pattern = format!(
        r"(?i){}\s*{}:\s*([^|]+)",
        regex::escape(&item.icon),
        regex::escape(&item.name)
    );
    let Ok(re) = Regex::new(&pattern) else {
        return;
    };
    let Some(raw) = re.captures(text).and_then(|caps| caps.get(1)) else {
        return;
    };
    let raw = raw.as_str().trim();

    match (&item.kind, &item.follow_up) {
        (CustomItemKind::Rating, _) => {
            let rating = OUT_OF_FIVE_RE
                .captures(raw)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str())
                .unwrap_or(raw);
            answers.set(item.step_key(), rating);
        }
        (CustomItemKind::YesNo, Some(follow_up)) => match WITH_DETAIL_RE.captures(raw) {
            Some(caps) => {
                let answer = caps.get(1).map_or("", |m| m.as_str()).trim();
                let detail = caps.get(2).map_or("", |m| m.as_str()).trim();
                answers.set(item.step_key(), answer);
                let value = match follow_up.kind {
                    FollowUpKind::MultiSelect => AnswerValue::Many(
                        detail
                            .split(',')
                            .map(str::trim)
                            .filter(|part| !part.is_empty())
                            .map(str::to_string)
                            .collect(),
                    ),
                    FollowUpKind::SingleSelect => AnswerValue::Text(detail.to_string()),
                };
                answers.set(item.follow_up_key(), value);
            }
            None => answers.set(item.step_key(), raw),
        },
        _ => answers.set(item.step_key(), raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::custom_items::CustomFollowUp;

    const EXAMPLE: &str = "⏰ Woke up: 05:30 - 06:30 | ☕ Coffee: Yes (Within 30 min) | 🍱 Lunch: Yes - Home cooked | ⭐ Day Rating: 😊 (4/5)";

    fn example_answers() -> WizardAnswers {
        let mut answers = WizardAnswers::new();
        answers.set(keys::WAKE_TIME, "05:30 - 06:30");
        answers.set(keys::COFFEE, "Yes");
        answers.set(keys::COFFEE_TIME, "Within 30 min");
        answers.set(keys::LUNCH, "Yes - Home cooked");
        answers.set(keys::DAY_RATING, "4");
        answers
    }

    #[test]
    fn encodes_answered_questions_in_fixed_order() {
        assert_eq!(encode(&example_answers(), &[]), EXAMPLE);
    }

    #[test]
    fn decodes_the_encoded_example() {
        let decoded = decode(EXAMPLE, &[]);
        assert_eq!(decoded.text(keys::WAKE_TIME), Some("05:30 - 06:30"));
        assert_eq!(decoded.text(keys::COFFEE), Some("Yes"));
        assert_eq!(decoded.text(keys::COFFEE_TIME), Some("Within 30 min"));
        assert_eq!(decoded.text(keys::LUNCH), Some("Yes - Home cooked"));
        assert_eq!(decoded.text(keys::DAY_RATING), Some("4"));
        assert!(decoded.get(keys::BREAKFAST).is_none());
    }

    #[test]
    fn notes_and_blank_answers_are_omitted() {
        let mut answers = WizardAnswers::new();
        answers.set(keys::NOTES, "quiet day");
        answers.set(keys::DINNER, "  ");
        answers.set(keys::EXERCISE, "No");
        answers.set(keys::EXERCISE_TYPE, "Cardio");
        assert_eq!(encode(&answers, &[]), "💪 Exercise: No");
    }

    #[test]
    fn custom_items_sit_between_dinner_and_rating() {
        let energy = CustomItem::new("Energy", "⚡", CustomItemKind::Rating);
        let supplements = CustomItem::new("Supplements", "💊", CustomItemKind::YesNo)
            .with_follow_up(CustomFollowUp::new(
                "Which ones?",
                FollowUpKind::MultiSelect,
                vec!["Zinc".into(), "Omega 3".into()],
            ));
        let items = vec![energy.clone(), supplements.clone()];

        let mut answers = WizardAnswers::new();
        answers.set(keys::DINNER, "Yes - Outside");
        answers.set(keys::DAY_RATING, "5");
        answers.set(energy.step_key(), "2");
        answers.set(supplements.step_key(), "Yes");
        answers.set(
            supplements.follow_up_key(),
            AnswerValue::Many(vec!["Zinc".into(), "Omega 3".into()]),
        );

        let text = encode(&answers, &items);
        assert_eq!(
            text,
            "🍽️ Dinner: Yes - Outside | ⚡ Energy: 😐 (2/5) | 💊 Supplements: Yes (Zinc, Omega 3) | ⭐ Day Rating: 😄 (5/5)"
        );

        let decoded = decode(&text, &items);
        assert_eq!(decoded, answers);
    }

    #[test]
    fn unmatched_parts_are_left_unset() {
        let items = vec![CustomItem::new("Gratitude", "🙏", CustomItemKind::Text)];
        let decoded = decode("something unrelated | ⭐ Day Rating: ?", &items);
        assert!(decoded.is_empty());
    }

    #[test]
    fn entry_record_rejects_unknown_versions() {
        let record = EntryRecord::new(example_answers());
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(EntryRecord::from_value(&value), Some(record));

        let future = serde_json::json!({"version": 99, "answers": {}});
        assert_eq!(EntryRecord::from_value(&future), None);
        assert_eq!(EntryRecord::from_json("not json"), None);
    }
}
