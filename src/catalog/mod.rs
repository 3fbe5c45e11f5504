//! Ordered list of wizard steps: the fixed built-in questions followed by one
//! step per custom item.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::custom_items::{CustomItem, CustomItemId, CustomItemKind};
use crate::errors::{ChecklistError, Result};

/// Answer keys of the built-in questions.
pub mod keys {
    pub const WAKE_TIME: &str = "wakeTime";
    pub const COFFEE: &str = "coffee";
    pub const COFFEE_TIME: &str = "coffeeTime";
    pub const BREAKFAST: &str = "breakfast";
    pub const BREAKFAST_TIME: &str = "breakfastTime";
    pub const EXERCISE: &str = "exercise";
    pub const EXERCISE_TYPE: &str = "exerciseType";
    pub const LUNCH: &str = "lunch";
    pub const DINNER: &str = "dinner";
    pub const DAY_RATING: &str = "dayRating";
    pub const NOTES: &str = "notes";
}

pub const YES: &str = "Yes";
pub const NO: &str = "No";

/// Faces for ratings 1 through 5.
pub const RATING_FACES: [&str; 5] = ["😞", "😐", "🙂", "😊", "😄"];
const RATING_DESCRIPTIONS: [&str; 5] = ["Poor", "Below Average", "Average", "Good", "Excellent"];

pub fn rating_face(rating: u8) -> Option<&'static str> {
    match rating {
        1..=5 => Some(RATING_FACES[usize::from(rating - 1)]),
        _ => None,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepKind {
    SingleChoice,
    /// Yes/No, optionally followed by a question shown only after "Yes".
    YesNo,
    /// 1–5 scale.
    Rating,
    FreeText,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FollowUpKind {
    #[default]
    #[serde(rename = "radio")]
    SingleSelect,
    #[serde(rename = "checkbox")]
    MultiSelect,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepOption {
    pub value: String,
    pub label: String,
    pub description: Option<String>,
}

impl StepOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            description: None,
        }
    }

    pub fn plain(value: impl Into<String>) -> Self {
        let value = value.into();
        Self::new(value.clone(), value)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FollowUp {
    /// Answer key of the follow-up.
    pub key: String,
    pub prompt: String,
    pub kind: FollowUpKind,
    pub options: Vec<StepOption>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepSource {
    BuiltIn,
    Custom(CustomItemId),
}

/// One question of the wizard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepDefinition {
    /// Stable key; also the answer key of the step's main question.
    pub id: String,
    pub kind: StepKind,
    pub title: String,
    pub icon: Option<String>,
    pub options: Vec<StepOption>,
    pub follow_up: Option<FollowUp>,
    pub optional: bool,
    pub placeholder: Option<String>,
    pub source: StepSource,
}

impl StepDefinition {
    fn built_in(id: &str, kind: StepKind, title: &str, icon: &str) -> Self {
        Self {
            id: id.to_string(),
            kind,
            title: title.to_string(),
            icon: Some(icon.to_string()),
            options: Vec::new(),
            follow_up: None,
            optional: false,
            placeholder: None,
            source: StepSource::BuiltIn,
        }
    }

    fn with_options(mut self, options: Vec<StepOption>) -> Self {
        self.options = options;
        self
    }

    fn with_follow_up(mut self, key: &str, prompt: &str, options: Vec<StepOption>) -> Self {
        self.follow_up = Some(FollowUp {
            key: key.to_string(),
            prompt: prompt.to_string(),
            kind: FollowUpKind::SingleSelect,
            options,
        });
        self
    }

    /// Options presented for the main question.
    pub fn choices(&self) -> Vec<StepOption> {
        match self.kind {
            StepKind::YesNo => vec![StepOption::plain(NO), StepOption::plain(YES)],
            _ => self.options.clone(),
        }
    }
}

fn rating_options(with_descriptions: bool) -> Vec<StepOption> {
    RATING_FACES
        .iter()
        .zip(RATING_DESCRIPTIONS)
        .enumerate()
        .map(|(index, (face, description))| {
            let value = (index + 1).to_string();
            let option = StepOption::new(value.clone(), *face);
            if with_descriptions {
                option.with_description(description)
            } else {
                option.with_description(value)
            }
        })
        .collect()
}

fn meal_timing() -> Vec<StepOption> {
    vec![
        StepOption::new("Within 30 min", "Within 30 minutes of waking up"),
        StepOption::new("After 30 min", "After 30 minutes"),
    ]
}

fn meal_choices() -> Vec<StepOption> {
    vec![
        StepOption::plain("No"),
        StepOption::plain("Yes - Home cooked"),
        StepOption::plain("Yes - Outside"),
    ]
}

/// The fixed questions, in display order.
pub fn builtin_steps() -> Vec<StepDefinition> {
    vec![
        StepDefinition::built_in(
            keys::WAKE_TIME,
            StepKind::SingleChoice,
            "What time did you wake up?",
            "⏰",
        )
        .with_options(vec![
            StepOption::new("05:00 - 05:30", "05:00 - 05:30 AM"),
            StepOption::new("05:30 - 06:30", "05:30 - 06:30 AM"),
            StepOption::new("06:30 - 07:30", "06:30 - 07:30 AM"),
            StepOption::new("After 07:30", "After 07:30 AM"),
        ]),
        StepDefinition::built_in(keys::COFFEE, StepKind::YesNo, "Did you have coffee today?", "☕")
            .with_follow_up(keys::COFFEE_TIME, "When did you have it?", meal_timing()),
        StepDefinition::built_in(keys::BREAKFAST, StepKind::YesNo, "Did you have breakfast?", "🍳")
            .with_follow_up(keys::BREAKFAST_TIME, "When did you have it?", meal_timing()),
        StepDefinition::built_in(keys::EXERCISE, StepKind::YesNo, "Did you exercise today?", "💪")
            .with_follow_up(
                keys::EXERCISE_TYPE,
                "What type of exercise?",
                vec![
                    StepOption::new("Cardio", "Cardio (Running, Walking)"),
                    StepOption::new("Strength", "Strength Training"),
                    StepOption::new("Yoga", "Yoga/Stretching"),
                    StepOption::plain("Other"),
                ],
            ),
        StepDefinition::built_in(keys::LUNCH, StepKind::SingleChoice, "Did you have lunch?", "🍱")
            .with_options(meal_choices()),
        StepDefinition::built_in(keys::DINNER, StepKind::SingleChoice, "Did you have dinner?", "🍽️")
            .with_options(meal_choices()),
        StepDefinition::built_in(keys::DAY_RATING, StepKind::Rating, "How was your overall day?", "⭐")
            .with_options(rating_options(true)),
        StepDefinition {
            optional: true,
            placeholder: Some("Anything special about today? (Optional)".into()),
            ..StepDefinition::built_in(
                keys::NOTES,
                StepKind::FreeText,
                "Any additional notes about today?",
                "📝",
            )
        },
    ]
}

/// Maps one custom item onto a wizard step.
pub fn custom_step(item: &CustomItem) -> StepDefinition {
    let mut step = StepDefinition {
        id: item.step_key(),
        kind: StepKind::FreeText,
        title: item.title(),
        icon: None,
        options: Vec::new(),
        follow_up: None,
        optional: false,
        placeholder: None,
        source: StepSource::Custom(item.id),
    };
    match item.kind {
        CustomItemKind::YesNo => {
            step.kind = StepKind::YesNo;
            step.follow_up = item.follow_up.as_ref().map(|follow_up| FollowUp {
                key: item.follow_up_key(),
                prompt: follow_up.prompt.clone(),
                kind: follow_up.kind,
                options: follow_up.options.iter().map(StepOption::plain).collect(),
            });
        }
        CustomItemKind::Text => {
            step.placeholder = Some("Enter your response...".into());
        }
        CustomItemKind::Rating => {
            step.kind = StepKind::Rating;
            step.options = rating_options(false);
        }
        CustomItemKind::TimeRange => {
            step.kind = StepKind::SingleChoice;
            step.options = item.options.iter().map(StepOption::plain).collect();
        }
    }
    step
}

/// Ordered, non-empty step list with unique ids.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepCatalog {
    steps: Vec<StepDefinition>,
}

impl StepCatalog {
    pub fn new(steps: Vec<StepDefinition>) -> Result<Self> {
        if steps.is_empty() {
            return Err(ChecklistError::InvalidInput(
                "a wizard needs at least one step".into(),
            ));
        }
        let mut seen = HashSet::new();
        for step in &steps {
            if !seen.insert(step.id.as_str()) {
                return Err(ChecklistError::InvalidInput(format!(
                    "duplicate step id `{}`",
                    step.id
                )));
            }
        }
        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn last_index(&self) -> usize {
        self.steps.len().saturating_sub(1)
    }

    pub fn get(&self, index: usize) -> Option<&StepDefinition> {
        self.steps.get(index)
    }

    pub fn step(&self, id: &str) -> Option<&StepDefinition> {
        self.steps.iter().find(|step| step.id == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.steps.iter().position(|step| step.id == id)
    }
}

/// Built-in steps followed by the custom items in list order. Deterministic for
/// a given item list; an item whose id repeats an earlier one is skipped.
pub fn build_catalog(items: &[CustomItem]) -> StepCatalog {
    let mut steps = builtin_steps();
    let mut seen: HashSet<String> = steps.iter().map(|step| step.id.clone()).collect();
    for item in items {
        let step = custom_step(item);
        if !seen.insert(step.id.clone()) {
            warn!(id = %item.id, name = %item.name, "skipping custom item with duplicate id");
            continue;
        }
        steps.push(step);
    }
    StepCatalog { steps }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::custom_items::CustomFollowUp;

    #[test]
    fn builtins_come_first_in_fixed_order() {
        let catalog = build_catalog(&[]);
        let ids: Vec<&str> = catalog.steps().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                keys::WAKE_TIME,
                keys::COFFEE,
                keys::BREAKFAST,
                keys::EXERCISE,
                keys::LUNCH,
                keys::DINNER,
                keys::DAY_RATING,
                keys::NOTES
            ]
        );
        assert!(catalog.step(keys::NOTES).unwrap().optional);
        assert_eq!(catalog.last_index(), 7);
    }

    #[test]
    fn custom_kinds_map_to_step_kinds() {
        let items = vec![
            CustomItem::new("Walk", "🚶", CustomItemKind::YesNo).with_follow_up(
                CustomFollowUp::new("How far?", FollowUpKind::SingleSelect, vec!["1 km".into()]),
            ),
            CustomItem::new("Gratitude", "🙏", CustomItemKind::Text),
            CustomItem::new("Energy", "⚡", CustomItemKind::Rating),
            CustomItem::new("Bedtime", "🌙", CustomItemKind::TimeRange)
                .with_options(vec!["22:00".into(), "23:00".into()]),
        ];
        let catalog = build_catalog(&items);
        let custom: Vec<&StepDefinition> = catalog.steps()[8..].iter().collect();

        assert_eq!(custom[0].kind, StepKind::YesNo);
        let follow_up = custom[0].follow_up.as_ref().unwrap();
        assert_eq!(follow_up.key, items[0].follow_up_key());
        assert_eq!(follow_up.options[0].value, "1 km");
        assert_eq!(custom[1].kind, StepKind::FreeText);
        assert!(!custom[1].optional);
        assert_eq!(custom[2].kind, StepKind::Rating);
        assert_eq!(custom[2].options.len(), 5);
        assert_eq!(custom[3].kind, StepKind::SingleChoice);
        assert_eq!(custom[3].options[1].value, "23:00");
        assert_eq!(custom[3].title, "🌙 Bedtime");
    }

    #[test]
    fn same_items_build_identical_catalogs() {
        let items = vec![
            CustomItem::new("Energy", "⚡", CustomItemKind::Rating),
            CustomItem::new("Gratitude", "🙏", CustomItemKind::Text),
        ];
        assert_eq!(build_catalog(&items), build_catalog(&items));
    }

    #[test]
    fn duplicate_ids_are_skipped() {
        let item = CustomItem::new("Energy", "⚡", CustomItemKind::Rating);
        let catalog = build_catalog(&[item.clone(), item]);
        assert_eq!(catalog.len(), builtin_steps().len() + 1);
    }

    #[test]
    fn catalog_rejects_empty_and_duplicate_steps() {
        assert!(StepCatalog::new(Vec::new()).is_err());
        let mut steps = builtin_steps();
        steps.push(steps[0].clone());
        assert!(StepCatalog::new(steps).is_err());
    }

    #[test]
    fn rating_faces_cover_one_to_five() {
        assert_eq!(rating_face(1), Some("😞"));
        assert_eq!(rating_face(4), Some("😊"));
        assert_eq!(rating_face(0), None);
        assert_eq!(rating_face(6), None);
    }
}
