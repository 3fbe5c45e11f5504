use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::FollowUpKind;
use crate::errors::{ChecklistError, Result};

pub const DEFAULT_ICON: &str = "📌";

/// Opaque identity of a custom item, assigned once at creation.
///
/// Answer keys and step ids derive from this value rather than from the
/// item's position, so reordering or removing other items never changes it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomItemId(Uuid);

impl CustomItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw.trim()).ok().map(Self)
    }

    /// First eight hex digits, for display only.
    pub fn short(&self) -> String {
        let mut text = self.0.simple().to_string();
        text.truncate(8);
        text
    }
}

impl Default for CustomItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CustomItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CustomItemKind {
    #[serde(rename = "yes-no")]
    YesNo,
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "rating")]
    Rating,
    #[serde(rename = "time")]
    TimeRange,
}

impl CustomItemKind {
    pub const ALL: [CustomItemKind; 4] = [
        CustomItemKind::YesNo,
        CustomItemKind::Text,
        CustomItemKind::Rating,
        CustomItemKind::TimeRange,
    ];

    pub fn label(self) -> &'static str {
        match self {
            CustomItemKind::YesNo => "Yes/No",
            CustomItemKind::Text => "Text Input",
            CustomItemKind::Rating => "Rating (1-5)",
            CustomItemKind::TimeRange => "Time Range",
        }
    }
}

/// Conditional question asked after a "Yes" on a yes/no custom item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomFollowUp {
    #[serde(default)]
    pub prompt: String,
    #[serde(rename = "type", default)]
    pub kind: FollowUpKind,
    #[serde(default)]
    pub options: Vec<String>,
}

impl CustomFollowUp {
    pub fn new(prompt: impl Into<String>, kind: FollowUpKind, options: Vec<String>) -> Self {
        Self {
            prompt: prompt.into(),
            kind,
            options,
        }
    }
}

/// User-authored checklist question. Field names match the browser's
/// `customChecklistItems` format so existing exports load unchanged.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomItem {
    #[serde(default)]
    pub id: CustomItemId,
    pub name: String,
    #[serde(default = "default_icon")]
    pub icon: String,
    #[serde(rename = "type")]
    pub kind: CustomItemKind,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(
        rename = "subResponse",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub follow_up: Option<CustomFollowUp>,
}

fn default_icon() -> String {
    DEFAULT_ICON.to_string()
}

impl CustomItem {
    pub fn new(name: impl Into<String>, icon: impl Into<String>, kind: CustomItemKind) -> Self {
        Self {
            id: CustomItemId::new(),
            name: name.into(),
            icon: icon.into(),
            kind,
            options: Vec::new(),
            follow_up: None,
        }
    }

    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = options;
        self
    }

    pub fn with_follow_up(mut self, follow_up: CustomFollowUp) -> Self {
        self.follow_up = Some(follow_up);
        self
    }

    /// Answer key (and step id) of this item.
    pub fn step_key(&self) -> String {
        format!("custom_{}", self.id)
    }

    /// Answer key of this item's follow-up question.
    pub fn follow_up_key(&self) -> String {
        format!("custom_{}_sub", self.id)
    }

    pub fn title(&self) -> String {
        format!("{} {}", self.icon, self.name)
    }

    /// Trims text fields, drops empty option lines and discards settings that
    /// do not apply to the item's kind.
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.icon = match self.icon.trim() {
            "" => default_icon(),
            icon => icon.to_string(),
        };
        self.options = clean_options(&self.options);
        if self.kind != CustomItemKind::TimeRange {
            self.options.clear();
        }
        self.follow_up = match self.kind {
            CustomItemKind::YesNo => self.follow_up.map(|follow_up| CustomFollowUp {
                prompt: follow_up.prompt.trim().to_string(),
                kind: follow_up.kind,
                options: clean_options(&follow_up.options),
            }),
            _ => None,
        };
        self
    }

    /// Presence checks only: a name, and options wherever options are shown.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ChecklistError::InvalidInput(
                "custom item name is required".into(),
            ));
        }
        if self.kind == CustomItemKind::TimeRange && clean_options(&self.options).is_empty() {
            return Err(ChecklistError::InvalidInput(format!(
                "time range item `{}` needs at least one option",
                self.name.trim()
            )));
        }
        if let Some(follow_up) = &self.follow_up {
            if self.kind == CustomItemKind::YesNo && clean_options(&follow_up.options).is_empty()
            {
                return Err(ChecklistError::InvalidInput(format!(
                    "follow-up for `{}` needs at least one option",
                    self.name.trim()
                )));
            }
        }
        Ok(())
    }

    /// Human-readable type description used by the management list.
    pub fn type_display(&self) -> String {
        match self.kind {
            CustomItemKind::YesNo if self.follow_up.is_some() => "Yes/No with follow-up".into(),
            CustomItemKind::TimeRange => format!("Time Range ({} options)", self.options.len()),
            kind => kind.label().into(),
        }
    }
}

fn clean_options(options: &[String]) -> Vec<String> {
    options
        .iter()
        .map(|option| option.trim())
        .filter(|option| !option.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_browser_item_parses_with_fresh_id() {
        let raw = r#"{
            "name": "Meditation",
            "type": "yes-no",
            "icon": "🧘",
            "options": [],
            "subResponse": {"prompt": "How long?", "type": "checkbox", "options": ["5 min", "20 min"]}
        }"#;
        let item: CustomItem = serde_json::from_str(raw).unwrap();
        assert_eq!(item.kind, CustomItemKind::YesNo);
        let follow_up = item.follow_up.as_ref().unwrap();
        assert_eq!(follow_up.kind, FollowUpKind::MultiSelect);
        assert_eq!(follow_up.options, vec!["5 min", "20 min"]);
        assert!(item.step_key().starts_with("custom_"));
        assert_eq!(item.follow_up_key(), format!("{}_sub", item.step_key()));
    }

    #[test]
    fn normalize_drops_settings_that_do_not_apply() {
        let item = CustomItem::new("  Water  ", "  ", CustomItemKind::Text)
            .with_options(vec!["a".into()])
            .with_follow_up(CustomFollowUp::new("x", FollowUpKind::SingleSelect, vec![]))
            .normalized();
        assert_eq!(item.name, "Water");
        assert_eq!(item.icon, DEFAULT_ICON);
        assert!(item.options.is_empty());
        assert!(item.follow_up.is_none());
    }

    #[test]
    fn time_range_requires_options() {
        let item = CustomItem::new("Bedtime", "🌙", CustomItemKind::TimeRange)
            .with_options(vec!["  ".into()]);
        assert!(matches!(
            item.validate(),
            Err(ChecklistError::InvalidInput(_))
        ));

        let item = item.with_options(vec!["22:00 - 23:00".into(), "".into()]).normalized();
        assert!(item.validate().is_ok());
        assert_eq!(item.type_display(), "Time Range (1 options)");
    }

    #[test]
    fn ids_are_unique_and_round_trip_through_text() {
        let first = CustomItemId::new();
        let second = CustomItemId::new();
        assert_ne!(first, second);
        assert_eq!(CustomItemId::parse(&first.to_string()), Some(first));
        assert_eq!(first.short().len(), 8);
    }
}
