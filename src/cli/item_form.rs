use crate::catalog::FollowUpKind;
use crate::custom_items::{CustomFollowUp, CustomItem, CustomItemKind, DEFAULT_ICON};

use super::context::CommandError;
use super::output;
use super::prompter::Prompter;

const FOLLOW_UP_KINDS: [(FollowUpKind, &str); 2] = [
    (FollowUpKind::SingleSelect, "Single choice"),
    (FollowUpKind::MultiSelect, "Multiple choice"),
];

/// Reads options one per line until an empty line. Finishing on the first
/// line keeps `current`.
fn collect_options(
    prompter: &dyn Prompter,
    label: &str,
    current: &[String],
) -> Result<Vec<String>, CommandError> {
    if !current.is_empty() {
        output::info(format!("Current options: {}", current.join(" | ")));
    }
    let mut options = Vec::new();
    loop {
        let prompt = format!("{label} #{} (empty line to finish)", options.len() + 1);
        let line = prompter.input(&prompt, None, true)?;
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        options.push(line.to_string());
    }
    if options.is_empty() {
        return Ok(current.to_vec());
    }
    Ok(options)
}

/// Asks for every field of a custom item, pre-filled from `initial` when
/// editing. Dismissing the form yields `Ok(None)`.
pub(crate) fn collect(
    prompter: &dyn Prompter,
    initial: Option<&CustomItem>,
) -> Result<Option<CustomItem>, CommandError> {
    let name = prompter.input("Item name", initial.map(|item| item.name.as_str()), false)?;
    let icon = prompter.input(
        "Icon (emoji)",
        Some(initial.map_or(DEFAULT_ICON, |item| item.icon.as_str())),
        true,
    )?;

    let kinds: Vec<String> = CustomItemKind::ALL
        .iter()
        .map(|kind| kind.label().to_string())
        .collect();
    let default_kind = initial
        .and_then(|item| CustomItemKind::ALL.iter().position(|kind| *kind == item.kind))
        .unwrap_or(0);
    let Some(kind_index) = prompter.select("Item type", &kinds, default_kind)? else {
        return Ok(None);
    };
    let kind = CustomItemKind::ALL[kind_index];

    let mut item = CustomItem::new(name, icon, kind);
    if let Some(existing) = initial {
        item.id = existing.id;
    }

    match kind {
        CustomItemKind::TimeRange => {
            let current = initial.map_or(&[][..], |item| item.options.as_slice());
            item = item.with_options(collect_options(prompter, "Option", current)?);
        }
        CustomItemKind::YesNo => {
            let existing = initial.and_then(|item| item.follow_up.as_ref());
            if prompter.confirm("Ask a follow-up question after \"Yes\"?", existing.is_some())? {
                item = item.with_follow_up(collect_follow_up(prompter, existing)?);
            }
        }
        CustomItemKind::Text | CustomItemKind::Rating => {}
    }

    Ok(Some(item.normalized()))
}

fn collect_follow_up(
    prompter: &dyn Prompter,
    initial: Option<&CustomFollowUp>,
) -> Result<CustomFollowUp, CommandError> {
    let prompt = prompter.input(
        "Follow-up question",
        initial.map(|follow_up| follow_up.prompt.as_str()),
        true,
    )?;
    let labels: Vec<String> = FOLLOW_UP_KINDS
        .iter()
        .map(|(_, label)| label.to_string())
        .collect();
    let default_kind = initial
        .and_then(|follow_up| {
            FOLLOW_UP_KINDS
                .iter()
                .position(|(kind, _)| *kind == follow_up.kind)
        })
        .unwrap_or(0);
    let kind = prompter
        .select("Follow-up type", &labels, default_kind)?
        .map_or(FollowUpKind::SingleSelect, |index| FOLLOW_UP_KINDS[index].0);
    let current = initial.map_or(&[][..], |follow_up| follow_up.options.as_slice());
    let options = collect_options(prompter, "Follow-up option", current)?;
    Ok(CustomFollowUp::new(prompt, kind, options))
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use crate::cli::prompter::{ScriptPrompter, ScriptQueue};

    fn prompter(lines: &[&str]) -> ScriptPrompter {
        let queue: ScriptQueue = Rc::new(RefCell::new(
            lines.iter().map(|line| line.to_string()).collect(),
        ));
        ScriptPrompter::new(queue)
    }

    #[test]
    fn yes_no_item_with_follow_up() {
        let prompter = prompter(&[
            "Supplements",
            "💊",
            "yes/no",
            "y",
            "Which ones?",
            "multiple",
            "Zinc",
            "Omega 3",
            "Vitamin D",
            "",
        ]);
        let item = collect(&prompter, None).unwrap().unwrap();
        assert_eq!(item.kind, CustomItemKind::YesNo);
        let follow_up = item.follow_up.unwrap();
        assert_eq!(follow_up.kind, FollowUpKind::MultiSelect);
        assert_eq!(follow_up.options, vec!["Zinc", "Omega 3", "Vitamin D"]);
    }

    #[test]
    fn editing_keeps_id_and_defaults() {
        let original = CustomItem::new("Bedtime", "🌙", CustomItemKind::TimeRange)
            .with_options(vec!["22:00".into(), "23:00".into()]);
        let prompter = prompter(&["", "", "", ""]);
        let item = collect(&prompter, Some(&original)).unwrap().unwrap();
        assert_eq!(item, original);
    }

    #[test]
    fn options_may_contain_commas() {
        let prompter = prompter(&[
            "Bedtime",
            "🌙",
            "time",
            "22:00, late",
            "  After 23:00  ",
            "",
        ]);
        let item = collect(&prompter, None).unwrap().unwrap();
        assert_eq!(item.options, vec!["22:00, late", "After 23:00"]);
    }

    #[test]
    fn editing_replaces_options_when_new_ones_are_given() {
        let original = CustomItem::new("Bedtime", "🌙", CustomItemKind::TimeRange)
            .with_options(vec!["22:00".into(), "23:00".into()]);
        let prompter = prompter(&["", "", "", "Before 22:00", ""]);
        let item = collect(&prompter, Some(&original)).unwrap().unwrap();
        assert_eq!(item.id, original.id);
        assert_eq!(item.options, vec!["Before 22:00"]);
    }

    #[test]
    fn dismissing_the_type_cancels() {
        let prompter = prompter(&["Water", "", "esc"]);
        assert!(collect(&prompter, None).unwrap().is_none());
    }
}
