//! Prompt backends: `dialoguer` widgets for a terminal, a line queue for
//! scripted runs.

use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use dialoguer::{theme::ColorfulTheme, Confirm, Input, MultiSelect, Password, Select};

use super::context::CommandError;
use super::output;

/// Answers consumed by scripted sessions, shared with the command loop.
pub type ScriptQueue = Rc<RefCell<VecDeque<String>>>;

pub trait Prompter {
    /// Index of the chosen item, or `None` when the prompt was dismissed.
    fn select(
        &self,
        prompt: &str,
        items: &[String],
        default: usize,
    ) -> Result<Option<usize>, CommandError>;

    fn multi_select(
        &self,
        prompt: &str,
        items: &[String],
        checked: &[bool],
    ) -> Result<Option<Vec<usize>>, CommandError>;

    fn input(
        &self,
        prompt: &str,
        initial: Option<&str>,
        allow_empty: bool,
    ) -> Result<String, CommandError>;

    fn confirm(&self, prompt: &str, default: bool) -> Result<bool, CommandError>;

    fn password(&self, prompt: &str) -> Result<String, CommandError>;
}

#[derive(Default)]
pub struct DialoguerPrompter {
    theme: ColorfulTheme,
}

impl DialoguerPrompter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Prompter for DialoguerPrompter {
    fn select(
        &self,
        prompt: &str,
        items: &[String],
        default: usize,
    ) -> Result<Option<usize>, CommandError> {
        Ok(Select::with_theme(&self.theme)
            .with_prompt(prompt)
            .items(items)
            .default(default.min(items.len().saturating_sub(1)))
            .interact_opt()?)
    }

    fn multi_select(
        &self,
        prompt: &str,
        items: &[String],
        checked: &[bool],
    ) -> Result<Option<Vec<usize>>, CommandError> {
        Ok(MultiSelect::with_theme(&self.theme)
            .with_prompt(prompt)
            .items(items)
            .defaults(checked)
            .interact_opt()?)
    }

    fn input(
        &self,
        prompt: &str,
        initial: Option<&str>,
        allow_empty: bool,
    ) -> Result<String, CommandError> {
        let mut input = Input::<String>::with_theme(&self.theme)
            .with_prompt(prompt)
            .allow_empty(allow_empty);
        if let Some(initial) = initial {
            input = input.with_initial_text(initial);
        }
        Ok(input.interact_text()?)
    }

    fn confirm(&self, prompt: &str, default: bool) -> Result<bool, CommandError> {
        Ok(Confirm::with_theme(&self.theme)
            .with_prompt(prompt)
            .default(default)
            .interact()?)
    }

    fn password(&self, prompt: &str) -> Result<String, CommandError> {
        Ok(Password::with_theme(&self.theme)
            .with_prompt(prompt)
            .interact()?)
    }
}

/// Reads one queued line per prompt.
///
/// `select` takes a 1-based number or an item's text (case-insensitive), an
/// empty line keeps the default and `esc` dismisses. `multi_select` takes a
/// comma-separated list of the same, `-` for none, or an empty line to keep
/// the current selection. `confirm` takes y/yes/n/no.
pub struct ScriptPrompter {
    queue: ScriptQueue,
}

impl ScriptPrompter {
    pub fn new(queue: ScriptQueue) -> Self {
        Self { queue }
    }

    fn next_line(&self, prompt: &str) -> Result<String, CommandError> {
        let line = self.queue.borrow_mut().pop_front().ok_or_else(|| {
            CommandError::Prompt(format!("no scripted answer left for `{prompt}`"))
        })?;
        output::hint(format!("{prompt} {}", line.trim()));
        Ok(line.trim().to_string())
    }
}

fn match_item(items: &[String], token: &str) -> Option<usize> {
    if let Ok(number) = token.parse::<usize>() {
        if (1..=items.len()).contains(&number) {
            return Some(number - 1);
        }
    }
    items
        .iter()
        .position(|item| item.eq_ignore_ascii_case(token))
        .or_else(|| {
            let lowered = token.to_lowercase();
            items
                .iter()
                .position(|item| item.to_lowercase().contains(&lowered))
        })
}

impl Prompter for ScriptPrompter {
    fn select(
        &self,
        prompt: &str,
        items: &[String],
        default: usize,
    ) -> Result<Option<usize>, CommandError> {
        let line = self.next_line(prompt)?;
        if line.is_empty() {
            return Ok(Some(default));
        }
        if line.eq_ignore_ascii_case("esc") {
            return Ok(None);
        }
        match_item(items, &line)
            .map(Some)
            .ok_or_else(|| CommandError::InvalidArguments(format!("`{line}` is not an option")))
    }

    fn multi_select(
        &self,
        prompt: &str,
        items: &[String],
        checked: &[bool],
    ) -> Result<Option<Vec<usize>>, CommandError> {
        let line = self.next_line(prompt)?;
        if line.is_empty() {
            return Ok(Some(
                checked
                    .iter()
                    .enumerate()
                    .filter_map(|(index, on)| on.then_some(index))
                    .collect(),
            ));
        }
        if line.eq_ignore_ascii_case("esc") {
            return Ok(None);
        }
        if line == "-" {
            return Ok(Some(Vec::new()));
        }
        line.split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(|token| {
                match_item(items, token).ok_or_else(|| {
                    CommandError::InvalidArguments(format!("`{token}` is not an option"))
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }

    fn input(
        &self,
        prompt: &str,
        initial: Option<&str>,
        allow_empty: bool,
    ) -> Result<String, CommandError> {
        let line = self.next_line(prompt)?;
        if line.is_empty() {
            if let Some(initial) = initial.filter(|text| !text.is_empty()) {
                return Ok(initial.to_string());
            }
            if !allow_empty {
                return Err(CommandError::InvalidArguments(format!(
                    "`{prompt}` cannot be empty"
                )));
            }
        }
        Ok(line)
    }

    fn confirm(&self, prompt: &str, default: bool) -> Result<bool, CommandError> {
        let line = self.next_line(prompt)?;
        match line.to_lowercase().as_str() {
            "" => Ok(default),
            "y" | "yes" | "true" => Ok(true),
            "n" | "no" | "false" => Ok(false),
            other => Err(CommandError::InvalidArguments(format!(
                "expected yes or no, got `{other}`"
            ))),
        }
    }

    fn password(&self, prompt: &str) -> Result<String, CommandError> {
        let line = self
            .queue
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| CommandError::Prompt(format!("no scripted answer left for `{prompt}`")))?;
        Ok(line.trim().to_string())
    }
}
