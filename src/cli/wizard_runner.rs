//! Drives a [`WizardSession`](crate::wizard::WizardSession) through prompts.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::catalog::{FollowUp, FollowUpKind, StepKind, StepOption};
use crate::errors::ChecklistError;
use crate::service::DailyLog;
use crate::wizard::{StepView, WizardEvent};

use super::context::{CommandError, ShellContext};
use super::{output, render};

pub(crate) const NEXT: &str = "Next →";
pub(crate) const BACK: &str = "← Back";
pub(crate) const CANCEL: &str = "✖ Cancel";
pub(crate) const CHANGE_ANSWER: &str = "↺ Change answer";
pub(crate) const SAVE_NEW: &str = "✅ Save Today's Log";
pub(crate) const SAVE_EDIT: &str = "💾 Update Entry";
const TEXT_BACK: &str = ":back";
const TEXT_CANCEL: &str = ":cancel";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WizardExit {
    Saved,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepOutcome {
    Answered(WizardEvent),
    Next,
    Back,
    ChangeAnswer,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuChoice {
    Saved,
    Back,
    Stay,
    Cancel,
}

fn option_label(option: &StepOption) -> String {
    match &option.description {
        Some(description) => format!("{} {}", option.label, description),
        None => option.label.clone(),
    }
}

/// Appends the navigation entries to `items` and returns them in order.
fn with_navigation(items: &mut Vec<String>, view: &StepView, answered: bool) -> Vec<&'static str> {
    let mut extras = Vec::new();
    if answered && view.navigation.next_visible {
        extras.push(NEXT);
    }
    if view.navigation.previous_enabled {
        extras.push(BACK);
    }
    extras.push(CANCEL);
    items.extend(extras.iter().map(|label| label.to_string()));
    extras
}

fn navigation_outcome(label: &str) -> StepOutcome {
    match label {
        NEXT => StepOutcome::Next,
        BACK => StepOutcome::Back,
        CHANGE_ANSWER => StepOutcome::ChangeAnswer,
        _ => StepOutcome::Cancel,
    }
}

fn ask_main(ctx: &mut ShellContext, view: &StepView) -> Result<StepOutcome, CommandError> {
    let step = &view.step;
    if step.kind == StepKind::FreeText {
        return ask_text(ctx, view);
    }

    let options = step.choices();
    let mut items: Vec<String> = options.iter().map(option_label).collect();
    let current = view.answer.as_ref().and_then(|answer| answer.as_text());
    let default = current
        .and_then(|value| options.iter().position(|option| option.value == value))
        .unwrap_or(0);
    let extras = with_navigation(&mut items, view, current.is_some());

    let Some(choice) = ctx.prompter.select("Choose an answer", &items, default)? else {
        return Ok(StepOutcome::Cancel);
    };
    if let Some(option) = options.get(choice) {
        let event = if step.kind == StepKind::YesNo {
            ctx.session.select_yes_no(&step.id, &option.value)?
        } else {
            ctx.session.record_answer(&step.id, option.value.clone())?
        };
        return Ok(StepOutcome::Answered(event));
    }
    Ok(navigation_outcome(extras[choice - options.len()]))
}

fn ask_text(ctx: &mut ShellContext, view: &StepView) -> Result<StepOutcome, CommandError> {
    let step = &view.step;
    let mut hint = format!("Type {TEXT_CANCEL} to discard the entry");
    if view.navigation.previous_enabled {
        hint.push_str(&format!(" or {TEXT_BACK} to go back"));
    }
    output::hint(hint);
    let prompt = step.placeholder.as_deref().unwrap_or("Your answer");
    let current = view.answer.as_ref().and_then(|answer| answer.as_text());
    let text = ctx.prompter.input(prompt, current, step.optional)?;
    match text.trim() {
        TEXT_BACK if view.navigation.previous_enabled => Ok(StepOutcome::Back),
        TEXT_CANCEL => Ok(StepOutcome::Cancel),
        _ => Ok(StepOutcome::Answered(
            ctx.session.record_answer(&step.id, text)?,
        )),
    }
}

fn ask_follow_up(
    ctx: &mut ShellContext,
    view: &StepView,
    follow_up: &FollowUp,
) -> Result<StepOutcome, CommandError> {
    let labels: Vec<String> = follow_up.options.iter().map(option_label).collect();
    match follow_up.kind {
        FollowUpKind::MultiSelect => {
            output::hint("Press Esc to change the Yes/No answer.");
            let checked: Vec<bool> = follow_up
                .options
                .iter()
                .map(|option| {
                    view.follow_up_answer
                        .as_ref()
                        .is_some_and(|answer| answer.contains(&option.value))
                })
                .collect();
            let Some(selected) = ctx
                .prompter
                .multi_select(&follow_up.prompt, &labels, &checked)?
            else {
                return Ok(StepOutcome::ChangeAnswer);
            };
            for (index, option) in follow_up.options.iter().enumerate() {
                if selected.contains(&index) != checked[index] {
                    ctx.session.record_follow_up_answer(
                        &follow_up.key,
                        &option.value,
                        FollowUpKind::MultiSelect,
                    )?;
                }
            }
            Ok(StepOutcome::Next)
        }
        FollowUpKind::SingleSelect => {
            let mut items = labels;
            let current = view
                .follow_up_answer
                .as_ref()
                .and_then(|answer| answer.as_text());
            let default = current
                .and_then(|value| follow_up.options.iter().position(|o| o.value == value))
                .unwrap_or(0);
            items.push(CHANGE_ANSWER.to_string());
            let mut extras = vec![CHANGE_ANSWER];
            extras.extend(with_navigation(&mut items, view, current.is_some()));

            let Some(choice) = ctx.prompter.select(&follow_up.prompt, &items, default)? else {
                return Ok(StepOutcome::Cancel);
            };
            match follow_up.options.get(choice) {
                Some(option) => Ok(StepOutcome::Answered(ctx.session.record_follow_up_answer(
                    &follow_up.key,
                    &option.value,
                    FollowUpKind::SingleSelect,
                )?)),
                None => Ok(navigation_outcome(extras[choice - follow_up.options.len()])),
            }
        }
    }
}

fn submit_menu(
    ctx: &mut ShellContext,
    date: NaiveDate,
    editing: Option<i64>,
) -> Result<MenuChoice, CommandError> {
    let save = if editing.is_some() { SAVE_EDIT } else { SAVE_NEW };
    let items: Vec<String> = [save, BACK, CANCEL].iter().map(|s| s.to_string()).collect();
    loop {
        match ctx.prompter.select("Ready to save?", &items, 0)? {
            Some(0) => {
                if let Err(err) = ctx.session.validate_current() {
                    output::warning(err);
                    return Ok(MenuChoice::Stay);
                }
                let log = DailyLog::new(
                    &ctx.client,
                    Arc::clone(&ctx.store),
                    ctx.config.activity_name.clone(),
                );
                match log.submit(date, &mut ctx.session, ctx.items.items(), editing) {
                    Ok(outcome) => {
                        output::success("Daily log saved successfully! 🎉");
                        if let Some(old) = outcome.replaced {
                            output::hint(format!("Replaced previous entry #{old}."));
                        }
                        return Ok(MenuChoice::Saved);
                    }
                    Err(err) => {
                        output::error(format!("Error saving daily log: {err}"));
                        output::hint("Your answers are kept. Choose save again to retry.");
                    }
                }
            }
            Some(1) => return Ok(MenuChoice::Back),
            _ => return Ok(MenuChoice::Cancel),
        }
    }
}

fn go_back(ctx: &mut ShellContext) {
    ctx.session.go_previous();
    ctx.session.wait();
}

/// Walks the steps until the entry is saved or discarded.
pub(crate) fn run(
    ctx: &mut ShellContext,
    date: NaiveDate,
    editing: Option<i64>,
) -> Result<WizardExit, CommandError> {
    let mut change_main = false;
    loop {
        let view = ctx.session.render();
        render::step_header(&view);
        let index = view.index;

        let follow_up = view.step.follow_up.clone().filter(|_| view.follow_up_revealed);
        let outcome = match follow_up {
            Some(follow_up) if !change_main => ask_follow_up(ctx, &view, &follow_up)?,
            _ => {
                change_main = false;
                ask_main(ctx, &view)?
            }
        };

        match outcome {
            StepOutcome::Cancel => {
                ctx.session.cancel_pending();
                output::info("Entry discarded.");
                return Ok(WizardExit::Cancelled);
            }
            StepOutcome::Back => {
                go_back(ctx);
                continue;
            }
            StepOutcome::ChangeAnswer => {
                change_main = true;
                continue;
            }
            StepOutcome::Answered(WizardEvent::FollowUpRevealed) => continue,
            StepOutcome::Answered(_) => {
                ctx.session.wait();
                if ctx.session.current_index() != index {
                    continue;
                }
            }
            StepOutcome::Next => {}
        }

        if ctx.session.is_last() {
            match submit_menu(ctx, date, editing)? {
                MenuChoice::Saved => return Ok(WizardExit::Saved),
                MenuChoice::Cancel => {
                    output::info("Entry discarded.");
                    return Ok(WizardExit::Cancelled);
                }
                MenuChoice::Back => go_back(ctx),
                MenuChoice::Stay => {}
            }
            continue;
        }

        match ctx.session.go_next() {
            Ok(_) => {
                ctx.session.wait();
            }
            Err(ChecklistError::Validation(message)) => output::warning(message),
            Err(err) => return Err(err.into()),
        }
    }
}
