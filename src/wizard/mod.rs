//! Step-by-step checklist session.
//!
//! A [`WizardSession`] owns the step catalog, the current index and the
//! accumulated answers. Delayed moves (auto-advance after an answer, the short
//! transition after next/back) live in a single pending slot: every new
//! interaction cancels whatever is waiting before deciding what to schedule.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::catalog::{FollowUpKind, StepCatalog, StepDefinition, StepKind, YES};
use crate::errors::{ChecklistError, Result};
use crate::time::Clock;

pub const VALIDATION_MESSAGE: &str = "Please answer the current question before proceeding.";

/// A single answer: free text or a selected option, or the set of options
/// picked in a multi-select follow-up.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Text(String),
    Many(Vec<String>),
}

impl AnswerValue {
    pub fn is_present(&self) -> bool {
        match self {
            AnswerValue::Text(text) => !text.trim().is_empty(),
            AnswerValue::Many(values) => !values.is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AnswerValue::Text(text) => Some(text),
            AnswerValue::Many(_) => None,
        }
    }

    pub fn contains(&self, value: &str) -> bool {
        match self {
            AnswerValue::Text(text) => text == value,
            AnswerValue::Many(values) => values.iter().any(|v| v == value),
        }
    }

    /// Display form; multi-select values are joined with `", "`.
    pub fn display(&self) -> String {
        match self {
            AnswerValue::Text(text) => text.clone(),
            AnswerValue::Many(values) => values.join(", "),
        }
    }
}

impl From<&str> for AnswerValue {
    fn from(value: &str) -> Self {
        AnswerValue::Text(value.to_string())
    }
}

impl From<String> for AnswerValue {
    fn from(value: String) -> Self {
        AnswerValue::Text(value)
    }
}

/// Answer key to value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WizardAnswers(BTreeMap<String, AnswerValue>);

impl WizardAnswers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&AnswerValue> {
        self.0.get(key)
    }

    /// Text answer for `key`, ignoring blank values.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key)
            .and_then(AnswerValue::as_text)
            .filter(|text| !text.trim().is_empty())
    }

    pub fn is_present(&self, key: &str) -> bool {
        self.get(key).is_some_and(AnswerValue::is_present)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<AnswerValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<AnswerValue> {
        self.0.remove(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AnswerValue)> {
        self.0.iter()
    }

    fn toggle(&mut self, key: &str, value: &str) {
        let mut values = match self.0.remove(key) {
            Some(AnswerValue::Many(values)) => values,
            Some(AnswerValue::Text(text)) if !text.is_empty() => vec![text],
            _ => Vec::new(),
        };
        match values.iter().position(|v| v == value) {
            Some(index) => {
                values.remove(index);
            }
            None => values.push(value.to_string()),
        }
        self.0.insert(key.to_string(), AnswerValue::Many(values));
    }
}

impl FromIterator<(String, AnswerValue)> for WizardAnswers {
    fn from_iter<T: IntoIterator<Item = (String, AnswerValue)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    Advance,
    Retreat,
}

/// The one delayed move a session may be waiting on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingTransition {
    pub transition: Transition,
    /// Index the move was scheduled from; stale if the index has changed since.
    pub from_index: usize,
    pub due: Instant,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Navigation {
    pub previous_enabled: bool,
    pub next_visible: bool,
    pub submit_visible: bool,
    /// `(index + 1) / total`.
    pub progress: f64,
}

/// Everything needed to draw one step.
#[derive(Clone, Debug, PartialEq)]
pub struct StepView {
    pub index: usize,
    pub total: usize,
    pub step: StepDefinition,
    pub answer: Option<AnswerValue>,
    pub follow_up_revealed: bool,
    pub follow_up_answer: Option<AnswerValue>,
    pub navigation: Navigation,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WizardEvent {
    /// Answer stored, nothing scheduled.
    Recorded,
    /// "Yes" on a step with a follow-up; the follow-up is now shown.
    FollowUpRevealed,
    Scheduled {
        transition: Transition,
        delay: Duration,
    },
    Moved {
        from: usize,
        to: usize,
    },
    Stayed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WizardTimings {
    pub auto_advance: Duration,
    pub transition: Duration,
}

impl Default for WizardTimings {
    fn default() -> Self {
        Self {
            auto_advance: Duration::from_millis(600),
            transition: Duration::from_millis(300),
        }
    }
}

pub struct WizardSession {
    catalog: StepCatalog,
    answers: WizardAnswers,
    current: usize,
    pending: Option<PendingTransition>,
    timings: WizardTimings,
    clock: Arc<dyn Clock>,
}

impl WizardSession {
    pub fn new(catalog: StepCatalog, timings: WizardTimings, clock: Arc<dyn Clock>) -> Self {
        debug!(steps = catalog.len(), "wizard session created");
        Self {
            catalog,
            answers: WizardAnswers::new(),
            current: 0,
            pending: None,
            timings,
            clock,
        }
    }

    pub fn catalog(&self) -> &StepCatalog {
        &self.catalog
    }

    pub fn answers(&self) -> &WizardAnswers {
        &self.answers
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_step(&self) -> Option<&StepDefinition> {
        self.catalog.get(self.current)
    }

    pub fn is_last(&self) -> bool {
        self.current == self.catalog.last_index()
    }

    pub fn pending(&self) -> Option<PendingTransition> {
        self.pending
    }

    pub fn timings(&self) -> WizardTimings {
        self.timings
    }

    pub fn set_timings(&mut self, timings: WizardTimings) {
        self.timings = timings;
    }

    /// View of the current step.
    pub fn render(&self) -> StepView {
        self.build_view(self.current)
    }

    /// View of any step, pre-filled from the current answers.
    pub fn render_step(&self, index: usize) -> Option<StepView> {
        (index < self.catalog.len()).then(|| self.build_view(index))
    }

    fn build_view(&self, index: usize) -> StepView {
        let step = self.catalog.steps()[index].clone();
        let answer = self.answers.get(&step.id).cloned();
        let follow_up_revealed = step.kind == StepKind::YesNo
            && step.follow_up.is_some()
            && answer.as_ref().is_some_and(|value| value.contains(YES));
        let follow_up_answer = step
            .follow_up
            .as_ref()
            .and_then(|follow_up| self.answers.get(&follow_up.key).cloned());
        let total = self.catalog.len();
        let last = self.catalog.last_index();
        StepView {
            index,
            total,
            step,
            answer,
            follow_up_revealed,
            follow_up_answer,
            navigation: Navigation {
                previous_enabled: index > 0,
                next_visible: index < last,
                submit_visible: index == last,
                progress: (index + 1) as f64 / total as f64,
            },
        }
    }

    /// Stores the main answer of the step keyed `key` and decides whether to
    /// auto-advance: free text stays put, "Yes" with a follow-up reveals it,
    /// everything else schedules an advance after the answer delay.
    pub fn record_answer(&mut self, key: &str, value: impl Into<String>) -> Result<WizardEvent> {
        self.cancel_pending();
        let step = self
            .catalog
            .step(key)
            .ok_or_else(|| ChecklistError::InvalidInput(format!("unknown step `{key}`")))?;
        let kind = step.kind;
        let follow_up_key = step.follow_up.as_ref().map(|follow_up| follow_up.key.clone());
        let value = value.into();
        debug!(key, value = %value, "answer recorded");

        let is_yes = value == YES;
        self.answers.set(key, value);

        match kind {
            StepKind::FreeText => Ok(WizardEvent::Recorded),
            StepKind::YesNo => match follow_up_key {
                Some(_) if is_yes => Ok(WizardEvent::FollowUpRevealed),
                Some(follow_up_key) => {
                    self.answers.remove(&follow_up_key);
                    Ok(self.schedule(Transition::Advance, self.timings.auto_advance))
                }
                None => Ok(self.schedule(Transition::Advance, self.timings.auto_advance)),
            },
            StepKind::SingleChoice | StepKind::Rating => {
                Ok(self.schedule(Transition::Advance, self.timings.auto_advance))
            }
        }
    }

    /// Answer to a yes/no question; same as [`record_answer`](Self::record_answer).
    pub fn select_yes_no(&mut self, key: &str, value: &str) -> Result<WizardEvent> {
        self.record_answer(key, value)
    }

    /// Stores a follow-up answer. Single-select values replace the answer and
    /// schedule an advance; multi-select values toggle membership and never
    /// advance.
    pub fn record_follow_up_answer(
        &mut self,
        key: &str,
        value: &str,
        kind: FollowUpKind,
    ) -> Result<WizardEvent> {
        self.cancel_pending();
        let known = self
            .catalog
            .steps()
            .iter()
            .filter_map(|step| step.follow_up.as_ref())
            .any(|follow_up| follow_up.key == key);
        if !known {
            return Err(ChecklistError::InvalidInput(format!(
                "unknown follow-up `{key}`"
            )));
        }
        match kind {
            FollowUpKind::MultiSelect => {
                self.answers.toggle(key, value);
                debug!(key, value, "follow-up option toggled");
                Ok(WizardEvent::Recorded)
            }
            FollowUpKind::SingleSelect => {
                self.answers.set(key, value);
                debug!(key, value, "follow-up answer recorded");
                Ok(self.schedule(Transition::Advance, self.timings.auto_advance))
            }
        }
    }

    /// Replaces a multi-select follow-up answer in one go.
    pub fn set_follow_up_selection(&mut self, key: &str, values: Vec<String>) {
        self.cancel_pending();
        self.answers.set(key, AnswerValue::Many(values));
    }

    /// Validates the current step and, if it passes, schedules the move to the
    /// next one after the transition delay.
    pub fn go_next(&mut self) -> Result<WizardEvent> {
        self.cancel_pending();
        self.validate_current()?;
        if self.is_last() {
            return Ok(WizardEvent::Stayed);
        }
        Ok(self.schedule(Transition::Advance, self.timings.transition))
    }

    pub fn go_previous(&mut self) -> WizardEvent {
        self.cancel_pending();
        if self.current == 0 {
            return WizardEvent::Stayed;
        }
        self.schedule(Transition::Retreat, self.timings.transition)
    }

    /// Fires the pending transition if it is due.
    pub fn poll(&mut self) -> Option<WizardEvent> {
        let pending = self.pending?;
        if self.clock.now() < pending.due {
            return None;
        }
        self.pending = None;
        Some(self.fire(pending))
    }

    /// Blocks until the pending transition is due, then fires it.
    pub fn wait(&mut self) -> Option<WizardEvent> {
        let pending = self.pending?;
        let now = self.clock.now();
        if pending.due > now {
            self.clock.sleep(pending.due - now);
        }
        self.pending = None;
        Some(self.fire(pending))
    }

    /// Drops the pending transition, returning whether one was waiting.
    pub fn cancel_pending(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) => {
                debug!(
                    transition = ?pending.transition,
                    from = pending.from_index,
                    "pending transition cancelled"
                );
                true
            }
            None => false,
        }
    }

    /// Back to an empty entry on the first step.
    pub fn reset(&mut self) {
        self.cancel_pending();
        self.answers.clear();
        self.current = 0;
        info!("wizard reset");
    }

    /// Pre-fills answers for editing and returns to the first step.
    pub fn load(&mut self, answers: WizardAnswers) {
        self.cancel_pending();
        info!(answers = answers.len(), "wizard loaded for editing");
        self.answers = answers;
        self.current = 0;
    }

    /// Swaps in a rebuilt catalog, keeping answers and clamping the index.
    pub fn rebuild(&mut self, catalog: StepCatalog) {
        self.cancel_pending();
        self.catalog = catalog;
        self.current = self.current.min(self.catalog.last_index());
        debug!(steps = self.catalog.len(), "wizard catalog rebuilt");
    }

    /// Optional steps always pass; otherwise the answer must be non-blank, and
    /// a "Yes" that revealed a single-select follow-up needs that answer too.
    /// An empty multi-select follow-up is accepted.
    pub fn validate_step(&self, index: usize) -> bool {
        let Some(step) = self.catalog.get(index) else {
            return false;
        };
        if step.optional {
            return true;
        }
        let Some(answer) = self.answers.get(&step.id).filter(|a| a.is_present()) else {
            return false;
        };
        match &step.follow_up {
            Some(follow_up)
                if step.kind == StepKind::YesNo
                    && answer.contains(YES)
                    && follow_up.kind == FollowUpKind::SingleSelect =>
            {
                self.answers.is_present(&follow_up.key)
            }
            _ => true,
        }
    }

    pub fn validate_current(&self) -> Result<()> {
        if self.validate_step(self.current) {
            Ok(())
        } else {
            Err(ChecklistError::Validation(VALIDATION_MESSAGE.into()))
        }
    }

    fn schedule(&mut self, transition: Transition, delay: Duration) -> WizardEvent {
        let pending = PendingTransition {
            transition,
            from_index: self.current,
            due: self.clock.now() + delay,
        };
        if delay.is_zero() {
            return self.fire(pending);
        }
        debug!(?transition, from = self.current, ?delay, "transition scheduled");
        self.pending = Some(pending);
        WizardEvent::Scheduled { transition, delay }
    }

    fn fire(&mut self, pending: PendingTransition) -> WizardEvent {
        if pending.from_index != self.current {
            debug!(
                from = pending.from_index,
                current = self.current,
                "stale transition discarded"
            );
            return WizardEvent::Stayed;
        }
        let from = self.current;
        let to = match pending.transition {
            Transition::Advance if from < self.catalog.last_index() && self.validate_step(from) => {
                from + 1
            }
            Transition::Retreat if from > 0 => from - 1,
            _ => return WizardEvent::Stayed,
        };
        self.current = to;
        info!(from, to, "wizard moved");
        WizardEvent::Moved { from, to }
    }
}
