use std::{
    borrow::Cow,
    cell::RefCell,
    collections::VecDeque,
    fmt,
    io::{self, BufRead},
    rc::Rc,
};

use rustyline::{
    completion::{Completer, Pair},
    error::ReadlineError,
    highlight::Highlighter,
    hint::Hinter,
    history::DefaultHistory,
    validate::{ValidationContext, ValidationResult, Validator},
    Cmd, Context as ReadlineContext, Editor, Helper, KeyEvent,
};
use shell_words::split;

use crate::errors::CliError;

use super::context::{CliMode, CommandError, LoopControl, ShellContext};
use super::output::{self, OutputPreferences};
use super::prompter::{DialoguerPrompter, Prompter, ScriptPrompter, ScriptQueue};

const SCRIPT_ENV: &str = "DAILY_CHECKLIST_CLI_SCRIPT";

fn detect_mode() -> CliMode {
    if std::env::var_os(SCRIPT_ENV).is_some() {
        CliMode::Script
    } else {
        CliMode::Interactive
    }
}

/// In script mode every stdin line is queued up front; commands and prompt
/// answers are taken from the same queue in order.
fn build_context(mode: CliMode) -> Result<(ShellContext, ScriptQueue), CliError> {
    let queue: ScriptQueue = Rc::new(RefCell::new(VecDeque::new()));
    let prompter: Box<dyn Prompter> = match mode {
        CliMode::Interactive => Box::new(DialoguerPrompter::new()),
        CliMode::Script => {
            output::set_preferences(OutputPreferences {
                plain: true,
                quiet: false,
            });
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                queue.borrow_mut().push_back(line?);
            }
            Box::new(ScriptPrompter::new(Rc::clone(&queue)))
        }
    };
    Ok((ShellContext::new(mode, prompter)?, queue))
}

pub fn run_cli() -> Result<(), CliError> {
    let mode = detect_mode();
    let (mut context, queue) = build_context(mode)?;

    match mode {
        CliMode::Interactive => run_interactive(&mut context),
        CliMode::Script => run_script(&mut context, &queue),
    }
}

/// Runs a single command given on the process command line.
pub fn run_command(args: &[String]) -> Result<(), CliError> {
    let (mut context, _queue) = build_context(detect_mode())?;
    let line = shell_words::join(args);
    match handle_line(&mut context, &line) {
        Ok(_) => Ok(()),
        Err(err) => Err(err.into()),
    }
}

fn run_interactive(context: &mut ShellContext) -> Result<(), CliError> {
    let mut editor = Editor::<CommandHelper, DefaultHistory>::new()?;
    let helper = CommandHelper::new(context.command_names());
    editor.set_helper(Some(helper));
    editor.bind_sequence(KeyEvent::from('?'), Cmd::Complete);

    output::section("Daily Checklist");
    output::info("Type `log` to fill in today's checklist or `help` for all commands.");

    loop {
        if !context.running {
            break;
        }
        let prompt = context.prompt();
        let line = editor.readline(&prompt);

        match line {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }

                editor.add_history_entry(trimmed).ok();

                match handle_line(context, trimmed) {
                    Ok(LoopControl::Continue) => {}
                    Ok(LoopControl::Exit) => break,
                    Err(err) => context.report_error(err),
                }
            }
            Err(ReadlineError::Interrupted) => {
                if context.confirm_exit()? {
                    break;
                }
            }
            Err(ReadlineError::Eof) => {
                output::info("Exiting shell.");
                break;
            }
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}

fn run_script(context: &mut ShellContext, queue: &ScriptQueue) -> Result<(), CliError> {
    loop {
        if !context.running {
            break;
        }
        let Some(line) = queue.borrow_mut().pop_front() else {
            break;
        };
        match handle_line(context, &line) {
            Ok(LoopControl::Continue) => {}
            Ok(LoopControl::Exit) => break,
            Err(err) => context.report_error(err),
        }
    }
    Ok(())
}

fn handle_line(context: &mut ShellContext, line: &str) -> Result<LoopControl, CommandError> {
    let tokens = match parse_command_line(line) {
        Ok(tokens) => tokens,
        Err(err) => {
            output::warning(err);
            return Ok(LoopControl::Continue);
        }
    };

    if tokens.is_empty() {
        return Ok(LoopControl::Continue);
    }

    let raw = &tokens[0];
    let command = raw.to_lowercase();
    let args: Vec<&str> = tokens.iter().skip(1).map(String::as_str).collect();

    match context.dispatch(&command, raw, &args) {
        Ok(LoopControl::Exit) => {
            context.running = false;
            Ok(LoopControl::Exit)
        }
        other => other,
    }
}

struct CommandHelper {
    commands: Vec<String>,
}

impl CommandHelper {
    fn new(names: Vec<&'static str>) -> Self {
        let mut commands: Vec<String> = names.into_iter().map(str::to_string).collect();
        commands.sort();
        commands.dedup();
        Self { commands }
    }
}

impl Helper for CommandHelper {}

impl Completer for CommandHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &ReadlineContext<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let prefix = &line[..pos];
        // Only the first word is completed.
        if prefix.trim_start().contains(char::is_whitespace) {
            return Ok((pos, Vec::new()));
        }
        let start = prefix.len() - prefix.trim_start().len();
        let needle = prefix[start..].to_ascii_lowercase();
        let candidates = self
            .commands
            .iter()
            .filter(|name| name.starts_with(&needle))
            .map(|name| Pair {
                display: name.clone(),
                replacement: name.clone(),
            })
            .collect();
        Ok((start, candidates))
    }
}

impl Hinter for CommandHelper {
    type Hint = String;
}

impl Highlighter for CommandHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        Cow::Borrowed(line)
    }
}

impl Validator for CommandHelper {
    fn validate(&self, _ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        Ok(ValidationResult::Valid(None))
    }
}

pub(crate) fn parse_command_line(input: &str) -> Result<Vec<String>, ParseError> {
    split(input).map_err(|err| ParseError {
        message: err.to_string(),
    })
}

#[derive(Debug)]
pub(crate) struct ParseError {
    message: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_arguments_stay_together() {
        let tokens = parse_command_line("config set activity_name \"Morning Check\"").unwrap();
        assert_eq!(tokens, vec!["config", "set", "activity_name", "Morning Check"]);
        assert!(parse_command_line("log \"unterminated").is_err());
    }

    #[test]
    fn completion_only_covers_command_names() {
        let helper = CommandHelper::new(vec!["log", "logout", "login", "stats"]);
        let history = DefaultHistory::new();
        let ctx = ReadlineContext::new(&history);
        let (start, pairs) = helper.complete("lo", 2, &ctx).unwrap();
        assert_eq!(start, 0);
        let names: Vec<_> = pairs.into_iter().map(|pair| pair.replacement).collect();
        assert_eq!(names, vec!["log", "login", "logout"]);
        let (_, pairs) = helper.complete("log to", 6, &ctx).unwrap();
        assert!(pairs.is_empty());
    }
}
