//! Shell state shared by every command handler.

use std::{io, path::PathBuf, sync::Arc};

use chrono::NaiveDate;
use strsim::levenshtein;

use crate::{
    api::HttpApiClient,
    config::{Config, ConfigManager},
    custom_items::CustomItemStore,
    errors::{ChecklistError, CliError},
    service::DailyLog,
    storage::{JsonFileStore, KeyValueStore},
    time::{Clock, SystemClock},
    utils::paths::PathResolver,
    wizard::WizardSession,
};

use super::commands::{self, CommandRegistry};
use super::output;
use super::prompter::Prompter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Core(#[from] ChecklistError),
    #[error("Prompt failed: {0}")]
    Prompt(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("exit requested")]
    ExitRequested,
}

impl From<dialoguer::Error> for CommandError {
    fn from(err: dialoguer::Error) -> Self {
        CommandError::Prompt(err.to_string())
    }
}

impl From<CommandError> for CliError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::Core(inner) => CliError::Core(inner),
            CommandError::InvalidArguments(message) => CliError::Input(message),
            CommandError::Prompt(message) => CliError::Prompt(message),
            other => CliError::Command(other.to_string()),
        }
    }
}

pub type CommandResult = Result<(), CommandError>;

pub struct ShellContext {
    pub(crate) mode: CliMode,
    pub(crate) registry: CommandRegistry,
    pub(crate) prompter: Box<dyn Prompter>,
    pub(crate) base_dir: PathBuf,
    pub(crate) config_manager: ConfigManager,
    pub(crate) config: Config,
    pub(crate) store: Arc<dyn KeyValueStore>,
    pub(crate) items: CustomItemStore,
    pub(crate) client: HttpApiClient,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) session: WizardSession,
    /// Date the last `log` command worked on; `log prev|next` move from here.
    pub(crate) current_date: NaiveDate,
    pub(crate) running: bool,
}

impl ShellContext {
    pub fn new(mode: CliMode, prompter: Box<dyn Prompter>) -> Result<Self, CliError> {
        Self::with_base_dir(mode, prompter, PathResolver::base_dir())
    }

    pub fn with_base_dir(
        mode: CliMode,
        prompter: Box<dyn Prompter>,
        base_dir: PathBuf,
    ) -> Result<Self, CliError> {
        let config_manager = ConfigManager::with_base_dir(base_dir.clone())?;
        let config = config_manager.load()?;
        let store: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::new(Some(base_dir.clone()))?);
        let items = CustomItemStore::load(Arc::clone(&store))?;
        let client = build_client(&config);
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let session = WizardSession::new(items.catalog(), config.timings(), Arc::clone(&clock));
        let current_date = clock.today();

        Ok(Self {
            mode,
            registry: CommandRegistry::new(commands::all_definitions()),
            prompter,
            base_dir,
            config_manager,
            config,
            store,
            items,
            client,
            clock,
            session,
            current_date,
            running: true,
        })
    }

    pub(crate) fn command_names(&self) -> Vec<&'static str> {
        self.registry.names().collect()
    }

    pub(crate) fn prompt(&self) -> String {
        match &self.config.username {
            Some(user) => format!("checklist({user})> "),
            None => "checklist> ".into(),
        }
    }

    pub(crate) fn daily_log(&self) -> DailyLog<&HttpApiClient> {
        DailyLog::new(
            &self.client,
            Arc::clone(&self.store),
            self.config.activity_name.clone(),
        )
    }

    pub(crate) fn persist_config(&self) -> CommandResult {
        self.config_manager.save(&self.config)?;
        Ok(())
    }

    /// Applies config changes to the HTTP client and the wizard timings.
    pub(crate) fn refresh_from_config(&mut self) {
        self.client = build_client(&self.config);
        self.session.set_timings(self.config.timings());
    }

    /// Re-reads the custom items and rebuilds the wizard steps from them.
    pub(crate) fn refresh_catalog(&mut self) -> CommandResult {
        self.items.reload()?;
        self.session.rebuild(self.items.catalog());
        Ok(())
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        let Some(handler) = self.registry.get(command).map(|definition| definition.handler) else {
            self.suggest_command(raw);
            return Ok(LoopControl::Continue);
        };
        match handler(self, args) {
            Ok(()) => Ok(LoopControl::Continue),
            Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
            Err(err) => Err(err),
        }
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        output::warning(format!(
            "Unknown command `{input}`. Type `help` to see available commands."
        ));

        let best = self
            .registry
            .names()
            .map(|name| (levenshtein(name, &input.to_lowercase()), name))
            .min_by_key(|(distance, _)| *distance);
        if let Some((distance, name)) = best {
            if distance <= 3 {
                output::info(format!("Suggestion: `{name}`?"));
            }
        }
    }

    pub(crate) fn confirm_exit(&self) -> Result<bool, CliError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        Ok(self.prompter.confirm("Exit shell?", true)?)
    }

    pub(crate) fn report_error(&self, err: CommandError) {
        match err {
            CommandError::ExitRequested => {}
            CommandError::InvalidArguments(message) => {
                output::error(message);
                output::hint("Use `help <command>` for usage details.");
            }
            CommandError::Core(ChecklistError::Api { status, message })
                if status == 401 || (300..400).contains(&status) =>
            {
                output::error(format!("Not logged in ({status}): {message}"));
                output::hint("Use `login <username>` first.");
            }
            other => output::error(other),
        }
    }
}

fn build_client(config: &Config) -> HttpApiClient {
    HttpApiClient::new(config.effective_api_url()).with_session(config.session_cookie.clone())
}
