use crate::cli::context::{CommandError, CommandResult, ShellContext};
use crate::cli::output;
use crate::config::SETTABLE_KEYS;

use super::CommandDefinition;

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![CommandDefinition::new(
        "config",
        "View and change preferences",
        "config [show|set <key> <value>]",
        cmd_config,
    )]
}

fn cmd_config(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if args.is_empty() || args[0].eq_ignore_ascii_case("show") {
        output::section("Configuration");
        for (key, value) in context.config.display_lines() {
            output::info(format!("  {key:<16}: {value}"));
        }
        output::hint(format!("File: {}", context.config_manager.path().display()));
        return Ok(());
    }

    match args[0].to_lowercase().as_str() {
        "set" => {
            if args.len() < 3 {
                return Err(CommandError::InvalidArguments(format!(
                    "usage: config set <{}> <value>",
                    SETTABLE_KEYS.join("|")
                )));
            }
            let key = args[1].to_lowercase();
            let value = args[2..].join(" ");
            context.config.set_field(&key, &value)?;
            context.persist_config()?;
            context.refresh_from_config();
            output::success(format!("{key} updated."));
            Ok(())
        }
        other => Err(CommandError::InvalidArguments(format!(
            "unknown config subcommand `{other}`; usage: config [show|set <key> <value>]"
        ))),
    }
}
