use std::collections::HashMap;

pub mod account;
pub mod config;
pub mod entry;
pub mod items;
pub mod system;

use super::context::{CommandError, CommandResult, ShellContext};

pub(crate) fn all_definitions() -> Vec<CommandDefinition> {
    let mut commands = Vec::new();
    commands.extend(entry::definitions());
    commands.extend(items::definitions());
    commands.extend(account::definitions());
    commands.extend(config::definitions());
    commands.extend(system::definitions());
    commands
}

pub type CommandHandler = fn(&mut ShellContext, &[&str]) -> CommandResult;

#[derive(Clone)]
pub struct CommandDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub usage: &'static str,
    pub handler: CommandHandler,
}

impl CommandDefinition {
    pub const fn new(
        name: &'static str,
        description: &'static str,
        usage: &'static str,
        handler: CommandHandler,
    ) -> Self {
        Self {
            name,
            description,
            usage,
            handler,
        }
    }
}

pub struct CommandRegistry {
    commands: HashMap<&'static str, CommandDefinition>,
    order: Vec<&'static str>,
}

impl CommandRegistry {
    pub fn new(definitions: Vec<CommandDefinition>) -> Self {
        let mut commands = HashMap::new();
        let mut order = Vec::new();
        for definition in definitions {
            order.push(definition.name);
            commands.insert(definition.name, definition);
        }
        Self { commands, order }
    }

    pub fn get(&self, name: &str) -> Option<&CommandDefinition> {
        self.commands.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandDefinition> {
        self.order
            .iter()
            .filter_map(move |name| self.commands.get(name))
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.order.iter().copied()
    }
}

/// Parses a 1-based list position.
pub(crate) fn parse_position(raw: Option<&&str>, usage: &str) -> Result<usize, CommandError> {
    raw.and_then(|value| value.parse::<usize>().ok())
        .filter(|value| *value > 0)
        .map(|value| value - 1)
        .ok_or_else(|| CommandError::InvalidArguments(format!("usage: {usage}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_command_is_registered_once() {
        let registry = CommandRegistry::new(all_definitions());
        let names: Vec<&str> = registry.names().collect();
        for expected in [
            "log",
            "history",
            "delete",
            "stats",
            "milestone",
            "export",
            "whoami",
            "login",
            "register",
            "logout",
            "items",
            "item-add",
            "item-edit",
            "item-remove",
            "config",
            "version",
            "help",
            "exit",
        ] {
            assert!(registry.get(expected).is_some(), "missing `{expected}`");
        }
        let mut unique = names.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), names.len());
    }

    #[test]
    fn positions_are_one_based() {
        assert_eq!(parse_position(Some(&"2"), "item-edit <n>").unwrap(), 1);
        assert!(parse_position(Some(&"0"), "item-edit <n>").is_err());
        assert!(parse_position(None, "item-edit <n>").is_err());
    }
}
