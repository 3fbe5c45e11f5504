pub mod commands;
pub mod context;
mod item_form;
pub mod output;
pub mod prompter;
pub mod render;
mod shell;
mod wizard_runner;

pub use shell::{run_cli, run_command};
