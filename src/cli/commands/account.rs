use crate::api::ActivityApi;
use crate::cli::context::{CommandError, CommandResult, ShellContext};
use crate::cli::output;

use super::CommandDefinition;

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new("whoami", "Show the logged-in user", "whoami", cmd_whoami),
        CommandDefinition::new("login", "Log in to the server", "login <username>", cmd_login),
        CommandDefinition::new(
            "register",
            "Create an account and log in",
            "register <username> [email]",
            cmd_register,
        ),
        CommandDefinition::new("logout", "End the current session", "logout", cmd_logout),
    ]
}

fn cmd_whoami(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let user = context.client.current_user()?;
    match user.user_id {
        Some(id) => output::info(format!("Logged in as {} (#{id})", user.username)),
        None => output::info(format!("Logged in as {}", user.username)),
    }
    Ok(())
}

fn remember_session(context: &mut ShellContext, username: &str) -> CommandResult {
    context.config.session_cookie = context.client.session_cookie();
    context.config.username = Some(username.to_string());
    context.persist_config()
}

fn cmd_login(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some(username) = args.first() else {
        return Err(CommandError::InvalidArguments("usage: login <username>".into()));
    };
    let password = context.prompter.password("Password")?;
    let response = context.client.login(username, &password)?;
    remember_session(context, username)?;
    output::success(response.message.unwrap_or_else(|| format!("Welcome back, {username}!")));
    Ok(())
}

fn cmd_register(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some(username) = args.first() else {
        return Err(CommandError::InvalidArguments(
            "usage: register <username> [email]".into(),
        ));
    };
    let email = args.get(1).copied().unwrap_or_default();
    let password = context.prompter.password("Password")?;
    let confirmation = context.prompter.password("Confirm password")?;
    if password != confirmation {
        return Err(CommandError::Message("Passwords do not match.".into()));
    }
    let response = context.client.register(username, &password, email)?;
    remember_session(context, username)?;
    output::success(
        response
            .message
            .unwrap_or_else(|| format!("Account `{username}` created.")),
    );
    Ok(())
}

fn cmd_logout(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let result = context.client.logout();
    context.config.session_cookie = None;
    context.config.username = None;
    context.persist_config()?;
    context.refresh_from_config();
    if let Err(err) = result {
        output::warning(format!("Server logout failed: {err}"));
    }
    output::success("Logged out.");
    Ok(())
}
