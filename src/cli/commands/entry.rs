use std::{path::PathBuf, sync::Arc};

use chrono::Local;

use crate::api::{ActivityApi, MILESTONE_DAYS};
use crate::cli::context::{CommandError, CommandResult, ShellContext};
use crate::cli::wizard_runner::{self, WizardExit};
use crate::cli::{output, render};
use crate::service::{parse_date, shift_date, AnswerSource, DailyLog, DateIndicator, LoadOutcome};
use crate::utils::paths::PathResolver;

use super::CommandDefinition;

const HISTORY_LIMIT: usize = 10;

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "log",
            "Fill in the daily checklist",
            "log [YYYY-MM-DD|today|prev|next]",
            cmd_log,
        ),
        CommandDefinition::new("history", "Show recent entries", "history", cmd_history),
        CommandDefinition::new("delete", "Delete an entry", "delete <id>", cmd_delete),
        CommandDefinition::new("stats", "Show progress statistics", "stats", cmd_stats),
        CommandDefinition::new(
            "milestone",
            "Show insights for a day milestone",
            "milestone [10|25|45|70|100]",
            cmd_milestone,
        ),
        CommandDefinition::new(
            "export",
            "Download all entries as an Excel workbook",
            "export [directory]",
            cmd_export,
        ),
    ]
}

fn source_label(source: AnswerSource) -> &'static str {
    match source {
        AnswerSource::Server => "saved checklist",
        AnswerSource::LocalCache => "local copy",
        AnswerSource::Summary => "entry summary",
    }
}

fn print_totals(context: &ShellContext) {
    match context.client.stats() {
        Ok(stats) => output::info(format!(
            "Days logged: {}  Entries: {}  Average score: {:.2}",
            stats.total_days, stats.total_activities, stats.avg_score
        )),
        Err(err) => tracing::debug!(error = %err, "stats refresh skipped"),
    }
}

fn cmd_log(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let today = context.clock.today();
    let date = match args.first().map(|arg| arg.to_lowercase()).as_deref() {
        None | Some("today") => today,
        Some("prev") => shift_date(context.current_date, -1),
        Some("next") => shift_date(context.current_date, 1),
        Some(raw) => parse_date(raw)?,
    };
    context.current_date = date;
    context.refresh_catalog()?;

    let log = DailyLog::new(
        &context.client,
        Arc::clone(&context.store),
        context.config.activity_name.clone(),
    );
    let editing = match log.load_for_date(date, &mut context.session, context.items.items()) {
        Ok(LoadOutcome::Loaded {
            activity_id,
            source,
        }) => {
            output::hint(format!(
                "Editing entry #{activity_id} (answers from the {}).",
                source_label(source)
            ));
            Some(activity_id)
        }
        Ok(LoadOutcome::Fresh) => None,
        Err(err) => {
            output::warning(format!("Could not load existing entries: {err}"));
            context.session.reset();
            None
        }
    };

    render::date_banner(date, DateIndicator::for_date(date, today));
    if wizard_runner::run(context, date, editing)? == WizardExit::Saved {
        print_totals(context);
    }
    Ok(())
}

fn cmd_history(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let activities = context.daily_log().recent_activities(HISTORY_LIMIT)?;
    render::activities(&activities);
    Ok(())
}

fn cmd_delete(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let id = args
        .first()
        .and_then(|raw| raw.trim_start_matches('#').parse::<i64>().ok())
        .ok_or_else(|| CommandError::InvalidArguments("usage: delete <id>".into()))?;
    if !context
        .prompter
        .confirm(&format!("Delete entry #{id}?"), false)?
    {
        output::info("Operation cancelled.");
        return Ok(());
    }
    context.daily_log().delete_activity(id)?;
    output::success(format!("Entry #{id} deleted."));
    print_totals(context);
    Ok(())
}

fn cmd_stats(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let dashboard = context.daily_log().dashboard()?;
    render::dashboard(&dashboard);
    Ok(())
}

fn cmd_milestone(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let days = match args.first() {
        Some(raw) => raw.parse::<u32>().map_err(|_| {
            CommandError::InvalidArguments("usage: milestone [10|25|45|70|100]".into())
        })?,
        None => {
            let labels: Vec<String> = MILESTONE_DAYS
                .iter()
                .map(|days| format!("{days} days"))
                .collect();
            match context.prompter.select("Milestone", &labels, 0)? {
                Some(index) => MILESTONE_DAYS[index],
                None => {
                    output::info("Operation cancelled.");
                    return Ok(());
                }
            }
        }
    };
    let insights = context.daily_log().milestone(days)?;
    render::milestone(&insights);
    Ok(())
}

fn cmd_export(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let dir = args
        .first()
        .map(|raw| PathBuf::from(*raw))
        .unwrap_or_else(|| PathResolver::exports_dir_in(&context.base_dir));
    let path = context
        .daily_log()
        .export_excel(&dir, Local::now().naive_local())?;
    output::success(format!("Export saved to {}", path.display()));
    Ok(())
}
