//! Text renderings of steps, lists and charts.

use chrono::NaiveDate;
use colored::Colorize;

use crate::api::{Activity, MilestoneInsights};
use crate::custom_items::CustomItem;
use crate::service::{DateIndicator, Dashboard, TrendPoint};
use crate::wizard::StepView;

use super::output;

const BAR_WIDTH: usize = 20;
const MAX_SCORE: f64 = 10.0;
const SUMMARY_PREVIEW: usize = 60;

pub fn progress_bar(fraction: f64, width: usize) -> String {
    let filled = ((fraction.clamp(0.0, 1.0) * width as f64).round()) as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

pub fn step_header(view: &StepView) {
    let icon = view.step.icon.as_deref().map(|icon| format!("{icon} ")).unwrap_or_default();
    output::blank_line();
    output::info(format!(
        "{} Step {} of {}",
        progress_bar(view.navigation.progress, BAR_WIDTH),
        view.index + 1,
        view.total
    ));
    output::info(format!("{icon}{}", view.step.title).bold());
}

pub fn date_banner(date: NaiveDate, indicator: DateIndicator) {
    output::section(format!(
        "{} · {}",
        date.format("%A, %B %-d, %Y"),
        indicator.label()
    ));
}

pub fn trend_line(point: &TrendPoint) -> String {
    let filled = ((point.score / MAX_SCORE).clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize;
    format!(
        "{:<14} {:<width$} {:>5.2}",
        point.label,
        "█".repeat(filled),
        point.score,
        width = BAR_WIDTH
    )
}

pub fn dashboard(dashboard: &Dashboard) {
    output::section("Progress");
    output::info(format!("Logged in as {}", dashboard.user.username));
    output::info(format!("Days logged      : {}", dashboard.stats.total_days));
    output::info(format!("Total entries    : {}", dashboard.stats.total_activities));
    output::info(format!("Average score    : {:.2}", dashboard.stats.avg_score));
    if dashboard.trend.is_empty() {
        output::info("No entries yet. Start with `log`.");
        return;
    }
    output::section("Trend");
    for point in &dashboard.trend {
        output::info(trend_line(point));
    }
}

fn preview(text: &str) -> String {
    let mut preview: String = text.chars().take(SUMMARY_PREVIEW).collect();
    if text.chars().count() > SUMMARY_PREVIEW {
        preview.push('…');
    }
    preview
}

pub fn activities(activities: &[Activity]) {
    output::section("Recent entries");
    if activities.is_empty() {
        output::info("No entries yet.");
        return;
    }
    for activity in activities {
        output::info(format!(
            "#{:<5} {}  score {:>2}/10  {}",
            activity.id,
            activity.date,
            activity.progress_score.unwrap_or(0),
            preview(activity.description())
        ));
        if !activity.notes().trim().is_empty() {
            output::hint(format!("       {}", preview(activity.notes())));
        }
    }
}

pub fn milestone(insights: &MilestoneInsights) {
    output::section(format!("🏆 {}-Day Milestone", insights.milestone_day));
    output::info(format!("Total entries      : {}", insights.total_activities));
    output::info(format!(
        "Average score      : {:.2}",
        insights.avg_progress_score
    ));
    output::info(format!(
        "Activity types     : {}",
        insights.unique_activity_types
    ));
    output::info(format!(
        "Total time (hours) : {:.2}",
        insights.total_duration_hours
    ));
    for (name, count) in &insights.activity_distribution {
        output::info(format!("  {name:<24} {count}"));
    }
}

pub fn custom_items(items: &[CustomItem]) {
    output::section("Custom checklist items");
    if items.is_empty() {
        output::info("No custom items yet. Add one with `item-add`.");
        return;
    }
    for (index, item) in items.iter().enumerate() {
        output::info(format!(
            "{:>2}. {}  ({})",
            index + 1,
            item.title(),
            item.type_display()
        ));
    }
}
