use crate::cli::context::{CommandResult, ShellContext};
use crate::cli::{item_form, output, render};

use super::{parse_position, CommandDefinition};

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new("items", "List custom checklist items", "items", cmd_items),
        CommandDefinition::new("item-add", "Add a custom checklist item", "item-add", cmd_add),
        CommandDefinition::new(
            "item-edit",
            "Edit a custom checklist item",
            "item-edit <n>",
            cmd_edit,
        ),
        CommandDefinition::new(
            "item-remove",
            "Remove a custom checklist item",
            "item-remove <n>",
            cmd_remove,
        ),
    ]
}

fn stale_index(position: usize) {
    output::warning(format!(
        "There is no custom item #{}. Run `items` to see the list.",
        position + 1
    ));
}

fn cmd_items(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    context.refresh_catalog()?;
    render::custom_items(context.items.items());
    Ok(())
}

fn cmd_add(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let Some(item) = item_form::collect(context.prompter.as_ref(), None)? else {
        output::info("Operation cancelled.");
        return Ok(());
    };
    let title = item.title();
    context.items.add(item)?;
    context.refresh_catalog()?;
    output::success(format!("Custom item added: {title}"));
    Ok(())
}

fn cmd_edit(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let index = parse_position(args.first(), "item-edit <n>")?;
    let Some(existing) = context.items.get(index).cloned() else {
        stale_index(index);
        return Ok(());
    };
    let Some(item) = item_form::collect(context.prompter.as_ref(), Some(&existing))? else {
        output::info("Operation cancelled.");
        return Ok(());
    };
    if context.items.update(index, item)? {
        context.refresh_catalog()?;
        output::success("Custom item updated.");
    } else {
        stale_index(index);
    }
    Ok(())
}

fn cmd_remove(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let index = parse_position(args.first(), "item-remove <n>")?;
    let Some(title) = context.items.get(index).map(|item| item.title()) else {
        stale_index(index);
        return Ok(());
    };
    if !context
        .prompter
        .confirm(&format!("Delete \"{title}\"?"), false)?
    {
        output::info("Operation cancelled.");
        return Ok(());
    }
    match context.items.remove(index)? {
        Some(_) => {
            context.refresh_catalog()?;
            output::success(format!("Custom item removed: {title}"));
        }
        None => stale_index(index),
    }
    Ok(())
}
