use anyhow::Result;
use calendario_core::Event;
use dialoguer::Select;
use owo_colors::OwoColorize;

use super::{delete, edit};
use crate::context::AppContext;
use crate::render::{pluralize, render_detailed};
use crate::utils::tui::create_spinner;

#[derive(Debug, Default)]
pub struct EventsArgs {
    /// Show everyone's events, not just the signed-in user's.
    pub all: bool,
}

/// List events with their ids; interactively, pick one to edit or delete.
pub async fn run(ctx: &AppContext, args: EventsArgs) -> Result<()> {
    let username = ctx.require_username()?;

    let spinner = create_spinner("Fetching events...");
    let result = if args.all {
        ctx.api.get_events().await
    } else {
        ctx.api.get_events_by_username(&username).await
    };
    spinner.finish_and_clear();

    let events = result?.data;

    if events.is_empty() {
        println!("{}", "No events found".dimmed());
        return Ok(());
    }

    println!("{} {}\n", events.len(), pluralize("event", events.len()));
    for event in &events {
        println!("{}", render_detailed(event));
    }

    if ctx.is_interactive() {
        manage(ctx, &events).await?;
    }

    Ok(())
}

async fn manage(ctx: &AppContext, events: &[Event]) -> Result<()> {
    let mut items: Vec<String> = events
        .iter()
        .map(|e| format!("#{} {}", e.id().unwrap_or_default(), e))
        .collect();
    items.push("Done".to_string());

    println!();
    let choice = Select::new()
        .with_prompt("Manage an event")
        .items(&items)
        .default(items.len() - 1)
        .interact()?;

    let Some(event) = events.get(choice) else {
        return Ok(());
    };
    let Some(id) = event.id() else {
        anyhow::bail!("Event '{}' has no id", event);
    };

    let action = Select::new()
        .with_prompt(format!("{event}"))
        .items(&["Edit", "Delete", "Cancel"])
        .default(0)
        .interact()?;

    match action {
        0 => edit::run(ctx, edit::EditArgs::for_id(id)).await,
        1 => delete::run(ctx, delete::DeleteArgs { id, yes: false }).await,
        _ => Ok(()),
    }
}
