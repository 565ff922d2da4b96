use anyhow::Result;
use owo_colors::OwoColorize;

use crate::context::AppContext;
use crate::render::{pluralize, render_by_day};
use crate::utils::tui::create_spinner;

/// The signed-in user's events, grouped by day.
pub async fn run(ctx: &AppContext) -> Result<()> {
    let username = ctx.require_username()?;

    let spinner = create_spinner("Fetching events...");
    let result = ctx.api.get_events_by_username(&username).await;
    spinner.finish_and_clear();

    let events = result?.data;

    if events.is_empty() {
        println!("{}", "No events found".dimmed());
        return Ok(());
    }

    println!(
        "{} {} for {}\n",
        events.len(),
        pluralize("event", events.len()),
        username.bold()
    );
    for line in render_by_day(&events) {
        println!("{line}");
    }

    Ok(())
}
