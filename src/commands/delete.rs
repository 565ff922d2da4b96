use anyhow::{Context, Result};
use dialoguer::Confirm;
use owo_colors::OwoColorize;

use crate::context::AppContext;
use crate::utils::tui::create_spinner;

#[derive(Debug)]
pub struct DeleteArgs {
    pub id: String,
    /// Skip the confirmation prompt.
    pub yes: bool,
}

pub async fn run(ctx: &AppContext, args: DeleteArgs) -> Result<()> {
    ctx.require_username()?;

    if !args.yes && ctx.is_interactive() {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete event #{}?", args.id))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("{}", "Cancelled".dimmed());
            return Ok(());
        }
    }

    let spinner = create_spinner(format!("Deleting event #{}...", args.id));
    let result = ctx.api.delete_event(&args.id).await;
    spinner.finish_and_clear();
    result.with_context(|| format!("Failed to delete event #{}", args.id))?;

    println!("{} event #{}", "-".red(), args.id);
    Ok(())
}
