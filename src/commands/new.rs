use anyhow::{Context, Result};
use calendario_core::Event;
use calendario_core::event::{FIELD_DESCRIPTION, FIELD_OWNER, FIELD_TITLE};
use chrono::{DateTime, Duration, Utc};
use owo_colors::OwoColorize;

use super::parse_datetime;
use crate::context::AppContext;
use crate::utils::tui::{create_spinner, prompt_optional, text_or_prompt};

#[derive(Debug, Default)]
pub struct NewArgs {
    pub title: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub description: Option<String>,
    /// Email addresses to invite.
    pub invite: Vec<String>,
}

pub async fn run(ctx: &AppContext, args: NewArgs) -> Result<()> {
    let username = ctx.require_username()?;
    let interactive = args.title.is_none() || args.start.is_none();

    let title = text_or_prompt(args.title, "  Title")?;
    let start = parse_datetime(&text_or_prompt(args.start, "  Start (YYYY-MM-DD HH:MM)")?)?;

    let end = match args.end {
        Some(end) => parse_datetime(&end)?,
        None if interactive => match prompt_optional("  End (skip for 1 hour)")? {
            Some(end) => parse_datetime(&end)?,
            None => default_end(start),
        },
        None => default_end(start),
    };

    if end < start {
        anyhow::bail!("Event ends before it starts");
    }

    let description = match args.description {
        Some(d) => Some(d),
        None if interactive => prompt_optional("  Description (skip)")?,
        None => None,
    };

    let event = build_event(&username, &title, start, end, description.as_deref());

    let spinner = create_spinner("Creating event...");
    let result = ctx.api.create_event(&event).await;
    spinner.finish_and_clear();
    result.context("Failed to create event")?;

    println!(
        "{} {} {}",
        "+".green(),
        title.green(),
        start.with_timezone(&chrono::Local).format("%a %b %-d %H:%M").dimmed()
    );

    send_invitations(ctx, &args.invite, &title, start, end, &username).await;

    Ok(())
}

fn default_end(start: DateTime<Utc>) -> DateTime<Utc> {
    start + Duration::hours(1)
}

fn build_event(
    owner: &str,
    title: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    description: Option<&str>,
) -> Event {
    let mut event = Event::new();
    event.set(FIELD_TITLE, title);
    event.set(FIELD_OWNER, owner);
    event.set_start(start);
    event.set_end(end);
    if let Some(description) = description {
        event.set(FIELD_DESCRIPTION, description);
    }
    event
}

/// Invitation failures are reported but never fail the command: the event
/// already exists.
async fn send_invitations(
    ctx: &AppContext,
    emails: &[String],
    title: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    inviter: &str,
) {
    for email in emails {
        let sent = ctx
            .notifier
            .send_event_invitation_email(email, title, start, end, inviter)
            .await;

        if sent {
            println!("  {} invited {}", "✉".green(), email);
        } else {
            println!("  {} could not invite {}", "✗".red(), email);
        }
    }
}
