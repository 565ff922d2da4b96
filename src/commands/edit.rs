use anyhow::{Context, Result};
use calendario_core::Event;
use calendario_core::event::{FIELD_DESCRIPTION, FIELD_TITLE};
use chrono::{DateTime, Local, Utc};
use owo_colors::OwoColorize;

use super::parse_datetime;
use crate::context::AppContext;
use crate::utils::tui::{create_spinner, prompt_with_default};

#[derive(Debug, Default)]
pub struct EditArgs {
    pub id: String,
    pub title: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub description: Option<String>,
}

impl EditArgs {
    pub fn for_id(id: impl Into<String>) -> Self {
        EditArgs {
            id: id.into(),
            ..Default::default()
        }
    }

    fn has_changes(&self) -> bool {
        self.title.is_some() || self.start.is_some() || self.end.is_some() || self.description.is_some()
    }
}

/// Changes to apply to an event. `None` keeps the current value.
#[derive(Debug, Default)]
struct EventChanges {
    title: Option<String>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    description: Option<String>,
}

pub async fn run(ctx: &AppContext, args: EditArgs) -> Result<()> {
    ctx.require_username()?;

    let spinner = create_spinner("Fetching event...");
    let result = ctx.api.get_events().await;
    spinner.finish_and_clear();

    let current = result?
        .data
        .into_iter()
        .find(|e| e.id().as_deref() == Some(args.id.as_str()))
        .ok_or_else(|| anyhow::anyhow!("Event #{} not found", args.id))?;

    let changes = if args.has_changes() {
        EventChanges {
            title: args.title.clone(),
            start: args.start.as_deref().map(parse_datetime).transpose()?,
            end: args.end.as_deref().map(parse_datetime).transpose()?,
            description: args.description.clone(),
        }
    } else if ctx.is_interactive() {
        prompt_changes(&current)?
    } else {
        anyhow::bail!("Nothing to change. Pass --title, --start, --end or --description.");
    };

    let updated = apply_changes(current, changes)?;

    let spinner = create_spinner(format!("Updating event #{}...", args.id));
    let result = ctx.api.update_event(&args.id, &updated).await;
    spinner.finish_and_clear();
    result.with_context(|| format!("Failed to update event #{}", args.id))?;

    println!("{} {} {}", "~".yellow(), updated.to_string().yellow(), format!("#{}", args.id).dimmed());
    Ok(())
}

fn prompt_changes(current: &Event) -> Result<EventChanges> {
    let fmt = |dt: Option<DateTime<Utc>>| {
        dt.map(|d| d.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default()
    };
    let current_title = current.title().unwrap_or_default();
    let current_start = fmt(current.start());
    let current_end = fmt(current.end());
    let current_description = current.description().unwrap_or_default();

    let title = prompt_with_default("  Title", current_title)?;
    let start = prompt_with_default("  Start", &current_start)?;
    let end = prompt_with_default("  End", &current_end)?;
    let description = prompt_with_default("  Description", current_description)?;

    Ok(EventChanges {
        title: changed_text(&title, current_title),
        start: changed_time(&start, &current_start)?,
        end: changed_time(&end, &current_end)?,
        description: changed_text(&description, current_description),
    })
}

/// `None` when the answer is the pre-filled value.
fn changed_text(answer: &str, prefilled: &str) -> Option<String> {
    (answer != prefilled).then(|| answer.to_string())
}

/// `None` when the answer is empty or the pre-filled value, so an untouched
/// time is sent back exactly as the server stored it.
fn changed_time(answer: &str, prefilled: &str) -> Result<Option<DateTime<Utc>>> {
    let answer = answer.trim();
    if answer.is_empty() || answer == prefilled {
        return Ok(None);
    }

    parse_datetime(answer).map(Some)
}

/// Apply changes on top of the server's copy so fields the client does not
/// know about are sent back unchanged.
fn apply_changes(mut event: Event, changes: EventChanges) -> Result<Event> {
    if let Some(title) = changes.title {
        event.set(FIELD_TITLE, title);
    }
    if let Some(start) = changes.start {
        event.set_start(start);
    }
    if let Some(end) = changes.end {
        event.set_end(end);
    }
    if let Some(description) = changes.description {
        event.set(FIELD_DESCRIPTION, description);
    }

    if let (Some(start), Some(end)) = (event.start(), event.end())
        && end < start
    {
        anyhow::bail!("Event ends before it starts");
    }

    Ok(event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn current() -> Event {
        serde_json::from_value(json!({
            "id": 4,
            "nombre": "alice",
            "titulo": "Old",
            "fechaInicio": "2025-03-20T15:00:00",
            "fechaFin": "2025-03-20T16:00:00",
            "color": "blue"
        }))
        .unwrap()
    }

    #[test]
    fn changes_keep_unknown_fields() {
        let updated = apply_changes(
            current(),
            EventChanges {
                title: Some("New".into()),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(updated.title(), Some("New"));
        assert_eq!(updated.get("color"), Some(&json!("blue")));
        assert_eq!(updated.owner(), Some("alice"));
        assert_eq!(updated.start(), current().start());
    }

    #[test]
    fn end_before_start_is_rejected() {
        let err = apply_changes(
            current(),
            EventChanges {
                end: parse_datetime("2025-03-20 14:00").ok(),
                ..Default::default()
            },
        )
        .unwrap_err();

        assert!(err.to_string().contains("ends before"));
    }

    #[test]
    fn untouched_answers_keep_current_values() {
        assert_eq!(changed_time("", "").unwrap(), None);
        assert_eq!(changed_time("  ", "").unwrap(), None);
        assert_eq!(
            changed_time("2025-03-20 15:00:30", "2025-03-20 15:00:30").unwrap(),
            None
        );
        assert_eq!(changed_text("Old", "Old"), None);
        assert_eq!(changed_text("New", "Old"), Some("New".to_string()));
    }

    #[test]
    fn edited_time_is_parsed() {
        assert_eq!(
            changed_time("2025-03-21 09:00", "").unwrap(),
            parse_datetime("2025-03-21 09:00").ok()
        );
        assert!(changed_time("soon", "").is_err());
    }

    #[test]
    fn undated_event_keeps_no_dates_when_only_title_changes() {
        let undated: Event = serde_json::from_value(json!({ "id": 5, "titulo": "Draft" })).unwrap();
        let changes = EventChanges {
            title: changed_text("Final", "Draft"),
            start: changed_time("", "").unwrap(),
            end: changed_time("", "").unwrap(),
            description: changed_text("", ""),
        };

        let updated = apply_changes(undated, changes).unwrap();

        assert_eq!(updated.title(), Some("Final"));
        assert_eq!(updated.get("fechaInicio"), None);
        assert_eq!(updated.get("descripcion"), None);
    }

    #[test]
    fn seconds_survive_an_untouched_edit() {
        let mut event = current();
        event.set("fechaInicio", "2025-03-20T15:00:45");
        let prefilled = event
            .start()
            .map(|d| d.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap();

        let changes = EventChanges {
            start: changed_time(&prefilled, &prefilled).unwrap(),
            ..Default::default()
        };
        let updated = apply_changes(event, changes).unwrap();

        assert_eq!(updated.get("fechaInicio"), Some(&json!("2025-03-20T15:00:45")));
    }

    #[test]
    fn empty_args_have_no_changes() {
        assert!(!EditArgs::for_id("1").has_changes());
        assert!(EditArgs {
            description: Some(String::new()),
            ..EditArgs::for_id("1")
        }
        .has_changes());
    }
}
