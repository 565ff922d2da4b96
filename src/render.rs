//! Terminal rendering for calendario types.
//!
//! Extension traits that add colored output to calendario-core types using
//! owo_colors.

use calendario_core::Event;
use chrono::{DateTime, Local, NaiveDate, Utc};
use owo_colors::OwoColorize;

pub trait Render {
    fn render(&self) -> String;
}

impl Render for Event {
    fn render(&self) -> String {
        let time = format_time(self.start());
        let id = self.id().map(|id| format!("#{id}")).unwrap_or_default();
        format!("  {} {} {}", time, self, id.dimmed())
    }
}

/// One line per event with id, owner and full time span, for management views.
pub fn render_detailed(event: &Event) -> String {
    let id = event.id().unwrap_or_else(|| "?".to_string());
    let owner = event.owner().unwrap_or("-");
    let span = format_span(event.start(), event.end());

    format!(
        "{:>6}  {}  {}  {}",
        id.bold(),
        event,
        span.dimmed(),
        format!("[{owner}]").dimmed()
    )
}

/// Events sorted by start and grouped under day headings ("Today",
/// "Tomorrow", "Wed Feb 25"). Events without a start go last.
pub fn render_by_day(events: &[Event]) -> Vec<String> {
    let mut sorted: Vec<&Event> = events.iter().collect();
    sorted.sort_by_key(|e| (e.start().is_none(), e.start()));

    let today = Local::now().date_naive();
    let mut lines = Vec::new();
    let mut current_label: Option<String> = None;

    for event in sorted {
        let label = match event.start() {
            Some(start) => date_label(start.with_timezone(&Local).date_naive(), today),
            None => "No date".to_string(),
        };

        if current_label.as_ref() != Some(&label) {
            if current_label.is_some() {
                lines.push(String::new());
            }
            lines.push(label.bold().to_string());
            current_label = Some(label);
        }

        lines.push(event.render());
    }

    lines
}

fn date_label(date: NaiveDate, today: NaiveDate) -> String {
    match (date - today).num_days() {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        -1 => "Yesterday".to_string(),
        _ => date.format("%a %b %-d %Y").to_string(),
    }
}

fn format_time(start: Option<DateTime<Utc>>) -> String {
    match start {
        Some(dt) => format!("{:>7}", dt.with_timezone(&Local).format("%H:%M")),
        None => format!("{:>7}", "--:--"),
    }
}

fn format_span(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> String {
    let fmt = |dt: DateTime<Utc>| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string();

    match (start, end) {
        (Some(s), Some(e)) => format!("{} → {}", fmt(s), fmt(e)),
        (Some(s), None) => fmt(s),
        _ => "no date".to_string(),
    }
}

pub fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}
