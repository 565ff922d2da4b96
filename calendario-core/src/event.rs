//! Events as the calendario server sends them.
//!
//! The server owns the event shape, so an `Event` keeps the whole JSON
//! object and only offers typed access to the fields the client reads.
//! Unknown fields survive a read-modify-write cycle untouched.

use std::fmt;

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const FIELD_ID: &str = "id";
/// Owner's username.
pub const FIELD_OWNER: &str = "nombre";
pub const FIELD_TITLE: &str = "titulo";
pub const FIELD_DESCRIPTION: &str = "descripcion";
pub const FIELD_START: &str = "fechaInicio";
pub const FIELD_END: &str = "fechaFin";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Event(Map<String, Value>);

impl Event {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Event(fields)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Server id, rendered as a string whether it was sent as a number or a string.
    pub fn id(&self) -> Option<String> {
        match self.0.get(FIELD_ID)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn owner(&self) -> Option<&str> {
        self.get_str(FIELD_OWNER)
    }

    /// Exact, case-sensitive match on the owner field.
    pub fn is_owned_by(&self, username: &str) -> bool {
        self.owner() == Some(username)
    }

    pub fn title(&self) -> Option<&str> {
        self.get_str(FIELD_TITLE).or_else(|| self.get_str("title"))
    }

    pub fn description(&self) -> Option<&str> {
        self.get_str(FIELD_DESCRIPTION)
    }

    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.get_str(FIELD_START).and_then(parse_timestamp)
    }

    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.get_str(FIELD_END).and_then(parse_timestamp)
    }

    pub fn set_start(&mut self, start: DateTime<Utc>) {
        self.set(FIELD_START, format_timestamp(start));
    }

    pub fn set_end(&mut self, end: DateTime<Utc>) {
        self.set(FIELD_END, format_timestamp(end));
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title().unwrap_or("(untitled)"))
    }
}

/// Parse a server timestamp. Accepts RFC 3339 and the zone-less
/// `YYYY-MM-DDTHH:MM[:SS]` form, which is read as local time.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ]
    .iter()
    .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    .and_then(|naive| Local.from_local_datetime(&naive).earliest())
    .map(|dt| dt.with_timezone(&Utc))
}

/// Format a timestamp the way the server stores it: local time, no zone.
pub fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.with_timezone(&Local).format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Keep the events owned by `username`, preserving order.
pub fn filter_by_owner(events: Vec<Event>, username: &str) -> Vec<Event> {
    events
        .into_iter()
        .filter(|event| event.is_owned_by(username))
        .collect()
}
