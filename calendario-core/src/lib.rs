//! Core library for the calendario client.
//!
//! - `session`: the signed-in user's name and bearer token
//! - `http`: the authenticated REST client with request/response interception
//! - `api`: named operations against the calendario server
//! - `email`: verification and invitation emails through a transactional provider
//! - `config`: client configuration loaded from disk and environment

pub mod api;
pub mod config;
pub mod constants;
pub mod email;
pub mod error;
pub mod event;
pub mod http;
pub mod session;

pub use api::{ApiResponse, AuthResponse, CalendarApi, Credentials, Registration};
pub use error::{CalendarioError, CalendarioResult};
pub use event::Event;
pub use session::{Session, SessionFile, SessionStore};

pub use reqwest::StatusCode;
