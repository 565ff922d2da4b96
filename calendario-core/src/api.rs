//! Named operations against the calendario REST server.
//!
//! Each method maps to one fixed method + path. Responses come back as
//! [`ApiResponse`], which keeps the HTTP status and headers next to the
//! decoded body.

use reqwest::header::HeaderMap;
use reqwest::{Method, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::{CalendarioError, CalendarioResult};
use crate::event::{Event, filter_by_owner};
use crate::http::HttpClient;
use crate::session::{Session, SessionStore};

const LOGIN_PATH: &str = "/auth/login";
const REGISTER_PATH: &str = "/auth/register";
const LIST_EVENTS_PATH: &str = "/event/mostrartodo";
const CREATE_EVENT_PATH: &str = "/event/crearconjson";
const UPDATE_EVENT_PATH: &str = "/event/actualizar";
const DELETE_EVENT_PATH: &str = "/event/eliminarporid";

#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub data: T,
}

impl<T> ApiResponse<T> {
    /// Replace the body, keeping status and headers.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
        ApiResponse {
            status: self.status,
            headers: self.headers,
            data: f(self.data),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Fields a token may arrive under, in order of preference.
const TOKEN_FIELDS: &[&str] = &["token", "jwt", "accessToken", "access_token"];

/// Token-bearing body returned by login and register.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthResponse {
    pub token: String,
    pub username: Option<String>,
}

impl AuthResponse {
    /// Extract a token from a login/register body, if it carries one.
    ///
    /// Objects yield the first non-empty token field. A bare string body
    /// counts only when it is shaped like a JWT, so plain-text replies such
    /// as "registered" are never taken for a token.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Object(fields) => {
                let token = TOKEN_FIELDS.iter().find_map(|field| {
                    fields
                        .get(*field)
                        .and_then(Value::as_str)
                        .filter(|token| !token.is_empty())
                })?;
                let username = fields
                    .get("username")
                    .and_then(Value::as_str)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string);

                Some(AuthResponse {
                    token: token.to_string(),
                    username,
                })
            }
            Value::String(raw) => {
                let token = raw.trim();
                looks_like_jwt(token).then(|| AuthResponse {
                    token: token.to_string(),
                    username: None,
                })
            }
            _ => None,
        }
    }
}

/// `header.payload.signature` in base64url; the signature may be empty.
fn looks_like_jwt(candidate: &str) -> bool {
    let is_base64url = |part: &str| {
        part.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '='))
    };

    let parts: Vec<&str> = candidate.split('.').collect();
    matches!(parts.as_slice(), [header, payload, signature]
        if !header.is_empty() && !payload.is_empty()
            && is_base64url(*header) && is_base64url(*payload) && is_base64url(*signature))
}

#[derive(Debug, Clone)]
pub struct CalendarApi {
    client: HttpClient,
}

impl CalendarApi {
    pub fn new(client: HttpClient) -> Self {
        CalendarApi { client }
    }

    pub fn from_config(config: &ClientConfig, session: SessionStore) -> CalendarioResult<Self> {
        Ok(Self::new(HttpClient::from_config(config, session)?))
    }

    pub fn session(&self) -> &SessionStore {
        self.client.session()
    }

    /// POST /auth/login
    pub async fn login(&self, credentials: &Credentials) -> CalendarioResult<ApiResponse<Value>> {
        let builder = self.client.request(Method::POST, LOGIN_PATH).json(credentials);
        decode_lenient(self.client.send(builder).await?).await
    }

    /// POST /auth/register
    pub async fn register(
        &self,
        registration: &Registration,
    ) -> CalendarioResult<ApiResponse<Value>> {
        let builder = self
            .client
            .request(Method::POST, REGISTER_PATH)
            .json(registration);
        decode_lenient(self.client.send(builder).await?).await
    }

    /// GET /event/mostrartodo
    pub async fn get_events(&self) -> CalendarioResult<ApiResponse<Vec<Event>>> {
        let builder = self.client.request(Method::GET, LIST_EVENTS_PATH);
        decode(self.client.send(builder).await?).await
    }

    /// POST /event/crearconjson
    pub async fn create_event(&self, event: &Event) -> CalendarioResult<ApiResponse<Value>> {
        let builder = self.client.request(Method::POST, CREATE_EVENT_PATH).json(event);
        decode_lenient(self.client.send(builder).await?).await
    }

    /// PUT /event/actualizar?id=<id>
    pub async fn update_event(&self, id: &str, event: &Event) -> CalendarioResult<ApiResponse<Value>> {
        let builder = self
            .client
            .request(Method::PUT, UPDATE_EVENT_PATH)
            .query(&[("id", id)])
            .json(event);
        decode_lenient(self.client.send(builder).await?).await
    }

    /// DELETE /event/eliminarporid/<id>
    pub async fn delete_event(&self, id: &str) -> CalendarioResult<ApiResponse<Value>> {
        let builder = self
            .client
            .request_with_segment(Method::DELETE, DELETE_EVENT_PATH, id)?;
        decode_lenient(self.client.send(builder).await?).await
    }

    /// Fetch every event and keep those whose `nombre` equals `username`.
    pub async fn get_events_by_username(
        &self,
        username: &str,
    ) -> CalendarioResult<ApiResponse<Vec<Event>>> {
        match self.get_events().await {
            Ok(response) => Ok(response.map(|events| filter_by_owner(events, username))),
            Err(e) => {
                tracing::error!(error = %e, "Error fetching events");
                Err(e)
            }
        }
    }

    /// Log in and store the returned token (and username) in the session.
    pub async fn sign_in(&self, credentials: &Credentials) -> CalendarioResult<Session> {
        let response = self.login(credentials).await?;
        let auth = AuthResponse::from_value(&response.data)
            .ok_or_else(|| CalendarioError::Decode("login response carried no token".into()))?;

        Ok(self.store_auth(auth, &credentials.username))
    }

    /// Register. When the server answers with a token the user is signed
    /// in right away; otherwise the session is left as it was and `None`
    /// is returned.
    pub async fn sign_up(&self, registration: &Registration) -> CalendarioResult<Option<Session>> {
        let response = self.register(registration).await?;

        Ok(AuthResponse::from_value(&response.data)
            .map(|auth| self.store_auth(auth, &registration.username)))
    }

    pub fn sign_out(&self) {
        self.session().clear_auth();
    }

    fn store_auth(&self, auth: AuthResponse, fallback_username: &str) -> Session {
        let session = self.session();
        session.set_username(auth.username.unwrap_or_else(|| fallback_username.to_string()));
        session.set_token(auth.token);
        tracing::info!(username = %session.username(), "signed in");
        session.snapshot()
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> CalendarioResult<ApiResponse<T>> {
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.bytes().await?;

    let data = serde_json::from_slice(&bytes)
        .map_err(|e| CalendarioError::Decode(format!("{e} (status {status})")))?;

    Ok(ApiResponse {
        status,
        headers,
        data,
    })
}

/// Decode a body that may be empty or plain text: empty becomes `Null`,
/// non-JSON text becomes a JSON string.
async fn decode_lenient(response: Response) -> CalendarioResult<ApiResponse<Value>> {
    let status = response.status();
    let headers = response.headers().clone();
    let text = response.text().await?;

    let data = if text.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).unwrap_or(Value::String(text))
    };

    Ok(ApiResponse {
        status,
        headers,
        data,
    })
}
