//! Verification and invitation emails through a transactional email API.
//!
//! The notifier never propagates delivery errors: each send logs the failure
//! and reports `false`, leaving the caller to decide what to show.

use std::future::Future;

use chrono::{DateTime, Local, Utc};
use rand::Rng;
use serde::Serialize;

use crate::config::EmailConfig;
use crate::constants::VERIFICATION_CODE_TTL_MINUTES;
use crate::error::{CalendarioError, CalendarioResult};

/// A contact in a transactional message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contact {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub email: String,
}

/// Message body as accepted by Brevo's `POST /smtp/email`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendSmtpEmail {
    pub sender: Contact,
    pub to: Vec<Contact>,
    pub subject: String,
    pub html_content: String,
}

/// Something that can deliver a transactional message.
pub trait TransactionalEmail {
    fn send_transac_email(
        &self,
        message: &SendSmtpEmail,
    ) -> impl Future<Output = CalendarioResult<()>> + Send;
}

/// Brevo (ex-Sendinblue) HTTP transport.
#[derive(Debug, Clone)]
pub struct BrevoClient {
    http: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
}

impl BrevoClient {
    pub fn new(api_url: &str, api_key: Option<String>) -> Self {
        BrevoClient {
            http: reqwest::Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn from_config(config: &EmailConfig) -> Self {
        Self::new(&config.api_url, config.api_key.clone())
    }
}

impl TransactionalEmail for BrevoClient {
    async fn send_transac_email(&self, message: &SendSmtpEmail) -> CalendarioResult<()> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| CalendarioError::Email("no email API key configured".into()))?;

        let response = self
            .http
            .post(format!("{}/smtp/email", self.api_url))
            .header("api-key", api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(message)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CalendarioError::Email(format!("{status}: {body}")));
        }

        Ok(())
    }
}

/// Sends the two message kinds the app needs.
#[derive(Debug, Clone)]
pub struct EmailNotifier<T = BrevoClient> {
    transport: T,
    config: EmailConfig,
}

impl EmailNotifier<BrevoClient> {
    pub fn from_config(config: &EmailConfig) -> Self {
        EmailNotifier::new(BrevoClient::from_config(config), config.clone())
    }
}

impl<T: TransactionalEmail> EmailNotifier<T> {
    pub fn new(transport: T, config: EmailConfig) -> Self {
        EmailNotifier { transport, config }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Email a verification code. Returns whether the provider accepted it.
    pub async fn send_verification_email(&self, email: &str, code: &str) -> bool {
        let message = match verification_message(&self.config, email, code) {
            Ok(message) => message,
            Err(e) => {
                tracing::error!(error = %e, "Error enviando email");
                return false;
            }
        };

        self.deliver(&message, "Error enviando email").await
    }

    /// Email an invitation to an event. Returns whether the provider accepted it.
    pub async fn send_event_invitation_email(
        &self,
        email: &str,
        event_title: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        inviter_name: &str,
    ) -> bool {
        let invitation = Invitation {
            event_title,
            start,
            end,
            inviter_name,
        };

        let message = match invitation_message(&self.config, email, &invitation) {
            Ok(message) => message,
            Err(e) => {
                tracing::error!(error = %e, "Error enviando invitación");
                return false;
            }
        };

        self.deliver(&message, "Error enviando invitación").await
    }

    async fn deliver(&self, message: &SendSmtpEmail, failure: &str) -> bool {
        match self.transport.send_transac_email(message).await {
            Ok(()) => {
                tracing::info!(to = ?message.to, subject = %message.subject, "email sent");
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "{failure}");
                false
            }
        }
    }
}

struct Invitation<'a> {
    event_title: &'a str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    inviter_name: &'a str,
}

fn sender(config: &EmailConfig, address: Option<&str>) -> CalendarioResult<Contact> {
    let email = address
        .filter(|a| !a.is_empty())
        .ok_or_else(|| CalendarioError::Email("no sender address configured".into()))?;

    Ok(Contact {
        name: Some(config.sender_name.clone()),
        email: email.to_string(),
    })
}

fn recipient(email: &str) -> Contact {
    Contact {
        name: None,
        email: email.to_string(),
    }
}

fn verification_message(
    config: &EmailConfig,
    email: &str,
    code: &str,
) -> CalendarioResult<SendSmtpEmail> {
    Ok(SendSmtpEmail {
        sender: sender(config, config.verification_sender.as_deref())?,
        to: vec![recipient(email)],
        subject: "Código de verificación".to_string(),
        html_content: format!(
            "\n<p>Tu código de verificación es: <strong>{}</strong></p>\n\
             <p>Este código expirará en {VERIFICATION_CODE_TTL_MINUTES} minutos.</p>\n",
            escape_html(code)
        ),
    })
}

fn invitation_message(
    config: &EmailConfig,
    email: &str,
    invitation: &Invitation<'_>,
) -> CalendarioResult<SendSmtpEmail> {
    let title = escape_html(invitation.event_title);

    Ok(SendSmtpEmail {
        sender: sender(config, config.invitation_sender())?,
        to: vec![recipient(email)],
        subject: format!("Invitación a evento: {}", invitation.event_title),
        html_content: format!(
            "\n<h3>Has sido invitado a un evento</h3>\n\
             <p><strong>Evento:</strong> {title}</p>\n\
             <p><strong>Inició:</strong> {}</p>\n\
             <p><strong>Finaliza:</strong> {}</p>\n\
             <p><strong>Invitado por:</strong> {}</p>\n\
             <p>Por favor inicia sesión en la aplicación para ver los detalles.</p>\n",
            format_local(invitation.start),
            format_local(invitation.end),
            escape_html(invitation.inviter_name),
        ),
    })
}

fn format_local(dt: DateTime<Utc>) -> String {
    dt.with_timezone(&Local).format("%d/%m/%Y, %H:%M:%S").to_string()
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Six random digits, zero-padded.
pub fn generate_verification_code() -> String {
    let n: u32 = rand::rng().random_range(0..1_000_000);
    format!("{n:06}")
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use chrono::TimeZone;
    use serde_json::Value;

    use super::*;

    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<SendSmtpEmail>>,
        fail: bool,
    }

    impl TransactionalEmail for RecordingTransport {
        async fn send_transac_email(&self, message: &SendSmtpEmail) -> CalendarioResult<()> {
            if self.fail {
                return Err(CalendarioError::Email("provider unavailable".into()));
            }
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    fn config() -> EmailConfig {
        EmailConfig {
            api_key: Some("key".into()),
            verification_sender: Some("verify@example.com".into()),
            invitation_sender: Some("events@example.com".into()),
            ..EmailConfig::default()
        }
    }

    fn notifier(fail: bool) -> EmailNotifier<RecordingTransport> {
        let transport = RecordingTransport {
            fail,
            ..RecordingTransport::default()
        };
        EmailNotifier::new(transport, config())
    }

    #[tokio::test]
    async fn verification_email_contains_code() {
        let notifier = notifier(false);

        assert!(notifier.send_verification_email("ana@example.com", "123456").await);

        let sent = notifier.transport().sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "Código de verificación");
        assert_eq!(sent[0].sender.email, "verify@example.com");
        assert_eq!(sent[0].to, vec![recipient("ana@example.com")]);
        assert!(sent[0].html_content.contains("<strong>123456</strong>"));
        assert!(sent[0].html_content.contains("10 minutos"));
    }

    #[tokio::test]
    async fn invitation_email_names_event_and_inviter() {
        let notifier = notifier(false);
        let start = Utc.with_ymd_and_hms(2025, 3, 20, 15, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 3, 20, 16, 0, 0).unwrap();

        assert!(
            notifier
                .send_event_invitation_email("bo@example.com", "Demo <1>", start, end, "alice")
                .await
        );

        let sent = notifier.transport().sent.lock().unwrap();
        assert_eq!(sent[0].subject, "Invitación a evento: Demo <1>");
        assert_eq!(sent[0].sender.email, "events@example.com");
        assert!(sent[0].html_content.contains("Demo &lt;1&gt;"));
        assert!(sent[0].html_content.contains("<strong>Invitado por:</strong> alice"));
        assert!(sent[0].html_content.contains(&format_local(start)));
    }

    #[tokio::test]
    async fn provider_failure_returns_false() {
        let notifier = notifier(true);
        let now = Utc::now();

        assert!(!notifier.send_verification_email("ana@example.com", "1").await);
        assert!(
            !notifier
                .send_event_invitation_email("ana@example.com", "t", now, now, "x")
                .await
        );
    }

    #[tokio::test]
    async fn missing_sender_returns_false_without_sending() {
        let notifier = EmailNotifier::new(RecordingTransport::default(), EmailConfig::default());

        assert!(!notifier.send_verification_email("ana@example.com", "1").await);
        assert!(notifier.transport().sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn brevo_without_key_returns_false() {
        let config = EmailConfig {
            api_key: None,
            ..config()
        };
        let notifier = EmailNotifier::from_config(&config);

        assert!(!notifier.send_verification_email("ana@example.com", "1").await);
    }

    #[tokio::test]
    async fn brevo_posts_camel_case_payload_with_api_key() {
        async fn smtp(headers: HeaderMap, Json(body): Json<Value>) -> StatusCode {
            let key_ok = headers.get("api-key").is_some_and(|v| v == "key");
            let shape_ok = body["htmlContent"].is_string()
                && body["to"][0]["email"] == "ana@example.com"
                && body["sender"]["name"] == "Tu Calendario";
            if key_ok && shape_ok {
                StatusCode::CREATED
            } else {
                StatusCode::BAD_REQUEST
            }
        }

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let app = Router::new().route("/smtp/email", post(smtp));
            axum::serve(listener, app).await.unwrap();
        });

        let config = EmailConfig {
            api_url: format!("http://{addr}"),
            ..config()
        };
        let notifier = EmailNotifier::from_config(&config);

        assert!(notifier.send_verification_email("ana@example.com", "42").await);
    }

    #[tokio::test]
    async fn brevo_error_status_returns_false() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let app = Router::new().route(
                "/smtp/email",
                post(|| async { (StatusCode::UNAUTHORIZED, "bad key") }),
            );
            axum::serve(listener, app).await.unwrap();
        });

        let config = EmailConfig {
            api_url: format!("http://{addr}"),
            ..config()
        };

        assert!(!EmailNotifier::from_config(&config).send_verification_email("a@b.c", "1").await);
    }

    #[test]
    fn verification_codes_are_six_digits() {
        for _ in 0..50 {
            let code = generate_verification_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }
}
