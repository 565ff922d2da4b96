//! Authenticated HTTP client for the calendario server.
//!
//! Every outgoing request goes through [`HttpClient::authorize`], which adds
//! `Authorization: Bearer <token>` when the session holds a token. Every
//! response goes through [`HttpClient::intercept`]: a 401 or 403 clears the
//! session and turns into [`CalendarioError::Unauthenticated`] so the caller
//! can send the user back to the login page.

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{CalendarioError, CalendarioResult};
use crate::session::SessionStore;

#[derive(Debug, Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    base_url: String,
    session: SessionStore,
}

impl HttpClient {
    pub fn new(base_url: &str, session: SessionStore) -> CalendarioResult<Self> {
        Self::build(base_url, session, None)
    }

    pub fn from_config(config: &ClientConfig, session: SessionStore) -> CalendarioResult<Self> {
        Self::build(&config.api_url, session, config.request_timeout())
    }

    fn build(
        base_url: &str,
        session: SessionStore,
        timeout: Option<std::time::Duration>,
    ) -> CalendarioResult<Self> {
        Url::parse(base_url)
            .map_err(|e| CalendarioError::Config(format!("Invalid API URL '{base_url}': {e}")))?;

        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(HttpClient {
            http: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Start a request to `path` with the session token already attached.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        self.authorize(builder)
    }

    /// Like [`HttpClient::request`], with `segment` percent-encoded and
    /// appended to `path` as a single path segment.
    pub fn request_with_segment(
        &self,
        method: Method,
        path: &str,
        segment: &str,
    ) -> CalendarioResult<RequestBuilder> {
        let mut url = Url::parse(&self.url(path))
            .map_err(|e| CalendarioError::Config(format!("Invalid request URL for '{path}': {e}")))?;
        url.path_segments_mut()
            .map_err(|_| CalendarioError::Config(format!("API URL '{}' cannot take a path", self.base_url)))?
            .push(segment);

        Ok(self.authorize(self.http.request(method, url)))
    }

    /// Request interceptor: attach the bearer token if there is one.
    pub fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        let token = self.session.token();
        if token.is_empty() {
            builder
        } else {
            builder.bearer_auth(token)
        }
    }

    /// Response interceptor.
    ///
    /// 401/403 clear the session and become `Unauthenticated`; any other
    /// non-success status becomes `Status` with the response body. Success
    /// responses pass through untouched.
    pub async fn intercept(&self, response: Response) -> CalendarioResult<Response> {
        let status = response.status();

        if is_auth_rejection(status) {
            tracing::warn!(%status, url = %response.url(), "server rejected session, signing out");
            self.session.clear_auth();
            return Err(CalendarioError::Unauthenticated { status });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(%status, %body, "request failed");
            return Err(CalendarioError::Status { status, body });
        }

        Ok(response)
    }

    /// Send a request built by [`HttpClient::request`] and run the response
    /// interceptor on the result.
    pub async fn send(&self, builder: RequestBuilder) -> CalendarioResult<Response> {
        let request = builder.build()?;
        tracing::debug!(method = %request.method(), url = %request.url(), "sending request");

        let response = self.http.execute(request).await.map_err(|e| {
            tracing::debug!(error = %e, "request did not complete");
            CalendarioError::Http(e)
        })?;

        self.intercept(response).await
    }
}

fn is_auth_rejection(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;

    fn client_with(session: Session) -> HttpClient {
        HttpClient::new("http://localhost:8081", SessionStore::from_session(session)).unwrap()
    }

    fn response(status: u16, body: &'static str) -> Response {
        http::Response::builder()
            .status(status)
            .body(body)
            .unwrap()
            .into()
    }

    #[test]
    fn bearer_header_carries_session_token() {
        let client = client_with(Session::new("alice", "abc.def"));
        let request = client.request(Method::GET, "/event/mostrartodo").build().unwrap();

        assert_eq!(
            request.headers().get(header::AUTHORIZATION).unwrap(),
            "Bearer abc.def"
        );
        assert_eq!(request.url().as_str(), "http://localhost:8081/event/mostrartodo");
    }

    #[test]
    fn no_header_without_token() {
        let client = client_with(Session::default());
        let request = client.request(Method::POST, "auth/login").build().unwrap();

        assert!(request.headers().get(header::AUTHORIZATION).is_none());
    }

    #[test]
    fn token_is_read_at_request_time() {
        let client = client_with(Session::default());
        client.session().set_token("late");

        let request = client.request(Method::GET, "/x").build().unwrap();
        assert_eq!(request.headers().get(header::AUTHORIZATION).unwrap(), "Bearer late");
    }

    #[test]
    fn base_url_trailing_slash_is_ignored() {
        let client = HttpClient::new("http://example.test/api/", SessionStore::new()).unwrap();
        let request = client.request(Method::GET, "/auth/login").build().unwrap();
        assert_eq!(request.url().as_str(), "http://example.test/api/auth/login");
    }

    #[test]
    fn segment_is_encoded_into_one_path_segment() {
        let client = client_with(Session::new("alice", "tok"));
        let request = client
            .request_with_segment(Method::DELETE, "/event/eliminarporid", "a/b?c")
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(
            request.url().as_str(),
            "http://localhost:8081/event/eliminarporid/a%2Fb%3Fc"
        );
        assert_eq!(request.headers().get(header::AUTHORIZATION).unwrap(), "Bearer tok");
    }

    #[test]
    fn invalid_base_url_is_a_config_error() {
        let err = HttpClient::new("not a url", SessionStore::new()).unwrap_err();
        assert!(matches!(err, CalendarioError::Config(_)));
    }

    #[tokio::test]
    async fn unauthorized_and_forbidden_clear_the_session() {
        for status in [401, 403] {
            let client = client_with(Session::new("alice", "tok"));

            let err = client.intercept(response(status, "")).await.unwrap_err();

            assert!(err.is_unauthenticated());
            assert_eq!(err.status().map(|s| s.as_u16()), Some(status));
            assert_eq!(client.session().snapshot(), Session::default());
        }
    }

    #[tokio::test]
    async fn other_errors_leave_the_session_alone() {
        for status in [400, 404, 409, 500, 502] {
            let client = client_with(Session::new("alice", "tok"));

            let err = client.intercept(response(status, "boom")).await.unwrap_err();

            match err {
                CalendarioError::Status { status: s, body } => {
                    assert_eq!(s.as_u16(), status);
                    assert_eq!(body, "boom");
                }
                other => panic!("unexpected error: {other:?}"),
            }
            assert_eq!(client.session().snapshot(), Session::new("alice", "tok"));
        }
    }

    #[tokio::test]
    async fn success_passes_through() {
        let client = client_with(Session::new("alice", "tok"));

        let resp = client.intercept(response(201, "{}")).await.unwrap();

        assert_eq!(resp.status(), StatusCode::CREATED);
        assert!(client.session().is_authenticated());
    }
}
