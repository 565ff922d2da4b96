//! Route table: maps app paths to pages.

use std::fmt;

use calendario_core::{CalendarioError, CalendarioResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/`, redirects to `/login`
    Root,
    Login,
    Register,
    Calendar,
    CreateEvent,
    ManageEvents,
    EditEvent { id: String },
}

/// Every route pattern, for help and error messages.
pub const ROUTE_PATTERNS: &[&str] = &[
    "/",
    "/login",
    "/register",
    "/calendario",
    "/crearEvento",
    "/gestionarEventos",
    "/editarEvento/:id",
];

impl Route {
    pub fn parse(path: &str) -> CalendarioResult<Self> {
        let trimmed = path.trim();
        let without_query = trimmed.split(['?', '#']).next().unwrap_or_default();
        let normalized = match without_query.trim_end_matches('/') {
            "" => "/",
            p => p,
        };

        let route = match normalized {
            "/" => Route::Root,
            "/login" => Route::Login,
            "/register" => Route::Register,
            "/calendario" => Route::Calendar,
            "/crearEvento" => Route::CreateEvent,
            "/gestionarEventos" => Route::ManageEvents,
            other => match other.strip_prefix("/editarEvento/") {
                Some(id) if !id.is_empty() && !id.contains('/') => Route::EditEvent { id: id.to_string() },
                _ => return Err(CalendarioError::UnknownRoute(path.to_string())),
            },
        };

        Ok(route)
    }

    pub fn path(&self) -> String {
        match self {
            Route::Root => "/".to_string(),
            Route::Login => "/login".to_string(),
            Route::Register => "/register".to_string(),
            Route::Calendar => "/calendario".to_string(),
            Route::CreateEvent => "/crearEvento".to_string(),
            Route::ManageEvents => "/gestionarEventos".to_string(),
            Route::EditEvent { id } => format!("/editarEvento/{id}"),
        }
    }

    /// Follow redirects. Only `/` redirects today.
    pub fn resolve(self) -> Self {
        match self {
            Route::Root => Route::Login,
            other => other,
        }
    }

    /// Whether the page needs a signed-in user.
    pub fn requires_auth(&self) -> bool {
        !matches!(self, Route::Root | Route::Login | Route::Register)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_round_trips() {
        let routes = [
            Route::Root,
            Route::Login,
            Route::Register,
            Route::Calendar,
            Route::CreateEvent,
            Route::ManageEvents,
            Route::EditEvent { id: "42".into() },
        ];

        for route in routes {
            assert_eq!(Route::parse(&route.path()).unwrap(), route);
        }
    }

    #[test]
    fn root_redirects_to_login() {
        assert_eq!(Route::parse("/").unwrap().resolve(), Route::Login);
        assert_eq!(Route::parse("").unwrap().resolve(), Route::Login);
    }

    #[test]
    fn edit_route_carries_id() {
        assert_eq!(
            Route::parse("/editarEvento/42").unwrap(),
            Route::EditEvent { id: "42".into() }
        );
    }

    #[test]
    fn trailing_slash_and_query_are_ignored() {
        assert_eq!(Route::parse("/calendario/").unwrap(), Route::Calendar);
        assert_eq!(Route::parse("/login?next=/calendario").unwrap(), Route::Login);
    }

    #[test]
    fn unknown_paths_are_rejected() {
        for path in ["/nope", "/editarEvento/", "/editarEvento/1/2", "/Calendario"] {
            let err = Route::parse(path).unwrap_err();
            assert!(matches!(err, CalendarioError::UnknownRoute(_)), "{path}");
        }
    }

    #[test]
    fn only_auth_pages_are_public() {
        assert!(!Route::Login.requires_auth());
        assert!(!Route::Register.requires_auth());
        assert!(Route::Calendar.requires_auth());
        assert!(Route::EditEvent { id: "1".into() }.requires_auth());
    }
}
