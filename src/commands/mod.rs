pub mod calendar;
pub mod delete;
pub mod edit;
pub mod events;
pub mod login;
pub mod logout;
pub mod new;
pub mod register;

use anyhow::Result;
use calendario_core::CalendarioError;
use calendario_core::event::parse_timestamp;
use chrono::{DateTime, Utc};
use owo_colors::OwoColorize;

use crate::context::AppContext;
use crate::router::Route;

/// A page with the inputs it was opened with. Pages opened from a bare
/// route start with no inputs and prompt for what they need.
#[derive(Debug)]
pub enum Page {
    Login(login::LoginArgs),
    Register(register::RegisterArgs),
    Calendar,
    CreateEvent(new::NewArgs),
    ManageEvents(events::EventsArgs),
    EditEvent(edit::EditArgs),
}

impl Page {
    pub fn from_route(route: Route) -> Self {
        match route.resolve() {
            Route::Root | Route::Login => Page::Login(Default::default()),
            Route::Register => Page::Register(Default::default()),
            Route::Calendar => Page::Calendar,
            Route::CreateEvent => Page::CreateEvent(Default::default()),
            Route::ManageEvents => Page::ManageEvents(Default::default()),
            Route::EditEvent { id } => Page::EditEvent(edit::EditArgs::for_id(id)),
        }
    }

    pub fn route(&self) -> Route {
        match self {
            Page::Login(_) => Route::Login,
            Page::Register(_) => Route::Register,
            Page::Calendar => Route::Calendar,
            Page::CreateEvent(_) => Route::CreateEvent,
            Page::ManageEvents(_) => Route::ManageEvents,
            Page::EditEvent(args) => Route::EditEvent { id: args.id.clone() },
        }
    }
}

/// Run a page.
///
/// Pages that need a session send the user to the login page first when
/// nobody is signed in. When the server rejects the session mid-page, the
/// saved session is dropped, the user is sent to the login page, and the
/// rejection error is still returned.
pub async fn open(ctx: &AppContext, page: Page) -> Result<()> {
    let route = page.route();
    tracing::debug!(%route, "opening page");

    if route.requires_auth() && !ctx.session().is_authenticated() && ctx.is_interactive() {
        println!("{}", "Sign in to continue.".dimmed());
        login::run(ctx, Default::default()).await?;
    }

    let is_login = matches!(page, Page::Login(_));
    let result = match page {
        Page::Login(args) => login::run(ctx, args).await,
        Page::Register(args) => register::run(ctx, args).await,
        Page::Calendar => calendar::run(ctx).await,
        Page::CreateEvent(args) => new::run(ctx, args).await,
        Page::ManageEvents(args) => events::run(ctx, args).await,
        Page::EditEvent(args) => edit::run(ctx, args).await,
    };

    // A rejected login is just a wrong password.
    if is_login {
        return result;
    }

    redirect_on_rejection(ctx, result).await
}

/// Delete has no page of its own but gets the same session handling.
pub async fn open_delete(ctx: &AppContext, args: delete::DeleteArgs) -> Result<()> {
    let result = delete::run(ctx, args).await;
    redirect_on_rejection(ctx, result).await
}

async fn redirect_on_rejection(ctx: &AppContext, result: Result<()>) -> Result<()> {
    match result {
        Err(e) if is_unauthenticated(&e) => {
            ctx.persist_session()?;
            eprintln!("{}", "Your session has expired. Please sign in again.".yellow());

            if ctx.is_interactive() {
                login::run(ctx, Default::default()).await?;
            } else {
                eprintln!("Sign in with:\n  calendario login\n");
            }

            Err(e)
        }
        other => other,
    }
}

pub fn is_unauthenticated(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<CalendarioError>()
            .is_some_and(CalendarioError::is_unauthenticated)
    })
}

/// Parse a user-entered date/time ("2025-03-20 15:00", "2025-03-20T15:00",
/// or RFC 3339).
pub fn parse_datetime(input: &str) -> Result<DateTime<Utc>> {
    parse_timestamp(input.trim()).ok_or_else(|| {
        anyhow::anyhow!("Invalid date/time '{input}'. Expected YYYY-MM-DD HH:MM or RFC 3339")
    })
}
