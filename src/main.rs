mod commands;
mod context;
mod render;
mod router;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::commands::Page;
use crate::commands::delete::DeleteArgs;
use crate::commands::edit::EditArgs;
use crate::commands::events::EventsArgs;
use crate::commands::login::LoginArgs;
use crate::commands::new::NewArgs;
use crate::commands::register::RegisterArgs;
use crate::context::AppContext;
use crate::router::{ROUTE_PATTERNS, Route};

#[derive(Parser)]
#[command(name = "calendario")]
#[command(about = "Sign in to your calendario server, manage events and send invitations")]
struct Cli {
    /// Log HTTP traffic and other details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open a page by its app path (e.g. /calendario, /editarEvento/42)
    Open { path: String },
    /// Sign in
    Login {
        #[arg(short, long)]
        username: Option<String>,

        /// Password (prompted for when omitted)
        #[arg(long)]
        password: Option<String>,
    },
    /// Create an account, verifying the email address first
    Register {
        #[arg(short, long)]
        username: Option<String>,

        #[arg(short, long)]
        email: Option<String>,
    },
    /// Sign out and forget the saved session
    Logout,
    /// Show who is signed in
    Whoami,
    /// Show your events
    Calendar,
    /// Create an event
    New {
        /// Event title
        title: Option<String>,

        /// Start date/time (e.g. "2025-03-20 15:00")
        #[arg(short, long)]
        start: Option<String>,

        /// End date/time (defaults to one hour after start)
        #[arg(short, long)]
        end: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        /// Email an invitation to this address (repeatable)
        #[arg(short, long)]
        invite: Vec<String>,
    },
    /// List events with their ids
    Events {
        /// Include everyone's events
        #[arg(short, long)]
        all: bool,
    },
    /// Change an event
    Edit {
        id: String,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(short, long)]
        start: Option<String>,

        #[arg(short, long)]
        end: Option<String>,

        #[arg(short, long)]
        description: Option<String>,
    },
    /// Delete an event
    Delete {
        id: String,

        /// Don't ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let ctx = AppContext::load()?;

    let page = match cli.command {
        Commands::Open { path } => {
            let route = Route::parse(&path).map_err(|e| {
                anyhow::anyhow!("{e}. Known routes: {}", ROUTE_PATTERNS.join(", "))
            })?;
            Page::from_route(route)
        }
        Commands::Login { username, password } => Page::Login(LoginArgs { username, password }),
        Commands::Register { username, email } => Page::Register(RegisterArgs {
            username,
            email,
            password: None,
        }),
        Commands::Logout => return commands::logout::run(&ctx),
        Commands::Whoami => return whoami(&ctx),
        Commands::Calendar => Page::Calendar,
        Commands::New {
            title,
            start,
            end,
            description,
            invite,
        } => Page::CreateEvent(NewArgs {
            title,
            start,
            end,
            description,
            invite,
        }),
        Commands::Events { all } => Page::ManageEvents(EventsArgs { all }),
        Commands::Edit {
            id,
            title,
            start,
            end,
            description,
        } => Page::EditEvent(EditArgs {
            id,
            title,
            start,
            end,
            description,
        }),
        Commands::Delete { id, yes } => {
            return commands::open_delete(&ctx, DeleteArgs { id, yes }).await;
        }
    };

    commands::open(&ctx, page).await
}

fn whoami(ctx: &AppContext) -> Result<()> {
    if ctx.session().is_authenticated() {
        println!("{}", ctx.session().username());
    } else {
        println!("Not signed in.");
    }
    Ok(())
}

/// Logs go to stderr so command output stays pipeable. `RUST_LOG` wins over
/// `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose { "calendario=debug,calendario_core=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
