use anyhow::Result;
use calendario_core::Credentials;
use owo_colors::OwoColorize;

use crate::context::AppContext;
use crate::utils::tui::{create_spinner, password_or_prompt, text_or_prompt};

#[derive(Debug, Default)]
pub struct LoginArgs {
    pub username: Option<String>,
    pub password: Option<String>,
}

pub async fn run(ctx: &AppContext, args: LoginArgs) -> Result<()> {
    let username = text_or_prompt(args.username, "  Username")?;
    let password = password_or_prompt(args.password, "  Password")?;

    let spinner = create_spinner("Signing in...");
    let result = ctx
        .api
        .sign_in(&Credentials { username, password })
        .await;
    spinner.finish_and_clear();

    let session = match result {
        Ok(session) => session,
        Err(e) => {
            // A rejected attempt has already cleared the in-memory session.
            if e.is_unauthenticated() {
                ctx.persist_session()?;
            }
            return Err(e.into());
        }
    };
    ctx.persist_session()?;

    println!("Signed in as {}", session.username.bold());
    Ok(())
}
