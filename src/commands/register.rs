use anyhow::{Context, Result};
use calendario_core::Registration;
use calendario_core::constants::VERIFICATION_CODE_TTL_MINUTES;
use calendario_core::email::generate_verification_code;
use dialoguer::Input;
use owo_colors::OwoColorize;
use std::time::{Duration, Instant};

use crate::context::AppContext;
use crate::utils::tui::{create_spinner, password_or_prompt, text_or_prompt};

const MAX_CODE_ATTEMPTS: usize = 3;

#[derive(Debug, Default)]
pub struct RegisterArgs {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

pub async fn run(ctx: &AppContext, args: RegisterArgs) -> Result<()> {
    let username = text_or_prompt(args.username, "  Username")?;
    let email = text_or_prompt(args.email, "  Email")?;
    let password = password_or_prompt(args.password, "  Password")?;

    verify_email(ctx, &email).await?;

    let spinner = create_spinner("Creating account...");
    let result = ctx
        .api
        .sign_up(&Registration {
            username: username.clone(),
            email,
            password,
        })
        .await;
    spinner.finish_and_clear();

    match result.context("Registration failed")? {
        Some(session) => {
            ctx.persist_session()?;
            println!("Account created. Signed in as {}", session.username.bold());
        }
        None => {
            println!("Account {} created.", username.bold());
            println!("\nSign in with:\n  calendario login --username {username}");
        }
    }

    Ok(())
}

/// Email a one-time code and ask for it back.
async fn verify_email(ctx: &AppContext, email: &str) -> Result<()> {
    if !ctx.is_interactive() {
        anyhow::bail!("Email verification needs an interactive terminal");
    }

    let code = generate_verification_code();

    let spinner = create_spinner(format!("Sending verification code to {email}..."));
    let sent = ctx.notifier.send_verification_email(email, &code).await;
    spinner.finish_and_clear();

    if !sent {
        anyhow::bail!(
            "Could not send the verification email.\n\n\
            Check the [email] section of your config, or set CALENDARIO_EMAIL__API_KEY."
        );
    }

    println!("Verification code sent to {email}.");

    let ttl = Duration::from_secs(u64::from(VERIFICATION_CODE_TTL_MINUTES) * 60);
    let sent_at = Instant::now();

    for attempt in 1..=MAX_CODE_ATTEMPTS {
        let entered: String = Input::new().with_prompt("  Code").interact_text()?;

        if sent_at.elapsed() > ttl {
            anyhow::bail!("Verification code expired. Run `calendario register` again.");
        }

        if codes_match(&entered, &code) {
            return Ok(());
        }

        let left = MAX_CODE_ATTEMPTS - attempt;
        if left > 0 {
            println!("{} ({left} left)", "Wrong code.".red());
        }
    }

    anyhow::bail!("Too many wrong codes. Run `calendario register` again.")
}

fn codes_match(entered: &str, expected: &str) -> bool {
    entered.trim() == expected
}
