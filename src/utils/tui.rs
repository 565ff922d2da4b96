use anyhow::Result;
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};

pub fn create_spinner(message: impl Into<String>) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_strings(&["-", "\\", "|", "/", ""])
        .template("{msg} {spinner}")
    {
        spinner.set_style(style);
    }
    spinner.set_message(message.into());
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner
}

/// Use `value` if given, otherwise ask for it.
pub fn text_or_prompt(value: Option<String>, prompt: &str) -> Result<String> {
    match value {
        Some(v) => Ok(v),
        None => Ok(Input::<String>::new().with_prompt(prompt).interact_text()?),
    }
}

/// Ask for a value, pre-filled with `current`.
pub fn prompt_with_default(prompt: &str, current: &str) -> Result<String> {
    Ok(Input::<String>::new()
        .with_prompt(prompt)
        .default(current.to_string())
        .interact_text()?)
}

/// Ask for an optional value; an empty answer means none.
pub fn prompt_optional(prompt: &str) -> Result<Option<String>> {
    let value: String = Input::new()
        .with_prompt(prompt)
        .default(String::new())
        .show_default(false)
        .interact_text()?;

    Ok(if value.is_empty() { None } else { Some(value) })
}

pub fn password_or_prompt(value: Option<String>, prompt: &str) -> Result<String> {
    match value {
        Some(v) => Ok(v),
        None => Ok(rpassword::prompt_password(format!("{prompt}: "))?),
    }
}
