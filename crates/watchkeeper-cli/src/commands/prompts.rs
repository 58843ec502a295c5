use color_eyre::eyre::eyre;
use color_eyre::Result;
use dialoguer::{Confirm, Input, Password};

/// Prompt for a string value with optional default
pub fn prompt_string(prompt: &str, default: Option<&str>) -> Result<String> {
    let mut input = Input::<String>::new().with_prompt(prompt).allow_empty(true);
    if let Some(value) = default {
        input = input.default(value.to_string());
    }
    input.interact_text().map_err(|e| eyre!("Failed to read input: {}", e))
}

/// Masked input; asks twice when `confirm` is set
pub fn prompt_secret(prompt: &str, confirm: bool) -> Result<String> {
    let mut password = Password::new().with_prompt(prompt);
    if confirm {
        password = password.with_confirmation(format!("Confirm {}", prompt), "Values do not match");
    }
    password.interact().map_err(|e| eyre!("Failed to read secret: {}", e))
}

pub fn prompt_yes_no(prompt: &str, default: bool) -> Result<bool> {
    Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()
        .map_err(|e| eyre!("Failed to read confirmation: {}", e))
}

/// Prompt until the answer parses as a positive number
pub fn prompt_positive_number(prompt: &str, default: u64) -> Result<u64> {
    Input::<u64>::new()
        .with_prompt(prompt)
        .default(default)
        .validate_with(|n: &u64| if *n > 0 { Ok(()) } else { Err("Value must be greater than zero") })
        .interact_text()
        .map_err(|e| eyre!("Failed to read input: {}", e))
}
