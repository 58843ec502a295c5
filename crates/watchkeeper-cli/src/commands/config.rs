use super::prompts;
use crate::output::Output;
use crate::ConfigCommands;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Attribute, Cell, Color, Table};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use serde_json::json;
use std::time::Duration;
use watchkeeper_config::{Config, CredentialStore, PathManager, TelegramConfig};
use watchkeeper_sources::verify_token;

pub async fn run_config(cmd: ConfigCommands, output: &Output) -> Result<()> {
    match cmd {
        ConfigCommands::Show { full } => show_config(full, output),
        ConfigCommands::Server { name, language } => configure_server(name, language, output),
        ConfigCommands::Plex { token } => configure_plex(token, output).await,
        ConfigCommands::Tmdb { api_key, disable } => configure_tmdb(api_key, disable, output),
        ConfigCommands::Telegram { bot_token, chat_id, disable } => {
            configure_telegram(bot_token, chat_id, disable, output)
        }
        ConfigCommands::Scheduler { interval_secs, run_on_startup } => {
            configure_scheduler(interval_secs, run_on_startup, output)
        }
    }
}

/// Config, credentials and their paths for editing; env overrides are not applied
struct Editable {
    paths: PathManager,
    config: Config,
    credentials: CredentialStore,
}

impl Editable {
    fn load(output: &Output) -> Result<Self> {
        let paths = PathManager::default();
        paths
            .ensure_directories()
            .map_err(|e| eyre!("Failed to create configuration directories: {}", e))?;

        let config_file = paths.config_file();
        let config = if config_file.exists() {
            Config::load_from_file(&config_file)
                .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))?
        } else {
            output.info("Configuration file not found. Starting from defaults...");
            Config::default()
        };

        let mut credentials = CredentialStore::new(paths.credentials_file());
        credentials
            .load()
            .map_err(|e| eyre!("Failed to load credentials from {}: {}", paths.credentials_file().display(), e))?;

        Ok(Self {
            paths,
            config,
            credentials,
        })
    }

    fn save_config(&self) -> Result<()> {
        self.config
            .validate()
            .map_err(|e| eyre!("Invalid configuration: {}", e))?;
        let config_file = self.paths.config_file();
        self.config
            .save_to_file(&config_file)
            .map_err(|e| eyre!("Failed to save config to {}: {}", config_file.display(), e))
    }

    fn save_credentials(&self) -> Result<()> {
        self.credentials
            .save()
            .map_err(|e| eyre!("Failed to save credentials to {}: {}", self.paths.credentials_file().display(), e))
    }
}

fn show_config(full: bool, output: &Output) -> Result<()> {
    let paths = PathManager::default();
    let config_file = paths.config_file();
    let config = Config::load_or_default(&config_file)
        .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))?;
    let mut credentials = CredentialStore::new(paths.credentials_file());
    credentials
        .load()
        .map_err(|e| eyre!("Failed to load credentials: {}", e))?;

    let secret = |value: Option<String>| match value {
        Some(v) if full => v,
        Some(v) => mask_string(&v),
        None => "<not set>".to_string(),
    };

    if output.is_json() {
        output.data(&json!({
            "config_file": config_file.display().to_string(),
            "config": config,
            "credentials": {
                "plex_token": secret(credentials.plex_token()),
                "tmdb_api_key": secret(credentials.tmdb_api_key()),
                "telegram_bot_token": secret(credentials.telegram_bot_token()),
            }
        }));
        return Ok(());
    }

    if !config_file.exists() {
        output.warn(format!("Configuration file not found at {}; showing defaults", config_file.display()));
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Setting").fg(Color::Cyan).add_attribute(Attribute::Bold),
            Cell::new("Value").fg(Color::Cyan).add_attribute(Attribute::Bold),
        ]);

    let rows: Vec<(&str, String)> = vec![
        ("Config file", config_file.display().to_string()),
        ("Server name", config.server.name.clone()),
        ("Metadata language", config.server.language.clone()),
        ("Accept invalid certs", config.server.accept_invalid_certs.to_string()),
        ("Plex token", secret(credentials.plex_token())),
        ("Ratings enabled", config.ratings.enabled.to_string()),
        ("Ratings language", config.ratings.language.clone()),
        ("TMDB API key", secret(credentials.tmdb_api_key())),
        ("Telegram bot token", secret(credentials.telegram_bot_token())),
        ("Telegram chat id", config.telegram_chat_id().unwrap_or("<not set>").to_string()),
        ("Sync interval (s)", config.scheduler.interval_secs.to_string()),
        ("Sync on startup", config.scheduler.run_on_startup.to_string()),
        ("API bind", config.api.bind.clone()),
        ("Reference URL base", config.presentation.reference_url_base.clone()),
    ];
    for (name, value) in rows {
        table.add_row(vec![Cell::new(name), Cell::new(value)]);
    }

    print_section_header("Configuration", output);
    output.println(table.to_string());
    Ok(())
}

fn configure_server(name: Option<String>, language: Option<String>, output: &Output) -> Result<()> {
    let mut edit = Editable::load(output)?;
    print_section_header("Media Server", output);

    let name = match name {
        Some(n) => n,
        None => prompts::prompt_string("Server name (as shown in your Plex account)", Some(&edit.config.server.name))?,
    };
    let language = match language {
        Some(l) => l,
        None => prompts::prompt_string("Metadata language", Some(&edit.config.server.language))?,
    };

    let name = name.trim();
    if name.is_empty() {
        return Err(eyre!("Server name cannot be empty"));
    }
    edit.config.server.name = name.to_string();
    if !language.trim().is_empty() {
        edit.config.server.language = language.trim().to_string();
    }
    edit.save_config()?;

    output.success(format!("Server set to '{}'", edit.config.server.name));
    Ok(())
}

async fn configure_plex(token_arg: Option<String>, output: &Output) -> Result<()> {
    let mut edit = Editable::load(output)?;

    print_section_header("Plex Account", output);
    print_instruction_list(
        &[
            "Sign in to Plex Web and open any media item",
            "Choose 'Get Info' then 'View XML'",
            "Copy the X-Plex-Token value from the URL",
        ],
        output,
    );

    let token = match token_arg {
        Some(t) => t,
        None => {
            let first_setup = edit.credentials.plex_token().is_none();
            prompts::prompt_secret("Plex token", first_setup)?
        }
    };
    let token = token.trim().to_string();
    if token.is_empty() {
        return Err(eyre!("Plex token cannot be empty"));
    }

    let spinner = if output.is_json() {
        ProgressBar::hidden()
    } else {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.blue} {msg}")
                .map_err(|e| eyre!("Invalid progress template: {}", e))?,
        );
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner
    };
    spinner.set_message("Verifying token...");

    match verify_token(&token).await {
        Ok(true) => {
            spinner.finish_and_clear();
            output.success("Token verified");
        }
        Ok(false) => {
            spinner.finish_and_clear();
            output.warn("Plex rejected this token");
            if output.is_json() || !prompts::prompt_yes_no("Save it anyway?", false)? {
                return Err(eyre!("Token verification failed"));
            }
        }
        Err(e) => {
            spinner.finish_and_clear();
            output.warn(format!("Could not verify token: {}. Saving anyway", e));
        }
    }

    edit.credentials.set_plex_token(token);
    edit.save_credentials()?;
    output.success("Plex token saved");
    Ok(())
}

fn configure_tmdb(api_key: Option<String>, disable: bool, output: &Output) -> Result<()> {
    let mut edit = Editable::load(output)?;

    if disable {
        edit.config.ratings.enabled = false;
        edit.save_config()?;
        output.success("Ratings disabled");
        return Ok(());
    }

    print_section_header("TMDB Ratings", output);
    print_instruction_list(
        &[
            "Create an account at themoviedb.org",
            "Open Settings > API and request an API key",
        ],
        output,
    );

    let key = match api_key {
        Some(k) => k,
        None => prompts::prompt_secret("TMDB API key", edit.credentials.tmdb_api_key().is_none())?,
    };
    let key = key.trim().to_string();
    if key.is_empty() {
        return Err(eyre!("API key cannot be empty"));
    }

    edit.credentials.set_tmdb_api_key(key);
    edit.save_credentials()?;
    edit.config.ratings.enabled = true;
    edit.save_config()?;
    output.success("TMDB API key saved; ratings enabled");
    Ok(())
}

fn configure_telegram(bot_token: Option<String>, chat_id: Option<String>, disable: bool, output: &Output) -> Result<()> {
    let mut edit = Editable::load(output)?;

    if disable {
        edit.config.notifications.telegram = None;
        edit.save_config()?;
        output.success("Telegram notifications disabled");
        return Ok(());
    }

    print_section_header("Telegram Notifications", output);
    print_instruction_list(
        &[
            "Create a bot with @BotFather and copy its token",
            "Send a message to the bot, then read the chat id from getUpdates",
        ],
        output,
    );

    let token = match bot_token {
        Some(t) => t,
        None => prompts::prompt_secret("Bot token", edit.credentials.telegram_bot_token().is_none())?,
    };
    let current_chat = edit.config.telegram_chat_id().map(str::to_string);
    let chat_id = match chat_id {
        Some(c) => c,
        None => prompts::prompt_string("Chat id", current_chat.as_deref())?,
    };

    let token = token.trim().to_string();
    let chat_id = chat_id.trim().to_string();
    if token.is_empty() || chat_id.is_empty() {
        return Err(eyre!("Both a bot token and a chat id are required"));
    }

    edit.credentials.set_telegram_bot_token(token);
    edit.save_credentials()?;
    edit.config.notifications.telegram = Some(TelegramConfig { chat_id });
    edit.save_config()?;
    output.success("Telegram notifications enabled");
    Ok(())
}

fn configure_scheduler(interval_secs: Option<u64>, run_on_startup: Option<bool>, output: &Output) -> Result<()> {
    let mut edit = Editable::load(output)?;
    print_section_header("Scheduler", output);

    let interval = match interval_secs {
        Some(i) => i,
        None => prompts::prompt_positive_number("Seconds between syncs", edit.config.scheduler.interval_secs)?,
    };
    let on_startup = match run_on_startup {
        Some(b) => b,
        None => prompts::prompt_yes_no("Sync when the server starts?", edit.config.scheduler.run_on_startup)?,
    };

    edit.config.scheduler.interval_secs = interval;
    edit.config.scheduler.run_on_startup = on_startup;
    edit.save_config()?;

    output.success(format!("Syncing every {}s (startup sync: {})", interval, on_startup));
    Ok(())
}

fn mask_string(s: &str) -> String {
    if s.is_empty() {
        return "<not set>".to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}***{}", head, tail)
}

fn print_section_header(title: &str, output: &Output) {
    output.println("");
    output.println(format!("{}", title.bold().bright_cyan()));
    output.println(format!("{}", "─".repeat(title.len()).bright_cyan()));
}

fn print_instruction_list(items: &[&str], output: &Output) {
    for (idx, item) in items.iter().enumerate() {
        output.println(format!("  {}. {}", idx + 1, item));
    }
    output.println("");
}
