//! Interactive database connection setup (`--db-init`).
//!
//! Prompts for every connection parameter with defaults pre-filled from the
//! running server's own config, tests the connection and saves the artifact
//! with owner-only permissions.

use colored::Colorize;
use inquire::{InquireError, Password, PasswordDisplayMode, Text};
use std::collections::BTreeMap;
use zinspector_collect::{read_database_params, CommandRunner, ServerPaths};
use zinspector_db::{DbConfig, RetryPolicy, TaskExecutor};

pub async fn init_database_config() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Database connection setup ===\n");

    let defaults = server_defaults().await;

    let host = prompt_text("Database host", defaults.get("DBHost"))?;
    let database = prompt_text("Database name", defaults.get("DBName"))?;
    let schema = non_empty(prompt_text("Database schema", defaults.get("DBSchema"))?);
    let user = prompt_text("Database user", defaults.get("DBUser"))?;
    let password = prompt_password(defaults.get("DBPassword"))?;
    let port = match non_empty(prompt_text("Database port", defaults.get("DBPort"))?) {
        Some(text) => Some(text.trim().parse::<u16>()?),
        None => None,
    };

    let config = DbConfig {
        host,
        database,
        schema,
        user,
        password,
        port,
    };
    config.validate()?;

    println!("\n--- Testing database connection ---");
    let mut executor = TaskExecutor::new(&std::env::temp_dir(), RetryPolicy::default())?;
    let version = match executor.test_connection(&config).await {
        Ok(version) => version,
        Err(e) => {
            println!("{} Connection failed: {e}", "✗".red());
            return Err(e.into());
        }
    };
    println!("{} Connected: {version}", "✓".green());

    println!("\n--- Database version info ---");
    match executor.database_version_info().await {
        Ok(Some(info)) => println!("{info}"),
        Ok(None) => println!("No version information available"),
        Err(e) => println!("Could not read version information: {e}"),
    }
    executor.close();

    let path = DbConfig::default_path()?;
    config.save(&path)?;
    println!("\n{} Configuration saved to {}", "✓".green(), path.display());
    Ok(())
}

/// `DB*` parameters of the running server's config, used as prompt defaults.
async fn server_defaults() -> BTreeMap<String, String> {
    let runner = CommandRunner::detached();
    let mut paths = ServerPaths::new();

    let Some(config) = paths.discover(&runner).await.config else {
        return BTreeMap::new();
    };
    match read_database_params(&config) {
        Ok(params) => params,
        Err(e) => {
            tracing::warn!("Could not read server database params: {}", e);
            BTreeMap::new()
        }
    }
}

fn prompt_text(label: &str, default: Option<&String>) -> Result<String, InquireError> {
    let mut prompt = Text::new(label);
    if let Some(default) = default {
        prompt = prompt.with_default(default);
    }
    prompt.prompt()
}

fn prompt_password(default: Option<&String>) -> Result<String, InquireError> {
    let label = if default.is_some() {
        "Database password [***]"
    } else {
        "Database password"
    };
    let entered = Password::new(label)
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()?;

    if entered.is_empty() {
        Ok(default.cloned().unwrap_or_default())
    } else {
        Ok(entered)
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
