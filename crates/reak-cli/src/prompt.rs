use std::io::{BufRead, IsTerminal};

use anyhow::{Context, Result};
use dialoguer::{Input, Password};
use reak_config::DatabaseConfig;

/// Database credentials collected from the user.
pub struct Credentials {
    pub user: String,
    pub password: String,
    pub database: Option<String>,
}

/// Ask for username, password and database name.
///
/// On a terminal this uses interactive prompts. Otherwise three lines are
/// read from stdin so the tool can be scripted.
pub fn prompt_credentials(defaults: &DatabaseConfig, database_prompt: &str) -> Result<Credentials> {
    if !std::io::stdin().is_terminal() {
        return read_credentials(std::io::stdin().lock());
    }

    let mut user = Input::<String>::new().with_prompt("Please enter the database username");
    if let Some(default_user) = &defaults.user {
        user = user.default(default_user.clone());
    }
    let user = user.interact_text().context("username input cancelled")?;

    let password = Password::new()
        .with_prompt("Please enter the database password")
        .allow_empty_password(true)
        .interact()
        .context("password input cancelled")?;

    let mut database = Input::<String>::new()
        .with_prompt(database_prompt)
        .allow_empty(true);
    if let Some(name) = &defaults.name {
        database = database.default(name.clone());
    }
    let database = database
        .interact_text()
        .context("database name input cancelled")?;

    Ok(Credentials {
        user: user.trim().to_string(),
        password,
        database: non_empty(database),
    })
}

/// Read user, password and database name as three lines. Only the line
/// ending is stripped from the password.
pub fn read_credentials(mut reader: impl BufRead) -> Result<Credentials> {
    let mut next_line = |what: &str| -> Result<String> {
        let mut line = String::new();
        reader
            .read_line(&mut line)
            .with_context(|| format!("failed to read {what} from stdin"))?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    };

    let user = next_line("username")?;
    let password = next_line("password")?;
    let database = next_line("database name")?;

    Ok(Credentials {
        user: user.trim().to_string(),
        password,
        database: non_empty(database),
    })
}

fn non_empty(value: String) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
