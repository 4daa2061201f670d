//! Database connection configuration

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use dialoguer::{Input, Password};
use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;

/// Connection parameters for the target database.
///
/// Every field except `dbname` is optional; absent fields fall back to the
/// driver's defaults (localhost, port 5432, OS user). Empty strings in the
/// config file are normalized to absent at load time.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub dbname: String,
    pub user: Option<String>,
    pub password: Option<String>,
    pub host: Option<String>,
    pub port: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawDatabaseConfig {
    #[serde(default)]
    dbname: Option<String>,
    #[serde(default)]
    user: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    port: Option<String>,
}

fn none_if_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// Parse a database config document. Returns `Ok(None)` when `dbname` is
/// missing or empty, which callers treat as "no usable config on disk";
/// malformed JSON is an error, not a fallback.
fn parse(text: &str) -> Result<Option<DatabaseConfig>> {
    let raw: RawDatabaseConfig = serde_json::from_str(text)?;

    let Some(dbname) = none_if_empty(raw.dbname) else {
        return Ok(None);
    };

    Ok(Some(DatabaseConfig {
        dbname,
        user: none_if_empty(raw.user),
        password: none_if_empty(raw.password),
        host: none_if_empty(raw.host),
        port: none_if_empty(raw.port),
    }))
}

fn load(path: &Path) -> Result<Option<DatabaseConfig>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read database config: {}", path.display()))?;
    parse(&text).with_context(|| format!("Failed to parse database config: {}", path.display()))
}

fn prompt() -> Result<DatabaseConfig> {
    // Input rejects empty text by default, so this re-prompts until a
    // database name is given
    let dbname: String = Input::new().with_prompt("Database name").interact_text()?;

    let user: String = Input::new()
        .with_prompt("User")
        .allow_empty(true)
        .interact_text()?;
    let password = Password::new()
        .with_prompt("Password")
        .allow_empty_password(true)
        .interact()?;
    let host: String = Input::new()
        .with_prompt("Host")
        .allow_empty(true)
        .interact_text()?;
    let port: String = Input::new()
        .with_prompt("Port")
        .allow_empty(true)
        .interact_text()?;

    Ok(DatabaseConfig {
        dbname,
        user: none_if_empty(Some(user)),
        password: none_if_empty(Some(password)),
        host: none_if_empty(Some(host)),
        port: none_if_empty(Some(port)),
    })
}

/// Resolve connection parameters: from the config file when given and usable,
/// otherwise interactively.
pub fn resolve(path: Option<&Path>) -> Result<DatabaseConfig> {
    if let Some(path) = path {
        if let Some(config) = load(path)? {
            return Ok(config);
        }
        log::info!(
            "Database config {} has no dbname, falling back to prompts",
            path.display()
        );
    }
    prompt()
}

impl DatabaseConfig {
    pub fn connect_options(&self) -> Result<PgConnectOptions> {
        let mut options = PgConnectOptions::new().database(&self.dbname);
        if let Some(user) = &self.user {
            options = options.username(user);
        }
        if let Some(password) = &self.password {
            options = options.password(password);
        }
        if let Some(host) = &self.host {
            options = options.host(host);
        }
        if let Some(port) = &self.port {
            let port: u16 = port
                .parse()
                .with_context(|| format!("Invalid port in database config: {port}"))?;
            options = options.port(port);
        }
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let config = parse(r#"{"dbname": "crm", "user": "alice", "password": "s3cret"}"#)
            .unwrap()
            .unwrap();
        assert_eq!(config.dbname, "crm");
        assert_eq!(config.user.as_deref(), Some("alice"));
        assert_eq!(config.password.as_deref(), Some("s3cret"));
        assert_eq!(config.host, None);
        assert_eq!(config.port, None);
    }

    #[test]
    fn empty_strings_become_absent() {
        let config = parse(r#"{"dbname": "crm", "user": "", "password": "", "host": ""}"#)
            .unwrap()
            .unwrap();
        assert_eq!(config.user, None);
        assert_eq!(config.password, None);
        assert_eq!(config.host, None);
    }

    #[test]
    fn empty_dbname_means_no_config() {
        assert!(parse(r#"{"dbname": ""}"#).unwrap().is_none());
    }

    #[test]
    fn missing_dbname_means_no_config() {
        assert!(parse(r#"{"user": "alice"}"#).unwrap().is_none());
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(parse("{not json").is_err());
    }

    fn make_config(port: Option<&str>) -> DatabaseConfig {
        DatabaseConfig {
            dbname: "crm".into(),
            user: None,
            password: None,
            host: None,
            port: port.map(String::from),
        }
    }

    #[test]
    fn connect_options_accepts_numeric_port() {
        assert!(make_config(Some("5433")).connect_options().is_ok());
    }

    #[test]
    fn connect_options_rejects_bad_port() {
        assert!(make_config(Some("default")).connect_options().is_err());
    }
}
