use crate::errors::{Error, Result};
use serde::Deserialize;
use std::{env, fs, path::Path};
use tracing::{debug, info};

/// Default process-wide salt, overridable via `TIREDESK_PASSWORD_SALT`.
/// Changing the salt invalidates every stored digest.
const DEFAULT_PASSWORD_SALT: &str = "tiredesk_demo_salt";

/// Resolved application configuration: environment variables for paths and
/// the salt, `config.toml` for the accounts to seed on startup.
#[derive(Debug)]
pub struct AppConfig {
    pub database_path: String,
    pub uploads_dir: String,
    pub password_salt: String,
    pub accounts_from_toml: Vec<AccountConfig>,
}

/// One seed account from `config.toml`. Seeding is idempotent: usernames
/// that already exist are skipped, not errors.
#[derive(Deserialize, Debug, Clone)]
pub struct AccountConfig {
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    pub password: String,
    pub role: String, // "client" or "staff", validated at seed time
}

#[derive(Deserialize, Debug)]
struct FileConfig {
    #[serde(default)]
    accounts: Vec<AccountConfig>,
}

fn load_config_file<P: AsRef<Path>>(path: P) -> Result<FileConfig> {
    let path_ref = path.as_ref();
    debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = fs::read_to_string(path_ref)
        .map_err(|e| Error::Config(format!("Failed to read config file {:?}: {}", path_ref, e)))?;
    toml::from_str(&contents).map_err(|e| {
        Error::Config(format!(
            "Failed to parse TOML from config file {:?}: {}",
            path_ref, e
        ))
    })
}

/// Loads the full application configuration. `config.toml` is optional; a
/// missing file just means there are no accounts to seed.
pub fn load_app_configuration() -> Result<AppConfig> {
    let database_path =
        env::var("TIREDESK_DB_PATH").unwrap_or_else(|_| "data/tiredesk.sqlite".to_string());
    let uploads_dir =
        env::var("TIREDESK_UPLOADS_DIR").unwrap_or_else(|_| "data/uploads".to_string());
    let password_salt =
        env::var("TIREDESK_PASSWORD_SALT").unwrap_or_else(|_| DEFAULT_PASSWORD_SALT.to_string());

    let accounts_from_toml = if Path::new("config.toml").exists() {
        load_config_file("config.toml")?.accounts
    } else {
        debug!("No config.toml found; starting with no seed accounts.");
        Vec::new()
    };

    info!(
        "Configuration loaded: db='{}', uploads='{}', {} seed account(s).",
        database_path,
        uploads_dir,
        accounts_from_toml.len()
    );

    Ok(AppConfig {
        database_path,
        uploads_dir,
        password_salt,
        accounts_from_toml,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_account_config() {
        let toml_str = r#"
            [[accounts]]
            username = "acme_fleet"
            email = "fleet@acme.example"
            password = "wheels-up"
            role = "client"

            [[accounts]]
            username = "dispatch_desk"
            password = "triage-1"
            role = "staff"
        "#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.accounts.len(), 2);
        assert_eq!(config.accounts[0].username, "acme_fleet");
        assert_eq!(
            config.accounts[0].email.as_deref(),
            Some("fleet@acme.example")
        );
        assert_eq!(config.accounts[0].role, "client");

        assert_eq!(config.accounts[1].username, "dispatch_desk");
        assert!(config.accounts[1].email.is_none());
        assert_eq!(config.accounts[1].role, "staff");
    }

    #[test]
    fn test_missing_accounts_table_is_empty() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert!(config.accounts.is_empty());
    }
}
