use crate::config::AppConfig;
use crate::db::DbPool;
use crate::errors::{Error, Result};
use crate::models::{Principal, Role, User};
use rusqlite::{OptionalExtension, params};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Salted one-way digest for stored credentials. The salt is fixed
/// process-wide (from configuration); plaintext is never persisted.
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(salt.as_bytes());
    hex::encode(hasher.finalize())
}

/// Creates a new account.
///
/// Duplicate usernames are rejected with `Error::Conflict` (strict rejection
/// rather than idempotent return; the seeding path in [`seed_accounts`] is
/// the idempotent one).
///
/// # Errors
///
/// * `Error::Validation` if the username is empty after trimming.
/// * `Error::Conflict` if the username is already taken.
/// * `Error::Database` if the lock or the insert fails.
#[instrument(skip(pool, password, salt))]
pub async fn create_account(
    pool: &DbPool,
    salt: &str,
    username: &str,
    email: Option<&str>,
    password: &str,
    role: Role,
) -> Result<i64> {
    let username = username.trim();
    if username.is_empty() {
        return Err(Error::Validation("username must not be empty".to_string()));
    }

    let conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock".to_string()))?;

    let mut stmt_check = conn.prepare_cached("SELECT id FROM users WHERE username = ?1")?;
    let existing: Option<i64> = stmt_check
        .query_row(params![username], |row| row.get(0))
        .optional()?;
    if existing.is_some() {
        return Err(Error::Conflict(format!(
            "username '{}' already exists",
            username
        )));
    }

    let mut stmt_insert = conn.prepare_cached(
        "INSERT INTO users (username, email, password_hash, role) VALUES (?1, ?2, ?3, ?4)",
    )?;
    let user_id = stmt_insert.insert(params![
        username,
        email,
        hash_password(password, salt),
        role
    ])?;
    info!(
        "Created account '{}' (id {}) with role '{}'.",
        username,
        user_id,
        role.as_str()
    );
    Ok(user_id)
}

/// Verifies credentials and returns the caller's capability token.
///
/// Returns `Ok(None)` uniformly for both an unknown username and a wrong
/// password, so the outcome does not reveal which check failed.
#[instrument(skip(pool, password, salt))]
pub async fn authenticate(
    pool: &DbPool,
    salt: &str,
    username: &str,
    password: &str,
) -> Result<Option<Principal>> {
    let conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock".to_string()))?;

    let mut stmt =
        conn.prepare_cached("SELECT id, password_hash, role FROM users WHERE username = ?1")?;
    let row: Option<(i64, String, Role)> = stmt
        .query_row(params![username.trim()], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        })
        .optional()?;

    let Some((user_id, stored_hash, role)) = row else {
        debug!("Authentication failed for '{}'.", username);
        return Ok(None);
    };

    if hash_password(password, salt) == stored_hash {
        debug!("Authenticated '{}' (id {}).", username, user_id);
        Ok(Some(Principal { user_id, role }))
    } else {
        debug!("Authentication failed for '{}'.", username);
        Ok(None)
    }
}

#[instrument(skip(pool))]
pub async fn get_user(pool: &DbPool, user_id: i64) -> Result<Option<User>> {
    let conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock".to_string()))?;

    let mut stmt = conn
        .prepare_cached("SELECT id, username, email, password_hash, role FROM users WHERE id = ?1")?;
    let user = stmt
        .query_row(params![user_id], |row| {
            Ok(User {
                id: row.get(0)?,
                username: row.get(1)?,
                email: row.get(2)?,
                password_hash: row.get(3)?,
                role: row.get(4)?,
            })
        })
        .optional()?;
    Ok(user)
}

/// Seeds accounts listed in `config.toml`. Existing usernames are skipped so
/// repeated startups are safe.
#[instrument(skip(pool, config))]
pub async fn seed_accounts(pool: &DbPool, config: &Arc<AppConfig>) -> Result<()> {
    info!(
        "Seeding accounts: {} configuration(s) from TOML.",
        config.accounts_from_toml.len()
    );
    for account in &config.accounts_from_toml {
        let role = Role::parse(&account.role)?;
        match create_account(
            pool,
            &config.password_salt,
            &account.username,
            account.email.as_deref(),
            &account.password,
            role,
        )
        .await
        {
            Ok(id) => debug!("Seeded account '{}' (id {}).", account.username, id),
            Err(Error::Conflict(_)) => {
                warn!("Account '{}' already exists. Skipping.", account.username);
            }
            Err(e) => return Err(e),
        }
    }
    info!("Finished seeding accounts.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AccountConfig;
    use crate::db::test_utils::{init_test_tracing, setup_test_db};

    const SALT: &str = "test_salt";

    #[tokio::test]
    async fn test_create_then_authenticate_roundtrip() -> Result<()> {
        init_test_tracing();
        let db_pool = setup_test_db().await?;

        let user_id = create_account(
            &db_pool,
            SALT,
            "acme_fleet",
            Some("fleet@acme.example"),
            "wheels-up",
            Role::Client,
        )
        .await?;

        let principal = authenticate(&db_pool, SALT, "acme_fleet", "wheels-up")
            .await?
            .expect("valid credentials should authenticate");
        assert_eq!(principal.user_id, user_id);
        assert_eq!(principal.role, Role::Client);

        // The stored digest is never the plaintext password.
        let user = get_user(&db_pool, user_id).await?.expect("user exists");
        assert_ne!(user.password_hash, "wheels-up");
        assert_eq!(user.password_hash, hash_password("wheels-up", SALT));
        Ok(())
    }

    #[tokio::test]
    async fn test_authentication_failure_is_uniform() -> Result<()> {
        let db_pool = setup_test_db().await?;
        create_account(&db_pool, SALT, "known_user", None, "right-pw", Role::Staff).await?;

        // Unknown user and wrong password produce the identical outcome.
        let unknown = authenticate(&db_pool, SALT, "nobody", "right-pw").await?;
        let wrong_pw = authenticate(&db_pool, SALT, "known_user", "wrong-pw").await?;
        assert!(unknown.is_none());
        assert!(wrong_pw.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() -> Result<()> {
        let db_pool = setup_test_db().await?;
        create_account(&db_pool, SALT, "taken", None, "pw1", Role::Client).await?;

        let err = create_account(&db_pool, SALT, "taken", None, "pw2", Role::Staff)
            .await
            .expect_err("duplicate username must be rejected");
        assert!(matches!(err, Error::Conflict(_)), "got: {err:?}");
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_username_rejected() -> Result<()> {
        let db_pool = setup_test_db().await?;
        let err = create_account(&db_pool, SALT, "   ", None, "pw", Role::Client)
            .await
            .expect_err("blank username must be rejected");
        assert!(matches!(err, Error::Validation(_)));
        Ok(())
    }

    #[tokio::test]
    async fn test_seed_accounts_is_idempotent() -> Result<()> {
        let db_pool = setup_test_db().await?;
        let config = Arc::new(AppConfig {
            database_path: String::new(),
            uploads_dir: String::new(),
            password_salt: SALT.to_string(),
            accounts_from_toml: vec![
                AccountConfig {
                    username: "seed_client".to_string(),
                    email: None,
                    password: "pw-client".to_string(),
                    role: "client".to_string(),
                },
                AccountConfig {
                    username: "seed_staff".to_string(),
                    email: Some("desk@tiredesk.example".to_string()),
                    password: "pw-staff".to_string(),
                    role: "staff".to_string(),
                },
            ],
        });

        seed_accounts(&db_pool, &config).await?;
        // Second run hits the existing usernames and must not fail.
        seed_accounts(&db_pool, &config).await?;

        let staff = authenticate(&db_pool, SALT, "seed_staff", "pw-staff")
            .await?
            .expect("seeded staff should authenticate");
        assert_eq!(staff.role, Role::Staff);
        Ok(())
    }
}
