//! Shared application state handed to every request.

use std::path::PathBuf;

use crate::auth::TokenIssuer;
use crate::config::{AdminCredentials, AppConfig};
use crate::db;

pub struct CoreState {
    pub db_path: PathBuf,
    /// bcrypt cost for newly registered accounts.
    pub bcrypt_cost: u32,
    admin: AdminCredentials,
    tokens: TokenIssuer,
}

impl CoreState {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db_path: config.db_path.clone(),
            bcrypt_cost: config.bcrypt_cost,
            admin: config.admin.clone(),
            tokens: TokenIssuer::new(config.jwt_secret.as_bytes(), config.token_ttl),
        }
    }

    /// Create the database directory and apply pending migrations.
    pub fn migrate(&self) -> Result<(), CoreError> {
        if let Some(parent) = self.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| CoreError::DataDir(format!("{}: {e}", parent.display())))?;
            }
        }
        db::open_database(&self.db_path)?;
        Ok(())
    }

    /// Open a database connection. Most common operation in handlers.
    pub fn open_db(&self) -> Result<rusqlite::Connection, CoreError> {
        db::connect(&self.db_path).map_err(CoreError::Database)
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    pub fn admin(&self) -> &AdminCredentials {
        &self.admin
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
    #[error("Cannot prepare data directory {0}")]
    DataDir(String),
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub const ADMIN_EMAIL: &str = "admin@carepoint.test";
    pub const ADMIN_PASSWORD: &str = "admin-pass";

    /// State over a fresh, migrated database in `dir`.
    pub fn state_in(dir: &std::path::Path) -> CoreState {
        let config = AppConfig {
            bind: "127.0.0.1:0".parse().unwrap(),
            db_path: dir.join("carepoint.db"),
            jwt_secret: "0123456789abcdef0123456789abcdef".into(),
            admin: AdminCredentials {
                email: ADMIN_EMAIL.into(),
                password: ADMIN_PASSWORD.into(),
            },
            token_ttl: chrono::Duration::days(7),
            bcrypt_cost: 4,
        };
        let state = CoreState::new(&config);
        state.migrate().unwrap();
        state
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;

    #[test]
    fn migrate_creates_nested_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a/b");
        let state = state_in(&nested);
        assert!(state.db_path.exists());
        let conn = state.open_db().unwrap();
        let fk: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk, 1);
    }

    #[test]
    fn admin_credentials_from_config() {
        let tmp = tempfile::tempdir().unwrap();
        let state = state_in(tmp.path());
        assert_eq!(state.admin().email, ADMIN_EMAIL);
    }
}
