use std::net::SocketAddr;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "CarePoint";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_BIND: &str = "0.0.0.0:4000";
const DEFAULT_TOKEN_TTL_DAYS: i64 = 7;
const MAX_TOKEN_TTL_DAYS: i64 = 3650;
const DEFAULT_BCRYPT_COST: u32 = 10;
/// HS256 keys shorter than the hash output weaken the signature.
const MIN_SECRET_LEN: usize = 32;

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "carepoint_lib=info,carepoint=info,tower_http=warn"
}

/// Per-user data directory (`~/.local/share/carepoint` on Linux).
pub fn app_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("carepoint")
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),
    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// The admin login pair. The admin has no stored record.
#[derive(Clone)]
pub struct AdminCredentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub admin: AdminCredentials,
    pub token_ttl: chrono::Duration,
    pub bcrypt_cost: u32,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind", &self.bind)
            .field("db_path", &self.db_path)
            .field("admin", &self.admin)
            .field("token_ttl", &self.token_ttl)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish_non_exhaustive()
    }
}

impl AppConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!(error = %e, "Ignoring unreadable .env file");
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |var: &'static str| {
            lookup(var)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(var))
        };

        let bind_raw = lookup("CAREPOINT_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_raw.parse().map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
            var: "CAREPOINT_BIND",
            reason: e.to_string(),
        })?;

        let db_path = lookup("CAREPOINT_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| app_data_dir().join("carepoint.db"));

        let jwt_secret = required("JWT_SECRET")?;
        if jwt_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::Invalid {
                var: "JWT_SECRET",
                reason: format!("must be at least {MIN_SECRET_LEN} bytes"),
            });
        }

        let admin = AdminCredentials {
            email: required("ADMIN_EMAIL")?,
            password: required("ADMIN_PASSWORD")?,
        };

        let ttl_days = parse_or(&lookup, "CAREPOINT_TOKEN_TTL_DAYS", DEFAULT_TOKEN_TTL_DAYS)?;
        if !(1..=MAX_TOKEN_TTL_DAYS).contains(&ttl_days) {
            return Err(ConfigError::Invalid {
                var: "CAREPOINT_TOKEN_TTL_DAYS",
                reason: format!("must be between 1 and {MAX_TOKEN_TTL_DAYS}"),
            });
        }

        let bcrypt_cost = parse_or(&lookup, "CAREPOINT_BCRYPT_COST", DEFAULT_BCRYPT_COST)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                var: "CAREPOINT_BCRYPT_COST",
                reason: "must be between 4 and 31".into(),
            });
        }

        Ok(Self {
            bind,
            db_path,
            jwt_secret,
            admin,
            token_ttl: chrono::Duration::days(ttl_days),
            bcrypt_cost,
        })
    }
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn minimal() -> Vec<(&'static str, &'static str)> {
        vec![
            ("JWT_SECRET", SECRET),
            ("ADMIN_EMAIL", "admin@carepoint.test"),
            ("ADMIN_PASSWORD", "admin-pass"),
        ]
    }

    #[test]
    fn defaults_applied() {
        let config = AppConfig::from_lookup(env(&minimal())).unwrap();
        assert_eq!(config.bind.port(), 4000);
        assert_eq!(config.token_ttl, chrono::Duration::days(7));
        assert_eq!(config.bcrypt_cost, 10);
        assert!(config.db_path.ends_with("carepoint.db"));
    }

    #[test]
    fn missing_secret_rejected() {
        let err = AppConfig::from_lookup(env(&minimal()[1..])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("JWT_SECRET"));
    }

    #[test]
    fn short_secret_rejected() {
        let mut vars = minimal();
        vars[0] = ("JWT_SECRET", "short");
        let err = AppConfig::from_lookup(env(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "JWT_SECRET", .. }));
    }

    #[test]
    fn overrides_parsed() {
        let mut vars = minimal();
        vars.push(("CAREPOINT_BIND", "127.0.0.1:8080"));
        vars.push(("CAREPOINT_TOKEN_TTL_DAYS", "1"));
        vars.push(("CAREPOINT_DB_PATH", "/tmp/cp.db"));
        let config = AppConfig::from_lookup(env(&vars)).unwrap();
        assert_eq!(config.bind.to_string(), "127.0.0.1:8080");
        assert_eq!(config.token_ttl, chrono::Duration::days(1));
        assert_eq!(config.db_path, PathBuf::from("/tmp/cp.db"));
    }

    #[test]
    fn bad_ttl_rejected() {
        let mut vars = minimal();
        vars.push(("CAREPOINT_TOKEN_TTL_DAYS", "soon"));
        assert!(AppConfig::from_lookup(env(&vars)).is_err());
    }

    #[test]
    fn ttl_outside_range_rejected() {
        for raw in ["0", "3651", "100000000", "200000000000"] {
            let mut vars = minimal();
            vars.push(("CAREPOINT_TOKEN_TTL_DAYS", raw));
            let err = AppConfig::from_lookup(env(&vars)).unwrap_err();
            assert!(
                matches!(err, ConfigError::Invalid { var: "CAREPOINT_TOKEN_TTL_DAYS", .. }),
                "{raw}: {err:?}"
            );
        }

        let mut vars = minimal();
        vars.push(("CAREPOINT_TOKEN_TTL_DAYS", "3650"));
        let config = AppConfig::from_lookup(env(&vars)).unwrap();
        assert_eq!(config.token_ttl, chrono::Duration::days(3650));
    }

    #[test]
    fn debug_hides_password() {
        let config = AppConfig::from_lookup(env(&minimal())).unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("admin-pass"));
        assert!(!rendered.contains(SECRET));
    }

    #[test]
    fn app_name() {
        assert_eq!(APP_NAME, "CarePoint");
    }
}
