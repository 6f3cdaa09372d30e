//! Environment configuration resolved once at startup.

use crate::error::ConfigError;
use std::env;
use std::path::PathBuf;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_SYNC_DATA_DIR: &str = "data/sync";

/// Which backing store serves the API.
#[derive(Debug, Clone)]
pub enum BackendConfig {
    Postgres {
        database_url: String,
        max_connections: u32,
    },
    /// Embedded entity-link store, namespaced by a client application id.
    Sync { app_id: String, data_dir: PathBuf },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub backend: BackendConfig,
}

impl Config {
    pub fn from_env() -> Result<Config, ConfigError> {
        let port = parse_var("PORT", DEFAULT_PORT)?;
        let backend = match env::var("BACKEND").as_deref() {
            Ok("sync") => BackendConfig::Sync {
                app_id: env::var("SYNC_APP_ID")
                    .map_err(|_| ConfigError::MissingVar("SYNC_APP_ID"))?,
                data_dir: env::var("SYNC_DATA_DIR")
                    .unwrap_or_else(|_| DEFAULT_SYNC_DATA_DIR.into())
                    .into(),
            },
            Ok("postgres") | Err(_) => {
                let database_url = resolve_database_url(
                    env::var("APP_ENV").ok().as_deref(),
                    env::var("DATABASE_URL").ok(),
                    env::var("DEV_DATABASE_URL").ok(),
                    env::var("TEST_DATABASE_URL").ok(),
                )
                .ok_or(ConfigError::MissingVar("DATABASE_URL"))?;
                BackendConfig::Postgres {
                    database_url,
                    max_connections: parse_var("DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
                }
            }
            Ok(other) => {
                return Err(ConfigError::Invalid {
                    key: "BACKEND",
                    message: format!("unknown backend '{other}'"),
                })
            }
        };
        Ok(Config { port, backend })
    }
}

/// Pick the connection string for the current environment: `development`
/// and `test` take their override when present, everything else (and a
/// missing override) falls back to the primary.
fn resolve_database_url(
    app_env: Option<&str>,
    primary: Option<String>,
    dev: Option<String>,
    test: Option<String>,
) -> Option<String> {
    match app_env {
        Some("development") => dev.or(primary),
        Some("test") => test.or(primary),
        _ => primary,
    }
}

fn parse_var<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.parse().map_err(|e| ConfigError::Invalid {
            key,
            message: format!("{e}"),
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::resolve_database_url;

    fn s(v: &str) -> Option<String> {
        Some(v.to_string())
    }

    #[test]
    fn primary_when_no_env() {
        assert_eq!(
            resolve_database_url(None, s("postgres://main"), s("postgres://dev"), None),
            s("postgres://main")
        );
    }

    #[test]
    fn development_prefers_override() {
        assert_eq!(
            resolve_database_url(Some("development"), s("postgres://main"), s("postgres://dev"), None),
            s("postgres://dev")
        );
    }

    #[test]
    fn test_env_prefers_override() {
        assert_eq!(
            resolve_database_url(Some("test"), s("postgres://main"), None, s("postgres://test")),
            s("postgres://test")
        );
    }

    #[test]
    fn missing_override_falls_back() {
        assert_eq!(
            resolve_database_url(Some("development"), s("postgres://main"), None, None),
            s("postgres://main")
        );
    }

    #[test]
    fn production_ignores_overrides() {
        assert_eq!(
            resolve_database_url(Some("production"), s("postgres://main"), s("postgres://dev"), s("postgres://test")),
            s("postgres://main")
        );
    }

    #[test]
    fn none_when_nothing_set() {
        assert_eq!(resolve_database_url(Some("test"), None, None, None), None);
    }
}
