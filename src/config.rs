use std::fmt;

use actix_web::cookie::Key;

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { var: &'static str, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(var) => write!(f, "{var} must be set"),
            ConfigError::Invalid { var, reason } => write!(f, "{var} is invalid: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, PartialEq)]
pub enum DataBackend {
    Postgres {
        url: String,
        max_connections: u32,
        rls_role: String,
    },
    /// In-process store, for local development without a database.
    Memory,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub backend: DataBackend,
    pub jwt_secret: String,
    pub jwt_ttl_secs: i64,
    pub session_key: Option<String>,
    pub geocoder_url: String,
    pub geocoder_api_key: String,
    pub oauth: OAuthConfig,
    pub public_url: String,
    pub frontend_url: String,
    pub upload_dir: String,
    pub max_photo_bytes: usize,
}

const MIN_JWT_SECRET: usize = 32;
const MIN_SESSION_KEY: usize = 64;

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &'static str| lookup(var).filter(|v| !v.trim().is_empty());
        let required = |var: &'static str| get(var).ok_or(ConfigError::Missing(var));
        let or = |var: &'static str, default: &str| get(var).unwrap_or_else(|| default.to_string());

        let backend = match or("DATA_BACKEND", "postgres").as_str() {
            "postgres" => {
                let rls_role = or("RLS_ROLE", "authenticated");
                if !is_identifier(&rls_role) {
                    return Err(ConfigError::Invalid {
                        var: "RLS_ROLE",
                        reason: "must be a lowercase SQL identifier".to_string(),
                    });
                }
                DataBackend::Postgres {
                    url: required("DATABASE_URL")?,
                    max_connections: parse_number("DB_MAX_CONNECTIONS", get("DB_MAX_CONNECTIONS"), 8)?,
                    rls_role,
                }
            }
            "memory" => DataBackend::Memory,
            other => {
                return Err(ConfigError::Invalid {
                    var: "DATA_BACKEND",
                    reason: format!("unknown backend '{other}', expected postgres or memory"),
                });
            }
        };

        let jwt_secret = required("JWT_SECRET")?;
        if jwt_secret.len() < MIN_JWT_SECRET {
            return Err(ConfigError::Invalid {
                var: "JWT_SECRET",
                reason: format!("need at least {MIN_JWT_SECRET} bytes"),
            });
        }
        let jwt_ttl_secs = parse_number("JWT_TTL_SECS", get("JWT_TTL_SECS"), 604_800)?;
        if jwt_ttl_secs <= 0 {
            return Err(ConfigError::Invalid {
                var: "JWT_TTL_SECS",
                reason: "must be positive".to_string(),
            });
        }

        Ok(Self {
            bind_addr: or("BIND_ADDR", "127.0.0.1:8080"),
            backend,
            jwt_secret,
            jwt_ttl_secs,
            session_key: get("SESSION_KEY"),
            geocoder_url: or("GEOCODER_URL", "https://api.mapbox.com"),
            geocoder_api_key: required("GEOCODER_API_KEY")?,
            oauth: OAuthConfig {
                client_id: required("OAUTH_CLIENT_ID")?,
                client_secret: required("OAUTH_CLIENT_SECRET")?,
                auth_url: required("OAUTH_AUTH_URL")?,
                token_url: required("OAUTH_TOKEN_URL")?,
                userinfo_url: required("OAUTH_USERINFO_URL")?,
            },
            public_url: or("PUBLIC_URL", "http://127.0.0.1:8080")
                .trim_end_matches('/')
                .to_string(),
            frontend_url: or("FRONTEND_URL", "http://localhost:5173")
                .trim_end_matches('/')
                .to_string(),
            upload_dir: or("UPLOAD_DIR", "data/uploads"),
            max_photo_bytes: parse_number("MAX_PHOTO_BYTES", get("MAX_PHOTO_BYTES"), 5_242_880)?,
        })
    }

    pub fn redirect_url(&self) -> String {
        format!("{}/auth/callback", self.public_url)
    }

    pub fn storage_url(&self) -> String {
        format!("{}/storage", self.public_url)
    }

    /// Cookie-session key. A short or missing key falls back to a random
    /// one, so pending sign-ins do not survive a restart.
    pub fn cookie_key(&self) -> Key {
        match &self.session_key {
            Some(val) if val.len() >= MIN_SESSION_KEY => {
                log::info!("Using SESSION_KEY from environment");
                Key::from(val.as_bytes())
            }
            Some(val) => {
                log::warn!(
                    "SESSION_KEY too short ({} bytes, need {MIN_SESSION_KEY}+), generating random key",
                    val.len()
                );
                Key::generate()
            }
            None => {
                log::warn!("No SESSION_KEY set, generating random key");
                Key::generate()
            }
        }
    }
}

fn parse_number<T>(var: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(v) => v.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
        }),
    }
}

pub(crate) fn is_identifier(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("DATABASE_URL", "postgres://localhost/chapter"),
            ("JWT_SECRET", "0123456789abcdef0123456789abcdef"),
            ("GEOCODER_API_KEY", "pk.test"),
            ("OAUTH_CLIENT_ID", "portal"),
            ("OAUTH_CLIENT_SECRET", "secret"),
            ("OAUTH_AUTH_URL", "https://idp/authorize"),
            ("OAUTH_TOKEN_URL", "https://idp/token"),
            ("OAUTH_USERINFO_URL", "https://idp/userinfo"),
        ])
    }

    fn load(vars: &HashMap<&'static str, &'static str>) -> Result<AppConfig, ConfigError> {
        AppConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()))
    }

    #[test]
    fn defaults_apply() {
        let config = load(&base()).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.jwt_ttl_secs, 604_800);
        assert_eq!(config.max_photo_bytes, 5_242_880);
        assert_eq!(config.geocoder_url, "https://api.mapbox.com");
        assert_eq!(config.redirect_url(), "http://127.0.0.1:8080/auth/callback");
        assert_eq!(
            config.backend,
            DataBackend::Postgres {
                url: "postgres://localhost/chapter".to_string(),
                max_connections: 8,
                rls_role: "authenticated".to_string(),
            }
        );
    }

    #[test]
    fn missing_secret_is_named() {
        let mut vars = base();
        vars.remove("JWT_SECRET");
        let err = load(&vars).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("JWT_SECRET")));
    }

    #[test]
    fn short_secret_rejected() {
        let mut vars = base();
        vars.insert("JWT_SECRET", "short");
        assert!(matches!(
            load(&vars),
            Err(ConfigError::Invalid { var: "JWT_SECRET", .. })
        ));
    }

    #[test]
    fn memory_backend_needs_no_database() {
        let mut vars = base();
        vars.remove("DATABASE_URL");
        vars.insert("DATA_BACKEND", "memory");
        assert_eq!(load(&vars).unwrap().backend, DataBackend::Memory);
    }

    #[test]
    fn bad_numbers_and_roles_rejected() {
        let mut vars = base();
        vars.insert("MAX_PHOTO_BYTES", "lots");
        assert!(matches!(
            load(&vars),
            Err(ConfigError::Invalid { var: "MAX_PHOTO_BYTES", .. })
        ));

        let mut vars = base();
        vars.insert("RLS_ROLE", "authenticated; drop table users");
        assert!(matches!(
            load(&vars),
            Err(ConfigError::Invalid { var: "RLS_ROLE", .. })
        ));
    }
}
