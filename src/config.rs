use std::env;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} must be a number, got {value:?}")]
    NotANumber { name: &'static str, value: String },

    #[error("{name} must be between {min} and {max}, got {value}")]
    OutOfRange {
        name: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
}

/// Tokens live at most a day.
pub const MAX_TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,

    /// Base used when building `Location` headers for created resources.
    pub public_url: String,
    pub cors_origins: Vec<String>,

    pub secret_key: String,
    pub token_ttl_secs: i64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:db.sqlite".into()),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: parse_var("PORT", 5000)?,
            public_url: env::var("PUBLIC_URL")
                .unwrap_or_else(|_| "http://localhost:5000".into())
                .trim_end_matches('/')
                .to_string(),
            cors_origins: env::var("CORS_ORIGINS")
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|o| !o.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),

            secret_key: env::var("SECRET_KEY")
                .ok()
                .filter(|s| !s.is_empty())
                .ok_or(ConfigError::Missing("SECRET_KEY"))?,
            token_ttl_secs: in_range(
                "TOKEN_TTL_SECS",
                parse_var("TOKEN_TTL_SECS", 600)?,
                1,
                MAX_TOKEN_TTL_SECS,
            )?,
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Absolute URL of a resource, e.g. `http://host/api/activities/3`.
    pub fn resource_url(&self, collection: &str, id: i64) -> String {
        format!("{}/api/{}/{}", self.public_url, collection, id)
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::NotANumber { name, value }),
        Err(_) => Ok(default),
    }
}

fn in_range(name: &'static str, value: i64, min: i64, max: i64) -> Result<i64, ConfigError> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::OutOfRange {
            name,
            value,
            min,
            max,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Config {
        Config {
            database_url: "sqlite::memory:".into(),
            host: "127.0.0.1".into(),
            port: 8080,
            public_url: "http://example.test".into(),
            cors_origins: vec![],
            secret_key: "secret".into(),
            token_ttl_secs: 600,
        }
    }

    #[test]
    fn test_listen_addr() {
        assert_eq!(sample().listen_addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_resource_url() {
        assert_eq!(
            sample().resource_url("activity_types", 7),
            "http://example.test/api/activity_types/7"
        );
    }

    #[test]
    fn test_token_ttl_bounds() {
        assert_eq!(in_range("TOKEN_TTL_SECS", 600, 1, MAX_TOKEN_TTL_SECS).unwrap(), 600);
        assert!(in_range("TOKEN_TTL_SECS", MAX_TOKEN_TTL_SECS, 1, MAX_TOKEN_TTL_SECS).is_ok());

        for bad in [0, -5, MAX_TOKEN_TTL_SECS + 1, i64::MAX] {
            let err = in_range("TOKEN_TTL_SECS", bad, 1, MAX_TOKEN_TTL_SECS).unwrap_err();
            assert!(matches!(err, ConfigError::OutOfRange { value, .. } if value == bad));
        }
    }
}
