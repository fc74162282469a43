use axum::http::HeaderValue;
use chrono_tz::Tz;
use rand::RngCore;
use std::env;
use std::net::SocketAddr;

const DEFAULT_TIMEZONE: &str = "America/New_York";
const DEFAULT_SESSION_MAX_AGE_SECS: i64 = 365 * 24 * 60 * 60;

/// Where entries are kept
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres(String),
    Memory,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub store: StoreBackend,
    pub timezone: Tz,
    pub title: String,
    pub session_secret: String,
    pub session_max_age_secs: i64,
    pub bind_addr: SocketAddr,
    pub cors_origin: HeaderValue,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| "DATABASE_URL must be set".to_string())?;

        let timezone = parse_timezone(
            &env::var("TIMEZONE").unwrap_or_else(|_| DEFAULT_TIMEZONE.to_string()),
        )?;

        let title = env::var("TITLE").unwrap_or_else(|_| "Guinea pigs".to_string());

        let session_secret = match env::var("SESSION_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ => {
                tracing::warn!("SESSION_SECRET not set, sessions will not survive a restart");
                random_secret()
            }
        };

        let session_max_age_secs = match env::var("SESSION_MAX_AGE_SECS") {
            Ok(value) => parse_max_age(&value)?,
            Err(_) => DEFAULT_SESSION_MAX_AGE_SECS,
        };

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse::<SocketAddr>()
            .map_err(|e| format!("Invalid BIND_ADDR: {}", e))?;

        let cors_origin = env::var("CORS_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .parse::<HeaderValue>()
            .map_err(|e| format!("Invalid CORS_ORIGIN: {}", e))?;

        Ok(Self {
            store: parse_store_backend(&database_url),
            timezone,
            title,
            session_secret,
            session_max_age_secs,
            bind_addr,
            cors_origin,
        })
    }
}

fn parse_store_backend(database_url: &str) -> StoreBackend {
    if database_url == "memory" {
        StoreBackend::Memory
    } else {
        StoreBackend::Postgres(database_url.to_string())
    }
}

fn parse_timezone(name: &str) -> Result<Tz, String> {
    name.parse::<Tz>()
        .map_err(|_| format!("Unknown TIMEZONE: {}", name))
}

fn parse_max_age(value: &str) -> Result<i64, String> {
    match value.parse::<i64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(format!("SESSION_MAX_AGE_SECS must be a positive integer, got {}", value)),
    }
}

fn random_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timezone() {
        assert_eq!(parse_timezone("Europe/Paris").unwrap(), chrono_tz::Europe::Paris);
        assert!(parse_timezone("Mars/Olympus_Mons").is_err());
    }

    #[test]
    fn test_parse_max_age() {
        assert_eq!(parse_max_age("3600").unwrap(), 3600);
        assert!(parse_max_age("0").is_err());
        assert!(parse_max_age("a year").is_err());
    }

    #[test]
    fn test_memory_backend_selected_by_literal() {
        assert_eq!(parse_store_backend("memory"), StoreBackend::Memory);
        assert_eq!(
            parse_store_backend("postgres://localhost/pigs"),
            StoreBackend::Postgres("postgres://localhost/pigs".to_string())
        );
    }

    #[test]
    fn test_random_secret_is_fresh() {
        let a = random_secret();
        assert_eq!(a.len(), 64);
        assert_ne!(a, random_secret());
    }
}
