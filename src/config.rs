use std::net::IpAddr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string. Without one the directory lives in memory.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub host: IpAddr,
    pub port: u16,
    pub token_ttl: Duration,
    pub upstream_timeout: Duration,
    pub cors_origins: Vec<String>,
    pub seed_demo_user: bool,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());
        let jwt_secret = env_required("JWT_SECRET")?;

        let host: IpAddr = env_or("LATENCY_POISON_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid LATENCY_POISON_HOST: {e}"))?;

        let port: u16 = env_or("LATENCY_POISON_PORT", "8000")
            .parse()
            .map_err(|e| format!("Invalid LATENCY_POISON_PORT: {e}"))?;

        let token_ttl = parse_token_ttl(&env_or("LATENCY_POISON_TOKEN_TTL_MINUTES", "30"))?;

        let upstream_timeout_secs: u64 = env_or("LATENCY_POISON_UPSTREAM_TIMEOUT_SECS", "10")
            .parse()
            .map_err(|e| format!("Invalid LATENCY_POISON_UPSTREAM_TIMEOUT_SECS: {e}"))?;
        if upstream_timeout_secs == 0 {
            return Err("LATENCY_POISON_UPSTREAM_TIMEOUT_SECS must be greater than 0".to_string());
        }

        let cors_origins = env_or("LATENCY_POISON_CORS_ORIGINS", "http://localhost:3000")
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        let seed_demo_user = matches!(
            env_or("LATENCY_POISON_SEED_DEMO", "false").to_lowercase().as_str(),
            "1" | "true" | "yes"
        );

        let log_level = env_or("LATENCY_POISON_LOG_LEVEL", "info");

        Ok(Config {
            database_url,
            jwt_secret,
            host,
            port,
            token_ttl,
            upstream_timeout: Duration::from_secs(upstream_timeout_secs),
            cors_origins,
            seed_demo_user,
            log_level,
        })
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_token_ttl(raw: &str) -> Result<Duration, String> {
    let minutes: u64 = raw
        .parse()
        .map_err(|e| format!("Invalid LATENCY_POISON_TOKEN_TTL_MINUTES: {e}"))?;
    minutes
        .checked_mul(60)
        .map(Duration::from_secs)
        .ok_or_else(|| "LATENCY_POISON_TOKEN_TTL_MINUTES is too large".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_ttl_is_read_in_minutes() {
        assert_eq!(parse_token_ttl("30").unwrap(), Duration::from_secs(1800));
        assert!(parse_token_ttl("thirty").is_err());
    }

    #[test]
    fn overflowing_token_ttl_is_a_config_error() {
        let err = parse_token_ttl(&u64::MAX.to_string()).unwrap_err();
        assert!(err.contains("too large"));
    }
}
