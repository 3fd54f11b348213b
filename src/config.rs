use std::env;
use std::net::SocketAddr;

/// Minimum signing key length before a warning is logged.
const RECOMMENDED_SECRET_LEN: usize = 32;

#[derive(Clone)]
pub struct Config {
    // Token signing
    pub jwt_secret: String,
    pub token_ttl_secs: u64,

    // Redis
    pub redis_url: String,

    // Server
    pub bind_addr: SocketAddr,
    pub max_body_bytes: usize,

    // Password hashing cost
    pub argon2_memory_kib: u32,
    pub argon2_iterations: u32,
    pub argon2_parallelism: u32,

    // Session cookie
    pub cookie_secure: bool,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("jwt_secret", &"[REDACTED]")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("redis_url", &"[REDACTED]")
            .field("bind_addr", &self.bind_addr)
            .field("max_body_bytes", &self.max_body_bytes)
            .field("argon2_memory_kib", &self.argon2_memory_kib)
            .field("argon2_iterations", &self.argon2_iterations)
            .field("argon2_parallelism", &self.argon2_parallelism)
            .field("cookie_secure", &self.cookie_secure)
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("Failed to parse {0}: {1}")]
    ParseError(String, String),
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env is fine; production sets the variables directly.
        let _ = dotenvy::dotenv();

        // Signing key - required, checked here so a bad deployment dies at startup
        let jwt_secret =
            env::var("JWT_SECRET").map_err(|_| ConfigError::MissingVar("JWT_SECRET".to_string()))?;

        if jwt_secret.is_empty() {
            return Err(ConfigError::InvalidValue(
                "JWT_SECRET".to_string(),
                "cannot be empty".to_string(),
            ));
        }
        if jwt_secret.len() < RECOMMENDED_SECRET_LEN {
            tracing::warn!(
                len = jwt_secret.len(),
                "JWT_SECRET is shorter than the recommended {} bytes",
                RECOMMENDED_SECRET_LEN
            );
        }

        let token_ttl_secs: u64 = parse_env_or_default("TOKEN_TTL_SECS", 2_592_000)?;
        if token_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "TOKEN_TTL_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let redis_url =
            env::var("REDIS_URL").map_err(|_| ConfigError::MissingVar("REDIS_URL".to_string()))?;

        // Server
        let bind_addr_str = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
        let bind_addr = bind_addr_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::ParseError("BIND_ADDR".to_string(), e.to_string()))?;
        let max_body_bytes = parse_env_or_default("MAX_BODY_BYTES", 65_536)?;

        // Argon2id cost (OWASP baseline: m=19456, t=2, p=1)
        let argon2_memory_kib = parse_env_or_default("ARGON2_MEMORY_KIB", 19_456)?;
        let argon2_iterations = parse_env_or_default("ARGON2_ITERATIONS", 2)?;
        let argon2_parallelism = parse_env_or_default("ARGON2_PARALLELISM", 1)?;

        let cookie_secure = parse_env_or_default("COOKIE_SECURE", false)?;

        Ok(Config {
            jwt_secret,
            token_ttl_secs,
            redis_url,
            bind_addr,
            max_body_bytes,
            argon2_memory_kib,
            argon2_iterations,
            argon2_parallelism,
            cookie_secure,
        })
    }
}

/// Helper function to parse environment variable with a default value
fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(val) => val
            .parse::<T>()
            .map_err(|e| ConfigError::ParseError(key.to_string(), format!("{}: {}", e, val))),
        Err(_) => Ok(default),
    }
}
