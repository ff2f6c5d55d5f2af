//! Server configuration
//!
//! | Variable | Default |
//! |----------|---------|
//! | ENVIRONMENT | development |
//! | HTTP_PORT | 8080 |
//! | API_VERSION | v1 |
//! | JWT_SECRET / JWT_REFRESH_SECRET | required outside development |
//! | JWT_EXPIRES_IN | 15m |
//! | JWT_REFRESH_EXPIRES_IN | 168h |
//! | RATE_LIMIT_REQUESTS | 100 |
//! | RATE_LIMIT_DURATION | 15m |
//! | DATABASE_PATH | shop.db (`:memory:` for a throwaway store) |
//! | STORE_TIMEOUT_SECS | 5 |
//! | UPLOAD_DIR | ./uploads |
//! | PUBLIC_BASE_URL | http://localhost:8080 |
//! | CORS_ALLOWED_ORIGINS | empty (any origin) |
//! | LOG_LEVEL / LOG_DIR / LOG_JSON | info / unset / false |
//! | ADMIN_EMAIL / ADMIN_PASSWORD | unset (no bootstrap admin) |

use std::time::Duration;

use crate::auth::JwtConfig;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

const DEFAULT_ACCESS_TTL: Duration = Duration::from_secs(15 * 60);
const DEFAULT_REFRESH_TTL: Duration = Duration::from_secs(168 * 60 * 60);
const DEFAULT_RATE_WINDOW: Duration = Duration::from_secs(15 * 60);

#[derive(Debug, Clone)]
pub struct Config {
    /// development | staging | production
    pub environment: String,
    pub http_port: u16,
    /// Path segment under `/api`
    pub api_version: String,
    pub jwt: JwtConfig,
    /// Requests per IP per window, all routes
    pub rate_limit_requests: u32,
    pub rate_limit_window: Duration,
    /// SQLite file, or `:memory:`
    pub database_path: String,
    /// Busy and pool acquire deadline for store calls
    pub store_timeout: Duration,
    pub upload_dir: String,
    pub public_base_url: String,
    /// Empty means any origin
    pub cors_allowed_origins: Vec<String>,
    pub log_level: String,
    pub log_dir: Option<String>,
    pub log_json: bool,
    /// Bootstrap admin account, created at startup when both are set
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                tracing::warn!(var = name, "Secret not set, using development fallback");
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    fn duration_var(name: &str, default: Duration) -> Duration {
        match std::env::var(name) {
            Ok(raw) => parse_duration(&raw).unwrap_or_else(|| {
                tracing::warn!(var = name, value = %raw, "Invalid duration, using default");
                default
            }),
            Err(_) => default,
        }
    }

    fn optional_var(name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|s| !s.trim().is_empty())
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let http_port = std::env::var("HTTP_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        Ok(Self {
            http_port,
            api_version: std::env::var("API_VERSION").unwrap_or_else(|_| "v1".into()),
            jwt: JwtConfig {
                access_secret: Self::require_secret("JWT_SECRET", &environment)?,
                refresh_secret: Self::require_secret("JWT_REFRESH_SECRET", &environment)?,
                access_ttl: Self::duration_var("JWT_EXPIRES_IN", DEFAULT_ACCESS_TTL),
                refresh_ttl: Self::duration_var("JWT_REFRESH_EXPIRES_IN", DEFAULT_REFRESH_TTL),
            },
            rate_limit_requests: std::env::var("RATE_LIMIT_REQUESTS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(100),
            rate_limit_window: Self::duration_var("RATE_LIMIT_DURATION", DEFAULT_RATE_WINDOW),
            database_path: std::env::var("DATABASE_PATH").unwrap_or_else(|_| "shop.db".into()),
            store_timeout: Duration::from_secs(
                std::env::var("STORE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(5),
            ),
            upload_dir: std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".into()),
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| format!("http://localhost:{http_port}")),
            cors_allowed_origins: std::env::var("CORS_ALLOWED_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: Self::optional_var("LOG_DIR"),
            log_json: std::env::var("LOG_JSON")
                .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE"))
                .unwrap_or(false),
            admin_email: Self::optional_var("ADMIN_EMAIL"),
            admin_password: Self::optional_var("ADMIN_PASSWORD"),
            environment,
        })
    }

    /// Development defaults, independent of the process environment
    pub fn for_tests() -> Self {
        Self {
            environment: "development".into(),
            http_port: 8080,
            api_version: "v1".into(),
            jwt: JwtConfig {
                access_secret: "test-access-secret".into(),
                refresh_secret: "test-refresh-secret".into(),
                access_ttl: DEFAULT_ACCESS_TTL,
                refresh_ttl: DEFAULT_REFRESH_TTL,
            },
            rate_limit_requests: 100,
            rate_limit_window: DEFAULT_RATE_WINDOW,
            database_path: crate::db::IN_MEMORY.into(),
            store_timeout: Duration::from_secs(5),
            upload_dir: "./uploads".into(),
            public_base_url: "http://localhost:8080".into(),
            cors_allowed_origins: Vec::new(),
            log_level: "info".into(),
            log_dir: None,
            log_json: false,
            admin_email: None,
            admin_password: None,
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// `/api/{version}`
    pub fn api_prefix(&self) -> String {
        format!("/api/{}", self.api_version)
    }

    /// Public URL prefix for stored uploads
    pub fn uploads_url(&self) -> String {
        format!(
            "{}{}/uploads",
            self.public_base_url.trim_end_matches('/'),
            self.api_prefix()
        )
    }
}

/// Parse `<n>s`, `<n>m` or `<n>h`
pub fn parse_duration(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    let unit = raw.chars().last()?;
    let value: u64 = raw[..raw.len() - unit.len_utf8()].parse().ok()?;
    let secs = match unit {
        's' => value,
        'm' => value.checked_mul(60)?,
        'h' => value.checked_mul(3600)?,
        _ => return None,
    };
    Some(Duration::from_secs(secs))
}
