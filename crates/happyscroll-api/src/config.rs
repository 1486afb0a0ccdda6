//! Application configuration (§6.2, §10.3).
//!
//! Loaded once at startup into an immutable struct via `from_env()`,
//! matching this codebase's existing `ApiConfig::from_env()` shape: one
//! environment variable per field, a documented default via
//! `.unwrap_or_else(...)`, or a fast failure when a secret is required and
//! absent.

use std::time::Duration;

use chrono_tz::Tz;

use happyscroll_classifiers::Likelihood;
use happyscroll_core::window::DEFAULT_WINDOW_TZ;
use happyscroll_ratelimit::{DEFAULT_CLIENT_LIMIT, DEFAULT_GLOBAL_LIMIT};

/// Default bind port when `PORT` is unset.
const DEFAULT_PORT: u16 = 8080;

/// Default TTL in days when `CACHE_TTL_DAYS` is unset (§6.2).
const DEFAULT_CACHE_TTL_DAYS: i64 = 7;

/// Maximum accepted body size on `/verdict` (§10.6): small, since the
/// request is a single JSON object carrying one URL.
pub const MAX_VERDICT_BODY_BYTES: usize = 16 * 1024;

/// Per-IP token-bucket rate applied at the edge (§10.6), independent of
/// C7's product-level analysis budget.
const DEFAULT_EDGE_REQUESTS_PER_SECOND: u32 = 20;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,

    pub image_safety_threshold: Likelihood,
    pub global_daily_limit: u32,
    pub client_daily_limit: u32,
    pub cache_ttl: Duration,
    pub cache_backend_url: Option<String>,
    pub window_tz: Tz,
    pub edge_requests_per_second: u32,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let threshold = std::env::var("IMAGE_SAFETY_THRESHOLD")
            .ok()
            .and_then(|v| Likelihood::parse(&v))
            .unwrap_or(Likelihood::Possible);

        let cache_ttl_days = std::env::var("CACHE_TTL_DAYS")
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or(DEFAULT_CACHE_TTL_DAYS);

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|o| o.trim().to_string()).collect())
                .unwrap_or_else(|_| vec!["*".to_string()]),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),

            image_safety_threshold: threshold,
            global_daily_limit: std::env::var("GLOBAL_DAILY_LIMIT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_GLOBAL_LIMIT),
            client_daily_limit: std::env::var("CLIENT_DAILY_LIMIT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_CLIENT_LIMIT),
            cache_ttl: Duration::from_secs((cache_ttl_days.max(0) as u64) * 24 * 60 * 60),
            cache_backend_url: std::env::var("CACHE_BACKEND_URL").ok().filter(|s| !s.is_empty()),
            window_tz: std::env::var("RATE_LIMIT_TIMEZONE")
                .ok()
                .and_then(|s| s.parse::<Tz>().ok())
                .unwrap_or(DEFAULT_WINDOW_TZ),
            edge_requests_per_second: std::env::var("EDGE_REQUESTS_PER_SECOND")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_EDGE_REQUESTS_PER_SECOND),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}
