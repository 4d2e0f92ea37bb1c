use portal_cache::{CacheTtl, DEFAULT_SWEEP_INTERVAL};
use portal_core::{AdminRole, SizeLimits};
use portal_notifications::NotificationConfig;
use portal_ratelimit::RateLimitProfiles;
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, time::Duration};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    /// Limiter profiles per endpoint class
    #[serde(default)]
    pub rate_limit: RateLimitProfiles,
    /// Session verification
    #[serde(default)]
    pub auth: AuthConfig,
    /// Applicant emails
    #[serde(default)]
    pub notifications: NotificationConfig,
    /// Upload limits for collaborator submissions
    #[serde(default)]
    pub uploads: UploadConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        // Server validations
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        if self.server.body_limit_bytes == 0 {
            return Err("server.body_limit_bytes must be > 0".into());
        }
        // Logging validation
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        // Cache validation
        if self.cache.sweep_interval.is_zero() {
            return Err("cache.sweep_interval must be > 0".into());
        }
        self.rate_limit.validate()?;
        // Auth validation
        if self.auth.session_secret.trim().is_empty() {
            return Err("auth.session_secret is required".into());
        }
        if self.auth.admin_roles.is_empty() {
            return Err("auth.admin_roles must not be empty".into());
        }
        self.notifications.validate()?;
        // Upload validation
        if self.uploads.image_max_bytes == 0 || self.uploads.media_max_bytes == 0 {
            return Err("uploads size limits must be > 0".into());
        }
        if self.uploads.media_max_files == 0 {
            return Err("uploads.media_max_files must be > 0".into());
        }
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        use std::net::{IpAddr, Ipv4Addr};
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.server.port))
    }

    /// Public URL of the portal front end, used in email links.
    /// If `public_base_url` is configured, returns that; otherwise computes from host:port.
    pub fn base_url(&self) -> String {
        self.server
            .public_base_url
            .clone()
            .unwrap_or_else(|| format!("http://{}:{}", self.server.host, self.server.port))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum request body size. Collaborator submissions carry media.
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
    #[serde(default)]
    pub public_base_url: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_body_limit() -> usize {
    256 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
            public_base_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// How often expired entries are swept.
    #[serde(with = "humantime_serde")]
    pub sweep_interval: Duration,
    pub ttl: CacheTtl,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            ttl: CacheTtl::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Shared HS256 secret of the sign-in service.
    pub session_secret: String,
    pub cookie_name: String,
    pub admin_roles: Vec<AdminRole>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_secret: String::new(),
            cookie_name: portal_auth::DEFAULT_SESSION_COOKIE.to_string(),
            admin_roles: AdminRole::ALL.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub image_max_bytes: usize,
    /// Per-file limit for experience and machinery media.
    pub media_max_bytes: usize,
    /// Files allowed per media group.
    pub media_max_files: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            image_max_bytes: SizeLimits::IMAGE,
            media_max_bytes: SizeLimits::MEDIA,
            media_max_files: 10,
        }
    }
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        let pathbuf = PathBuf::from(path.unwrap_or("portal.toml"));
        if pathbuf.exists() {
            builder = builder.add_source(File::from(pathbuf));
        }
        // Environment variable overrides, e.g., PORTAL__SERVER__PORT=9090
        builder = builder.add_source(
            Environment::with_prefix("PORTAL")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        // Validate
        merged.validate()?;
        Ok(merged)
    }
}
