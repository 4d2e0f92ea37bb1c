//! HTTP server of the incubator portal.
//!
//! Public listings are served from a TTL cache, submissions go through the
//! collaborator write pipeline, and the admin console offers search, export,
//! audit and review. Every endpoint class has its own rate limiter.

pub mod audit;
pub mod config;
pub mod error;
pub mod export;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod pipeline;
pub mod routes;
pub mod server;
pub mod state;

pub use config::{AppConfig, AuthConfig, CacheConfig, LoggingConfig, ServerConfig, UploadConfig};
pub use error::{ApiError, ApiResult};
pub use observability::init_tracing;
pub use server::{PortalServer, ServerBuilder, build_app};
pub use state::AppState;
