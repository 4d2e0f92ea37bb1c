//! Rate limiting for the incubator portal.
//!
//! Each endpoint class ([`RateLimitType`]) has a [`RateLimiter`] built from a
//! [`LimiterProfile`]; [`RateLimiters`] groups them for injection into the
//! HTTP layer.

pub mod limiter;
pub mod profile;
pub mod registry;

pub use limiter::{Grant, RateLimitState, RateLimited, RateLimiter};
pub use profile::{LimiterProfile, MAX_PERIOD, RateLimitProfiles, RateLimitType};
pub use registry::{ANONYMOUS_IDENTIFIER, RateLimiters, client_identifier};
