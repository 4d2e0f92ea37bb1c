use crate::limiter::{Grant, RateLimited, RateLimiter};
use crate::profile::{RateLimitProfiles, RateLimitType};

/// Identifier shared by every caller without a forwarded address.
pub const ANONYMOUS_IDENTIFIER: &str = "anonymous";

/// Derives the limiter identifier from the `x-forwarded-for` header value.
///
/// The first address in the list is the originating client. Missing or
/// blank values fall back to [`ANONYMOUS_IDENTIFIER`].
pub fn client_identifier(forwarded_for: Option<&str>) -> String {
    forwarded_for
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .unwrap_or(ANONYMOUS_IDENTIFIER)
        .to_string()
}

/// One limiter per endpoint class.
pub struct RateLimiters {
    api: RateLimiter,
    auth: RateLimiter,
    submission: RateLimiter,
    admin: RateLimiter,
}

impl Default for RateLimiters {
    fn default() -> Self {
        Self::new(&RateLimitProfiles::default())
    }
}

impl RateLimiters {
    pub fn new(profiles: &RateLimitProfiles) -> Self {
        Self {
            api: RateLimiter::new(profiles.api),
            auth: RateLimiter::new(profiles.auth),
            submission: RateLimiter::new(profiles.submission),
            admin: RateLimiter::new(profiles.admin),
        }
    }

    pub fn get(&self, kind: RateLimitType) -> &RateLimiter {
        match kind {
            RateLimitType::Api => &self.api,
            RateLimitType::Auth => &self.auth,
            RateLimitType::Submission => &self.submission,
            RateLimitType::Admin => &self.admin,
        }
    }

    pub fn consume(&self, kind: RateLimitType, identifier: &str) -> Result<Grant, RateLimited> {
        self.get(kind).consume(identifier)
    }
}
