//! Limiter profiles per endpoint class.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Longest window or block period a profile may configure.
pub const MAX_PERIOD: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Capacity, window and block period of one limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimiterProfile {
    /// Requests allowed per window.
    pub points: u32,

    /// Window length after which the balance refills.
    #[serde(with = "humantime_serde")]
    pub duration: Duration,

    /// How long an identifier stays blocked after exhausting its points.
    #[serde(with = "humantime_serde")]
    pub block_duration: Duration,
}

impl LimiterProfile {
    pub const fn new(points: u32, duration_secs: u64, block_secs: u64) -> Self {
        Self {
            points,
            duration: Duration::from_secs(duration_secs),
            block_duration: Duration::from_secs(block_secs),
        }
    }
}

/// Endpoint classes with their own limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateLimitType {
    Api,
    Auth,
    Submission,
    Admin,
}

impl RateLimitType {
    pub const ALL: [RateLimitType; 4] = [Self::Api, Self::Auth, Self::Submission, Self::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Api => "api",
            Self::Auth => "auth",
            Self::Submission => "submission",
            Self::Admin => "admin",
        }
    }

    pub fn default_profile(&self) -> LimiterProfile {
        match self {
            Self::Api => LimiterProfile::new(100, 60, 60),
            Self::Auth => LimiterProfile::new(5, 900, 900),
            Self::Submission => LimiterProfile::new(10, 3600, 3600),
            Self::Admin => LimiterProfile::new(200, 60, 60),
        }
    }
}

impl fmt::Display for RateLimitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Profiles for all endpoint classes, as loaded from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitProfiles {
    pub api: LimiterProfile,
    pub auth: LimiterProfile,
    pub submission: LimiterProfile,
    pub admin: LimiterProfile,
}

impl Default for RateLimitProfiles {
    fn default() -> Self {
        Self {
            api: RateLimitType::Api.default_profile(),
            auth: RateLimitType::Auth.default_profile(),
            submission: RateLimitType::Submission.default_profile(),
            admin: RateLimitType::Admin.default_profile(),
        }
    }
}

impl RateLimitProfiles {
    pub fn get(&self, kind: RateLimitType) -> LimiterProfile {
        match kind {
            RateLimitType::Api => self.api,
            RateLimitType::Auth => self.auth,
            RateLimitType::Submission => self.submission,
            RateLimitType::Admin => self.admin,
        }
    }

    /// Checks that every profile has capacity, a non-zero window and periods
    /// no longer than [`MAX_PERIOD`].
    pub fn validate(&self) -> Result<(), String> {
        for kind in RateLimitType::ALL {
            let profile = self.get(kind);
            if profile.points == 0 {
                return Err(format!("rate_limit.{kind}.points must be greater than 0"));
            }
            if profile.duration.is_zero() {
                return Err(format!("rate_limit.{kind}.duration must be greater than 0"));
            }
            if profile.duration > MAX_PERIOD || profile.block_duration > MAX_PERIOD {
                return Err(format!(
                    "rate_limit.{kind} periods must not exceed {} days",
                    MAX_PERIOD.as_secs() / 86_400
                ));
            }
        }
        Ok(())
    }
}
