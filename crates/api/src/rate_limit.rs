//! Per-IP rate limiting (GCRA)
//!
//! Limits the credential endpoints via tower_governor, one quota per route
//! group: login is strict against password guessing, the OAuth redirect
//! pair is lenient since one sign-in hits it twice. The Generic Cell Rate
//! Algorithm needs no background task.

use governor::middleware::StateInformationMiddleware;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::PeerIpKeyExtractor;
use tracing::warn;

/// Governor config keyed by peer IP, reporting X-RateLimit-* headers
pub type DefaultGovernorConfig =
    tower_governor::governor::GovernorConfig<PeerIpKeyExtractor, StateInformationMiddleware>;

/// One GCRA quota
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Quota {
    /// Seconds to replenish one request
    pub per_second: u64,
    /// Requests that can be made immediately
    pub burst_size: u32,
}

impl Default for Quota {
    fn default() -> Self {
        Self {
            per_second: 2,
            burst_size: 5,
        }
    }
}

impl Quota {
    /// Login brute-force protection
    pub fn strict() -> Self {
        Self {
            per_second: 4,
            burst_size: 2,
        }
    }

    pub fn lenient() -> Self {
        Self {
            per_second: 1,
            burst_size: 10,
        }
    }
}

/// Quotas for the credential routes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub enabled: bool,
    /// `POST /api/login`
    pub login: Quota,
    /// `POST /api/register`
    pub register: Quota,
    /// `/auth/google` and its callback
    pub oauth: Quota,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            login: Quota::strict(),
            register: Quota::default(),
            oauth: Quota::lenient(),
        }
    }
}

impl RateLimitConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }
}

/// Build the governor config for a `GovernorLayer`.
///
/// `None` when limiting is disabled or the quota is zero. The peer IP comes
/// from `ConnectInfo`, so the server must be started with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn create_governor_config(
    config: &RateLimitConfig,
    quota: Quota,
) -> Option<Arc<DefaultGovernorConfig>> {
    if !config.enabled {
        return None;
    }
    let governor = GovernorConfigBuilder::default()
        .per_second(quota.per_second)
        .burst_size(quota.burst_size)
        .use_headers()
        .finish();
    if governor.is_none() {
        warn!(
            "Invalid rate limit quota ({}s / burst {}), limiting disabled",
            quota.per_second, quota.burst_size
        );
    }
    governor.map(Arc::new)
}
