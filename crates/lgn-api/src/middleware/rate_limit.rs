use std::sync::Arc;

use axum::Router;
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor,
};

/// Token bucket settings for a group of routes, keyed by client IP
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimit {
    /// Interval at which one request is given back to the bucket
    pub replenish_every_ms: u64,
    pub burst_size: u32,
}

impl RateLimit {
    /// OAuth redirects and callbacks: 2 per second, burst of 20
    pub const OAUTH: Self = Self {
        replenish_every_ms: 500,
        burst_size: 20,
    };

    /// Password submissions: 1 every 2 seconds, burst of 10
    pub const SIGN_IN: Self = Self {
        replenish_every_ms: 2_000,
        burst_size: 10,
    };
}

/// Limit requests to `router` per client IP
///
/// The client IP comes from `X-Forwarded-For`, `X-Real-IP` or `Forwarded`,
/// then from the peer address, so the server must be run with
/// `into_make_service_with_connect_info`. Limited requests get a 429 with
/// `x-ratelimit-*` headers.
pub fn apply_rate_limit<S>(router: Router<S>, limit: RateLimit) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let Some(config) = GovernorConfigBuilder::default()
        .per_millisecond(limit.replenish_every_ms)
        .burst_size(limit.burst_size)
        .key_extractor(SmartIpKeyExtractor)
        .use_headers()
        .finish()
    else {
        // Only zero periods or bursts are refused
        tracing::error!(?limit, "Invalid rate limit, routes left unlimited");
        return router;
    };

    router.layer(GovernorLayer::new(Arc::new(config)))
}
