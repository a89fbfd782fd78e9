//! Per-IP rate limiting for the public write endpoints
//!
//! Sliding-window request logs kept in memory (DashMap), so limits apply per
//! process only.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    middleware::{from_fn_with_state, Next},
    response::Response,
    routing::MethodRouter,
};
use dashmap::DashMap;

use crate::core::error::AppError;
use crate::core::extractor::ClientIp;

const MINUTE: Duration = Duration::from_secs(60);
const HOUR: Duration = Duration::from_secs(3600);

/// Rate-limited actions and their budgets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateLimitRule {
    SubmitReport,
    Comment,
    ReportComment,
    Vote,
    Witness,
    LikeComment,
}

impl RateLimitRule {
    pub const ALL: [RateLimitRule; 6] = [
        RateLimitRule::SubmitReport,
        RateLimitRule::Comment,
        RateLimitRule::ReportComment,
        RateLimitRule::Vote,
        RateLimitRule::Witness,
        RateLimitRule::LikeComment,
    ];

    pub fn action(&self) -> &'static str {
        match self {
            RateLimitRule::SubmitReport => "submit",
            RateLimitRule::Comment => "comment",
            RateLimitRule::ReportComment => "report_comment",
            RateLimitRule::Vote => "vote",
            RateLimitRule::Witness => "witness",
            RateLimitRule::LikeComment => "like_comment",
        }
    }

    pub fn max_requests(&self) -> usize {
        match self {
            RateLimitRule::SubmitReport => 5,
            RateLimitRule::Comment => 10,
            RateLimitRule::ReportComment => 15,
            RateLimitRule::Vote => 30,
            RateLimitRule::Witness => 30,
            RateLimitRule::LikeComment => 60,
        }
    }

    pub fn window(&self) -> Duration {
        match self {
            RateLimitRule::SubmitReport | RateLimitRule::Comment => MINUTE,
            _ => HOUR,
        }
    }

    fn longest_window() -> Duration {
        Self::ALL
            .iter()
            .map(|rule| rule.window())
            .max()
            .unwrap_or(HOUR)
    }
}

/// Error returned when rate limit is exceeded
#[derive(Debug, Clone)]
pub struct RateLimitError {
    /// Number of seconds until the rate limit resets
    pub retry_after_seconds: u64,
}

impl From<RateLimitError> for AppError {
    fn from(e: RateLimitError) -> Self {
        AppError::RateLimitExceeded(format!(
            "Muitas requisições. Tente novamente em {} segundos.",
            e.retry_after_seconds
        ))
    }
}

/// Rate limiter using in-memory storage
#[derive(Default)]
pub struct RateLimiter {
    /// Map of (action:identifier) -> request timestamps
    requests: DashMap<String, Vec<Instant>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a request for `identifier` under `rule`, or reject it when the
    /// window is already full.
    pub fn check(&self, rule: RateLimitRule, identifier: &str) -> Result<(), RateLimitError> {
        self.check_at(rule, identifier, Instant::now())
    }

    fn check_at(
        &self,
        rule: RateLimitRule,
        identifier: &str,
        now: Instant,
    ) -> Result<(), RateLimitError> {
        let key = format!("{}:{}", rule.action(), identifier);
        let window = rule.window();

        let mut entry = self.requests.entry(key).or_default();
        entry.retain(|&timestamp| now.duration_since(timestamp) < window);

        if entry.len() >= rule.max_requests() {
            let oldest = entry[0];
            let retry_after = window.saturating_sub(now.duration_since(oldest));

            tracing::warn!(
                "Rate limit hit: action={}, identifier={}",
                rule.action(),
                identifier
            );
            return Err(RateLimitError {
                retry_after_seconds: retry_after.as_secs() + 1,
            });
        }

        entry.push(now);
        Ok(())
    }

    /// Drop timestamps older than the longest window and forget idle keys
    pub fn cleanup_old_entries(&self) {
        let now = Instant::now();
        let horizon = RateLimitRule::longest_window();

        self.requests.retain(|_, timestamps| {
            timestamps.retain(|&t| now.duration_since(t) < horizon);
            !timestamps.is_empty()
        });
    }

    pub fn tracked_keys_count(&self) -> usize {
        self.requests.len()
    }
}

/// Route-level guard state: which limiter and which budget applies
#[derive(Clone)]
pub struct RateLimitGuard {
    limiter: Arc<RateLimiter>,
    rule: RateLimitRule,
}

impl RateLimitGuard {
    pub fn new(limiter: Arc<RateLimiter>, rule: RateLimitRule) -> Self {
        Self { limiter, rule }
    }
}

/// Middleware for `route_layer(from_fn_with_state(guard, enforce_rate_limit))`
pub async fn enforce_rate_limit(
    State(guard): State<RateLimitGuard>,
    ClientIp(ip): ClientIp,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    guard.limiter.check(guard.rule, &ip)?;
    Ok(next.run(req).await)
}

/// Apply `rule` to every method of `method_router`
pub fn rate_limited<S>(
    method_router: MethodRouter<S>,
    limiter: &Arc<RateLimiter>,
    rule: RateLimitRule,
) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    method_router.route_layer(from_fn_with_state(
        RateLimitGuard::new(Arc::clone(limiter), rule),
        enforce_rate_limit,
    ))
}
