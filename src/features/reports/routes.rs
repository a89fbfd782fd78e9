use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::features::reports::handlers::{self, ReportState};
use crate::shared::rate_limit::{rate_limited, RateLimitRule, RateLimiter};

/// Public report routes: map listing, detail, submission, votes and witness marks
pub fn routes(state: ReportState, limiter: &Arc<RateLimiter>) -> Router {
    Router::new()
        .route("/", get(handlers::list_reports))
        .route("/relato/{id}", get(handlers::get_report))
        .route("/submit", get(handlers::submit_form_options))
        .route(
            "/submit",
            rate_limited(
                post(handlers::submit_report),
                limiter,
                RateLimitRule::SubmitReport,
            ),
        )
        .route(
            "/vote/{id}/{tipo}",
            rate_limited(post(handlers::vote), limiter, RateLimitRule::Vote),
        )
        .route(
            "/witness/{id}",
            rate_limited(post(handlers::witness), limiter, RateLimitRule::Witness),
        )
        .with_state(state)
}
