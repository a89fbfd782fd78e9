use std::sync::Arc;

use axum::{routing::post, Router};

use crate::features::comments::handlers;
use crate::features::comments::services::CommentService;
use crate::shared::rate_limit::{rate_limited, RateLimitRule, RateLimiter};

pub fn routes(service: Arc<CommentService>, limiter: &Arc<RateLimiter>) -> Router {
    Router::new()
        .route(
            "/relato/{id}/comment",
            rate_limited(post(handlers::add_comment), limiter, RateLimitRule::Comment),
        )
        .route(
            "/report_comment/{id}",
            rate_limited(
                post(handlers::report_comment),
                limiter,
                RateLimitRule::ReportComment,
            ),
        )
        .route(
            "/like_comment/{id}",
            rate_limited(
                post(handlers::like_comment),
                limiter,
                RateLimitRule::LikeComment,
            ),
        )
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum_test::TestServer;

    use crate::shared::test_helpers::{lazy_pool, test_metadata_service, with_sessions};

    fn server() -> TestServer {
        let pool = lazy_pool();
        let service = Arc::new(CommentService::new(
            pool.clone(),
            test_metadata_service(pool),
        ));
        TestServer::new(with_sessions(routes(
            service,
            &Arc::new(RateLimiter::new()),
        )))
        .unwrap()
    }

    #[tokio::test]
    async fn test_anonymous_comment_needs_author_and_text() {
        let server = server();

        let blank_text = server
            .post("/relato/5/comment")
            .form(&[("autor", "Ana"), ("texto", "   ")])
            .await;
        blank_text.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = blank_text.json();
        assert_eq!(body["message"], "Autor e comentário são obrigatórios!");

        let no_author = server
            .post("/relato/5/comment")
            .form(&[("autor", ""), ("texto", "Eu também vi")])
            .await;
        no_author.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_overlong_comment_is_rejected() {
        let text = "a".repeat(1001);
        let response = server()
            .post("/relato/5/comment")
            .form(&[("autor", "Ana"), ("texto", text.as_str())])
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }
}
