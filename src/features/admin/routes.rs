use axum::{
    routing::{get, post},
    Router,
};

use crate::features::admin::handlers::{self, AdminState};

/// Moderation routes; the caller puts these behind admin auth
pub fn routes(state: AdminState) -> Router {
    Router::new()
        .route("/admin", get(handlers::admin_index))
        .route("/admin/relatos", get(handlers::list_reports))
        .route("/admin/approve/{id}", post(handlers::approve_report))
        .route("/admin/delete/{id}", post(handlers::delete_report))
        .route("/admin/delete_comment/{id}", post(handlers::delete_comment))
        .route(
            "/admin/unreport_comment/{id}",
            post(handlers::unreport_comment),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use axum::http::{header, StatusCode};
    use axum::middleware::from_fn;
    use axum_test::TestServer;

    use crate::core::middleware::basic_auth_middleware;
    use crate::features::admin::services::ModerationService;
    use crate::features::comments::CommentService;
    use crate::features::users::UserService;
    use crate::modules::storage::InMemoryMediaStore;
    use crate::shared::test_helpers::{
        basic_auth, lazy_pool, test_metadata_service, test_notification_service,
    };

    fn server() -> TestServer {
        let pool = lazy_pool();
        let state = AdminState {
            moderation_service: Arc::new(ModerationService::new(
                pool.clone(),
                Arc::new(InMemoryMediaStore::new()),
                Arc::new(UserService::new(pool.clone())),
                test_notification_service(),
            )),
            comment_service: Arc::new(CommentService::new(
                pool.clone(),
                test_metadata_service(pool),
            )),
        };
        let app = routes(state).route_layer(from_fn(basic_auth_middleware(
            Arc::new("admin:s3cret".to_string()),
            "Login Required",
        )));
        TestServer::new(app).unwrap()
    }

    #[tokio::test]
    async fn test_admin_requires_basic_auth() {
        let response = server().post("/admin/approve/1").await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.header(header::WWW_AUTHENTICATE),
            "Basic realm=\"Login Required\""
        );

        let (name, value) = basic_auth("admin", "wrong");
        server()
            .get("/admin/relatos")
            .add_header(name, value)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_admin_index_redirects_to_report_queue() {
        let (name, value) = basic_auth("admin", "s3cret");
        let response = server().get("/admin").add_header(name, value).await;

        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header(header::LOCATION), "/admin/relatos");
    }
}
