use std::sync::Arc;

use axum::{routing::get, Router};

use crate::features::auth::handlers;
use crate::features::auth::services::AuthService;

pub fn routes(service: Arc<AuthService>) -> Router {
    Router::new()
        .route("/login", get(handlers::login))
        .route("/authorize", get(handlers::authorize))
        .route("/logout", get(handlers::logout))
        .route("/me", get(handlers::me))
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, StatusCode};
    use axum_test::TestServer;

    use crate::core::config::OAuthConfig;
    use crate::core::session::Session;
    use crate::features::auth::clients::GoogleOAuthClient;
    use crate::features::users::services::UserService;
    use crate::shared::test_helpers::{
        lazy_pool, session_cookie, session_from_set_cookie, with_sessions,
    };

    fn server(google: Option<GoogleOAuthClient>) -> TestServer {
        let service = Arc::new(AuthService::new(
            google,
            Arc::new(UserService::new(lazy_pool())),
        ));
        TestServer::new(with_sessions(routes(service))).unwrap()
    }

    fn google() -> GoogleOAuthClient {
        GoogleOAuthClient::from_config(&OAuthConfig {
            client_id: Some("client-123".to_string()),
            client_secret: Some("secret".to_string()),
            redirect_url: "http://localhost:3000/authorize".to_string(),
        })
        .unwrap()
        .unwrap()
    }

    #[tokio::test]
    async fn test_login_unavailable_without_google_credentials() {
        let response = server(None).get("/login").await;
        response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_login_redirects_and_stores_state() {
        let response = server(Some(google())).get("/login").await;
        response.assert_status(StatusCode::SEE_OTHER);

        let location = response.header(header::LOCATION);
        let location = location.to_str().unwrap();
        assert!(location.starts_with("https://accounts.google.com/"));

        let session = session_from_set_cookie(&response.header(header::SET_COOKIE)).unwrap();
        let state = session.oauth_state.expect("state stored in session");
        assert!(location.contains(&format!("state={}", state)));
    }

    #[tokio::test]
    async fn test_authorize_rejects_state_mismatch() {
        let mut session = Session::anonymous();
        session.oauth_state = Some("expected".to_string());
        let (name, value) = session_cookie(&session);

        let response = server(Some(google()))
            .get("/authorize?code=abc&state=forged")
            .add_header(name, value)
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_logout_keeps_session_id() {
        let mut session = Session::anonymous();
        session.log_in(7);
        let (name, value) = session_cookie(&session);

        let response = server(None).get("/logout").add_header(name, value).await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header(header::LOCATION), "/");

        let updated = session_from_set_cookie(&response.header(header::SET_COOKIE)).unwrap();
        assert_eq!(updated.sid, session.sid);
        assert_eq!(updated.user_id, None);
    }

    #[tokio::test]
    async fn test_me_is_null_for_anonymous_visitors() {
        let response = server(None).get("/me").await;
        response.assert_status_ok();

        let body: serde_json::Value = response.json();
        assert_eq!(body["success"], true);
        assert!(body["data"].is_null());
    }
}
