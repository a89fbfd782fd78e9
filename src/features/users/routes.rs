use axum::{routing::get, Router};

use crate::features::users::handlers::{self, UserState};

pub fn routes(state: UserState) -> Router {
    Router::new()
        .route("/profile/{id}", get(handlers::get_profile))
        .route("/rankings", get(handlers::get_rankings))
        .with_state(state)
}
