use axum::{
    routing::{get, post},
    Router,
};

use crate::features::legends::handlers::{self, LegendState};

pub fn routes(state: LegendState) -> Router {
    Router::new()
        .route("/lendas", get(handlers::list_legends))
        .route("/lenda/{id}", get(handlers::get_legend))
        .with_state(state)
}

/// Legend management; the caller puts these behind admin auth
pub fn admin_routes(state: LegendState) -> Router {
    Router::new()
        .route("/admin/lendas", get(handlers::admin_list_legends))
        .route("/admin/lenda/add", post(handlers::create_legend))
        .route(
            "/admin/lenda/edit/{id}",
            get(handlers::edit_legend_form).post(handlers::update_legend),
        )
        .route("/admin/lenda/delete/{id}", post(handlers::delete_legend))
        .with_state(state)
}
