use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::Redirect,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::core::error::Result;
use crate::core::session::Session;
use crate::features::auth::services::AuthService;
use crate::features::users::dtos::CurrentUserDto;
use crate::shared::types::ApiResponse;

/// Query string of the OAuth callback
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AuthorizeQuery {
    pub code: Option<String>,
    pub state: Option<String>,
}

/// Start Google login
#[utoipa::path(
    get,
    path = "/login",
    responses(
        (status = 303, description = "Redirect to Google"),
        (status = 503, description = "Google login not configured")
    ),
    tag = "auth"
)]
pub async fn login(
    mut session: Session,
    State(service): State<Arc<AuthService>>,
) -> Result<(Session, Redirect)> {
    let url = service.begin_login(&mut session)?;
    Ok((session, Redirect::to(&url)))
}

/// OAuth callback
#[utoipa::path(
    get,
    path = "/authorize",
    params(AuthorizeQuery),
    responses(
        (status = 303, description = "Logged in, redirect to the map"),
        (status = 400, description = "State mismatch or missing code"),
        (status = 502, description = "Google rejected the exchange")
    ),
    tag = "auth"
)]
pub async fn authorize(
    mut session: Session,
    State(service): State<Arc<AuthService>>,
    Query(query): Query<AuthorizeQuery>,
) -> Result<(Session, Redirect)> {
    service
        .complete_login(&mut session, query.code.as_deref(), query.state.as_deref())
        .await?;
    Ok((session, Redirect::to("/")))
}

#[utoipa::path(
    get,
    path = "/logout",
    responses(
        (status = 303, description = "Logged out, redirect to the map")
    ),
    tag = "auth"
)]
pub async fn logout(mut session: Session) -> (Session, Redirect) {
    session.log_out();
    (session, Redirect::to("/"))
}

/// The logged-in user, or null
#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "Current user (data is null when anonymous)", body = ApiResponse<CurrentUserDto>)
    ),
    tag = "auth"
)]
pub async fn me(
    session: Session,
    State(service): State<Arc<AuthService>>,
) -> Result<Json<ApiResponse<CurrentUserDto>>> {
    let user = service.current_user(&session).await?;
    Ok(Json(ApiResponse::maybe(user.map(CurrentUserDto::from))))
}
