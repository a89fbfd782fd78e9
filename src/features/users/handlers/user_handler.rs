use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::core::error::Result;
use crate::features::reports::dtos::{ReportResponseDto, ReportSummaryDto};
use crate::features::reports::services::ReportService;
use crate::features::users::dtos::{RankingsDto, UserProfileDto, UserRankingDto};
use crate::features::users::services::UserService;
use crate::shared::constants::RANKING_SIZE;
use crate::shared::types::ApiResponse;

#[derive(Clone)]
pub struct UserState {
    pub user_service: Arc<UserService>,
    pub report_service: Arc<ReportService>,
}

/// Public profile with the user's approved reports
#[utoipa::path(
    get,
    path = "/profile/{id}",
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Profile found", body = ApiResponse<UserProfileDto>),
        (status = 404, description = "User not found")
    ),
    tag = "users"
)]
pub async fn get_profile(
    State(state): State<UserState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<UserProfileDto>>> {
    let user = state.user_service.get_by_id(id).await?;
    let reports = state.report_service.list_approved_by_user(user.id).await?;

    let dto = UserProfileDto {
        usuario: user.into(),
        relatos: reports.into_iter().map(ReportResponseDto::from).collect(),
    };
    Ok(Json(ApiResponse::ok(dto)))
}

#[utoipa::path(
    get,
    path = "/rankings",
    responses(
        (status = 200, description = "Top reports and most active users", body = ApiResponse<RankingsDto>)
    ),
    tag = "users"
)]
pub async fn get_rankings(
    State(state): State<UserState>,
) -> Result<Json<ApiResponse<RankingsDto>>> {
    let (believed, witnessed, reporters) = tokio::try_join!(
        state.report_service.top_believed(RANKING_SIZE),
        state.report_service.top_witnessed(RANKING_SIZE),
        state.user_service.top_reporters(RANKING_SIZE),
    )?;

    let dto = RankingsDto {
        mais_acreditados: believed.into_iter().map(ReportSummaryDto::from).collect(),
        mais_testemunhados: witnessed.into_iter().map(ReportSummaryDto::from).collect(),
        usuarios_mais_ativos: reporters.into_iter().map(UserRankingDto::from).collect(),
    };
    Ok(Json(ApiResponse::ok(dto)))
}
