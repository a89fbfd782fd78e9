use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::Redirect,
    Json,
};

use crate::core::error::Result;
use crate::features::admin::dtos::{ModerationFilter, ModerationPanelDto, ModerationQuery};
use crate::features::admin::services::{group_comments_by_report, ModerationService};
use crate::features::comments::services::CommentService;
use crate::features::reports::dtos::{AdminReportDto, ReportResponseDto};
use crate::shared::types::ApiResponse;

/// State for admin handlers
#[derive(Clone)]
pub struct AdminState {
    pub moderation_service: Arc<ModerationService>,
    pub comment_service: Arc<CommentService>,
}

/// The admin home is the moderation list
pub async fn admin_index() -> Redirect {
    Redirect::to("/admin/relatos")
}

/// Reports for moderation, with all comments and the flagged count
#[utoipa::path(
    get,
    path = "/admin/relatos",
    params(ModerationQuery),
    responses(
        (status = 200, description = "Moderation panel", body = ApiResponse<ModerationPanelDto>),
        (status = 401, description = "Admin credentials required")
    ),
    security(("basic_auth" = [])),
    tag = "admin"
)]
pub async fn list_reports(
    State(state): State<AdminState>,
    Query(query): Query<ModerationQuery>,
) -> Result<Json<ApiResponse<ModerationPanelDto>>> {
    let filter = ModerationFilter::parse(query.filtro.as_deref());

    let reports = state.moderation_service.list(filter).await?;
    let comments = state.comment_service.list_all().await?;
    let flagged = state.comment_service.count_flagged().await?;

    let dto = ModerationPanelDto {
        filtro: filter.as_str().to_string(),
        relatos: reports.into_iter().map(AdminReportDto::from).collect(),
        comentarios_por_relato: group_comments_by_report(comments),
        total_denunciados: flagged,
    };
    Ok(Json(ApiResponse::ok(dto)))
}

#[utoipa::path(
    post,
    path = "/admin/approve/{id}",
    params(
        ("id" = i64, Path, description = "Report ID")
    ),
    responses(
        (status = 200, description = "Report approved (or already approved)", body = ApiResponse<ReportResponseDto>),
        (status = 401, description = "Admin credentials required"),
        (status = 404, description = "Report not found")
    ),
    security(("basic_auth" = [])),
    tag = "admin"
)]
pub async fn approve_report(
    State(state): State<AdminState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ReportResponseDto>>> {
    let approval = state.moderation_service.approve(id).await?;

    let message = if approval.changed {
        format!("Relato #{} foi aprovado com sucesso!", id)
    } else {
        format!("Relato #{} já estava aprovado.", id)
    };
    Ok(Json(ApiResponse::ok_with_message(
        approval.report.into(),
        message,
    )))
}

#[utoipa::path(
    post,
    path = "/admin/delete/{id}",
    params(
        ("id" = i64, Path, description = "Report ID")
    ),
    responses(
        (status = 200, description = "Report and its data deleted"),
        (status = 401, description = "Admin credentials required"),
        (status = 404, description = "Report not found")
    ),
    security(("basic_auth" = [])),
    tag = "admin"
)]
pub async fn delete_report(
    State(state): State<AdminState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>> {
    state.moderation_service.delete(id).await?;
    Ok(Json(ApiResponse::done(
        format!(
            "Relato #{} e seus dados associados foram excluídos!",
            id
        ),
    )))
}

#[utoipa::path(
    post,
    path = "/admin/delete_comment/{id}",
    params(
        ("id" = i64, Path, description = "Comment ID")
    ),
    responses(
        (status = 200, description = "Comment deleted"),
        (status = 401, description = "Admin credentials required"),
        (status = 404, description = "Comment not found")
    ),
    security(("basic_auth" = [])),
    tag = "admin"
)]
pub async fn delete_comment(
    State(state): State<AdminState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>> {
    state.comment_service.delete(id).await?;
    Ok(Json(ApiResponse::done(
        format!("Comentário #{} foi excluído com sucesso!", id),
    )))
}

#[utoipa::path(
    post,
    path = "/admin/unreport_comment/{id}",
    params(
        ("id" = i64, Path, description = "Comment ID")
    ),
    responses(
        (status = 200, description = "Flag cleared"),
        (status = 401, description = "Admin credentials required"),
        (status = 404, description = "Comment not found")
    ),
    security(("basic_auth" = [])),
    tag = "admin"
)]
pub async fn unreport_comment(
    State(state): State<AdminState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>> {
    state.comment_service.unflag(id).await?;
    Ok(Json(ApiResponse::done(
        format!("Denúncia do comentário #{} foi removida.", id),
    )))
}
