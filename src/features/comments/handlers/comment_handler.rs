use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::core::error::{FlatAppError, Result};
use crate::core::extractor::{AppForm, RequestMetadata};
use crate::core::session::Session;
use crate::features::comments::dtos::{CommentResponseDto, CreateCommentDto, LikeToggleResponseDto};
use crate::features::comments::models::CommentWithLikes;
use crate::features::comments::services::CommentService;
use crate::shared::types::ApiResponse;

/// Comment reported for moderation
#[derive(Debug, Serialize, ToSchema)]
pub struct FlaggedCommentDto {
    pub id: i64,
    pub relato_id: i64,
}

/// Add a comment to an approved report
#[utoipa::path(
    post,
    path = "/relato/{id}/comment",
    params(
        ("id" = i64, Path, description = "Report ID")
    ),
    request_body(
        content = CreateCommentDto,
        content_type = "application/x-www-form-urlencoded",
    ),
    responses(
        (status = 201, description = "Comment added", body = ApiResponse<CommentResponseDto>),
        (status = 400, description = "Missing or too long fields"),
        (status = 404, description = "Report not found or not approved"),
        (status = 429, description = "Too many comments")
    ),
    tag = "comments"
)]
pub async fn add_comment(
    session: Session,
    metadata: RequestMetadata,
    State(service): State<Arc<CommentService>>,
    Path(report_id): Path<i64>,
    AppForm(dto): AppForm<CreateCommentDto>,
) -> Result<(StatusCode, Json<ApiResponse<CommentResponseDto>>)> {
    let comment = service
        .add(report_id, session.user_id, &dto, &metadata)
        .await?;

    let dto = CommentResponseDto::from(CommentWithLikes {
        comment,
        like_count: 0,
        liked_by_session: false,
    });
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok_with_message(
            dto,
            "Comentário adicionado!",
        )),
    ))
}

/// Report a comment to the moderators
#[utoipa::path(
    post,
    path = "/report_comment/{id}",
    params(
        ("id" = i64, Path, description = "Comment ID")
    ),
    responses(
        (status = 200, description = "Comment flagged", body = ApiResponse<FlaggedCommentDto>),
        (status = 404, description = "Comment not found"),
        (status = 429, description = "Too many reports")
    ),
    tag = "comments"
)]
pub async fn report_comment(
    State(service): State<Arc<CommentService>>,
    Path(comment_id): Path<i64>,
) -> Result<Json<ApiResponse<FlaggedCommentDto>>> {
    let comment = service.flag(comment_id).await?;

    Ok(Json(ApiResponse::ok_with_message(
        FlaggedCommentDto {
            id: comment.id,
            relato_id: comment.report_id,
        },
        "Obrigado por sua denúncia. O comentário será revisado pela moderação.",
    )))
}

/// Like or unlike a comment for this session
#[utoipa::path(
    post,
    path = "/like_comment/{id}",
    params(
        ("id" = i64, Path, description = "Comment ID")
    ),
    responses(
        (status = 200, description = "Like toggled", body = LikeToggleResponseDto),
        (status = 404, description = "Comment not found"),
        (status = 429, description = "Too many likes")
    ),
    tag = "comments"
)]
pub async fn like_comment(
    session: Session,
    State(service): State<Arc<CommentService>>,
    Path(comment_id): Path<i64>,
) -> (Session, std::result::Result<Json<LikeToggleResponseDto>, FlatAppError>) {
    let result = service
        .toggle_like(comment_id, &session.sid)
        .await
        .map(|(action, likes)| Json(LikeToggleResponseDto::new(action, likes)))
        .map_err(FlatAppError);

    (session, result)
}
