use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};

use crate::core::error::{AppError, Result};
use crate::features::legends::dtos::{LegendEditFormDto, LegendFormDto, LegendResponseDto};
use crate::features::legends::models::Legend;
use crate::features::legends::services::{LegendForm, LegendService};
use crate::shared::locations::LocationCatalog;
use crate::shared::multipart::read_multipart;
use crate::shared::types::ApiResponse;

#[derive(Clone)]
pub struct LegendState {
    pub legend_service: Arc<LegendService>,
    pub catalog: Arc<LocationCatalog>,
}

async fn read_legend_form(multipart: Multipart) -> Result<LegendForm> {
    let form = read_multipart(multipart, &["imagem"]).await?;
    LegendForm::from_multipart(form).map_err(|message| AppError::Validation(message.to_string()))
}

fn legend_list(legends: Vec<Legend>) -> ApiResponse<Vec<LegendResponseDto>> {
    let dtos: Vec<LegendResponseDto> = legends.into_iter().map(LegendResponseDto::from).collect();
    ApiResponse::listing(dtos)
}

/// All legends, by title
#[utoipa::path(
    get,
    path = "/lendas",
    responses(
        (status = 200, description = "Legends", body = ApiResponse<Vec<LegendResponseDto>>)
    ),
    tag = "legends"
)]
pub async fn list_legends(
    State(state): State<LegendState>,
) -> Result<Json<ApiResponse<Vec<LegendResponseDto>>>> {
    let legends = state.legend_service.list_by_title().await?;
    Ok(Json(legend_list(legends)))
}

#[utoipa::path(
    get,
    path = "/lenda/{id}",
    params(
        ("id" = i64, Path, description = "Legend ID")
    ),
    responses(
        (status = 200, description = "Legend found", body = ApiResponse<LegendResponseDto>),
        (status = 404, description = "Legend not found")
    ),
    tag = "legends"
)]
pub async fn get_legend(
    State(state): State<LegendState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<LegendResponseDto>>> {
    let legend = state.legend_service.get_by_id(id).await?;
    Ok(Json(ApiResponse::ok(legend.into())))
}

/// All legends, newest first
#[utoipa::path(
    get,
    path = "/admin/lendas",
    responses(
        (status = 200, description = "Legends", body = ApiResponse<Vec<LegendResponseDto>>),
        (status = 401, description = "Admin credentials required")
    ),
    security(("basic_auth" = [])),
    tag = "admin"
)]
pub async fn admin_list_legends(
    State(state): State<LegendState>,
) -> Result<Json<ApiResponse<Vec<LegendResponseDto>>>> {
    let legends = state.legend_service.list_newest_first().await?;
    Ok(Json(legend_list(legends)))
}

#[utoipa::path(
    post,
    path = "/admin/lenda/add",
    request_body(
        content = LegendFormDto,
        content_type = "multipart/form-data",
    ),
    responses(
        (status = 201, description = "Legend created", body = ApiResponse<LegendResponseDto>),
        (status = 400, description = "Missing fields or invalid image"),
        (status = 401, description = "Admin credentials required")
    ),
    security(("basic_auth" = [])),
    tag = "admin"
)]
pub async fn create_legend(
    State(state): State<LegendState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<LegendResponseDto>>)> {
    let form = read_legend_form(multipart).await?;
    let legend = state.legend_service.create(form).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok_with_message(
            legend.into(),
            "Nova lenda adicionada com sucesso!",
        )),
    ))
}

/// Legend plus the location options for the edit form
#[utoipa::path(
    get,
    path = "/admin/lenda/edit/{id}",
    params(
        ("id" = i64, Path, description = "Legend ID")
    ),
    responses(
        (status = 200, description = "Edit form data", body = ApiResponse<LegendEditFormDto>),
        (status = 401, description = "Admin credentials required"),
        (status = 404, description = "Legend not found")
    ),
    security(("basic_auth" = [])),
    tag = "admin"
)]
pub async fn edit_legend_form(
    State(state): State<LegendState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<LegendEditFormDto>>> {
    let legend = state.legend_service.get_by_id(id).await?;
    let dto = LegendEditFormDto {
        lenda: legend.into(),
        locais: state.catalog.sorted_names(),
    };
    Ok(Json(ApiResponse::ok(dto)))
}

#[utoipa::path(
    post,
    path = "/admin/lenda/edit/{id}",
    params(
        ("id" = i64, Path, description = "Legend ID")
    ),
    request_body(
        content = LegendFormDto,
        content_type = "multipart/form-data",
    ),
    responses(
        (status = 200, description = "Legend updated", body = ApiResponse<LegendResponseDto>),
        (status = 400, description = "Missing fields or invalid image"),
        (status = 401, description = "Admin credentials required"),
        (status = 404, description = "Legend not found")
    ),
    security(("basic_auth" = [])),
    tag = "admin"
)]
pub async fn update_legend(
    State(state): State<LegendState>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<LegendResponseDto>>> {
    let form = read_legend_form(multipart).await?;
    let legend = state.legend_service.update(id, form).await?;

    Ok(Json(ApiResponse::ok_with_message(
        legend.into(),
        format!("Lenda #{} atualizada com sucesso!", id),
    )))
}

#[utoipa::path(
    post,
    path = "/admin/lenda/delete/{id}",
    params(
        ("id" = i64, Path, description = "Legend ID")
    ),
    responses(
        (status = 200, description = "Legend deleted"),
        (status = 401, description = "Admin credentials required"),
        (status = 404, description = "Legend not found")
    ),
    security(("basic_auth" = [])),
    tag = "admin"
)]
pub async fn delete_legend(
    State(state): State<LegendState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>> {
    state.legend_service.delete(id).await?;
    Ok(Json(ApiResponse::done(
        format!("Lenda #{} foi excluída com sucesso!", id),
    )))
}
