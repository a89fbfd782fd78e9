use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::core::error::{AppError, FlatAppError, Result};
use crate::core::extractor::RequestMetadata;
use crate::core::session::Session;
use crate::features::comments::dtos::CommentResponseDto;
use crate::features::comments::services::CommentService;
use crate::features::reports::dtos::{
    ListReportsQuery, ReportDetailDto, ReportListResponseDto, ReportResponseDto,
    SubmitFormOptionsDto, SubmitReportDto, VoteResponseDto, WitnessResponseDto,
};
use crate::features::reports::models::{InteractionKind, VoteKind};
use crate::features::reports::services::{
    InteractionService, ReportFilters, ReportService, SubmissionForm, SubmissionService,
};
use crate::shared::constants::CATEGORIES;
use crate::shared::multipart::read_multipart;
use crate::shared::types::ApiResponse;

const SUBMITTED_MESSAGE: &str =
    "Seu relato foi enviado e aguarda aprovação. Obrigado por contribuir!";

/// State for report handlers
#[derive(Clone)]
pub struct ReportState {
    pub report_service: Arc<ReportService>,
    pub submission_service: Arc<SubmissionService>,
    pub interaction_service: Arc<InteractionService>,
    pub comment_service: Arc<CommentService>,
}

fn categories() -> Vec<String> {
    CATEGORIES.iter().map(|c| c.to_string()).collect()
}

/// Approved reports grouped into map markers
#[utoipa::path(
    get,
    path = "/",
    params(ListReportsQuery),
    responses(
        (status = 200, description = "Map markers", body = ApiResponse<ReportListResponseDto>)
    ),
    tag = "reports"
)]
pub async fn list_reports(
    State(state): State<ReportState>,
    Query(query): Query<ListReportsQuery>,
) -> Result<Json<ApiResponse<ReportListResponseDto>>> {
    let filters = ReportFilters::from_query(&query);
    let markers = state.report_service.list_markers(&filters).await?;

    let dto = ReportListResponseDto {
        marcadores: markers,
        categorias: categories(),
        filtros: filters.to_query(),
    };
    Ok(Json(ApiResponse::ok(dto)))
}

/// One approved report with its comments
#[utoipa::path(
    get,
    path = "/relato/{id}",
    params(
        ("id" = i64, Path, description = "Report ID")
    ),
    responses(
        (status = 200, description = "Report found", body = ApiResponse<ReportDetailDto>),
        (status = 404, description = "Report not found or not approved")
    ),
    tag = "reports"
)]
pub async fn get_report(
    session: Session,
    State(state): State<ReportState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ReportDetailDto>>> {
    let report = state.report_service.get_approved(id).await?;
    let comments = state
        .comment_service
        .list_for_report(id, &session.sid)
        .await?;
    let interaction = state
        .report_service
        .session_interaction(id, &session.sid)
        .await?;

    let dto = ReportDetailDto {
        relato: report.into(),
        comentarios: comments.into_iter().map(CommentResponseDto::from).collect(),
        voto_usuario: interaction.vote,
        testemunha_usuario: interaction.witnessed,
    };
    Ok(Json(ApiResponse::ok(dto)))
}

/// Options for the submission form
#[utoipa::path(
    get,
    path = "/submit",
    responses(
        (status = 200, description = "Form options", body = ApiResponse<SubmitFormOptionsDto>)
    ),
    tag = "reports"
)]
pub async fn submit_form_options(
    State(state): State<ReportState>,
) -> Json<ApiResponse<SubmitFormOptionsDto>> {
    let service = &state.submission_service;
    let dto = SubmitFormOptionsDto {
        locais: service.catalog().sorted_names(),
        categorias: categories(),
        recaptcha_site_key: service.captcha().site_key().map(str::to_string),
    };
    Json(ApiResponse::ok(dto))
}

/// Submit a new report for moderation
#[utoipa::path(
    post,
    path = "/submit",
    request_body(
        content = SubmitReportDto,
        content_type = "multipart/form-data",
        description = "Report fields with optional image (5 MB) and audio (10 MB)",
    ),
    responses(
        (status = 201, description = "Report stored, awaiting approval", body = ApiResponse<ReportResponseDto>),
        (status = 400, description = "Invalid form; submitted fields echoed in data"),
        (status = 429, description = "Too many submissions")
    ),
    tag = "reports"
)]
pub async fn submit_report(
    session: Session,
    metadata: RequestMetadata,
    State(state): State<ReportState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<ReportResponseDto>>)> {
    let form = SubmissionForm::from_multipart(read_multipart(multipart, &["imagem", "audio"]).await?);

    let report = state
        .submission_service
        .submit(form, session.user_id, &metadata)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok_with_message(
            report.into(),
            SUBMITTED_MESSAGE,
        )),
    ))
}

/// Vote `acredito` or `cetico` on an approved report
#[utoipa::path(
    post,
    path = "/vote/{id}/{tipo}",
    params(
        ("id" = i64, Path, description = "Report ID"),
        ("tipo" = String, Path, description = "acredito | cetico")
    ),
    responses(
        (status = 200, description = "Vote counted", body = VoteResponseDto),
        (status = 400, description = "Unknown vote type"),
        (status = 403, description = "This session already interacted with the report"),
        (status = 404, description = "Report not found or not approved"),
        (status = 429, description = "Too many votes")
    ),
    tag = "reports"
)]
pub async fn vote(
    session: Session,
    metadata: RequestMetadata,
    State(state): State<ReportState>,
    Path((id, tipo)): Path<(i64, String)>,
) -> (Session, std::result::Result<Json<VoteResponseDto>, FlatAppError>) {
    let result = async {
        let vote = VoteKind::parse(&tipo)
            .ok_or_else(|| AppError::BadRequest("Tipo de voto inválido".to_string()))?;
        let kind = InteractionKind::Vote(vote);
        let counts = state
            .interaction_service
            .interact(id, &session.sid, kind, &metadata)
            .await?;
        Ok::<_, AppError>(Json(VoteResponseDto::new(kind, counts)))
    }
    .await;

    (session, result.map_err(FlatAppError))
}

/// Mark an approved report as witnessed
#[utoipa::path(
    post,
    path = "/witness/{id}",
    params(
        ("id" = i64, Path, description = "Report ID")
    ),
    responses(
        (status = 200, description = "Witness mark recorded", body = WitnessResponseDto),
        (status = 403, description = "This session already interacted with the report"),
        (status = 404, description = "Report not found or not approved"),
        (status = 429, description = "Too many witness marks")
    ),
    tag = "reports"
)]
pub async fn witness(
    session: Session,
    metadata: RequestMetadata,
    State(state): State<ReportState>,
    Path(id): Path<i64>,
) -> (Session, std::result::Result<Json<WitnessResponseDto>, FlatAppError>) {
    let result = state
        .interaction_service
        .interact(id, &session.sid, InteractionKind::Witness, &metadata)
        .await
        .map(|counts| Json(WitnessResponseDto::new(counts)))
        .map_err(FlatAppError);

    (session, result)
}
