use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::features::comments::dtos::CommentResponseDto;
use crate::features::reports::models::{InteractionCounts, InteractionKind, Report};

/// Public view of a report
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportResponseDto {
    pub id: i64,
    pub titulo: String,
    pub descricao: String,
    pub local: String,
    pub categoria: String,
    pub imagem_url: Option<String>,
    pub audio_url: Option<String>,
    pub votos_acredito: i32,
    pub votos_cetico: i32,
    pub votos_testemunha: i32,
    pub user_id: Option<i64>,
    pub criado_em: DateTime<Utc>,
}

impl From<Report> for ReportResponseDto {
    fn from(r: Report) -> Self {
        Self {
            id: r.id,
            titulo: r.title,
            descricao: r.description,
            local: r.location,
            categoria: r.category,
            imagem_url: r.image_url,
            audio_url: r.audio_url,
            votos_acredito: r.believe_votes,
            votos_cetico: r.skeptic_votes,
            votos_testemunha: r.witness_votes,
            user_id: r.user_id,
            criado_em: r.created_at,
        }
    }
}

/// Report with moderation state and requester metadata
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdminReportDto {
    #[serde(flatten)]
    pub report: ReportResponseDto,
    pub aprovado: bool,
    pub ip_address: Option<String>,
    pub city: Option<String>,
    pub user_agent: Option<String>,
}

impl From<Report> for AdminReportDto {
    fn from(mut r: Report) -> Self {
        let approved = r.approved;
        let ip_address = r.ip_address.take();
        let city = r.city.take();
        let user_agent = r.user_agent.take();
        Self {
            report: r.into(),
            aprovado: approved,
            ip_address,
            city,
            user_agent,
        }
    }
}

/// Compact report entry used by the rankings
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportSummaryDto {
    pub id: i64,
    pub titulo: String,
    pub categoria: String,
    pub local: String,
    pub votos_acredito: i32,
    pub votos_testemunha: i32,
}

impl From<Report> for ReportSummaryDto {
    fn from(r: Report) -> Self {
        Self {
            id: r.id,
            titulo: r.title,
            categoria: r.category,
            local: r.location,
            votos_acredito: r.believe_votes,
            votos_testemunha: r.witness_votes,
        }
    }
}

/// Query parameters of the public listing
#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ListReportsQuery {
    /// One of the five categories; other values are ignored
    pub categoria: Option<String>,
    /// `ultimo_mes` restricts to the last month
    pub periodo: Option<String>,
    /// Case-insensitive search on title and description
    pub q: Option<String>,
}

/// All reports sharing one map coordinate
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MapMarkerDto {
    pub lat: f64,
    pub lon: f64,
    pub relatos: Vec<ReportResponseDto>,
}

/// Map listing with the filter options
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportListResponseDto {
    pub marcadores: Vec<MapMarkerDto>,
    pub categorias: Vec<String>,
    pub filtros: ListReportsQuery,
}

/// Options needed to render the submission form
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubmitFormOptionsDto {
    pub locais: Vec<String>,
    pub categorias: Vec<String>,
    /// reCAPTCHA site key, absent when verification is disabled
    pub recaptcha_site_key: Option<String>,
}

/// Multipart body of `POST /submit` (documentation only)
#[derive(Debug, Deserialize, ToSchema)]
#[allow(dead_code)]
pub struct SubmitReportDto {
    pub titulo: String,
    pub descricao: String,
    pub local: String,
    pub outro_local_texto: Option<String>,
    pub categoria: String,
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub imagem: Option<String>,
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub audio: Option<String>,
    #[serde(rename = "g-recaptcha-response")]
    pub g_recaptcha_response: Option<String>,
}

/// Report page: the report, its comments and this session's interactions
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportDetailDto {
    pub relato: ReportResponseDto,
    pub comentarios: Vec<CommentResponseDto>,
    /// `acredito` or `cetico` when this session voted
    pub voto_usuario: Option<String>,
    pub testemunha_usuario: bool,
}

/// Flat response of a successful vote
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VoteResponseDto {
    pub success: bool,
    pub message: String,
    pub votos_acredito: i32,
    pub votos_cetico: i32,
}

/// Flat response of a successful witness mark
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WitnessResponseDto {
    pub success: bool,
    pub message: String,
    pub votos_testemunha: i32,
}

impl VoteResponseDto {
    pub fn new(kind: InteractionKind, counts: InteractionCounts) -> Self {
        Self {
            success: true,
            message: kind.success_message().to_string(),
            votos_acredito: counts.believe,
            votos_cetico: counts.skeptic,
        }
    }
}

impl WitnessResponseDto {
    pub fn new(counts: InteractionCounts) -> Self {
        Self {
            success: true,
            message: InteractionKind::Witness.success_message().to_string(),
            votos_testemunha: counts.witness,
        }
    }
}
