use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::features::legends::models::Legend;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LegendResponseDto {
    pub id: i64,
    pub titulo: String,
    pub descricao: String,
    pub local: String,
    pub imagem_url: Option<String>,
    pub criado_em: DateTime<Utc>,
}

impl From<Legend> for LegendResponseDto {
    fn from(l: Legend) -> Self {
        Self {
            id: l.id,
            titulo: l.title,
            descricao: l.description,
            local: l.location,
            imagem_url: l.image_url,
            criado_em: l.created_at,
        }
    }
}

/// Data for the admin edit form
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LegendEditFormDto {
    pub lenda: LegendResponseDto,
    pub locais: Vec<String>,
}

/// Multipart body of the legend add/edit forms (documentation only)
#[derive(Debug, Deserialize, ToSchema)]
#[allow(dead_code)]
pub struct LegendFormDto {
    pub titulo: String,
    pub descricao: String,
    pub local: String,
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub imagem: Option<String>,
}
