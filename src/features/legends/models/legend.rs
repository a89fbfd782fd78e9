use chrono::{DateTime, Utc};
use sqlx::FromRow;

pub const LEGEND_COLUMNS: &str = "id, titulo, descricao, local, imagem_url, criado_em";

/// Database model for a campus legend (`lendas`)
#[derive(Debug, Clone, FromRow)]
pub struct Legend {
    pub id: i64,
    #[sqlx(rename = "titulo")]
    pub title: String,
    #[sqlx(rename = "descricao")]
    pub description: String,
    #[sqlx(rename = "local")]
    pub location: String,
    #[sqlx(rename = "imagem_url")]
    pub image_url: Option<String>,
    #[sqlx(rename = "criado_em")]
    pub created_at: DateTime<Utc>,
}
