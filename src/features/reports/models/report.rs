use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Columns selected whenever a full report row is loaded
pub const REPORT_COLUMNS: &str = "id, titulo, descricao, local, categoria, imagem_url, audio_url, \
     aprovado, votos_acredito, votos_cetico, votos_testemunha, user_id, ip_address, city, \
     user_agent, criado_em";

/// Database model for a sighting report (`relatos`)
#[derive(Debug, Clone, FromRow)]
pub struct Report {
    pub id: i64,
    #[sqlx(rename = "titulo")]
    pub title: String,
    #[sqlx(rename = "descricao")]
    pub description: String,
    #[sqlx(rename = "local")]
    pub location: String,
    #[sqlx(rename = "categoria")]
    pub category: String,
    #[sqlx(rename = "imagem_url")]
    pub image_url: Option<String>,
    pub audio_url: Option<String>,
    #[sqlx(rename = "aprovado")]
    pub approved: bool,
    #[sqlx(rename = "votos_acredito")]
    pub believe_votes: i32,
    #[sqlx(rename = "votos_cetico")]
    pub skeptic_votes: i32,
    #[sqlx(rename = "votos_testemunha")]
    pub witness_votes: i32,
    pub user_id: Option<i64>,
    pub ip_address: Option<String>,
    pub city: Option<String>,
    pub user_agent: Option<String>,
    #[sqlx(rename = "criado_em")]
    pub created_at: DateTime<Utc>,
}

impl Report {
    /// Media URLs attached to the report
    pub fn media_urls(&self) -> impl Iterator<Item = &str> {
        self.image_url
            .as_deref()
            .into_iter()
            .chain(self.audio_url.as_deref())
    }
}

/// Data for inserting a new, unapproved report
#[derive(Debug, Clone)]
pub struct CreateReport {
    pub title: String,
    pub description: String,
    pub location: String,
    pub category: String,
    pub image_url: Option<String>,
    pub audio_url: Option<String>,
    pub user_id: Option<i64>,
    pub ip_address: String,
    pub user_agent: Option<String>,
}
