use chrono::{DateTime, Utc};
use sqlx::FromRow;

pub const COMMENT_COLUMNS: &str =
    "id, relato_id, user_id, autor, texto, denunciado, ip_address, city, user_agent, criado_em";

/// Database model for a comment (`comentarios`)
#[derive(Debug, Clone, FromRow)]
pub struct Comment {
    pub id: i64,
    #[sqlx(rename = "relato_id")]
    pub report_id: i64,
    pub user_id: Option<i64>,
    #[sqlx(rename = "autor")]
    pub author: String,
    #[sqlx(rename = "texto")]
    pub text: String,
    #[sqlx(rename = "denunciado")]
    pub flagged: bool,
    pub ip_address: Option<String>,
    pub city: Option<String>,
    pub user_agent: Option<String>,
    #[sqlx(rename = "criado_em")]
    pub created_at: DateTime<Utc>,
}

/// A comment as seen by one session on the report page
#[derive(Debug, Clone, FromRow)]
pub struct CommentWithLikes {
    #[sqlx(flatten)]
    pub comment: Comment,
    pub like_count: i64,
    pub liked_by_session: bool,
}

#[derive(Debug, Clone)]
pub struct CreateComment {
    pub report_id: i64,
    pub user_id: Option<i64>,
    pub author: String,
    pub text: String,
    pub ip_address: String,
    pub user_agent: Option<String>,
}

/// Outcome of toggling a like
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeAction {
    Liked,
    Unliked,
}

impl LikeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            LikeAction::Liked => "liked",
            LikeAction::Unliked => "unliked",
        }
    }
}
