use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::features::comments::models::{Comment, CommentWithLikes, LikeAction};

/// Comment as shown on a report page
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CommentResponseDto {
    pub id: i64,
    pub relato_id: i64,
    pub user_id: Option<i64>,
    pub autor: String,
    pub texto: String,
    pub criado_em: DateTime<Utc>,
    pub curtidas: i64,
    pub curtido_por_mim: bool,
}

impl From<CommentWithLikes> for CommentResponseDto {
    fn from(c: CommentWithLikes) -> Self {
        Self {
            id: c.comment.id,
            relato_id: c.comment.report_id,
            user_id: c.comment.user_id,
            autor: c.comment.author,
            texto: c.comment.text,
            criado_em: c.comment.created_at,
            curtidas: c.like_count,
            curtido_por_mim: c.liked_by_session,
        }
    }
}

/// Comment with moderation fields, for the admin panel
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdminCommentDto {
    pub id: i64,
    pub relato_id: i64,
    pub user_id: Option<i64>,
    pub autor: String,
    pub texto: String,
    pub denunciado: bool,
    pub ip_address: Option<String>,
    pub city: Option<String>,
    pub user_agent: Option<String>,
    pub criado_em: DateTime<Utc>,
}

impl From<Comment> for AdminCommentDto {
    fn from(c: Comment) -> Self {
        Self {
            id: c.id,
            relato_id: c.report_id,
            user_id: c.user_id,
            autor: c.author,
            texto: c.text,
            denunciado: c.flagged,
            ip_address: c.ip_address,
            city: c.city,
            user_agent: c.user_agent,
            criado_em: c.created_at,
        }
    }
}

/// Urlencoded comment form. `autor` is only read for anonymous visitors.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateCommentDto {
    #[serde(default)]
    #[validate(length(max = 100, message = "O nome do autor excedeu o limite de caracteres."))]
    pub autor: Option<String>,

    #[serde(default)]
    #[validate(length(max = 1000, message = "O comentário excedeu o limite de caracteres."))]
    pub texto: String,
}

/// Response of the like toggle
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LikeToggleResponseDto {
    pub success: bool,
    /// "liked" or "unliked"
    pub action: String,
    /// Likes on the comment after the toggle
    pub contagens: i64,
}

impl LikeToggleResponseDto {
    pub fn new(action: LikeAction, likes: i64) -> Self {
        Self {
            success: true,
            action: action.as_str().to_string(),
            contagens: likes,
        }
    }
}
