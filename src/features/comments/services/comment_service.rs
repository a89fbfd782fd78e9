use std::sync::Arc;

use sqlx::PgPool;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::RequestMetadata;
use crate::features::comments::dtos::CreateCommentDto;
use crate::features::comments::models::{
    Comment, CommentWithLikes, CreateComment, LikeAction, COMMENT_COLUMNS,
};
use crate::features::metadata::{MetadataService, MetadataTarget};
use crate::features::reports::services::REPORT_NOT_FOUND_MESSAGE;
use crate::shared::constants::UNKNOWN_CITY;
use crate::shared::validation::first_error_message;

pub const COMMENT_REQUIRED_MESSAGE: &str = "Autor e comentário são obrigatórios!";
pub const COMMENT_NOT_FOUND_MESSAGE: &str = "Comentário não encontrado.";

/// Author shown on a new comment: the profile name for logged-in users,
/// otherwise the trimmed free-text name. `None` when neither is usable.
pub fn resolve_author(profile_name: Option<&str>, submitted: Option<&str>) -> Option<String> {
    profile_name
        .or(submitted)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

/// Service for comments, their likes and their moderation flags
pub struct CommentService {
    pool: PgPool,
    metadata: Arc<MetadataService>,
}

impl CommentService {
    pub fn new(pool: PgPool, metadata: Arc<MetadataService>) -> Self {
        Self { pool, metadata }
    }

    /// Comments on a report, oldest first, with likes as seen by `sid`
    pub async fn list_for_report(&self, report_id: i64, sid: &str) -> Result<Vec<CommentWithLikes>> {
        let sql = format!(
            r#"
            SELECT {COMMENT_COLUMNS},
                (SELECT COUNT(*) FROM curtidas_comentarios cc WHERE cc.comentario_id = c.id) AS like_count,
                EXISTS(
                    SELECT 1 FROM curtidas_comentarios cc
                    WHERE cc.comentario_id = c.id AND cc.session_id = $2
                ) AS liked_by_session
            FROM comentarios c
            WHERE relato_id = $1
            ORDER BY criado_em ASC, id ASC
            "#
        );

        let comments = sqlx::query_as::<_, CommentWithLikes>(&sql)
            .bind(report_id)
            .bind(sid)
            .fetch_all(&self.pool)
            .await?;

        Ok(comments)
    }

    /// Add a comment to an approved report
    pub async fn add(
        &self,
        report_id: i64,
        user_id: Option<i64>,
        dto: &CreateCommentDto,
        metadata: &RequestMetadata,
    ) -> Result<Comment> {
        let text = dto.texto.trim();
        if text.is_empty() {
            return Err(AppError::Validation(COMMENT_REQUIRED_MESSAGE.to_string()));
        }
        dto.validate()
            .map_err(|e| AppError::Validation(first_error_message(&e)))?;

        let profile_name = match user_id {
            Some(id) => {
                sqlx::query_scalar::<_, String>("SELECT nome FROM usuarios WHERE id = $1")
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await?
            }
            None => None,
        };
        let author = resolve_author(profile_name.as_deref(), dto.autor.as_deref())
            .ok_or_else(|| AppError::Validation(COMMENT_REQUIRED_MESSAGE.to_string()))?;

        let approved: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM relatos WHERE id = $1 AND aprovado = TRUE)",
        )
        .bind(report_id)
        .fetch_one(&self.pool)
        .await?;
        if !approved {
            return Err(AppError::NotFound(REPORT_NOT_FOUND_MESSAGE.to_string()));
        }

        let data = CreateComment {
            report_id,
            user_id: profile_name.as_ref().and(user_id),
            author,
            text: text.to_string(),
            ip_address: metadata.ip_address.clone(),
            user_agent: metadata.user_agent.clone(),
        };
        let comment = self.insert(&data).await?;

        self.metadata.spawn_city_update(
            MetadataTarget::Comment,
            comment.id,
            metadata.ip_address.clone(),
        );

        Ok(comment)
    }

    async fn insert(&self, data: &CreateComment) -> Result<Comment> {
        let sql = format!(
            r#"
            INSERT INTO comentarios (relato_id, user_id, autor, texto, ip_address, city, user_agent)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {COMMENT_COLUMNS}
            "#
        );

        let comment = sqlx::query_as::<_, Comment>(&sql)
            .bind(data.report_id)
            .bind(data.user_id)
            .bind(&data.author)
            .bind(&data.text)
            .bind(&data.ip_address)
            .bind(UNKNOWN_CITY)
            .bind(&data.user_agent)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create comment: {:?}", e);
                AppError::Database(e)
            })?;

        tracing::info!("Comment {} added to report {}", comment.id, comment.report_id);

        Ok(comment)
    }

    /// Mark a comment as reported by a visitor
    pub async fn flag(&self, comment_id: i64) -> Result<Comment> {
        self.set_flag(comment_id, true).await
    }

    /// Clear a visitor report after moderation
    pub async fn unflag(&self, comment_id: i64) -> Result<Comment> {
        self.set_flag(comment_id, false).await
    }

    async fn set_flag(&self, comment_id: i64, flagged: bool) -> Result<Comment> {
        let sql = format!(
            "UPDATE comentarios SET denunciado = $2 WHERE id = $1 RETURNING {COMMENT_COLUMNS}"
        );

        sqlx::query_as::<_, Comment>(&sql)
            .bind(comment_id)
            .bind(flagged)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(COMMENT_NOT_FOUND_MESSAGE.to_string()))
    }

    /// Toggle the session's like on a comment; returns the new like count
    pub async fn toggle_like(&self, comment_id: i64, sid: &str) -> Result<(LikeAction, i64)> {
        let mut tx = self.pool.begin().await?;

        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM comentarios WHERE id = $1)")
                .bind(comment_id)
                .fetch_one(&mut *tx)
                .await?;
        if !exists {
            return Err(AppError::NotFound(COMMENT_NOT_FOUND_MESSAGE.to_string()));
        }

        let removed = sqlx::query(
            "DELETE FROM curtidas_comentarios WHERE comentario_id = $1 AND session_id = $2",
        )
        .bind(comment_id)
        .bind(sid)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let action = if removed > 0 {
            LikeAction::Unliked
        } else {
            sqlx::query(
                r#"
                INSERT INTO curtidas_comentarios (comentario_id, session_id)
                VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(comment_id)
            .bind(sid)
            .execute(&mut *tx)
            .await?;
            LikeAction::Liked
        };

        let likes: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM curtidas_comentarios WHERE comentario_id = $1")
                .bind(comment_id)
                .fetch_one(&mut *tx)
                .await?;

        tx.commit().await?;

        Ok((action, likes))
    }

    /// Every comment, newest first (admin panel)
    pub async fn list_all(&self) -> Result<Vec<Comment>> {
        let sql = format!("SELECT {COMMENT_COLUMNS} FROM comentarios ORDER BY criado_em DESC, id DESC");
        let comments = sqlx::query_as::<_, Comment>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(comments)
    }

    pub async fn count_flagged(&self) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM comentarios WHERE denunciado = TRUE")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Delete a comment together with its likes
    pub async fn delete(&self, comment_id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM curtidas_comentarios WHERE comentario_id = $1")
            .bind(comment_id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM comentarios WHERE id = $1")
            .bind(comment_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Err(AppError::NotFound(COMMENT_NOT_FOUND_MESSAGE.to_string()));
        }

        tx.commit().await?;
        tracing::info!("Comment {} deleted", comment_id);

        Ok(())
    }
}
