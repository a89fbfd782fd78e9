use std::collections::BTreeMap;
use std::sync::Arc;

use sqlx::PgPool;

use crate::core::error::{AppError, Result};
use crate::features::admin::dtos::ModerationFilter;
use crate::features::comments::dtos::AdminCommentDto;
use crate::features::comments::models::Comment;
use crate::features::notifications::NotificationService;
use crate::features::reports::models::{Report, REPORT_COLUMNS};
use crate::features::users::services::UserService;
use crate::modules::storage::{delete_quietly, MediaStore};

const NOT_FOUND_MESSAGE: &str = "Relato não encontrado.";

/// Result of an approval request
#[derive(Debug, Clone)]
pub struct Approval {
    pub report: Report,
    /// False when the report was already approved
    pub changed: bool,
}

/// Group comments by report id, keeping their order within each report
pub fn group_comments_by_report(comments: Vec<Comment>) -> BTreeMap<i64, Vec<AdminCommentDto>> {
    let mut grouped: BTreeMap<i64, Vec<AdminCommentDto>> = BTreeMap::new();
    for comment in comments {
        grouped
            .entry(comment.report_id)
            .or_default()
            .push(comment.into());
    }
    grouped
}

/// Report moderation: listing by state, approval and deletion
pub struct ModerationService {
    pool: PgPool,
    media: Arc<dyn MediaStore>,
    users: Arc<UserService>,
    notifications: Arc<NotificationService>,
}

impl ModerationService {
    pub fn new(
        pool: PgPool,
        media: Arc<dyn MediaStore>,
        users: Arc<UserService>,
        notifications: Arc<NotificationService>,
    ) -> Self {
        Self {
            pool,
            media,
            users,
            notifications,
        }
    }

    pub async fn list(&self, filter: ModerationFilter) -> Result<Vec<Report>> {
        let condition = match filter {
            ModerationFilter::Pending => "WHERE aprovado = FALSE ORDER BY id DESC",
            ModerationFilter::Approved => "WHERE aprovado = TRUE ORDER BY id DESC",
            ModerationFilter::Flagged => {
                "WHERE id IN (SELECT relato_id FROM comentarios WHERE denunciado = TRUE) \
                 ORDER BY id DESC"
            }
            ModerationFilter::All => "ORDER BY aprovado ASC, id DESC",
        };
        let sql = format!("SELECT {REPORT_COLUMNS} FROM relatos {condition}");

        let reports = sqlx::query_as::<_, Report>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(reports)
    }

    /// Approve a pending report. Approving twice is a no-op without email.
    pub async fn approve(&self, id: i64) -> Result<Approval> {
        let sql = format!(
            "UPDATE relatos SET aprovado = TRUE WHERE id = $1 AND aprovado = FALSE \
             RETURNING {REPORT_COLUMNS}"
        );
        let transitioned = sqlx::query_as::<_, Report>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let approval = match transitioned {
            Some(report) => Approval {
                report,
                changed: true,
            },
            None => {
                let sql = format!("SELECT {REPORT_COLUMNS} FROM relatos WHERE id = $1");
                let report = sqlx::query_as::<_, Report>(&sql)
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await?
                    .ok_or_else(|| AppError::NotFound(NOT_FOUND_MESSAGE.to_string()))?;
                return Ok(Approval {
                    report,
                    changed: false,
                });
            }
        };

        tracing::info!("Report {} approved", id);

        if let Some(user_id) = approval.report.user_id {
            match self.users.find_by_id(user_id).await {
                Ok(Some(owner)) => self
                    .notifications
                    .notify_report_approved(&approval.report, &owner),
                Ok(None) => {}
                Err(e) => tracing::warn!("Failed to load owner of report {}: {}", id, e),
            }
        }

        Ok(approval)
    }

    /// Delete a report and everything hanging off it, then its media
    pub async fn delete(&self, id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        // Same row lock as interactions; new children cannot land mid-delete
        let sql = format!("SELECT {REPORT_COLUMNS} FROM relatos WHERE id = $1 FOR UPDATE");
        let report = sqlx::query_as::<_, Report>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(NOT_FOUND_MESSAGE.to_string()))?;

        sqlx::query("SELECT id FROM comentarios WHERE relato_id = $1 FOR UPDATE")
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            DELETE FROM curtidas_comentarios
            WHERE comentario_id IN (SELECT id FROM comentarios WHERE relato_id = $1)
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
        sqlx::query("DELETE FROM comentarios WHERE relato_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM votos WHERE relato_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM testemunhas WHERE relato_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM relatos WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!("Report {} deleted with its comments and interactions", id);

        for url in report.media_urls() {
            delete_quietly(self.media.as_ref(), url).await;
        }

        Ok(())
    }
}
