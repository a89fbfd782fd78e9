use std::sync::Arc;

use sqlx::PgPool;

use crate::core::database::is_unique_violation;
use crate::core::error::{AppError, Result};
use crate::core::extractor::RequestMetadata;
use crate::features::metadata::{MetadataService, MetadataTarget};
use crate::features::reports::models::{InteractionCounts, InteractionKind};
use crate::features::reports::services::report_service::REPORT_NOT_FOUND_MESSAGE;
use crate::shared::constants::UNKNOWN_CITY;

/// Votes and witness marks. A session gets one interaction per report,
/// whichever kind it is.
pub struct InteractionService {
    pool: PgPool,
    metadata: Arc<MetadataService>,
}

impl InteractionService {
    pub fn new(pool: PgPool, metadata: Arc<MetadataService>) -> Self {
        Self { pool, metadata }
    }

    /// Record the interaction and bump its counter, returning the new counts
    pub async fn interact(
        &self,
        report_id: i64,
        sid: &str,
        kind: InteractionKind,
        metadata: &RequestMetadata,
    ) -> Result<InteractionCounts> {
        let mut tx = self.pool.begin().await?;

        // Row lock: interactions on one report run one at a time
        let approved: Option<bool> =
            sqlx::query_scalar("SELECT aprovado FROM relatos WHERE id = $1 FOR UPDATE")
                .bind(report_id)
                .fetch_optional(&mut *tx)
                .await?;
        if approved != Some(true) {
            return Err(AppError::NotFound(REPORT_NOT_FOUND_MESSAGE.to_string()));
        }

        let already: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(SELECT 1 FROM votos WHERE relato_id = $1 AND session_id = $2)
                OR EXISTS(SELECT 1 FROM testemunhas WHERE relato_id = $1 AND session_id = $2)
            "#,
        )
        .bind(report_id)
        .bind(sid)
        .fetch_one(&mut *tx)
        .await?;
        if already {
            return Err(AppError::Forbidden(
                kind.already_interacted_message().to_string(),
            ));
        }

        let inserted = match kind {
            InteractionKind::Vote(vote) => sqlx::query_scalar::<_, i64>(
                r#"
                INSERT INTO votos (relato_id, session_id, tipo_voto, ip_address, city, user_agent)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id
                "#,
            )
            .bind(report_id)
            .bind(sid)
            .bind(vote.as_str())
            .bind(&metadata.ip_address)
            .bind(UNKNOWN_CITY)
            .bind(&metadata.user_agent)
            .fetch_one(&mut *tx)
            .await,
            InteractionKind::Witness => sqlx::query_scalar::<_, i64>(
                r#"
                INSERT INTO testemunhas (relato_id, session_id, ip_address, city, user_agent)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id
                "#,
            )
            .bind(report_id)
            .bind(sid)
            .bind(&metadata.ip_address)
            .bind(UNKNOWN_CITY)
            .bind(&metadata.user_agent)
            .fetch_one(&mut *tx)
            .await,
        };

        let interaction_id = match inserted {
            Ok(id) => id,
            Err(e) if is_unique_violation(&e) => {
                return Err(AppError::Forbidden(
                    kind.already_interacted_message().to_string(),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        let counts = sqlx::query_as::<_, InteractionCounts>(kind.increment_counter_sql())
            .bind(report_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            "Report {} received {} from session {}",
            report_id,
            kind.counter_column(),
            sid
        );

        let target = match kind {
            InteractionKind::Vote(_) => MetadataTarget::Vote,
            InteractionKind::Witness => MetadataTarget::Witness,
        };
        self.metadata
            .spawn_city_update(target, interaction_id, metadata.ip_address.clone());

        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::reports::models::VoteKind;
    use crate::shared::test_helpers::{insert_report, test_metadata_service, test_request_metadata};

    fn service(pool: &PgPool) -> InteractionService {
        InteractionService::new(pool.clone(), test_metadata_service(pool.clone()))
    }

    async fn stored_counts(pool: &PgPool, report_id: i64) -> (i64, i64, i64) {
        sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM votos WHERE relato_id = $1 AND tipo_voto = 'acredito'),
                (SELECT COUNT(*) FROM votos WHERE relato_id = $1 AND tipo_voto = 'cetico'),
                (SELECT COUNT(*) FROM testemunhas WHERE relato_id = $1)
            "#,
        )
        .bind(report_id)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a running Postgres (DATABASE_URL)"]
    async fn test_one_interaction_per_session(pool: PgPool) {
        let report_id = insert_report(&pool, "Vulto na escada", true, None).await;
        let service = service(&pool);
        let metadata = test_request_metadata();
        let believe = InteractionKind::Vote(VoteKind::Believe);

        let counts = service
            .interact(report_id, "sess-x", believe, &metadata)
            .await
            .unwrap();
        assert_eq!((counts.believe, counts.skeptic, counts.witness), (1, 0, 0));

        // Same session: neither another vote nor a witness mark
        let again = service.interact(report_id, "sess-x", believe, &metadata).await;
        assert!(matches!(again, Err(AppError::Forbidden(_))));
        let witness = service
            .interact(report_id, "sess-x", InteractionKind::Witness, &metadata)
            .await;
        assert!(matches!(witness, Err(AppError::Forbidden(_))));

        let other = service
            .interact(report_id, "sess-y", InteractionKind::Witness, &metadata)
            .await
            .unwrap();
        assert_eq!((other.believe, other.skeptic, other.witness), (1, 0, 1));

        assert_eq!(stored_counts(&pool, report_id).await, (1, 0, 1));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a running Postgres (DATABASE_URL)"]
    async fn test_pending_report_cannot_be_voted(pool: PgPool) {
        let report_id = insert_report(&pool, "Ainda pendente", false, None).await;
        let result = service(&pool)
            .interact(
                report_id,
                "sess-x",
                InteractionKind::Vote(VoteKind::Skeptic),
                &test_request_metadata(),
            )
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert_eq!(stored_counts(&pool, report_id).await, (0, 0, 0));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a running Postgres (DATABASE_URL)"]
    async fn test_concurrent_votes_keep_counters_consistent(pool: PgPool) {
        let report_id = insert_report(&pool, "Porta batendo", true, None).await;
        let service = Arc::new(service(&pool));

        let mut handles = Vec::new();
        for i in 0..10 {
            let service = Arc::clone(&service);
            handles.push(tokio::spawn(async move {
                let kind = if i % 2 == 0 {
                    InteractionKind::Vote(VoteKind::Believe)
                } else {
                    InteractionKind::Witness
                };
                service
                    .interact(report_id, &format!("sess-{}", i % 5), kind, &test_request_metadata())
                    .await
            }));
        }
        for handle in handles {
            let _ = handle.await.unwrap();
        }

        let (believe, skeptic, witness): (i32, i32, i32) = sqlx::query_as(
            "SELECT votos_acredito, votos_cetico, votos_testemunha FROM relatos WHERE id = $1",
        )
        .bind(report_id)
        .fetch_one(&pool)
        .await
        .unwrap();
        let (b, s, w) = stored_counts(&pool, report_id).await;
        assert_eq!((believe as i64, skeptic as i64, witness as i64), (b, s, w));
        // Five sessions, one interaction each
        assert_eq!(b + s + w, 5);
    }
}
