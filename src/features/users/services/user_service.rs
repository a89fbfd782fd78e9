use sqlx::PgPool;

use crate::core::error::{AppError, Result};
use crate::features::users::models::{ExternalIdentity, User, UserReportCount, USER_COLUMNS};

/// Service for accounts
pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the account on first login; later logins refresh name, email
    /// and picture from the provider.
    pub async fn upsert_from_identity(&self, identity: &ExternalIdentity) -> Result<User> {
        let sql = format!(
            r#"
            INSERT INTO usuarios (google_id, nome, email, foto_url)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (google_id) DO UPDATE
                SET nome = EXCLUDED.nome,
                    email = EXCLUDED.email,
                    foto_url = EXCLUDED.foto_url
            RETURNING {USER_COLUMNS}
            "#
        );

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(&identity.google_id)
            .bind(&identity.name)
            .bind(&identity.email)
            .bind(&identity.picture_url)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to upsert user {}: {:?}", identity.google_id, e);
                AppError::Database(e)
            })?;

        tracing::info!("User {} logged in", user.id);

        Ok(user)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM usuarios WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<User> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Usuário não encontrado.".to_string()))
    }

    /// Users with the most approved reports
    pub async fn top_reporters(&self, limit: i64) -> Result<Vec<UserReportCount>> {
        let users = sqlx::query_as::<_, UserReportCount>(
            r#"
            SELECT u.id, u.nome, u.foto_url, COUNT(r.id) AS total_relatos
            FROM usuarios u
            JOIN relatos r ON r.user_id = u.id AND r.aprovado = TRUE
            GROUP BY u.id, u.nome, u.foto_url
            ORDER BY total_relatos DESC, u.id ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::insert_report;

    fn identity(name: &str) -> ExternalIdentity {
        ExternalIdentity {
            google_id: "google-1098".to_string(),
            name: name.to_string(),
            email: "ana@uem.br".to_string(),
            picture_url: None,
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a running Postgres (DATABASE_URL)"]
    async fn test_login_creates_then_refreshes_account(pool: PgPool) {
        let service = UserService::new(pool);

        let created = service.upsert_from_identity(&identity("Ana")).await.unwrap();
        let again = service
            .upsert_from_identity(&identity("Ana Souza"))
            .await
            .unwrap();

        assert_eq!(created.id, again.id);
        assert_eq!(again.name, "Ana Souza");
        assert!(matches!(service.get_by_id(created.id + 1).await, Err(AppError::NotFound(_))));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a running Postgres (DATABASE_URL)"]
    async fn test_top_reporters_count_only_approved(pool: PgPool) {
        let service = UserService::new(pool.clone());
        let user = service.upsert_from_identity(&identity("Ana")).await.unwrap();

        for (title, approved) in [("Um", true), ("Dois", true), ("Três", false)] {
            let id = insert_report(&pool, title, approved, None).await;
            sqlx::query("UPDATE relatos SET user_id = $1 WHERE id = $2")
                .bind(user.id)
                .bind(id)
                .execute(&pool)
                .await
                .unwrap();
        }

        let top = service.top_reporters(10).await.unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].id, user.id);
        assert_eq!(top[0].total_relatos, 2);
    }
}
