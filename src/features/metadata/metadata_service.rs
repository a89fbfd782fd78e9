use std::sync::Arc;

use sqlx::PgPool;

use crate::modules::geolocation::IpApiClient;

/// Tables whose rows carry requester metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataTarget {
    Report,
    Comment,
    Vote,
    Witness,
}

impl MetadataTarget {
    fn update_city_sql(&self) -> &'static str {
        match self {
            MetadataTarget::Report => "UPDATE relatos SET city = $1 WHERE id = $2",
            MetadataTarget::Comment => "UPDATE comentarios SET city = $1 WHERE id = $2",
            MetadataTarget::Vote => "UPDATE votos SET city = $1 WHERE id = $2",
            MetadataTarget::Witness => "UPDATE testemunhas SET city = $1 WHERE id = $2",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            MetadataTarget::Report => "relato",
            MetadataTarget::Comment => "comentario",
            MetadataTarget::Vote => "voto",
            MetadataTarget::Witness => "testemunha",
        }
    }
}

/// Spawns best-effort city lookups for freshly inserted rows
pub struct MetadataService {
    pool: PgPool,
    ip_client: Arc<IpApiClient>,
}

impl MetadataService {
    pub fn new(pool: PgPool, ip_client: Arc<IpApiClient>) -> Self {
        Self { pool, ip_client }
    }

    /// Resolve the city for `ip` and store it on the row. Runs detached;
    /// failures are logged and the row keeps its placeholder city.
    pub fn spawn_city_update(&self, target: MetadataTarget, id: i64, ip: String) {
        let pool = self.pool.clone();
        let ip_client = Arc::clone(&self.ip_client);

        tokio::spawn(async move {
            let city = match ip_client.lookup_city(&ip).await {
                Ok(Some(city)) => city,
                Ok(None) => return,
                Err(e) => {
                    tracing::warn!("City lookup failed for {} {}: {}", target.label(), id, e);
                    return;
                }
            };

            if let Err(e) = sqlx::query(target.update_city_sql())
                .bind(&city)
                .bind(id)
                .execute(&pool)
                .await
            {
                tracing::warn!("Failed to store city for {} {}: {}", target.label(), id, e);
            } else {
                tracing::debug!("{} {} located in {}", target.label(), id, city);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_sql_targets_each_table() {
        assert!(MetadataTarget::Report
            .update_city_sql()
            .starts_with("UPDATE relatos "));
        assert!(MetadataTarget::Comment
            .update_city_sql()
            .starts_with("UPDATE comentarios "));
        assert!(MetadataTarget::Vote
            .update_city_sql()
            .starts_with("UPDATE votos "));
        assert!(MetadataTarget::Witness
            .update_city_sql()
            .starts_with("UPDATE testemunhas "));
    }
}
