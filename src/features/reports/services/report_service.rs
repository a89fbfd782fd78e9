use std::sync::Arc;

use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::core::error::{AppError, Result};
use crate::features::reports::dtos::{ListReportsQuery, MapMarkerDto, ReportResponseDto};
use crate::features::reports::models::{Report, SessionInteraction, REPORT_COLUMNS};
use crate::shared::constants::is_valid_category;
use crate::shared::locations::{group_by_coordinate, LocationCatalog};

pub const REPORT_NOT_FOUND_MESSAGE: &str =
    "Este relato não foi encontrado ou ainda não foi aprovado.";

const LAST_MONTH_PERIOD: &str = "ultimo_mes";

/// Normalized filters of the public listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportFilters {
    pub category: Option<String>,
    pub last_month: bool,
    pub search: Option<String>,
}

impl ReportFilters {
    /// Unknown categories and periods are dropped; the search text is trimmed
    pub fn from_query(query: &ListReportsQuery) -> Self {
        Self {
            category: query
                .categoria
                .as_deref()
                .filter(|c| is_valid_category(c))
                .map(str::to_string),
            last_month: query.periodo.as_deref() == Some(LAST_MONTH_PERIOD),
            search: query
                .q
                .as_deref()
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .map(str::to_string),
        }
    }

    /// The filters as echoed back to the client
    pub fn to_query(&self) -> ListReportsQuery {
        ListReportsQuery {
            categoria: self.category.clone(),
            periodo: self.last_month.then(|| LAST_MONTH_PERIOD.to_string()),
            q: self.search.clone(),
        }
    }
}

/// `%text%` with LIKE wildcards in `text` matched literally
fn contains_pattern(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 2);
    escaped.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Group reports into one map marker per coordinate
pub fn build_markers(catalog: &LocationCatalog, reports: Vec<Report>) -> Vec<MapMarkerDto> {
    group_by_coordinate(catalog, reports, |r| r.location.as_str())
        .into_iter()
        .map(|(coordinate, reports)| MapMarkerDto {
            lat: coordinate.lat,
            lon: coordinate.lon,
            relatos: reports.into_iter().map(ReportResponseDto::from).collect(),
        })
        .collect()
}

/// Read side of reports: listing, detail, profiles and rankings
pub struct ReportService {
    pool: PgPool,
    catalog: Arc<LocationCatalog>,
}

impl ReportService {
    pub fn new(pool: PgPool, catalog: Arc<LocationCatalog>) -> Self {
        Self { pool, catalog }
    }

    /// Approved reports matching the filters, newest first
    pub async fn list_approved(&self, filters: &ReportFilters) -> Result<Vec<Report>> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {REPORT_COLUMNS} FROM relatos WHERE aprovado = TRUE"
        ));

        if let Some(category) = &filters.category {
            qb.push(" AND categoria = ").push_bind(category.clone());
        }
        if filters.last_month {
            qb.push(" AND criado_em >= NOW() - INTERVAL '1 month'");
        }
        if let Some(search) = &filters.search {
            let pattern = contains_pattern(search);
            qb.push(" AND (titulo ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR descricao ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        qb.push(" ORDER BY criado_em DESC, id DESC");

        let reports = qb.build_query_as::<Report>().fetch_all(&self.pool).await?;
        Ok(reports)
    }

    /// Map markers for the filtered listing
    pub async fn list_markers(&self, filters: &ReportFilters) -> Result<Vec<MapMarkerDto>> {
        let reports = self.list_approved(filters).await?;
        Ok(build_markers(&self.catalog, reports))
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Report>> {
        let sql = format!("SELECT {REPORT_COLUMNS} FROM relatos WHERE id = $1");
        let report = sqlx::query_as::<_, Report>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(report)
    }

    /// An approved report; pending and unknown ids are both not found
    pub async fn get_approved(&self, id: i64) -> Result<Report> {
        self.find_by_id(id)
            .await?
            .filter(|r| r.approved)
            .ok_or_else(|| AppError::NotFound(REPORT_NOT_FOUND_MESSAGE.to_string()))
    }

    /// The vote and witness mark `sid` holds on a report
    pub async fn session_interaction(&self, report_id: i64, sid: &str) -> Result<SessionInteraction> {
        let interaction = sqlx::query_as::<_, SessionInteraction>(
            r#"
            SELECT
                (SELECT tipo_voto FROM votos WHERE relato_id = $1 AND session_id = $2) AS vote,
                EXISTS(
                    SELECT 1 FROM testemunhas WHERE relato_id = $1 AND session_id = $2
                ) AS witnessed
            "#,
        )
        .bind(report_id)
        .bind(sid)
        .fetch_one(&self.pool)
        .await?;

        Ok(interaction)
    }

    /// Approved reports owned by a user, newest first
    pub async fn list_approved_by_user(&self, user_id: i64) -> Result<Vec<Report>> {
        let sql = format!(
            "SELECT {REPORT_COLUMNS} FROM relatos \
             WHERE user_id = $1 AND aprovado = TRUE ORDER BY criado_em DESC, id DESC"
        );
        let reports = sqlx::query_as::<_, Report>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(reports)
    }

    /// Approved reports with the most believe votes
    pub async fn top_believed(&self, limit: i64) -> Result<Vec<Report>> {
        let sql = format!(
            "SELECT {REPORT_COLUMNS} FROM relatos WHERE aprovado = TRUE \
             ORDER BY votos_acredito DESC, id DESC LIMIT $1"
        );
        let reports = sqlx::query_as::<_, Report>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(reports)
    }

    /// Approved reports with the most witness marks
    pub async fn top_witnessed(&self, limit: i64) -> Result<Vec<Report>> {
        let sql = format!(
            "SELECT {REPORT_COLUMNS} FROM relatos WHERE aprovado = TRUE \
             ORDER BY votos_testemunha DESC, id DESC LIMIT $1"
        );
        let reports = sqlx::query_as::<_, Report>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::shared::test_helpers::{insert_report, test_catalog};

    fn report(id: i64, location: &str) -> Report {
        Report {
            id,
            title: format!("Relato {}", id),
            description: "Descrição".to_string(),
            location: location.to_string(),
            category: "Aparição".to_string(),
            image_url: None,
            audio_url: None,
            approved: true,
            believe_votes: 0,
            skeptic_votes: 0,
            witness_votes: 0,
            user_id: None,
            ip_address: None,
            city: None,
            user_agent: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_filters_drop_unknown_values() {
        let filters = ReportFilters::from_query(&ListReportsQuery {
            categoria: Some("Vampiro".to_string()),
            periodo: Some("ontem".to_string()),
            q: Some("   ".to_string()),
        });
        assert_eq!(filters, ReportFilters::default());
    }

    #[test]
    fn test_filters_keep_valid_values() {
        let filters = ReportFilters::from_query(&ListReportsQuery {
            categoria: Some("Som Estranho".to_string()),
            periodo: Some("ultimo_mes".to_string()),
            q: Some("  luz azul ".to_string()),
        });
        assert_eq!(filters.category.as_deref(), Some("Som Estranho"));
        assert!(filters.last_month);
        assert_eq!(filters.search.as_deref(), Some("luz azul"));

        let echoed = filters.to_query();
        assert_eq!(echoed.periodo.as_deref(), Some("ultimo_mes"));
        assert_eq!(echoed.q.as_deref(), Some("luz azul"));
    }

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("luz"), "%luz%");
        assert_eq!(contains_pattern("100%_x"), "%100\\%\\_x%");
    }

    #[test]
    fn test_markers_group_by_coordinate_in_first_seen_order() {
        let catalog = LocationCatalog::from_json(
            r#"{
                "Bloco C-56": [-23.4050, -51.9380],
                "Outro Local / Não Listado": [-23.4065, -51.9395]
            }"#,
        )
        .unwrap();

        let markers = build_markers(
            &catalog,
            vec![
                report(3, "Outro: Biblioteca Central"),
                report(2, "Bloco C-56"),
                report(1, "Lugar que não existe"),
            ],
        );

        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0].lat, -23.4065);
        let ids: Vec<i64> = markers[0].relatos.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 1]);
        assert_eq!(markers[1].relatos[0].id, 2);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a running Postgres (DATABASE_URL)"]
    async fn test_listing_filters_and_search(pool: PgPool) {
        let luz = insert_report(&pool, "Luz no corredor", true, None).await;
        let _pending = insert_report(&pool, "Luz pendente", false, None).await;
        let sombra = insert_report(&pool, "Sombra 100% real", true, None).await;
        sqlx::query("UPDATE relatos SET categoria = 'Som Estranho' WHERE id = $1")
            .bind(sombra)
            .execute(&pool)
            .await
            .unwrap();
        let service = ReportService::new(pool, Arc::new(test_catalog()));

        let ids = |reports: Vec<Report>| reports.into_iter().map(|r| r.id).collect::<Vec<_>>();
        let all = service.list_approved(&ReportFilters::default()).await.unwrap();
        assert_eq!(ids(all), vec![sombra, luz]);

        let search = ReportFilters {
            search: Some("LUZ".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(service.list_approved(&search).await.unwrap()), vec![luz]);

        // `%` in the search text is literal
        let literal = ReportFilters {
            search: Some("0%".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(service.list_approved(&literal).await.unwrap()), vec![sombra]);

        let by_category = ReportFilters {
            category: Some("Som Estranho".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(service.list_approved(&by_category).await.unwrap()), vec![sombra]);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a running Postgres (DATABASE_URL)"]
    async fn test_pending_report_is_hidden(pool: PgPool) {
        let pending = insert_report(&pool, "Pendente", false, None).await;
        let service = ReportService::new(pool, Arc::new(test_catalog()));

        assert!(service.find_by_id(pending).await.unwrap().is_some());
        match service.get_approved(pending).await {
            Err(AppError::NotFound(message)) => assert_eq!(message, REPORT_NOT_FOUND_MESSAGE),
            other => panic!("expected NotFound, got {:?}", other.map(|r| r.id)),
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a running Postgres (DATABASE_URL)"]
    async fn test_rankings_order_by_counters(pool: PgPool) {
        let quiet = insert_report(&pool, "Quieto", true, None).await;
        let popular = insert_report(&pool, "Popular", true, None).await;
        sqlx::query("UPDATE relatos SET votos_acredito = 7, votos_testemunha = 1 WHERE id = $1")
            .bind(popular)
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("UPDATE relatos SET votos_testemunha = 3 WHERE id = $1")
            .bind(quiet)
            .execute(&pool)
            .await
            .unwrap();
        let service = ReportService::new(pool, Arc::new(test_catalog()));

        let believed = service.top_believed(10).await.unwrap();
        assert_eq!(believed[0].id, popular);
        let witnessed = service.top_witnessed(10).await.unwrap();
        assert_eq!(witnessed[0].id, quiet);
    }
}
