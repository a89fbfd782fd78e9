use std::collections::BTreeMap;
use std::sync::Arc;

use sqlx::PgPool;

use crate::core::error::{AppError, Result};
use crate::features::legends::models::{Legend, LEGEND_COLUMNS};
use crate::modules::storage::{delete_quietly, MediaStore, LEGENDS_FOLDER};
use crate::shared::constants::{MAX_IMAGE_BYTES, MAX_LEGEND_TITLE_CHARS};
use crate::shared::multipart::{Attachment, MultipartForm};
use crate::shared::validation::{char_len, is_blank, IMAGE_CONTENT_TYPE_REGEX};

pub const LEGEND_NOT_FOUND_MESSAGE: &str = "Lenda não encontrada.";

const REQUIRED_FIELDS: &str = "Todos os campos são obrigatórios.";
const TITLE_TOO_LONG: &str = "O título da lenda excedeu o limite de caracteres.";
const IMAGE_TOO_LARGE: &str = "A imagem excede o limite de 5 MB.";
const INVALID_IMAGE: &str = "O arquivo enviado como imagem não é uma imagem válida.";

/// Legend fields from the admin form
#[derive(Debug, Clone)]
pub struct LegendForm {
    pub title: String,
    pub description: String,
    pub location: String,
    pub image: Option<Attachment>,
}

impl LegendForm {
    /// Validate the multipart admin form
    pub fn from_multipart(mut form: MultipartForm) -> std::result::Result<Self, &'static str> {
        let image = form.take_file("imagem");
        let title = form.fields.get("titulo").map(String::as_str);
        let description = form.fields.get("descricao").map(String::as_str);
        let location = form.fields.get("local").map(String::as_str);

        if is_blank(title) || is_blank(description) || is_blank(location) {
            return Err(REQUIRED_FIELDS);
        }
        let title = title.unwrap_or_default().trim().to_string();
        if char_len(&title) > MAX_LEGEND_TITLE_CHARS {
            return Err(TITLE_TOO_LONG);
        }

        if let Some(image) = &image {
            if image.data.len() > MAX_IMAGE_BYTES {
                return Err(IMAGE_TOO_LARGE);
            }
            if !IMAGE_CONTENT_TYPE_REGEX.is_match(&image.content_type) {
                return Err(INVALID_IMAGE);
            }
        }

        Ok(Self {
            title,
            description: description.unwrap_or_default().trim().to_string(),
            location: location.unwrap_or_default().trim().to_string(),
            image,
        })
    }

    /// Text fields echoed back when the form has to be re-rendered
    pub fn echo(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("titulo".to_string(), self.title.clone()),
            ("descricao".to_string(), self.description.clone()),
            ("local".to_string(), self.location.clone()),
        ])
    }
}

/// Service for campus legends
pub struct LegendService {
    pool: PgPool,
    media: Arc<dyn MediaStore>,
}

impl LegendService {
    pub fn new(pool: PgPool, media: Arc<dyn MediaStore>) -> Self {
        Self { pool, media }
    }

    /// Legends in title order, for the public page
    pub async fn list_by_title(&self) -> Result<Vec<Legend>> {
        let sql = format!("SELECT {LEGEND_COLUMNS} FROM lendas ORDER BY titulo ASC, id ASC");
        let legends = sqlx::query_as::<_, Legend>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(legends)
    }

    /// Legends newest first, for the admin panel
    pub async fn list_newest_first(&self) -> Result<Vec<Legend>> {
        let sql = format!("SELECT {LEGEND_COLUMNS} FROM lendas ORDER BY id DESC");
        let legends = sqlx::query_as::<_, Legend>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(legends)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Legend> {
        let sql = format!("SELECT {LEGEND_COLUMNS} FROM lendas WHERE id = $1");
        sqlx::query_as::<_, Legend>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(LEGEND_NOT_FOUND_MESSAGE.to_string()))
    }

    async fn upload_image(&self, image: Option<Attachment>) -> Result<Option<String>> {
        match image {
            Some(file) => self
                .media
                .upload(
                    LEGENDS_FOLDER,
                    file.data,
                    &file.content_type,
                    file.file_name.as_deref(),
                )
                .await
                .map(Some),
            None => Ok(None),
        }
    }

    pub async fn create(&self, mut form: LegendForm) -> Result<Legend> {
        let image_url = self
            .upload_image(form.image.take())
            .await
            .map_err(|e| e.with_form_fields(form.echo()))?;

        let sql = format!(
            r#"
            INSERT INTO lendas (titulo, descricao, local, imagem_url)
            VALUES ($1, $2, $3, $4)
            RETURNING {LEGEND_COLUMNS}
            "#
        );
        let inserted = sqlx::query_as::<_, Legend>(&sql)
            .bind(&form.title)
            .bind(&form.description)
            .bind(&form.location)
            .bind(&image_url)
            .fetch_one(&self.pool)
            .await;

        match inserted {
            Ok(legend) => {
                tracing::info!("Legend {} created", legend.id);
                Ok(legend)
            }
            Err(e) => {
                if let Some(url) = &image_url {
                    delete_quietly(self.media.as_ref(), url).await;
                }
                Err(e.into())
            }
        }
    }

    /// Update a legend. The current image stays unless a new one is uploaded;
    /// a replaced image is deleted from storage.
    pub async fn update(&self, id: i64, mut form: LegendForm) -> Result<Legend> {
        let current = self.get_by_id(id).await?;
        let new_image_url = self
            .upload_image(form.image.take())
            .await
            .map_err(|e| e.with_form_fields(form.echo()))?;
        let image_url = new_image_url.clone().or_else(|| current.image_url.clone());

        let sql = format!(
            r#"
            UPDATE lendas
            SET titulo = $2, descricao = $3, local = $4, imagem_url = $5
            WHERE id = $1
            RETURNING {LEGEND_COLUMNS}
            "#
        );
        let updated = sqlx::query_as::<_, Legend>(&sql)
            .bind(id)
            .bind(&form.title)
            .bind(&form.description)
            .bind(&form.location)
            .bind(&image_url)
            .fetch_optional(&self.pool)
            .await;

        let legend = match updated {
            Ok(Some(legend)) => legend,
            other => {
                if let Some(url) = &new_image_url {
                    delete_quietly(self.media.as_ref(), url).await;
                }
                return Err(match other {
                    Err(e) => e.into(),
                    _ => AppError::NotFound(LEGEND_NOT_FOUND_MESSAGE.to_string()),
                });
            }
        };

        if let (Some(_), Some(old_url)) = (&new_image_url, &current.image_url) {
            delete_quietly(self.media.as_ref(), old_url).await;
        }

        tracing::info!("Legend {} updated", id);
        Ok(legend)
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let image_url =
            sqlx::query_scalar::<_, Option<String>>("DELETE FROM lendas WHERE id = $1 RETURNING imagem_url")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        let image_url =
            image_url.ok_or_else(|| AppError::NotFound(LEGEND_NOT_FOUND_MESSAGE.to_string()))?;
        if let Some(url) = image_url {
            delete_quietly(self.media.as_ref(), &url).await;
        }

        tracing::info!("Legend {} deleted", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::storage::InMemoryMediaStore;
    use crate::shared::test_helpers::lazy_pool;

    fn form(fields: &[(&str, &str)]) -> MultipartForm {
        let mut form = MultipartForm::default();
        for (k, v) in fields {
            form.fields.insert(k.to_string(), v.to_string());
        }
        form
    }

    #[test]
    fn test_legend_form_requires_all_fields() {
        let result = LegendForm::from_multipart(form(&[
            ("titulo", "A loira do banheiro"),
            ("descricao", " "),
            ("local", "Bloco C-56"),
        ]));
        assert_eq!(result.unwrap_err(), REQUIRED_FIELDS);
    }

    #[test]
    fn test_legend_title_limit() {
        let long = "a".repeat(151);
        let result = LegendForm::from_multipart(form(&[
            ("titulo", long.as_str()),
            ("descricao", "Conta-se que..."),
            ("local", "Bloco C-56"),
        ]));
        assert_eq!(result.unwrap_err(), TITLE_TOO_LONG);
    }

    #[test]
    fn test_legend_form_rejects_non_image() {
        let mut multipart = form(&[
            ("titulo", "O vulto do RU"),
            ("descricao", "Conta-se que..."),
            ("local", "Restaurante Universitário"),
        ]);
        multipart.files.insert(
            "imagem".to_string(),
            Attachment {
                data: vec![1, 2, 3],
                content_type: "audio/mpeg".to_string(),
                file_name: Some("som.mp3".to_string()),
            },
        );
        assert_eq!(
            LegendForm::from_multipart(multipart).unwrap_err(),
            INVALID_IMAGE
        );
    }

    #[test]
    fn test_legend_form_trims_values() {
        let legend = LegendForm::from_multipart(form(&[
            ("titulo", " O vulto do RU "),
            ("descricao", "Conta-se que..."),
            ("local", " Restaurante Universitário"),
        ]))
        .unwrap();
        assert_eq!(legend.title, "O vulto do RU");
        assert_eq!(legend.location, "Restaurante Universitário");
        assert!(legend.image.is_none());
    }

    fn legend_form(title: &str, image: Option<Attachment>) -> LegendForm {
        LegendForm {
            title: title.to_string(),
            description: "Conta-se que...".to_string(),
            location: "Bloco C-34".to_string(),
            image,
        }
    }

    fn png() -> Attachment {
        Attachment {
            data: vec![0; 64],
            content_type: "image/png".to_string(),
            file_name: Some("lenda.png".to_string()),
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a running Postgres (DATABASE_URL)"]
    async fn test_legend_image_lifecycle(pool: PgPool) {
        let media = Arc::new(InMemoryMediaStore::new());
        let service = LegendService::new(pool, media.clone());

        let created = service
            .create(legend_form("O vulto do RU", Some(png())))
            .await
            .unwrap();
        let first_image = created.image_url.clone().expect("image stored");
        assert!(media.contains(&first_image));

        // No new image: the old one stays
        let kept = service
            .update(created.id, legend_form("O vulto do RU (revisto)", None))
            .await
            .unwrap();
        assert_eq!(kept.image_url.as_deref(), Some(first_image.as_str()));

        // New image: the old one is removed from storage
        let replaced = service
            .update(created.id, legend_form("O vulto do RU", Some(png())))
            .await
            .unwrap();
        let second_image = replaced.image_url.clone().unwrap();
        assert_ne!(second_image, first_image);
        assert!(!media.contains(&first_image));

        service.delete(created.id).await.unwrap();
        assert!(!media.contains(&second_image));
        assert!(matches!(service.get_by_id(created.id).await, Err(AppError::NotFound(_))));
        assert!(matches!(service.delete(created.id).await, Err(AppError::NotFound(_))));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a running Postgres (DATABASE_URL)"]
    async fn test_legend_listing_orders(pool: PgPool) {
        let service = LegendService::new(pool, Arc::new(InMemoryMediaStore::new()));
        let zebra = service.create(legend_form("Zumbido", None)).await.unwrap();
        let alpha = service.create(legend_form("A loira", None)).await.unwrap();

        let by_title: Vec<i64> = service.list_by_title().await.unwrap().iter().map(|l| l.id).collect();
        assert_eq!(by_title, vec![alpha.id, zebra.id]);
        let newest: Vec<i64> = service
            .list_newest_first()
            .await
            .unwrap()
            .iter()
            .map(|l| l.id)
            .collect();
        assert_eq!(newest, vec![alpha.id, zebra.id]);
    }

    fn assert_echoes_form(result: Result<Legend>, title: &str) {
        match result {
            Err(AppError::InvalidForm { message, fields }) => {
                assert_eq!(message, "Houve um erro ao fazer o upload do arquivo. Tente novamente.");
                assert_eq!(fields.get("titulo").map(String::as_str), Some(title));
                assert_eq!(fields.get("local").map(String::as_str), Some("Bloco C-34"));
            }
            other => panic!("expected InvalidForm, got {:?}", other.map(|l| l.id)),
        }
    }

    #[tokio::test]
    async fn test_create_upload_failure_keeps_entered_fields() {
        let media = Arc::new(InMemoryMediaStore::failing_on("image/png"));
        let service = LegendService::new(lazy_pool(), media.clone());

        let result = service.create(legend_form("O vulto do RU", Some(png()))).await;

        assert_echoes_form(result, "O vulto do RU");
        assert!(media.urls().is_empty());
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a running Postgres (DATABASE_URL)"]
    async fn test_update_upload_failure_keeps_entered_fields(pool: PgPool) {
        let service = LegendService::new(pool.clone(), Arc::new(InMemoryMediaStore::new()));
        let created = service.create(legend_form("Zumbido", None)).await.unwrap();

        let failing = LegendService::new(pool, Arc::new(InMemoryMediaStore::failing_on("image/png")));
        let result = failing
            .update(created.id, legend_form("Zumbido no C-34", Some(png())))
            .await;

        assert_echoes_form(result, "Zumbido no C-34");
        let stored = service.get_by_id(created.id).await.unwrap();
        assert_eq!(stored.title, "Zumbido");
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a running Postgres (DATABASE_URL)"]
    async fn test_update_unknown_legend_discards_new_image(pool: PgPool) {
        let media = Arc::new(InMemoryMediaStore::new());
        let service = LegendService::new(pool, media.clone());

        let result = service.update(404, legend_form("Nada", Some(png()))).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert!(media.urls().is_empty());
    }
}
