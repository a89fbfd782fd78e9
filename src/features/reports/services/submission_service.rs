use std::collections::BTreeMap;
use std::sync::Arc;

use sqlx::PgPool;

use crate::core::error::{AppError, Result};
use crate::core::extractor::RequestMetadata;
use crate::features::metadata::{MetadataService, MetadataTarget};
use crate::features::notifications::NotificationService;
use crate::features::reports::models::{CreateReport, Report, REPORT_COLUMNS};
use crate::modules::captcha::CaptchaVerifier;
use crate::modules::storage::{delete_quietly, MediaStore, REPORTS_FOLDER};
use crate::shared::constants::{
    is_valid_category, MAX_AUDIO_BYTES, MAX_IMAGE_BYTES, MAX_REPORT_DESCRIPTION_CHARS,
    MAX_REPORT_TITLE_CHARS, OTHER_LOCATION, OTHER_LOCATION_PREFIX, UNKNOWN_CITY,
};
use crate::shared::locations::LocationCatalog;
use crate::shared::multipart::{Attachment, MultipartForm};
use crate::shared::validation::{
    char_len, is_blank, AUDIO_CONTENT_TYPE_REGEX, IMAGE_CONTENT_TYPE_REGEX,
};

pub const CAPTCHA_FIELD: &str = "g-recaptcha-response";

const CAPTCHA_FAILED: &str = "Falha na verificação do reCAPTCHA. Tente novamente.";
const REQUIRED_FIELDS: &str = "Todos os campos são obrigatórios!";
const TOO_LONG: &str = "Título ou descrição excedeu o limite de caracteres.";
const INVALID_CATEGORY: &str = "Categoria inválida.";
const INVALID_LOCATION: &str = "Local inválido.";
const OTHER_LOCATION_MISSING: &str =
    "Você selecionou \"Outro Local\", por favor, especifique qual é.";
const IMAGE_TOO_LARGE: &str = "A imagem excede o limite de 5 MB.";
const AUDIO_TOO_LARGE: &str = "O áudio excede o limite de 10 MB.";
const INVALID_IMAGE: &str = "O arquivo enviado como imagem não é uma imagem válida.";
const INVALID_AUDIO: &str = "O arquivo enviado como áudio não é um áudio válido.";

/// The multipart submission, text fields and files separated
#[derive(Debug, Clone, Default)]
pub struct SubmissionForm {
    pub fields: BTreeMap<String, String>,
    pub image: Option<Attachment>,
    pub audio: Option<Attachment>,
}

impl SubmissionForm {
    pub fn from_multipart(mut form: MultipartForm) -> Self {
        Self {
            image: form.take_file("imagem"),
            audio: form.take_file("audio"),
            fields: form.fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Text fields echoed back on a validation failure
    pub fn echo(&self) -> BTreeMap<String, String> {
        self.fields
            .iter()
            .filter(|(name, _)| name.as_str() != CAPTCHA_FIELD)
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    /// Form error for `message`, echoing the text fields
    pub fn rejection(&self, message: &str) -> AppError {
        AppError::InvalidForm {
            message: message.to_string(),
            fields: self.echo(),
        }
    }
}

/// Submission fields that passed validation, ready to store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSubmission {
    pub title: String,
    pub description: String,
    pub location: String,
    pub category: String,
}

/// Validate a submission in order: required fields, lengths, category and
/// location, free-text location, attachments. Returns the first failure.
pub fn validate_submission(
    form: &SubmissionForm,
    catalog: &LocationCatalog,
) -> std::result::Result<ValidatedSubmission, &'static str> {
    let title = form.field("titulo");
    let description = form.field("descricao");
    let category = form.field("categoria");

    if is_blank(title) || is_blank(description) || is_blank(category) {
        return Err(REQUIRED_FIELDS);
    }
    let title = title.unwrap_or_default().trim();
    let description = description.unwrap_or_default().trim();
    let category = category.unwrap_or_default().trim();

    if char_len(title) > MAX_REPORT_TITLE_CHARS
        || char_len(description) > MAX_REPORT_DESCRIPTION_CHARS
    {
        return Err(TOO_LONG);
    }

    if !is_valid_category(category) {
        return Err(INVALID_CATEGORY);
    }

    let selected = form.field("local").unwrap_or_default().trim();
    if !catalog.is_selectable(selected) {
        return Err(INVALID_LOCATION);
    }

    let location = if selected == OTHER_LOCATION {
        let other = form.field("outro_local_texto").unwrap_or_default().trim();
        if other.is_empty() {
            return Err(OTHER_LOCATION_MISSING);
        }
        format!("{} {}", OTHER_LOCATION_PREFIX, other)
    } else {
        selected.to_string()
    };

    if let Some(image) = &form.image {
        if image.data.len() > MAX_IMAGE_BYTES {
            return Err(IMAGE_TOO_LARGE);
        }
        if !IMAGE_CONTENT_TYPE_REGEX.is_match(&image.content_type) {
            return Err(INVALID_IMAGE);
        }
    }
    if let Some(audio) = &form.audio {
        if audio.data.len() > MAX_AUDIO_BYTES {
            return Err(AUDIO_TOO_LARGE);
        }
        if !AUDIO_CONTENT_TYPE_REGEX.is_match(&audio.content_type) {
            return Err(INVALID_AUDIO);
        }
    }

    Ok(ValidatedSubmission {
        title: title.to_string(),
        description: description.to_string(),
        location,
        category: category.to_string(),
    })
}

async fn upload_optional(
    store: &dyn MediaStore,
    attachment: Option<Attachment>,
) -> Result<Option<String>> {
    match attachment {
        Some(file) => store
            .upload(
                REPORTS_FOLDER,
                file.data,
                &file.content_type,
                file.file_name.as_deref(),
            )
            .await
            .map(Some),
        None => Ok(None),
    }
}

/// Accepts new reports from visitors
pub struct SubmissionService {
    pool: PgPool,
    catalog: Arc<LocationCatalog>,
    media: Arc<dyn MediaStore>,
    captcha: Arc<CaptchaVerifier>,
    metadata: Arc<MetadataService>,
    notifications: Arc<NotificationService>,
}

impl SubmissionService {
    pub fn new(
        pool: PgPool,
        catalog: Arc<LocationCatalog>,
        media: Arc<dyn MediaStore>,
        captcha: Arc<CaptchaVerifier>,
        metadata: Arc<MetadataService>,
        notifications: Arc<NotificationService>,
    ) -> Self {
        Self {
            pool,
            catalog,
            media,
            captcha,
            metadata,
            notifications,
        }
    }

    pub fn catalog(&self) -> &LocationCatalog {
        &self.catalog
    }

    pub fn captcha(&self) -> &CaptchaVerifier {
        &self.captcha
    }

    /// Validate, upload media and store an unapproved report
    pub async fn submit(
        &self,
        mut form: SubmissionForm,
        user_id: Option<i64>,
        metadata: &RequestMetadata,
    ) -> Result<Report> {
        if let Err(e) = self
            .captcha
            .verify(form.field(CAPTCHA_FIELD), Some(&metadata.ip_address))
            .await
        {
            tracing::warn!("Rejected submission from {}: {}", metadata.ip_address, e);
            return Err(form.rejection(CAPTCHA_FAILED));
        }

        let validated =
            validate_submission(&form, &self.catalog).map_err(|message| form.rejection(message))?;

        let (image, audio) = (form.image.take(), form.audio.take());
        let (image_url, audio_url) = self
            .upload_media(image, audio)
            .await
            .map_err(|e| e.with_form_fields(form.echo()))?;

        let data = CreateReport {
            title: validated.title,
            description: validated.description,
            location: validated.location,
            category: validated.category,
            image_url,
            audio_url,
            user_id,
            ip_address: metadata.ip_address.clone(),
            user_agent: metadata.user_agent.clone(),
        };

        let report = match self.insert(&data).await {
            Ok(report) => report,
            Err(e) => {
                for url in data.image_url.iter().chain(data.audio_url.iter()) {
                    delete_quietly(self.media.as_ref(), url).await;
                }
                return Err(e);
            }
        };

        self.metadata.spawn_city_update(
            MetadataTarget::Report,
            report.id,
            metadata.ip_address.clone(),
        );

        let author = match user_id {
            Some(id) => sqlx::query_scalar::<_, String>("SELECT nome FROM usuarios WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .unwrap_or_else(|e| {
                    tracing::warn!("Failed to load author of report {}: {}", report.id, e);
                    None
                }),
            None => None,
        };
        self.notifications
            .notify_new_report(&report, author.as_deref());

        Ok(report)
    }

    /// Upload image and audio concurrently. If one fails, the other is
    /// removed again and the failure is returned.
    async fn upload_media(
        &self,
        image: Option<Attachment>,
        audio: Option<Attachment>,
    ) -> Result<(Option<String>, Option<String>)> {
        let store = self.media.as_ref();
        let (image, audio) = tokio::join!(upload_optional(store, image), upload_optional(store, audio));

        match (image, audio) {
            (Ok(image_url), Ok(audio_url)) => Ok((image_url, audio_url)),
            (Ok(uploaded), Err(e)) | (Err(e), Ok(uploaded)) => {
                if let Some(url) = uploaded {
                    delete_quietly(store, &url).await;
                }
                Err(e)
            }
            (Err(e), Err(other)) => {
                tracing::warn!("Both uploads failed; second error: {}", other);
                Err(e)
            }
        }
    }

    async fn insert(&self, data: &CreateReport) -> Result<Report> {
        let sql = format!(
            r#"
            INSERT INTO relatos (
                titulo, descricao, local, categoria, imagem_url, audio_url,
                user_id, ip_address, city, user_agent
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {REPORT_COLUMNS}
            "#
        );

        let report = sqlx::query_as::<_, Report>(&sql)
            .bind(&data.title)
            .bind(&data.description)
            .bind(&data.location)
            .bind(&data.category)
            .bind(&data.image_url)
            .bind(&data.audio_url)
            .bind(data.user_id)
            .bind(&data.ip_address)
            .bind(UNKNOWN_CITY)
            .bind(&data.user_agent)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create report: {:?}", e);
                AppError::Database(e)
            })?;

        tracing::info!("Report {} submitted, awaiting moderation", report.id);

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::storage::InMemoryMediaStore;
    use crate::shared::test_helpers::{
        lazy_pool, test_metadata_service, test_notification_service, test_request_metadata,
    };

    fn catalog() -> LocationCatalog {
        LocationCatalog::from_json(
            r#"{
                "Bloco C-56": [-23.4050, -51.9380],
                "Outro Local / Não Listado": [-23.4065, -51.9395]
            }"#,
        )
        .unwrap()
    }

    fn form(fields: &[(&str, &str)]) -> SubmissionForm {
        SubmissionForm {
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            image: None,
            audio: None,
        }
    }

    fn valid_form() -> SubmissionForm {
        form(&[
            ("titulo", "Luz no corredor"),
            ("descricao", "Vi uma luz azul"),
            ("categoria", "Som Estranho"),
            ("local", "Outro Local / Não Listado"),
            ("outro_local_texto", "Biblioteca Central"),
        ])
    }

    fn attachment(content_type: &str, size: usize) -> Attachment {
        Attachment {
            data: vec![0; size],
            content_type: content_type.to_string(),
            file_name: None,
        }
    }

    #[test]
    fn test_other_location_is_prefixed() {
        let validated = validate_submission(&valid_form(), &catalog()).unwrap();
        assert_eq!(validated.location, "Outro: Biblioteca Central");
        assert_eq!(validated.title, "Luz no corredor");
        assert_eq!(validated.category, "Som Estranho");
    }

    #[test]
    fn test_missing_required_field() {
        for missing in ["titulo", "descricao", "categoria"] {
            let mut f = valid_form();
            f.fields.insert(missing.to_string(), "  ".to_string());
            assert_eq!(validate_submission(&f, &catalog()), Err(REQUIRED_FIELDS));

            f.fields.remove(missing);
            assert_eq!(validate_submission(&f, &catalog()), Err(REQUIRED_FIELDS));
        }
    }

    #[test]
    fn test_length_limits_count_characters() {
        let mut f = valid_form();
        f.fields.insert("titulo".to_string(), "ç".repeat(100));
        assert!(validate_submission(&f, &catalog()).is_ok());

        f.fields.insert("titulo".to_string(), "a".repeat(101));
        assert_eq!(validate_submission(&f, &catalog()), Err(TOO_LONG));

        let mut f = valid_form();
        f.fields.insert("descricao".to_string(), "a".repeat(2001));
        assert_eq!(validate_submission(&f, &catalog()), Err(TOO_LONG));
    }

    #[test]
    fn test_surrounding_whitespace_is_trimmed_before_limits() {
        let mut f = valid_form();
        let title = "b".repeat(100);
        f.fields.insert("titulo".to_string(), format!("  {}  ", title));
        f.fields.insert("descricao".to_string(), " Vi uma luz azul\n".to_string());

        let validated = validate_submission(&f, &catalog()).unwrap();
        assert_eq!(validated.title, title);
        assert_eq!(validated.description, "Vi uma luz azul");
    }

    #[test]
    fn test_length_checked_before_category() {
        let mut f = valid_form();
        f.fields.insert("titulo".to_string(), "a".repeat(101));
        f.fields.insert("categoria".to_string(), "Vampiro".to_string());
        assert_eq!(validate_submission(&f, &catalog()), Err(TOO_LONG));
    }

    #[test]
    fn test_unknown_category_and_location() {
        let mut f = valid_form();
        f.fields.insert("categoria".to_string(), "Vampiro".to_string());
        assert_eq!(validate_submission(&f, &catalog()), Err(INVALID_CATEGORY));

        let mut f = valid_form();
        f.fields.insert("local".to_string(), "Marte".to_string());
        assert_eq!(validate_submission(&f, &catalog()), Err(INVALID_LOCATION));
    }

    #[test]
    fn test_other_location_requires_text() {
        let mut f = valid_form();
        f.fields.insert("outro_local_texto".to_string(), "   ".to_string());
        assert_eq!(
            validate_submission(&f, &catalog()),
            Err(OTHER_LOCATION_MISSING)
        );
    }

    #[test]
    fn test_named_location_kept_as_is() {
        let mut f = valid_form();
        f.fields.insert("local".to_string(), "Bloco C-56".to_string());
        let validated = validate_submission(&f, &catalog()).unwrap();
        assert_eq!(validated.location, "Bloco C-56");
    }

    #[test]
    fn test_attachment_limits() {
        let mut f = valid_form();
        f.image = Some(attachment("image/png", MAX_IMAGE_BYTES + 1));
        assert_eq!(validate_submission(&f, &catalog()), Err(IMAGE_TOO_LARGE));

        let mut f = valid_form();
        f.audio = Some(attachment("audio/mpeg", MAX_AUDIO_BYTES + 1));
        assert_eq!(validate_submission(&f, &catalog()), Err(AUDIO_TOO_LARGE));

        let mut f = valid_form();
        f.image = Some(attachment("application/pdf", 10));
        assert_eq!(validate_submission(&f, &catalog()), Err(INVALID_IMAGE));

        let mut f = valid_form();
        f.image = Some(attachment("image/jpeg", MAX_IMAGE_BYTES));
        f.audio = Some(attachment("audio/ogg", 10));
        assert!(validate_submission(&f, &catalog()).is_ok());
    }

    #[test]
    fn test_echo_omits_captcha_token() {
        let mut f = valid_form();
        f.fields
            .insert(CAPTCHA_FIELD.to_string(), "token".to_string());
        let echoed = f.echo();
        assert!(!echoed.contains_key(CAPTCHA_FIELD));
        assert_eq!(echoed.get("titulo").map(String::as_str), Some("Luz no corredor"));
    }

    #[tokio::test]
    async fn test_upload_failure_keeps_entered_fields() {
        let media = Arc::new(InMemoryMediaStore::failing_on("image/png"));
        let mut f = valid_form();
        f.image = Some(attachment("image/png", 512));

        let result = service(&lazy_pool(), Arc::clone(&media))
            .submit(f, None, &test_request_metadata())
            .await;

        let err = result.map(|r| r.id).unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
        match err {
            AppError::InvalidForm { fields, .. } => {
                assert_eq!(fields.get("descricao").map(String::as_str), Some("Vi uma luz azul"));
                assert_eq!(fields.get("categoria").map(String::as_str), Some("Som Estranho"));
            }
            other => panic!("expected InvalidForm, got {:?}", other),
        }
        assert!(media.urls().is_empty());
    }

    fn service(pool: &PgPool, media: Arc<InMemoryMediaStore>) -> SubmissionService {
        let captcha = CaptchaVerifier::new(&crate::core::config::CaptchaConfig {
            site_key: None,
            secret_key: None,
        })
        .unwrap();
        SubmissionService::new(
            pool.clone(),
            Arc::new(catalog()),
            media,
            Arc::new(captcha),
            test_metadata_service(pool.clone()),
            test_notification_service(),
        )
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a running Postgres (DATABASE_URL)"]
    async fn test_submission_is_stored_pending_with_media(pool: PgPool) {
        let media = Arc::new(InMemoryMediaStore::new());
        let mut f = valid_form();
        f.image = Some(attachment("image/jpeg", 1024));

        let report = service(&pool, Arc::clone(&media))
            .submit(f, None, &test_request_metadata())
            .await
            .unwrap();

        assert!(!report.approved);
        assert_eq!(report.location, "Outro: Biblioteca Central");
        assert_eq!(report.category, "Som Estranho");
        assert_eq!((report.believe_votes, report.skeptic_votes, report.witness_votes), (0, 0, 0));
        assert_eq!(report.ip_address.as_deref(), Some("127.0.0.1"));

        let image_url = report.image_url.expect("image stored");
        assert!(media.contains(&image_url));
        assert!(report.audio_url.is_none());
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a running Postgres (DATABASE_URL)"]
    async fn test_failed_upload_leaves_nothing_behind(pool: PgPool) {
        let media = Arc::new(InMemoryMediaStore::failing_on("audio/mpeg"));
        let mut f = valid_form();
        f.image = Some(attachment("image/png", 2048));
        f.audio = Some(attachment("audio/mpeg", 2048));

        let result = service(&pool, Arc::clone(&media))
            .submit(f, None, &test_request_metadata())
            .await;

        match result {
            Err(AppError::InvalidForm { message, fields }) => {
                assert_eq!(message, "Houve um erro ao fazer o upload do arquivo. Tente novamente.");
                assert_eq!(fields.get("titulo").map(String::as_str), Some("Luz no corredor"));
                assert_eq!(
                    fields.get("outro_local_texto").map(String::as_str),
                    Some("Biblioteca Central")
                );
            }
            other => panic!("expected InvalidForm, got {:?}", other.map(|r| r.id)),
        }
        assert!(media.urls().is_empty());
        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM relatos")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(rows, 0);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a running Postgres (DATABASE_URL)"]
    async fn test_invalid_submission_stores_nothing(pool: PgPool) {
        let media = Arc::new(InMemoryMediaStore::new());
        let mut f = form(&[("titulo", "Luz"), ("descricao", "Vi"), ("categoria", "Fantasma"), ("local", "Bloco C-56")]);
        f.image = Some(attachment("image/png", 10));

        let result = service(&pool, Arc::clone(&media))
            .submit(f, None, &test_request_metadata())
            .await;

        match result {
            Err(AppError::InvalidForm { message, fields }) => {
                assert_eq!(message, INVALID_CATEGORY);
                assert_eq!(fields.get("titulo").map(String::as_str), Some("Luz"));
            }
            other => panic!("expected InvalidForm, got {:?}", other.map(|r| r.id)),
        }
        assert!(media.urls().is_empty());
    }
}
