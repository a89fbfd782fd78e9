//! Reading `multipart/form-data` bodies into text fields and files

use std::collections::{BTreeMap, HashMap};

use axum::extract::Multipart;
use tracing::debug;

use crate::core::error::AppError;

/// An uploaded file
#[derive(Debug, Clone)]
pub struct Attachment {
    pub data: Vec<u8>,
    pub content_type: String,
    pub file_name: Option<String>,
}

/// A decoded multipart body
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub fields: BTreeMap<String, String>,
    pub files: HashMap<String, Attachment>,
}

impl MultipartForm {
    pub fn take_file(&mut self, name: &str) -> Option<Attachment> {
        self.files.remove(name)
    }
}

/// Read every part. Parts named in `file_fields` are kept as files; an empty
/// file part (no file chosen in the form) is dropped. Everything else is text.
pub async fn read_multipart(
    mut multipart: Multipart,
    file_fields: &[&str],
) -> Result<MultipartForm, AppError> {
    let mut form = MultipartForm::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        let name = field.name().unwrap_or("").to_string();

        if file_fields.contains(&name.as_str()) {
            let content_type = field
                .content_type()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "application/octet-stream".to_string());
            let file_name = field
                .file_name()
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string());

            let data = field.bytes().await.map_err(|e| {
                debug!("Failed to read file bytes: {}", e);
                AppError::BadRequest(format!("Failed to read file data: {}", e))
            })?;

            if data.is_empty() {
                continue;
            }
            form.files.insert(
                name,
                Attachment {
                    data: data.to_vec(),
                    content_type,
                    file_name,
                },
            );
        } else {
            let text = field.text().await.map_err(|e| {
                AppError::BadRequest(format!("Failed to read field '{}': {}", name, e))
            })?;
            form.fields.insert(name, text);
        }
    }

    Ok(form)
}
