//! Storage module for report and legend media
//!
//! Provides the MinIO/S3-compatible client and the `MediaStore` seam the
//! services upload through.

mod minio_client;
#[cfg(test)]
mod memory_store;

use async_trait::async_trait;

use crate::core::error::AppError;

pub use minio_client::MinIOClient;
#[cfg(test)]
pub use memory_store::InMemoryMediaStore;

/// Folder for report attachments
pub const REPORTS_FOLDER: &str = "relatos";
/// Folder for legend images
pub const LEGENDS_FOLDER: &str = "lendas";

/// Media hosting used by submissions and legends
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Store `data` under `folder` and return its public URL
    async fn upload(
        &self,
        folder: &str,
        data: Vec<u8>,
        content_type: &str,
        file_name: Option<&str>,
    ) -> Result<String, AppError>;

    /// Delete the object a public URL points to
    async fn delete_by_url(&self, url: &str) -> Result<(), AppError>;
}

/// Best-effort delete: failures are logged, never returned
pub async fn delete_quietly(store: &dyn MediaStore, url: &str) {
    if let Err(e) = store.delete_by_url(url).await {
        tracing::warn!("Failed to delete media '{}': {}", url, e);
    }
}

/// File extension from the content type, falling back to the uploaded file name
pub fn extension_for(content_type: &str, file_name: Option<&str>) -> String {
    let known = match content_type {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "audio/mpeg" => Some("mp3"),
        "audio/ogg" => Some("ogg"),
        "audio/wav" | "audio/x-wav" => Some("wav"),
        "audio/webm" => Some("webm"),
        "audio/mp4" => Some("m4a"),
        _ => None,
    };

    known
        .map(str::to_string)
        .or_else(|| {
            file_name
                .and_then(|name| name.rsplit_once('.'))
                .map(|(_, ext)| ext.to_ascii_lowercase())
                .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        })
        .unwrap_or_else(|| "bin".to_string())
}
