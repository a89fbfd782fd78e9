use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::MediaStore;
use crate::core::error::AppError;

const BASE_URL: &str = "memory://media";

/// In-process media store for tests; uploads of `fail_content_type` fail.
#[derive(Default)]
pub struct InMemoryMediaStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    next_id: AtomicUsize,
    fail_content_type: Option<String>,
}

impl InMemoryMediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(content_type: &str) -> Self {
        Self {
            objects: Mutex::default(),
            next_id: AtomicUsize::new(0),
            fail_content_type: Some(content_type.to_string()),
        }
    }

    pub fn urls(&self) -> Vec<String> {
        let objects = self.objects.lock().unwrap();
        let mut urls: Vec<String> = objects.keys().cloned().collect();
        urls.sort();
        urls
    }

    pub fn contains(&self, url: &str) -> bool {
        self.objects.lock().unwrap().contains_key(url)
    }
}

#[async_trait]
impl MediaStore for InMemoryMediaStore {
    async fn upload(
        &self,
        folder: &str,
        data: Vec<u8>,
        content_type: &str,
        _file_name: Option<&str>,
    ) -> Result<String, AppError> {
        if self.fail_content_type.as_deref() == Some(content_type) {
            return Err(AppError::MediaUpload(format!(
                "simulated failure for {}",
                content_type
            )));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let url = format!("{}/{}/{}", BASE_URL, folder, id);
        self.objects.lock().unwrap().insert(url.clone(), data);
        Ok(url)
    }

    async fn delete_by_url(&self, url: &str) -> Result<(), AppError> {
        match self.objects.lock().unwrap().remove(url) {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound(format!("No object at {}", url))),
        }
    }
}
