use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// JSON envelope returned by every API route.
///
/// Failures go through `AppError`, which fills `message` and `errors`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub meta: Option<Meta>,
    pub errors: Option<Vec<String>>,
}

/// Listing metadata; only totals, listings here are never paginated
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Meta {
    pub total: i64,
}

impl<T> ApiResponse<T> {
    fn build(data: Option<T>, message: Option<String>, meta: Option<Meta>) -> Self {
        Self {
            success: true,
            data,
            message,
            meta,
            errors: None,
        }
    }

    pub fn ok(data: T) -> Self {
        Self::build(Some(data), None, None)
    }

    /// Payload plus the flash-style message shown to the visitor
    pub fn ok_with_message(data: T, message: impl Into<String>) -> Self {
        Self::build(Some(data), Some(message.into()), None)
    }

    /// `data` may legitimately be absent (e.g. `/me` for an anonymous visitor)
    pub fn maybe(data: Option<T>) -> Self {
        Self::build(data, None, None)
    }

    pub fn error(message: Option<String>, errors: Option<Vec<String>>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            message,
            meta: None,
            errors,
        }
    }
}

impl<T> ApiResponse<Vec<T>> {
    pub fn listing(items: Vec<T>) -> Self {
        let total = items.len() as i64;
        Self::build(Some(items), None, Some(Meta { total }))
    }
}

impl ApiResponse<()> {
    /// Success carrying only a message, for deletions and similar actions
    pub fn done(message: impl Into<String>) -> Self {
        Self::build(None, Some(message.into()), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_counts_items() {
        let response = ApiResponse::listing(vec!["a", "b", "c"]);
        assert!(response.success);
        assert_eq!(response.meta.map(|m| m.total), Some(3));
    }

    #[test]
    fn test_done_serializes_null_data() {
        let json = serde_json::to_value(ApiResponse::done("Lenda #3 foi excluída com sucesso!"))
            .unwrap();
        assert_eq!(json["success"], true);
        assert!(json["data"].is_null());
        assert_eq!(json["message"], "Lenda #3 foi excluída com sucesso!");
    }
}
