use lazy_static::lazy_static;
use regex::Regex;
use validator::{ValidationErrors, ValidationErrorsKind};

lazy_static! {
    /// MIME types accepted for image attachments
    /// - Valid: "image/jpeg", "image/png", "image/svg+xml"
    /// - Invalid: "application/pdf", "image", "text/html"
    pub static ref IMAGE_CONTENT_TYPE_REGEX: Regex =
        Regex::new(r"^image/[a-z0-9.+-]+$").unwrap();

    /// MIME types accepted for audio attachments
    /// - Valid: "audio/mpeg", "audio/ogg", "audio/x-wav"
    /// - Invalid: "video/mp4", "audio", "image/png"
    pub static ref AUDIO_CONTENT_TYPE_REGEX: Regex =
        Regex::new(r"^audio/[a-z0-9.+-]+$").unwrap();
}

/// Length in characters, not bytes
pub fn char_len(value: &str) -> usize {
    value.chars().count()
}

/// `None`, empty and whitespace-only values all count as missing
pub fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

/// First human-readable message out of a `validator` error tree
pub fn first_error_message(errors: &ValidationErrors) -> String {
    for (field, kind) in errors.errors() {
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                if let Some(error) = field_errors.first() {
                    return error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Campo inválido: {}", field));
                }
            }
            ValidationErrorsKind::Struct(inner) => return first_error_message(inner),
            ValidationErrorsKind::List(items) => {
                if let Some(inner) = items.values().next() {
                    return first_error_message(inner);
                }
            }
        }
    }
    errors.to_string()
}
