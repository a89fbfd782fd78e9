//! reCAPTCHA verification
//!
//! Verification is active only when a secret key is configured; otherwise
//! every submission passes.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::core::config::CaptchaConfig;
use crate::core::error::AppError;

const RECAPTCHA_VERIFY_URL: &str = "https://www.google.com/recaptcha/api/siteverify";

/// Response from the siteverify endpoint
#[derive(Debug, Deserialize)]
struct VerifyResponse {
    success: bool,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

#[derive(Debug, Error)]
pub enum CaptchaError {
    #[error("CAPTCHA token missing")]
    MissingToken,

    #[error("CAPTCHA verification network error: {0}")]
    Network(String),

    #[error("CAPTCHA verification failed: {0:?}")]
    VerificationFailed(Vec<String>),
}

pub struct CaptchaVerifier {
    site_key: Option<String>,
    secret_key: Option<String>,
    verify_url: String,
    client: reqwest::Client,
}

impl CaptchaVerifier {
    pub fn new(config: &CaptchaConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        if config.secret_key.is_some() {
            tracing::info!("reCAPTCHA verification enabled");
        } else {
            tracing::info!("reCAPTCHA verification disabled (no secret key configured)");
        }

        Ok(Self {
            site_key: config.site_key.clone(),
            secret_key: config.secret_key.clone(),
            verify_url: RECAPTCHA_VERIFY_URL.to_string(),
            client,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.secret_key.is_some()
    }

    /// Site key for the frontend widget, when verification is enabled
    pub fn site_key(&self) -> Option<&str> {
        if self.is_enabled() {
            self.site_key.as_deref()
        } else {
            None
        }
    }

    /// Verify a widget token. Always succeeds when verification is disabled.
    pub async fn verify(
        &self,
        response_token: Option<&str>,
        remote_ip: Option<&str>,
    ) -> Result<(), CaptchaError> {
        let Some(secret) = self.secret_key.as_deref() else {
            return Ok(());
        };

        let token = response_token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(CaptchaError::MissingToken)?;

        let mut params = vec![("secret", secret), ("response", token)];
        if let Some(ip) = remote_ip {
            params.push(("remoteip", ip));
        }

        let response = self
            .client
            .post(&self.verify_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| CaptchaError::Network(e.to_string()))?;

        let verify_response: VerifyResponse = response
            .json()
            .await
            .map_err(|e| CaptchaError::Network(e.to_string()))?;

        if verify_response.success {
            Ok(())
        } else {
            tracing::warn!(
                "CAPTCHA verification failed: {:?}",
                verify_response.error_codes
            );
            Err(CaptchaError::VerificationFailed(verify_response.error_codes))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verifier(secret: Option<&str>) -> CaptchaVerifier {
        CaptchaVerifier::new(&CaptchaConfig {
            site_key: Some("site".to_string()),
            secret_key: secret.map(str::to_string),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_disabled_verifier_accepts_anything() {
        let verifier = verifier(None);
        assert!(!verifier.is_enabled());
        assert_eq!(verifier.site_key(), None);
        assert!(verifier.verify(None, None).await.is_ok());
    }

    #[tokio::test]
    async fn test_enabled_verifier_requires_token() {
        let verifier = verifier(Some("secret"));
        assert_eq!(verifier.site_key(), Some("site"));
        assert!(matches!(
            verifier.verify(Some("  "), None).await,
            Err(CaptchaError::MissingToken)
        ));
    }

    #[test]
    fn test_verify_response_parses_error_codes() {
        let parsed: VerifyResponse =
            serde_json::from_str(r#"{"success": false, "error-codes": ["timeout-or-duplicate"]}"#)
                .unwrap();
        assert!(!parsed.success);
        assert_eq!(parsed.error_codes, vec!["timeout-or-duplicate"]);
    }
}
