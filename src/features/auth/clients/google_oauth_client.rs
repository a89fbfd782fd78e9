use std::time::Duration;

use serde::Deserialize;

use crate::core::config::OAuthConfig;
use crate::core::error::{AppError, Result};
use crate::features::users::models::ExternalIdentity;

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";
const SCOPES: &str = "openid email profile";

/// Token endpoint response (only the fields we read)
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// OpenID Connect userinfo response
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleUserInfo {
    pub sub: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

impl GoogleUserInfo {
    /// Identity to store; falls back to the email's local part when Google
    /// sends no display name.
    pub fn into_identity(self) -> Result<ExternalIdentity> {
        let email = self
            .email
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| {
                AppError::ExternalServiceError("Google account has no email".to_string())
            })?;
        let name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());

        Ok(ExternalIdentity {
            google_id: self.sub,
            name,
            email,
            picture_url: self.picture,
        })
    }
}

/// Authorization-code flow against Google
pub struct GoogleOAuthClient {
    client_id: String,
    client_secret: String,
    redirect_url: String,
    http_client: reqwest::Client,
}

impl GoogleOAuthClient {
    /// `None` when no client id/secret is configured
    pub fn from_config(config: &OAuthConfig) -> Result<Option<Self>> {
        let (Some(client_id), Some(client_secret)) =
            (config.client_id.clone(), config.client_secret.clone())
        else {
            tracing::info!("Google login disabled (GOOGLE_CLIENT_ID/SECRET not set)");
            return Ok(None);
        };

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Some(Self {
            client_id,
            client_secret,
            redirect_url: config.redirect_url.clone(),
            http_client,
        }))
    }

    /// Where to send the browser to start the login
    pub fn authorization_url(&self, state: &str) -> Result<String> {
        let url = reqwest::Url::parse_with_params(
            AUTHORIZE_URL,
            &[
                ("response_type", "code"),
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_url.as_str()),
                ("scope", SCOPES),
                ("state", state),
            ],
        )
        .map_err(|e| AppError::Internal(format!("Invalid authorization URL: {}", e)))?;

        Ok(url.into())
    }

    /// Trade the authorization code for an access token
    pub async fn exchange_code(&self, code: &str) -> Result<String> {
        let response = self
            .http_client
            .post(TOKEN_URL)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", self.redirect_url.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Google token request failed: {}", e);
                AppError::ExternalServiceError(format!("Failed to exchange code: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Google token error: HTTP {} - {}", status, body);
            return Err(AppError::ExternalServiceError(format!(
                "Google token endpoint returned HTTP {}",
                status
            )));
        }

        let token = response.json::<TokenResponse>().await.map_err(|e| {
            AppError::ExternalServiceError(format!("Failed to parse token response: {}", e))
        })?;

        Ok(token.access_token)
    }

    pub async fn fetch_user_info(&self, access_token: &str) -> Result<GoogleUserInfo> {
        let response = self
            .http_client
            .get(USERINFO_URL)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| {
                AppError::ExternalServiceError(format!("Failed to fetch user info: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::ExternalServiceError(format!(
                "Google userinfo returned HTTP {}",
                status
            )));
        }

        response.json::<GoogleUserInfo>().await.map_err(|e| {
            AppError::ExternalServiceError(format!("Failed to parse user info: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GoogleOAuthClient {
        GoogleOAuthClient::from_config(&OAuthConfig {
            client_id: Some("client-123".to_string()),
            client_secret: Some("secret".to_string()),
            redirect_url: "http://localhost:3000/authorize".to_string(),
        })
        .unwrap()
        .unwrap()
    }

    #[test]
    fn test_disabled_without_credentials() {
        let config = OAuthConfig {
            client_id: None,
            client_secret: None,
            redirect_url: "http://localhost:3000/authorize".to_string(),
        };
        assert!(GoogleOAuthClient::from_config(&config).unwrap().is_none());
    }

    #[test]
    fn test_authorization_url_carries_state_and_scopes() {
        let url = client().authorization_url("abc123").unwrap();
        assert!(url.starts_with(AUTHORIZE_URL));
        assert!(url.contains("state=abc123"));
        assert!(url.contains("client_id=client-123"));
        assert!(url.contains("scope=openid+email+profile"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fauthorize"));
    }

    #[test]
    fn test_identity_from_user_info() {
        let info = GoogleUserInfo {
            sub: "1098".to_string(),
            name: None,
            email: Some("ana@uem.br".to_string()),
            picture: None,
        };
        let identity = info.into_identity().unwrap();
        assert_eq!(identity.google_id, "1098");
        assert_eq!(identity.name, "ana");

        let no_email = GoogleUserInfo {
            sub: "1".to_string(),
            name: Some("Ana".to_string()),
            email: None,
            picture: None,
        };
        assert!(no_email.into_identity().is_err());
    }
}
