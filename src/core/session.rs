//! Cookie-backed visitor sessions
//!
//! Every visitor carries a `sid` cookie holding an HS256-signed token. The
//! session id identifies anonymous visitors for vote/witness dedupe; the
//! optional user id is set after Google login.

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, HeaderValue},
    response::{IntoResponseParts, ResponseParts},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::config::SessionConfig;
use crate::core::error::AppError;

pub const SESSION_COOKIE_NAME: &str = "sid";

const SESSION_TTL_SECS: i64 = 365 * 24 * 60 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionClaims {
    sid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    oauth_state: Option<String>,
    iat: i64,
    exp: i64,
}

/// The current visitor's session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub sid: String,
    pub user_id: Option<i64>,
    pub oauth_state: Option<String>,
    is_new: bool,
}

impl Session {
    /// Fresh anonymous session with a newly minted id
    pub fn anonymous() -> Self {
        Self {
            sid: Uuid::new_v4().to_string(),
            user_id: None,
            oauth_state: None,
            is_new: true,
        }
    }

    /// Whether this session was minted for the current request
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn log_in(&mut self, user_id: i64) {
        self.user_id = Some(user_id);
        self.oauth_state = None;
    }

    /// Forget the user but keep the session id, so interaction dedupe survives logout
    pub fn log_out(&mut self) {
        self.user_id = None;
        self.oauth_state = None;
    }
}

/// Signs and verifies session cookies
pub struct SessionCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    cookie_secure: bool,
}

impl SessionCodec {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            cookie_secure: config.cookie_secure,
        }
    }

    pub fn encode(&self, session: &Session) -> Result<String, AppError> {
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            sid: session.sid.clone(),
            user_id: session.user_id,
            oauth_state: session.oauth_state.clone(),
            iat: now,
            exp: now + SESSION_TTL_SECS,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign session: {}", e)))
    }

    /// Returns `None` for tampered, expired or malformed tokens
    pub fn decode(&self, token: &str) -> Option<Session> {
        match decode::<SessionClaims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => Some(Session {
                sid: data.claims.sid,
                user_id: data.claims.user_id,
                oauth_state: data.claims.oauth_state,
                is_new: false,
            }),
            Err(e) => {
                tracing::debug!("Discarding invalid session cookie: {}", e);
                None
            }
        }
    }

    /// Read the session from the request cookies, or start a new one
    pub fn load(&self, headers: &HeaderMap) -> Session {
        CookieJar::from_headers(headers)
            .get(SESSION_COOKIE_NAME)
            .and_then(|cookie| self.decode(cookie.value()))
            .unwrap_or_else(Session::anonymous)
    }

    pub fn set_cookie_header(&self, session: &Session) -> Result<HeaderValue, AppError> {
        let token = self.encode(session)?;
        let cookie = Cookie::build((SESSION_COOKIE_NAME, token))
            .path("/")
            .max_age(cookie::time::Duration::seconds(SESSION_TTL_SECS))
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.cookie_secure)
            .build();

        HeaderValue::from_str(&cookie.to_string())
            .map_err(|e| AppError::Internal(format!("Invalid session cookie: {}", e)))
    }
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<Session>()
            .cloned()
            .unwrap_or_else(Session::anonymous))
    }
}

/// Returning a `Session` from a handler persists it as the `sid` cookie
impl IntoResponseParts for Session {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        res.extensions_mut().insert(self);
        Ok(res)
    }
}
