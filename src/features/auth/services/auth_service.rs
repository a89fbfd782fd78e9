use std::sync::Arc;

use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::core::session::Session;
use crate::features::auth::clients::GoogleOAuthClient;
use crate::features::users::models::User;
use crate::features::users::services::UserService;

const LOGIN_DISABLED: &str = "Login com Google não está configurado.";
const STATE_MISMATCH: &str = "Estado de autenticação inválido. Tente entrar novamente.";

/// Google login on top of the visitor session
pub struct AuthService {
    google: Option<GoogleOAuthClient>,
    users: Arc<UserService>,
}

impl AuthService {
    pub fn new(google: Option<GoogleOAuthClient>, users: Arc<UserService>) -> Self {
        Self { google, users }
    }

    fn google(&self) -> Result<&GoogleOAuthClient> {
        self.google
            .as_ref()
            .ok_or_else(|| AppError::ServiceUnavailable(LOGIN_DISABLED.to_string()))
    }

    /// Store a fresh `state` in the session and return the provider URL
    pub fn begin_login(&self, session: &mut Session) -> Result<String> {
        let google = self.google()?;
        let state = Uuid::new_v4().simple().to_string();
        let url = google.authorization_url(&state)?;
        session.oauth_state = Some(state);
        Ok(url)
    }

    /// Finish the callback: check `state`, fetch the identity, upsert the
    /// user and attach it to the session.
    pub async fn complete_login(
        &self,
        session: &mut Session,
        code: Option<&str>,
        state: Option<&str>,
    ) -> Result<User> {
        let google = self.google()?;

        let expected = session.oauth_state.take();
        match (expected.as_deref(), state) {
            (Some(expected), Some(received)) if expected == received => {}
            _ => {
                tracing::warn!("OAuth state mismatch for session {}", session.sid);
                return Err(AppError::BadRequest(STATE_MISMATCH.to_string()));
            }
        }

        let code = code
            .filter(|c| !c.is_empty())
            .ok_or_else(|| AppError::BadRequest("Código de autorização ausente.".to_string()))?;

        let access_token = google.exchange_code(code).await?;
        let identity = google
            .fetch_user_info(&access_token)
            .await?
            .into_identity()?;
        let user = self.users.upsert_from_identity(&identity).await?;

        session.log_in(user.id);
        Ok(user)
    }

    /// The session's user, if logged in and still present
    pub async fn current_user(&self, session: &Session) -> Result<Option<User>> {
        match session.user_id {
            Some(id) => self.users.find_by_id(id).await,
            None => Ok(None),
        }
    }
}
