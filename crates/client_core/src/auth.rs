use std::sync::Arc;

use shared::{
    domain::UserProfile,
    protocol::{SignInGrant, SignInRequest},
};
use tracing::{info, warn};

use crate::{
    error::ClientError,
    session::SessionEvent,
    transport::{ApiRequest, AuthenticatedClient},
};

pub const SIGN_IN_PATH: &str = "/api/auth/sign-in";
pub const SIGN_OUT_PATH: &str = "/api/auth/logout";

pub struct AuthService {
    client: Arc<AuthenticatedClient>,
}

impl AuthService {
    pub fn new(client: Arc<AuthenticatedClient>) -> Self {
        Self { client }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Option<UserProfile>, ClientError> {
        let body = serde_json::to_value(SignInRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        })
        .map_err(|err| {
            ClientError::Format(shared::error::FormatError::new(format!(
                "unserializable sign-in request: {err}"
            )))
        })?;

        let response = self
            .client
            .execute(ApiRequest::post(SIGN_IN_PATH).json(body).anonymous())
            .await?;
        let grant = SignInGrant::from_response(&response.body).map_err(|err| {
            warn!(reason = %err.reason, "sign-in succeeded without a usable token");
            ClientError::from(err)
        })?;

        self.client
            .session()
            .set_session(grant.token, grant.user.clone());
        info!(email, "signed in");
        self.client.emit(SessionEvent::SignedIn {
            user: grant.user.clone(),
        });
        Ok(grant.user)
    }

    /// Tells the backend, then always drops the local session.
    pub async fn sign_out(&self) {
        if self.client.session().is_authenticated() {
            if let Err(err) = self.client.execute(ApiRequest::post(SIGN_OUT_PATH)).await {
                warn!(error = %err, "backend logout failed; clearing local session anyway");
            }
        }
        if self.client.session().clear_session() {
            info!("signed out");
            self.client.emit(SessionEvent::SignedOut);
        }
    }

    /// Route guard: the current token, or an auth failure without touching the network.
    pub fn require_session(&self) -> Result<String, ClientError> {
        self.client
            .session()
            .get_token()
            .ok_or(ClientError::Auth { message: None })
    }
}
