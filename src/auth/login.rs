use super::{
    credentials::{CredentialError, CredentialVerifier},
    token::TokenIssuer,
};
use crate::{
    error::{ApiError, INVALID_CREDENTIALS, LOGIN_FIELDS_REQUIRED},
    models::{LoginRequest, LoginResponse},
    notifier::{LoginNotice, NotificationDispatcher},
};

/// LoginService
///
/// Coordinates the login flow: verify credentials, mint a token, hand a notice to the
/// background dispatcher, answer. The two "bad credentials" causes leave this type as the
/// same `ApiError`, so clients cannot tell an unknown account from a wrong secret.
#[derive(Clone)]
pub struct LoginService {
    verifier: CredentialVerifier,
    issuer: TokenIssuer,
    notifications: NotificationDispatcher,
}

impl LoginService {
    pub fn new(verifier: CredentialVerifier, issuer: TokenIssuer, notifications: NotificationDispatcher) -> Self {
        Self {
            verifier,
            issuer,
            notifications,
        }
    }

    pub fn notifications(&self) -> &NotificationDispatcher {
        &self.notifications
    }

    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, ApiError> {
        let identifier = request.identifier.as_deref().map(str::trim).unwrap_or_default();
        let secret = request.secret.as_deref().unwrap_or_default();
        if identifier.is_empty() || secret.is_empty() {
            return Err(ApiError::BadRequest(LOGIN_FIELDS_REQUIRED));
        }

        let record = match self.verifier.verify(identifier, secret).await {
            Ok(record) => record,
            Err(CredentialError::NotFound) => {
                tracing::info!(%identifier, reason = "unknown_identifier", "login rejected");
                return Err(ApiError::Unauthorized(INVALID_CREDENTIALS));
            }
            Err(CredentialError::InvalidSecret) => {
                tracing::info!(%identifier, reason = "secret_mismatch", "login rejected");
                return Err(ApiError::Unauthorized(INVALID_CREDENTIALS));
            }
            Err(e) => {
                tracing::error!(%identifier, "login failed: {e}");
                return Err(ApiError::Internal);
            }
        };

        let issued = self.issuer.issue(&record).map_err(|e| {
            tracing::error!(user_id = %record.id, "token issuance failed: {e}");
            ApiError::Internal
        })?;

        self.notifications.dispatch(LoginNotice {
            identifier: record.institutional_email.clone(),
            display_name: record.name.clone(),
        });

        tracing::info!(user_id = %record.id, role = %record.role, "login succeeded");

        Ok(LoginResponse {
            success: true,
            token: issued.token,
            expires_at: issued.expires_at,
            profile: record.profile(),
        })
    }
}
