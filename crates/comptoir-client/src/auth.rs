use crate::api::ApiClient;
use crate::error::ApiError;
use crate::model::User;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub store_name: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub fullname: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Activation {
    pub uid: String,
    pub token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PasswordReset {
    pub store_code: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PasswordResetConfirm {
    pub uid: String,
    pub token: String,
    pub new_password: String,
    pub re_new_password: String,
}

/// Session and user-management operations.
///
/// Session tokens live in cookies the transport manages; a successful login
/// leaves the underlying client authenticated for every later call.
pub struct AuthClient {
    api: Arc<ApiClient>,
}

impl AuthClient {
    pub(crate) fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<User, ApiError> {
        let user: User = self.api.post_json("jwt/create/", credentials).await?;
        tracing::info!(
            target: "comptoir::auth",
            username = %user.username,
            store = %user.store.name,
            "session opened"
        );
        Ok(user)
    }

    pub async fn logout(&self) -> Result<(), ApiError> {
        self.api.post_unit("logout/", &json!({})).await
    }

    /// Checks that the current access credential is still accepted.
    pub async fn verify(&self) -> Result<(), ApiError> {
        self.api.post_unit("jwt/verify/", &json!({})).await
    }

    pub async fn me(&self) -> Result<User, ApiError> {
        self.api.get_json("users/me/").await
    }

    /// Creates a user account; the payload shape of the response is
    /// backend-defined.
    pub async fn register(&self, registration: &Registration) -> Result<Value, ApiError> {
        self.api.post_json("users/", registration).await
    }

    pub async fn activate(&self, activation: &Activation) -> Result<(), ApiError> {
        self.api.post_unit("users/activation/", activation).await
    }

    pub async fn reset_password(&self, reset: &PasswordReset) -> Result<(), ApiError> {
        self.api.post_unit("users/reset_password/", reset).await
    }

    pub async fn reset_password_confirm(
        &self,
        confirm: &PasswordResetConfirm,
    ) -> Result<(), ApiError> {
        self.api
            .post_unit("users/reset_password_confirm/", confirm)
            .await
    }

    /// Pins the active store for multi-store operators.
    pub async fn set_store_context(&self, store_id: i64) -> Result<(), ApiError> {
        self.api
            .post_unit("set-store-context/", &json!({ "store_id": store_id }))
            .await
    }
}
