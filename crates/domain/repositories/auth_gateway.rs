use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use serde_json::Value;

use crate::domain::value_objects::validation::ValidSignUp;

/// Hosted authentication service. Responses are passed through to the caller untouched.
#[async_trait]
#[automock]
pub trait AuthGateway {
    async fn sign_up(&self, sign_up: ValidSignUp) -> Result<Value>;

    async fn sign_in_with_password(&self, email: String, password: String) -> Result<Value>;

    async fn sign_out(&self, access_token: String) -> Result<()>;

    async fn update_user(
        &self,
        access_token: String,
        email: Option<String>,
        password: Option<String>,
    ) -> Result<Value>;
}
