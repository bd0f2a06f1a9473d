use std::sync::Arc;

use crates::domain::{
    repositories::auth_gateway::AuthGateway,
    value_objects::validation::{
        AccountUpdateInput, LoginInput, SignUpInput, validate_account_update, validate_login,
        validate_sign_up,
    },
};
use serde_json::Value;
use tracing::{info, warn};

use super::{UseCaseError, UseCaseResult};

/// Thin proxy over the hosted auth service. Inputs are validated locally; the service's
/// own rejection message is surfaced as a bad request.
pub struct AccountUseCase<A>
where
    A: AuthGateway + Send + Sync + 'static,
{
    auth_gateway: Arc<A>,
}

fn rejected(operation: &'static str, err: anyhow::Error) -> UseCaseError {
    warn!(operation, error = %err, "accounts: auth service rejected the request");
    UseCaseError::BadRequest(err.to_string())
}

impl<A> AccountUseCase<A>
where
    A: AuthGateway + Send + Sync + 'static,
{
    pub fn new(auth_gateway: Arc<A>) -> Self {
        Self { auth_gateway }
    }

    pub async fn sign_up(&self, input: SignUpInput) -> UseCaseResult<Value> {
        let valid = validate_sign_up(&input)?;
        let username = valid.username.clone();

        let session = self
            .auth_gateway
            .sign_up(valid)
            .await
            .map_err(|err| rejected("sign_up", err))?;

        info!(%username, "accounts: signed up");
        Ok(session)
    }

    pub async fn login(&self, input: LoginInput) -> UseCaseResult<Value> {
        let valid = validate_login(&input)?;
        self.auth_gateway
            .sign_in_with_password(valid.email, valid.password)
            .await
            .map_err(|err| rejected("login", err))
    }

    pub async fn logout(&self, access_token: String) -> UseCaseResult<()> {
        self.auth_gateway
            .sign_out(access_token)
            .await
            .map_err(|err| rejected("logout", err))
    }

    pub async fn update_account(
        &self,
        access_token: String,
        input: AccountUpdateInput,
    ) -> UseCaseResult<Value> {
        let valid = validate_account_update(&input)?;
        self.auth_gateway
            .update_user(access_token, valid.email, valid.password)
            .await
            .map_err(|err| rejected("update_account", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crates::domain::repositories::auth_gateway::MockAuthGateway;
    use mockall::predicate::eq;
    use serde_json::json;

    #[tokio::test]
    async fn login_trims_the_email_before_calling_the_service() {
        let mut gateway = MockAuthGateway::new();
        gateway
            .expect_sign_in_with_password()
            .with(eq("neo@example.com".to_string()), eq("Secret123".to_string()))
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(json!({ "access_token": "t" })) }));

        let session = AccountUseCase::new(Arc::new(gateway))
            .login(LoginInput {
                email: "  neo@example.com ".to_string(),
                password: "Secret123".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(session["access_token"], "t");
    }

    #[tokio::test]
    async fn weak_passwords_never_reach_the_service() {
        let mut gateway = MockAuthGateway::new();
        gateway.expect_sign_up().never();

        let err = AccountUseCase::new(Arc::new(gateway))
            .sign_up(SignUpInput {
                email: "neo@example.com".to_string(),
                password: "short".to_string(),
                username: "neo".to_string(),
                display_name: "Neo".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, UseCaseError::BadRequest(_)));
    }

    #[tokio::test]
    async fn service_rejections_are_bad_requests() {
        let mut gateway = MockAuthGateway::new();
        gateway
            .expect_sign_in_with_password()
            .returning(|_, _| Box::pin(async { Err(anyhow::anyhow!("Invalid login credentials")) }));

        let err = AccountUseCase::new(Arc::new(gateway))
            .login(LoginInput {
                email: "neo@example.com".to_string(),
                password: "wrong-password1".to_string(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Invalid login credentials");
    }

    #[tokio::test]
    async fn empty_account_updates_are_rejected() {
        let mut gateway = MockAuthGateway::new();
        gateway.expect_update_user().never();

        let err = AccountUseCase::new(Arc::new(gateway))
            .update_account("token".to_string(), AccountUpdateInput::default())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Nothing to update");
    }
}
