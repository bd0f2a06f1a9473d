use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::error;

use crate::domain::{
    repositories::auth_gateway::AuthGateway, value_objects::validation::ValidSignUp,
};

/// Supabase Auth (GoTrue) REST client.
pub struct SupabaseAuthClient {
    http: reqwest::Client,
    project_url: String,
    anon_key: String,
}

#[derive(Debug, Default, Deserialize)]
struct GoTrueError {
    msg: Option<String>,
    message: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

impl GoTrueError {
    fn into_message(self) -> Option<String> {
        self.msg
            .or(self.message)
            .or(self.error_description)
            .or(self.error)
    }
}

impl SupabaseAuthClient {
    pub fn new(project_url: String, anon_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            project_url: project_url.trim_end_matches('/').to_string(),
            anon_key,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.project_url, path)
    }

    async fn ensure_success(resp: reqwest::Response, context: &str) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let body = match resp.text().await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => "<empty response body>".to_string(),
            Err(err) => format!("<failed to read response body: {err}>"),
        };

        let message = serde_json::from_str::<GoTrueError>(&body)
            .ok()
            .and_then(GoTrueError::into_message);

        error!(
            status = %status,
            auth_error_message = ?message,
            context = %context,
            "supabase auth request failed"
        );

        match message {
            Some(message) => anyhow::bail!(message),
            None => anyhow::bail!("Auth request failed: {} (status {})", context, status),
        }
    }

    async fn json_body(resp: reqwest::Response) -> Result<Value> {
        let text = resp.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl AuthGateway for SupabaseAuthClient {
    async fn sign_up(&self, sign_up: ValidSignUp) -> Result<Value> {
        let body = json!({
            "email": sign_up.email,
            "password": sign_up.password,
            "data": {
                "username": sign_up.username,
                "display_name": sign_up.display_name,
            },
        });

        let resp = self
            .http
            .post(self.endpoint("signup"))
            .header("apikey", &self.anon_key)
            .json(&body)
            .send()
            .await
            .context("auth service unreachable")?;
        let resp = Self::ensure_success(resp, "sign up").await?;

        Self::json_body(resp).await
    }

    async fn sign_in_with_password(&self, email: String, password: String) -> Result<Value> {
        let resp = self
            .http
            .post(self.endpoint("token?grant_type=password"))
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .context("auth service unreachable")?;
        let resp = Self::ensure_success(resp, "sign in").await?;

        Self::json_body(resp).await
    }

    async fn sign_out(&self, access_token: String) -> Result<()> {
        let resp = self
            .http
            .post(self.endpoint("logout"))
            .header("apikey", &self.anon_key)
            .header(AUTHORIZATION, format!("Bearer {}", access_token))
            .send()
            .await
            .context("auth service unreachable")?;
        Self::ensure_success(resp, "sign out").await?;

        Ok(())
    }

    async fn update_user(
        &self,
        access_token: String,
        email: Option<String>,
        password: Option<String>,
    ) -> Result<Value> {
        let mut body = Map::new();
        if let Some(email) = email {
            body.insert("email".into(), Value::String(email));
        }
        if let Some(password) = password {
            body.insert("password".into(), Value::String(password));
        }

        let resp = self
            .http
            .put(self.endpoint("user"))
            .header("apikey", &self.anon_key)
            .header(AUTHORIZATION, format!("Bearer {}", access_token))
            .json(&Value::Object(body))
            .send()
            .await
            .context("auth service unreachable")?;
        let resp = Self::ensure_success(resp, "update user").await?;

        Self::json_body(resp).await
    }
}
