//! HTTP client for the Keystone v3 identity API.
//!
//! This module provides the `KeystoneClient` struct, which authenticates
//! with the password method and lists projects using an issued token.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::auth::{AuthError, AuthProvider, PasswordAuth, SessionHandle};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Response header carrying a newly issued token.
const SUBJECT_TOKEN_HEADER: &str = "X-Subject-Token";

/// Request header presenting an existing token.
const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: TokenBody,
}

#[derive(Debug, Deserialize)]
struct TokenBody {
    user: IdRef,
    #[serde(default)]
    project: Option<IdRef>,
}

#[derive(Debug, Deserialize)]
struct IdRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ProjectsResponse {
    #[serde(default)]
    projects: Vec<IdRef>,
}

/// Keystone v3 client.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct KeystoneClient {
    client: Client,
    initial_backoff: Duration,
}

impl KeystoneClient {
    pub fn new() -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
        })
    }

    /// Override the first rate-limit backoff delay (doubles on each retry).
    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    fn endpoint(auth_url: &str, path: &str) -> String {
        format!("{}/{}", auth_url.trim_end_matches('/'), path)
    }

    fn password_body(request: &PasswordAuth) -> serde_json::Value {
        let mut auth = json!({
            "identity": {
                "methods": ["password"],
                "password": {
                    "user": {
                        "name": request.username,
                        "domain": { "name": request.user_domain_name },
                        "password": request.password,
                    }
                }
            }
        });
        if let Some(ref project_id) = request.project_id {
            auth["scope"] = json!({ "project": { "id": project_id } });
        }
        json!({ "auth": auth })
    }

    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(response: Response) -> Result<Option<Response>, ApiError> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status().as_u16() == 429 {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn send<F>(&self, build: F) -> Result<Response, ApiError>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut retries = 0;
        let mut backoff = self.initial_backoff;

        loop {
            let response = build().send().await?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => return Ok(response),
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited);
                    }
                    warn!(
                        retry = retries,
                        backoff_ms = backoff.as_millis() as u64,
                        "Rate limited, backing off"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
            }
        }
    }

    /// List the ids of projects visible to the session's user, in service order.
    pub async fn list_projects(&self, session: &SessionHandle) -> Result<Vec<String>, ApiError> {
        let url = Self::endpoint(
            session.auth_url(),
            &format!("users/{}/projects", session.user_id()),
        );

        let response = self
            .send(|| {
                self.client
                    .get(&url)
                    .header(header::ACCEPT, "application/json")
                    .header(AUTH_TOKEN_HEADER, session.token())
            })
            .await?;

        let parsed: ProjectsResponse = response
            .json()
            .await
            .map_err(|e| {
                ApiError::InvalidResponse(format!("Failed to parse project list: {}", e))
            })?;

        debug!(user_id = %session.user_id(), count = parsed.projects.len(), "Projects listed");
        Ok(parsed.projects.into_iter().map(|p| p.id).collect())
    }
}

#[async_trait]
impl AuthProvider for KeystoneClient {
    async fn authenticate(&self, request: &PasswordAuth) -> Result<SessionHandle, AuthError> {
        let url = Self::endpoint(&request.auth_url, "auth/tokens");
        let body = Self::password_body(request);

        let response = self
            .send(|| {
                self.client
                    .post(&url)
                    .header(header::ACCEPT, "application/json")
                    .json(&body)
            })
            .await?;

        let token = response
            .headers()
            .get(SUBJECT_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                ApiError::InvalidResponse(format!("missing {} header", SUBJECT_TOKEN_HEADER))
            })?;

        let parsed: TokenResponse = response
            .json()
            .await
            .map_err(|e| {
                ApiError::InvalidResponse(format!("Failed to parse token response: {}", e))
            })?;

        let project_id = parsed
            .token
            .project
            .map(|p| p.id)
            .or_else(|| request.project_id.clone());

        debug!(
            user_id = %parsed.token.user.id,
            scoped = project_id.is_some(),
            "Authenticated with identity service"
        );

        Ok(SessionHandle::new(
            token,
            parsed.token.user.id,
            project_id,
            request.auth_url.clone(),
        ))
    }

    async fn resolve_default_project(&self, session: &SessionHandle) -> Result<String, AuthError> {
        self.list_projects(session)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AuthError::NoProjectFound {
                user_id: session.user_id().to_string(),
            })
    }
}
