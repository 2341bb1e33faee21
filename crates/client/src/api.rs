//! REST client for the issue API.
//!
//! Implements [`IssueStore`] and [`PhotoStore`] over HTTP so the submission
//! flow and the dashboard can run against a remote server. Successful
//! responses use the `{ "data": ... }` envelope; errors carry
//! `{ "error", "code" }`.

use async_trait::async_trait;
use campus_core::issue::{Issue, NewIssue};
use campus_core::mutation::{PhotoUpload, StatusUpdate};
use campus_core::store::{IssueStore, PhotoStore, StoreError, StoredPhoto};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Errors from the issue API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiClientError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server returned a non-2xx status code.
    #[error("API error ({status}): {body}")]
    ApiError { status: u16, body: String },
}

impl From<ApiClientError> for StoreError {
    fn from(err: ApiClientError) -> Self {
        match err {
            ApiClientError::ApiError { status: 404, body } => StoreError::NotFound {
                id: error_message(&body).unwrap_or(body),
            },
            ApiClientError::ApiError {
                status: 400 | 422,
                body,
            } => StoreError::Invalid(error_message(&body).unwrap_or(body)),
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

/// Pull the `error` field out of a JSON error body.
fn error_message(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: String,
    }
    serde_json::from_str::<ErrorBody>(body).ok().map(|b| b.error)
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    access_token: String,
}

pub struct IssueApi {
    client: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

impl IssueApi {
    /// * `api_url` - versioned base URL, e.g. `http://localhost:3000/api/v1`.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_url)
    }

    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Attach an admin bearer token to subsequent requests.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Exchange admin credentials for an access token and keep it.
    pub async fn admin_login(&mut self, email: &str, password: &str) -> Result<(), ApiClientError> {
        let response = self
            .client
            .post(format!("{}/auth/admin-login", self.api_url))
            .json(&LoginRequest { email, password })
            .send()
            .await?;
        let login: LoginResponse = Self::parse_response(response).await?;
        self.token = Some(login.access_token);
        tracing::info!(admin_email = %email, "Admin login succeeded");
        Ok(())
    }

    pub async fn list_issues(&self, limit: Option<usize>) -> Result<Vec<Issue>, ApiClientError> {
        let mut request = self.client.get(format!("{}/issues", self.api_url));
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit)]);
        }
        Self::parse_response(request.send().await?).await
    }

    pub async fn get_issue(&self, id: &str) -> Result<Issue, ApiClientError> {
        let response = self
            .client
            .get(format!("{}/issues/{id}", self.api_url))
            .send()
            .await?;
        Self::parse_response(response).await
    }

    pub async fn create_issue(&self, issue: &NewIssue) -> Result<Issue, ApiClientError> {
        let response = self
            .client
            .post(format!("{}/issues", self.api_url))
            .json(issue)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    pub async fn update_issue_status(
        &self,
        id: &str,
        update: &StatusUpdate,
    ) -> Result<Issue, ApiClientError> {
        let mut request = self
            .client
            .put(format!("{}/issues/{id}/status", self.api_url))
            .json(update);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        Self::parse_response(request.send().await?).await
    }

    pub async fn upload_photo(
        &self,
        key: &str,
        photo: &PhotoUpload,
    ) -> Result<StoredPhoto, ApiClientError> {
        let mut part = reqwest::multipart::Part::bytes(photo.bytes.clone())
            .file_name(photo.file_name.clone());
        if let Some(content_type) = &photo.content_type {
            part = part.mime_str(content_type)?;
        }
        let form = reqwest::multipart::Form::new()
            .text("key", key.to_string())
            .part("file", part);

        let response = self
            .client
            .post(format!("{}/uploads", self.api_url))
            .multipart(form)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    // ---- private helpers ----

    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ApiClientError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ApiClientError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Unwrap the `data` envelope of a successful response.
    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiClientError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<Envelope<T>>().await?.data)
    }
}

#[async_trait]
impl IssueStore for IssueApi {
    async fn list(&self, limit: Option<usize>) -> Result<Vec<Issue>, StoreError> {
        Ok(self.list_issues(limit).await?)
    }

    async fn get(&self, id: &str) -> Result<Issue, StoreError> {
        Ok(self.get_issue(id).await?)
    }

    async fn create(&self, issue: NewIssue) -> Result<Issue, StoreError> {
        Ok(self.create_issue(&issue).await?)
    }

    async fn update_status(&self, id: &str, update: StatusUpdate) -> Result<Issue, StoreError> {
        Ok(self.update_issue_status(id, &update).await?)
    }
}

#[async_trait]
impl PhotoStore for IssueApi {
    async fn upload(&self, key: &str, photo: &PhotoUpload) -> Result<String, StoreError> {
        Ok(self.upload_photo(key, photo).await?.url)
    }
}
