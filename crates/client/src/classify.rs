//! HTTP client for the classification service.
//!
//! Sends `POST {classify_url}/classify` with the description and the
//! selected coordinates. Any failure (unreachable service, non-2xx status,
//! unreadable body) is logged and answered with
//! [`Classification::fallback`]; classification never blocks a submission.

use async_trait::async_trait;
use campus_core::classification::{
    Classification, ClassificationDocument, Classifier, ClassifyRequest,
};

/// Errors from a single classification attempt. Only surfaced through
/// [`ClassificationClient::try_classify`].
#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Classification service error ({status}): {body}")]
    Service { status: u16, body: String },
}

pub struct ClassificationClient {
    client: reqwest::Client,
    classify_url: String,
}

impl ClassificationClient {
    /// * `classify_url` - service base URL, e.g. `http://localhost:5000/api`.
    pub fn new(classify_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), classify_url)
    }

    pub fn with_client(client: reqwest::Client, classify_url: impl Into<String>) -> Self {
        Self {
            client,
            classify_url: classify_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// One attempt, with errors reported to the caller.
    pub async fn try_classify(
        &self,
        request: &ClassifyRequest,
    ) -> Result<Classification, ClassifyError> {
        let response = self
            .client
            .post(format!("{}/classify", self.classify_url))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ClassifyError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let document: ClassificationDocument = response.json().await?;
        Ok(document.into_classification())
    }
}

#[async_trait]
impl Classifier for ClassificationClient {
    async fn classify(&self, request: &ClassifyRequest) -> Classification {
        match self.try_classify(request).await {
            Ok(classification) => classification,
            Err(e) => {
                tracing::warn!(error = %e, "AI classification failed, using fallback");
                Classification::fallback()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use campus_core::issue::{Category, Severity};

    use super::*;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/api")
    }

    fn request(description: &str) -> ClassifyRequest {
        ClassifyRequest {
            description: description.into(),
            location: None,
        }
    }

    #[tokio::test]
    async fn parses_service_answer() {
        let url = serve(Router::new().route(
            "/api/classify",
            post(|| async {
                Json(serde_json::json!({
                    "category": "plumbing",
                    "severity": "high",
                    "confidence": 0.8,
                    "suggestion": "Issue categorized as plumbing with high priority"
                }))
            }),
        ))
        .await;

        let result = ClassificationClient::new(url).classify(&request("leak")).await;
        assert_eq!(result.category, Category::Plumbing);
        assert_eq!(result.severity, Severity::High);
        assert_eq!(result.confidence, 0.8);
    }

    #[tokio::test]
    async fn server_error_falls_back() {
        let url = serve(Router::new().route(
            "/api/classify",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        ))
        .await;

        let client = ClassificationClient::new(url);
        assert_matches!(
            client.try_classify(&request("leak")).await,
            Err(ClassifyError::Service { status: 500, .. })
        );
        assert_eq!(client.classify(&request("leak")).await, Classification::fallback());
    }

    #[tokio::test]
    async fn unreachable_service_falls_back() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = ClassificationClient::new(format!("http://{addr}/api"));
        assert_eq!(client.classify(&request("leak")).await, Classification::fallback());
    }

    #[tokio::test]
    async fn unknown_values_degrade_to_defaults() {
        let url = serve(Router::new().route(
            "/api/classify",
            post(|| async {
                Json(serde_json::json!({ "category": "aliens", "severity": "critical" }))
            }),
        ))
        .await;

        let result = ClassificationClient::new(url).classify(&request("x")).await;
        assert_eq!(result.category, Category::Other);
        assert_eq!(result.severity, Severity::Medium);
        assert_eq!(result.confidence, 0.0);
    }
}
