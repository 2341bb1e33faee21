//! Citizen report submission flow.
//!
//! Validates the form locally, asks the classifier for a suggestion, uploads
//! photos one at a time, then creates the issue document. Only a missing
//! location, an invalid form, or a failed create abort the submission;
//! classification and individual photo failures degrade gracefully.

use std::sync::Arc;

use chrono::Utc;

use crate::classification::{Classification, Classifier, ClassifyRequest, Coordinates};
use crate::error::CoreError;
use crate::issue::{validate_description, Issue};
use crate::mutation::{build_new_issue, PhotoUpload, ReportForm};
use crate::store::{photo_key, IssueStore, PhotoStore, StoreError};

/// Why a submission did not produce an issue.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// No point was selected on the map; nothing was sent anywhere.
    #[error("Please select a location on the map")]
    MissingLocation,

    #[error(transparent)]
    Invalid(#[from] CoreError),

    /// The create request failed. Not retried.
    #[error("Error submitting issue: {0}")]
    Store(#[from] StoreError),
}

/// Result of a successful submission.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub issue: Issue,
    /// The suggestion shown to the reporter.
    pub classification: Classification,
    /// Photos that could not be uploaded and were skipped.
    pub failed_uploads: usize,
}

/// Runs the submission flow against the configured collaborators.
#[derive(Clone)]
pub struct ReportSubmitter {
    classifier: Arc<dyn Classifier>,
    photos: Arc<dyn PhotoStore>,
    store: Arc<dyn IssueStore>,
}

impl ReportSubmitter {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        photos: Arc<dyn PhotoStore>,
        store: Arc<dyn IssueStore>,
    ) -> Self {
        Self {
            classifier,
            photos,
            store,
        }
    }

    pub async fn submit(&self, form: &ReportForm) -> Result<SubmitOutcome, SubmitError> {
        let location = form.location.clone().ok_or(SubmitError::MissingLocation)?;
        location.validate()?;
        validate_description(&form.description)?;

        let request = ClassifyRequest {
            description: form.description.clone(),
            location: Some(Coordinates {
                latitude: location.latitude,
                longitude: location.longitude,
            }),
        };
        let classification = self.classifier.classify(&request).await;
        tracing::debug!(
            category = %classification.category,
            severity = %classification.severity,
            confidence = classification.confidence,
            "Classification received",
        );

        let (photo_urls, failed_uploads) = self.upload_photos(&form.photos).await;

        let document = build_new_issue(form, location, &classification, photo_urls);
        let issue = self.store.create(document).await.map_err(|e| {
            tracing::error!(error = %e, "Error saving issue");
            e
        })?;

        tracing::info!(
            issue_id = %issue.id,
            photos = issue.photo_urls.len(),
            failed_uploads,
            "Issue submitted",
        );

        Ok(SubmitOutcome {
            issue,
            classification,
            failed_uploads,
        })
    }

    /// Upload photos strictly in sequence. Failures are logged and skipped,
    /// and successful uploads are never rolled back.
    ///
    /// Returns the URLs of the uploaded photos and the number of failures.
    pub async fn upload_photos(&self, photos: &[PhotoUpload]) -> (Vec<String>, usize) {
        let mut urls = Vec::with_capacity(photos.len());
        let mut failed = 0;

        for (index, photo) in photos.iter().enumerate() {
            let key = photo_key(Utc::now().timestamp_millis(), index, &photo.file_name);
            match self.photos.upload(&key, photo).await {
                Ok(url) => {
                    tracing::debug!(index, url = %url, "Photo uploaded");
                    urls.push(url);
                }
                Err(e) => {
                    tracing::error!(index, file_name = %photo.file_name, error = %e, "Error uploading photo");
                    failed += 1;
                }
            }
        }

        (urls, failed)
    }
}
