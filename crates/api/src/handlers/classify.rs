//! Keyword classification endpoint.
//!
//! Answers with the bare classification object (no `data` envelope) so the
//! report form can call it like the standalone classification service.

use axum::Json;
use campus_core::classification::{classify_by_keywords, Classification, ClassifyRequest};

use crate::error::{AppError, AppResult};

/// POST /api/classify
pub async fn classify(Json(input): Json<ClassifyRequest>) -> AppResult<Json<Classification>> {
    if input.description.trim().is_empty() {
        return Err(AppError::BadRequest("No description provided".into()));
    }

    let classification = classify_by_keywords(&input.description);
    tracing::info!(
        category = %classification.category,
        severity = %classification.severity,
        has_location = input.location.is_some(),
        "Description classified",
    );
    Ok(Json(classification))
}
