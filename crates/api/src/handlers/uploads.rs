//! Photo uploads.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use campus_core::mutation::PhotoUpload;
use campus_core::store::{photo_key, PhotoStore, StoredPhoto};
use chrono::Utc;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/uploads
///
/// Multipart body with a `file` part and an optional `key` text part. Without
/// a key, one is derived from the current time and the file name.
pub async fn upload_photo(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<StoredPhoto>>)> {
    let mut key: Option<String> = None;
    let mut photo: Option<PhotoUpload> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("key") => key = Some(field.text().await?),
            Some("file") => {
                let file_name = field.file_name().unwrap_or("photo").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?.to_vec();
                photo = Some(PhotoUpload {
                    file_name,
                    content_type,
                    bytes,
                });
            }
            other => {
                tracing::debug!(field = ?other, "Ignoring unexpected multipart field");
            }
        }
    }

    let photo = photo.ok_or_else(|| AppError::BadRequest("Missing file part".into()))?;
    let key = key
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .unwrap_or_else(|| photo_key(Utc::now().timestamp_millis(), 0, &photo.file_name));

    let url = state.photos.upload(&key, &photo).await?;
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: StoredPhoto { key, url },
        }),
    ))
}
