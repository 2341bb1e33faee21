//! Shared response envelope types for API handlers.
//!
//! JSON responses under `/api/v1` use a `{ "data": ... }` envelope. The
//! classification endpoint is the exception and answers with the bare
//! classification object.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
///
/// ```ignore
/// Ok(Json(DataResponse { data: issues }))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
