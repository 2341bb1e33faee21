//! Handlers for the `/issues` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use campus_core::filter::{IssueFilter, IssueFilterParams};
use campus_core::issue::{Issue, NewIssue, Status};
use campus_core::mutation::StatusUpdate;
use campus_core::stats::ACTIVITY_FEED_LIMIT;
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Largest `limit` honoured by the list endpoints.
const MAX_LIST_LIMIT: usize = 500;

/// Query parameters for `GET /issues`.
#[derive(Debug, Default, Deserialize)]
pub struct ListIssuesQuery {
    pub status: Option<String>,
    pub category: Option<String>,
    pub q: Option<String>,
    pub limit: Option<usize>,
}

impl ListIssuesQuery {
    fn filter_params(&self) -> IssueFilterParams {
        IssueFilterParams {
            status: self.status.clone(),
            category: self.category.clone(),
            q: self.q.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<usize>,
}

/// GET /api/v1/issues
///
/// Newest first. The filter applies before the limit.
pub async fn list_issues(
    State(state): State<AppState>,
    Query(params): Query<ListIssuesQuery>,
) -> AppResult<Json<DataResponse<Vec<Issue>>>> {
    let filter = IssueFilter::from_params(&params.filter_params())?;
    let issues = state.issues.list(None).await?;

    let limit = params.limit.unwrap_or(MAX_LIST_LIMIT).min(MAX_LIST_LIMIT);
    let data: Vec<Issue> = filter
        .apply(&issues)
        .into_iter()
        .take(limit)
        .cloned()
        .collect();

    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/issues/recent
pub async fn recent_issues(
    State(state): State<AppState>,
    Query(params): Query<RecentQuery>,
) -> AppResult<Json<DataResponse<Vec<Issue>>>> {
    let limit = params
        .limit
        .unwrap_or(ACTIVITY_FEED_LIMIT)
        .min(MAX_LIST_LIMIT);
    let data = state.issues.list(Some(limit)).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/issues/{id}
pub async fn get_issue(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<Issue>>> {
    let issue = state.issues.get(&id).await?;
    Ok(Json(DataResponse { data: issue }))
}

/// POST /api/v1/issues
///
/// Public: this is where citizen reports land. New reports always start
/// out pending, whatever the body says.
pub async fn create_issue(
    State(state): State<AppState>,
    Json(mut input): Json<NewIssue>,
) -> AppResult<(StatusCode, Json<DataResponse<Issue>>)> {
    input.status = Status::Pending;
    input.validate()?;

    let issue = state.issues.create(input).await?;
    tracing::info!(
        issue_id = %issue.id,
        category = %issue.category,
        severity = %issue.severity,
        "Issue reported",
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: issue })))
}

/// PUT /api/v1/issues/{id}/status
///
/// Admin only. The store stamps the resolution fields from its own clock;
/// any stamps in the body are ignored.
pub async fn update_status(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<StatusUpdate>,
) -> AppResult<Json<DataResponse<Issue>>> {
    let issue = state.issues.update_status(&id, update).await?;
    tracing::info!(
        issue_id = %issue.id,
        status = %issue.status,
        admin = %admin.email,
        "Issue status updated",
    );
    Ok(Json(DataResponse { data: issue }))
}
