//! Read-only dashboard projections computed from the current issue set.

use axum::extract::{Path, Query, State};
use axum::Json;
use campus_core::error::CoreError;
use campus_core::filter::{IssueFilter, IssueFilterParams};
use campus_core::stats::DEFAULT_TIMELINE_DAYS;
use campus_core::view::{
    analytics_view, detail_view, map_view, overview_view, table_view, AnalyticsView,
    IssueDetail, MapView, OverviewView, TableView,
};
use chrono::{DateTime, FixedOffset, Local, Utc};
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Timeline windows offered by the analytics view.
pub const ANALYTICS_WINDOWS: [u32; 3] = [7, 30, 90];

#[derive(Debug, Default, Deserialize)]
pub struct AnalyticsQuery {
    pub days: Option<u32>,
}

/// Calendar used for day boundaries and dates.
///
/// `utc_offset_minutes` is the viewer's offset east of UTC (`120` for
/// UTC+2); without it the server's local zone applies.
#[derive(Debug, Default, Deserialize)]
pub struct LocalTimeQuery {
    pub utc_offset_minutes: Option<i32>,
}

impl LocalTimeQuery {
    pub fn now(&self) -> Result<DateTime<FixedOffset>, CoreError> {
        let offset = match self.utc_offset_minutes {
            Some(minutes) => minutes
                .checked_mul(60)
                .and_then(FixedOffset::east_opt)
                .ok_or_else(|| {
                    CoreError::Validation(format!(
                        "utc_offset_minutes out of range (got {minutes})"
                    ))
                })?,
            None => *Local::now().offset(),
        };
        Ok(Utc::now().with_timezone(&offset))
    }
}

/// GET /api/v1/dashboard/overview (admin)
pub async fn overview(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(local): Query<LocalTimeQuery>,
) -> AppResult<Json<DataResponse<OverviewView>>> {
    let now = local.now()?;
    let issues = state.issues.list(None).await?;
    Ok(Json(DataResponse {
        data: overview_view(&issues, &now),
    }))
}

/// GET /api/v1/dashboard/issues (admin)
///
/// Table rows for the filtered set, dates on the viewer's calendar.
pub async fn issue_table(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<IssueFilterParams>,
    Query(local): Query<LocalTimeQuery>,
) -> AppResult<Json<DataResponse<TableView>>> {
    let filter = IssueFilter::from_params(&params)?;
    let now = local.now()?;
    let issues = state.issues.list(None).await?;
    Ok(Json(DataResponse {
        data: table_view(&filter.apply(&issues), &now.timezone()),
    }))
}

/// GET /api/v1/dashboard/issues/{id} (admin)
pub async fn issue_detail(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(local): Query<LocalTimeQuery>,
) -> AppResult<Json<DataResponse<IssueDetail>>> {
    let now = local.now()?;
    let issue = state.issues.get(&id).await?;
    Ok(Json(DataResponse {
        data: detail_view(&issue, &now),
    }))
}

/// GET /api/v1/analytics?days=7|30|90
pub async fn analytics(
    State(state): State<AppState>,
    Query(params): Query<AnalyticsQuery>,
    Query(local): Query<LocalTimeQuery>,
) -> AppResult<Json<DataResponse<AnalyticsView>>> {
    let days = params.days.unwrap_or(DEFAULT_TIMELINE_DAYS);
    if !ANALYTICS_WINDOWS.contains(&days) {
        return Err(CoreError::Validation(format!(
            "days must be one of 7, 30 or 90 (got {days})"
        ))
        .into());
    }

    let now = local.now()?;

    let issues = state.issues.list(None).await?;
    Ok(Json(DataResponse {
        data: analytics_view(&issues, days, &now),
    }))
}

/// GET /api/v1/map
pub async fn map(State(state): State<AppState>) -> AppResult<Json<DataResponse<MapView>>> {
    let issues = state.issues.list(None).await?;
    Ok(Json(DataResponse {
        data: map_view(&issues),
    }))
}
