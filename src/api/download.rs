//! `POST /api/tableau/downloadWorkbooks`: bundle selected workbooks into a
//! zip archive.

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderValue, StatusCode},
    response::Response,
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::archive::{self, FetchLimits};
use crate::http::{ApiError, AppState};
use crate::tableau::Credentials;

const DOWNLOAD_FAILED: &str = "Failed to download workbooks.";

pub const X_WORKBOOKS_INCLUDED: &str = "x-workbooks-included";
pub const X_WORKBOOKS_FAILED: &str = "x-workbooks-failed";

#[derive(Debug, Deserialize)]
pub struct DownloadRequest {
    #[serde(flatten)]
    pub credentials: Credentials,
    /// Kept untyped so a wrong shape maps to the selection error, not a
    /// generic body rejection.
    #[serde(default)]
    pub projects: Option<Value>,
}

pub async fn download_workbooks(
    State(state): State<AppState>,
    payload: Result<Json<DownloadRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;

    let selection = archive::parse_selection(request.projects.as_ref())?;
    let items = archive::flatten(&selection)?;
    let requested = items.len();

    let session = state
        .tableau
        .sign_in(&request.credentials)
        .await
        .map_err(|e| ApiError::from_tableau(e, DOWNLOAD_FAILED))?;

    let limits = FetchLimits::from(&state.downloads);
    let outcome = archive::fetch_all(items, limits, |item| {
        let tableau = state.tableau.clone();
        let session = session.clone();
        let url = item.url.clone();
        async move { tableau.download_workbook(&session, &url).await }
    })
    .await;

    let failed = outcome.failed.len();
    let extension = state.downloads.default_extension.clone();
    let (bytes, entries) = tokio::task::spawn_blocking(move || {
        archive::build_archive(&outcome, &extension)
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Archive task panicked");
        ApiError::Internal(DOWNLOAD_FAILED)
    })?
    .map_err(|e| ApiError::from_archive(e, DOWNLOAD_FAILED))?;

    tracing::info!(
        instance = %session.instance,
        requested,
        included = entries.len(),
        failed,
        bytes = bytes.len(),
        "Workbook archive built"
    );

    let disposition = format!("attachment; filename={}", state.downloads.archive_name);
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/zip")
        .header(
            header::CONTENT_DISPOSITION,
            HeaderValue::from_str(&disposition)
                .unwrap_or_else(|_| HeaderValue::from_static("attachment; filename=workbooks.zip")),
        )
        .header(X_WORKBOOKS_INCLUDED, entries.len())
        .header(X_WORKBOOKS_FAILED, failed)
        .body(Body::from(bytes))
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to build archive response");
            ApiError::Internal(DOWNLOAD_FAILED)
        })
}
