//! `POST /api/tableau/projects`: sign in, list, and join projects with
//! their workbooks.

use std::collections::HashMap;

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Serialize;

use crate::http::{ApiError, AppState};
use crate::tableau::{Credentials, Project, Workbook};

const LIST_FAILED: &str = "Failed to fetch projects";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectWithWorkbooks {
    pub project_id: String,
    pub project_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub workbooks: Vec<WorkbookSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkbookSummary {
    pub workbook_id: String,
    pub workbook_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webpage_url: Option<String>,
    pub download_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Attach each workbook to the project it belongs to.
///
/// Output follows the upstream project order; projects without workbooks
/// get an empty list and workbooks without a known project are dropped.
pub fn group_workbooks<F>(
    projects: &[Project],
    workbooks: &[Workbook],
    download_url: F,
) -> Vec<ProjectWithWorkbooks>
where
    F: Fn(&Workbook) -> String,
{
    let mut by_project: HashMap<&str, Vec<WorkbookSummary>> = HashMap::new();
    for workbook in workbooks {
        let Some(project_id) = workbook.project_id() else {
            continue;
        };
        by_project
            .entry(project_id)
            .or_default()
            .push(WorkbookSummary {
                workbook_id: workbook.id.clone(),
                workbook_name: workbook.name.clone(),
                webpage_url: workbook.webpage_url.clone(),
                download_url: download_url(workbook),
                created_at: workbook.created_at.clone(),
                updated_at: workbook.updated_at.clone(),
            });
    }

    projects
        .iter()
        .map(|project| ProjectWithWorkbooks {
            project_id: project.id.clone(),
            project_name: project.name.clone(),
            description: project.description.clone(),
            workbooks: by_project.get(project.id.as_str()).cloned().unwrap_or_default(),
        })
        .collect()
}

pub async fn list_projects(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<Vec<ProjectWithWorkbooks>>, ApiError> {
    let Json(credentials) = payload?;

    let session = state
        .tableau
        .sign_in(&credentials)
        .await
        .map_err(|e| ApiError::from_tableau(e, LIST_FAILED))?;

    let projects = state
        .tableau
        .list_projects(&session)
        .await
        .map_err(|e| ApiError::from_tableau(e, LIST_FAILED))?;

    // A failed workbook listing still yields every project, each empty.
    let workbooks = match state.tableau.list_workbooks(&session).await {
        Ok(workbooks) => workbooks,
        Err(e) => {
            tracing::warn!(error = %e, "Error fetching workbooks");
            Vec::new()
        }
    };

    let tree = group_workbooks(&projects, &workbooks, |workbook| {
        state.tableau.download_url(&session, &workbook.id)
    });

    tracing::info!(
        instance = %session.instance,
        projects = tree.len(),
        workbooks = workbooks.len(),
        "Listed projects"
    );

    Ok(Json(tree))
}
