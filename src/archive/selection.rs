//! Client-supplied workbook selection.
//!
//! The browser sends back the project tree it received from the listing
//! endpoint, trimmed to the workbooks the user picked. Only the name and
//! download URL of each workbook matter here.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("Invalid or empty projects array.")]
    InvalidProjects,

    #[error("No workbooks to download.")]
    NoWorkbooks,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSelection {
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub workbooks: Option<Vec<WorkbookSelection>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkbookSelection {
    #[serde(default)]
    pub workbook_id: Option<String>,
    #[serde(default, alias = "name")]
    pub workbook_name: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
}

/// One workbook to fetch and pack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadItem {
    /// Display name, before entry-name sanitizing.
    pub name: String,
    pub url: String,
}

/// Validate the shape of the `projects` field.
pub fn parse_selection(projects: Option<&Value>) -> Result<Vec<ProjectSelection>, SelectionError> {
    match projects {
        Some(value @ Value::Array(items)) if !items.is_empty() => {
            serde_json::from_value(value.clone()).map_err(|_| SelectionError::InvalidProjects)
        }
        _ => Err(SelectionError::InvalidProjects),
    }
}

/// Flatten the tree into download items, skipping workbooks without a URL.
pub fn flatten(projects: &[ProjectSelection]) -> Result<Vec<DownloadItem>, SelectionError> {
    let items: Vec<DownloadItem> = projects
        .iter()
        .flat_map(|project| project.workbooks.iter().flatten())
        .filter_map(|workbook| {
            let url = workbook.download_url.as_deref()?.trim();
            if url.is_empty() {
                return None;
            }
            let name = workbook
                .workbook_name
                .as_deref()
                .filter(|n| !n.trim().is_empty())
                .or(workbook.workbook_id.as_deref())
                .unwrap_or("workbook");
            Some(DownloadItem {
                name: name.to_string(),
                url: url.to_string(),
            })
        })
        .collect();

    if items.is_empty() {
        return Err(SelectionError::NoWorkbooks);
    }
    Ok(items)
}
