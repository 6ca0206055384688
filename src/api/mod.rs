//! Relay endpoints.
//!
//! Each handler is an independent linear sequence (authenticate → fetch →
//! transform → respond) sharing only the injected `AppState`.

pub mod download;
pub mod generate;
pub mod projects;

use axum::{routing::post, Router};

use crate::http::AppState;

pub const PROJECTS_PATH: &str = "/api/tableau/projects";
pub const DOWNLOAD_PATH: &str = "/api/tableau/downloadWorkbooks";
pub const GENERATE_PATH: &str = "/api/tableau/aiGenerate";

pub fn setup_api_router(state: AppState) -> Router {
    Router::new()
        .route(PROJECTS_PATH, post(projects::list_projects))
        .route(DOWNLOAD_PATH, post(download::download_workbooks))
        .route(GENERATE_PATH, post(generate::generate))
        .with_state(state)
}
