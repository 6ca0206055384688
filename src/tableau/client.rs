//! Tableau REST API client.
//!
//! # Responsibilities
//! - Sign in with caller-supplied credentials
//! - List projects and workbooks for the signed-in site
//! - Derive and fetch workbook content URLs
//!
//! The underlying `reqwest::Client` is injected so one connection pool is
//! shared across requests and tests can point the client at a mock server.

use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{redirect, StatusCode};
use serde::de::DeserializeOwned;

use crate::config::{DownloadConfig, TableauConfig};
use crate::observability::metrics;
use crate::tableau::types::{
    Credentials, Project, ProjectsResponse, Session, SignInRequest, SignInResponse, TableauError,
    TableauResult, Workbook, WorkbooksResponse,
};

/// Header carrying the session token on authenticated calls.
pub const AUTH_HEADER: &str = "X-Tableau-Auth";

const MAX_REDIRECTS: usize = 10;

/// Redirect policy for the shared client: only same-origin hops are
/// followed, so `X-Tableau-Auth` never reaches another host. A cross-origin
/// redirect is returned to the caller as-is.
pub fn redirect_policy() -> redirect::Policy {
    redirect::Policy::custom(|attempt| {
        if attempt.previous().len() > MAX_REDIRECTS {
            return attempt.error("too many redirects");
        }
        let same_origin = attempt
            .previous()
            .first()
            .is_some_and(|first| first.origin() == attempt.url().origin());
        if same_origin {
            attempt.follow()
        } else {
            attempt.stop()
        }
    })
}

#[derive(Clone)]
pub struct TableauClient {
    http: reqwest::Client,
    config: TableauConfig,
    download_timeout: Duration,
    max_download_bytes: u64,
}

impl TableauClient {
    pub fn new(http: reqwest::Client, config: TableauConfig, downloads: &DownloadConfig) -> Self {
        Self {
            http,
            config,
            download_timeout: Duration::from_secs(downloads.item_timeout_secs),
            max_download_bytes: downloads.max_item_bytes,
        }
    }

    fn api_base(&self, instance: &str) -> String {
        format!(
            "{}://{}/api/{}",
            self.config.scheme, instance, self.config.api_version
        )
    }

    /// Sign in to the default site of `credentials.instance`.
    pub async fn sign_in(&self, credentials: &Credentials) -> TableauResult<Session> {
        credentials.validate()?;
        let body = SignInRequest::new(credentials).to_xml()?;
        let url = format!("{}/auth/signin", self.api_base(&credentials.instance));

        let response = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/xml")
            .header(ACCEPT, "application/json")
            .body(body)
            .send()
            .await
            .inspect_err(|_| metrics::record_upstream_error("signin"))?;

        let status = response.status();
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            tracing::warn!(instance = %credentials.instance, status = %status, "Sign-in rejected");
            return Err(TableauError::Unauthorized);
        }
        if !status.is_success() {
            metrics::record_upstream_error("signin");
            return Err(TableauError::Status {
                call: "sign in",
                status: status.as_u16(),
            });
        }

        let parsed: SignInResponse = decode(response).await?;
        let credentials_el = parsed.credentials.ok_or(TableauError::Unauthorized)?;
        let token = match credentials_el.token {
            Some(token) if !token.is_empty() => token,
            _ => return Err(TableauError::Unauthorized),
        };
        let site_id = credentials_el
            .site
            .map(|site| site.id)
            .ok_or_else(|| TableauError::Malformed("sign-in response has no site".into()))?;

        tracing::debug!(instance = %credentials.instance, site_id = %site_id, "Signed in");

        Ok(Session {
            token,
            site_id,
            instance: credentials.instance.clone(),
        })
    }

    /// Fetch every project of the signed-in site in a single call.
    pub async fn list_projects(&self, session: &Session) -> TableauResult<Vec<Project>> {
        let parsed: ProjectsResponse = self.get_listing(session, "projects").await?;
        Ok(parsed.projects.unwrap_or_default().project)
    }

    /// Fetch every workbook of the signed-in site in a single call.
    pub async fn list_workbooks(&self, session: &Session) -> TableauResult<Vec<Workbook>> {
        let parsed: WorkbooksResponse = self.get_listing(session, "workbooks").await?;
        Ok(parsed.workbooks.unwrap_or_default().workbook)
    }

    async fn get_listing<T: DeserializeOwned>(
        &self,
        session: &Session,
        resource: &'static str,
    ) -> TableauResult<T> {
        let url = format!(
            "{}/sites/{}/{}",
            self.api_base(&session.instance),
            session.site_id,
            resource
        );

        let response = self
            .http
            .get(&url)
            .header(AUTH_HEADER, &session.token)
            .header(ACCEPT, "application/json")
            .query(&[("pageSize", self.config.page_size)])
            .send()
            .await
            .inspect_err(|_| metrics::record_upstream_error(resource))?;

        if !response.status().is_success() {
            metrics::record_upstream_error(resource);
            return Err(TableauError::Status {
                call: resource,
                status: response.status().as_u16(),
            });
        }

        decode(response).await
    }

    /// Content URL of a workbook on the signed-in site.
    pub fn download_url(&self, session: &Session, workbook_id: &str) -> String {
        format!(
            "{}/sites/{}/workbooks/{}/content",
            self.api_base(&session.instance),
            session.site_id,
            workbook_id
        )
    }

    /// True when `url` addresses the same scheme, host and port as the
    /// session's instance.
    pub fn is_instance_url(&self, session: &Session, url: &str) -> bool {
        let Ok(target) = url::Url::parse(url) else {
            return false;
        };
        let Ok(instance) = url::Url::parse(&format!("{}://{}", self.config.scheme, session.instance))
        else {
            return false;
        };

        target.scheme() == instance.scheme()
            && target.host_str() == instance.host_str()
            && target.port_or_known_default() == instance.port_or_known_default()
    }

    /// Download the packaged content of one workbook.
    pub async fn download_workbook(&self, session: &Session, url: &str) -> TableauResult<Vec<u8>> {
        if !self.is_instance_url(session, url) {
            return Err(TableauError::ForeignUrl(url.to_string()));
        }

        let mut response = self
            .http
            .get(url)
            .header(AUTH_HEADER, &session.token)
            .timeout(self.download_timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TableauError::Status {
                call: "download workbook",
                status: response.status().as_u16(),
            });
        }

        let limit = self.max_download_bytes;
        if response.content_length().is_some_and(|len| len > limit) {
            return Err(TableauError::TooLarge { limit });
        }

        // Content-Length may be absent or wrong; enforce the cap while reading.
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if (body.len() + chunk.len()) as u64 > limit {
                return Err(TableauError::TooLarge { limit });
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> TableauResult<T> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| TableauError::Malformed(e.to_string()))
}

impl std::fmt::Debug for TableauClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableauClient")
            .field("scheme", &self.config.scheme)
            .field("api_version", &self.config.api_version)
            .field("download_timeout", &self.download_timeout)
            .field("max_download_bytes", &self.max_download_bytes)
            .finish()
    }
}
