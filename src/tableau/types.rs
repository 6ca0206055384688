//! Wire types and error definitions for the Tableau REST API.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while talking to a Tableau instance.
#[derive(Debug, Error)]
pub enum TableauError {
    /// Caller-supplied credentials cannot form a valid sign-in request.
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Sign-in was rejected or returned no session token.
    #[error("Authentication failed")]
    Unauthorized,

    /// Upstream answered with a non-success status.
    #[error("{call} returned HTTP {status}")]
    Status { call: &'static str, status: u16 },

    /// Connection, timeout, or body decoding failure.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Upstream payload did not have the expected shape.
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// The sign-in body could not be serialized.
    #[error("Failed to encode request: {0}")]
    Encode(String),

    /// A workbook body exceeded the configured size cap.
    #[error("Workbook exceeds {limit} bytes")]
    TooLarge { limit: u64 },

    /// A download URL points somewhere other than the signed-in instance.
    #[error("Refusing to send session token to foreign URL: {0}")]
    ForeignUrl(String),
}

/// Result type for Tableau operations.
pub type TableauResult<T> = Result<T, TableauError>;

/// Per-request sign-in material. Never stored.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    /// Host (optionally with port) of the Tableau instance, without scheme.
    pub instance: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("instance", &self.instance)
            .finish()
    }
}

impl Credentials {
    /// Check that the credentials can be sent upstream safely.
    pub fn validate(&self) -> TableauResult<()> {
        validate_instance(&self.instance)?;

        if self.username.trim().is_empty() {
            return Err(TableauError::InvalidCredentials("username is empty".into()));
        }
        if self.password.is_empty() {
            return Err(TableauError::InvalidCredentials("password is empty".into()));
        }
        // XML 1.0 cannot carry these even when escaped.
        if has_control_chars(&self.username) || has_control_chars(&self.password) {
            return Err(TableauError::InvalidCredentials(
                "credentials contain control characters".into(),
            ));
        }
        Ok(())
    }
}

fn has_control_chars(value: &str) -> bool {
    value.chars().any(|c| c.is_control() && !matches!(c, '\t' | '\n' | '\r'))
}

/// Ensure `instance` is a bare `host[:port]`.
pub fn validate_instance(instance: &str) -> TableauResult<()> {
    let invalid = |reason: &str| {
        Err(TableauError::InvalidCredentials(format!(
            "instance '{instance}' {reason}"
        )))
    };

    if instance.is_empty() {
        return invalid("is empty");
    }
    if instance.contains("://") {
        return invalid("must not include a scheme");
    }
    if instance
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '/' | '\\' | '@' | '?' | '#'))
    {
        return invalid("must be a host name with an optional port");
    }
    match url::Url::parse(&format!("http://{instance}")) {
        Ok(url) if url.host_str().is_some() => Ok(()),
        _ => invalid("is not a valid host"),
    }
}

/// Authenticated session returned by sign-in.
#[derive(Clone)]
pub struct Session {
    pub token: String,
    pub site_id: String,
    pub instance: String,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("site_id", &self.site_id)
            .field("instance", &self.instance)
            .finish()
    }
}

/// `<tsRequest>` sign-in body. Serialized with quick-xml so attribute
/// values are escaped.
#[derive(Debug, Serialize)]
#[serde(rename = "tsRequest")]
pub struct SignInRequest<'a> {
    credentials: CredentialsElement<'a>,
}

#[derive(Debug, Serialize)]
struct CredentialsElement<'a> {
    #[serde(rename = "@name")]
    name: &'a str,
    #[serde(rename = "@password")]
    password: &'a str,
    site: SiteElement<'a>,
}

#[derive(Debug, Serialize)]
struct SiteElement<'a> {
    #[serde(rename = "@contentUrl")]
    content_url: &'a str,
}

impl<'a> SignInRequest<'a> {
    /// Build a sign-in request for the default site.
    pub fn new(credentials: &'a Credentials) -> Self {
        Self {
            credentials: CredentialsElement {
                name: &credentials.username,
                password: &credentials.password,
                site: SiteElement { content_url: "" },
            },
        }
    }

    pub fn to_xml(&self) -> TableauResult<String> {
        quick_xml::se::to_string(self).map_err(|e| TableauError::Encode(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SignInResponse {
    pub credentials: Option<SignInCredentials>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SignInCredentials {
    pub token: Option<String>,
    pub site: Option<ResourceRef>,
}

/// Reference to another resource by identifier.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResourceRef {
    pub id: String,
}

/// A project as listed by the site.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A workbook as listed by the site.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workbook {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub webpage_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub project: Option<ResourceRef>,
}

impl Workbook {
    /// Identifier of the owning project, if upstream reported one.
    pub fn project_id(&self) -> Option<&str> {
        self.project.as_ref().map(|p| p.id.as_str())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProjectsResponse {
    #[serde(default)]
    pub projects: Option<ProjectCollection>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ProjectCollection {
    #[serde(default)]
    pub project: Vec<Project>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WorkbooksResponse {
    #[serde(default)]
    pub workbooks: Option<WorkbookCollection>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct WorkbookCollection {
    #[serde(default)]
    pub workbook: Vec<Workbook>,
}
