//! REST client for the catalog service.
//!
//! Wraps the two catalog endpoints the wizard needs using [`reqwest`]:
//!
//! ```text
//! GET {base}/api/courses                                 -> {"courses": [{id, title}]}
//! GET {base}/api/courses/{id}/subjects/{department}      -> {"subjects": [{id, name}]}
//! ```

use async_trait::async_trait;
use serde::Deserialize;
use tc_core::program::{Program, Subject};
use tc_core::types::ProgramId;

use crate::config::CatalogConfig;

/// Errors from the catalog layer.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The catalog returned a non-2xx status code.
    #[error("Catalog API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The catalog is unreachable for a reason other than HTTP.
    #[error("Catalog unavailable: {0}")]
    Unavailable(String),

    /// The configured base URL cannot carry an endpoint path.
    #[error("Invalid catalog URL: {0}")]
    InvalidUrl(String),
}

/// Read access to programs and their subjects.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Every program the catalog offers.
    async fn list_courses(&self) -> Result<Vec<Program>, CatalogError>;

    /// Subjects offered by `program` for `department`.
    async fn list_subjects(
        &self,
        program: ProgramId,
        department: &str,
    ) -> Result<Vec<Subject>, CatalogError>;
}

#[derive(Debug, Deserialize)]
struct CoursesEnvelope {
    #[serde(default)]
    courses: Vec<Program>,
}

#[derive(Debug, Deserialize)]
struct SubjectsEnvelope {
    #[serde(default)]
    subjects: Vec<Subject>,
}

/// HTTP client for the catalog service.
pub struct CatalogClient {
    client: reqwest::Client,
    base_url: String,
}

impl CatalogClient {
    /// Build a client from configuration.
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self::with_client(client, config.base_url.clone()))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn courses_url(&self) -> Result<reqwest::Url, CatalogError> {
        self.endpoint(&["api", "courses"])
    }

    fn subjects_url(
        &self,
        program: ProgramId,
        department: &str,
    ) -> Result<reqwest::Url, CatalogError> {
        let program = program.to_string();
        self.endpoint(&["api", "courses", &program, "subjects", department])
    }

    /// Append `segments` to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<reqwest::Url, CatalogError> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| CatalogError::InvalidUrl(format!("{}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|()| CatalogError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GET `url` and decode the JSON body. Non-2xx responses become
    /// [`CatalogError::Api`] carrying the body text.
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: reqwest::Url,
    ) -> Result<T, CatalogError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(url = %url, status = status.as_u16(), "Catalog request rejected");
            return Err(CatalogError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl CatalogApi for CatalogClient {
    async fn list_courses(&self) -> Result<Vec<Program>, CatalogError> {
        let envelope: CoursesEnvelope = self.get_json(self.courses_url()?).await?;
        tracing::debug!(count = envelope.courses.len(), "Fetched catalog courses");
        Ok(envelope.courses)
    }

    async fn list_subjects(
        &self,
        program: ProgramId,
        department: &str,
    ) -> Result<Vec<Subject>, CatalogError> {
        let envelope: SubjectsEnvelope =
            self.get_json(self.subjects_url(program, department)?).await?;
        tracing::debug!(
            program_id = program,
            department,
            count = envelope.subjects.len(),
            "Fetched catalog subjects"
        );
        Ok(envelope.subjects)
    }
}
