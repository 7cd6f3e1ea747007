//! HTTP transport for the catalog client

use std::time::Duration;

use super::CatalogError;

pub const USER_AGENT: &str = "FitMacroPlanner/1.0 (student project)";

/// Status and raw body of a GET request
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Issues GET requests. Implementations report transport failures as
/// errors and hand back any HTTP status as a response.
pub trait CatalogTransport: Send + Sync {
    fn get(&self, url: &str, query: &[(&str, String)], timeout: Duration) -> Result<HttpResponse, CatalogError>;
}

/// Blocking `reqwest` transport.
///
/// The blocking client must not be created or dropped on an async runtime
/// thread, so each request builds its own client on the calling thread.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport;

impl CatalogTransport for HttpTransport {
    fn get(&self, url: &str, query: &[(&str, String)], timeout: Duration) -> Result<HttpResponse, CatalogError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        let response = client.get(url).query(query).send()?;
        let status = response.status().as_u16();
        let body = response.text()?;

        Ok(HttpResponse { status, body })
    }
}
