use crate::types::Result;
use reqwest::header::COOKIE;
use reqwest::redirect::Policy;
use std::future::Future;
use url::Url;

/// The parts of a page response the scenario asserts on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResponse {
    /// URL that was requested; redirects are never followed
    pub url: Url,
    pub status: u16,
    pub body: String,
}

/// Issues page GETs on behalf of one virtual user.
pub trait PageFetcher: Send + Sync {
    fn get(&self, url: &Url) -> impl Future<Output = Result<PageResponse>> + Send;
}

/// Fetches pages with reqwest, carrying the session cookie and never following redirects.
///
/// Each instance owns its own connection pool, so virtual users never share one.
pub struct HttpPageFetcher {
    client: reqwest::Client,
    cookie: String,
}

impl HttpPageFetcher {
    pub fn new(cookie: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(Policy::none())
            .build()?;

        Ok(Self {
            client,
            cookie: cookie.into(),
        })
    }
}

impl PageFetcher for HttpPageFetcher {
    async fn get(&self, url: &Url) -> Result<PageResponse> {
        let response = self
            .client
            .get(url.clone())
            .header(COOKIE, &self.cookie)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        tracing::debug!("GET {} -> {} ({} bytes)", url, status, body.len());

        Ok(PageResponse {
            url: url.clone(),
            status,
            body,
        })
    }
}
