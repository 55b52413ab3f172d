//! Async HTTP client for the package repository, using `reqwest`.

use std::path::Path;
use std::sync::RwLock;

use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::header::ACCEPT;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::types::{AuthToken, DownloadLocation, Package, PackageList};

/// Errors from the source-service client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not authenticated")]
    NotAuthenticated,
}

/// Source-service API client.
///
/// `authenticate` must succeed before the catalog calls; the bearer token is
/// cached on the client for the rest of the run.
pub struct Client {
    http: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
    token: RwLock<Option<String>>,
}

impl Client {
    /// Creates a client for the service at `base_url`.
    pub fn new(base_url: &str, username: &str, password: &str) -> Result<Self, Error> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            username: username.to_string(),
            password: password.to_string(),
            token: RwLock::new(None),
        })
    }

    /// Overrides the base URL (for testing against stub servers).
    #[cfg(test)]
    pub(crate) fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    /// Exchanges the configured credentials for a bearer token and caches it
    /// for subsequent calls.
    pub async fn authenticate(&self) -> Result<AuthToken, Error> {
        let url = format!("{}/api/v1/auth/token", self.base_url);
        let resp = self
            .http
            .post(&url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        let auth: AuthToken = resp.json().await?;
        *self.token.write().unwrap() = Some(auth.token.clone());
        info!(expires = %auth.expires, "authenticated against source service");
        Ok(auth)
    }

    fn bearer(&self) -> Result<String, Error> {
        self.token
            .read()
            .unwrap()
            .clone()
            .ok_or(Error::NotAuthenticated)
    }

    /// Lists the package catalog, in service order.
    pub async fn list_packages(&self) -> Result<Vec<Package>, Error> {
        let token = self.bearer()?;
        let url = format!("{}/JSSResource/packages", self.base_url);
        let resp = self
            .http
            .get(&url)
            .bearer_auth(&token)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        let list: PackageList = resp.json().await?;
        debug!(count = list.packages.len(), "fetched package catalog");
        Ok(list.packages)
    }

    /// Resolves the time-limited download location for a package name.
    pub async fn resolve_download(&self, package_name: &str) -> Result<String, Error> {
        let token = self.bearer()?;
        let encoded = utf8_percent_encode(package_name, NON_ALPHANUMERIC).to_string();
        let url = format!("{}/api/v1/jcds/files/{encoded}", self.base_url);
        let resp = self
            .http
            .get(&url)
            .bearer_auth(&token)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        let location: DownloadLocation = resp.json().await?;
        Ok(location.uri)
    }

    /// Streams `url` into `dest`, returning the number of bytes written.
    ///
    /// The URL is pre-signed; no authentication header is sent.
    pub async fn download(&self, url: &str, dest: &Path) -> Result<u64, Error> {
        let mut resp = self.http.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut written = 0u64;
        while let Some(chunk) = resp.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        debug!(url, bytes = written, dest = %dest.display(), "download complete");
        Ok(written)
    }
}
