mod commits;
mod pullrequests;

use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE, USER_AGENT};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::auth::SessionCookie;
use crate::config::AzdoConfig;
use crate::error::{Result, VsInsertionsError};

/// Azure DevOps Git REST client scoped to one repository.
///
/// Every request carries the session cookie (when present) as a default
/// header. Reads map transport failures and non-success statuses to
/// `RemoteUnavailable`; the single write (`patch_json`) maps non-success
/// statuses to `RemoteRejected` with the raw body attached.
pub struct AzdoClient {
    client: Client,
    repository_url: Url,
    config: AzdoConfig,
}

impl AzdoClient {
    pub fn new(config: &AzdoConfig, cookie: Option<&SessionCookie>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, user_agent());

        if let Some(cookie) = cookie {
            let mut value = HeaderValue::from_str(cookie.as_str())
                .map_err(|e| VsInsertionsError::Config(format!("Invalid session cookie: {e}")))?;
            value.set_sensitive(true);
            headers.insert(COOKIE, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| VsInsertionsError::Config(format!("Failed to create HTTP client: {e}")))?;

        let repository_url = organization_url(&config.organization_url)?
            .join(&format!("_apis/git/repositories/{}/", config.repository_id))
            .map_err(|e| VsInsertionsError::Config(format!("Invalid repository URL: {e}")))?;

        Ok(Self {
            client,
            repository_url,
            config: config.clone(),
        })
    }

    pub fn config(&self) -> &AzdoConfig {
        &self.config
    }

    /// Resolve a path relative to the repository API root.
    pub(super) fn endpoint(&self, path: &str) -> Result<Url> {
        self.repository_url
            .join(path)
            .map_err(|e| VsInsertionsError::Config(format!("Invalid endpoint {path}: {e}")))
    }

    /// GET `url` and deserialize the JSON body.
    pub(super) async fn get_json<T>(&self, url: Url) -> Result<T>
    where
        T: DeserializeOwned,
    {
        get_json_with(&self.client, url).await
    }

    /// PATCH `url` with a JSON body.
    pub(super) async fn patch_json(&self, url: Url, body: &impl Serialize) -> Result<()> {
        debug!("PATCH {url}");

        let response = self
            .client
            .patch(url.clone())
            .json(body)
            .send()
            .await
            .map_err(|e| unavailable(&url, &e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response body".to_string());
        debug!("PATCH {url} returned {status}: {text}");

        if !status.is_success() {
            return Err(VsInsertionsError::RemoteRejected {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(())
    }
}

/// GET `url` with `client` and deserialize the JSON body.
///
/// Transport failures and non-success statuses map to `RemoteUnavailable`,
/// undecodable bodies to `ParseFailure`.
pub(crate) async fn get_json_with<T>(client: &Client, url: Url) -> Result<T>
where
    T: DeserializeOwned,
{
    debug!("GET {url}");

    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| unavailable(&url, &e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(VsInsertionsError::RemoteUnavailable {
            url: url.to_string(),
            reason: format!("status {status}"),
        });
    }

    let body = response.text().await.map_err(|e| unavailable(&url, &e))?;
    debug!("Loaded {} bytes from {url}", body.len());

    Ok(serde_json::from_str(&body)?)
}

/// Client without session credentials, for hosts outside Azure DevOps.
pub(crate) fn anonymous_client() -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, user_agent());

    Client::builder()
        .default_headers(headers)
        .build()
        .map_err(|e| VsInsertionsError::Config(format!("Failed to create HTTP client: {e}")))
}

fn user_agent() -> HeaderValue {
    HeaderValue::from_static(concat!("vsinsertions/", env!("CARGO_PKG_VERSION")))
}

fn organization_url(raw: &str) -> Result<Url> {
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };

    Url::parse(&normalized)
        .map_err(|e| VsInsertionsError::Config(format!("Invalid organization URL: {e}")))
}

fn unavailable(url: &Url, err: &reqwest::Error) -> VsInsertionsError {
    VsInsertionsError::RemoteUnavailable {
        url: url.to_string(),
        reason: err.to_string(),
    }
}
