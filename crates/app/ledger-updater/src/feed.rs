use std::time::Duration;

use async_trait::async_trait;
use release_core::{Channel, ChannelSelector, DocumentError, ReleaseDocument, ReleaseRecord};
use reqwest::StatusCode;
use tracing::debug;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("invalid update server url: {0}")]
    Url(#[from] url::ParseError),
    #[error("request to update server failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("update server responded with {0}")]
    Status(StatusCode),
    #[error("malformed response from update server: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("unusable release document: {0}")]
    Document(#[from] DocumentError),
    #[error("update server did not answer within {0:?}")]
    Timeout(Duration),
}

/// Read side of the update service, as seen from the desktop app.
#[async_trait]
pub trait ReleaseFeed: Send + Sync {
    /// Latest release of `channel`, `None` if the channel has none yet.
    async fn latest(&self, channel: Channel) -> Result<Option<ReleaseRecord>, FeedError>;

    async fn releases(&self, selector: ChannelSelector) -> Result<Vec<ReleaseRecord>, FeedError>;
}

pub struct HttpReleaseFeed {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpReleaseFeed {
    pub fn new(server_url: &str, timeout: Duration) -> Result<Self, FeedError> {
        // Join relative paths below the configured prefix, not next to it.
        let base_url = Url::parse(&format!("{}/", server_url.trim_end_matches('/')))?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn get(&self, path: &str) -> Result<Option<Vec<u8>>, FeedError> {
        let url = self.base_url.join(path)?;
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.bytes().await?.to_vec())),
            status => Err(FeedError::Status(status)),
        }
    }
}

#[async_trait]
impl ReleaseFeed for HttpReleaseFeed {
    async fn latest(&self, channel: Channel) -> Result<Option<ReleaseRecord>, FeedError> {
        let Some(body) = self.get(&format!("updates/latest/{channel}")).await? else {
            return Ok(None);
        };
        let document: ReleaseDocument = serde_json::from_slice(&body)?;
        Ok(Some(document.into_record()?))
    }

    async fn releases(&self, selector: ChannelSelector) -> Result<Vec<ReleaseRecord>, FeedError> {
        let Some(body) = self.get(&format!("updates/releases/{selector}")).await? else {
            return Ok(Vec::new());
        };
        let documents: Vec<ReleaseDocument> = serde_json::from_slice(&body)?;
        documents
            .into_iter()
            .map(|document| document.into_record().map_err(FeedError::from))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_keeps_path_prefix() {
        for server in ["https://updates.example.com/api", "https://updates.example.com/api/"] {
            let feed = HttpReleaseFeed::new(server, Duration::from_secs(1)).unwrap();
            assert_eq!(
                feed.base_url().join("updates/latest/beta").unwrap().as_str(),
                "https://updates.example.com/api/updates/latest/beta"
            );
        }
    }

    #[test]
    fn rejects_invalid_server_url() {
        assert!(matches!(
            HttpReleaseFeed::new("not a url", Duration::from_secs(1)),
            Err(FeedError::Url(_))
        ));
    }
}
