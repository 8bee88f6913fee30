use crate::retrieval::error::TransportError;
use async_trait::async_trait;
use futures_util::TryStreamExt;
use log::{debug, warn};
use reqwest::Client;
use std::time::Duration;

/// The only network capability the retriever needs: GET a URL, get its body.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<Vec<u8>, TransportError>;
}

/// [`Transport`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Option<Duration>) -> Result<Self, TransportError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(TransportError::ClientBuild)?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| TransportError::Request {
                url: url.to_string(),
                source,
            })?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("HTTP error for {}: {:?}", url, e);
                return Err(match e.status() {
                    Some(status) => TransportError::HttpStatus {
                        url: url.to_string(),
                        status,
                    },
                    None => TransportError::Request {
                        url: url.to_string(),
                        source: e,
                    },
                });
            }
        };

        let mut stream = response.bytes_stream();
        let mut body = Vec::new();
        while let Some(chunk) = stream.try_next().await.map_err(|source| TransportError::Body {
            url: url.to_string(),
            source,
        })? {
            body.extend_from_slice(&chunk);
        }
        debug!("Received {} bytes from {}", body.len(), url);
        Ok(body)
    }
}
