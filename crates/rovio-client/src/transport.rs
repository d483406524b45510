//! HTTP transport
//!
//! The only component that performs I/O. One request in, one body out: no
//! retries and no caching. Anything network-related is reported as
//! [`RovioError::Connect`].

use rovio_core::{Result, RovioError};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, trace};

use crate::request::RequestDescriptor;

/// Executes a single request and returns the raw response body
pub trait Transport: Send + Sync {
    fn execute(&self, request: &RequestDescriptor) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// reqwest-backed transport
///
/// The timeout covers the whole exchange; when it fires the connection is
/// dropped and the call fails with a connect error.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RovioError::Connect {
                host: String::new(),
                reason: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    async fn execute(&self, request: &RequestDescriptor) -> Result<Vec<u8>> {
        let connect_error = |reason: String| RovioError::Connect {
            host: request.host(),
            reason,
        };

        trace!(url = %request.url, "Sending request");

        let response = self
            .client
            .get(request.url.clone())
            .headers(request.headers.clone())
            .send()
            .await
            .map_err(|e| connect_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(connect_error(format!("HTTP status {}", status)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| connect_error(format!("failed to read response body: {}", e)))?;

        debug!(url = %request.url, status = %status, body_len = body.len(), "Received response");

        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClientConfig, ConnectionSettings};
    use crate::request::{build, CommandArgs};
    use rovio_core::Command;

    #[tokio::test]
    async fn test_refused_connection_is_connect_error() {
        // Port 9 (discard) on localhost is closed on test machines
        let config = ClientConfig::new(ConnectionSettings::new("127.0.0.1").with_port(9)).unwrap();
        let request = build(&config, Command::GetStatus.spec(), &CommandArgs::new()).unwrap();

        let transport = HttpTransport::new(Duration::from_secs(2)).unwrap();
        let err = transport.execute(&request).await.unwrap_err();

        match err {
            RovioError::Connect { host, .. } => assert_eq!(host, "127.0.0.1"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
