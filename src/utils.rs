use crate::config::HttpConfig;
use crate::error::Result;
use reqwest::Client;
use std::error::Error as StdError;
use std::time::Duration;
use tracing::warn;

#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    verify_https: bool,
}

impl HttpClient {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        Self::build(config, config.verify_https)
    }

    fn build(config: &HttpConfig, verify_https: bool) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(config.user_agent.as_str())
            .danger_accept_invalid_certs(!verify_https)
            .build()?;

        Ok(Self {
            client,
            verify_https,
        })
    }

    /// Builds the client used for a whole work. The work URL is probed with
    /// a HEAD request; if that fails during the TLS handshake, certificate
    /// verification is switched off for the work and a warning is logged
    /// once. Any other failure is returned as is.
    pub async fn negotiate(url: &str, config: &HttpConfig) -> Result<Self> {
        let client = Self::new(config)?;
        if !client.verify_https || !url.starts_with("https://") {
            return Ok(client);
        }

        match client.client.head(url).send().await {
            Ok(_) => Ok(client),
            Err(e) if is_tls_failure(&e) => {
                warn!(
                    "Could not verify the certificate of {} ({}); \
                     continuing without certificate verification",
                    url, e
                );
                Self::build(config, false)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn verifies_https(&self) -> bool {
        self.verify_https
    }

    pub async fn get_text(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let text = response.text().await?;
        Ok(text)
    }

    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}

/// Whether the source chain of `error` comes from the TLS layer rather than
/// from name resolution or the TCP connection. The outer error is skipped,
/// its message carries the request URL.
fn is_tls_failure(error: &(dyn StdError + 'static)) -> bool {
    const MARKERS: [&str; 5] = ["certificate", "tls", "ssl", "handshake", "x509"];

    let mut current = error.source();
    while let Some(err) = current {
        let message = err.to_string().to_lowercase();
        if MARKERS.iter().any(|marker| message.contains(marker)) {
            return true;
        }
        current = err.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ComicScraperError;
    use std::fmt;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[derive(Debug)]
    struct Layer {
        message: &'static str,
        source: Option<Box<Layer>>,
    }

    impl Layer {
        fn chain(messages: &[&'static str]) -> Self {
            let (last, rest) = messages.split_last().unwrap();
            let mut layer = Layer {
                message: *last,
                source: None,
            };
            for message in rest.iter().rev() {
                layer = Layer {
                    message: *message,
                    source: Some(Box::new(layer)),
                };
            }
            layer
        }
    }

    impl fmt::Display for Layer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.message)
        }
    }

    impl StdError for Layer {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            self.source.as_deref().map(|s| s as &(dyn StdError + 'static))
        }
    }

    #[test]
    fn tls_failures_are_found_anywhere_in_the_chain() {
        let cert = Layer::chain(&[
            "error sending request",
            "client error (Connect)",
            "error:0A000086:SSL routines::certificate verify failed",
        ]);
        assert!(is_tls_failure(&cert));

        let rustls = Layer::chain(&[
            "error sending request",
            "invalid peer certificate: UnknownIssuer",
        ]);
        assert!(is_tls_failure(&rustls));
    }

    #[test]
    fn plain_connect_failures_are_not_tls_failures() {
        let refused = Layer::chain(&[
            "error sending request",
            "tcp connect error",
            "Connection refused (os error 111)",
        ]);
        assert!(!is_tls_failure(&refused));

        let dns = Layer::chain(&[
            "error sending request",
            "dns error",
            "failed to lookup address information",
        ]);
        assert!(!is_tls_failure(&dns));

        let url_only = Layer::chain(&[
            "error sending request for url (https://ssl-scans.example/tls)",
            "Connection refused (os error 111)",
        ]);
        assert!(!is_tls_failure(&url_only));
    }

    #[tokio::test]
    async fn refused_connection_is_returned_as_an_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let url = format!("https://127.0.0.1:{}/manga/x", port);
        let result = HttpClient::negotiate(&url, &HttpConfig::default()).await;

        let err = result.err().expect("a refused connection is an error");
        assert!(matches!(err, ComicScraperError::Http(_)));
    }

    #[tokio::test]
    async fn failed_handshake_relaxes_verification() {
        // Answers in plain HTTP, so the TLS handshake cannot complete.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let _ = socket
                    .write_all(b"HTTP/1.1 400 Bad Request\r\ncontent-length: 0\r\n\r\n")
                    .await;
            }
        });

        let url = format!("https://127.0.0.1:{}/manga/x", port);
        let client = HttpClient::negotiate(&url, &HttpConfig::default()).await.unwrap();
        assert!(!client.verifies_https());
    }

    #[tokio::test]
    async fn fetches_text_and_bytes() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/page")
            .with_status(200)
            .with_body("<html>hello</html>")
            .create_async()
            .await;
        server
            .mock("GET", "/img.jpg")
            .with_status(200)
            .with_body(vec![0xff, 0xd8, 0xff])
            .create_async()
            .await;

        let client = HttpClient::new(&HttpConfig::default()).unwrap();
        let text = client.get_text(&format!("{}/page", server.url())).await.unwrap();
        assert_eq!(text, "<html>hello</html>");
        let bytes = client.get_bytes(&format!("{}/img.jpg", server.url())).await.unwrap();
        assert_eq!(bytes, vec![0xff, 0xd8, 0xff]);
    }

    #[tokio::test]
    async fn error_status_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/missing")
            .with_status(404)
            .create_async()
            .await;

        let client = HttpClient::new(&HttpConfig::default()).unwrap();
        let result = client.get_text(&format!("{}/missing", server.url())).await;
        tokio_test::assert_err!(result);
    }

    #[tokio::test]
    async fn plain_http_keeps_verification() {
        let client = HttpClient::negotiate("http://127.0.0.1:9/manga/x", &HttpConfig::default())
            .await
            .unwrap();
        assert!(client.verifies_https());

        let relaxed = HttpConfig {
            verify_https: false,
            ..HttpConfig::default()
        };
        let client = HttpClient::new(&relaxed).unwrap();
        assert!(!client.verifies_https());
    }
}
