//! Retrieval of remote background images.

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::{DocumentConfig, FetchError};

/// Something that can turn a background URL into encoded image bytes.
#[async_trait]
pub trait ImageSource: Send + Sync + 'static {
    /// Retrieve the bytes behind `url`.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] if the bytes cannot be retrieved.
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError>;
}

/// Retrieves `http(s)`, `file` and `data` URLs.
#[derive(Debug, Clone)]
pub struct HttpImageSource {
    http: Client,
}

impl HttpImageSource {
    /// Build a source from document settings.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the HTTP client fails to build.
    pub fn new(config: &DocumentConfig) -> Result<Self, FetchError> {
        let mut builder = Client::builder()
            .user_agent(config.user_agent.clone())
            // Disable proxy detection to avoid macOS system-configuration panic
            .no_proxy();
        if let Some(timeout) = config.fetch_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
        })
    }

    async fn fetch_http(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        tracing::debug!("GET {url}");
        let response = self.http.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.clone(),
                status: status.as_u16(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl ImageSource for HttpImageSource {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        match url.scheme() {
            "http" | "https" => self.fetch_http(url).await,
            "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|()| FetchError::UnsupportedScheme(format!("bad file URL {url}")))?;
                Ok(tokio::fs::read(path).await?)
            }
            "data" => crate::image::data_uri_bytes(url.as_str()),
            other => Err(FetchError::UnsupportedScheme(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn source() -> HttpImageSource {
        HttpImageSource::new(&DocumentConfig::default()).expect("client")
    }

    #[tokio::test]
    async fn test_unsupported_scheme() {
        let url = Url::parse("ftp://example.com/a.png").expect("url");
        let err = source().fetch(&url).await.unwrap_err();
        assert!(matches!(err, FetchError::UnsupportedScheme(s) if s == "ftp"));
    }

    #[tokio::test]
    async fn test_data_url() {
        let url = Url::parse("data:text/plain;base64,AQID").expect("url");
        assert_eq!(source().fetch(&url).await.expect("bytes"), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_file_url() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("bg.bin");
        std::fs::write(&file, [7u8, 8, 9]).expect("write");
        let url = Url::from_file_path(&file).expect("file url");
        assert_eq!(source().fetch(&url).await.expect("bytes"), vec![7, 8, 9]);

        let missing = Url::from_file_path(dir.path().join("missing.png")).expect("file url");
        assert!(matches!(
            source().fetch(&missing).await,
            Err(FetchError::Io(_))
        ));
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn test_http_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bg.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8, 2, 3, 4]))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/bg.png", server.uri())).expect("url");
        assert_eq!(source().fetch(&url).await.expect("bytes"), vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn test_http_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing.png"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/missing.png", server.uri())).expect("url");
        match source().fetch(&url).await.unwrap_err() {
            FetchError::Status { status, .. } => assert_eq!(status, 404),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
