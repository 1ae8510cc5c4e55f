use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Method, RequestBuilder, Response};

use crate::error::LinkError;

/// An HTTP exchange that reached the service and produced a response.
///
/// The status is not interpreted here; deciding what counts as success is
/// left to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse<B> {
    /// HTTP status code.
    pub status: u16,
    /// Response payload.
    pub body: B,
}

/// Binary payload together with its declared content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryBody {
    /// Raw response bytes.
    pub bytes: Vec<u8>,
    /// Value of the `Content-Type` header, if present.
    pub content_type: Option<String>,
}

/// The exchange itself could not complete: no status code is available.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl From<TransportError> for LinkError {
    fn from(value: TransportError) -> Self {
        Self::Transport { error: value.0 }
    }
}

/// Performs single HTTP exchanges on behalf of the link service.
///
/// Each call performs exactly one exchange with no retries. Implementations
/// must report connectivity, DNS, protocol or body decoding failures as a
/// [`TransportError`] and return every other outcome, whatever its status, as
/// an [`HttpResponse`].
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issues a `GET` and returns the body as text.
    ///
    /// # Errors
    /// Returns a [`TransportError`] if the exchange could not complete.
    async fn get(&self, url: &str) -> Result<HttpResponse<String>, TransportError>;

    /// Issues a form-encoded `POST` and returns the body as text.
    ///
    /// # Errors
    /// Returns a [`TransportError`] if the exchange could not complete.
    async fn post(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> Result<HttpResponse<String>, TransportError>;

    /// Issues a `GET` and returns the raw body, e.g. for images.
    ///
    /// # Errors
    /// Returns a [`TransportError`] if the exchange could not complete.
    async fn get_binary(&self, url: &str)
        -> Result<HttpResponse<BinaryBody>, TransportError>;
}

/// A simple wrapper on an HTTP client for making requests. Sets the user-agent
/// and an optional timeout. No retry middleware is applied.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Option<Duration>,
}

impl HttpTransport {
    /// Initializes a new `HttpTransport`. `timeout` bounds each exchange; `None`
    /// leaves it to the underlying client.
    #[must_use]
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
        }
    }

    /// Creates a request builder with defaults applied.
    fn req(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self.client.request(method, url).header(
            "User-Agent",
            format!("linkkit-core/{}", env!("CARGO_PKG_VERSION")),
        );

        match self.timeout {
            Some(timeout) => builder.timeout(timeout),
            None => builder,
        }
    }
}

async fn send(request_builder: RequestBuilder) -> Result<Response, TransportError> {
    request_builder.send().await.map_err(|err| {
        // query strings carry the access token
        let path = err
            .url()
            .map_or_else(|| "<unknown>".to_string(), |url| url.path().to_string());
        let err = err.without_url();
        log::warn!("request to {path} failed: {err}");
        TransportError(format!("request failed: {err}"))
    })
}

async fn text_response(
    request_builder: RequestBuilder,
) -> Result<HttpResponse<String>, TransportError> {
    let response = send(request_builder).await?;
    let status = response.status().as_u16();
    let body = response.text().await.map_err(|err| {
        TransportError(format!(
            "failed to read response body with status {status}: {}",
            err.without_url()
        ))
    })?;
    Ok(HttpResponse { status, body })
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse<String>, TransportError> {
        text_response(self.req(Method::GET, url)).await
    }

    async fn post(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> Result<HttpResponse<String>, TransportError> {
        text_response(self.req(Method::POST, url).form(form)).await
    }

    async fn get_binary(
        &self,
        url: &str,
    ) -> Result<HttpResponse<BinaryBody>, TransportError> {
        let response = send(self.req(Method::GET, url)).await?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(ToString::to_string);
        let bytes = response.bytes().await.map_err(|err| {
            TransportError(format!(
                "failed to read binary body with status {status}: {}",
                err.without_url()
            ))
        })?;

        Ok(HttpResponse {
            status,
            body: BinaryBody {
                bytes: bytes.to_vec(),
                content_type,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_non_success_status_is_returned_uninterpreted() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/teapot")
            .with_status(418)
            .with_body(r#"{"message":"short and stout"}"#)
            .create_async()
            .await;

        let transport = HttpTransport::default();
        let response = transport
            .get(&format!("{}/teapot", server.url()))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.status, 418);
        assert_eq!(response.body, r#"{"message":"short and stout"}"#);
    }

    #[tokio::test]
    async fn test_sends_user_agent_and_form() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/form")
            .match_header(
                "user-agent",
                format!("linkkit-core/{}", env!("CARGO_PKG_VERSION")).as_str(),
            )
            .match_body(mockito::Matcher::UrlEncoded(
                "access_token".to_string(),
                "tok en".to_string(),
            ))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let transport = HttpTransport::new(Some(Duration::from_secs(5)));
        let response = transport
            .post(&format!("{}/form", server.url()), &[("access_token", "tok en")])
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.status, 200);
    }

    #[tokio::test]
    async fn test_binary_body_keeps_content_type() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/image")
            .with_status(200)
            .with_header("content-type", "image/png")
            .with_body([0x89_u8, b'P', b'N', b'G'])
            .create_async()
            .await;

        let response = HttpTransport::default()
            .get_binary(&format!("{}/image", server.url()))
            .await
            .unwrap();

        assert_eq!(response.body.bytes, vec![0x89, b'P', b'N', b'G']);
        assert_eq!(response.body.content_type.as_deref(), Some("image/png"));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_a_transport_error() {
        // nothing listens on the tcpmux port
        let err = HttpTransport::default()
            .get("http://127.0.0.1:1/gone?access_token=secret")
            .await
            .unwrap_err();
        assert!(err.0.starts_with("request failed"));
        assert!(!err.0.contains("secret"));
    }
}
