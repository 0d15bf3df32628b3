use std::{fmt, future::Future, time::Duration};

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};

use crate::{status, BoxError, Endpoint, RequestDescriptor, TransportOptions};

/// A fully buffered HTTP response.
///
/// The transport reads the body before returning, so the underlying
/// connection is already released by the time a session sees this value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    /// Adds a header; invalid names or values are skipped.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// First value of `name`, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn location(&self) -> Option<&str> {
        self.header(header::LOCATION.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header(header::CONTENT_TYPE.as_str())
    }

    pub fn status_line(&self) -> String {
        status::status_line(self.status)
    }
}

/// Unauthenticated point-to-point HTTP executor.
///
/// Implementations must not follow redirects themselves; the session owns
/// redirect handling.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        endpoint: &Endpoint,
        request: &RequestDescriptor,
    ) -> impl Future<Output = Result<RawResponse, BoxError>> + Send;
}

/// [`Transport`] backed by `reqwest`.
#[derive(Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
    options: TransportOptions,
}

impl fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("options", &self.options)
            .finish()
    }
}

impl ReqwestTransport {
    pub fn new(options: TransportOptions) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .cookie_store(options.cookie_store)
            .danger_accept_invalid_certs(options.accept_invalid_certs)
            .timeout(Duration::from_millis(options.timeout_ms))
            .build()?;
        Ok(Self { http, options })
    }

    /// Wraps an existing client. The client must have redirects disabled.
    pub fn with_client(http: reqwest::Client, options: TransportOptions) -> Self {
        Self { http, options }
    }

    pub fn options(&self) -> &TransportOptions {
        &self.options
    }
}

impl Transport for ReqwestTransport {
    async fn send(
        &self,
        endpoint: &Endpoint,
        request: &RequestDescriptor,
    ) -> Result<RawResponse, BoxError> {
        let url = request.url_for(endpoint)?;
        let mut builder = self.http.request(request.method().into(), url);
        for (name, value) in request.headers() {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body() {
            builder = builder.body(body.to_owned());
        }
        if let Some(timeout) = request.timeout() {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        // Consumes the response; the connection is returned to the pool or
        // closed whether or not the body read succeeds.
        let body = response.bytes().await?;

        Ok(RawResponse {
            status,
            headers,
            body: body.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{RawResponse, ReqwestTransport};
    use crate::TransportOptions;

    #[test]
    fn raw_response_header_lookup_is_case_insensitive() {
        let response = RawResponse::new(301).with_header("Location", "https://h2/path");
        assert_eq!(response.location(), Some("https://h2/path"));
        assert_eq!(response.header("LOCATION"), Some("https://h2/path"));
        assert_eq!(response.content_type(), None);
    }

    #[test]
    fn invalid_headers_are_skipped() {
        let response = RawResponse::new(200).with_header("bad header", "x");
        assert!(response.headers.is_empty());
    }

    #[test]
    fn debug_shows_options() {
        let transport = ReqwestTransport::new(TransportOptions::default()).expect("must build");
        assert!(format!("{transport:?}").contains("timeout_ms"));
    }
}
