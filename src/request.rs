//! Immutable request descriptions and the fluent builder that validates them.
//!
//! A [`RequestDescriptor`] names the host it was built for, but the session
//! always dispatches it to its *current* endpoint. Redirects therefore move
//! the target without touching the path, query or body.

use std::{collections::BTreeMap, fmt, time::Duration};

use url::{form_urlencoded, Url};

use crate::{Endpoint, Result, SessionError};

pub const CONTENT_TYPE: &str = "content-type";
pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// HTTP method understood by the controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// A validated, immutable HTTP request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestDescriptor {
    method: Method,
    host: String,
    path: String,
    params: BTreeMap<String, String>,
    headers: Vec<(String, String)>,
    body: Option<String>,
    timeout: Option<Duration>,
}

impl RequestDescriptor {
    pub fn builder() -> RequestBuilder {
        RequestBuilder::default()
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// Host the request was built for.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Caller-supplied deadline for a single dispatch of this request.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Encoded query string without the leading `?`; empty when there are no
    /// parameters. Keys are emitted in sorted order.
    pub fn query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.params.iter())
            .finish()
    }

    /// Full URL of this request against `endpoint`.
    pub fn url_for(&self, endpoint: &Endpoint) -> Result<Url> {
        let mut url = Url::parse(&format!("{}{}", endpoint.base_url(), self.path)).map_err(|err| {
            SessionError::InvalidRequest(format!(
                "cannot build url for {} {} against {endpoint}: {err}",
                self.method, self.path
            ))
        })?;
        if !self.params.is_empty() {
            url.query_pairs_mut().extend_pairs(self.params.iter());
        }
        Ok(url)
    }
}

impl fmt::Display for RequestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)?;
        if !self.params.is_empty() {
            write!(f, "?{}", self.query_string())?;
        }
        Ok(())
    }
}

/// Fluent builder for [`RequestDescriptor`].
#[derive(Clone, Debug, Default)]
pub struct RequestBuilder {
    method: Option<Method>,
    host: Option<String>,
    path: Option<String>,
    params: BTreeMap<String, String>,
    headers: Vec<(String, String)>,
    body: Option<(String, &'static str)>,
    timeout: Option<Duration>,
}

impl RequestBuilder {
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Adds one query parameter, replacing an earlier value for `key`.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.params
            .extend(params.into_iter().map(|(key, value)| (key.into(), value.into())));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets a JSON payload; the request will carry `Content-Type: application/json`.
    pub fn json_payload(mut self, json: impl Into<String>) -> Self {
        self.body = Some((json.into(), JSON_CONTENT_TYPE));
        self
    }

    /// Sets a form-encoded payload built from `fields`.
    pub fn form_payload<I, K, V>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        self.body = Some((encoded, FORM_CONTENT_TYPE));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<RequestDescriptor> {
        let method = self
            .method
            .ok_or_else(|| SessionError::InvalidRequest("method is required".to_owned()))?;
        let host = self
            .host
            .filter(|host| !host.trim().is_empty())
            .ok_or_else(|| SessionError::InvalidRequest("host is required".to_owned()))?;
        let path = self
            .path
            .filter(|path| !path.is_empty())
            .ok_or_else(|| SessionError::InvalidRequest("path is required".to_owned()))?;
        if !path.starts_with('/') {
            return Err(SessionError::InvalidRequest(format!(
                "path '{path}' must start with '/'"
            )));
        }

        let mut headers = self.headers;
        let body = match self.body {
            Some((content, content_type)) => {
                headers.retain(|(name, _)| !name.eq_ignore_ascii_case(CONTENT_TYPE));
                headers.push((CONTENT_TYPE.to_owned(), content_type.to_owned()));
                Some(content)
            }
            None => None,
        };

        Ok(RequestDescriptor {
            method,
            host,
            path,
            params: self.params,
            headers,
            body,
            timeout: self.timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::{Method, RequestDescriptor};
    use crate::{Endpoint, SessionError};

    fn base() -> super::RequestBuilder {
        RequestDescriptor::builder()
            .method(Method::Get)
            .host("localhost")
            .path("/path")
    }

    fn assert_invalid(result: crate::Result<RequestDescriptor>) {
        assert!(matches!(result, Err(SessionError::InvalidRequest(_))));
    }

    #[test]
    fn missing_method_is_rejected() {
        assert_invalid(RequestDescriptor::builder().host("localhost").path("/path").build());
    }

    #[test]
    fn missing_or_empty_host_is_rejected() {
        assert_invalid(RequestDescriptor::builder().method(Method::Get).path("/path").build());
        assert_invalid(base().host("").build());
    }

    #[test]
    fn missing_empty_or_relative_path_is_rejected() {
        assert_invalid(RequestDescriptor::builder().method(Method::Get).host("localhost").build());
        assert_invalid(base().path("").build());
        assert_invalid(base().path("path").build());
    }

    #[test]
    fn simple_request() {
        let request = base().build().expect("must build");
        assert_eq!(request.method(), Method::Get);
        assert_eq!(request.host(), "localhost");
        let url = request
            .url_for(&Endpoint::https("localhost"))
            .expect("must build url");
        assert_eq!(url.as_str(), "https://localhost/path");
        assert!(request.body().is_none());
        assert!(request.headers().is_empty());
    }

    #[test]
    fn query_parameters_are_encoded_in_key_order() {
        let params: HashMap<&str, &str> =
            [("b", "two words"), ("a", "x&y"), ("c", "3")].into_iter().collect();
        let request = base().params(params).build().expect("must build");
        assert_eq!(request.query_string(), "a=x%26y&b=two+words&c=3");
        let url = request
            .url_for(&Endpoint::https("localhost"))
            .expect("must build url");
        assert_eq!(url.as_str(), "https://localhost/path?a=x%26y&b=two+words&c=3");
    }

    #[test]
    fn json_payload_sets_content_type() {
        let request = base()
            .method(Method::Post)
            .header("Content-Type", "text/plain")
            .json_payload(r#"{"key1":"value1"}"#)
            .build()
            .expect("must build");
        assert_eq!(request.header("Content-Type"), Some("application/json"));
        assert_eq!(request.headers().len(), 1);
        assert_eq!(request.body(), Some(r#"{"key1":"value1"}"#));
    }

    #[test]
    fn form_payload_is_url_encoded() {
        let request = base()
            .method(Method::Post)
            .form_payload([("username", "admin"), ("password", "p@ss word")])
            .build()
            .expect("must build");
        assert_eq!(request.body(), Some("username=admin&password=p%40ss+word"));
        assert_eq!(
            request.header("content-type"),
            Some("application/x-www-form-urlencoded")
        );
    }

    #[test]
    fn display_includes_method_path_and_query() {
        let request = base().param("fields", "*").build().expect("must build");
        assert_eq!(request.to_string(), "GET /path?fields=*");
    }
}
