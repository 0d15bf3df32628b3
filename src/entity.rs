//! Turns responses into caller-visible results.
//!
//! Successful responses become an [`Entity`]; failed ones are summarised by a
//! bounded excerpt of their body when that body is meant for humans.

use crate::{RawResponse, Result, SessionError};

const HUMAN_READABLE_TYPES: [&str; 2] = ["text/html", "text/plain"];

/// Body of a successful response.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Entity {
    content_type: Option<String>,
    body: Vec<u8>,
}

impl Entity {
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.body
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.body
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Body as UTF-8 text.
    pub fn text(&self) -> Result<&str> {
        std::str::from_utf8(&self.body)
            .map_err(|err| SessionError::Decode(format!("entity body is not valid UTF-8: {err}")))
    }
}

/// Moves the body of a successful response into an [`Entity`].
pub fn extract(response: RawResponse) -> Entity {
    let content_type = response.content_type().map(ToOwned::to_owned);
    Entity {
        content_type,
        body: response.body,
    }
}

/// Bounded excerpt of `response`'s body, when its content type marks it as a
/// human-readable error page.
pub fn error_excerpt(response: &RawResponse, max_len: usize) -> Option<String> {
    let media_type = response.content_type()?.split(';').next()?.trim();
    if !HUMAN_READABLE_TYPES
        .iter()
        .any(|readable| media_type.eq_ignore_ascii_case(readable))
    {
        return None;
    }
    let text = String::from_utf8_lossy(&response.body);
    Some(truncate(&text, max_len).to_owned())
}

/// Excerpt when available, status line otherwise.
pub fn error_message(response: &RawResponse, max_len: usize) -> String {
    error_excerpt(response, max_len).unwrap_or_else(|| response.status_line())
}

fn truncate(text: &str, max_len: usize) -> &str {
    if text.len() <= max_len {
        return text;
    }
    let mut end = max_len;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
