/// Boxed error produced by a [`Transport`](crate::Transport) implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The caller's request was rejected before any network call.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// The shared attempt budget ran out before the call chain finished.
    #[error("reached max attempt limit of {limit} against {host}{}", last_status_suffix(.last_status))]
    RetryLimitExceeded {
        /// Configured attempt limit.
        limit: i64,
        /// Endpoint targeted by the last dispatch.
        host: String,
        /// Status of the last response in the chain, if any was received.
        last_status: Option<u16>,
    },
    /// Two consecutive 401 responses: the credentials themselves are rejected.
    #[error("failed to authenticate against {host}: {detail}")]
    AuthenticationFailed {
        host: String,
        /// Body excerpt or status line of the second 401.
        detail: String,
    },
    /// Any status outside 200 / 401 / 300..=307.
    #[error("unexpected status {status_line} from {host}{}", excerpt_suffix(.excerpt))]
    UnexpectedStatus {
        status: u16,
        host: String,
        status_line: String,
        /// Bounded excerpt of a human-readable error body.
        excerpt: Option<String>,
    },
    /// A redirect response without a usable `Location` header.
    #[error("redirect {status} from {host} has no usable location (got {location:?})")]
    InvalidRedirect {
        status: u16,
        host: String,
        location: Option<String>,
    },
    /// Network or I/O failure reported by the transport; never retried.
    #[error("transport error against {host}: {source}")]
    Transport {
        host: String,
        #[source]
        source: BoxError,
    },
    /// The response entity could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
}

impl SessionError {
    /// Returns the HTTP status code attached to this failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RetryLimitExceeded { last_status, .. } => *last_status,
            Self::AuthenticationFailed { .. } => Some(401),
            Self::UnexpectedStatus { status, .. } | Self::InvalidRedirect { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// Returns `true` when a transport failure was caused by a deadline.
    pub fn is_timeout(&self) -> bool {
        let Self::Transport { source, .. } = self else {
            return false;
        };
        if source.is::<tokio::time::error::Elapsed>() {
            return true;
        }
        source
            .downcast_ref::<reqwest::Error>()
            .is_some_and(reqwest::Error::is_timeout)
    }
}

fn last_status_suffix(last_status: &Option<u16>) -> String {
    match last_status {
        Some(status) => format!(" (last status {status})"),
        None => String::new(),
    }
}

fn excerpt_suffix(excerpt: &Option<String>) -> String {
    match excerpt {
        Some(text) => format!(": {text}"),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::SessionError;

    #[test]
    fn unexpected_status_display_includes_excerpt_when_present() {
        let err = SessionError::UnexpectedStatus {
            status: 500,
            host: "https://controller:443".to_owned(),
            status_line: "500 Internal Server Error".to_owned(),
            excerpt: Some("<h1>boom</h1>".to_owned()),
        };
        assert_eq!(
            err.to_string(),
            "unexpected status 500 Internal Server Error from https://controller:443: <h1>boom</h1>"
        );
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn unexpected_status_display_falls_back_to_status_line() {
        let err = SessionError::UnexpectedStatus {
            status: 204,
            host: "https://controller:443".to_owned(),
            status_line: "204 No Content".to_owned(),
            excerpt: None,
        };
        assert_eq!(
            err.to_string(),
            "unexpected status 204 No Content from https://controller:443"
        );
    }

    #[test]
    fn retry_limit_display_includes_last_status_when_known() {
        let err = SessionError::RetryLimitExceeded {
            limit: 5,
            host: "https://controller:443".to_owned(),
            last_status: Some(302),
        };
        assert_eq!(
            err.to_string(),
            "reached max attempt limit of 5 against https://controller:443 (last status 302)"
        );
        assert_eq!(err.status(), Some(302));

        let err = SessionError::RetryLimitExceeded {
            limit: 0,
            host: "https://controller:443".to_owned(),
            last_status: None,
        };
        assert_eq!(
            err.to_string(),
            "reached max attempt limit of 0 against https://controller:443"
        );
    }

    #[test]
    fn transport_error_is_not_timeout_for_plain_io() {
        let err = SessionError::Transport {
            host: "https://controller:443".to_owned(),
            source: Box::new(std::io::Error::other("connection reset")),
        };
        assert!(!err.is_timeout());
        assert_eq!(err.status(), None);
    }
}
