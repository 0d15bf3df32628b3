use serde::Deserialize;

pub const DEFAULT_ATTEMPT_LIMIT: i64 = 5;
pub const DEFAULT_MAX_EXCERPT_LEN: usize = 1024;

/// Configures the attempt budget and failure diagnostics of a session.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(default)]
pub struct SessionOptions {
    /// Ceiling on dispatches per call chain, login requests included.
    /// Zero or below fails every call before it is sent.
    pub attempt_limit: i64,
    /// Maximum length in bytes of the error-body excerpt kept in failures.
    pub max_excerpt_len: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            attempt_limit: DEFAULT_ATTEMPT_LIMIT,
            max_excerpt_len: DEFAULT_MAX_EXCERPT_LEN,
        }
    }
}

/// Configures the reqwest-backed transport.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(default)]
pub struct TransportOptions {
    /// Default per-request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Accept self-signed or otherwise unverifiable certificates.
    pub accept_invalid_certs: bool,
    /// Keep cookies set by the controller (the login session cookie).
    pub cookie_store: bool,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            accept_invalid_certs: false,
            cookie_store: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{SessionOptions, TransportOptions};

    #[test]
    fn defaults() {
        let options = SessionOptions::default();
        assert_eq!(options.attempt_limit, 5);
        assert_eq!(options.max_excerpt_len, 1024);
        assert!(TransportOptions::default().cookie_store);
    }

    #[test]
    fn partial_config_falls_back_to_defaults() {
        let options: SessionOptions =
            serde_json::from_str(r#"{"attempt_limit": 3}"#).expect("must parse");
        assert_eq!(
            options,
            SessionOptions {
                attempt_limit: 3,
                max_excerpt_len: 1024,
            }
        );

        let transport: TransportOptions =
            serde_json::from_str(r#"{"accept_invalid_certs": true}"#).expect("must parse");
        assert!(transport.accept_invalid_certs);
        assert_eq!(transport.timeout_ms, 10_000);
    }
}
