//! `rest-session` is an async HTTP session layer for REST controllers that
//! authenticate with a login cookie and answer with redirects when their
//! cluster topology changes.
//!
//! [`AuthenticatingSession::execute`] takes a validated [`RequestDescriptor`]
//! and:
//! - logs in and retries once when the session has expired (`401`),
//! - moves to the host named by a redirect (`300..=307`) for this and later calls,
//! - fails on anything else but `200`,
//! - never dispatches more than the configured attempt limit per call chain.

mod budget;
mod endpoint;
pub mod entity;
mod error;
mod options;
mod request;
mod session;
pub mod status;
mod transport;

pub use budget::{AttemptBudget, AttemptLease};
pub use endpoint::Endpoint;
pub use entity::Entity;
pub use error::{BoxError, SessionError};
pub use options::{SessionOptions, TransportOptions};
pub use request::{Method, RequestBuilder, RequestDescriptor};
pub use session::{AuthenticatingSession, Credentials};
pub use status::StatusClass;
pub use transport::{RawResponse, ReqwestTransport, Transport};

pub type Result<T> = std::result::Result<T, SessionError>;
