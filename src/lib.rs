//! TCP endpoint establishment
//!
//! This crate resolves a symbolic network endpoint (an optional host name
//! plus a service name or port) into an ordered list of candidate socket
//! addresses, and establishes either a bound listening socket or an
//! outbound connection by trying each candidate in resolver order until
//! one succeeds.
//!
//! The two entry points share the same shape:
//!
//! - [`TcpBinder`] resolves in passive mode (an empty host means the
//!   wildcard address, not loopback) and binds, applying listen-side
//!   options per candidate.
//! - [`TcpConnector`] resolves in active mode and connects.
//!
//! Per-candidate failures are recovered locally; only when every candidate
//! has been tried and failed does the call return an error, carrying the
//! last failing step and its OS error code. Everything here is synchronous
//! and blocking, one pass per call, no retry or timeout.
//!
//! ```no_run
//! use tcpsock::{TcpBinder, TcpConnector};
//!
//! let listener = TcpBinder::new().bind("8080")?;
//! let stream = TcpConnector::new().connect("localhost", "8080")?;
//! # Ok::<(), tcpsock::Error>(())
//! ```

pub mod errno;
pub mod resolver;
pub mod tcp;

pub use errno::SockOp;
pub use resolver::{resolve, AddrFamily, AddrInfo, Candidate};
pub use tcp::{TcpBinder, TcpConnector};

/// Result type for endpoint establishment operations
pub type Result<T> = std::result::Result<T, Error>;

/// Endpoint establishment errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The resolver could not translate the host/service pair at all.
    ///
    /// Carries the resolver's numeric status and its human-readable
    /// message. Resolution is a precondition, not a per-candidate step,
    /// so this is never retried.
    #[error("address resolution failed with code {code}: {message}")]
    Resolution { code: i32, message: String },

    /// Every resolved candidate was tried and all failed.
    ///
    /// `op` names the last failing step and `code` is the OS error
    /// captured at that point; earlier candidates' failures are not
    /// surfaced individually.
    #[error("{op}() failed: {}", crate::errno::format_os_error(*code))]
    Socket { op: SockOp, code: i32 },

    /// The host or service string cannot be handed to the resolver.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
}
