//! TCP endpoint establishment
//!
//! The two builders here share one shape: resolve the endpoint, then walk
//! the candidate list in resolver order, trying each candidate to
//! completion and stopping at the first success. A candidate whose
//! socket fails any later step is closed before the next candidate is
//! tried, so no intermediate descriptor outlives its attempt; only the
//! winning socket escapes and its ownership transfers to the caller.
//!
//! Everything is synchronous and blocking. One invocation performs
//! exactly one pass over the candidates, with no retry, backoff, or
//! timeout; a hang in one connect attempt blocks progress to the next
//! candidate.

use socket2::Socket;

use crate::errno::{format_os_error, LastError, SockOp};
use crate::resolver::{self, AddrFamily, AddrInfo, Candidate};
use crate::{Error, Result};

/// Establishes bound listening endpoints.
///
/// The bind path resolves in passive mode, so an absent host means the
/// wildcard address. Listening itself (and everything after) is the
/// caller's job; the returned socket is bound but not yet listening.
#[derive(Debug, Clone, Default)]
pub struct TcpBinder {
    family: AddrFamily,
}

impl TcpBinder {
    pub fn new() -> Self {
        TcpBinder {
            family: AddrFamily::Unspec,
        }
    }

    /// Constrain resolution to one address family (default: unspecified).
    pub fn family(mut self, family: AddrFamily) -> Self {
        self.family = family;
        self
    }

    /// Bind to the wildcard address for `service`.
    pub fn bind(&self, service: &str) -> Result<Socket> {
        self.bind_node(None, service)
    }

    /// Bind to `node`:`service`.
    pub fn bind_node(&self, node: Option<&str>, service: &str) -> Result<Socket> {
        let candidates = resolver::resolve(node, service, self.family, true)?;
        bind_candidates(&candidates)
    }
}

/// Establishes outbound connections.
#[derive(Debug, Clone, Default)]
pub struct TcpConnector {
    family: AddrFamily,
}

impl TcpConnector {
    pub fn new() -> Self {
        TcpConnector {
            family: AddrFamily::Unspec,
        }
    }

    /// Constrain resolution to one address family (default: unspecified,
    /// letting the resolver produce both IPv4 and IPv6 candidates).
    pub fn family(mut self, family: AddrFamily) -> Self {
        self.family = family;
        self
    }

    /// Connect to `node`:`service`.
    pub fn connect(&self, node: &str, service: &str) -> Result<Socket> {
        let candidates = resolver::resolve(Some(node), service, self.family, false)?;
        connect_candidates(&candidates)
    }
}

fn new_socket(cand: &Candidate) -> std::result::Result<Socket, LastError> {
    Socket::new(cand.family, cand.socktype, Some(cand.protocol))
        .map_err(|e| LastError::from_io(SockOp::Create, &e))
}

fn bind_candidates(candidates: &AddrInfo) -> Result<Socket> {
    let mut last: Option<LastError> = None;

    for cand in candidates {
        let socket = match new_socket(&cand) {
            Ok(s) => s,
            Err(e) => {
                last = Some(e);
                continue;
            }
        };

        // Cleared unconditionally so a single IPv6 wildcard bind also
        // accepts IPv4 traffic where the platform supports it. Not fatal
        // when the option does not apply to this candidate.
        if let Err(e) = socket.set_only_v6(false) {
            log::debug!("clearing IPV6_V6ONLY on candidate {} failed: {}", cand, e);
        }

        // Lets a restart rebind a recently released port.
        #[cfg(not(windows))]
        if let Err(e) = socket.set_reuse_address(true) {
            log::debug!("setting SO_REUSEADDR on candidate {} failed: {}", cand, e);
        }

        match socket.bind(&cand.addr) {
            Ok(()) => return Ok(socket),
            Err(e) => {
                last = Some(LastError::from_io(SockOp::Bind, &e));
                // socket dropped here, closing the descriptor
            }
        }
    }

    Err(exhausted(last))
}

fn connect_candidates(candidates: &AddrInfo) -> Result<Socket> {
    let mut last: Option<LastError> = None;

    for cand in candidates {
        let socket = match new_socket(&cand) {
            Ok(s) => s,
            Err(e) => {
                last = Some(e);
                continue;
            }
        };

        match socket.connect(&cand.addr) {
            Ok(()) => return Ok(socket),
            Err(e) => {
                last = Some(LastError::from_io(SockOp::Connect, &e));
            }
        }
    }

    Err(exhausted(last))
}

/// Terminal failure: every candidate was tried and none succeeded.
fn exhausted(last: Option<LastError>) -> Error {
    // resolve() never returns an empty list, so a failure was recorded.
    let LastError { op, code } = last.unwrap_or(LastError {
        op: SockOp::Create,
        code: 0,
    });
    log::error!(
        "no usable candidate address: {}() failed: {}",
        op,
        format_os_error(code)
    );
    Error::Socket { op, code }
}
