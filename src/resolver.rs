//! Endpoint resolution
//!
//! This module wraps the system resolver (`getaddrinfo`) and turns a
//! host/service pair into an ordered list of bind/connect candidates,
//! each tagged with its address family, socket type, and protocol.
//!
//! Resolution is configured for stream/TCP candidates only. The order of
//! the returned candidates is whatever the resolver ranked, and callers
//! must preserve it: first-match-wins semantics in the establishment
//! loops depend on it.

use std::ffi::{CStr, CString};
use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::net::SocketAddr;
use std::ptr;

use socket2::{Domain, Protocol, SockAddr, Type};

use super::{Error, Result};

/// Address family constraint for resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddrFamily {
    /// No constraint; both IPv4 and IPv6 candidates may be produced.
    #[default]
    Unspec,
    /// IPv4 only
    V4,
    /// IPv6 only
    V6,
}

impl AddrFamily {
    fn to_af(self) -> libc::c_int {
        match self {
            AddrFamily::Unspec => libc::AF_UNSPEC,
            AddrFamily::V4 => libc::AF_INET,
            AddrFamily::V6 => libc::AF_INET6,
        }
    }
}

/// One resolved socket address, eligible for a bind or connect attempt.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Address family (domain) to create the socket in
    pub family: Domain,
    /// Socket type (always stream here)
    pub socktype: Type,
    /// Transport protocol (always TCP here)
    pub protocol: Protocol,
    /// The address to bind or connect to
    pub addr: SockAddr,
}

impl Candidate {
    fn from_ai(ai: &libc::addrinfo) -> Self {
        let mut storage: libc::sockaddr_storage = unsafe { mem::zeroed() };
        let len = (ai.ai_addrlen as usize).min(mem::size_of::<libc::sockaddr_storage>());
        unsafe {
            ptr::copy_nonoverlapping(
                ai.ai_addr as *const u8,
                &mut storage as *mut _ as *mut u8,
                len,
            );
        }
        let addr = unsafe { SockAddr::new(storage, ai.ai_addrlen as libc::socklen_t) };

        Candidate {
            family: Domain::from(ai.ai_family),
            socktype: Type::from(ai.ai_socktype),
            protocol: Protocol::from(ai.ai_protocol),
            addr,
        }
    }

    /// The candidate's address as a standard library `SocketAddr`, if it
    /// is an IPv4 or IPv6 address.
    pub fn to_socket_addr(&self) -> Option<SocketAddr> {
        self.addr.as_socket()
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_socket_addr() {
            Some(addr) => write!(f, "{}", addr),
            None => f.write_str("<non-inet address>"),
        }
    }
}

/// Owned result list from the system resolver.
///
/// Holds the native `addrinfo` chain and releases it exactly once when
/// dropped, regardless of how iteration ended (early success, exhaustion,
/// or error propagation). Iterating `&AddrInfo` yields [`Candidate`]s in
/// resolver order and can be restarted without re-resolving.
#[derive(Debug)]
pub struct AddrInfo {
    head: *mut libc::addrinfo,
}

// The list is read-only after resolution and freed exactly once on drop.
unsafe impl Send for AddrInfo {}

impl AddrInfo {
    /// Iterate the candidates in resolver order.
    pub fn iter(&self) -> CandidateIter<'_> {
        CandidateIter {
            cur: self.head,
            _list: PhantomData,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_null()
    }
}

impl Drop for AddrInfo {
    fn drop(&mut self) {
        if !self.head.is_null() {
            unsafe { libc::freeaddrinfo(self.head) };
        }
    }
}

impl<'a> IntoIterator for &'a AddrInfo {
    type Item = Candidate;
    type IntoIter = CandidateIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the candidates of an [`AddrInfo`] list.
pub struct CandidateIter<'a> {
    cur: *const libc::addrinfo,
    _list: PhantomData<&'a AddrInfo>,
}

impl Iterator for CandidateIter<'_> {
    type Item = Candidate;

    fn next(&mut self) -> Option<Candidate> {
        if self.cur.is_null() {
            return None;
        }
        let ai = unsafe { &*self.cur };
        self.cur = ai.ai_next;
        Some(Candidate::from_ai(ai))
    }
}

/// Resolve a host/service pair into stream/TCP candidates.
///
/// `node` of `None` (or an empty string) in passive mode requests the
/// wildcard address suitable for a listening socket, not a loopback
/// default. On the connect path, leave `family` unspecified unless the
/// caller constrains it, so both IPv4 and IPv6 candidates are produced
/// in the order the resolver ranks them.
///
/// Fails with [`Error::Resolution`] when the name or service cannot be
/// translated at all; this is reported immediately and never retried.
pub fn resolve(
    node: Option<&str>,
    service: &str,
    family: AddrFamily,
    passive: bool,
) -> Result<AddrInfo> {
    let node_c = match node {
        Some(n) if !n.is_empty() => Some(
            CString::new(n).map_err(|_| Error::InvalidEndpoint(format!("host {:?}", n)))?,
        ),
        _ => None,
    };
    let service_c = CString::new(service)
        .map_err(|_| Error::InvalidEndpoint(format!("service {:?}", service)))?;

    let mut hints: libc::addrinfo = unsafe { mem::zeroed() };
    hints.ai_family = family.to_af();
    hints.ai_socktype = libc::SOCK_STREAM;
    hints.ai_protocol = libc::IPPROTO_TCP;
    if passive {
        hints.ai_flags = libc::AI_PASSIVE;
    }

    let mut head: *mut libc::addrinfo = ptr::null_mut();
    let rc = unsafe {
        libc::getaddrinfo(
            node_c.as_ref().map_or(ptr::null(), |s| s.as_ptr()),
            service_c.as_ptr(),
            &hints,
            &mut head,
        )
    };

    if rc != 0 {
        let message = unsafe { CStr::from_ptr(libc::gai_strerror(rc)) }
            .to_string_lossy()
            .into_owned();
        log::error!("getaddrinfo() failed with error code {}, \"{}\"", rc, message);
        return Err(Error::Resolution { code: rc, message });
    }

    Ok(AddrInfo { head })
}
