//! Platform socket error capture and formatting
//!
//! The candidate loops in [`crate::tcp`] must remember which step failed
//! last and with what OS error, captured at the exact point of failure.
//! `socket2` surfaces every syscall failure as an [`std::io::Error`] that
//! already carries the raw OS code (errno on unix, the WSA last error on
//! Windows), so capture is uniform across platforms.

use std::fmt;
use std::io;

/// Failing step within a candidate loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SockOp {
    /// Socket creation failed.
    Create,
    /// The bind syscall failed.
    Bind,
    /// The connect syscall failed.
    Connect,
}

impl SockOp {
    /// The syscall name, as it appears in diagnostics.
    pub fn as_str(self) -> &'static str {
        match self {
            SockOp::Create => "socket",
            SockOp::Bind => "bind",
            SockOp::Connect => "connect",
        }
    }
}

impl fmt::Display for SockOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The most recent (operation, OS error) pair seen in a candidate loop.
///
/// Overwritten on every failing step; only the final value survives to
/// become the terminal error when the loop exhausts all candidates.
#[derive(Debug, Clone, Copy)]
pub struct LastError {
    pub op: SockOp,
    pub code: i32,
}

impl LastError {
    /// Capture the OS error from a failed socket operation.
    pub fn from_io(op: SockOp, err: &io::Error) -> Self {
        LastError {
            op,
            code: err.raw_os_error().unwrap_or(0),
        }
    }
}

/// Human-readable text for an OS error code.
///
/// Only invoked on failure paths, never on success.
pub fn format_os_error(code: i32) -> String {
    io::Error::from_raw_os_error(code).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sockop_names() {
        assert_eq!(SockOp::Create.as_str(), "socket");
        assert_eq!(SockOp::Bind.as_str(), "bind");
        assert_eq!(SockOp::Connect.as_str(), "connect");
        assert_eq!(SockOp::Bind.to_string(), "bind");
    }

    #[test]
    fn test_capture_from_io_error() {
        let err = io::Error::from_raw_os_error(libc::ECONNREFUSED);
        let last = LastError::from_io(SockOp::Connect, &err);
        assert_eq!(last.op, SockOp::Connect);
        assert_eq!(last.code, libc::ECONNREFUSED);
    }

    #[test]
    fn test_capture_without_os_code() {
        let err = io::Error::new(io::ErrorKind::Other, "synthetic");
        let last = LastError::from_io(SockOp::Bind, &err);
        assert_eq!(last.code, 0);
    }

    #[test]
    fn test_format_os_error() {
        let text = format_os_error(libc::ECONNREFUSED);
        assert!(!text.is_empty());
    }
}
