//! Errors from a single HTTP GET.

use std::fmt;
use std::io;

/// Why a download did not produce a complete body.
#[derive(Debug)]
pub enum TransferError {
    /// Curl reported an error (DNS, connect, timeout, TLS, ...).
    Curl(curl::Error),
    /// Response had a non-2xx status.
    Http(u32),
    /// The body could not be written to the local sink.
    Write(io::Error),
}

impl TransferError {
    /// True for network-level failures where no response was received.
    pub fn is_connection(&self) -> bool {
        match self {
            TransferError::Curl(e) => {
                e.is_couldnt_connect()
                    || e.is_couldnt_resolve_host()
                    || e.is_couldnt_resolve_proxy()
                    || e.is_operation_timedout()
                    || e.is_recv_error()
                    || e.is_send_error()
                    || e.is_got_nothing()
            }
            _ => false,
        }
    }
}

impl fmt::Display for TransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferError::Curl(e) => write!(f, "{}", e),
            TransferError::Http(code) => write!(f, "HTTP {}", code),
            TransferError::Write(e) => write!(f, "write failed: {}", e),
        }
    }
}

impl std::error::Error for TransferError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransferError::Curl(e) => Some(e),
            TransferError::Http(_) => None,
            TransferError::Write(e) => Some(e),
        }
    }
}

impl From<curl::Error> for TransferError {
    fn from(e: curl::Error) -> Self {
        TransferError::Curl(e)
    }
}
