//! Error types for the ftpgate core crate.
//!
//! Errors never cross the gateway's public contract as `Err` values: the
//! gateways convert every [`GatewayError`] into an unsuccessful
//! [`OperationResult`](crate::files::OperationResult). The enums still exist
//! so internal code can propagate with `?` and so callers of the lower-level
//! pieces (sanitizer, transport) get typed failures.

use thiserror::Error;

/// Reasons a user-supplied path is refused by the sanitizer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SanitizeError {
    /// The path contains `..` anywhere.
    #[error("Path traversal is not allowed: {0}")]
    Traversal(String),

    /// The path contains characters outside the allowed set.
    #[error("Path contains invalid characters: {0}")]
    InvalidCharacters(String),
}

/// Failures reported by an [`FtpTransport`](crate::ftp::FtpTransport).
#[derive(Error, Debug)]
pub enum TransportError {
    /// The server answered with a negative completion reply.
    #[error("FTP reply {code}: {message}")]
    Reply { code: u32, message: String },

    /// A socket-level failure (refused, reset, timeout, DNS).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The TLS handshake or TLS setup failed.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Anything the transport could not classify.
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// FTP reply code, when the failure came from a server reply.
    pub fn reply_code(&self) -> Option<u32> {
        match self {
            Self::Reply { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Whether the server rejected the login (530 and friends).
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self.reply_code(), Some(530) | Some(331) | Some(332))
    }
}

/// Errors raised inside the gateways.
///
/// The `Display` text is the caller-facing message placed in
/// `OperationResult::message`.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Invalid FTP host")]
    InvalidHost,

    #[error("Invalid FTP port")]
    InvalidPort,

    #[error("Username and password are required")]
    MissingCredentials,

    /// The control channel could not be opened. DNS failure, refusal,
    /// timeout and TLS failure all collapse into this variant.
    #[error("Failed to connect to FTP server")]
    ConnectFailed(#[source] TransportError),

    #[error("Authentication failed. Please check your username and password")]
    AuthenticationFailed(#[source] TransportError),

    #[error("Not connected to FTP server")]
    NotConnected,

    #[error("Invalid path")]
    InvalidPath(#[from] SanitizeError),

    #[error("File is too large to open ({size} bytes, limit {limit})")]
    FileTooLarge { size: u64, limit: u64 },

    /// A remote operation failed; the string is the best-effort message.
    #[error("{0}")]
    Operation(String),
}
