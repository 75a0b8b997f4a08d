//! The raw FTP command surface the gateways are written against.
//!
//! [`SuppaConnector`](super::SuppaConnector) provides the production
//! implementation; tests plug in an in-memory server.

use std::time::Duration;

use crate::errors::TransportError;

/// One open FTP control channel.
///
/// Methods map one-to-one onto FTP commands and block until the server
/// replies or the socket timeout elapses.
pub trait FtpTransport: Send {
    /// `USER` + `PASS`.
    fn login(&mut self, username: &str, password: &str) -> Result<(), TransportError>;

    /// Choose passive (`PASV`) or active (`PORT`) data connections.
    fn set_passive(&mut self, passive: bool);

    /// Apply a read/write timeout to the control socket.
    fn set_operation_timeout(&mut self, timeout: Duration) -> Result<(), TransportError>;

    /// `TYPE I`.
    fn set_binary(&mut self) -> Result<(), TransportError>;

    /// `PWD`.
    fn pwd(&mut self) -> Result<String, TransportError>;

    /// `CWD`.
    fn cwd(&mut self, path: &str) -> Result<(), TransportError>;

    /// `LIST`, one string per line.
    fn list(&mut self, path: Option<&str>) -> Result<Vec<String>, TransportError>;

    /// `RETR` into memory.
    fn retr(&mut self, path: &str) -> Result<Vec<u8>, TransportError>;

    /// `STOR` from memory; returns the number of bytes sent.
    fn put(&mut self, path: &str, data: &[u8]) -> Result<u64, TransportError>;

    /// `SIZE`.
    fn size(&mut self, path: &str) -> Result<u64, TransportError>;

    /// `MKD`.
    fn mkdir(&mut self, path: &str) -> Result<(), TransportError>;

    /// `RMD`.
    fn rmdir(&mut self, path: &str) -> Result<(), TransportError>;

    /// `DELE`.
    fn rm(&mut self, path: &str) -> Result<(), TransportError>;

    /// `RNFR` + `RNTO`.
    fn rename(&mut self, from: &str, to: &str) -> Result<(), TransportError>;

    /// `QUIT`.
    fn quit(&mut self) -> Result<(), TransportError>;
}

/// Opens control channels.
pub trait Connector: Send + Sync {
    /// Open a plaintext or explicit-TLS control channel. Login is a
    /// separate step on the returned transport.
    fn open(
        &self,
        host: &str,
        port: u16,
        use_tls: bool,
        connect_timeout: Duration,
    ) -> Result<Box<dyn FtpTransport>, TransportError>;
}
