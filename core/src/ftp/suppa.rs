//! [`Connector`] backed by the `suppaftp` crate.
//!
//! Plain FTP uses `FtpStream`; FTPS upgrades the control channel with
//! `AUTH TLS` through `native-tls` right after the greeting.

use std::io::Cursor;
use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;

use suppaftp::native_tls::TlsConnector;
use suppaftp::types::{FileType, Mode};
use suppaftp::{FtpError, FtpStream, NativeTlsConnector, NativeTlsFtpStream};
use tracing::debug;

use super::transport::{Connector, FtpTransport};
use crate::errors::TransportError;

/// Production connector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuppaConnector {
    accept_invalid_certs: bool,
}

impl SuppaConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip certificate verification for FTPS. Self-signed certificates are
    /// common on shared hosting.
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }
}

impl Connector for SuppaConnector {
    fn open(
        &self,
        host: &str,
        port: u16,
        use_tls: bool,
        connect_timeout: Duration,
    ) -> Result<Box<dyn FtpTransport>, TransportError> {
        let addr = resolve(host, port)?;
        debug!("Opening FTP control channel to {addr} (tls: {use_tls})");

        let stream = if use_tls {
            let plain =
                NativeTlsFtpStream::connect_timeout(addr, connect_timeout).map_err(map_ftp_error)?;
            let tls = TlsConnector::builder()
                .danger_accept_invalid_certs(self.accept_invalid_certs)
                .build()
                .map_err(|e| TransportError::Tls(e.to_string()))?;
            let secure = plain
                .into_secure(NativeTlsConnector::from(tls), host)
                .map_err(map_ftp_error)?;
            Stream::Tls(secure)
        } else {
            Stream::Plain(FtpStream::connect_timeout(addr, connect_timeout).map_err(map_ftp_error)?)
        };

        Ok(Box::new(SuppaTransport { stream }))
    }
}

fn resolve(host: &str, port: u16) -> Result<SocketAddr, TransportError> {
    (host, port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| TransportError::Other(format!("No address found for {host}")))
}

enum Stream {
    Plain(FtpStream),
    Tls(NativeTlsFtpStream),
}

struct SuppaTransport {
    stream: Stream,
}

/// Run the same expression against whichever stream variant is active.
macro_rules! with_stream {
    ($self:ident, $s:ident => $body:expr) => {
        match &mut $self.stream {
            Stream::Plain($s) => $body,
            Stream::Tls($s) => $body,
        }
    };
}

impl FtpTransport for SuppaTransport {
    fn login(&mut self, username: &str, password: &str) -> Result<(), TransportError> {
        with_stream!(self, s => s.login(username, password)).map_err(map_ftp_error)
    }

    fn set_passive(&mut self, passive: bool) {
        let mode = if passive { Mode::Passive } else { Mode::Active };
        with_stream!(self, s => s.set_mode(mode));
    }

    fn set_operation_timeout(&mut self, timeout: Duration) -> Result<(), TransportError> {
        let tcp = with_stream!(self, s => s.get_ref());
        tcp.set_read_timeout(Some(timeout))?;
        tcp.set_write_timeout(Some(timeout))?;
        Ok(())
    }

    fn set_binary(&mut self) -> Result<(), TransportError> {
        with_stream!(self, s => s.transfer_type(FileType::Binary)).map_err(map_ftp_error)
    }

    fn pwd(&mut self) -> Result<String, TransportError> {
        with_stream!(self, s => s.pwd()).map_err(map_ftp_error)
    }

    fn cwd(&mut self, path: &str) -> Result<(), TransportError> {
        with_stream!(self, s => s.cwd(path)).map_err(map_ftp_error)
    }

    fn list(&mut self, path: Option<&str>) -> Result<Vec<String>, TransportError> {
        with_stream!(self, s => s.list(path)).map_err(map_ftp_error)
    }

    fn retr(&mut self, path: &str) -> Result<Vec<u8>, TransportError> {
        with_stream!(self, s => s.retr_as_buffer(path))
            .map(Cursor::into_inner)
            .map_err(map_ftp_error)
    }

    fn put(&mut self, path: &str, data: &[u8]) -> Result<u64, TransportError> {
        let mut reader = Cursor::new(data);
        with_stream!(self, s => s.put_file(path, &mut reader)).map_err(map_ftp_error)
    }

    fn size(&mut self, path: &str) -> Result<u64, TransportError> {
        with_stream!(self, s => s.size(path))
            .map(|size| size as u64)
            .map_err(map_ftp_error)
    }

    fn mkdir(&mut self, path: &str) -> Result<(), TransportError> {
        with_stream!(self, s => s.mkdir(path)).map_err(map_ftp_error)
    }

    fn rmdir(&mut self, path: &str) -> Result<(), TransportError> {
        with_stream!(self, s => s.rmdir(path)).map_err(map_ftp_error)
    }

    fn rm(&mut self, path: &str) -> Result<(), TransportError> {
        with_stream!(self, s => s.rm(path)).map_err(map_ftp_error)
    }

    fn rename(&mut self, from: &str, to: &str) -> Result<(), TransportError> {
        with_stream!(self, s => s.rename(from, to)).map_err(map_ftp_error)
    }

    fn quit(&mut self) -> Result<(), TransportError> {
        with_stream!(self, s => s.quit()).map_err(map_ftp_error)
    }
}

/// Convert a suppaftp error into a [`TransportError`].
fn map_ftp_error(err: FtpError) -> TransportError {
    match err {
        FtpError::ConnectionError(e) => TransportError::Io(e),
        FtpError::SecureError(msg) => TransportError::Tls(msg),
        FtpError::UnexpectedResponse(resp) => TransportError::Reply {
            code: resp.status.code(),
            message: String::from_utf8_lossy(&resp.body).trim().to_string(),
        },
        other => TransportError::Other(other.to_string()),
    }
}
