//! FTP/FTPS gateway.
//!
//! - [`FtpConnectionGateway`] owns one authenticated control channel.
//! - [`FtpOperationsGateway`] runs file-manager operations over it.
//! - [`FtpGateway`] is the async, connection-per-request [`RemoteFiles`]
//!   implementation callers use.
//!
//! [`RemoteFiles`]: crate::files::RemoteFiles

mod connection;
mod gateway;
mod operations;
#[cfg(feature = "ftp")]
mod suppa;
mod transport;

pub use connection::{ConnectionState, FtpConnectionGateway};
pub use gateway::FtpGateway;
pub use operations::FtpOperationsGateway;
#[cfg(feature = "ftp")]
pub use suppa::SuppaConnector;
pub use transport::{Connector, FtpTransport};
