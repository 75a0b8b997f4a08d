//! Lifecycle of one authenticated FTP session.

use std::sync::Arc;

use tracing::{debug, info, warn, Span};

use super::transport::{Connector, FtpTransport};
use crate::config::{Credentials, GatewaySettings};
use crate::errors::GatewayError;
use crate::files::{OperationResult, PathSanitizer};

/// Where a [`FtpConnectionGateway`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Authenticated,
}

/// Owns at most one control channel and guarantees it is closed.
///
/// A single [`connect()`](Self::connect) attempt either reaches
/// [`ConnectionState::Authenticated`] or leaves the gateway disconnected;
/// there is no retry. Dropping the gateway disconnects.
pub struct FtpConnectionGateway {
    connector: Arc<dyn Connector>,
    settings: GatewaySettings,
    sanitizer: PathSanitizer,
    span: Span,
    state: ConnectionState,
    transport: Option<Box<dyn FtpTransport>>,
}

impl FtpConnectionGateway {
    /// `span` is the logging context every record of this connection is
    /// emitted in.
    pub fn new(connector: Arc<dyn Connector>, settings: GatewaySettings, span: Span) -> Self {
        Self {
            connector,
            settings,
            sanitizer: PathSanitizer::new(),
            span,
            state: ConnectionState::Disconnected,
            transport: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn settings(&self) -> &GatewaySettings {
        &self.settings
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// True only with a live handle in the authenticated state.
    pub fn is_connected(&self) -> bool {
        self.transport.is_some() && self.state == ConnectionState::Authenticated
    }

    /// Validate input, open the channel, log in and configure transfers.
    pub fn connect(&mut self, credentials: &Credentials) -> OperationResult {
        let span = self.span.clone();
        let _enter = span.enter();

        match self.try_connect(credentials) {
            Ok(()) => {
                info!("Connected to {}:{}", credentials.host, credentials.port);
                OperationResult::done("Connected to FTP server")
            }
            Err(e) => {
                match &e {
                    GatewayError::ConnectFailed(source) | GatewayError::AuthenticationFailed(source) => {
                        warn!("{e}: {source}")
                    }
                    _ => debug!("Rejected connection request: {e}"),
                }
                OperationResult::from_error(&e)
            }
        }
    }

    fn try_connect(&mut self, credentials: &Credentials) -> Result<(), GatewayError> {
        self.disconnect();

        if !self.sanitizer.is_valid_host(&credentials.host) {
            return Err(GatewayError::InvalidHost);
        }
        if !self.sanitizer.is_valid_port(credentials.port) {
            return Err(GatewayError::InvalidPort);
        }
        if credentials.username.is_empty() || credentials.password.is_empty() {
            return Err(GatewayError::MissingCredentials);
        }

        self.state = ConnectionState::Connecting;
        let result = self.open_authenticated(credentials);
        match result {
            Ok(transport) => {
                self.transport = Some(transport);
                self.state = ConnectionState::Authenticated;
                Ok(())
            }
            Err(e) => {
                self.state = ConnectionState::Disconnected;
                Err(e)
            }
        }
    }

    fn open_authenticated(
        &self,
        credentials: &Credentials,
    ) -> Result<Box<dyn FtpTransport>, GatewayError> {
        let mut transport = self
            .connector
            .open(
                &credentials.host,
                credentials.port,
                credentials.use_tls,
                self.settings.connect_timeout(),
            )
            .map_err(GatewayError::ConnectFailed)?;

        if let Err(e) = transport.login(&credentials.username, &credentials.password) {
            close_quietly(&mut *transport);
            // Only an explicit login rejection means bad credentials; a busy
            // server or a dropped socket is worth retrying.
            return Err(if e.is_auth_rejection() {
                GatewayError::AuthenticationFailed(e)
            } else {
                GatewayError::ConnectFailed(e)
            });
        }

        transport.set_passive(credentials.passive_mode);
        let configured = transport
            .set_binary()
            .and_then(|()| transport.set_operation_timeout(self.settings.operation_timeout()));
        if let Err(e) = configured {
            close_quietly(&mut *transport);
            return Err(GatewayError::ConnectFailed(e));
        }

        Ok(transport)
    }

    /// Close the channel if one is open. Safe to call in any state.
    pub fn disconnect(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            let _enter = self.span.enter();
            close_quietly(&mut *transport);
            debug!("Disconnected");
        }
        self.state = ConnectionState::Disconnected;
    }

    /// The live transport, for the operations gateway only.
    pub(crate) fn transport(&mut self) -> Result<&mut Box<dyn FtpTransport>, GatewayError> {
        if !self.is_connected() {
            return Err(GatewayError::NotConnected);
        }
        self.transport.as_mut().ok_or(GatewayError::NotConnected)
    }
}

impl Drop for FtpConnectionGateway {
    fn drop(&mut self) {
        self.disconnect();
    }
}

fn close_quietly(transport: &mut dyn FtpTransport) {
    if let Err(e) = transport.quit() {
        debug!("QUIT failed, dropping connection anyway: {e}");
    }
}
