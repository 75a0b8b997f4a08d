use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// FTP credentials and connection options for one session.
///
/// Supplied by the caller on every gateway call; the core never stores
/// them. `port` defaults to 21, `passive_mode` to `true`.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub host: String,
    #[serde(default = "default_ftp_port")]
    pub port: u16,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub use_tls: bool,
    #[serde(default = "default_passive_mode")]
    pub passive_mode: bool,
}

impl Credentials {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            username: username.into(),
            password: password.into(),
            use_tls: false,
            passive_mode: default_passive_mode(),
        }
    }

    pub fn with_tls(mut self, use_tls: bool) -> Self {
        self.use_tls = use_tls;
        self
    }

    pub fn with_passive_mode(mut self, passive_mode: bool) -> Self {
        self.passive_mode = passive_mode;
        self
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("use_tls", &self.use_tls)
            .field("passive_mode", &self.passive_mode)
            .finish()
    }
}

/// Tunables shared by every connection the gateway opens.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewaySettings {
    /// Upper bound for opening the control channel.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Socket read/write timeout applied after login.
    #[serde(default = "default_operation_timeout_secs")]
    pub operation_timeout_secs: u64,
    /// Default recursion guard for tree listings.
    #[serde(default = "default_max_tree_depth")]
    pub max_tree_depth: u32,
    /// Largest file `read_file` downloads. `None` means no limit.
    #[serde(default)]
    pub read_limit: Option<u64>,
}

impl GatewaySettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout_secs(),
            operation_timeout_secs: default_operation_timeout_secs(),
            max_tree_depth: default_max_tree_depth(),
            read_limit: None,
        }
    }
}

// --- Default value functions ---

pub fn default_ftp_port() -> u16 {
    21
}

fn default_passive_mode() -> bool {
    true
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_operation_timeout_secs() -> u64 {
    30
}

fn default_max_tree_depth() -> u32 {
    10
}
