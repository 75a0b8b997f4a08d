//! Agent configuration loaded from an optional JSON file.

use std::path::Path;

use ftpgate_core::config::{default_ftp_port, GatewaySettings};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Operator-configured agent settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentConfig {
    /// Fixed FTP server. When set, every login goes to it and any
    /// connection fields the client sends are ignored.
    #[serde(default)]
    pub server: Option<ServerDefaults>,
    #[serde(default)]
    pub gateway: GatewaySettings,
    /// Largest file `files.read` hands back to the client.
    #[serde(default = "default_max_read_bytes")]
    pub max_read_bytes: u64,
    /// Skip TLS certificate and hostname checks for FTPS servers with
    /// self-signed certificates.
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

/// Connection fields the operator pins for every login.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerDefaults {
    pub host: String,
    #[serde(default = "default_ftp_port")]
    pub port: u16,
    #[serde(default)]
    pub use_tls: bool,
    #[serde(default = "default_passive_mode")]
    pub passive_mode: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            server: None,
            gateway: GatewaySettings::default(),
            max_read_bytes: default_max_read_bytes(),
            accept_invalid_certs: false,
        }
    }
}

impl AgentConfig {
    /// Load from `path`. Missing or corrupt files yield the defaults.
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<AgentConfig>(&contents) {
                Ok(config) => {
                    debug!("Loaded agent config from {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("Failed to parse agent config from {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Cannot read agent config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Gateway settings with the read limit applied, so oversized files
    /// are refused before they are downloaded.
    pub fn gateway_settings(&self) -> GatewaySettings {
        GatewaySettings {
            read_limit: Some(self.max_read_bytes),
            ..self.gateway.clone()
        }
    }

    /// Longest request line the stdio loop accepts. A `files.write` of a
    /// `maxReadBytes` file must fit, so a file that can be opened can also
    /// be saved.
    pub fn max_request_bytes(&self) -> usize {
        let encoded = self.max_read_bytes.div_ceil(3).saturating_mul(4);
        let line = encoded.saturating_add(REQUEST_ENVELOPE_BYTES);
        usize::try_from(line.max(MIN_REQUEST_BYTES)).unwrap_or(usize::MAX)
    }
}

/// Room for the JSON-RPC envelope and path around the base64 content.
const REQUEST_ENVELOPE_BYTES: u64 = 64 * 1024;

/// Floor for the request line limit: 1 MiB.
const MIN_REQUEST_BYTES: u64 = 1024 * 1024;

fn default_max_read_bytes() -> u64 {
    10 * 1024 * 1024
}

fn default_passive_mode() -> bool {
    true
}
