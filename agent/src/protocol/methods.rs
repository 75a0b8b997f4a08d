use ftpgate_core::config::Credentials;
use ftpgate_core::files::{DeleteTarget, FileContent};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::ServerDefaults;

// ── auth.login ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct LoginParams {
    pub credentials: LoginCredentials,
}

/// Credentials as submitted by the client. Connection fields are only
/// honoured when the agent has no configured server.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginCredentials {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: String,
    pub password: String,
    pub use_tls: Option<bool>,
    pub passive_mode: Option<bool>,
}

impl std::fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("host", &self.host)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl LoginCredentials {
    /// Build session credentials. A configured server supplies every
    /// connection field and the client's are ignored, so the agent cannot
    /// be pointed at another host. `None` when no host is known.
    pub fn resolve(self, server: Option<&ServerDefaults>) -> Option<Credentials> {
        if let Some(server) = server {
            if self.host.as_deref().is_some_and(|host| host != server.host) {
                warn!(
                    "Ignoring client host {:?}; logins go to {}",
                    self.host, server.host
                );
            }
            return Some(
                Credentials::new(server.host.clone(), server.port, self.username, self.password)
                    .with_tls(server.use_tls)
                    .with_passive_mode(server.passive_mode),
            );
        }

        let host = self.host?;
        Some(
            Credentials::new(
                host,
                self.port.unwrap_or_else(ftpgate_core::config::default_ftp_port),
                self.username,
                self.password,
            )
            .with_tls(self.use_tls.unwrap_or(false))
            .with_passive_mode(self.passive_mode.unwrap_or(true)),
        )
    }
}

// ── auth.status ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthStatusResult {
    pub logged_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

// ── files.* ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct PathParams {
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeParams {
    pub path: String,
    pub max_depth: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WriteParams {
    pub path: String,
    /// Base64-encoded file content.
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameParams {
    pub old_path: String,
    pub new_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteParams {
    pub paths: DeleteTarget,
}

/// `files.read` payload with the bytes base64-encoded.
#[derive(Debug, Clone, Serialize)]
pub struct EncodedFile {
    pub path: String,
    pub size: u64,
    pub content: String,
}

impl From<FileContent> for EncodedFile {
    fn from(file: FileContent) -> Self {
        Self {
            content: base64::Engine::encode(&base64::engine::general_purpose::STANDARD, &file.data),
            path: file.path,
            size: file.size,
        }
    }
}
