use ftpgate_core::config::Credentials;
use tokio::sync::Mutex;

/// In-memory holder for the credentials of the signed-in user.
///
/// The agent serves one client over stdio, so at most one set of
/// credentials is kept. Protected by a `tokio::sync::Mutex` so it can be
/// shared across async tasks. Nothing is written to disk.
pub struct CredentialStore {
    current: Mutex<Option<Credentials>>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(None),
        }
    }

    /// Replace any stored credentials.
    pub async fn store(&self, credentials: Credentials) {
        *self.current.lock().await = Some(credentials);
    }

    /// Forget the stored credentials. Returns whether any were stored.
    pub async fn clear(&self) -> bool {
        self.current.lock().await.take().is_some()
    }

    /// A copy of the stored credentials, if signed in.
    pub async fn get(&self) -> Option<Credentials> {
        self.current.lock().await.clone()
    }
}
