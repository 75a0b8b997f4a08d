//! Async per-request façade over the blocking gateways.
//!
//! Every call builds a fresh connection from the supplied credentials,
//! runs one operation and closes the connection, all on a
//! `tokio::task::spawn_blocking` thread so the executor is never blocked
//! on FTP I/O.

use std::sync::Arc;

use tracing::{error, info_span};

use super::connection::FtpConnectionGateway;
use super::operations::FtpOperationsGateway;
use super::transport::Connector;
use crate::config::{Credentials, GatewaySettings};
use crate::files::{
    DeleteReport, DeleteTarget, DirectoryListing, DirectoryProbe, DirectoryTree, FileContent,
    OperationResult, RemoteFiles,
};

const UNEXPECTED_ERROR: &str = "An unexpected error occurred";

/// [`RemoteFiles`] implementation that talks to a real FTP server.
#[derive(Clone)]
pub struct FtpGateway {
    connector: Arc<dyn Connector>,
    settings: GatewaySettings,
}

impl FtpGateway {
    pub fn new(connector: Arc<dyn Connector>, settings: GatewaySettings) -> Self {
        Self {
            connector,
            settings,
        }
    }

    /// Gateway using the `suppaftp` client.
    #[cfg(feature = "ftp")]
    pub fn with_suppaftp(settings: GatewaySettings) -> Self {
        Self::new(Arc::new(super::SuppaConnector::new()), settings)
    }

    pub fn settings(&self) -> &GatewaySettings {
        &self.settings
    }

    /// Connect with `credentials`, run `op`, disconnect.
    ///
    /// A failed connect short-circuits with the connect message. The
    /// connection is closed when the operations gateway is dropped at the
    /// end of the blocking task, whatever `op` returned.
    async fn with_session<T, F>(&self, credentials: &Credentials, op: F) -> OperationResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut FtpOperationsGateway) -> OperationResult<T> + Send + 'static,
    {
        let span = info_span!(
            "ftp",
            host = %credentials.host,
            user = %credentials.username
        );
        let connector = self.connector.clone();
        let settings = self.settings.clone();
        let credentials = credentials.clone();

        let task = tokio::task::spawn_blocking(move || {
            let mut connection = FtpConnectionGateway::new(connector, settings, span);
            let connected = connection.connect(&credentials);
            if !connected.success {
                return OperationResult::fail(connected.message);
            }
            let mut ops = FtpOperationsGateway::new(connection);
            op(&mut ops)
        });

        match task.await {
            Ok(result) => result,
            Err(e) => {
                error!("FTP task failed: {e}");
                OperationResult::fail(UNEXPECTED_ERROR)
            }
        }
    }
}

#[async_trait::async_trait]
impl RemoteFiles for FtpGateway {
    async fn login(&self, credentials: &Credentials) -> OperationResult {
        self.with_session(credentials, |_| OperationResult::done("Login successful"))
            .await
    }

    async fn list_directory(
        &self,
        credentials: &Credentials,
        path: &str,
    ) -> OperationResult<DirectoryListing> {
        let path = path.to_string();
        self.with_session(credentials, move |ops| ops.list_directory(&path))
            .await
    }

    async fn get_tree(
        &self,
        credentials: &Credentials,
        path: &str,
        max_depth: Option<u32>,
    ) -> OperationResult<DirectoryTree> {
        let path = path.to_string();
        let max_depth = max_depth.unwrap_or(self.settings.max_tree_depth);
        self.with_session(credentials, move |ops| ops.get_tree(&path, max_depth, 0))
            .await
    }

    async fn read_file(
        &self,
        credentials: &Credentials,
        path: &str,
    ) -> OperationResult<FileContent> {
        let path = path.to_string();
        self.with_session(credentials, move |ops| ops.read_file(&path))
            .await
    }

    async fn write_file(
        &self,
        credentials: &Credentials,
        path: &str,
        content: Vec<u8>,
    ) -> OperationResult {
        let path = path.to_string();
        self.with_session(credentials, move |ops| ops.write_file(&path, &content))
            .await
    }

    async fn create_file(&self, credentials: &Credentials, path: &str) -> OperationResult {
        let path = path.to_string();
        self.with_session(credentials, move |ops| ops.create_file(&path))
            .await
    }

    async fn create_folder(&self, credentials: &Credentials, path: &str) -> OperationResult {
        let path = path.to_string();
        self.with_session(credentials, move |ops| ops.create_folder(&path))
            .await
    }

    async fn rename(
        &self,
        credentials: &Credentials,
        old_path: &str,
        new_path: &str,
    ) -> OperationResult {
        let old_path = old_path.to_string();
        let new_path = new_path.to_string();
        self.with_session(credentials, move |ops| ops.rename(&old_path, &new_path))
            .await
    }

    async fn delete(
        &self,
        credentials: &Credentials,
        target: DeleteTarget,
    ) -> OperationResult<DeleteReport> {
        self.with_session(credentials, move |ops| ops.delete(target))
            .await
    }

    async fn is_directory(
        &self,
        credentials: &Credentials,
        path: &str,
    ) -> OperationResult<DirectoryProbe> {
        let path = path.to_string();
        self.with_session(credentials, move |ops| {
            let is_directory = ops.is_directory(&path);
            OperationResult::ok("Path probed", DirectoryProbe { path, is_directory })
        })
        .await
    }
}
