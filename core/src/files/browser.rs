//! Async file-manager capability backed by a remote FTP server.
//!
//! [`FtpGateway`](crate::ftp::FtpGateway) is the production implementation.
//! Callers (the agent dispatcher, a web controller) hold a
//! `dyn RemoteFiles` so they can be exercised against a fake.

use crate::config::Credentials;
use crate::files::{
    DeleteReport, DeleteTarget, DirectoryListing, DirectoryProbe, DirectoryTree, FileContent,
    OperationResult,
};

/// File-manager operations performed with per-call credentials.
///
/// Every method opens its own connection and closes it before returning.
/// Failures are reported through [`OperationResult::success`], never as a
/// panic or `Err`.
#[async_trait::async_trait]
pub trait RemoteFiles: Send + Sync {
    /// Connect, authenticate and disconnect. Used to verify credentials.
    async fn login(&self, credentials: &Credentials) -> OperationResult;

    /// List one directory level split into folders and files.
    async fn list_directory(
        &self,
        credentials: &Credentials,
        path: &str,
    ) -> OperationResult<DirectoryListing>;

    /// List one tree level; folders carry an empty `children` placeholder.
    async fn get_tree(
        &self,
        credentials: &Credentials,
        path: &str,
        max_depth: Option<u32>,
    ) -> OperationResult<DirectoryTree>;

    /// Download a file into memory.
    async fn read_file(&self, credentials: &Credentials, path: &str)
        -> OperationResult<FileContent>;

    /// Upload bytes, overwriting the remote file.
    async fn write_file(
        &self,
        credentials: &Credentials,
        path: &str,
        content: Vec<u8>,
    ) -> OperationResult;

    /// Create an empty file; fails when the path already exists.
    async fn create_file(&self, credentials: &Credentials, path: &str) -> OperationResult;

    /// Create a directory.
    async fn create_folder(&self, credentials: &Credentials, path: &str) -> OperationResult;

    /// Rename or move; fails when the destination already exists.
    async fn rename(
        &self,
        credentials: &Credentials,
        old_path: &str,
        new_path: &str,
    ) -> OperationResult;

    /// Delete files and directories (recursively).
    async fn delete(
        &self,
        credentials: &Credentials,
        target: DeleteTarget,
    ) -> OperationResult<DeleteReport>;

    /// Probe whether a path is a directory.
    async fn is_directory(
        &self,
        credentials: &Credentials,
        path: &str,
    ) -> OperationResult<DirectoryProbe>;
}
