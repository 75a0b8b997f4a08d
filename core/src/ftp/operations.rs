//! File-manager operations over an authenticated connection.
//!
//! Each public method returns an [`OperationResult`] and never panics on a
//! remote failure. The FTP protocol rarely says *why* something failed, so
//! messages are best-effort.
//!
//! Directory probes (`is_directory`, and the listing itself) change the
//! working directory and change it back. That is a side effect on the
//! session; the original directory is restored on every path.

use tracing::{debug, warn};

use super::connection::FtpConnectionGateway;
use super::transport::FtpTransport;
use crate::errors::{GatewayError, TransportError};
use crate::files::{
    DeleteOutcome, DeleteReport, DeleteTarget, DirectoryEntry, DirectoryListing, DirectoryTree,
    EntryType, FileContent, ListingParser, OperationResult, PathSanitizer,
};

/// Operations gateway; owns the connection it runs on.
pub struct FtpOperationsGateway {
    connection: FtpConnectionGateway,
    sanitizer: PathSanitizer,
    parser: ListingParser,
}

impl FtpOperationsGateway {
    pub fn new(connection: FtpConnectionGateway) -> Self {
        Self::with_parser(connection, ListingParser::new())
    }

    pub fn with_parser(connection: FtpConnectionGateway, parser: ListingParser) -> Self {
        Self {
            connection,
            sanitizer: PathSanitizer::new(),
            parser,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    /// Close the underlying connection. Also happens on drop.
    pub fn disconnect(&mut self) {
        self.connection.disconnect();
    }

    /// List one directory: folders and files, each sorted by name.
    pub fn list_directory(&mut self, path: &str) -> OperationResult<DirectoryListing> {
        self.guarded(|ops| {
            let path = ops.clean(path)?;
            let entries = ops.list_entries(&path)?;
            Ok(OperationResult::ok(
                "Directory listed",
                DirectoryListing::from_entries(path, entries),
            ))
        })
    }

    /// One tree level, folders first. Folder nodes carry an empty `children`
    /// vec; the caller expands a node by calling this again with its path.
    /// Returns an empty level once `depth >= max_depth`.
    pub fn get_tree(
        &mut self,
        path: &str,
        max_depth: u32,
        depth: u32,
    ) -> OperationResult<DirectoryTree> {
        self.guarded(|ops| {
            let path = ops.clean(path)?;
            if depth >= max_depth {
                return Ok(OperationResult::ok(
                    "Maximum tree depth reached",
                    DirectoryTree {
                        path,
                        tree: Vec::new(),
                    },
                ));
            }
            let entries = ops.list_entries(&path)?;
            let tree = DirectoryListing::from_entries(path.clone(), entries).into_tree_nodes();
            Ok(OperationResult::ok("Tree listed", DirectoryTree { path, tree }))
        })
    }

    /// Download a file in binary mode. With a `read_limit` set, a file
    /// whose `SIZE` exceeds it is refused before `RETR`. Servers without
    /// `SIZE` are checked after the download instead.
    pub fn read_file(&mut self, path: &str) -> OperationResult<FileContent> {
        self.guarded(|ops| {
            let path = ops.clean(path)?;
            let limit = ops.connection.settings().read_limit;
            if let Some(limit) = limit {
                match ops.transport()?.size(&path) {
                    Ok(size) if size > limit => {
                        return Err(GatewayError::FileTooLarge { size, limit });
                    }
                    Ok(_) => {}
                    Err(e) => debug!("SIZE {path} unavailable, checking after download: {e}"),
                }
            }

            let data = ops
                .transport()?
                .retr(&path)
                .map_err(failure("Failed to read file"))?;
            let size = data.len() as u64;
            if let Some(limit) = limit.filter(|limit| size > *limit) {
                return Err(GatewayError::FileTooLarge { size, limit });
            }
            Ok(OperationResult::ok(
                "File read",
                FileContent { size, path, data },
            ))
        })
    }

    /// Upload bytes in binary mode, overwriting the remote file. A failed
    /// upload may leave a truncated file behind.
    pub fn write_file(&mut self, path: &str, content: &[u8]) -> OperationResult {
        self.guarded(|ops| {
            let path = ops.clean(path)?;
            ops.transport()?
                .put(&path, content)
                .map_err(failure("Failed to save file"))?;
            Ok(OperationResult::done("File saved"))
        })
    }

    /// Create an empty file unless something answers a `SIZE` probe.
    pub fn create_file(&mut self, path: &str) -> OperationResult {
        self.guarded(|ops| {
            let path = ops.clean(path)?;
            let transport = ops.transport()?;
            if transport.size(&path).is_ok() {
                return Ok(OperationResult::fail("File already exists"));
            }
            transport
                .put(&path, &[])
                .map_err(failure("Failed to create file"))?;
            Ok(OperationResult::done("File created"))
        })
    }

    pub fn create_folder(&mut self, path: &str) -> OperationResult {
        self.guarded(|ops| {
            let path = ops.clean(path)?;
            ops.transport()?
                .mkdir(&path)
                .map_err(failure("Failed to create folder. It may already exist"))?;
            Ok(OperationResult::done("Folder created"))
        })
    }

    /// Rename after checking the destination is free. The check and the
    /// rename are separate commands, so a concurrent change on the server
    /// can still slip in between.
    pub fn rename(&mut self, old_path: &str, new_path: &str) -> OperationResult {
        self.guarded(|ops| {
            let old_path = ops.clean(old_path)?;
            let new_path = ops.clean(new_path)?;
            if ops.exists(&new_path)? {
                return Ok(OperationResult::fail(
                    "A file or folder with that name already exists",
                ));
            }
            ops.transport()?
                .rename(&old_path, &new_path)
                .map_err(failure("Failed to rename"))?;
            Ok(OperationResult::done("Renamed successfully"))
        })
    }

    /// Delete one path or a batch. Each item is attempted independently;
    /// items deleted before a later failure stay deleted.
    pub fn delete(&mut self, target: DeleteTarget) -> OperationResult<DeleteReport> {
        self.guarded(|ops| {
            let paths = target.into_paths();
            let mut report = DeleteReport::default();
            for path in &paths {
                report.push(ops.delete_one(path));
            }

            let total = paths.len();
            if report.all_succeeded() {
                let message = format!("Deleted {total} item(s)");
                Ok(OperationResult::ok(message, report))
            } else {
                let message = format!(
                    "Deleted {} of {total} item(s), {} failed",
                    report.success_count, report.failed_count
                );
                Ok(OperationResult::partial(message, report))
            }
        })
    }

    /// Whether `path` can be entered with `CWD`.
    pub fn is_directory(&mut self, path: &str) -> bool {
        if !self.is_connected() {
            return false;
        }
        let span = self.connection.span().clone();
        let _enter = span.enter();
        match self.clean(path) {
            Ok(path) => self.probe_directory(&path),
            Err(_) => false,
        }
    }

    // --- internals ---

    /// Check the connection, run `op` inside the connection's span, and
    /// turn any error into a failed result.
    fn guarded<T>(
        &mut self,
        op: impl FnOnce(&mut Self) -> Result<OperationResult<T>, GatewayError>,
    ) -> OperationResult<T> {
        if !self.is_connected() {
            return GatewayError::NotConnected.into();
        }
        let span = self.connection.span().clone();
        let _enter = span.enter();
        op(self).unwrap_or_else(|e| {
            debug!("Operation failed: {e}");
            e.into()
        })
    }

    fn transport(&mut self) -> Result<&mut Box<dyn FtpTransport>, GatewayError> {
        self.connection.transport()
    }

    fn clean(&self, path: &str) -> Result<String, GatewayError> {
        Ok(self.sanitizer.sanitize(path)?)
    }

    /// `CWD path`, `LIST .`, then `CWD` back. Changing in first avoids
    /// servers that mangle `LIST` arguments containing spaces.
    fn raw_list(&mut self, path: &str) -> Result<Vec<String>, GatewayError> {
        let transport = self.transport()?;
        let original = transport
            .pwd()
            .map_err(failure("An error occurred while reading the working directory"))?;

        if let Err(e) = transport.cwd(path) {
            debug!("CWD {path} failed: {e}");
            return Err(GatewayError::Operation(
                "Directory not found or not accessible".to_string(),
            ));
        }

        let listing = transport.list(Some("."));
        restore_cwd(&mut **transport, &original);
        listing.map_err(failure("An error occurred while listing the directory"))
    }

    /// Parsed entries of `path` with symlinked directories resolved.
    fn list_entries(&mut self, path: &str) -> Result<Vec<DirectoryEntry>, GatewayError> {
        let lines = self.raw_list(path)?;
        let mut entries = self.parser.parse_listing(&lines, path);
        for entry in entries.iter_mut().filter(|e| e.is_symlink && !e.is_directory()) {
            if self.probe_directory(&entry.path) {
                entry.entry_type = EntryType::Directory;
                entry.size = 0;
            }
        }
        Ok(entries)
    }

    fn probe_directory(&mut self, path: &str) -> bool {
        let Ok(transport) = self.transport() else {
            return false;
        };
        let original = match transport.pwd() {
            Ok(dir) => dir,
            Err(e) => {
                debug!("PWD failed while probing {path}: {e}");
                return false;
            }
        };
        if transport.cwd(path).is_err() {
            return false;
        }
        restore_cwd(&mut **transport, &original);
        true
    }

    /// Whether the parent's listing shows `path` as a symlink. An unreadable
    /// parent counts as "not a link".
    fn is_symlink(&mut self, path: &str) -> bool {
        let trimmed = path.trim_end_matches('/');
        let (parent, name) = match trimmed.rsplit_once('/') {
            Some(("", name)) => ("/", name),
            Some((parent, name)) => (parent, name),
            None => (".", trimmed),
        };
        match self.raw_list(parent) {
            Ok(lines) => self
                .parser
                .parse_listing(&lines, parent)
                .iter()
                .any(|entry| entry.name == name && entry.is_symlink),
            Err(e) => {
                debug!("Could not list {parent} to check {name} for a link: {e}");
                false
            }
        }
    }

    /// Destination check for rename: `SIZE` answers for files, a non-empty
    /// `LIST` for directories.
    fn exists(&mut self, path: &str) -> Result<bool, GatewayError> {
        let transport = self.transport()?;
        if transport.size(path).is_ok() {
            return Ok(true);
        }
        Ok(transport
            .list(Some(path))
            .map(|lines| !lines.is_empty())
            .unwrap_or(false))
    }

    fn delete_one(&mut self, raw: &str) -> DeleteOutcome {
        let outcome = |success: bool, message: &str| DeleteOutcome {
            path: raw.to_string(),
            success,
            message: message.to_string(),
        };

        let path = match self.clean(raw) {
            Ok(path) => path,
            Err(e) => return outcome(false, &e.to_string()),
        };
        if path.trim_end_matches('/').is_empty() {
            return outcome(false, "Refusing to delete the root directory");
        }

        // `CWD` follows links, so a link to a directory must be caught first
        // or the recursive delete would empty the link's target.
        let result = if self.is_symlink(&path) {
            self.transport()
                .and_then(|t| t.rm(&path).map_err(failure("Failed to delete link")))
                .map(|()| "Link deleted")
        } else if self.probe_directory(&path) {
            self.delete_folder_recursive(&path)
                .map(|()| "Folder deleted")
        } else {
            self.transport()
                .and_then(|t| t.rm(&path).map_err(failure("Failed to delete file")))
                .map(|()| "File deleted")
        };

        match result {
            Ok(message) => outcome(true, message),
            Err(e) => {
                warn!("Delete of {path} failed: {e}");
                outcome(false, &e.to_string())
            }
        }
    }

    /// Depth-first delete. Symlinks are removed, never followed.
    fn delete_folder_recursive(&mut self, path: &str) -> Result<(), GatewayError> {
        let lines = self.raw_list(path)?;
        let children = self.parser.parse_listing(&lines, path);

        for child in children {
            if child.is_directory() && !child.is_symlink {
                self.delete_folder_recursive(&child.path)?;
            } else {
                self.transport()?
                    .rm(&child.path)
                    .map_err(failure(&format!("Failed to delete {}", child.path)))?;
            }
        }

        self.transport()?
            .rmdir(path)
            .map_err(failure(&format!("Failed to delete folder {path}")))
    }
}

fn restore_cwd(transport: &mut dyn FtpTransport, original: &str) {
    if let Err(e) = transport.cwd(original) {
        warn!("Failed to restore working directory {original}: {e}");
    }
}

/// Map a transport error to a caller-facing message, keeping the detail in
/// the log.
fn failure(message: &str) -> impl FnOnce(TransportError) -> GatewayError + '_ {
    move |e| {
        debug!("{message}: {e}");
        GatewayError::Operation(message.to_string())
    }
}
