pub mod browser;
pub mod listing;
pub mod sanitize;

pub use browser::RemoteFiles;
pub use listing::ListingParser;
pub use sanitize::PathSanitizer;

use serde::{Deserialize, Serialize};

use crate::errors::GatewayError;

/// Kind of a remote directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    File,
    Directory,
}

/// A file or directory entry parsed from a remote listing.
///
/// Field names are serialized as camelCase for the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
    pub name: String,
    /// Navigable path; may point at a symlink.
    pub path: String,
    /// Symlink target when known, otherwise equal to `path`.
    pub real_path: String,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    /// Byte count; always 0 for directories.
    pub size: u64,
    /// Raw Unix permission string as sent by the server (`drwxr-xr-x`).
    pub permissions: String,
    /// `DD/MM/YYYY` or `DD/MM/YYYY HH:MM`.
    pub modified: String,
    pub is_symlink: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symlink_target: Option<String>,
    /// Only set on tree nodes; an empty vec means "not fetched yet".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<DirectoryEntry>>,
}

impl DirectoryEntry {
    pub fn is_directory(&self) -> bool {
        self.entry_type == EntryType::Directory
    }
}

/// One directory level split into folders and files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryListing {
    pub path: String,
    pub folders: Vec<DirectoryEntry>,
    pub files: Vec<DirectoryEntry>,
}

impl DirectoryListing {
    /// Partition entries by type and sort each side by name (case-insensitive).
    pub fn from_entries(path: impl Into<String>, entries: Vec<DirectoryEntry>) -> Self {
        let (mut folders, mut files): (Vec<_>, Vec<_>) =
            entries.into_iter().partition(DirectoryEntry::is_directory);
        sort_by_name(&mut folders);
        sort_by_name(&mut files);
        Self {
            path: path.into(),
            folders,
            files,
        }
    }

    /// Folders first, then files. Folders get an empty `children` placeholder.
    pub fn into_tree_nodes(self) -> Vec<DirectoryEntry> {
        let mut nodes = Vec::with_capacity(self.folders.len() + self.files.len());
        nodes.extend(self.folders.into_iter().map(|mut folder| {
            folder.children = Some(Vec::new());
            folder
        }));
        nodes.extend(self.files);
        nodes
    }
}

fn sort_by_name(entries: &mut [DirectoryEntry]) {
    entries.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
}

/// Lazily expanded tree level returned by `get_tree`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryTree {
    pub path: String,
    pub tree: Vec<DirectoryEntry>,
}

/// Downloaded file content.
///
/// The bytes are not serialized; encoding for transport (base64 or text)
/// is left to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileContent {
    pub path: String,
    pub size: u64,
    #[serde(skip)]
    pub data: Vec<u8>,
}

/// Result of probing whether a path is a directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryProbe {
    pub path: String,
    pub is_directory: bool,
}

/// Paths accepted by `delete`: a single path or a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeleteTarget {
    One(String),
    Many(Vec<String>),
}

impl DeleteTarget {
    pub fn into_paths(self) -> Vec<String> {
        match self {
            Self::One(path) => vec![path],
            Self::Many(paths) => paths,
        }
    }
}

impl From<&str> for DeleteTarget {
    fn from(path: &str) -> Self {
        Self::One(path.to_string())
    }
}

impl From<Vec<String>> for DeleteTarget {
    fn from(paths: Vec<String>) -> Self {
        Self::Many(paths)
    }
}

/// Outcome for a single path of a delete batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOutcome {
    pub path: String,
    pub success: bool,
    pub message: String,
}

/// Per-item report of a delete batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteReport {
    pub results: Vec<DeleteOutcome>,
    pub success_count: usize,
    pub failed_count: usize,
}

impl DeleteReport {
    pub fn push(&mut self, outcome: DeleteOutcome) {
        if outcome.success {
            self.success_count += 1;
        } else {
            self.failed_count += 1;
        }
        self.results.push(outcome);
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed_count == 0
    }
}

/// Uniform result of every gateway operation.
///
/// Serializes as `{success, message, ...data}`: the payload's fields are
/// flattened next to `success` and `message` so a controller can pass the
/// value through without interpreting it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationResult<T = ()> {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub data: Option<T>,
}

impl<T> OperationResult<T> {
    /// Successful result carrying a payload.
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    /// Successful result without a payload.
    pub fn done(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }

    pub fn from_error(err: &GatewayError) -> Self {
        Self::fail(err.to_string())
    }

    /// Failed result that still carries a payload (partial batch failures).
    pub fn partial(message: impl Into<String>, data: T) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> OperationResult<U> {
        OperationResult {
            success: self.success,
            message: self.message,
            data: self.data.map(f),
        }
    }
}

impl<T> From<GatewayError> for OperationResult<T> {
    fn from(err: GatewayError) -> Self {
        Self::from_error(&err)
    }
}
