//! The per-path scan output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::FileType;

/// Filesystem entry classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
    /// Devices, sockets, FIFOs.
    Other,
}

impl EntryKind {
    pub fn from_file_type(ft: FileType) -> Self {
        if ft.is_symlink() {
            EntryKind::Symlink
        } else if ft.is_dir() {
            EntryKind::Directory
        } else if ft.is_file() {
            EntryKind::File
        } else {
            EntryKind::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::File => "file",
            EntryKind::Directory => "directory",
            EntryKind::Symlink => "symlink",
            EntryKind::Other => "other",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata of an entry that could be stat'ed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryInfo {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// The 12 permission bits.
    pub mode: u32,
    pub mode_string: String,
    pub mode_octal: String,
    pub uid: u32,
    pub gid: u32,
    /// Owner name, empty if unresolved.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub user: String,
    /// Group name, empty if unresolved.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub group: String,
    pub size: u64,
    pub inode: u64,
    pub mod_time: DateTime<Utc>,
    pub is_symlink: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub link_target: String,
    pub acl: bool,
}

/// One inspected filesystem entry.
///
/// Either `entry` is populated, or the entry could not be stat'ed and only
/// `path` and `scan_error` are set. A populated record may still carry a
/// soft ACL-probe error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    pub path: String,
    #[serde(flatten)]
    pub entry: Option<EntryInfo>,
    #[serde(rename = "err", skip_serializing_if = "Option::is_none")]
    pub scan_error: Option<String>,
}

impl FileRecord {
    pub fn ok(path: impl Into<String>, entry: EntryInfo) -> Self {
        Self {
            path: path.into(),
            entry: Some(entry),
            scan_error: None,
        }
    }

    /// A degraded record for an entry whose metadata could not be read.
    pub fn failed(path: impl Into<String>, error: impl fmt::Display) -> Self {
        Self {
            path: path.into(),
            entry: None,
            scan_error: Some(error.to_string()),
        }
    }

    /// Append a soft error, keeping any earlier one.
    pub fn append_error(&mut self, error: impl fmt::Display) {
        self.scan_error = Some(match self.scan_error.take() {
            Some(prev) => format!("{}; {}", prev, error),
            None => error.to_string(),
        });
    }

    /// Graph join key; `None` for error records and zero inodes.
    pub fn inode(&self) -> Option<u64> {
        self.entry
            .as_ref()
            .map(|e| e.inode)
            .filter(|&inode| inode != 0)
    }

    pub fn is_error(&self) -> bool {
        self.entry.is_none()
    }
}
