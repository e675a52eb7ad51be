//! Entry inspector: one `FileRecord` per path, never an `Err`.

use chrono::{DateTime, Utc};
use std::fs::{self, Metadata};
use std::os::unix::fs::MetadataExt;
use std::path::Path;
use std::time::UNIX_EPOCH;
use tracing::trace;

use super::acl::AclProbe;
use super::mode::{mode_octal, mode_string, PERMISSION_MASK};
use super::record::{EntryInfo, EntryKind, FileRecord};
use crate::config::ScanConfig;
use crate::identity::NameResolver;

/// Produces metadata records for filesystem paths.
#[derive(Debug, Clone)]
pub struct Inspector {
    follow_symlinks: bool,
    resolver: NameResolver,
    /// Present only when ACL checking is enabled.
    probe: Option<AclProbe>,
}

impl Inspector {
    pub fn new(follow_symlinks: bool, check_acl: bool) -> Self {
        Self::from_config(&ScanConfig::default(), follow_symlinks, check_acl)
    }

    pub fn from_config(config: &ScanConfig, follow_symlinks: bool, check_acl: bool) -> Self {
        Self {
            follow_symlinks,
            resolver: NameResolver::from_config(config),
            probe: check_acl.then(|| AclProbe::from_config(config)),
        }
    }

    pub fn with_resolver(mut self, resolver: NameResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Replace the ACL probe; also turns ACL checking on.
    pub fn with_probe(mut self, probe: AclProbe) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn follows_symlinks(&self) -> bool {
        self.follow_symlinks
    }

    pub fn checks_acl(&self) -> bool {
        self.probe.is_some()
    }

    pub fn inspect(&self, path: &Path) -> FileRecord {
        let display = path.to_string_lossy().into_owned();

        let link_meta = match fs::symlink_metadata(path) {
            Ok(meta) => meta,
            Err(e) => return FileRecord::failed(display, format!("lstat {}: {}", path.display(), e)),
        };
        let is_symlink = link_meta.file_type().is_symlink();

        let meta = if self.follow_symlinks && is_symlink {
            match fs::metadata(path) {
                Ok(meta) => meta,
                Err(e) => {
                    return FileRecord::failed(display, format!("stat {}: {}", path.display(), e))
                }
            }
        } else {
            link_meta
        };

        let link_target = if is_symlink {
            fs::read_link(path)
                .map(|target| target.to_string_lossy().into_owned())
                .unwrap_or_default()
        } else {
            String::new()
        };

        let mut record = FileRecord::ok(display, self.entry_info(&meta, is_symlink, link_target));

        if let Some(probe) = &self.probe {
            let report = probe.detect(path);
            if let Some(entry) = record.entry.as_mut() {
                entry.acl = report.has_acl;
            }
            if let Some(error) = report.error {
                record.append_error(error);
            }
        }

        trace!(path = %record.path, "inspected");
        record
    }

    fn entry_info(&self, meta: &Metadata, is_symlink: bool, link_target: String) -> EntryInfo {
        let mode = meta.mode() & PERMISSION_MASK;
        let uid = meta.uid();
        let gid = meta.gid();

        EntryInfo {
            kind: EntryKind::from_file_type(meta.file_type()),
            mode,
            mode_string: mode_string(mode),
            mode_octal: mode_octal(mode),
            uid,
            gid,
            user: self.resolver.user_name(uid).unwrap_or_default(),
            group: self.resolver.group_name(gid).unwrap_or_default(),
            size: meta.size(),
            inode: meta.ino(),
            mod_time: DateTime::<Utc>::from(meta.modified().unwrap_or(UNIX_EPOCH)),
            is_symlink,
            link_target,
            acl: false,
        }
    }
}

impl Default for Inspector {
    fn default() -> Self {
        Self::new(false, false)
    }
}

/// Inspect one path with the default registries and ACL probe.
pub fn inspect(path: &Path, follow_symlinks: bool, check_acl: bool) -> FileRecord {
    Inspector::new(follow_symlinks, check_acl).inspect(path)
}
