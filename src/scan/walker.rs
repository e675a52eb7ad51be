//! Tree walker: depth-first, pre-order traversal of a subtree.
//!
//! Entries within a directory are visited in file-name order so repeated
//! scans of an unchanged tree produce identical output. Directory symlinks
//! are never descended into; `follow_symlinks` only changes how each entry
//! is stat'ed.

use ignore::WalkBuilder;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::inspect::Inspector;
use super::record::FileRecord;
use super::{RecordSink, WalkStats};
use crate::error::{HoundError, Result};

/// Walks a subtree and feeds one record per visited entry into a sink.
#[derive(Debug, Clone, Default)]
pub struct Walker {
    inspector: Inspector,
    /// Levels below the root's direct children; `None` is unlimited.
    max_depth: Option<usize>,
}

impl Walker {
    pub fn new(inspector: Inspector) -> Self {
        Self {
            inspector,
            max_depth: None,
        }
    }

    /// Negative values mean unlimited. `0` visits the root and its direct
    /// children, each further level adds one generation.
    pub fn max_depth(mut self, depth: i64) -> Self {
        self.max_depth = usize::try_from(depth).ok();
        self
    }

    /// Walk `root`, sending records to `sink`.
    ///
    /// Per-entry failures become error records and the walk continues.
    /// Fails only if the root itself cannot be stat'ed or the sink closes.
    pub fn walk(&self, root: &Path, sink: &mut impl RecordSink) -> Result<WalkStats> {
        let root = std::path::absolute(root).map_err(|source| HoundError::RootUnreachable {
            path: root.to_path_buf(),
            source,
        })?;
        fs::symlink_metadata(&root).map_err(|source| HoundError::RootUnreachable {
            path: root.clone(),
            source,
        })?;

        let mut builder = WalkBuilder::new(&root);
        builder
            .standard_filters(false)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b));
        if let Some(depth) = self.max_depth {
            builder.max_depth(Some(depth + 1));
        }

        info!(root = %root.display(), max_depth = ?self.max_depth, "walk starting");
        let mut stats = WalkStats::default();

        for result in builder.build() {
            let record = match result {
                Ok(entry) => self.inspector.inspect(entry.path()),
                Err(err) => {
                    let path = error_path(&err).map_or_else(|| root.clone(), Path::to_path_buf);
                    debug!(path = %path.display(), error = %err, "walk error");
                    FileRecord::failed(path.to_string_lossy(), &err)
                }
            };
            stats.tally(&record);
            sink.accept(record)?;
        }

        info!(%stats, "walk finished");
        Ok(stats)
    }
}

/// Walk `root` with default registries and ACL probe.
pub fn walk(
    root: &Path,
    max_depth: i64,
    follow_symlinks: bool,
    check_acl: bool,
    sink: &mut impl RecordSink,
) -> Result<WalkStats> {
    Walker::new(Inspector::new(follow_symlinks, check_acl))
        .max_depth(max_depth)
        .walk(root, sink)
}

/// The path an `ignore` error refers to, if any.
fn error_path(err: &ignore::Error) -> Option<&Path> {
    match err {
        ignore::Error::WithPath { path, .. } => Some(path.as_path()),
        ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } => {
            error_path(err)
        }
        ignore::Error::Loop { child, .. } => Some(child.as_path()),
        ignore::Error::Partial(errs) => errs.iter().find_map(error_path),
        _ => None,
    }
}
