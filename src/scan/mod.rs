//! Filesystem scanning: entry inspection, tree walking, and the sinks
//! records are streamed into.

pub mod acl;
pub mod inspect;
pub mod mode;
pub mod record;
pub mod stdin;
pub mod walker;

pub use acl::{parse_acl_output, AclProbe, AclReport};
pub use inspect::{inspect, Inspector};
pub use mode::{mode_octal, mode_string, Access, Class};
pub use record::{EntryInfo, EntryKind, FileRecord};
pub use stdin::read_paths;
pub use walker::{walk, Walker};

use crossbeam_channel::Sender;
use std::fmt;

use crate::error::{HoundError, Result};

/// Destination for scanned records.
pub trait RecordSink {
    fn accept(&mut self, record: FileRecord) -> Result<()>;
}

impl RecordSink for Vec<FileRecord> {
    fn accept(&mut self, record: FileRecord) -> Result<()> {
        self.push(record);
        Ok(())
    }
}

/// Blocks while the channel is full.
impl RecordSink for Sender<FileRecord> {
    fn accept(&mut self, record: FileRecord) -> Result<()> {
        self.send(record).map_err(|_| HoundError::ChannelClosed)
    }
}

/// Counters for one producer run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkStats {
    pub entries: u64,
    pub directories: u64,
    pub errors: u64,
}

impl WalkStats {
    fn tally(&mut self, record: &FileRecord) {
        self.entries += 1;
        match &record.entry {
            Some(entry) if entry.kind == EntryKind::Directory => self.directories += 1,
            Some(_) => {}
            None => self.errors += 1,
        }
    }
}

impl fmt::Display for WalkStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Scanned {} entries ({} directories, {} errors)",
            self.entries, self.directories, self.errors
        )
    }
}
