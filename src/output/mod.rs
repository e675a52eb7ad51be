//! Output envelopes and destinations.
//!
//! The graph is written as `{ "graph": {...} }`, the base collection as
//! `{ users, groups, file_system_items }`, and the human-readable form as
//! one tab-separated line per record.

use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::info;

use crate::error::Result;
use crate::identity::{Group, User};
use crate::scan::FileRecord;

/// Flat inventory of everything scanned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CollectionEnvelope {
    pub users: Vec<User>,
    pub groups: Vec<Group>,
    pub file_system_items: Vec<FileRecord>,
}

/// Drain `records` into a collection envelope, error records included.
pub fn collect_records<I>(users: Vec<User>, groups: Vec<Group>, records: I) -> CollectionEnvelope
where
    I: IntoIterator<Item = FileRecord>,
{
    CollectionEnvelope {
        users,
        groups,
        file_system_items: records.into_iter().collect(),
    }
}

/// Where output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Stdout,
    File(PathBuf),
}

impl Destination {
    /// Stdout, or `<base>.<extension>` in the working directory.
    pub fn new(stdout: bool, base: &str, extension: &str) -> Self {
        if stdout {
            Destination::Stdout
        } else {
            Destination::File(PathBuf::from(format!("{}.{}", base, extension)))
        }
    }

    pub fn open(&self) -> Result<Box<dyn Write + Send>> {
        Ok(match self {
            Destination::Stdout => Box::new(io::stdout()),
            Destination::File(path) => {
                info!(path = %path.display(), "writing output");
                Box::new(BufWriter::new(File::create(path)?))
            }
        })
    }

    pub fn is_stdout(&self) -> bool {
        matches!(self, Destination::Stdout)
    }
}

/// Pretty-printed JSON followed by a newline.
pub fn write_json<T: Serialize, W: Write>(value: &T, mut out: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut out, value)?;
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}

/// `path type mode uid gid user group size acl`, tab separated, with a
/// trailing `err:` column when the record carries an error.
pub fn human_line(record: &FileRecord) -> String {
    let mut line = match &record.entry {
        Some(e) => format!(
            "{}\t{}\t{}\tuid:{}\tgid:{}\tuser:{}\tgroup:{}\tsize:{}\tacl:{}",
            record.path, e.kind, e.mode_string, e.uid, e.gid, e.user, e.group, e.size, e.acl
        ),
        None => record.path.clone(),
    };
    if let Some(err) = &record.scan_error {
        line.push_str("\terr:");
        line.push_str(err);
    }
    line
}

/// Stream human-readable lines for every record.
pub fn write_human<I, W>(records: I, mut out: W) -> Result<u64>
where
    I: IntoIterator<Item = FileRecord>,
    W: Write,
{
    let mut count = 0;
    for record in records {
        writeln!(out, "{}", human_line(&record))?;
        count += 1;
    }
    out.flush()?;
    Ok(count)
}
