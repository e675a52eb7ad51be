//! Alternate producer: inspect newline-separated paths from a reader.

use std::ffi::OsStr;
use std::io::BufRead;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use tracing::{info, warn};

use super::inspect::Inspector;
use super::{RecordSink, WalkStats};
use crate::error::Result;

/// Inspect every non-blank line of `reader` as a path.
///
/// Lines are raw bytes, so paths that are not UTF-8 pass through intact.
/// A read error ends input the same way EOF does.
pub fn read_paths<R: BufRead>(
    reader: R,
    inspector: &Inspector,
    sink: &mut impl RecordSink,
) -> Result<WalkStats> {
    let mut stats = WalkStats::default();

    for line in reader.split(b'\n') {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "stopping path input after read error");
                break;
            }
        };
        let path = line.trim_ascii();
        if path.is_empty() {
            continue;
        }

        let record = inspector.inspect(Path::new(OsStr::from_bytes(path)));
        stats.tally(&record);
        sink.accept(record)?;
    }

    info!(%stats, "path input finished");
    Ok(stats)
}
