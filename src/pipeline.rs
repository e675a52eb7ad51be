//! Producer/consumer pipeline.
//!
//! Identity tables are loaded synchronously before anything else starts.
//! One thread then produces `FileRecord`s (tree walk or path list) into a
//! bounded channel while a second thread drains it. The producer owns the
//! only `Sender`; when it returns the channel closes and the consumer's
//! iteration ends. Both threads are joined before results are returned,
//! so every record is accounted for once `run` comes back.

use crossbeam_channel::{bounded, Receiver};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::thread;
use tracing::{debug, info};

use crate::config::ScanConfig;
use crate::error::{HoundError, Result};
use crate::graph::{build_graph, Graph};
use crate::identity::{load_groups, load_users, Group, User};
use crate::output::{collect_records, write_human, CollectionEnvelope};
use crate::scan::{read_paths, FileRecord, Inspector, WalkStats, Walker};

/// The host's users and groups, read once per run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identities {
    pub users: Vec<User>,
    pub groups: Vec<Group>,
}

impl Identities {
    /// Read both registries named in `config`. Either being unreadable is fatal.
    pub fn load(config: &ScanConfig) -> Result<Self> {
        let users = load_users(&config.passwd_path)?;
        let groups = load_groups(&config.group_path)?;
        info!(users = users.len(), groups = groups.len(), "identity tables loaded");
        Ok(Self { users, groups })
    }
}

/// Where records come from.
pub enum Source {
    /// Walk the subtree under `root`.
    Walk { root: PathBuf, max_depth: i64 },
    /// Inspect newline-separated paths.
    Paths(Box<dyn BufRead + Send>),
}

impl std::fmt::Debug for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Walk { root, max_depth } => f
                .debug_struct("Walk")
                .field("root", root)
                .field("max_depth", max_depth)
                .finish(),
            Source::Paths(_) => f.write_str("Paths"),
        }
    }
}

/// One scan run: a record source, the inspector applied to each path, and
/// the channel bound between producer and consumer.
#[derive(Debug)]
pub struct Pipeline {
    source: Source,
    inspector: Inspector,
    capacity: usize,
}

impl Pipeline {
    pub fn new(source: Source, inspector: Inspector) -> Self {
        Self {
            source,
            inspector,
            capacity: ScanConfig::default().channel_capacity,
        }
    }

    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Run the producer against `consume`, which drains the receiver on
    /// its own thread.
    ///
    /// Errors are returned only after both threads have finished. A
    /// consumer error wins over the producer's, since a consumer that gives
    /// up leaves the producer with nothing but a closed channel.
    pub fn run<T, F>(self, consume: F) -> Result<(T, WalkStats)>
    where
        F: FnOnce(Receiver<FileRecord>) -> Result<T> + Send,
        T: Send,
    {
        let Pipeline {
            source,
            inspector,
            capacity,
        } = self;
        let (tx, rx) = bounded::<FileRecord>(capacity);
        debug!(capacity, ?source, "pipeline starting");

        thread::scope(|scope| -> Result<(T, WalkStats)> {
            let producer = thread::Builder::new()
                .name("permhound-producer".to_string())
                .spawn_scoped(scope, move || {
                    let mut tx = tx;
                    match source {
                        Source::Walk { root, max_depth } => Walker::new(inspector)
                            .max_depth(max_depth)
                            .walk(&root, &mut tx),
                        Source::Paths(reader) => read_paths(reader, &inspector, &mut tx),
                    }
                })?;

            let consumer = thread::Builder::new()
                .name("permhound-consumer".to_string())
                .spawn_scoped(scope, move || consume(rx))?;

            let consumed = consumer.join();
            let produced = producer.join();

            let output = consumed.map_err(|_| HoundError::WorkerPanicked("consumer"))??;
            let stats = produced.map_err(|_| HoundError::WorkerPanicked("producer"))??;
            Ok((output, stats))
        })
    }

    /// Build the permission graph from every produced record.
    pub fn graph(self, identities: &Identities) -> Result<(Graph, WalkStats)> {
        self.run(|rx| Ok(build_graph(&identities.users, &identities.groups, rx)))
    }

    /// Collect every produced record, errors included, next to the identity tables.
    pub fn collection(self, identities: Identities) -> Result<(CollectionEnvelope, WalkStats)> {
        self.run(move |rx| Ok(collect_records(identities.users, identities.groups, rx)))
    }

    /// Stream one human-readable line per record into `out`.
    pub fn human<W: Write + Send>(self, out: W) -> Result<WalkStats> {
        let (written, stats) = self.run(move |rx| write_human(rx, out))?;
        debug!(lines = written, "human output written");
        Ok(stats)
    }
}
