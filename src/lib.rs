//! # permhound
//!
//! Filesystem permission graphs for access-path analysis.
//!
//! permhound walks a subtree, reads the host's users and groups, and emits a
//! directed graph: who owns each entry, who can read, write or execute it,
//! who belongs to which group, and which entries run as another identity
//! through setuid/setgid.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use permhound::pipeline::{Identities, Pipeline, Source};
//! use permhound::{Inspector, ScanConfig};
//! use std::path::PathBuf;
//!
//! let config = ScanConfig::default();
//! let identities = Identities::load(&config)?;
//!
//! let source = Source::Walk { root: PathBuf::from("/usr/bin"), max_depth: 0 };
//! let (graph, stats) = Pipeline::new(source, Inspector::from_config(&config, false, true))
//!     .capacity(config.channel_capacity)
//!     .graph(&identities)?;
//!
//! println!("{} -> {} nodes, {} edges", stats, graph.nodes.len(), graph.edges.len());
//! # Ok::<(), permhound::HoundError>(())
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod graph;
pub mod identity;
pub mod output;
pub mod pipeline;
pub mod scan;

// Re-exports for convenience
pub use config::ScanConfig;
pub use error::{HoundError, Result};

// Graph re-exports
pub use graph::{build_graph, AccessGraph, Edge, EdgeKind, Graph, GraphEnvelope, Node, NodeKind};
pub use identity::{load_groups, load_users, Group, User};
pub use scan::{inspect, walk, FileRecord, Inspector, RecordSink, WalkStats};

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::{MetadataExt, PermissionsExt};
    use std::path::Path;

    fn registry(dir: &Path, uid: u32, gid: u32) -> ScanConfig {
        let passwd = dir.join("passwd");
        let group = dir.join("group");
        fs::write(
            &passwd,
            format!("# fixture\nowner:x:{}:{}:Owner:/home/owner:/bin/sh\nalice:x:4100:4100::/home/alice:/bin/sh\n", uid, gid),
        )
        .unwrap();
        fs::write(&group, format!("owners:x:{}:alice\n", gid)).unwrap();
        ScanConfig {
            passwd_path: passwd,
            group_path: group,
            system_lookup: false,
            ..ScanConfig::default()
        }
    }

    #[test]
    fn test_scan_to_graph() {
        let registries = tempfile::tempdir().unwrap();
        let tree = tempfile::tempdir().unwrap();
        let tool = tree.path().join("tool");
        fs::write(&tool, b"#!/bin/sh\n").unwrap();
        fs::set_permissions(&tool, fs::Permissions::from_mode(0o4757)).unwrap();

        let meta = fs::metadata(&tool).unwrap();
        let config = registry(registries.path(), meta.uid(), meta.gid());
        let identities = pipeline::Identities::load(&config).unwrap();

        let source = pipeline::Source::Walk {
            root: tree.path().to_path_buf(),
            max_depth: -1,
        };
        let (graph, stats) = pipeline::Pipeline::new(source, Inspector::from_config(&config, false, false))
            .capacity(config.channel_capacity)
            .graph(&identities)
            .unwrap();
        assert_eq!(stats.entries, 2);

        let file = graph::inode_id(meta.ino());
        let owner = graph::user_id(meta.uid());
        let node = graph.node(&file).unwrap();
        assert_eq!(node.title.as_deref(), Some(&*tool.to_string_lossy()));
        assert_eq!(node.properties["mode_string"], "rwsr-xrwx");

        let execute_as: Vec<_> = graph
            .edges_from(&file)
            .filter(|e| e.kind == EdgeKind::ExecuteAs)
            .map(|e| e.end.value.clone())
            .collect();
        assert_eq!(execute_as, vec![owner.clone()]);

        // World-writable setuid entry: "other" can rewrite what runs as the owner.
        let paths = AccessGraph::from_graph(&graph).escalation_paths();
        assert!(paths
            .iter()
            .any(|p| p.actor == graph::OTHER_ID && p.file == file && p.runs_as == owner));
    }

    #[test]
    fn test_graph_envelope_json() {
        let graph = build_graph(&[], &[], Vec::new());
        let json = serde_json::to_value(GraphEnvelope { graph }).unwrap();
        assert_eq!(json["graph"]["nodes"][0]["id"], graph::OTHER_ID);
        assert!(json["graph"]["edges"].as_array().unwrap().is_empty());
    }
}
