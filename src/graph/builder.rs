//! Graph builder: turns identity tables and scanned records into the
//! permission graph.
//!
//! Identity nodes and membership edges are emitted up front, then each
//! record contributes its node and edges in a fixed order: ownership,
//! owner/group/other permission bits, then setuid/setgid escalation.

use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

use super::types::*;
use crate::identity::{Group, User};
use crate::scan::mode::{allows, Access, Class, S_ISGID, S_ISUID};
use crate::scan::{EntryInfo, FileRecord};

/// Provenance of an `InGroup` edge, stored in its `source` property.
const MEMBERSHIP_GROUP_FILE: &str = "group_file";
const MEMBERSHIP_PRIMARY_GID: &str = "primary_gid";

/// Incrementally assembles a `Graph`.
pub struct GraphBuilder {
    graph: Graph,
    seen: HashSet<String>,
    files: usize,
    skipped: usize,
}

impl GraphBuilder {
    /// Start a graph with every group, user and the synthetic other actor.
    pub fn new(users: &[User], groups: &[Group]) -> Self {
        let mut builder = Self {
            graph: Graph::default(),
            seen: HashSet::new(),
            files: 0,
            skipped: 0,
        };

        let mut by_name: HashMap<&str, Vec<&User>> = HashMap::new();
        for user in users {
            by_name.entry(user.username.as_str()).or_default().push(user);
        }

        for group in groups {
            let gid = group_id(group.gid);
            builder.add_node(
                Node::new(&gid, NodeKind::Group)
                    .title(&group.name)
                    .property("name", &group.name),
            );

            for member in &group.members {
                for user in by_name.get(member.as_str()).into_iter().flatten() {
                    builder.graph.edges.push(
                        Edge::new(user_id(user.uid), &gid, EdgeKind::InGroup)
                            .property("source", MEMBERSHIP_GROUP_FILE),
                    );
                }
            }
        }

        // Primary-group edges are kept even when the group file already
        // lists the user: the two edges record different facts.
        for user in users {
            let uid = user_id(user.uid);
            builder.add_node(
                Node::new(&uid, NodeKind::User)
                    .title(&user.username)
                    .property("name", &user.username)
                    .property("shell", &user.shell)
                    .property("home", &user.home)
                    .property("gid", user.gid.to_string()),
            );
            builder.graph.edges.push(
                Edge::new(uid, group_id(user.gid), EdgeKind::InGroup)
                    .property("source", MEMBERSHIP_PRIMARY_GID),
            );
        }

        builder.add_node(
            Node::new(OTHER_ID, NodeKind::User)
                .title("Other")
                .description(
                    "This is used for all other users that are not the owner or in the group for a specific file",
                ),
        );

        debug!(
            users = users.len(),
            groups = groups.len(),
            edges = builder.graph.edges.len(),
            "identity nodes added"
        );
        builder
    }

    /// Add one scanned entry. Records without an inode are skipped.
    pub fn add_record(&mut self, record: &FileRecord) {
        let (Some(entry), Some(inode)) = (record.entry.as_ref(), record.inode()) else {
            self.skipped += 1;
            return;
        };
        self.files += 1;

        let file = inode_id(inode);
        let owner = user_id(entry.uid);
        let group = group_id(entry.gid);

        self.add_node(file_node(&file, &record.path, entry));

        let edges = &mut self.graph.edges;
        edges.push(Edge::new(&owner, &file, EdgeKind::Owns));
        edges.push(Edge::new(&group, &file, EdgeKind::Owns));

        for (class, actor) in [
            (Class::Owner, owner.as_str()),
            (Class::Group, group.as_str()),
            (Class::Other, OTHER_ID),
        ] {
            for access in Access::ALL {
                if allows(entry.mode, class, access) {
                    edges.push(Edge::new(actor, &file, EdgeKind::from(access)));
                }
            }
        }

        // A set-id bit without the matching execute bit cannot be exercised.
        if entry.mode & S_ISUID != 0 && allows(entry.mode, Class::Owner, Access::Execute) {
            edges.push(Edge::new(&file, owner, EdgeKind::ExecuteAs));
        }
        if entry.mode & S_ISGID != 0 && allows(entry.mode, Class::Group, Access::Execute) {
            edges.push(Edge::new(&file, group, EdgeKind::ExecuteAs));
        }
    }

    pub fn finish(self) -> Graph {
        info!(
            nodes = self.graph.nodes.len(),
            edges = self.graph.edges.len(),
            files = self.files,
            skipped = self.skipped,
            "graph built"
        );
        self.graph
    }

    /// Push a node unless its ID is already present (first one wins).
    fn add_node(&mut self, node: Node) {
        if self.seen.insert(node.id.clone()) {
            self.graph.nodes.push(node);
        } else {
            debug!(id = %node.id, "duplicate node id, keeping first");
        }
    }
}

fn file_node(id: &str, path: &str, entry: &EntryInfo) -> Node {
    Node::new(id, NodeKind::from(entry.kind))
        .title(path)
        .property("name", path)
        .property("type", entry.kind.as_str())
        .property("mode_string", &entry.mode_string)
        .property("mode_octal", &entry.mode_octal)
        .property("uid", user_id(entry.uid))
        .property("owner", &entry.user)
        .property("gid", group_id(entry.gid))
        .property("group", &entry.group)
        .property("is_sym_link", entry.is_symlink.to_string())
        .property("link_target", &entry.link_target)
        .property("size", entry.size.to_string())
        .property("inode", entry.inode.to_string())
        .property("mod_time", entry.mod_time.to_rfc3339())
        .property("acl", entry.acl.to_string())
}

/// Build the complete graph, draining `records` until the stream ends.
pub fn build_graph<I>(users: &[User], groups: &[Group], records: I) -> Graph
where
    I: IntoIterator<Item = FileRecord>,
{
    let mut builder = GraphBuilder::new(users, groups);
    for record in records {
        builder.add_record(&record);
    }
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::{mode_octal, mode_string, EntryKind};
    use chrono::{DateTime, Utc};

    fn user(name: &str, uid: u32, gid: u32) -> User {
        User {
            username: name.to_string(),
            uid,
            gid,
            home: format!("/home/{}", name),
            shell: "/bin/sh".to_string(),
        }
    }

    fn group(name: &str, gid: u32, members: &[&str]) -> Group {
        Group {
            name: name.to_string(),
            gid,
            members: members.iter().map(|m| m.to_string()).collect(),
        }
    }

    fn record(path: &str, inode: u64, mode: u32, uid: u32, gid: u32) -> FileRecord {
        FileRecord::ok(
            path,
            EntryInfo {
                kind: EntryKind::File,
                mode,
                mode_string: mode_string(mode),
                mode_octal: mode_octal(mode),
                uid,
                gid,
                user: String::new(),
                group: String::new(),
                size: 0,
                inode,
                mod_time: DateTime::<Utc>::default(),
                is_symlink: false,
                link_target: String::new(),
                acl: false,
            },
        )
    }

    fn edge_summary(graph: &Graph, file: &str) -> Vec<(String, EdgeKind, String)> {
        graph
            .edges
            .iter()
            .filter(|e| e.start.value == file || e.end.value == file)
            .map(|e| (e.start.value.clone(), e.kind, e.end.value.clone()))
            .collect()
    }

    #[test]
    fn test_setuid_root_binary() {
        let graph = build_graph(&[], &[], vec![record("/usr/bin/passwd", 99, 0o4755, 0, 0)]);
        let file = "inode-99".to_string();
        let s = |v: &str| v.to_string();

        assert_eq!(
            edge_summary(&graph, &file),
            vec![
                (s("uid-0"), EdgeKind::Owns, file.clone()),
                (s("gid-0"), EdgeKind::Owns, file.clone()),
                (s("uid-0"), EdgeKind::CanRead, file.clone()),
                (s("uid-0"), EdgeKind::CanWrite, file.clone()),
                (s("uid-0"), EdgeKind::CanExecute, file.clone()),
                (s("gid-0"), EdgeKind::CanRead, file.clone()),
                (s("gid-0"), EdgeKind::CanExecute, file.clone()),
                (s(OTHER_ID), EdgeKind::CanRead, file.clone()),
                (s(OTHER_ID), EdgeKind::CanExecute, file.clone()),
                (file.clone(), EdgeKind::ExecuteAs, s("uid-0")),
            ]
        );

        let node = graph.node("inode-99").unwrap();
        assert_eq!(node.kind(), Some(NodeKind::File));
        assert_eq!(node.title.as_deref(), Some("/usr/bin/passwd"));
        assert_eq!(node.properties["mode_string"], "rwsr-xr-x");
        assert_eq!(node.properties["mode_octal"], "04755");
        assert_eq!(node.properties["uid"], "uid-0");
    }

    #[test]
    fn test_setuid_without_execute_has_no_execute_as() {
        let graph = build_graph(&[], &[], vec![record("/tmp/odd", 5, 0o4644, 1000, 1000)]);
        assert!(!graph.edges.iter().any(|e| e.kind == EdgeKind::ExecuteAs));
    }

    #[test]
    fn test_setgid_group_execute() {
        let graph = build_graph(&[], &[], vec![record("/usr/bin/wall", 6, 0o2755, 0, 5)]);
        let escalations: Vec<_> = graph
            .edges
            .iter()
            .filter(|e| e.kind == EdgeKind::ExecuteAs)
            .collect();
        assert_eq!(escalations.len(), 1);
        assert_eq!(escalations[0].start.value, "inode-6");
        assert_eq!(escalations[0].end.value, "gid-5");
    }

    #[test]
    fn test_both_set_id_bits_order() {
        let graph = build_graph(&[], &[], vec![record("/opt/x", 8, 0o6750, 3, 4)]);
        let ends: Vec<_> = graph
            .edges_from("inode-8")
            .map(|e| e.end.value.as_str())
            .collect();
        assert_eq!(ends, vec!["uid-3", "gid-4"]);
    }

    #[test]
    fn test_identity_nodes_and_membership() {
        let users = vec![user("alice", 1000, 1000), user("bob", 1001, 1001)];
        let groups = vec![
            group("alice", 1000, &["alice"]),
            group("wheel", 10, &["alice", "ghost"]),
        ];
        let graph = build_graph(&users, &groups, Vec::new());

        let ids: Vec<_> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["gid-1000", "gid-10", "uid-1000", "uid-1001", OTHER_ID]);

        let alice_edges: Vec<_> = graph
            .edges_from("uid-1000")
            .map(|e| (e.end.value.as_str(), e.properties["source"].as_str()))
            .collect();
        // Listed in group 1000 and primary gid 1000: both edges survive.
        assert_eq!(
            alice_edges,
            vec![
                ("gid-1000", MEMBERSHIP_GROUP_FILE),
                ("gid-10", MEMBERSHIP_GROUP_FILE),
                ("gid-1000", MEMBERSHIP_PRIMARY_GID),
            ]
        );

        let bob = graph.node("uid-1001").unwrap();
        assert_eq!(bob.properties["gid"], "1001");
        assert_eq!(bob.properties["home"], "/home/bob");

        let other = graph.node(OTHER_ID).unwrap();
        assert_eq!(other.title.as_deref(), Some("Other"));
        assert!(other.description.is_some());
    }

    #[test]
    fn test_error_records_skipped() {
        let records = vec![
            FileRecord::failed("/root/.ssh", "permission denied"),
            record("/zero", 0, 0o644, 0, 0),
            record("/ok", 3, 0o600, 0, 0),
        ];
        let graph = build_graph(&[], &[], records);

        let files: Vec<_> = graph
            .nodes
            .iter()
            .filter(|n| n.kind().is_some_and(|k| k.is_filesystem()))
            .collect();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].id, "inode-3");
        assert!(graph.edges.iter().all(|e| e.end.value != "inode-0"));
    }

    #[test]
    fn test_record_order_independent() {
        let records = vec![
            record("/a", 1, 0o755, 0, 0),
            record("/b", 2, 0o640, 1000, 100),
            record("/c", 3, 0o4711, 0, 0),
        ];
        let mut reversed = records.clone();
        reversed.reverse();

        let canonical = |graph: Graph| {
            let mut nodes: Vec<_> = graph
                .nodes
                .iter()
                .map(|n| serde_json::to_string(n).unwrap())
                .collect();
            let mut edges: Vec<_> = graph
                .edges
                .iter()
                .map(|e| serde_json::to_string(e).unwrap())
                .collect();
            nodes.sort();
            edges.sort();
            (nodes, edges)
        };

        assert_eq!(
            canonical(build_graph(&[], &[], records)),
            canonical(build_graph(&[], &[], reversed))
        );
    }

    #[test]
    fn test_hard_links_keep_one_node_all_edges() {
        let records = vec![record("/a", 7, 0o644, 0, 0), record("/b", 7, 0o644, 0, 0)];
        let graph = build_graph(&[], &[], records);

        assert_eq!(graph.nodes.iter().filter(|n| n.id == "inode-7").count(), 1);
        assert_eq!(graph.node("inode-7").unwrap().title.as_deref(), Some("/a"));
        assert_eq!(graph.edges_to("inode-7").filter(|e| e.kind == EdgeKind::Owns).count(), 4);
    }

    #[test]
    fn test_drains_channel() {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let producer = std::thread::spawn(move || {
            for inode in 1..=5 {
                tx.send(record("/f", inode, 0o600, 0, 0)).unwrap();
            }
        });
        let graph = build_graph(&[], &[], rx);
        producer.join().unwrap();

        assert_eq!(graph.nodes.len(), 6);
    }
}
