//! Core types for the permission graph.
//!
//! Defines node kinds, edge kinds, and the node/edge records of the
//! graph envelope consumed by access-path analysis.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::scan::{Access, EntryKind};

/// ID of the synthetic actor standing for "everyone not owner or group".
pub const OTHER_ID: &str = "uid-other";

pub fn user_id(uid: u32) -> String {
    format!("uid-{}", uid)
}

pub fn group_id(gid: u32) -> String {
    format!("gid-{}", gid)
}

pub fn inode_id(inode: u64) -> String {
    format!("inode-{}", inode)
}

/// The kind of a node in the permission graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeKind {
    /// A user account, or the synthetic "other" actor.
    User,
    /// A group.
    Group,
    #[serde(rename = "file")]
    File,
    #[serde(rename = "directory")]
    Directory,
    #[serde(rename = "symlink")]
    Symlink,
    /// Devices, sockets, FIFOs.
    #[serde(rename = "other")]
    Other,
}

impl NodeKind {
    pub fn is_filesystem(&self) -> bool {
        !matches!(self, NodeKind::User | NodeKind::Group)
    }
}

impl From<EntryKind> for NodeKind {
    fn from(kind: EntryKind) -> Self {
        match kind {
            EntryKind::File => NodeKind::File,
            EntryKind::Directory => NodeKind::Directory,
            EntryKind::Symlink => NodeKind::Symlink,
            EntryKind::Other => NodeKind::Other,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::User => write!(f, "User"),
            NodeKind::Group => write!(f, "Group"),
            NodeKind::File => write!(f, "file"),
            NodeKind::Directory => write!(f, "directory"),
            NodeKind::Symlink => write!(f, "symlink"),
            NodeKind::Other => write!(f, "other"),
        }
    }
}

/// The kind of an edge (relationship) in the permission graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EdgeKind {
    /// User belongs to a group (User -> Group).
    InGroup,
    /// User or group owns an entry (User/Group -> File).
    Owns,
    /// Actor may read an entry (User/Group/Other -> File).
    CanRead,
    /// Actor may write an entry.
    CanWrite,
    /// Actor may execute (or traverse) an entry.
    CanExecute,
    /// Running the entry assumes an identity (File -> User/Group).
    ExecuteAs,
}

impl EdgeKind {
    pub const ALL: [EdgeKind; 6] = [
        EdgeKind::InGroup,
        EdgeKind::Owns,
        EdgeKind::CanRead,
        EdgeKind::CanWrite,
        EdgeKind::CanExecute,
        EdgeKind::ExecuteAs,
    ];
}

impl From<Access> for EdgeKind {
    fn from(access: Access) -> Self {
        match access {
            Access::Read => EdgeKind::CanRead,
            Access::Write => EdgeKind::CanWrite,
            Access::Execute => EdgeKind::CanExecute,
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeKind::InGroup => write!(f, "InGroup"),
            EdgeKind::Owns => write!(f, "Owns"),
            EdgeKind::CanRead => write!(f, "CanRead"),
            EdgeKind::CanWrite => write!(f, "CanWrite"),
            EdgeKind::CanExecute => write!(f, "CanExecute"),
            EdgeKind::ExecuteAs => write!(f, "ExecuteAs"),
        }
    }
}

/// A graph node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub kinds: Vec<NodeKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

impl Node {
    pub fn new(id: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            kinds: vec![kind],
            title: None,
            description: None,
            properties: BTreeMap::new(),
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn property(mut self, key: &str, value: impl Into<String>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    pub fn kind(&self) -> Option<NodeKind> {
        self.kinds.first().copied()
    }
}

/// One end of an edge. `match_by` is always `"id"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub match_by: String,
    pub value: String,
}

impl Connection {
    pub fn id(value: impl Into<String>) -> Self {
        Self {
            match_by: "id".to_string(),
            value: value.into(),
        }
    }
}

/// A graph edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub start: Connection,
    pub end: Connection,
    pub kind: EdgeKind,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

impl Edge {
    pub fn new(start: impl Into<String>, end: impl Into<String>, kind: EdgeKind) -> Self {
        Self {
            start: Connection::id(start),
            end: Connection::id(end),
            kind,
            properties: BTreeMap::new(),
        }
    }

    pub fn property(mut self, key: &str, value: impl Into<String>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }
}

/// Nodes are unique by ID; edges form a multiset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Graph {
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Edges leaving `id`, in generation order.
    pub fn edges_from<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.start.value == id)
    }

    /// Edges entering `id`, in generation order.
    pub fn edges_to<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.end.value == id)
    }
}

/// `{ "graph": { "nodes": [...], "edges": [...] } }`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEnvelope {
    pub graph: Graph,
}
