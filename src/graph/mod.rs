//! Permission graph module.
//!
//! Provides the graph data model, the builder that turns scanned
//! records into nodes and edges, and a petgraph-backed query engine.

pub mod builder;
pub mod engine;
pub mod types;

pub use builder::{build_graph, GraphBuilder};
pub use engine::{AccessGraph, EscalationPath, GraphStats};
pub use types::{
    group_id, inode_id, user_id, Connection, Edge, EdgeKind, Graph, GraphEnvelope, Node, NodeKind,
    OTHER_ID,
};
