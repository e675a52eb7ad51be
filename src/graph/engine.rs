//! Access-path queries over a finished permission graph.
//!
//! Loads a `Graph` into petgraph so consumers can walk it: per-kind
//! statistics, who holds a given right on an entry, and which actors can
//! rewrite an entry that executes as another identity.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use tracing::debug;

use super::types::*;

/// Data stored in a petgraph node.
#[derive(Debug, Clone)]
pub struct NodeData {
    pub id: String,
    pub kind: Option<NodeKind>,
    pub title: Option<String>,
    /// Referenced by an edge but absent from the node list (for example
    /// a file owned by a uid with no passwd entry).
    pub placeholder: bool,
}

/// Graph statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub users: usize,
    pub groups: usize,
    pub filesystem_nodes: usize,
    pub placeholders: usize,
    pub edges_by_kind: BTreeMap<EdgeKind, usize>,
}

impl fmt::Display for GraphStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} nodes ({} users, {} groups, {} entries, {} unresolved), {} edges",
            self.total_nodes,
            self.users,
            self.groups,
            self.filesystem_nodes,
            self.placeholders,
            self.total_edges
        )?;
        for (kind, count) in &self.edges_by_kind {
            write!(f, "\n  {:<10} {}", kind.to_string(), count)?;
        }
        Ok(())
    }
}

/// An actor able to modify an entry that runs as a different identity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct EscalationPath {
    /// User, group, or `uid-other` holding `CanWrite`.
    pub actor: String,
    /// Group through which `actor` holds the write grant, if indirect.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub via: Option<String>,
    /// Entry node id.
    pub file: String,
    pub path: String,
    /// Identity the entry executes as.
    pub runs_as: String,
}

impl fmt::Display for EscalationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.actor)?;
        if let Some(via) = &self.via {
            write!(f, " (via {})", via)?;
        }
        write!(f, " --CanWrite--> {} --ExecuteAs--> {}", self.path, self.runs_as)
    }
}

/// Queryable, petgraph-backed view of a `Graph`.
pub struct AccessGraph {
    graph: DiGraph<NodeData, EdgeKind>,
    index: HashMap<String, NodeIndex>,
}

impl AccessGraph {
    pub fn from_graph(source: &Graph) -> Self {
        let mut access = Self {
            graph: DiGraph::with_capacity(source.nodes.len(), source.edges.len()),
            index: HashMap::with_capacity(source.nodes.len()),
        };

        for node in &source.nodes {
            if access.index.contains_key(&node.id) {
                continue;
            }
            let idx = access.graph.add_node(NodeData {
                id: node.id.clone(),
                kind: node.kind(),
                title: node.title.clone(),
                placeholder: false,
            });
            access.index.insert(node.id.clone(), idx);
        }

        for edge in &source.edges {
            let from = access.node_or_placeholder(&edge.start.value);
            let to = access.node_or_placeholder(&edge.end.value);
            access.graph.add_edge(from, to, edge.kind);
        }

        debug!(
            nodes = access.graph.node_count(),
            edges = access.graph.edge_count(),
            "access graph loaded"
        );
        access
    }

    fn node_or_placeholder(&mut self, id: &str) -> NodeIndex {
        if let Some(&idx) = self.index.get(id) {
            return idx;
        }
        let idx = self.graph.add_node(NodeData {
            id: id.to_string(),
            kind: None,
            title: None,
            placeholder: true,
        });
        self.index.insert(id.to_string(), idx);
        idx
    }

    pub fn node(&self, id: &str) -> Option<&NodeData> {
        self.index.get(id).map(|&idx| &self.graph[idx])
    }

    pub fn stats(&self) -> GraphStats {
        let mut stats = GraphStats {
            total_nodes: self.graph.node_count(),
            total_edges: self.graph.edge_count(),
            edges_by_kind: EdgeKind::ALL.into_iter().map(|kind| (kind, 0)).collect(),
            ..GraphStats::default()
        };

        for node in self.graph.node_weights() {
            match node.kind {
                _ if node.placeholder => stats.placeholders += 1,
                Some(NodeKind::User) => stats.users += 1,
                Some(NodeKind::Group) => stats.groups += 1,
                Some(_) => stats.filesystem_nodes += 1,
                None => {}
            }
        }
        for kind in self.graph.edge_weights() {
            *stats.edges_by_kind.entry(*kind).or_default() += 1;
        }
        stats
    }

    /// Distinct actor ids with an edge of `kind` into node `id`.
    pub fn actors_with(&self, id: &str, kind: EdgeKind) -> Vec<&str> {
        let Some(&idx) = self.index.get(id) else {
            return Vec::new();
        };
        let actors: BTreeSet<&str> = self
            .graph
            .edges_directed(idx, Direction::Incoming)
            .filter(|edge| *edge.weight() == kind)
            .map(|edge| self.graph[edge.source()].id.as_str())
            .collect();
        actors.into_iter().collect()
    }

    /// Users with an `InGroup` edge into group `id`.
    pub fn members_of(&self, id: &str) -> Vec<&str> {
        self.actors_with(id, EdgeKind::InGroup)
    }

    /// Every (actor, entry, identity) triple where the actor can write an
    /// entry that executes as a different identity. Group grants are also
    /// expanded to the group's members.
    pub fn escalation_paths(&self) -> Vec<EscalationPath> {
        let mut paths = BTreeSet::new();

        for edge in self.graph.edge_references() {
            if *edge.weight() != EdgeKind::ExecuteAs {
                continue;
            }
            let file = &self.graph[edge.source()];
            let runs_as = &self.graph[edge.target()];
            let path = file.title.clone().unwrap_or_else(|| file.id.clone());

            for writer in self.actors_with(&file.id, EdgeKind::CanWrite) {
                let mut candidates = vec![(writer, None)];
                if self.node(writer).and_then(|n| n.kind) == Some(NodeKind::Group) {
                    candidates.extend(self.members_of(writer).into_iter().map(|m| (m, Some(writer))));
                }

                for (actor, via) in candidates {
                    if actor == runs_as.id {
                        continue;
                    }
                    paths.insert(EscalationPath {
                        actor: actor.to_string(),
                        via: via.map(str::to_string),
                        file: file.id.clone(),
                        path: path.clone(),
                        runs_as: runs_as.id.clone(),
                    });
                }
            }
        }

        paths.into_iter().collect()
    }
}
