//! Identity directory: the host's users and groups.
//!
//! Loads the passwd/group registries into in-memory tables once per run
//! and resolves numeric owner ids to names for the entry inspector.

pub mod registry;
pub mod resolver;

pub use registry::{load_groups, load_users, Group, User};
pub use resolver::NameResolver;
