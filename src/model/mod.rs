mod demo;
mod graph;
mod normalize;

pub use demo::demo_graph;
pub use graph::{DEFAULT_NODE_RADIUS, GraphState, Group, Link, LinkKind, Node};
pub use normalize::{
    fallback_avatar, link_from_value, node_from_value, normalize_snapshot, note_from_value,
};
