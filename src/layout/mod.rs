//! The graph state engine: clusters of rendered nodes, the edges between
//! them, the hierarchy used to reroute edges, and the DOT serialization that
//! is handed to a renderer.

pub mod appearance;
pub mod cluster;
pub mod dot_writer;
pub mod graph_state;
pub mod hierarchy;
pub mod renderer;

pub use appearance::{resolve_appearance, tint_symbol, AppearanceDefaults};
pub use cluster::{Cluster, Node};
pub use graph_state::{Edge, EdgeGroup, GraphState};
pub use hierarchy::{HierarchyIndex, VisibleSet, MAX_ANCESTOR_HOPS};
pub use renderer::{DotFileRenderer, GraphRenderer, RecordingRenderer, RenderLog, TransitionConfig};
