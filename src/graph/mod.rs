mod error;
mod model;

pub use error::GraphError;
pub use model::{Delta, DeltaReport, GraphModel, Link, LinkSpec, Node, NodeSpec};
