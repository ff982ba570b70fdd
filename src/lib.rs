//! Live force-directed view of a streaming network topology.
//!
//! [`graph::GraphModel`] holds the authoritative node/link sets,
//! [`layout::LayoutEngine`] assigns positions with a charge/spring simulation,
//! and [`scene::SceneReconciler`] keeps id-keyed render entries in step with
//! both. [`session::GraphSession`] wires the three together on one thread.

pub mod feed;
pub mod graph;
pub mod layout;
pub mod scene;
pub mod session;
pub mod util;
