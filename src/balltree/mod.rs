//! Ball trees: binary trees where every node is labeled by a sphere enclosing its subtree.
//!
//! Two forms share one query engine, [`BallTreeIndex`]:
//!
//! - [`DynamicBallTree`] is stored in an arena and supports inserting and removing single
//!   items, plus an optional bottom-up refinement pass.
//! - [`StaticBallTree`] is built once by a [`StaticBallTreeBuilder`] with one of several
//!   [`Algorithm`]s and stored as a compact pre-order array.

mod builder;
mod dynamic;
mod flatten;
mod index;
mod policy;
mod region;
pub mod split;
mod r#trait;
mod traversal;
mod util;

pub use builder::StaticBallTreeBuilder;
pub use dynamic::{DynNode, DynamicBallTree, NodeKind};
pub use index::{StaticBallTree, StaticBallTreeRef, StaticNode, TreeInfo};
pub use policy::{Algorithm, AxisSelection, ConstructionPolicy, InsertFavor};
pub use r#trait::{BallTreeIndex, Neighbor, QueryScratch};
pub use region::{Overlap, QueryRegion};
pub use traversal::{Leaves, Node};
