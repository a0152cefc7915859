#![doc = include_str!("../README.md")]

pub mod balltree;
mod error;
mod geometry;
mod node_id;
mod r#type;

pub use error::{KdSearchError, Result};
pub use geometry::{Point, Rect, Sphere};
pub use node_id::NodeId;
pub use r#type::BallFloat;
