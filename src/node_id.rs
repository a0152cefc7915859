//! Typed arena indices shared by the dynamic and static trees.

use std::fmt;

/// Index of a node inside a tree's node array.
///
/// For a [`DynamicBallTree`][crate::balltree::DynamicBallTree] this is a slot in its arena; for
/// a [`StaticBallTree`][crate::balltree::StaticBallTree] it is the node's pre-order position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Sentinel marking an absent link.
    pub const NULL: NodeId = NodeId(u32::MAX);

    /// The id of the arena slot `index`.
    ///
    /// ## Panics
    ///
    /// - If `index` is `u32::MAX` or larger. A tree never holds that many nodes.
    #[inline]
    pub const fn new(index: usize) -> Self {
        assert!(index < u32::MAX as usize, "node index out of range");
        Self(index as u32)
    }

    /// The position of this node in its array.
    #[inline]
    pub const fn get(self) -> usize {
        self.0 as usize
    }

    /// Returns `true` for [`NodeId::NULL`].
    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == u32::MAX
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "NULL")
        } else {
            write!(f, "#{}", self.0)
        }
    }
}

#[cfg(test)]
mod test {
    use super::NodeId;

    #[test]
    fn null_is_default() {
        assert!(NodeId::default().is_null());
        assert!(!NodeId::new(0).is_null());
        assert_eq!(NodeId::new(17).get(), 17);
        assert_eq!(NodeId::NULL.to_string(), "NULL");
        assert_eq!(NodeId::new(3).to_string(), "#3");
    }

    #[test]
    #[should_panic(expected = "node index out of range")]
    fn sentinel_index_is_rejected() {
        NodeId::new(u32::MAX as usize);
    }
}
