//! An AVL tree whose nodes carry their subtree size, so range counts are
//! answered in logarithmic time.

mod alloc;
pub mod command;
mod node;
mod root;
mod set;

use std::ptr::NonNull;

pub use command::{Command, CommandError};

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum ComingFrom {
    Left,
    Right,
}

pub(crate) type NodePtr<K> = Option<NonNull<Node<K>>>;

pub(crate) trait NodePtrExt {
    type Key;

    fn balance_factor(&self) -> isize;
    fn height(&self) -> usize;
    fn left(&self) -> NodePtr<Self::Key>;
    fn parent(&self) -> NodePtr<Self::Key>;
    fn right(&self) -> NodePtr<Self::Key>;
    fn set_left(&mut self, left: NodePtr<Self::Key>);
    fn set_parent(&mut self, parent: NodePtr<Self::Key>);
    fn set_right(&mut self, right: NodePtr<Self::Key>);
    fn size(&self) -> usize;
    fn update(&mut self);
}

impl<K> NodePtrExt for NodePtr<K> {
    type Key = K;

    #[inline(always)]
    fn balance_factor(&self) -> isize {
        self.map_or(0, |v| unsafe { v.as_ref() }.balance_factor())
    }

    #[inline(always)]
    fn height(&self) -> usize {
        self.map_or(0, |v| unsafe { v.as_ref() }.height)
    }

    #[inline(always)]
    fn left(&self) -> NodePtr<Self::Key> {
        self.and_then(|v| unsafe { v.as_ref() }.left)
    }

    #[inline(always)]
    fn parent(&self) -> NodePtr<Self::Key> {
        self.and_then(|v| unsafe { v.as_ref() }.parent)
    }

    #[inline(always)]
    fn right(&self) -> NodePtr<Self::Key> {
        self.and_then(|v| unsafe { v.as_ref() }.right)
    }

    #[inline(always)]
    fn set_left(&mut self, left: NodePtr<Self::Key>) {
        if let Some(node) = self {
            unsafe { node.as_mut() }.left = left;
        }
    }

    #[inline(always)]
    fn set_parent(&mut self, parent: NodePtr<Self::Key>) {
        if let Some(node) = self {
            unsafe { node.as_mut() }.parent = parent;
        }
    }

    #[inline(always)]
    fn set_right(&mut self, right: NodePtr<Self::Key>) {
        if let Some(node) = self {
            unsafe { node.as_mut() }.right = right;
        }
    }

    #[inline(always)]
    fn size(&self) -> usize {
        self.map_or(0, |v| unsafe { v.as_ref() }.size)
    }

    #[inline(always)]
    fn update(&mut self) {
        if let Some(node) = self {
            unsafe { node.as_mut() }.update();
        }
    }
}

pub(crate) struct Node<K> {
    // Non-owning; None only for the root.
    pub(crate) parent: NodePtr<K>,
    // Owning child pointers.
    pub(crate) left: NodePtr<K>,
    pub(crate) right: NodePtr<K>,
    // A leaf has height 1; an absent subtree has height 0.
    pub(crate) height: usize,
    // Number of nodes in the subtree rooted here, itself included.
    pub(crate) size: usize,
    pub(crate) key: K,
}

/// The owner of the node graph: rebalancing and the order-statistics
/// primitives live here.
pub(crate) struct Root<K> {
    root: NodePtr<K>,
}

/// An ordered set of unique keys answering `(low, high]` range counts in
/// `O(log n)`.
///
/// # Examples
///
/// ```
/// use avlcount::AvlSet;
///
/// let mut set = AvlSet::new();
/// set.insert(5);
/// set.insert(10);
/// set.insert(15);
///
/// assert_eq!(set.count_in_range(&5, &10), 1);
/// assert_eq!(set.count_in_range(&0, &15), 3);
/// assert_eq!(set.count_in_range(&10, &10), 0);
/// ```
pub struct AvlSet<K> {
    root: Root<K>,
}
