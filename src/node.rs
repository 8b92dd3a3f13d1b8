use std::{cmp, ptr::NonNull};

use crate::ComingFrom;

use super::{Node, NodePtrExt};

impl<K> Node<K> {
    pub(crate) fn new(key: K) -> Self {
        Node {
            parent: None,
            left: None,
            right: None,
            height: 1,
            size: 1,
            key,
        }
    }

    #[inline(always)]
    pub(crate) fn balance_factor(&self) -> isize {
        self.left.height() as isize - self.right.height() as isize
    }

    #[inline(always)]
    pub(crate) fn is_unbalanced(&self) -> bool {
        self.left.height().abs_diff(self.right.height()) > 1
    }

    /// Hangs a detached node under `parent` on the given side.
    ///
    /// # Safety
    ///
    /// Both pointers must be live nodes of the same tree, and the slot on
    /// `direction` must be empty.
    #[inline(always)]
    pub(crate) unsafe fn link(
        mut node: NonNull<Self>,
        mut parent: NonNull<Self>,
        direction: ComingFrom,
    ) {
        // SAFETY: delegated to the caller. We finish with [1] the node before
        // [2] taking a &mut to the parent.
        let node_ref = unsafe { node.as_mut() };
        node_ref.parent = Some(parent); // [1]
        node_ref.left = None;
        node_ref.right = None;
        let parent = unsafe { parent.as_mut() }; // [2]
        match direction {
            ComingFrom::Left => parent.left = Some(node),
            ComingFrom::Right => parent.right = Some(node),
        };
    }

    /// Recomputes height and size from the children.
    #[inline(always)]
    pub(crate) fn update(&mut self) {
        self.height = 1 + cmp::max(self.left.height(), self.right.height());
        self.size = 1 + self.left.size() + self.right.size();
    }

    /// Walks down the left spine.
    #[inline(always)]
    pub(crate) fn leftmost(&self) -> NonNull<Node<K>> {
        let mut node = NonNull::from(self);
        // SAFETY: every child pointer reachable from self is a live node.
        while let Some(left) = unsafe { node.as_ref() }.left {
            node = left;
        }
        node
    }

    /// Walks down the right spine.
    #[inline(always)]
    pub(crate) fn rightmost(&self) -> NonNull<Node<K>> {
        let mut node = NonNull::from(self);
        // SAFETY: every child pointer reachable from self is a live node.
        while let Some(right) = unsafe { node.as_ref() }.right {
            node = right;
        }
        node
    }

    /// Descends to a leaf, preferring left children: the first node of a
    /// post-order walk.
    #[inline(always)]
    pub(crate) fn left_deepest_node(&self) -> NonNull<Node<K>> {
        let mut node = NonNull::from(self);
        // SAFETY: every child pointer reachable from self is a live node.
        loop {
            let node_ref = unsafe { node.as_ref() };
            match node_ref.left.or(node_ref.right) {
                Some(next) => node = next,
                None => break,
            }
        }
        node
    }
}
