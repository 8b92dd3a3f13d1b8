use std::ptr::NonNull;

use crate::Node;

/// Allocates a detached leaf.
///
/// # Safety
///
/// It leaks; use with own_back.
pub(crate) unsafe fn leak_alloc_node<K>(key: K) -> NonNull<Node<K>> {
    NonNull::from(Box::leak(Box::new(Node::new(key))))
}

/// # Safety
///
/// It drops; use after leak_alloc_node, exactly once per node.
pub(crate) unsafe fn own_back<K>(current: NonNull<Node<K>>) -> Box<Node<K>> {
    unsafe { Box::from_raw(current.as_ptr()) }
}
