use std::{borrow::Borrow, cmp::Ordering::*, ptr::NonNull};

use log::trace;

use super::{ComingFrom, Node, NodePtr, NodePtrExt, Root, alloc};

impl<K> Default for Root<K> {
    fn default() -> Self {
        Root::new()
    }
}

// Public
impl<K> Root<K> {
    pub(crate) const fn new() -> Self {
        Root { root: None }
    }

    pub(crate) fn root(&self) -> NodePtr<K> {
        self.root
    }

    pub(crate) fn len(&self) -> usize {
        self.root.size()
    }

    pub(crate) fn height(&self) -> usize {
        self.root.height()
    }

    pub(crate) fn first(&self) -> NodePtr<K> {
        self.root.map(|n| unsafe { n.as_ref() }.leftmost())
    }

    pub(crate) fn last(&self) -> NodePtr<K> {
        self.root.map(|n| unsafe { n.as_ref() }.rightmost())
    }

    pub(crate) fn find<Q>(&self, key: &Q) -> NodePtr<K>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut node = self.root;
        while let Some(candidate) = node {
            let candidate = unsafe { candidate.as_ref() };
            match key.cmp(candidate.key.borrow()) {
                Equal => break,
                Greater => node = candidate.right,
                Less => node = candidate.left,
            }
        }
        node
    }

    /// Inserts `key` unless an equal key is already stored. Returns whether a
    /// node was created.
    pub(crate) fn insert(&mut self, key: K) -> bool
    where
        K: Ord,
    {
        let Some(mut candidate) = self.root else {
            // SAFETY: ownership is handed to the tree; freed by clear.
            self.root = Some(unsafe { alloc::leak_alloc_node(key) });
            return true;
        };

        let direction = loop {
            let candidate_ref = unsafe { candidate.as_ref() };
            let (next, direction) = match key.cmp(&candidate_ref.key) {
                Equal => return false,
                Greater => (candidate_ref.right, ComingFrom::Right),
                Less => (candidate_ref.left, ComingFrom::Left),
            };
            match next {
                Some(next) => candidate = next,
                None => break direction,
            }
        };

        // SAFETY: candidate is a live node whose slot on direction is empty.
        unsafe {
            let node = alloc::leak_alloc_node(key);
            Node::link(node, candidate, direction);
        }

        let parent = Some(candidate);
        self.fix_size(parent);
        if let Some(unbalanced) = self.fix_height(parent) {
            self.balance(unbalanced);
        }
        true
    }

    /// Releases every node, leaving the tree empty.
    pub(crate) fn clear(&mut self) {
        let Some(root) = self.root.take() else {
            return;
        };
        // Post-order: unhook each leaf from its parent before freeing it, so
        // the parent becomes a leaf in turn.
        let mut current = Some(unsafe { root.as_ref() }.left_deepest_node());
        while let Some(node) = current {
            let node_ref = unsafe { node.as_ref() };
            if node_ref.left.is_some() || node_ref.right.is_some() {
                current = Some(node_ref.left_deepest_node());
                continue;
            }
            let mut parent = node_ref.parent;
            if parent.left() == Some(node) {
                parent.set_left(None);
            } else {
                parent.set_right(None);
            }
            // SAFETY: node is unreachable from now on.
            drop(unsafe { alloc::own_back(node) });
            current = parent;
        }
    }
}

// Order statistics.
impl<K: Ord> Root<K> {
    /// The node holding the smallest key strictly greater than `bound`.
    pub(crate) fn upper_bound<Q>(&self, bound: &Q) -> NodePtr<K>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut best = None;
        let mut node = self.root;
        while let Some(candidate) = node {
            let candidate_ref = unsafe { candidate.as_ref() };
            match bound.cmp(candidate_ref.key.borrow()) {
                Less => {
                    best = node;
                    node = candidate_ref.left;
                }
                Equal | Greater => node = candidate_ref.right,
            }
        }
        best
    }

    /// The number of keys strictly less than `bound`'s key; every key when
    /// `bound` is None.
    pub(crate) fn count_less(&self, bound: NodePtr<K>) -> usize {
        let Some(bound) = bound else {
            return self.len();
        };
        let key = &unsafe { bound.as_ref() }.key;
        let mut count = 0;
        let mut node = self.root;
        while let Some(candidate) = node {
            let candidate = unsafe { candidate.as_ref() };
            if *key > candidate.key {
                count += candidate.left.size() + 1;
                node = candidate.right;
            } else {
                node = candidate.left;
            }
        }
        count
    }

    /// The zero-based rank of `key`, if stored.
    pub(crate) fn rank_of<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut rank = 0;
        let mut node = self.root;
        while let Some(candidate) = node {
            let candidate = unsafe { candidate.as_ref() };
            match key.cmp(candidate.key.borrow()) {
                Equal => return Some(rank + candidate.left.size()),
                Greater => {
                    rank += candidate.left.size() + 1;
                    node = candidate.right;
                }
                Less => node = candidate.left,
            }
        }
        None
    }
}

// Private

impl<K> Root<K> {
    /// Bumps the size of `node` and of each of its ancestors.
    fn fix_size(&mut self, mut node: NodePtr<K>) {
        while let Some(mut current) = node {
            let current = unsafe { current.as_mut() };
            current.size += 1;
            node = current.parent;
        }
    }

    /// Recomputes heights upward from `node`.
    ///
    /// Stops without a result as soon as a height is unchanged, since the path
    /// above is already correct. Stops with the node when its children's
    /// heights differ by more than one.
    fn fix_height(&mut self, mut node: NodePtr<K>) -> Option<NonNull<Node<K>>> {
        while let Some(mut current) = node {
            let current_ref = unsafe { current.as_mut() };
            let old_height = current_ref.height;
            current_ref.update();
            if current_ref.is_unbalanced() {
                return Some(current);
            }
            if current_ref.height == old_height {
                break;
            }
            node = current_ref.parent;
        }
        None
    }

    /// Restores the balance of `node`. Returns the new subtree root.
    fn balance(&mut self, node: NonNull<Node<K>>) -> NonNull<Node<K>> {
        let node_ptr: NodePtr<K> = Some(node);
        let factor = node_ptr.balance_factor();
        if factor > 1 {
            let left = node_ptr.left();
            if left.left().height() < left.right().height() {
                if let Some(left) = left {
                    /*
                     * Left-right case: straighten the zig-zag first.
                     *
                     *       n            n
                     *      /            /
                     *     l     -->    lr
                     *      \          /
                     *       lr       l
                     */
                    trace!("rebalance: left-right, size {}", node_ptr.size());
                    self.rotate_left(left);
                }
            } else {
                trace!("rebalance: left-left, size {}", node_ptr.size());
            }
            self.rotate_right(node)
        } else if factor < -1 {
            let right = node_ptr.right();
            if right.right().height() < right.left().height() {
                if let Some(right) = right {
                    /* Right-left case: mirror of the above. */
                    trace!("rebalance: right-left, size {}", node_ptr.size());
                    self.rotate_right(right);
                }
            } else {
                trace!("rebalance: right-right, size {}", node_ptr.size());
            }
            self.rotate_left(node)
        } else {
            node
        }
    }

    /*
     * Right rotate at n:
     *
     *        n           p
     *       / \         / \
     *      p   c  -->  a   n
     *     / \             / \
     *    a   b           b   c
     */
    fn rotate_right(&mut self, node: NonNull<Node<K>>) -> NonNull<Node<K>> {
        let mut node_ptr: NodePtr<K> = Some(node);
        let Some(pivot) = node_ptr.left() else {
            return node;
        };
        let mut pivot_ptr: NodePtr<K> = Some(pivot);
        let parent = node_ptr.parent();

        let mut tmp = pivot_ptr.right();
        node_ptr.set_left(tmp);
        tmp.set_parent(node_ptr);

        pivot_ptr.set_parent(parent);
        self.change_child(node_ptr, pivot_ptr, parent);

        pivot_ptr.set_right(node_ptr);
        node_ptr.set_parent(pivot_ptr);

        node_ptr.update();
        pivot_ptr.update();
        self.fix_height(parent);
        pivot
    }

    /*
     * Left rotate at n:
     *
     *      n               p
     *     / \             / \
     *    a   p    -->    n   c
     *       / \         / \
     *      b   c       a   b
     */
    fn rotate_left(&mut self, node: NonNull<Node<K>>) -> NonNull<Node<K>> {
        let mut node_ptr: NodePtr<K> = Some(node);
        let Some(pivot) = node_ptr.right() else {
            return node;
        };
        let mut pivot_ptr: NodePtr<K> = Some(pivot);
        let parent = node_ptr.parent();

        let mut tmp = pivot_ptr.left();
        node_ptr.set_right(tmp);
        tmp.set_parent(node_ptr);

        pivot_ptr.set_parent(parent);
        self.change_child(node_ptr, pivot_ptr, parent);

        pivot_ptr.set_left(node_ptr);
        node_ptr.set_parent(pivot_ptr);

        node_ptr.update();
        pivot_ptr.update();
        self.fix_height(parent);
        pivot
    }

    fn change_child(&mut self, old: NodePtr<K>, new: NodePtr<K>, parent: NodePtr<K>) {
        if let Some(mut parent) = parent {
            let parent = unsafe { parent.as_mut() };
            if parent.left == old {
                parent.left = new;
            } else {
                parent.right = new;
            }
        } else {
            self.root = new;
        }
    }
}

impl<K: Clone> Root<K> {
    /// Reproduces the tree node by node with an explicit worklist.
    pub(crate) fn deep_copy(&self) -> Self {
        let Some(source) = self.root else {
            return Root::new();
        };

        let copy = |from: NonNull<Node<K>>, parent: NodePtr<K>| {
            let from = unsafe { from.as_ref() };
            // SAFETY: ownership is handed to the new tree.
            let mut to = unsafe { alloc::leak_alloc_node(from.key.clone()) };
            let to_ref = unsafe { to.as_mut() };
            to_ref.parent = parent;
            to_ref.height = from.height;
            to_ref.size = from.size;
            to
        };

        let root = copy(source, None);
        let mut pending = vec![(source, root)];
        while let Some((from, mut to)) = pending.pop() {
            let from_ref = unsafe { from.as_ref() };
            if let Some(left) = from_ref.left {
                let new = copy(left, Some(to));
                unsafe { to.as_mut() }.left = Some(new);
                pending.push((left, new));
            }
            if let Some(right) = from_ref.right {
                let new = copy(right, Some(to));
                unsafe { to.as_mut() }.right = Some(new);
                pending.push((right, new));
            }
        }

        Root { root: Some(root) }
    }
}

impl<K> Drop for Root<K> {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
impl<K: Ord> Root<K> {
    /// Checks every structural invariant and returns the keys in order.
    pub(crate) fn validate(&self) -> Vec<&K> {
        fn walk<'a, K: Ord>(node: NodePtr<K>, parent: NodePtr<K>, keys: &mut Vec<&'a K>) {
            let Some(node) = node else {
                return;
            };
            let node_ref: &'a Node<K> = unsafe { node.as_ref() };
            assert_eq!(parent, node_ref.parent, "parent link");
            walk(node_ref.left, Some(node), keys);
            keys.push(&node_ref.key);
            walk(node_ref.right, Some(node), keys);

            let (left, right) = (node_ref.left, node_ref.right);
            assert_eq!(
                1 + left.height().max(right.height()),
                node_ref.height,
                "height"
            );
            assert_eq!(1 + left.size() + right.size(), node_ref.size, "size");
            assert!(node_ref.balance_factor().abs() <= 1, "balance");
        }

        let mut keys = Vec::with_capacity(self.len());
        walk(self.root, None, &mut keys);
        assert!(keys.windows(2).all(|w| w[0] < w[1]), "order");
        assert_eq!(self.len(), keys.len());
        keys
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn root_key<K: Copy>(root: &Root<K>) -> K {
        unsafe { root.root().unwrap().as_ref() }.key
    }

    #[test]
    fn empty() {
        let root = Root::<usize>::new();
        assert_eq!(0, root.len());
        assert_eq!(0, root.height());
        assert!(root.first().is_none());
        assert!(root.last().is_none());
        assert!(root.upper_bound(&0).is_none());
        assert_eq!(0, root.count_less(None));
        assert_eq!(None, root.rank_of(&0));
        root.validate();
    }

    #[test]
    fn insert_duplicate() {
        let mut root = Root::new();
        assert!(root.insert(42));
        assert!(!root.insert(42));
        assert_eq!(1, root.len());
        assert_eq!(1, root.height());
    }

    #[test]
    fn left_left() {
        let mut root = Root::new();
        for k in [3, 2, 1] {
            root.insert(k);
        }
        assert_eq!(2, root_key(&root));
        assert_eq!(vec![&1, &2, &3], root.validate());
        assert_eq!(2, root.height());
    }

    #[test]
    fn right_right() {
        let mut root = Root::new();
        for k in [1, 2, 3] {
            root.insert(k);
        }
        assert_eq!(2, root_key(&root));
        assert_eq!(vec![&1, &2, &3], root.validate());
    }

    #[test]
    fn left_right() {
        let mut root = Root::new();
        for k in [3, 1, 2] {
            root.insert(k);
        }
        assert_eq!(2, root_key(&root));
        assert_eq!(vec![&1, &2, &3], root.validate());
        assert_eq!(2, root.height());
    }

    #[test]
    fn right_left() {
        let mut root = Root::new();
        for k in [1, 3, 2] {
            root.insert(k);
        }
        assert_eq!(2, root_key(&root));
        assert_eq!(vec![&1, &2, &3], root.validate());
    }

    #[test]
    fn rotation_below_root() {
        // 20 and 30 hang under the root; 35 unbalances 30's parent, not the
        // root.
        let mut root = Root::new();
        for k in [10, 5, 20, 30, 35] {
            root.insert(k);
        }
        assert_eq!(10, root_key(&root));
        assert_eq!(vec![&5, &10, &20, &30, &35], root.validate());
        assert_eq!(3, root.height());
    }

    #[test]
    fn fix_height_stops_on_unchanged_height() {
        let mut root = Root::new();
        for k in [2, 1, 3] {
            root.insert(k);
        }
        let top = root.root();
        // Recomputing an already correct node changes nothing.
        assert_eq!(None, root.fix_height(top));
        assert_eq!(2, root.height());
    }

    #[test]
    fn fix_height_climbs_on_changed_height() {
        let mut root = Root::new();
        for k in [2, 1, 3] {
            root.insert(k);
        }
        let top = root.root();
        let right = top.right();
        let leaf = unsafe { alloc::leak_alloc_node(4) };
        unsafe { Node::link(leaf, right.unwrap(), ComingFrom::Right) };
        root.fix_size(right);

        // 3 grows to height 2, the root grows to 3, both stay balanced.
        assert_eq!(None, root.fix_height(right));
        assert_eq!(2, right.height());
        assert_eq!(3, root.height());
        root.validate();
    }

    #[test]
    fn fix_height_reports_unbalanced() {
        let mut root = Root::new();
        for k in [2, 1, 3, 4] {
            root.insert(k);
        }
        let four = root.find(&4);
        let leaf = unsafe { alloc::leak_alloc_node(5) };
        unsafe { Node::link(leaf, four.unwrap(), ComingFrom::Right) };
        root.fix_size(four);

        // 3 is the deepest node out of balance.
        let three = root.find(&3);
        assert_eq!(three, root.fix_height(four));
        // The walk stopped there: the root still has its old height.
        assert_eq!(3, root.height());

        root.balance(three.unwrap());
        assert_eq!(vec![&1, &2, &3, &4, &5], root.validate());
    }

    #[test]
    fn upper_bound_and_count_less() {
        let mut root = Root::new();
        for k in [5, 10, 15] {
            root.insert(k);
        }
        let bound = |x| root.upper_bound(&x).map(|n| unsafe { n.as_ref() }.key);
        assert_eq!(Some(5), bound(0));
        assert_eq!(Some(10), bound(5));
        assert_eq!(Some(15), bound(12));
        assert_eq!(None, bound(15));
        assert_eq!(None, bound(100));

        assert_eq!(0, root.count_less(root.upper_bound(&0)));
        assert_eq!(1, root.count_less(root.upper_bound(&5)));
        assert_eq!(2, root.count_less(root.upper_bound(&14)));
        assert_eq!(3, root.count_less(root.upper_bound(&15)));
        assert_eq!(3, root.count_less(None));
    }

    #[test]
    fn rank_of() {
        let mut root = Root::new();
        for k in (0..64).rev() {
            root.insert(k * 2);
        }
        for k in 0..64 {
            assert_eq!(Some(k), root.rank_of(&(k * 2)));
            assert_eq!(None, root.rank_of(&(k * 2 + 1)));
        }
    }

    #[test]
    fn deep_copy() {
        let mut root = Root::new();
        for k in 0..100 {
            root.insert(k);
        }
        let copy = root.deep_copy();
        assert_eq!(root.validate(), copy.validate());
        assert_eq!(root.height(), copy.height());
        assert_ne!(root.root(), copy.root());
        assert!(copy.root().parent().is_none());

        drop(root);
        assert_eq!(100, copy.len());
        copy.validate();
    }

    #[test]
    fn clear() {
        let mut root = Root::new();
        for k in 0..1000 {
            root.insert(k);
        }
        root.clear();
        assert_eq!(0, root.len());
        assert!(root.root().is_none());
        root.clear();
        root.insert(1);
        assert_eq!(vec![&1], root.validate());
    }
}
