use alloc::vec::Vec;
use core::borrow::Borrow;
use core::cmp::Ordering;

use log::trace;

use super::arena::Arena;
use super::handle::Handle;
use super::node::{Color, Node, Side};
use super::size::Size;

/// The red-black tree backing `OSRBTreeMap`.
///
/// Every node carries the size of its subtree, which makes rank and select O(log n).
/// Children are owned through their handles; parent handles are navigation only.
pub(crate) struct RawRBTreeMap<K, V> {
    /// Arena storing all tree nodes.
    nodes: Arena<Node<K>>,
    /// Arena storing all values, so a `&mut V` never overlaps node links.
    values: Arena<V>,
    /// Handle to the root node, if the tree is non-empty.
    root: Option<Handle>,
}

impl<K, V> RawRBTreeMap<K, V> {
    /// Creates a new, empty tree.
    pub(crate) const fn new() -> Self {
        Self {
            nodes: Arena::new(),
            values: Arena::new(),
            root: None,
        }
    }

    /// Creates a new tree with room for `capacity` entries.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Arena::with_capacity(capacity),
            values: Arena::with_capacity(capacity),
            root: None,
        }
    }

    /// Returns the number of key-value pairs in the tree.
    pub(crate) fn len(&self) -> usize {
        self.size_of(self.root).to_usize()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.values.capacity()
    }

    /// Drops every node and value.
    pub(crate) fn clear(&mut self) {
        trace!("clearing tree of {} nodes", self.len());
        self.nodes.clear();
        self.values.clear();
        self.root = None;
    }

    #[cfg(test)]
    pub(crate) fn root(&self) -> Option<Handle> {
        self.root
    }

    #[inline]
    pub(crate) fn node(&self, handle: Handle) -> &Node<K> {
        self.nodes.get(handle)
    }

    #[inline]
    fn node_mut(&mut self, handle: Handle) -> &mut Node<K> {
        self.nodes.get_mut(handle)
    }

    /// Returns a reference to a node by handle from a raw pointer.
    ///
    /// # Safety
    /// - `ptr` must point to a valid, allocated `RawRBTreeMap<K, V>`.
    /// - The nodes arena must not be mutably borrowed.
    pub(crate) unsafe fn node_ptr<'a>(ptr: *const Self, handle: Handle) -> &'a Node<K> {
        // SAFETY: Only the `nodes` field is reached, so live borrows of `values` are not aliased.
        unsafe { Arena::get_ptr(core::ptr::addr_of!((*ptr).nodes), handle) }
    }

    /// Returns the key and value stored at `node`.
    #[inline]
    pub(crate) fn key_value(&self, node: Handle) -> (&K, &V) {
        let node = self.nodes.get(node);
        (node.key(), self.values.get(node.value()))
    }

    /// Returns the key and a mutable reference to the value stored at `node`.
    #[inline]
    pub(crate) fn key_value_mut(&mut self, node: Handle) -> (&K, &mut V) {
        let node = self.nodes.get(node);
        (node.key(), self.values.get_mut(node.value()))
    }

    /// Returns a mutable reference to the value of `node` from a raw pointer.
    ///
    /// # Safety
    /// - `ptr` must point to a valid, allocated `RawRBTreeMap<K, V>`.
    /// - The caller must have logical exclusive access to the value of `node`, and no other
    ///   reference to that value may be live.
    pub(crate) unsafe fn value_mut_ptr<'a>(ptr: *mut Self, node: Handle) -> &'a mut V {
        // SAFETY: The node is read through `nodes` only; the value through `values` only.
        unsafe {
            let value = Self::node_ptr(ptr, node).value();
            (*core::ptr::addr_of_mut!((*ptr).values)).get_mut(value)
        }
    }

    #[inline]
    fn size_of(&self, node: Option<Handle>) -> Size {
        node.map_or(Size::ZERO, |h| self.node(h).size())
    }

    /// Absent children count as black.
    #[inline]
    fn is_red(&self, node: Option<Handle>) -> bool {
        node.is_some_and(|h| self.node(h).is_red())
    }

    #[inline]
    fn set_color(&mut self, node: Handle, color: Color) {
        self.node_mut(node).set_color(color);
    }

    /// Which side of `parent` holds `child`.
    #[inline]
    fn side_in(&self, parent: Handle, child: Handle) -> Side {
        let node = self.node(parent);
        if node.left() == Some(child) {
            Side::Left
        } else {
            debug_assert_eq!(node.right(), Some(child), "`RawRBTreeMap::side_in()` - not a child!");
            Side::Right
        }
    }

    fn extreme(&self, node: Handle, side: Side) -> Handle {
        walk_to_extreme(&|h| self.node(h), node, side)
    }

    /// Handle of the smallest key.
    pub(crate) fn first(&self) -> Option<Handle> {
        self.root.map(|root| self.extreme(root, Side::Left))
    }

    /// Handle of the largest key.
    pub(crate) fn last(&self) -> Option<Handle> {
        self.root.map(|root| self.extreme(root, Side::Right))
    }

    /// In-order successor, or `None` past the largest key.
    pub(crate) fn next(&self, node: Handle) -> Option<Handle> {
        step_from(&|h| self.node(h), node, Side::Right)
    }

    /// In-order predecessor, or `None` before the smallest key.
    pub(crate) fn prev(&self, node: Handle) -> Option<Handle> {
        step_from(&|h| self.node(h), node, Side::Left)
    }

    /// [`next`](Self::next) through a raw pointer, touching only the nodes arena.
    ///
    /// # Safety
    /// Same contract as [`node_ptr`](Self::node_ptr).
    pub(crate) unsafe fn next_ptr(ptr: *const Self, node: Handle) -> Option<Handle> {
        // SAFETY: Forwarded to the caller.
        step_from(&|h| unsafe { Self::node_ptr(ptr, h) }, node, Side::Right)
    }

    /// [`prev`](Self::prev) through a raw pointer, touching only the nodes arena.
    ///
    /// # Safety
    /// Same contract as [`node_ptr`](Self::node_ptr).
    pub(crate) unsafe fn prev_ptr(ptr: *const Self, node: Handle) -> Option<Handle> {
        // SAFETY: Forwarded to the caller.
        step_from(&|h| unsafe { Self::node_ptr(ptr, h) }, node, Side::Left)
    }

    /// Zero-based position of `node` in key order.
    pub(crate) fn rank_of_node(&self, node: Handle) -> usize {
        let mut rank = self.size_of(self.node(node).left()).to_usize();
        let mut current = node;
        while let Some(parent) = self.node(current).parent() {
            if self.node(parent).right() == Some(current) {
                rank += self.size_of(self.node(parent).left()).to_usize() + 1;
            }
            current = parent;
        }
        rank
    }

    /// Node at zero-based position `rank` in key order.
    pub(crate) fn select(&self, rank: usize) -> Option<Handle> {
        if rank >= self.len() {
            return None;
        }

        let mut current = self.root;
        let mut remaining = rank;
        loop {
            let handle = current.expect("`RawRBTreeMap::select()` - subtree sizes are inconsistent!");
            let node = self.node(handle);
            let left = self.size_of(node.left()).to_usize();
            match remaining.cmp(&left) {
                Ordering::Less => current = node.left(),
                Ordering::Equal => return Some(handle),
                Ordering::Greater => {
                    remaining -= left + 1;
                    current = node.right();
                }
            }
        }
    }

    /// Points whatever referenced `old` (its parent's child slot, or the root) at `new`.
    fn replace_child(&mut self, parent: Option<Handle>, old: Handle, new: Option<Handle>) {
        match parent {
            None => self.root = new,
            Some(p) => {
                let side = self.side_in(p, old);
                self.node_mut(p).set_child(side, new);
            }
        }
        if let Some(new) = new {
            self.node_mut(new).set_parent(parent);
        }
    }

    /// Rotates the subtree rooted at `pivot` toward `side`, lifting the child on the other side.
    ///
    /// The lifted node takes over the pivot's subtree size; the pivot's size is recomputed
    /// from its new children.
    fn rotate(&mut self, pivot: Handle, side: Side) {
        let other = side.opposite();
        let lifted = self
            .node(pivot)
            .child(other)
            .expect("`RawRBTreeMap::rotate()` - pivot has no child to lift!");

        let inner = self.node(lifted).child(side);
        self.node_mut(pivot).set_child(other, inner);
        if let Some(inner) = inner {
            self.node_mut(inner).set_parent(Some(pivot));
        }

        let parent = self.node(pivot).parent();
        self.replace_child(parent, pivot, Some(lifted));
        self.node_mut(lifted).set_child(side, Some(pivot));
        self.node_mut(pivot).set_parent(Some(lifted));

        let total = self.node(pivot).size();
        self.node_mut(lifted).set_size(total);
        let pivot_size = {
            let node = self.node(pivot);
            Size::of_node(self.size_of(node.left()), self.size_of(node.right()))
        };
        self.node_mut(pivot).set_size(pivot_size);
    }

    fn grow_path(&mut self, mut at: Option<Handle>) {
        while let Some(handle) = at {
            let node = self.node_mut(handle);
            node.set_size(node.size().increment());
            at = node.parent();
        }
    }

    fn shrink_path(&mut self, mut at: Option<Handle>) {
        while let Some(handle) = at {
            let node = self.node_mut(handle);
            node.set_size(node.size().decrement());
            at = node.parent();
        }
    }

    /// Restores the red-black coloring after `node` was linked in as a red leaf.
    fn insert_fixup(&mut self, mut node: Handle) {
        while let Some(mut parent) = self.node(node).parent() {
            if !self.node(parent).is_red() {
                break;
            }
            // A red node is never the root.
            let grandparent = self
                .node(parent)
                .parent()
                .expect("`RawRBTreeMap::insert_fixup()` - red parent has no parent!");
            let parent_side = self.side_in(grandparent, parent);
            let uncle = self.node(grandparent).child(parent_side.opposite());

            if let Some(uncle) = uncle.filter(|&u| self.node(u).is_red()) {
                self.set_color(parent, Color::Black);
                self.set_color(uncle, Color::Black);
                self.set_color(grandparent, Color::Red);
                node = grandparent;
                continue;
            }

            if self.side_in(parent, node) != parent_side {
                // Bend the zig-zag straight; `node` now sits where `parent` was.
                self.rotate(parent, parent_side);
                parent = node;
            }
            self.set_color(parent, Color::Black);
            self.set_color(grandparent, Color::Red);
            self.rotate(grandparent, parent_side.opposite());
            break;
        }

        if let Some(root) = self.root {
            self.set_color(root, Color::Black);
        }
    }

    /// Swaps the tree positions of `a` and `b`.
    ///
    /// Parent, children, color and subtree size are exchanged between the two slots, and every
    /// neighbor that pointed at one now points at the other. Keys and values stay with their
    /// nodes, so handles held elsewhere keep naming the same entry.
    fn exchange(&mut self, a: Handle, b: Handle) {
        let links_a = self.node(a).links();
        let links_b = self.node(b).links();
        let slot_a = links_a.parent.map(|p| (p, self.side_in(p, a)));
        let slot_b = links_b.parent.map(|p| (p, self.side_in(p, b)));

        self.node_mut(a).set_links(links_b.swap_handles(a, b));
        self.node_mut(b).set_links(links_a.swap_handles(a, b));

        match slot_a {
            None => self.root = Some(b),
            Some((p, side)) if p != b => self.node_mut(p).set_child(side, Some(b)),
            Some(_) => {}
        }
        match slot_b {
            None => self.root = Some(a),
            Some((p, side)) if p != a => self.node_mut(p).set_child(side, Some(a)),
            Some(_) => {}
        }

        for owner in [a, b] {
            let links = self.node(owner).links();
            for child in [links.left, links.right].into_iter().flatten() {
                if child != a && child != b {
                    self.node_mut(child).set_parent(Some(owner));
                }
            }
        }
    }

    /// Removes `node` from the tree, returning its key and value.
    pub(crate) fn remove_node(&mut self, node: Handle) -> (K, V) {
        let links = self.node(node).links();
        if let (Some(_), Some(right)) = (links.left, links.right) {
            let successor = self.extreme(right, Side::Left);
            trace!("relocating two-child node {node:?} to successor slot {successor:?}");
            self.exchange(node, successor);
        }

        let links = self.node(node).links();
        debug_assert!(links.left.is_none() || links.right.is_none());
        let child = links.left.or(links.right);
        self.replace_child(links.parent, node, child);
        self.shrink_path(links.parent);

        if links.color == Color::Black {
            self.erase_fixup(child, links.parent);
        }

        let (key, value) = self.nodes.take(node).into_parts();
        (key, self.values.take(value))
    }

    /// Resolves the double-black deficiency at `node` (possibly absent) under `parent`.
    fn erase_fixup(&mut self, mut node: Option<Handle>, mut parent: Option<Handle>) {
        trace!("erase fixup at {node:?} under {parent:?}");
        while node != self.root && !self.is_red(node) {
            let Some(p) = parent else { break };
            let side = if self.node(p).left() == node { Side::Left } else { Side::Right };
            let other = side.opposite();
            let mut sibling = self
                .node(p)
                .child(other)
                .expect("`RawRBTreeMap::erase_fixup()` - deficient node has no sibling!");

            if self.node(sibling).is_red() {
                self.set_color(sibling, Color::Black);
                self.set_color(p, Color::Red);
                self.rotate(p, side);
                sibling = self
                    .node(p)
                    .child(other)
                    .expect("`RawRBTreeMap::erase_fixup()` - deficient node has no sibling!");
            }

            let near = self.node(sibling).child(side);
            let far = self.node(sibling).child(other);
            if !self.is_red(near) && !self.is_red(far) {
                self.set_color(sibling, Color::Red);
                node = Some(p);
                parent = self.node(p).parent();
                continue;
            }

            if !self.is_red(far) {
                let near = near.expect("`RawRBTreeMap::erase_fixup()` - red nephew is absent!");
                self.set_color(near, Color::Black);
                self.set_color(sibling, Color::Red);
                self.rotate(sibling, other);
                sibling = self
                    .node(p)
                    .child(other)
                    .expect("`RawRBTreeMap::erase_fixup()` - deficient node has no sibling!");
            }

            let parent_color = self.node(p).color();
            self.set_color(sibling, parent_color);
            self.set_color(p, Color::Black);
            if let Some(far) = self.node(sibling).child(other) {
                self.set_color(far, Color::Black);
            }
            self.rotate(p, side);
            node = self.root;
            break;
        }

        if let Some(node) = node {
            self.set_color(node, Color::Black);
        }
    }

    /// Removes the smallest entry.
    pub(crate) fn pop_first(&mut self) -> Option<(K, V)> {
        let first = self.first()?;
        Some(self.remove_node(first))
    }

    /// Removes the largest entry.
    pub(crate) fn pop_last(&mut self) -> Option<(K, V)> {
        let last = self.last()?;
        Some(self.remove_node(last))
    }

    /// Moves every entry out in key order, leaving the tree empty. O(n).
    pub(crate) fn drain_to_vec(&mut self) -> Vec<(K, V)> {
        let mut order = Vec::with_capacity(self.len());
        let mut current = self.first();
        while let Some(handle) = current {
            order.push(handle);
            current = self.next(handle);
        }

        let mut result = Vec::with_capacity(order.len());
        for handle in order {
            let (key, value) = self.nodes.take(handle).into_parts();
            result.push((key, self.values.take(value)));
        }

        self.root = None;
        self.nodes.clear();
        self.values.clear();
        result
    }
}

/// Follows `side` links from `node` until there are none.
fn walk_to_extreme<'n, K: 'n>(node_of: &impl Fn(Handle) -> &'n Node<K>, mut node: Handle, side: Side) -> Handle {
    while let Some(child) = node_of(node).child(side) {
        node = child;
    }
    node
}

/// In-order neighbor of `node` in direction `side` (`Right` = successor).
///
/// Uses only parent and child links, never color or size.
fn step_from<'n, K: 'n>(node_of: &impl Fn(Handle) -> &'n Node<K>, node: Handle, side: Side) -> Option<Handle> {
    if let Some(child) = node_of(node).child(side) {
        return Some(walk_to_extreme(node_of, child, side.opposite()));
    }
    let mut current = node;
    while let Some(parent) = node_of(current).parent() {
        if node_of(parent).child(side) != Some(current) {
            return Some(parent);
        }
        current = parent;
    }
    None
}

impl<K: Ord, V> RawRBTreeMap<K, V> {
    /// Returns the node holding `key`.
    pub(crate) fn search<Q>(&self, key: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut current = self.root;
        while let Some(handle) = current {
            let node = self.node(handle);
            match key.cmp(node.key().borrow()) {
                Ordering::Less => current = node.left(),
                Ordering::Greater => current = node.right(),
                Ordering::Equal => return Some(handle),
            }
        }
        None
    }

    /// Inserts `key` unless it is already present.
    ///
    /// Returns the node holding `key` and whether it was newly created. An existing entry
    /// is left untouched and `value` is dropped.
    pub(crate) fn insert(&mut self, key: K, value: V) -> (Handle, bool) {
        let mut parent = None;
        let mut side = Side::Left;
        let mut current = self.root;
        while let Some(handle) = current {
            let node = self.node(handle);
            side = match key.cmp(node.key()) {
                Ordering::Less => Side::Left,
                Ordering::Greater => Side::Right,
                Ordering::Equal => return (handle, false),
            };
            parent = Some(handle);
            current = node.child(side);
        }

        let value = self.values.alloc(value);
        let node = self.nodes.alloc(Node::new(key, value, parent));
        match parent {
            None => self.root = Some(node),
            Some(p) => self.node_mut(p).set_child(side, Some(node)),
        }
        self.grow_path(parent);
        self.insert_fixup(node);
        (node, true)
    }

    /// Removes `key`, returning its entry.
    pub(crate) fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let node = self.search(key)?;
        Some(self.remove_node(node))
    }

    /// Zero-based position of `key` in key order.
    pub(crate) fn rank_of<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut rank = 0;
        let mut current = self.root;
        while let Some(handle) = current {
            let node = self.node(handle);
            match key.cmp(node.key().borrow()) {
                Ordering::Less => current = node.left(),
                Ordering::Greater => {
                    rank += self.size_of(node.left()).to_usize() + 1;
                    current = node.right();
                }
                Ordering::Equal => return Some(rank + self.size_of(node.left()).to_usize()),
            }
        }
        None
    }
}

impl<K: Clone, V: Clone> Clone for RawRBTreeMap<K, V> {
    /// Deep-copies the node graph: fresh nodes with the same keys, values and colors, and
    /// subtree sizes recomputed bottom-up.
    fn clone(&self) -> Self {
        let mut copy = Self::with_capacity(self.len());
        copy.root = self.copy_subtree(self.root, None, &mut copy);
        trace!("deep-copied tree of {} nodes", copy.len());
        copy
    }
}

impl<K: Clone, V: Clone> RawRBTreeMap<K, V> {
    fn copy_subtree(&self, source: Option<Handle>, parent: Option<Handle>, into: &mut Self) -> Option<Handle> {
        let source = self.node(source?);
        let value = into.values.alloc(self.values.get(source.value()).clone());
        let copy = into.nodes.alloc(Node::new(source.key().clone(), value, parent));

        let left = self.copy_subtree(source.left(), Some(copy), into);
        let right = self.copy_subtree(source.right(), Some(copy), into);
        let size = Size::of_node(into.size_of(left), into.size_of(right));

        let node = into.node_mut(copy);
        node.set_child(Side::Left, left);
        node.set_child(Side::Right, right);
        node.set_color(source.color());
        node.set_size(size);
        Some(copy)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use alloc::collections::BTreeMap;
    use alloc::string::String;
    use alloc::vec;
    use proptest::prelude::*;

    use crate::raw::node::Links;

    impl<K: Ord + core::fmt::Debug, V> RawRBTreeMap<K, V> {
        /// Checks order, coloring, black-height, subtree sizes and parent links.
        /// Panics with every violation found.
        pub(crate) fn validate_invariants(&self) {
            let mut errors: Vec<String> = Vec::new();

            if let Some(root) = self.root {
                if self.node(root).parent().is_some() {
                    errors.push(alloc::format!("root {root:?} has a parent"));
                }
                if self.node(root).is_red() {
                    errors.push(alloc::format!("root {root:?} is red"));
                }
                self.validate_node(root, None, None, &mut errors);
            }

            if self.nodes.len() != self.len() || self.values.len() != self.len() {
                errors.push(alloc::format!(
                    "arena mismatch: nodes={}, values={}, len={}",
                    self.nodes.len(),
                    self.values.len(),
                    self.len()
                ));
            }

            assert!(errors.is_empty(), "Tree invariant violations:\n{}", errors.join("\n"));
        }

        /// Returns `(black_height, size)` of the subtree at `handle`.
        fn validate_node(
            &self,
            handle: Handle,
            low: Option<&K>,
            high: Option<&K>,
            errors: &mut Vec<String>,
        ) -> (usize, usize) {
            let node = self.node(handle);
            let key = node.key();
            if low.is_some_and(|low| key <= low) || high.is_some_and(|high| key >= high) {
                errors.push(alloc::format!("key {key:?} out of order"));
            }

            let (left_bh, left_size) = self.validate_child(handle, node.left(), low, Some(key), errors);
            let (right_bh, right_size) = self.validate_child(handle, node.right(), Some(key), high, errors);

            if left_bh != right_bh {
                errors.push(alloc::format!("black-height mismatch at {key:?}: {left_bh} vs {right_bh}"));
            }
            let size = 1 + left_size + right_size;
            if node.size().to_usize() != size {
                errors.push(alloc::format!("size of {key:?} is {}, expected {size}", node.size().to_usize()));
            }
            (left_bh + usize::from(!node.is_red()), size)
        }

        fn validate_child(
            &self,
            parent: Handle,
            child: Option<Handle>,
            low: Option<&K>,
            high: Option<&K>,
            errors: &mut Vec<String>,
        ) -> (usize, usize) {
            let Some(child) = child else {
                return (1, 0);
            };
            if self.node(child).parent() != Some(parent) {
                errors.push(alloc::format!("child {child:?} does not point back to {parent:?}"));
            }
            if self.node(parent).is_red() && self.node(child).is_red() {
                errors.push(alloc::format!("red {parent:?} has red child {child:?}"));
            }
            self.validate_node(child, low, high, errors)
        }

        fn height(&self) -> usize {
            fn depth<K, V>(tree: &RawRBTreeMap<K, V>, node: Option<Handle>) -> usize {
                node.map_or(0, |h| {
                    let n = tree.node(h);
                    1 + depth(tree, n.left()).max(depth(tree, n.right()))
                })
            }
            depth(self, self.root)
        }

        fn black_height(&self) -> usize {
            let mut count = 0;
            let mut current = self.root;
            while let Some(h) = current {
                count += usize::from(!self.node(h).is_red());
                current = self.node(h).left();
            }
            count
        }

        fn keys(&self) -> Vec<&K> {
            let mut keys = Vec::new();
            let mut current = self.first();
            while let Some(h) = current {
                keys.push(self.node(h).key());
                current = self.next(h);
            }
            keys
        }

        /// Every node's key, links and value handle, for bit-for-bit comparisons.
        fn snapshot(&self) -> Vec<(Handle, Links)> {
            let mut out = Vec::new();
            let mut current = self.first();
            while let Some(h) = current {
                out.push((h, self.node(h).links()));
                current = self.next(h);
            }
            out
        }
    }

    fn scenario_tree() -> RawRBTreeMap<i32, i32> {
        let mut tree = RawRBTreeMap::new();
        for key in [5, 3, 8, 1, 4, 7, 9] {
            let (_, inserted) = tree.insert(key, key * 10);
            assert!(inserted);
            tree.validate_invariants();
        }
        tree
    }

    #[test]
    fn insert_produces_sorted_order_and_ranks() {
        let tree = scenario_tree();
        assert_eq!(tree.keys(), vec![&1, &3, &4, &5, &7, &8, &9]);
        assert_eq!(tree.rank_of(&7), Some(4));
        assert_eq!(tree.rank_of(&6), None);
        assert_eq!(tree.len(), 7);
    }

    #[test]
    fn erase_root_keeps_black_height() {
        let mut tree = scenario_tree();
        let black_height = tree.black_height();
        assert_eq!(tree.remove_entry(&5), Some((5, 50)));
        tree.validate_invariants();
        assert_eq!(tree.len(), 6);
        assert_eq!(tree.keys(), vec![&1, &3, &4, &7, &8, &9]);
        assert_eq!(tree.black_height(), black_height);
        assert_eq!(tree.search(&5), None);
    }

    #[test]
    fn duplicate_insert_keeps_first_value() {
        let mut tree = RawRBTreeMap::new();
        let (first, inserted) = tree.insert(1, "a");
        assert!(inserted);
        let (again, inserted) = tree.insert(1, "b");
        assert!(!inserted);
        assert_eq!(first, again);
        assert_eq!(tree.key_value(first), (&1, &"a"));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn erase_absent_key_changes_nothing() {
        let mut tree = scenario_tree();
        let before = tree.snapshot();
        let root = tree.root();
        assert_eq!(tree.remove_entry(&6), None);
        assert_eq!(tree.snapshot(), before);
        assert_eq!(tree.root(), root);
    }

    #[test]
    fn exchange_keeps_handles_bound_to_entries() {
        let mut tree = scenario_tree();
        let seven = tree.search(&7).unwrap();
        tree.remove_entry(&5);
        tree.validate_invariants();
        assert_eq!(tree.search(&7), Some(seven));
        assert_eq!(tree.key_value(seven), (&7, &70));
    }

    #[test]
    fn exchange_adjacent_nodes() {
        // 2 is the root and 3 its right child: the successor is a direct child.
        let mut tree = RawRBTreeMap::new();
        for key in [2, 1, 3] {
            tree.insert(key, ());
        }
        let three = tree.search(&3).unwrap();
        tree.remove_entry(&2);
        tree.validate_invariants();
        assert_eq!(tree.root(), Some(three));
        assert_eq!(tree.keys(), vec![&1, &3]);
    }

    #[test]
    fn ascending_inserts_stay_balanced() {
        let mut tree = RawRBTreeMap::new();
        for key in 0..10_000u32 {
            tree.insert(key, key);
            // height <= 2 * log2(n + 1)  <=>  2^height <= (n + 1)^2
            let n = tree.len() as u128;
            let height = tree.height();
            assert!(1u128 << height <= (n + 1) * (n + 1), "height {height} too large for n = {n}");
        }
        tree.validate_invariants();
    }

    #[test]
    fn select_and_rank_agree() {
        let mut tree = RawRBTreeMap::new();
        for key in (0..200).map(|i| (i * 37) % 211) {
            tree.insert(key, ());
        }
        for rank in 0..tree.len() {
            let node = tree.select(rank).unwrap();
            assert_eq!(tree.rank_of_node(node), rank);
            assert_eq!(tree.rank_of(tree.node(node).key()), Some(rank));
        }
        assert_eq!(tree.select(tree.len()), None);
    }

    #[test]
    fn stepping_walks_in_order() {
        let tree = scenario_tree();
        let mut forward = Vec::new();
        let mut current = tree.first();
        while let Some(h) = current {
            forward.push(*tree.node(h).key());
            current = tree.next(h);
        }
        let mut backward = Vec::new();
        let mut current = tree.last();
        while let Some(h) = current {
            backward.push(*tree.node(h).key());
            current = tree.prev(h);
        }
        backward.reverse();
        assert_eq!(forward, backward);
    }

    #[test]
    fn clone_is_a_deep_copy() {
        let mut tree = scenario_tree();
        tree.remove_entry(&3);
        let copy = tree.clone();
        copy.validate_invariants();
        assert_eq!(copy.keys(), tree.keys());
        tree.remove_entry(&7);
        assert_eq!(copy.len(), 6);
        assert!(copy.search(&7).is_some());
    }

    #[test]
    fn drain_empties_the_tree() {
        let mut tree = scenario_tree();
        let drained = tree.drain_to_vec();
        assert_eq!(drained.iter().map(|&(k, _)| k).collect::<Vec<_>>(), [1, 3, 4, 5, 7, 8, 9]);
        assert!(tree.is_empty());
        tree.validate_invariants();
    }

    #[test]
    #[should_panic(expected = "`RawRBTreeMap::rotate()` - pivot has no child to lift!")]
    fn rotate_without_child_panics() {
        let mut tree = RawRBTreeMap::new();
        let (node, _) = tree.insert(1, ());
        tree.rotate(node, Side::Left);
    }

    #[derive(Clone, Debug)]
    enum Operation {
        Insert(i16),
        Remove(i16),
        PopFirst,
        PopLast,
    }

    fn strategy() -> impl Strategy<Value = Operation> {
        prop_oneof![
            6 => any::<i16>().prop_map(|k| Operation::Insert(k % 512)),
            4 => any::<i16>().prop_map(|k| Operation::Remove(k % 512)),
            1 => Just(Operation::PopFirst),
            1 => Just(Operation::PopLast),
        ]
    }

    proptest! {
        #[test]
        fn invariants_hold_after_every_operation(operations in prop::collection::vec(strategy(), 0..512)) {
            let mut tree = RawRBTreeMap::new();
            let mut model = BTreeMap::new();

            for operation in operations {
                match operation {
                    Operation::Insert(key) => {
                        let (_, inserted) = tree.insert(key, i32::from(key));
                        prop_assert_eq!(inserted, !model.contains_key(&key));
                        model.entry(key).or_insert(i32::from(key));
                    }
                    Operation::Remove(key) => {
                        prop_assert_eq!(tree.remove_entry(&key), model.remove_entry(&key));
                    }
                    Operation::PopFirst => prop_assert_eq!(tree.pop_first(), model.pop_first()),
                    Operation::PopLast => prop_assert_eq!(tree.pop_last(), model.pop_last()),
                }
                tree.validate_invariants();
                prop_assert_eq!(tree.len(), model.len());
            }

            let keys: Vec<_> = tree.keys().into_iter().copied().collect();
            let expected: Vec<_> = model.keys().copied().collect();
            prop_assert_eq!(keys, expected);
        }
    }
}
