//! A red-black tree mapping string keys to values.

// Conventions used in comments:
// - `p(x)` is the parent of `x`, `g(x)` its grandparent.
// - The sibling of `x` is the other child of `p(x)`; the uncle of `x` is the sibling of `p(x)`; the
//   nephews of `x` are the children of its sibling. The far nephew is the one on the side opposite
//   to `x`.
// - Absent children are black leaves. They are never materialized.
//
// The invariants of a red-black tree are:
// 1. Every key in the left subtree of `x` is less than the key of `x`, and every key in the right
//    subtree is greater.
// 2. A red node never has a red parent.
// 3. The root is black.
// 4. Every path from a node down to an absent child passes through the same number of black nodes.
//    That number, excluding the node itself and counting the absent child, is its black depth.
//
// Corollaries:
// 5. A red node is never the root, so it always has a parent.
// 6. A black non-root node always has a sibling.
//
//    Proof: the black depth of `p(x)` counted through `x` is at least 2 (`x` and the absent leaf
//    below it). An absent sibling would count 1.
//    QED by (4)

use core::{cmp::Ordering, fmt, mem, ops::Not};

use log::{debug, trace};
use slab::Slab;

mod debug;
mod error;
mod iter;

#[cfg(any(test, feature = "model"))]
pub mod model;

#[cfg(test)]
mod tests;

pub use error::{DuplicateKey, Unbalanced};
pub use iter::Iter;

/// An ordered map from strings to values, implemented as a red-black tree.
///
/// Keys are compared byte-wise. The tree owns a private copy of every key; values are moved in on
/// [`insert`] and handed back on [`delete`], never cloned or inspected.
///
/// Nodes are stored in an arena and refer to each other by index, so rotations and splices only
/// reassign indices.
///
/// [`insert`]: RbTree::insert
/// [`delete`]: RbTree::delete
pub struct RbTree<V> {
    nodes: Slab<Node<V>>,
    root: Link,
}

type NodeId = usize;

type Link = Option<NodeId>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Color {
    Red,
    Black,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Dir {
    Left = 0,
    Right = 1,
}

impl Not for Dir {
    type Output = Dir;

    fn not(self) -> Self::Output {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

struct Node<V> {
    key: String,
    value: V,
    color: Color,
    parent: Link,
    children: [Link; 2],
}

impl<V> Node<V> {
    // New nodes are red leaves.
    fn new(key: &str, value: V, parent: Link) -> Self {
        Node {
            key: key.to_owned(),
            value,
            color: Color::Red,
            parent,
            children: [None; 2],
        }
    }

    #[inline]
    fn child(&self, dir: Dir) -> Link {
        self.children[dir as usize]
    }

    #[inline]
    fn left(&self) -> Link {
        self.child(Dir::Left)
    }

    #[inline]
    fn right(&self) -> Link {
        self.child(Dir::Right)
    }

    #[inline]
    fn set_child(&mut self, dir: Dir, child: Link) -> Link {
        mem::replace(&mut self.children[dir as usize], child)
    }
}

impl<V> RbTree<V> {
    /// Returns a new empty tree.
    pub fn new() -> RbTree<V> {
        RbTree {
            nodes: Slab::new(),
            root: None,
        }
    }

    /// Returns `true` if the tree contains no elements.
    pub fn is_empty(&self) -> bool {
        let empty = self.root.is_none();
        debug_assert_eq!(empty, self.nodes.is_empty());
        empty
    }

    /// Returns the number of elements in the tree.
    ///
    /// The count is computed by walking the whole tree, in _O(n)_ time.
    pub fn size(&self) -> usize {
        self.root.map_or(0, |root| self.size_at(root))
    }

    fn size_at(&self, node: NodeId) -> usize {
        self.nodes[node]
            .children
            .iter()
            .flatten()
            .map(|&child| self.size_at(child))
            .sum::<usize>()
            + 1
    }

    /// Returns a reference to the value associated with `key`.
    pub fn get(&self, key: &str) -> Option<&V> {
        let node = self.get_raw(key)?;
        Some(&self.nodes[node].value)
    }

    /// Returns a mutable reference to the value associated with `key`.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        let node = self.get_raw(key)?;
        Some(&mut self.nodes[node].value)
    }

    /// Returns `true` if the tree contains an entry for `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get_raw(key).is_some()
    }

    fn get_raw(&self, key: &str) -> Link {
        let mut opt_cur = self.root;

        loop {
            let cur = opt_cur?;
            let node = &self.nodes[cur];

            match key.cmp(node.key.as_str()) {
                Ordering::Less => opt_cur = node.left(),
                Ordering::Equal => return Some(cur),
                Ordering::Greater => opt_cur = node.right(),
            }
        }
    }

    /// Returns the minimum key of the tree.
    pub fn minimum(&self) -> Option<&str> {
        self.first_key_value().map(|(key, _)| key)
    }

    /// Returns the maximum key of the tree.
    pub fn maximum(&self) -> Option<&str> {
        self.last_key_value().map(|(key, _)| key)
    }

    /// Returns the entry with the minimum key.
    pub fn first_key_value(&self) -> Option<(&str, &V)> {
        let node = &self.nodes[self.min_in_subtree(self.root?)];
        Some((&node.key, &node.value))
    }

    /// Returns the entry with the maximum key.
    pub fn last_key_value(&self) -> Option<(&str, &V)> {
        let node = &self.nodes[self.max_in_subtree(self.root?)];
        Some((&node.key, &node.value))
    }

    // Returns the leftmost node of the subtree rooted at `root`.
    fn min_in_subtree(&self, root: NodeId) -> NodeId {
        let mut cur = root;
        while let Some(left) = self.nodes[cur].left() {
            cur = left;
        }
        cur
    }

    // Returns the rightmost node of the subtree rooted at `root`.
    fn max_in_subtree(&self, root: NodeId) -> NodeId {
        let mut cur = root;
        while let Some(right) = self.nodes[cur].right() {
            cur = right;
        }
        cur
    }

    /// Returns an iterator over the entries of the tree, in ascending key order.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter::new(self)
    }

    /// Returns all the keys of the tree in ascending order.
    pub fn keys(&self) -> Vec<String> {
        self.iter().map(|(key, _)| key.to_owned()).collect()
    }

    /// Returns, in ascending order, all the keys `k` of the tree such that `min <= k <= max`.
    ///
    /// Subtrees that cannot hold a key within the bounds are not visited.
    pub fn range(&self, min: &str, max: &str) -> Vec<String> {
        let mut keys = Vec::new();

        if let Some(root) = self.root.filter(|_| min <= max) {
            self.range_at(root, min, max, &mut keys);
        }

        keys
    }

    fn range_at(&self, node: NodeId, min: &str, max: &str, keys: &mut Vec<String>) {
        let node = &self.nodes[node];
        let key = node.key.as_str();

        // Smaller keys can only qualify if this one is above the lower bound.
        if let Some(left) = node.left().filter(|_| key > min) {
            self.range_at(left, min, max, keys);
        }

        if min <= key && key <= max {
            keys.push(key.to_owned());
        }

        if let Some(right) = node.right().filter(|_| key < max) {
            self.range_at(right, min, max, keys);
        }
    }

    /// Returns the black depth of the tree.
    ///
    /// The black depth is the number of black nodes on any path from the root down to an absent
    /// leaf, excluding the root and counting the absent leaf. An empty tree has a black depth of 0.
    ///
    /// Every node is checked, so this runs in _O(n)_ time. An error is returned if the root is red
    /// or if two paths disagree, both of which indicate a defect in the tree.
    pub fn black_depth(&self) -> Result<usize, Unbalanced> {
        let Some(root) = self.root else {
            return Ok(0);
        };

        if self.nodes[root].color == Color::Red {
            return Err(Unbalanced::RedRoot);
        }

        self.black_depth_below(root)
    }

    fn black_depth_below(&self, node: NodeId) -> Result<usize, Unbalanced> {
        let left = self.black_depth_of(self.nodes[node].left())?;
        let right = self.black_depth_of(self.nodes[node].right())?;

        if left != right {
            return Err(Unbalanced::BlackDepthMismatch {
                key: self.nodes[node].key.clone(),
                left,
                right,
            });
        }

        Ok(left)
    }

    // Like `black_depth_below`, but counting `link` itself.
    fn black_depth_of(&self, link: Link) -> Result<usize, Unbalanced> {
        match link {
            None => Ok(1),
            Some(node) => {
                let below = self.black_depth_below(node)?;
                Ok(below + usize::from(self.nodes[node].color == Color::Black))
            }
        }
    }

    #[doc(hidden)]
    pub fn assert_invariants(&self) {
        if let Some(root) = self.root {
            assert_eq!(self.nodes[root].parent, None, "root has a parent");
            self.assert_invariants_at(root, None, None);
        }

        if let Err(unbalanced) = self.black_depth() {
            panic!("{unbalanced}");
        }

        assert_eq!(self.size(), self.nodes.len(), "unreachable nodes in the arena");
    }

    fn assert_invariants_at(&self, node: NodeId, lower: Option<&str>, upper: Option<&str>) {
        let n = &self.nodes[node];

        if let Some(lower) = lower {
            assert!(lower < n.key.as_str(), "{:?} is not above {lower:?}", n.key);
        }

        if let Some(upper) = upper {
            assert!(n.key.as_str() < upper, "{:?} is not below {upper:?}", n.key);
        }

        for dir in [Dir::Left, Dir::Right] {
            if let Some(child) = n.child(dir) {
                let c = &self.nodes[child];

                // Ensure child's parent link points to this node.
                assert_eq!(c.parent, Some(node), "bad parent link below {:?}", n.key);

                // Ensure there are no two consecutive red nodes.
                assert!(
                    n.color == Color::Black || c.color == Color::Black,
                    "red node {:?} has a red child {:?}",
                    n.key,
                    c.key
                );

                let (lower, upper) = match dir {
                    Dir::Left => (lower, Some(n.key.as_str())),
                    Dir::Right => (Some(n.key.as_str()), upper),
                };

                self.assert_invariants_at(child, lower, upper);
            }
        }
    }

    /// Inserts `value` under a private copy of `key`.
    ///
    /// If `key` is already present, the tree is not modified and `value` is returned inside the
    /// error.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn insert(&mut self, key: &str, value: V) -> Result<(), DuplicateKey<V>> {
        let mut parent = None;
        let mut dir = Dir::Left;
        let mut opt_cur = self.root;

        // Descend the tree, looking for the absent child to replace.
        while let Some(cur) = opt_cur {
            let node = &self.nodes[cur];

            dir = match key.cmp(node.key.as_str()) {
                Ordering::Less => Dir::Left,
                Ordering::Equal => {
                    debug!("rejecting duplicate key {key:?}");
                    return Err(DuplicateKey::new(key, value));
                }
                Ordering::Greater => Dir::Right,
            };

            parent = Some(cur);
            opt_cur = node.child(dir);
        }

        let node = self.nodes.insert(Node::new(key, value, parent));

        match parent {
            Some(parent) => {
                self.nodes[parent].set_child(dir, Some(node));
            }
            None => self.root = Some(node),
        }

        self.rebalance_inserted(node);

        Ok(())
    }

    // Performs a bottom-up rebalance of the tree after the insertion of `node`.
    //
    // Invariants:
    // - `node` is red and has no children.
    // - The only invariant possibly violated is (2), between `node` and its parent.
    fn rebalance_inserted(&mut self, node: NodeId) {
        let mut x = node;

        while let Some(parent) = self.nodes[x].parent.filter(|&p| self.is_red(Some(p))) {
            // The parent is red, so it is not the root (5).
            let Some(grandparent) = self.nodes[parent].parent else {
                break;
            };

            let parent_dir = self.which_child(grandparent, Some(parent));
            let uncle = self.nodes[grandparent].child(!parent_dir);

            if let Some(uncle) = uncle.filter(|&u| self.is_red(Some(u))) {
                // Push the red up two levels. This may now violate (2) at `g(x)`.
                trace!("insert: red uncle, recoloring below {:?}", self.nodes[grandparent].key);

                self.nodes[parent].color = Color::Black;
                self.nodes[uncle].color = Color::Black;
                self.nodes[grandparent].color = Color::Red;

                x = grandparent;
                continue;
            }

            let mut parent = parent;

            if self.which_child(parent, Some(x)) != parent_dir {
                // `x` is an inner grandchild. Straighten the path so that it becomes the parent of
                // its former parent.
                trace!("insert: inner grandchild, rotating {:?}", self.nodes[parent].key);

                self.rotate(parent, parent_dir);
                (x, parent) = (parent, x);
            }

            trace!("insert: outer grandchild, rotating {:?}", self.nodes[grandparent].key);

            self.nodes[parent].color = Color::Black;
            self.nodes[grandparent].color = Color::Red;
            self.rotate(grandparent, !parent_dir);

            debug_assert_eq!(self.nodes[x].parent, Some(parent));
            break;
        }

        if let Some(root) = self.root {
            self.nodes[root].color = Color::Black;
        }
    }

    /// Removes the entry for `key` from the tree, returning its value.
    ///
    /// Returns `None` without modifying the tree if `key` is not present.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn delete(&mut self, key: &str) -> Option<V> {
        let Some(node) = self.get_raw(key) else {
            debug!("key {key:?} not found for deletion");
            return None;
        };

        // If `node` has two children, its successor[^1] is spliced out in its place, after the
        // two entries have been exchanged. Either way, the node physically removed has at most one
        // child.
        //
        // [^1]: The successor of a node `a` is the least node in `a`'s right subtree.
        let removed = match (self.nodes[node].left(), self.nodes[node].right()) {
            (Some(_), Some(right)) => {
                let successor = self.min_in_subtree(right);
                self.swap_entries(node, successor);
                successor
            }
            _ => node,
        };

        let parent = self.nodes[removed].parent;
        let child = self.nodes[removed].left().or(self.nodes[removed].right());

        // Elevate the removed node's child (which may be absent) to replace it.
        self.replace_child_or_set_root(parent, removed, child);
        self.maybe_set_parent(child, parent);

        let removed = self.nodes.remove(removed);

        // Removing a black node shortens every path through its former position by one.
        if removed.color == Color::Black {
            self.rebalance_removed(child, parent);
        }

        Some(removed.value)
    }

    // Performs a bottom-up rebalance of the tree after the removal of a black node.
    //
    // Invariants:
    // - `x` occupies the position of the removed node, and `parent` is its parent.
    // - Paths through `x` have one black node fewer than paths through its sibling.
    fn rebalance_removed(&mut self, mut x: Link, mut parent: Link) {
        while let Some(p) = parent {
            if self.is_red(x) {
                break;
            }

            let dir = if self.nodes[p].left() == x {
                Dir::Left
            } else {
                Dir::Right
            };

            // The sibling carries at least one more black node than `x` (6).
            let mut sibling = self.nodes[p]
                .child(!dir)
                .expect("deficient node should have a sibling");

            if self.is_red(Some(sibling)) {
                // Case 1: convert to a black sibling by rotating the red one above `p`.
                trace!("delete: case 1 at {:?}", self.nodes[p].key);

                self.nodes[sibling].color = Color::Black;
                self.nodes[p].color = Color::Red;
                self.rotate(p, dir);

                sibling = self.nodes[p]
                    .child(!dir)
                    .expect("red sibling should have two children");
            }

            let near = self.nodes[sibling].child(dir);
            let far = self.nodes[sibling].child(!dir);

            if !self.is_red(near) && !self.is_red(far) {
                // Case 2: shorten the sibling's side as well, then move the deficiency up.
                trace!("delete: case 2 at {:?}", self.nodes[p].key);

                self.nodes[sibling].color = Color::Red;

                x = Some(p);
                parent = self.nodes[p].parent;
                continue;
            }

            if !self.is_red(far) {
                // Case 3: the near nephew is red. Rotate it above the sibling so that the far
                // nephew becomes red.
                trace!("delete: case 3 at {:?}", self.nodes[p].key);

                if let Some(near) = near {
                    self.nodes[near].color = Color::Black;
                }
                self.nodes[sibling].color = Color::Red;
                self.rotate(sibling, !dir);

                sibling = self.nodes[p]
                    .child(!dir)
                    .expect("rotation should leave a sibling");
            }

            // Case 4: the far nephew is red. Rotating the sibling above `p` adds a black node to
            // the paths through `x`, which resolves the deficiency.
            trace!("delete: case 4 at {:?}", self.nodes[p].key);

            self.nodes[sibling].color = self.nodes[p].color;
            self.nodes[p].color = Color::Black;
            if let Some(far) = self.nodes[sibling].child(!dir) {
                self.nodes[far].color = Color::Black;
            }
            self.rotate(p, dir);

            break;
        }

        if let Some(x) = x {
            self.nodes[x].color = Color::Black;
        }
    }

    /// Clears the tree, removing all elements.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
    }

    // Support methods ========================================================

    // Absent nodes are black.
    #[inline]
    fn is_red(&self, link: Link) -> bool {
        link.is_some_and(|node| self.nodes[node].color == Color::Red)
    }

    #[inline]
    fn which_child(&self, parent: NodeId, child: Link) -> Dir {
        if self.nodes[parent].left() == child {
            Dir::Left
        } else {
            Dir::Right
        }
    }

    #[inline]
    fn maybe_set_parent(&mut self, opt_node: Link, parent: Link) {
        if let Some(node) = opt_node {
            self.nodes[node].parent = parent;
        }
    }

    // Replaces the child link of `parent` pointing at `old_child` with `new_child`, or the root if
    // `parent` is `None`.
    //
    // `new_child`'s parent link is not updated.
    #[inline]
    fn replace_child_or_set_root(&mut self, parent: Link, old_child: NodeId, new_child: Link) {
        match parent {
            Some(parent) => {
                let dir = self.which_child(parent, Some(old_child));
                debug_assert_eq!(self.nodes[parent].child(dir), Some(old_child));
                self.nodes[parent].set_child(dir, new_child);
            }
            None => self.root = new_child,
        }
    }

    // Rotates the subtree rooted at `down` in direction `dir`, moving the `!dir` child of `down`
    // up into its place.
    //
    // Rotating left promotes the right child; rotating right promotes the left child. The in-order
    // sequence of keys is preserved and colors are not updated.
    fn rotate(&mut self, down: NodeId, dir: Dir) {
        let up = self.nodes[down]
            .child(!dir)
            .expect("rotated node must have a child to promote");

        // - `across` goes from the `dir` child of `up` to the `!dir` child of `down`.
        // - `down` becomes the `dir` child of `up`.
        let across = self.nodes[up].child(dir);
        self.nodes[down].set_child(!dir, across);
        self.maybe_set_parent(across, Some(down));

        let parent = self.nodes[down].parent;
        self.replace_child_or_set_root(parent, down, Some(up));
        self.nodes[up].parent = parent;

        self.nodes[up].set_child(dir, Some(down));
        self.nodes[down].parent = Some(up);
    }

    // Exchanges the keys and values of two distinct nodes, leaving their links and colors intact.
    fn swap_entries(&mut self, a: NodeId, b: NodeId) {
        if let Some((a, b)) = self.nodes.get2_mut(a, b) {
            mem::swap(&mut a.key, &mut b.key);
            mem::swap(&mut a.value, &mut b.value);
        }
    }
}

impl<V> Default for RbTree<V> {
    fn default() -> Self {
        RbTree::new()
    }
}

impl<V: fmt::Debug> fmt::Debug for RbTree<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'tree, V> IntoIterator for &'tree RbTree<V> {
    type Item = (&'tree str, &'tree V);
    type IntoIter = Iter<'tree, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
