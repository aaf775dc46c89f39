use core::iter::FusedIterator;

use crate::{Dir, Link, RbTree};

enum CameFrom {
    Parent,
    LeftChild,
    Here,
    RightChild,
}

/// An iterator over the entries of an [`RbTree`], in ascending key order.
///
/// Created by [`RbTree::iter`].
pub struct Iter<'tree, V> {
    tree: &'tree RbTree<V>,

    front_cur: Link,
    front_from: CameFrom,

    len: usize,
}

impl<'tree, V> Iter<'tree, V> {
    pub(crate) fn new(tree: &'tree RbTree<V>) -> Self {
        Iter {
            tree,

            front_cur: tree.root,
            front_from: CameFrom::Parent,
            len: tree.nodes.len(),
        }
    }
}

impl<'tree, V> Iterator for Iter<'tree, V> {
    type Item = (&'tree str, &'tree V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }

        let nodes = &self.tree.nodes;
        let mut cur = self.front_cur?;

        loop {
            match self.front_from {
                CameFrom::Parent => {
                    // Upon entering a new subtree, find the minimum element.
                    cur = self.tree.min_in_subtree(cur);

                    // Once the minimum is found, its (empty) left subtree has been exhausted.
                    self.front_from = CameFrom::LeftChild;
                }

                CameFrom::LeftChild => {
                    // The left subtree has been exhausted, so this node is up next. Save off the
                    // iterator state and return it.
                    self.front_cur = Some(cur);
                    self.front_from = CameFrom::Here;
                    self.len -= 1;

                    let node = &nodes[cur];
                    return Some((node.key.as_str(), &node.value));
                }

                CameFrom::Here => {
                    // The current node was just yielded.
                    if let Some(right) = nodes[cur].right() {
                        // If the right subtree is not empty, go there.
                        self.front_from = CameFrom::Parent;

                        cur = right;
                    } else if let Some(parent) = nodes[cur].parent {
                        // Otherwise, ascend one level.
                        self.front_from = match self.tree.which_child(parent, Some(cur)) {
                            Dir::Left => CameFrom::LeftChild,
                            Dir::Right => CameFrom::RightChild,
                        };

                        cur = parent;
                    } else {
                        unreachable!("remaining elements but no way up from the root")
                    }
                }

                CameFrom::RightChild => {
                    // Ascend until we find the successor element.
                    while let Some(parent) = nodes[cur].parent {
                        match self.tree.which_child(parent, Some(cur)) {
                            Dir::Left => {
                                cur = parent;
                                break;
                            }
                            Dir::Right => cur = parent,
                        }
                    }

                    self.front_cur = Some(cur);
                    self.front_from = CameFrom::LeftChild;
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}

impl<V> FusedIterator for Iter<'_, V> {}
