use thiserror::Error;

/// Returned by [`RbTree::insert`](crate::RbTree::insert) when the key is already present.
///
/// The tree is left untouched and the rejected value is handed back to the caller.
#[derive(Debug, Error)]
#[error("key {key:?} is already present in the tree")]
pub struct DuplicateKey<V> {
    pub key: String,
    pub value: V,
}

impl<V> DuplicateKey<V> {
    pub(crate) fn new(key: &str, value: V) -> Self {
        DuplicateKey {
            key: key.to_owned(),
            value,
        }
    }

    /// Returns the value that was rejected.
    pub fn into_value(self) -> V {
        self.value
    }
}

/// A broken red-black invariant detected by [`RbTree::black_depth`](crate::RbTree::black_depth).
///
/// This never results from valid use of the public API; seeing it means the balancing engine is
/// defective.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Unbalanced {
    #[error("the root node is red")]
    RedRoot,

    #[error("black depth mismatch below {key:?}: left subtree has {left}, right subtree has {right}")]
    BlackDepthMismatch {
        key: String,
        left: usize,
        right: usize,
    },
}
