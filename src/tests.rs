extern crate std;

use std::{ops::Range, prelude::v1::*};

use proptest::prelude::*;
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::model;

use super::*;

fn tree_of(keys: &[&str]) -> RbTree<usize> {
    let mut tree = RbTree::new();

    for (value, key) in keys.iter().enumerate() {
        tree.insert(key, value).expect("duplicate key");
        tree.assert_invariants();
    }

    tree
}

fn insert_find_all(keys: &[&str]) {
    let tree = tree_of(keys);

    for (value, key) in keys.iter().enumerate() {
        assert_eq!(tree.get(key), Some(&value), "item not found");
    }
}

#[test]
fn zero_elems_find() {
    insert_find_all(&[]);
}

#[test]
fn single_elem_find() {
    insert_find_all(&["0"]);
}

#[test]
fn two_elems_find() {
    insert_find_all(&["0", "1"]);
    insert_find_all(&["1", "0"]);
}

#[test]
fn three_elems_find() {
    insert_find_all(&["0", "1", "2"]);
    insert_find_all(&["0", "2", "1"]);
    insert_find_all(&["1", "0", "2"]);
    insert_find_all(&["1", "2", "0"]);
    insert_find_all(&["2", "0", "1"]);
    insert_find_all(&["2", "1", "0"]);
}

// Calls `f` with every permutation of `keys` (Heap's algorithm).
fn for_each_permutation(keys: &mut [&'static str], f: &mut impl FnMut(&[&str])) {
    fn permute(k: usize, keys: &mut [&'static str], f: &mut impl FnMut(&[&str])) {
        if k <= 1 {
            f(keys);
            return;
        }

        for i in 0..k {
            permute(k - 1, keys, f);
            let j = if k % 2 == 0 { i } else { 0 };
            keys.swap(j, k - 1);
        }
    }

    permute(keys.len(), keys, f);
}

#[test]
fn five_elems_find() {
    for_each_permutation(&mut ["0", "1", "2", "3", "4"], &mut insert_find_all);
}

fn insert_remove_all(keys: &[&str]) {
    let mut tree = tree_of(keys);

    for (value, key) in keys.iter().enumerate() {
        assert_eq!(tree.delete(key), Some(value));
        tree.assert_invariants();
    }

    assert!(tree.is_empty());

    for (value, key) in keys.iter().enumerate() {
        tree.insert(key, value).expect("duplicate key");
        tree.assert_invariants();
    }

    for (value, key) in keys.iter().enumerate().rev() {
        assert_eq!(tree.delete(key), Some(value));
        tree.assert_invariants();
    }

    assert!(tree.is_empty());
}

#[test]
fn remove_one() {
    insert_remove_all(&["0"]);
}

#[test]
fn remove_two() {
    insert_remove_all(&["0", "1"]);
    insert_remove_all(&["1", "0"]);
}

#[test]
fn remove_three() {
    insert_remove_all(&["0", "1", "2"]);
    insert_remove_all(&["0", "2", "1"]);
    insert_remove_all(&["1", "0", "2"]);
    insert_remove_all(&["1", "2", "0"]);
    insert_remove_all(&["2", "0", "1"]);
    insert_remove_all(&["2", "1", "0"]);
}

#[test]
fn remove_six() {
    for_each_permutation(&mut ["0", "1", "2", "3", "4", "5"], &mut insert_remove_all);
}

#[test]
fn small_tree_scenario() {
    let tree = tree_of(&["5", "3", "8", "1", "4"]);

    assert_eq!(tree.keys(), ["1", "3", "4", "5", "8"]);
    assert_eq!(tree.black_depth(), Ok(2));
    assert_eq!(tree.minimum(), Some("1"));
    assert_eq!(tree.maximum(), Some("8"));
    assert_eq!(tree.first_key_value(), Some(("1", &3)));
    assert_eq!(tree.last_key_value(), Some(("8", &2)));
    assert_eq!(tree.size(), 5);
}

#[test]
fn duplicate_insert_is_rejected() {
    let mut tree = RbTree::new();

    tree.insert("5", "first").unwrap();
    let err = tree.insert("5", "second").unwrap_err();

    assert_eq!(err.key, "5");
    assert_eq!(err.to_string(), "key \"5\" is already present in the tree");
    assert_eq!(err.into_value(), "second");
    assert_eq!(tree.size(), 1);
    assert_eq!(tree.get("5"), Some(&"first"));
    tree.assert_invariants();
}

#[test]
fn delete_missing_key() {
    let mut tree = tree_of(&["5", "3", "8"]);

    assert_eq!(tree.delete("9"), None);
    assert_eq!(tree.size(), 3);
    tree.assert_invariants();

    let mut empty: RbTree<()> = RbTree::new();
    assert_eq!(empty.delete("9"), None);
    assert!(empty.is_empty());
}

#[test]
fn delete_node_with_two_children_returns_its_own_value() {
    let mut tree = tree_of(&["5", "3", "8", "1", "4", "7", "9"]);

    // "5" is the root, its successor is "7".
    assert_eq!(tree.delete("5"), Some(0));
    assert_eq!(tree.get("5"), None);
    assert_eq!(tree.get("7"), Some(&5));
    assert_eq!(tree.keys(), ["1", "3", "4", "7", "8", "9"]);
    tree.assert_invariants();
}

#[test]
fn empty_tree_queries() {
    let tree: RbTree<u8> = RbTree::default();

    assert!(tree.is_empty());
    assert_eq!(tree.size(), 0);
    assert_eq!(tree.minimum(), None);
    assert_eq!(tree.maximum(), None);
    assert_eq!(tree.get("a"), None);
    assert!(tree.keys().is_empty());
    assert!(tree.range("a", "z").is_empty());
    assert_eq!(tree.black_depth(), Ok(0));
    assert_eq!(tree.iter().next(), None);
}

#[test]
fn range_is_lexicographic() {
    let tree = tree_of(&["1", "15", "2", "25", "3"]);

    assert_eq!(tree.range("1", "2"), ["1", "15", "2"]);
    assert_eq!(tree.range("10", "24"), ["15", "2"]);
    assert_eq!(tree.range("0", "9"), ["1", "15", "2", "25", "3"]);
    assert_eq!(tree.range("4", "9"), Vec::<String>::new());
    assert_eq!(tree.range("3", "1"), Vec::<String>::new());
}

#[test]
fn returned_keys_are_copies() {
    let tree = tree_of(&["b", "a", "c"]);

    let mut keys = tree.keys();
    keys[0].push_str("zzz");
    keys.clear();

    assert_eq!(tree.keys(), ["a", "b", "c"]);
}

#[test]
fn key_buffer_may_be_reused() {
    let mut tree = RbTree::new();
    let mut buffer = String::new();

    for i in 0..10 {
        buffer.clear();
        buffer.push_str(&format!("key{i}"));
        tree.insert(&buffer, i).unwrap();
    }

    drop(buffer);
    assert_eq!(tree.get("key7"), Some(&7));
    tree.assert_invariants();
}

#[test]
fn values_are_borrowed() {
    let values: Vec<String> = (0..20).map(|i| format!("value {i}")).collect();
    let mut tree: RbTree<&String> = RbTree::new();

    for (i, value) in values.iter().enumerate() {
        tree.insert(&i.to_string(), value).unwrap();
    }

    assert_eq!(tree.delete("7"), Some(&values[7]));
    drop(tree);

    // The tree never owned the values.
    assert_eq!(values.len(), 20);
}

#[test]
fn get_mut_and_clear() {
    let mut tree = tree_of(&["x", "y", "z"]);

    *tree.get_mut("y").unwrap() += 100;
    assert_eq!(tree.get("y"), Some(&101));
    assert!(tree.get_mut("w").is_none());
    assert!(tree.contains_key("z"));

    tree.clear();
    assert!(tree.is_empty());
    assert_eq!(tree.black_depth(), Ok(0));

    tree.insert("a", 1).unwrap();
    tree.assert_invariants();
}

#[test]
fn black_depth_detects_corruption() {
    let mut tree = tree_of(&["2", "1", "3"]);
    assert_eq!(tree.black_depth(), Ok(1));

    let root = tree.root.unwrap();
    tree.nodes[root].color = Color::Red;
    assert_eq!(tree.black_depth(), Err(Unbalanced::RedRoot));
    tree.nodes[root].color = Color::Black;

    let left = tree.nodes[root].left().unwrap();
    tree.nodes[left].color = Color::Black;
    assert_eq!(
        tree.black_depth(),
        Err(Unbalanced::BlackDepthMismatch {
            key: "2".to_owned(),
            left: 2,
            right: 1,
        })
    );
}

#[test]
fn rotations_preserve_order() {
    let mut tree = tree_of(&["4", "2", "6", "1", "3", "5", "7"]);
    let keys = tree.keys();

    let root = tree.root.unwrap();
    tree.rotate(root, Dir::Left);
    assert_eq!(tree.nodes[tree.root.unwrap()].key, "6");
    assert_eq!(tree.keys(), keys);

    let root = tree.root.unwrap();
    tree.rotate(root, Dir::Right);
    assert_eq!(tree.nodes[tree.root.unwrap()].key, "4");
    assert_eq!(tree.keys(), keys);
    tree.assert_invariants();
}

#[test]
fn height_is_logarithmic() {
    fn height(tree: &RbTree<usize>, link: Link) -> usize {
        link.map_or(0, |node| {
            let node = &tree.nodes[node];
            1 + height(tree, node.left()).max(height(tree, node.right()))
        })
    }

    let keys: Vec<String> = (0..1024).map(|i| format!("{i:05}")).collect();
    let mut tree = RbTree::new();

    // Sorted insertion is the worst case for an unbalanced tree.
    for (i, key) in keys.iter().enumerate() {
        tree.insert(key, i).unwrap();
    }

    tree.assert_invariants();
    // h <= 2 * log2(n + 1)
    assert!(height(&tree, tree.root) <= 20);
}

#[test]
fn random_insert_delete_with_checks() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x5eed);
    let mut keys: Vec<String> = (0..100)
        .map(|_| rng.gen::<i32>().to_string())
        .collect();
    keys.sort_unstable();
    keys.dedup();
    keys.shuffle(&mut rng);

    let mut tree = RbTree::new();
    for (i, key) in keys.iter().enumerate() {
        tree.insert(key, i).unwrap();
        assert!(tree.black_depth().is_ok());
    }

    assert_eq!(tree.size(), keys.len());

    keys.shuffle(&mut rng);
    for key in &keys {
        assert!(tree.delete(key).is_some());
        assert!(tree.black_depth().is_ok());
        tree.assert_invariants();
    }

    assert!(tree.is_empty());
}

#[test]
fn iter_matches_keys() {
    let tree = tree_of(&["m", "c", "x", "a", "e", "q", "z", "d"]);

    let iterated: Vec<&str> = tree.iter().map(|(k, _)| k).collect();
    assert_eq!(iterated, tree.keys());
    assert_eq!(tree.iter().len(), 8);
    assert_eq!((&tree).into_iter().count(), 8);
    assert_eq!(format!("{:?}", tree_of(&["b", "a"])), r#"{"a": 1, "b": 0}"#);
}

#[test]
fn dotgraph_lists_every_node() {
    let mut out = String::new();
    RbTree::<()>::new().dotgraph("empty", &mut out).unwrap();
    assert_eq!(out, "digraph \"graph-empty\" {}");

    let tree = tree_of(&["b", "a", "c"]);
    let mut out = String::new();
    tree.dotgraph("t", &mut out).unwrap();

    assert!(out.starts_with("digraph \"graph-t\""));
    assert!(out.contains("\"grapht-b\" [label=\"b\", style=filled, fillcolor=black"));
    assert!(out.contains("\"grapht-a\" [label=\"a\", style=filled, fillcolor=red"));
    assert!(out.contains("\"grapht-b\" -> \"grapht-c\";"));
    assert_eq!(out.matches("shape=point").count(), 4);
}

#[cfg(miri)]
const FUZZ_RANGE: Range<usize> = 0..10;

#[cfg(not(miri))]
const FUZZ_RANGE: Range<usize> = 0..1000;

proptest::proptest! {
    #![proptest_config(ProptestConfig {
        max_shrink_iters: 65536,
        .. ProptestConfig::default()
    })]

    #[test]
    fn btree_equivalence(ops in proptest::collection::vec(model::op_strategy(), FUZZ_RANGE)) {
        model::run_btree_equivalence(ops);
    }

    #[test]
    fn range_is_subsequence_of_keys(
        keys in proptest::collection::btree_set("[a-d]{0,3}", 0..64),
        min in "[a-d]{0,3}",
        max in "[a-d]{0,3}",
    ) {
        let mut tree = RbTree::new();
        for key in &keys {
            tree.insert(key, ()).unwrap();
        }

        let expected: Vec<String> = tree
            .keys()
            .into_iter()
            .filter(|k| min.as_str() <= k.as_str() && k.as_str() <= max.as_str())
            .collect();

        prop_assert_eq!(tree.range(&min, &max), expected);
    }
}
