extern crate std;

use std::{collections::BTreeMap, prelude::v1::*};

use arbitrary::Arbitrary;
use proptest::strategy::{Just, Strategy};

use crate::RbTree;

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum ItemValue {
    /// Picks one of the keys currently in the tree.
    Index(usize),
    /// A key which may or may not be in the tree.
    Random(u32),
}

proptest::prop_compose! {
    fn index_strategy()(
        index in 0usize..1000,
    ) -> ItemValue {
        ItemValue::Index(index)
    }
}

proptest::prop_compose! {
    fn random_strategy()(
        random in 0u32..1000,
    ) -> ItemValue {
        ItemValue::Random(random)
    }
}

fn value_strategy() -> impl Strategy<Value = ItemValue> {
    proptest::prop_oneof![index_strategy(), random_strategy()]
}

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum Op {
    Insert(ItemValue),
    Get(ItemValue),
    Delete(ItemValue),
    Minimum,
    Maximum,
    Range(ItemValue, ItemValue),
    BlackDepth,
}

impl Op {
    fn finalize(self, model: &BTreeMap<String, u32>) -> FinalOp {
        // Decimal keys make lexicographic order differ from numeric order ("10" < "9").
        fn get_key(m: &BTreeMap<String, u32>, i: ItemValue) -> String {
            match i {
                ItemValue::Index(idx) => match m.keys().nth(idx % m.len().max(1)) {
                    Some(key) => key.clone(),
                    None => idx.to_string(),
                },
                ItemValue::Random(v) => v.to_string(),
            }
        }

        match self {
            Op::Insert(item) => FinalOp::Insert(get_key(model, item)),
            Op::Get(item) => FinalOp::Get(get_key(model, item)),
            Op::Delete(item) => FinalOp::Delete(get_key(model, item)),
            Op::Minimum => FinalOp::Minimum,
            Op::Maximum => FinalOp::Maximum,
            Op::Range(a, b) => FinalOp::Range(get_key(model, a), get_key(model, b)),
            Op::BlackDepth => FinalOp::BlackDepth,
        }
    }
}

#[derive(Clone, Debug)]
enum FinalOp {
    Insert(String),
    Get(String),
    Delete(String),
    Minimum,
    Maximum,
    Range(String, String),
    BlackDepth,
}

pub fn op_strategy() -> impl Strategy<Value = Op> {
    proptest::prop_oneof![
        value_strategy().prop_map(Op::Insert),
        value_strategy().prop_map(Op::Get),
        value_strategy().prop_map(Op::Delete),
        Just(Op::Minimum),
        Just(Op::Maximum),
        (value_strategy(), value_strategy()).prop_map(|(a, b)| Op::Range(a, b)),
        Just(Op::BlackDepth),
    ]
}

/// Replays `ops` against both an [`RbTree`] and a [`BTreeMap`], asserting that they agree after
/// every operation and that the tree's invariants hold.
pub fn run_btree_equivalence(ops: Vec<Op>) {
    let mut btree: BTreeMap<String, u32> = BTreeMap::new();
    let mut rb: RbTree<u32> = RbTree::new();

    // Every inserted value is unique, so a wrong value for a key is detected.
    let mut next_value = 0u32;

    for (op_id, op) in ops.into_iter().enumerate() {
        let final_op = op.finalize(&btree);

        match &final_op {
            FinalOp::Insert(key) => {
                let value = next_value;
                next_value += 1;

                let from_btree = if btree.contains_key(key) {
                    Some(value)
                } else {
                    btree.insert(key.clone(), value);
                    None
                };
                let from_rb = rb.insert(key, value).err().map(|e| e.into_value());

                assert_eq!(from_btree, from_rb, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Get(key) => {
                let from_btree = btree.get(key);
                let from_rb = rb.get(key);

                assert_eq!(from_btree, from_rb, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Delete(key) => {
                let from_btree = btree.remove(key);
                let from_rb = rb.delete(key);

                assert_eq!(from_btree, from_rb, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Minimum => {
                let from_btree = btree.keys().next().map(String::as_str);
                let from_rb = rb.minimum();

                assert_eq!(from_btree, from_rb, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Maximum => {
                let from_btree = btree.keys().next_back().map(String::as_str);
                let from_rb = rb.maximum();

                assert_eq!(from_btree, from_rb, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Range(min, max) => {
                let from_btree: Vec<String> = btree
                    .keys()
                    .filter(|&k| min <= k && k <= max)
                    .cloned()
                    .collect();
                let from_rb = rb.range(min, max);

                assert_eq!(from_btree, from_rb, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::BlackDepth => {
                let depth = rb.black_depth();
                assert!(depth.is_ok(), "FinalOp #{op_id}: {final_op:?}: {depth:?}");
            }
        }

        rb.assert_invariants();
        assert_eq!(btree.len(), rb.size());
        assert_eq!(btree.is_empty(), rb.is_empty());
        assert!(btree.keys().eq(rb.keys().iter()));
        assert!(btree
            .iter()
            .map(|(k, v)| (k.as_str(), v))
            .eq(rb.iter()));
    }
}
