use super::*;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::BTreeSet;

fn validate_tree<A: NodeAllocator>(t: &CritBitTree<A>) {
    let alloc = t.allocator();

    // (node, parent's (crit_byte, other_bits))
    let mut stack: Vec<(NodeRef, Option<(usize, u8)>)> = Vec::new();
    if let Some(root) = t.root() {
        stack.push((root, None));
    }

    let mut leaf_count = 0usize;
    while let Some((r, parent)) = stack.pop() {
        if r.is_leaf() {
            leaf_count += 1;
            let key = alloc.leaf(r);
            assert!(t.contains(key), "leaf {key:?} unreachable by its own walk");
            continue;
        }

        let node = alloc.internal(r);
        assert_eq!(
            node.other_bits.count_zeros(),
            1,
            "other_bits {:#04x} must clear exactly one bit",
            node.other_bits
        );
        let pos = (node.crit_byte, node.other_bits);
        if let Some(parent) = parent {
            assert!(
                pos > parent,
                "split {pos:?} must sort after its parent {parent:?}"
            );
        }
        stack.push((node.child[0], Some(pos)));
        stack.push((node.child[1], Some(pos)));
    }

    assert_eq!(leaf_count, t.len(), "reachable leaf count must match len");
    assert_eq!(t.is_empty(), t.len() == 0);
}

fn key_strategy() -> impl Strategy<Value = Vec<u8>> + Clone {
    // Zero bytes would make keys that differ only by trailing 0x00 collide
    // under zero padding; those are rejected and covered by unit tests.
    prop::collection::vec(1u8..=255, 0..=24)
}

/// Short keys over a tiny alphabet, so prefixes and duplicates are common.
fn dense_key_strategy() -> impl Strategy<Value = Vec<u8>> + Clone {
    prop::collection::vec(b'a'..=b'c', 0..=6)
}

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    #[proptest(weight = 50)]
    Insert(#[proptest(strategy = "key_strategy()")] Vec<u8>),
    #[proptest(weight = 25)]
    Remove(#[proptest(strategy = "key_strategy()")] Vec<u8>),
    #[proptest(weight = 24)]
    Contains(#[proptest(strategy = "key_strategy()")] Vec<u8>),
    #[proptest(weight = 1)]
    Prefix(#[proptest(strategy = "key_strategy()")] Vec<u8>),
}

#[derive(Clone, Debug, Arbitrary)]
enum DenseOp {
    #[proptest(weight = 3)]
    Insert(#[proptest(strategy = "dense_key_strategy()")] Vec<u8>),
    #[proptest(weight = 2)]
    Remove(#[proptest(strategy = "dense_key_strategy()")] Vec<u8>),
    #[proptest(weight = 1)]
    Prefix(#[proptest(strategy = "dense_key_strategy()")] Vec<u8>),
}

fn expected_prefixed(m: &BTreeSet<Vec<u8>>, prefix: &[u8]) -> Vec<Vec<u8>> {
    m.iter().filter(|k| k.starts_with(prefix)).cloned().collect()
}

fn apply<A: NodeAllocator>(
    t: &mut CritBitTree<A>,
    m: &mut BTreeSet<Vec<u8>>,
    op: Op,
) -> std::result::Result<(), TestCaseError> {
    match op {
        Op::Insert(key) => {
            let expected = if m.contains(&key) {
                Err(Error::DuplicateKey)
            } else {
                Ok(())
            };
            prop_assert_eq!(t.insert(&key), expected);
            m.insert(key);
        }
        Op::Remove(key) => {
            let expected = if m.remove(&key) {
                Ok(())
            } else {
                Err(Error::NotFound)
            };
            prop_assert_eq!(t.remove(&key), expected);
        }
        Op::Contains(key) => {
            prop_assert_eq!(t.contains(&key), m.contains(&key));
        }
        Op::Prefix(prefix) => {
            let got: Vec<Vec<u8>> = t.all_prefixed(&prefix).map(|k| k.to_vec()).collect();
            prop_assert_eq!(got, expected_prefixed(m, &prefix));
        }
    }
    prop_assert_eq!(t.len(), m.len());
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence_arena(ops in prop::collection::vec(any::<Op>(), 0..=1000)) {
        let mut t = CritBitTree::new();
        let mut m: BTreeSet<Vec<u8>> = BTreeSet::new();
        for op in ops {
            apply(&mut t, &mut m, op)?;
        }

        validate_tree(&t);
        let got: Vec<Vec<u8>> = t.iter().map(|k| k.to_vec()).collect();
        let expected: Vec<Vec<u8>> = m.iter().cloned().collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_equivalence_heap(ops in prop::collection::vec(any::<Op>(), 0..=1000)) {
        let mut t = CritBitTree::with_allocator(Heap::new());
        let mut m: BTreeSet<Vec<u8>> = BTreeSet::new();
        for op in ops {
            apply(&mut t, &mut m, op)?;
        }

        validate_tree(&t);
        let stats = t.allocator().stats();
        prop_assert_eq!(stats.leaves, m.len());
        prop_assert_eq!(stats.internals, m.len().saturating_sub(1));
    }

    #[test]
    fn prop_dense_prefixes(ops in prop::collection::vec(any::<DenseOp>(), 0..=300)) {
        let mut t = CritBitTree::with_allocator(Heap::new());
        let mut m: BTreeSet<Vec<u8>> = BTreeSet::new();
        for op in ops {
            let op = match op {
                DenseOp::Insert(k) => Op::Insert(k),
                DenseOp::Remove(k) => Op::Remove(k),
                DenseOp::Prefix(p) => Op::Prefix(p),
            };
            apply(&mut t, &mut m, op)?;
            validate_tree(&t);
        }
    }

    #[test]
    fn prop_round_trip(keys in prop::collection::btree_set(key_strategy(), 0..200)) {
        let mut t = CritBitTree::new();
        for k in &keys {
            t.insert(k).unwrap();
        }
        prop_assert_eq!(t.len(), keys.len());

        let got: Vec<Vec<u8>> = t.iter().map(|k| k.to_vec()).collect();
        let expected: Vec<Vec<u8>> = keys.iter().cloned().collect();
        prop_assert_eq!(got, expected);

        // Removing an absent key leaves the full leaf set unchanged.
        let absent = b"\xff\xff\xff\xff\xff\xff\xff\xff\xff\xff\xff\xff\xff\xff\xff\xff\xff\xff\xff\xff\xff\xff\xff\xff\xff".to_vec();
        prop_assert_eq!(t.remove(&absent), Err(Error::NotFound));
        prop_assert_eq!(t.iter().count(), keys.len());
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

fn small_set() -> Vec<Vec<u8>> {
    ["a", "b", "c", "aa", "ab", "ba"]
        .iter()
        .map(|k| k.as_bytes().to_vec())
        .collect()
}

#[test]
fn exhaustive_insert_order_small_set() {
    let keys = small_set();
    let mut sorted = keys.clone();
    sorted.sort();

    for_each_permutation(&keys, |perm| {
        let mut t = CritBitTree::new();
        for k in &perm {
            t.insert(k).unwrap();
        }

        validate_tree(&t);
        let got: Vec<Vec<u8>> = t.iter().map(|k| k.to_vec()).collect();
        assert_eq!(got, sorted);
    });
}

#[test]
fn exhaustive_remove_order_small_set() {
    let keys = small_set();

    // Insert in a fixed order, then remove in all permutations.
    let mut base = CritBitTree::with_allocator(Heap::new());
    for k in &keys {
        base.insert(k).unwrap();
    }

    for_each_permutation(&keys, |perm| {
        let mut t = base.clone();
        let mut m: BTreeSet<Vec<u8>> = keys.iter().cloned().collect();

        for k in perm {
            assert_eq!(t.remove(&k), Ok(()));
            m.remove(&k);
            assert!(!t.contains(&k));
            assert_eq!(t.len(), m.len());
            validate_tree(&t);
            let got: Vec<Vec<u8>> = t.iter().map(|k| k.to_vec()).collect();
            let expected: Vec<Vec<u8>> = m.iter().cloned().collect();
            assert_eq!(got, expected);
        }
        assert!(t.is_empty());
        assert_eq!(t.allocator().stats(), AllocStats::default());
    });
}
