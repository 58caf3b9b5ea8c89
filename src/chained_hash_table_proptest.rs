#![cfg(test)]

// Property tests for ChainedHashTable kept inside the crate so they can
// share helpers with the unit tests without widening the public API.

use crate::chained_hash_table::ChainedHashTable;
use proptest::prelude::*;
use std::collections::HashSet;

type Table = ChainedHashTable<u16, fn(&u16) -> u64>;

fn identity(x: &u16) -> u64 {
    u64::from(*x)
}

fn constant(_: &u16) -> u64 {
    0
}

// Pool-indexed operations: values are drawn from a small pool so duplicates
// and collisions are frequent, and shrinking moves toward earlier values.
#[derive(Clone, Debug)]
enum Op {
    Add(usize),
    Contains(u16),
    CheckSlot(usize),
    CloneAndDiverge(u16),
    TakeAndRestore,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<u16>, Vec<Op>)> {
    proptest::collection::vec(any::<u16>(), 1..=48).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let op = prop_oneof![
            4 => idx.clone().prop_map(Op::Add),
            2 => any::<u16>().prop_map(Op::Contains),
            1 => (0usize..200).prop_map(Op::CheckSlot),
            1 => any::<u16>().prop_map(Op::CloneAndDiverge),
            1 => Just(Op::TakeAndRestore),
        ];
        proptest::collection::vec(op, 1..120).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn check_structure(sut: &Table, model: &HashSet<u16>) -> Result<(), TestCaseError> {
    let hash = sut.hasher();
    prop_assert_eq!(sut.len(), model.len());
    prop_assert_eq!(sut.is_empty(), model.is_empty());
    prop_assert!(sut.len() * 5 <= sut.capacity() * 4, "load factor above 0.8");
    let per_slot: usize = (0..sut.capacity()).map(|i| sut.elements_at_index(i)).sum();
    prop_assert_eq!(per_slot, sut.len());
    for e in model {
        let slot = (hash(e) % sut.capacity() as u64) as usize;
        prop_assert!(sut.is_element_at_index(e, slot), "{} not at slot {}", e, slot);
    }
    Ok(())
}

fn run_state_machine(
    hash: fn(&u16) -> u64,
    pool: &[u16],
    ops: Vec<Op>,
) -> Result<(), TestCaseError> {
    let mut sut: Table = ChainedHashTable::with_hasher(hash);
    let mut model: HashSet<u16> = HashSet::new();

    for op in ops {
        match op {
            Op::Add(i) => {
                let v = pool[i];
                let fresh = model.insert(v);
                prop_assert_eq!(sut.add(v), fresh);
            }
            Op::Contains(v) => {
                prop_assert_eq!(sut.contains(&v), model.contains(&v));
            }
            Op::CheckSlot(i) => {
                let n = sut.elements_at_index(i);
                if i >= sut.capacity() {
                    prop_assert_eq!(n, 0);
                } else {
                    let expected = model
                        .iter()
                        .filter(|&e| (hash(e) % sut.capacity() as u64) as usize == i)
                        .count();
                    prop_assert_eq!(n, expected);
                }
            }
            Op::CloneAndDiverge(v) => {
                let mut copy = sut.clone();
                let added = copy.add(v);
                prop_assert_eq!(added, !model.contains(&v));
                prop_assert!(copy.contains(&v));
                prop_assert_eq!(sut.contains(&v), model.contains(&v));
                prop_assert_eq!(sut.len(), model.len());
            }
            Op::TakeAndRestore => {
                let moved = sut.take();
                prop_assert!(sut.is_empty());
                prop_assert_eq!(moved.len(), model.len());
                for e in &model {
                    prop_assert!(!sut.contains(e));
                    prop_assert!(moved.contains(e));
                }
                sut = moved;
            }
        }
        check_structure(&sut, &model)?;
    }
    Ok(())
}

// Property: state-machine equivalence against std::collections::HashSet.
// Invariants exercised across random operation sequences:
// - `add` reports insertion exactly when the model did not hold the value.
// - `contains` parity with the model, including never-added values.
// - Load factor <= 0.8, per-slot counts sum to `len`, and every element sits
//   at `hash % capacity` after each step (so across every resize).
// - Clones diverge independently; `take` empties the source.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run_state_machine(identity, &pool, ops)?;
    }
}

// Property: same invariants under worst-case collisions, where every element
// lands in slot 0 and equality alone resolves membership.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_state_machine(constant, &pool, ops)?;
    }
}
