//! Property-based tests for ownership invariants.
//!
//! Random sequences of adopt/reset/release/move/swap operations run over
//! two handles. Whatever the sequence, every allocation must be destroyed
//! exactly once, the policy must never see the same value twice, and values
//! handed out by `release` must never reach the policy.

mod common;

use common::{Counted, Ledger, empty};
use proptest::prelude::*;
use std::collections::HashSet;
use std::mem;
use std::rc::Rc;

#[derive(Debug, Clone, Copy)]
enum Op {
    Adopt(usize),
    Reset(usize),
    Release(usize),
    Move { from: usize, to: usize },
    Swap,
    Drop(usize),
}

fn slot() -> impl Strategy<Value = usize> {
    0usize..2
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => slot().prop_map(Op::Adopt),
        1 => slot().prop_map(Op::Reset),
        1 => slot().prop_map(Op::Release),
        2 => (slot(), slot()).prop_map(|(from, to)| Op::Move { from, to }),
        1 => Just(Op::Swap),
        1 => slot().prop_map(Op::Drop),
    ]
}

/// Applies `ops` to two handles and returns the ids handed out by `release`.
fn run(ledger: &Rc<Ledger>, ops: &[Op]) -> Vec<u64> {
    let mut slots: [Counted; 2] = [empty(ledger), empty(ledger)];
    let mut handed_out = Vec::new();

    for &op in ops {
        match op {
            Op::Adopt(i) => {
                let (raw, _) = ledger.alloc();
                unsafe { slots[i].reset_raw(raw) };
            }
            Op::Reset(i) => slots[i].reset(),
            Op::Release(i) => {
                if let Some(raw) = slots[i].release() {
                    let boxed = unsafe { Box::from_raw(raw.as_ptr()) };
                    handed_out.push(boxed.id);
                }
            }
            Op::Move { from, to } => {
                // `slot = slot` cannot be written under the borrow rules, so
                // only distinct slots are moved.
                if from != to {
                    let moved = mem::replace(&mut slots[from], empty(ledger));
                    slots[to] = moved;
                }
            }
            Op::Swap => {
                let [left, right] = &mut slots;
                left.swap(right);
            }
            Op::Drop(i) => drop(mem::replace(&mut slots[i], empty(ledger))),
        }
    }

    handed_out
}

proptest! {
    #[test]
    fn every_allocation_destroyed_exactly_once(ops in prop::collection::vec(op(), 0..64)) {
        let ledger = Ledger::new();
        let handed_out = run(&ledger, &ops);

        let mut dropped = ledger.dropped();
        dropped.sort_unstable();
        let created: Vec<u64> = (0..ledger.created()).collect();
        prop_assert_eq!(dropped, created);

        let released = ledger.released();
        let unique: HashSet<u64> = released.iter().copied().collect();
        prop_assert_eq!(unique.len(), released.len(), "policy saw a value twice");

        for id in handed_out {
            prop_assert!(!unique.contains(&id), "released value {} reached the policy", id);
        }
    }

    #[test]
    fn moved_from_handle_is_empty(adopt in any::<bool>()) {
        let ledger = Ledger::new();
        let mut source = empty(&ledger);
        if adopt {
            let (raw, _) = ledger.alloc();
            unsafe { source.reset_raw(raw) };
        }

        let target = mem::replace(&mut source, empty(&ledger));
        prop_assert!(source.is_null());
        prop_assert_eq!(target.is_some(), adopt);
    }
}
