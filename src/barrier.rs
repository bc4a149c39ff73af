//! The `processed_block_id` ordering barrier (§4.4 step 6, §4.5 step 1, §5,
//! §9 "Lock-free ordering").
//!
//! A single atomic integer per stream, shared by every encode/decode task.
//! Each task spins (then yields) until the counter reaches its
//! predecessor's id, does its serialized work, and advances the counter —
//! or, on the decode side, observes [`CANCEL_TASKS_ID`] and stops waiting.

use crate::consts::CANCEL_TASKS_ID;
use std::cell::Cell;
use std::sync::atomic::{AtomicI64, Ordering};

/// Number of spin iterations attempted before falling back to
/// `thread::yield_now()`. Chosen to cover the common case where the
/// predecessor is already nearly done without burning a full OS scheduling
/// quantum on every wait.
const SPIN_LIMIT: u32 = 1000;

pub struct BlockBarrier {
    processed: AtomicI64,
}

impl BlockBarrier {
    /// A fresh barrier: no block has been processed yet (predecessor of
    /// block 1 is id 0).
    pub fn new() -> Self {
        BlockBarrier {
            processed: AtomicI64::new(0),
        }
    }

    /// Block until `processed_block_id == my_turn - 1`, or until the
    /// cancel sentinel is observed. Returns `false` on cancellation.
    pub fn wait_for(&self, my_turn: i64) -> bool {
        let mut spins: u32 = 0;
        loop {
            let cur = self.processed.load(Ordering::Acquire);
            if cur == CANCEL_TASKS_ID {
                return false;
            }
            if cur == my_turn - 1 {
                return true;
            }
            if spins < SPIN_LIMIT {
                std::hint::spin_loop();
                spins += 1;
            } else {
                std::thread::yield_now();
            }
        }
    }

    /// Store a new value (normal advance, or the cancel sentinel).
    pub fn advance(&self, to: i64) {
        self.processed.store(to, Ordering::Release);
    }

    /// Current value, for tests and diagnostics.
    pub fn current(&self) -> i64 {
        self.processed.load(Ordering::Acquire)
    }
}

impl Default for BlockBarrier {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard that advances a [`BlockBarrier`] when dropped, whatever the
/// outcome of the critical section it wraps — including an early `?`
/// return or a panic unwind (§4.4 step 9, §4.5 "tie-break notes": "Any
/// exception inside the task must still increment `processed_block_id`").
/// The target value defaults to the task's own `block_id` and can be
/// changed (e.g. to the cancel sentinel) before the guard drops.
pub struct AdvanceGuard<'a> {
    barrier: &'a BlockBarrier,
    to: Cell<i64>,
}

impl<'a> AdvanceGuard<'a> {
    pub fn new(barrier: &'a BlockBarrier, block_id: u64) -> Self {
        AdvanceGuard {
            barrier,
            to: Cell::new(block_id as i64),
        }
    }

    /// Override the value stored on drop (e.g. [`CANCEL_TASKS_ID`]).
    pub fn set_target(&self, to: i64) {
        self.to.set(to);
    }
}

impl Drop for AdvanceGuard<'_> {
    fn drop(&mut self) {
        self.barrier.advance(self.to.get());
    }
}
