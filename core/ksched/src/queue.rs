// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

//! Resource queues: the waiters of one contended resource plus its owner.

use core::fmt;

use rand_core::RngCore;

use crate::{
    Policy, Priority, ThreadId, lottery::LotteryWaiters, priority::PriorityWaiters,
    thread::Waiter,
};

/// Handle of a resource queue created by [`Scheduler::new_queue`].
///
/// Handles are allocated from a per-scheduler counter and never reused.
///
/// [`Scheduler::new_queue`]: crate::Scheduler::new_queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QueueId(u64);

impl QueueId {
    pub(crate) const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw handle value.
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for QueueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "queue#{}", self.0)
    }
}

#[derive(Debug)]
pub(crate) struct ResourceQueue {
    /// Whether waiters donate to the owner. Fixed at creation.
    pub(crate) transfer: bool,
    pub(crate) owner: Option<ThreadId>,
    pub(crate) waiters: Waiters,
}

impl ResourceQueue {
    pub(crate) fn new(policy: Policy, transfer: bool) -> Self {
        Self {
            transfer,
            owner: None,
            waiters: Waiters::new(policy),
        }
    }

    /// What this queue currently donates to its owner, if anything.
    pub(crate) fn donation(&self) -> Option<Priority> {
        if self.transfer {
            self.waiters.donation()
        } else {
            None
        }
    }
}

/// The waiter set, one variant per policy.
#[derive(Debug)]
pub(crate) enum Waiters {
    Priority(PriorityWaiters),
    Lottery(LotteryWaiters),
}

impl Waiters {
    fn new(policy: Policy) -> Self {
        match policy {
            Policy::Priority => Self::Priority(PriorityWaiters::default()),
            Policy::Lottery => Self::Lottery(LotteryWaiters::default()),
        }
    }

    pub(crate) fn insert(&mut self, waiter: Waiter) {
        match self {
            Self::Priority(set) => set.insert(waiter),
            Self::Lottery(set) => set.insert(waiter),
        }
    }

    pub(crate) fn remove(&mut self, waiter: &Waiter) -> bool {
        match self {
            Self::Priority(set) => set.remove(waiter),
            Self::Lottery(set) => set.remove(waiter),
        }
    }

    pub(crate) fn retune(&mut self, waiter: &Waiter, effective: Priority) {
        match self {
            Self::Priority(set) => set.retune(waiter, effective),
            Self::Lottery(set) => set.retune(waiter, effective),
        }
    }

    /// Maximum (priority) or sum (lottery) of the waiters' effective
    /// priorities; `None` when nobody waits.
    pub(crate) fn donation(&self) -> Option<Priority> {
        match self {
            Self::Priority(set) => set.donation(),
            Self::Lottery(set) => set.donation(),
        }
    }

    pub(crate) fn peek<R: RngCore>(&mut self, rng: &mut R) -> Option<Waiter> {
        match self {
            Self::Priority(set) => set.peek().copied(),
            Self::Lottery(set) => set.peek(rng).copied(),
        }
    }

    pub(crate) fn pop<R: RngCore>(&mut self, rng: &mut R) -> Option<Waiter> {
        match self {
            Self::Priority(set) => set.pop(),
            Self::Lottery(set) => set.pop(rng),
        }
    }

    pub(crate) fn total_tickets(&self) -> Priority {
        match self {
            Self::Priority(set) => set
                .iter()
                .fold(0, |total: Priority, w| total.saturating_add(w.effective)),
            Self::Lottery(set) => set.total_tickets(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        match self {
            Self::Priority(set) => set.len(),
            Self::Lottery(set) => set.len(),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Waiters in the policy's listing order.
    pub(crate) fn for_each(&self, mut f: impl FnMut(&Waiter)) {
        match self {
            Self::Priority(set) => set.iter().for_each(&mut f),
            Self::Lottery(set) => set.iter().for_each(&mut f),
        }
    }
}
