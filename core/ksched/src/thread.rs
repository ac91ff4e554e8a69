// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

//! Per-thread scheduling state.

use alloc::collections::BTreeSet;
use core::{cmp::Ordering, fmt};

use crate::{Priority, QueueId};

/// Identity of a schedulable execution context.
///
/// The embedding kernel picks the value (usually its task id); the scheduler
/// only uses it as a registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ThreadId(u64);

impl ThreadId {
    /// Wraps a kernel task id.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw kernel task id.
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "thread#{}", self.0)
    }
}

/// Scheduling record of one thread, created on its first scheduling use.
#[derive(Debug)]
pub(crate) struct ThreadState {
    /// Allocation order. Never reused while the scheduler lives.
    pub(crate) seq: u64,
    pub(crate) base: Priority,
    /// Cached; equals `base` combined with what the owned queues donate.
    pub(crate) effective: Priority,
    /// Logical time at which the thread last started waiting.
    pub(crate) since: u64,
    pub(crate) owned: BTreeSet<QueueId>,
    pub(crate) waiting: Option<QueueId>,
}

impl ThreadState {
    pub(crate) fn new(seq: u64, base: Priority) -> Self {
        Self {
            seq,
            base,
            effective: base,
            since: 0,
            owned: BTreeSet::new(),
            waiting: None,
        }
    }

    /// The entry this thread occupies in a waiter set.
    #[inline]
    pub(crate) fn waiter(&self, tid: ThreadId) -> Waiter {
        Waiter {
            tid,
            effective: self.effective,
            since: self.since,
            seq: self.seq,
        }
    }
}

/// A waiting thread as seen by a resource queue.
///
/// The queue keeps its own copy of the sort key, refreshed by the donation
/// pass whenever the thread's effective priority moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Waiter {
    pub(crate) tid: ThreadId,
    pub(crate) effective: Priority,
    pub(crate) since: u64,
    pub(crate) seq: u64,
}

impl Ord for Waiter {
    /// Best candidate first: highest effective priority, then earliest
    /// enqueue time, then lowest allocation order.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .effective
            .cmp(&self.effective)
            .then(self.since.cmp(&other.since))
            .then(self.seq.cmp(&other.seq))
            .then(self.tid.cmp(&other.tid))
    }
}

impl PartialOrd for Waiter {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
