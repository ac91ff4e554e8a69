// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

//! Waiter set of the strict priority policy.

use alloc::collections::BTreeSet;

use crate::{Priority, thread::Waiter};

/// Waiters sorted best-first by [`Waiter`]'s ordering.
#[derive(Debug, Default)]
pub(crate) struct PriorityWaiters {
    set: BTreeSet<Waiter>,
}

impl PriorityWaiters {
    pub(crate) fn insert(&mut self, waiter: Waiter) {
        let fresh = self.set.insert(waiter);
        debug_assert!(fresh, "{} queued twice", waiter.tid);
    }

    pub(crate) fn remove(&mut self, waiter: &Waiter) -> bool {
        self.set.remove(waiter)
    }

    /// Re-sorts `waiter` under its new effective priority.
    pub(crate) fn retune(&mut self, waiter: &Waiter, effective: Priority) {
        if self.set.remove(waiter) {
            self.set.insert(Waiter {
                effective,
                ..*waiter
            });
        }
    }

    pub(crate) fn peek(&self) -> Option<&Waiter> {
        self.set.first()
    }

    pub(crate) fn pop(&mut self) -> Option<Waiter> {
        self.set.pop_first()
    }

    /// The maximum effective priority among the waiters.
    pub(crate) fn donation(&self) -> Option<Priority> {
        self.peek().map(|w| w.effective)
    }

    pub(crate) fn len(&self) -> usize {
        self.set.len()
    }

    /// Descending effective priority, ties in dequeue order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Waiter> {
        self.set.iter()
    }
}
