// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

//! Priority donation along the waits-on / owned-by chain.
//!
//! A thread's effective priority is its base priority combined with the
//! donations of every transferring queue it owns: the maximum of the top
//! waiter under the priority policy, the saturating sum of all waiters'
//! tickets under the lottery policy.
//!
//! After any event that can move a thread's effective priority, [`propagate`]
//! recomputes that thread, re-sorts it inside the queue it waits on, and
//! forwards the signed change to that queue's owner, hop by hop, until a hop
//! changes nothing or there is no owner left. Every thread is visited at most
//! once per pass, so a cycle in the wait graph ends the pass instead of
//! looping.
//!
//! [`propagate`]: crate::Scheduler::propagate

use hashbrown::HashSet;

use crate::{Policy, Priority, Scheduler, ThreadId};

impl<R> Scheduler<R> {
    /// Effective priority `tid` is entitled to right now.
    pub(crate) fn entitled(&self, tid: ThreadId) -> Option<Priority> {
        let state = self.threads.get(&tid)?;
        let donations = state
            .owned
            .iter()
            .filter_map(|q| self.queues.get(q))
            .filter_map(|queue| queue.donation());
        Some(match self.config.policy {
            Policy::Priority => donations.fold(state.base, Priority::max),
            Policy::Lottery => donations.fold(state.base, Priority::saturating_add),
        })
    }

    /// Brings `start` and everything downstream of it up to date.
    pub(crate) fn propagate(&mut self, start: ThreadId) {
        let mut visited = HashSet::new();
        let mut next = Some(start);

        while let Some(tid) = next.take() {
            if !visited.insert(tid) {
                warn!("donation cycle through {tid}, propagation stopped");
                break;
            }
            let Some(effective) = self.entitled(tid) else {
                break;
            };
            let Some(state) = self.threads.get_mut(&tid) else {
                break;
            };
            if state.effective == effective {
                break;
            }

            let stale = state.waiter(tid);
            trace!(
                "donation: {tid} effective {} -> {effective} ({:+})",
                stale.effective,
                i64::from(effective) - i64::from(stale.effective),
            );
            state.effective = effective;

            let Some(q) = state.waiting else {
                break;
            };
            let Some(queue) = self.queues.get_mut(&q) else {
                break;
            };
            queue.waiters.retune(&stale, effective);
            if queue.transfer {
                next = queue.owner;
            }
        }
    }
}
