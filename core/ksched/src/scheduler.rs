// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

//! The scheduler: queue factory, resource-queue operations and per-thread
//! priority accessors.

use alloc::vec::Vec;

use hashbrown::HashMap;
use rand_chacha::ChaCha8Rng;
use rand_core::{RngCore, SeedableRng};

use crate::{
    Policy, Priority, PriorityRange, QueueId, SchedConfig, SchedResult, ThreadId,
    queue::ResourceQueue,
    sched_bail,
    thread::{ThreadState, Waiter},
};

/// Scheduling state of every thread and resource queue.
///
/// All operations take `&mut self`: the kernel keeps the scheduler in a
/// [`SchedLock`](crate::SchedLock), so holding its guard (IRQs and
/// preemption off) is the only way to reach them. No operation blocks;
/// callers that learn they must wait go to sleep after dropping the guard.
pub struct Scheduler<R = ChaCha8Rng> {
    pub(crate) config: SchedConfig,
    pub(crate) threads: HashMap<ThreadId, ThreadState>,
    pub(crate) queues: HashMap<QueueId, ResourceQueue>,
    next_seq: u64,
    next_queue: u64,
    clock: u64,
    rng: R,
}

impl Scheduler {
    /// Creates a scheduler whose lottery draws come from a ChaCha8 stream
    /// seeded with `config.seed`.
    pub fn new(config: SchedConfig) -> SchedResult<Self> {
        Self::with_rng(config, ChaCha8Rng::seed_from_u64(config.seed))
    }
}

impl<R: RngCore> Scheduler<R> {
    /// Creates a scheduler drawing lottery tickets from `rng`.
    pub fn with_rng(config: SchedConfig, rng: R) -> SchedResult<Self> {
        config.validate()?;
        debug!(
            "scheduler: {:?} policy, priorities {}..={}",
            config.policy, config.range.min, config.range.max
        );
        Ok(Self {
            config,
            threads: HashMap::new(),
            queues: HashMap::new(),
            next_seq: 0,
            next_queue: 0,
            clock: 0,
            rng,
        })
    }

    /// Creates a resource queue of this scheduler's policy.
    ///
    /// If `transfer_priority` is `false` the queue never donates to its
    /// owner.
    pub fn new_queue(&mut self, transfer_priority: bool) -> QueueId {
        let q = QueueId::new(self.next_queue);
        self.next_queue += 1;
        self.queues
            .insert(q, ResourceQueue::new(self.config.policy, transfer_priority));
        trace!("{q}: created, transfer={transfer_priority}");
        q
    }

    /// Destroys a queue nobody waits on. Its owner loses the resource.
    pub fn remove_queue(&mut self, q: QueueId) -> SchedResult {
        let Some(queue) = self.queues.get(&q) else {
            sched_bail!(NotFound, q);
        };
        if !queue.waiters.is_empty() {
            sched_bail!(ResourceBusy, q);
        }
        if let Some(queue) = self.queues.remove(&q)
            && let Some(owner) = queue.owner
        {
            if let Some(state) = self.threads.get_mut(&owner) {
                state.owned.remove(&q);
            }
            self.propagate(owner);
        }
        trace!("{q}: removed");
        Ok(())
    }

    /// Puts `t` to wait on `q` and donates to `q`'s owner.
    ///
    /// If `t` owns `q` it gives the resource up first, the way a running
    /// thread re-enters the ready queue it was picked from.
    ///
    /// # Panics
    ///
    /// Panics if `t` already waits on a queue, or if `q` is unknown.
    pub fn wait_for_access(&mut self, q: QueueId, t: ThreadId) {
        let now = self.tick();
        self.ensure_thread(t);
        let (Some(queue), Some(state)) = (self.queues.get_mut(&q), self.threads.get_mut(&t)) else {
            panic!("{t} waits on unknown {q}");
        };
        if let Some(w) = state.waiting {
            panic!("{t} waits on {q} while already waiting on {w}");
        }

        let gave_up = queue.owner == Some(t);
        if gave_up {
            queue.owner = None;
            state.owned.remove(&q);
            debug!("{q}: {t} gives up ownership to wait");
        }
        state.since = now;
        state.waiting = Some(q);
        queue.waiters.insert(state.waiter(t));
        trace!("{q}: {t} waits, effective {}", state.effective);

        if gave_up {
            self.propagate(t);
        } else if queue.transfer
            && let Some(owner) = queue.owner
        {
            self.propagate(owner);
        }
    }

    /// Makes `t` the owner of `q`, taking it out of `q`'s waiters if present.
    ///
    /// The previous owner falls back to what its remaining resources justify.
    ///
    /// # Panics
    ///
    /// Panics if `t` waits on another queue, or if `q` is unknown.
    pub fn acquire(&mut self, q: QueueId, t: ThreadId) {
        self.ensure_thread(t);
        let (Some(queue), Some(state)) = (self.queues.get_mut(&q), self.threads.get_mut(&t)) else {
            panic!("{t} acquires unknown {q}");
        };
        match state.waiting {
            Some(w) if w == q => {
                queue.waiters.remove(&state.waiter(t));
                state.waiting = None;
            }
            Some(w) => panic!("{t} acquires {q} while waiting on {w}"),
            None => {}
        }
        self.grant(q, t);
    }

    /// Hands `q` to its best waiter and returns it, or `None` if nobody
    /// waits.
    ///
    /// The priority policy picks the highest effective priority, then the
    /// earliest enqueue, then the lowest allocation order. The lottery policy
    /// draws a ticket weighted by effective priority.
    pub fn next_thread(&mut self, q: QueueId) -> Option<ThreadId> {
        let Some(queue) = self.queues.get_mut(&q) else {
            panic!("next_thread on unknown {q}");
        };
        let waiter = queue.waiters.pop(&mut self.rng)?;
        if let Some(state) = self.threads.get_mut(&waiter.tid) {
            state.waiting = None;
        }
        self.grant(q, waiter.tid);
        Some(waiter.tid)
    }

    /// Returns the thread [`Scheduler::next_thread`] would return, leaving
    /// the waiters untouched.
    ///
    /// Under the lottery policy the draw is remembered, so repeated peeks and
    /// the following `next_thread` agree until the waiters change.
    pub fn peek(&mut self, q: QueueId) -> Option<ThreadId> {
        let Some(queue) = self.queues.get_mut(&q) else {
            panic!("peek on unknown {q}");
        };
        queue.waiters.peek(&mut self.rng).map(|w| w.tid)
    }

    /// Gives up ownership of `q` without handing it to anybody.
    pub fn release(&mut self, q: QueueId, t: ThreadId) -> SchedResult {
        let Some(queue) = self.queues.get_mut(&q) else {
            sched_bail!(NotFound, q);
        };
        if queue.owner != Some(t) {
            sched_bail!(BadState, "release by a thread that is not the owner");
        }
        queue.owner = None;
        if let Some(state) = self.threads.get_mut(&t) {
            state.owned.remove(&q);
        }
        debug!("{q}: released by {t}");
        self.propagate(t);
        Ok(())
    }

    /// Logs the waiters of `q` in descending effective priority.
    pub fn print(&self, q: QueueId) {
        let Some(queue) = self.queues.get(&q) else {
            return;
        };
        debug!(
            "{q}: owner {:?}, {} waiting, transfer={}",
            queue.owner.map(ThreadId::as_u64),
            queue.waiters.len(),
            queue.transfer
        );
        for w in self.listing(q) {
            let base = self.threads.get(&w.tid).map_or(w.effective, |s| s.base);
            debug!("  {}: base {base}, effective {}", w.tid, w.effective);
        }
    }

    /// Drops the scheduling state of a finished thread.
    ///
    /// Queues it still owns become ownerless; their waiters keep waiting.
    ///
    /// # Panics
    ///
    /// Panics if `t` is still waiting on a queue.
    pub fn exit_thread(&mut self, t: ThreadId) {
        let Some(state) = self.threads.remove(&t) else {
            return;
        };
        if let Some(q) = state.waiting {
            panic!("{t} exits while waiting on {q}");
        }
        for q in &state.owned {
            if let Some(queue) = self.queues.get_mut(q) {
                queue.owner = None;
            }
        }
        debug!("{t}: exited, released {} queue(s)", state.owned.len());
    }

    fn grant(&mut self, q: QueueId, t: ThreadId) {
        let Some(queue) = self.queues.get_mut(&q) else {
            return;
        };
        let previous = queue.owner.replace(t);
        if let Some(state) = self.threads.get_mut(&t) {
            state.owned.insert(q);
        }
        debug!("{q}: owner {:?} -> {t}", previous.map(ThreadId::as_u64));

        if let Some(prev) = previous
            && prev != t
        {
            if let Some(state) = self.threads.get_mut(&prev) {
                state.owned.remove(&q);
            }
            self.propagate(prev);
        }
        self.propagate(t);
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }
}

/// Per-thread priority accessors.
///
/// The kernel calls these on behalf of the running thread, passing its id.
impl<R> Scheduler<R> {
    /// Returns the base priority of `t`.
    pub fn get_priority(&self, t: ThreadId) -> Priority {
        self.threads
            .get(&t)
            .map_or(self.config.range.default, |s| s.base)
    }

    /// Returns the effective priority of `t`, donations included.
    pub fn get_effective_priority(&self, t: ThreadId) -> Priority {
        self.threads
            .get(&t)
            .map_or(self.config.range.default, |s| s.effective)
    }

    /// Sets the base priority of `t` and propagates the change.
    ///
    /// Fails with `OutOfRange` if `priority` is outside the policy's range.
    pub fn set_priority(&mut self, t: ThreadId, priority: Priority) -> SchedResult {
        if !self.config.range.contains(priority) {
            sched_bail!(OutOfRange, priority);
        }
        let state = self.ensure_thread(t);
        if state.base == priority {
            return Ok(());
        }
        state.base = priority;
        trace!("{t}: base priority {priority}");
        self.propagate(t);
        Ok(())
    }

    /// Raises the base priority of `t` by one. Returns `false` at the maximum.
    pub fn increase_priority(&mut self, t: ThreadId) -> bool {
        let priority = self.get_priority(t);
        if priority >= self.config.range.max {
            return false;
        }
        self.set_priority(t, priority + 1).is_ok()
    }

    /// Lowers the base priority of `t` by one. Returns `false` at the minimum.
    pub fn decrease_priority(&mut self, t: ThreadId) -> bool {
        let priority = self.get_priority(t);
        if priority <= self.config.range.min {
            return false;
        }
        self.set_priority(t, priority - 1).is_ok()
    }

    /// The policy of every queue of this scheduler.
    pub fn policy(&self) -> Policy {
        self.config.policy
    }

    /// Legal base priorities.
    pub fn range(&self) -> PriorityRange {
        self.config.range
    }

    /// Current owner of `q`.
    pub fn owner(&self, q: QueueId) -> Option<ThreadId> {
        self.queues.get(&q)?.owner
    }

    /// Waiters of `q`: best candidate first for the priority policy, enqueue
    /// order for the lottery policy.
    pub fn waiters(&self, q: QueueId) -> Vec<ThreadId> {
        let mut waiters = Vec::new();
        if let Some(queue) = self.queues.get(&q) {
            queue.waiters.for_each(|w| waiters.push(w.tid));
        }
        waiters
    }

    /// Saturating sum of the effective priorities waiting on `q`.
    pub fn total_tickets(&self, q: QueueId) -> Option<Priority> {
        Some(self.queues.get(&q)?.waiters.total_tickets())
    }

    /// Whether `q` donates to its owner.
    pub fn transfers_priority(&self, q: QueueId) -> Option<bool> {
        Some(self.queues.get(&q)?.transfer)
    }

    /// The queue `t` waits on.
    pub fn wait_target(&self, t: ThreadId) -> Option<QueueId> {
        self.threads.get(&t)?.waiting
    }

    /// Queues owned by `t`, in handle order.
    pub fn owned(&self, t: ThreadId) -> Vec<QueueId> {
        self.threads
            .get(&t)
            .map(|s| s.owned.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Number of threads with scheduling state.
    pub fn thread_count(&self) -> usize {
        self.threads.len()
    }

    /// Number of live queues.
    pub fn queue_count(&self) -> usize {
        self.queues.len()
    }

    /// Waiters of `q` by descending effective priority; equal priorities
    /// keep the policy's own order.
    pub(crate) fn listing(&self, q: QueueId) -> Vec<Waiter> {
        let mut waiters = Vec::new();
        if let Some(queue) = self.queues.get(&q) {
            queue.waiters.for_each(|w| waiters.push(*w));
        }
        waiters.sort_by(|a, b| b.effective.cmp(&a.effective));
        waiters
    }

    fn ensure_thread(&mut self, t: ThreadId) -> &mut ThreadState {
        let next_seq = &mut self.next_seq;
        let default = self.config.range.default;
        self.threads.entry(t).or_insert_with(|| {
            let seq = *next_seq;
            *next_seq += 1;
            trace!("{t}: scheduling state #{seq}");
            ThreadState::new(seq, default)
        })
    }
}
