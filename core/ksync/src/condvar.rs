// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

//! Condition variables.

use alloc::vec::Vec;

use ksched::{QueueId, SchedResult, Scheduler, ThreadId};
use rand_core::RngCore;

use crate::{Mutex, WaitOutcome};

/// A condition variable bound to one [`Mutex`].
///
/// Sleepers wait on a non-donating queue: waiting for a signal is not a
/// claim on whoever happens to signal. A notified thread is moved straight
/// onto the mutex's queue, where it donates to the holder again until it
/// gets the mutex back.
#[derive(Debug)]
pub struct Condition {
    queue: QueueId,
}

impl Condition {
    /// Creates a condition variable with no sleepers.
    pub fn new<R: RngCore>(sched: &mut Scheduler<R>) -> Self {
        Self {
            queue: sched.new_queue(false),
        }
    }

    /// The resource queue sleepers wait on.
    pub fn queue(&self) -> QueueId {
        self.queue
    }

    /// Atomically releases `mutex` and queues `t` on this condition.
    ///
    /// `t` must go to sleep. The returned thread, if any, received the
    /// mutex and must be woken.
    ///
    /// # Panics
    ///
    /// Panics if `t` does not hold `mutex`.
    pub fn wait<R: RngCore>(
        &self,
        sched: &mut Scheduler<R>,
        mutex: &Mutex,
        t: ThreadId,
    ) -> SchedResult<Option<ThreadId>> {
        let woken = mutex.unlock(sched, t)?;
        sched.wait_for_access(self.queue, t);
        Ok(woken)
    }

    /// Moves the best sleeper onto `mutex` and returns it.
    ///
    /// The sleeper stays asleep: it now waits for `mutex`, which the
    /// notifier holds, and is woken by the matching [`Mutex::unlock`].
    ///
    /// # Panics
    ///
    /// Panics if `notifier` does not hold `mutex`.
    pub fn notify_one<R: RngCore>(
        &self,
        sched: &mut Scheduler<R>,
        mutex: &Mutex,
        notifier: ThreadId,
    ) -> SchedResult<Option<ThreadId>> {
        assert!(
            mutex.is_held_by(sched, notifier),
            "{notifier} notified a condition without holding its mutex"
        );
        let Some(t) = sched.next_thread(self.queue) else {
            return Ok(None);
        };
        // Nobody owns a condition; drop the ownership the hand-off granted.
        sched.release(self.queue, t)?;
        match mutex.lock(sched, t) {
            WaitOutcome::Blocked => Ok(Some(t)),
            WaitOutcome::Acquired => unreachable!("{t} took a mutex held by {notifier}"),
        }
    }

    /// Moves every sleeper onto `mutex`, best first, and returns them.
    ///
    /// # Panics
    ///
    /// Panics if `notifier` does not hold `mutex`.
    pub fn notify_all<R: RngCore>(
        &self,
        sched: &mut Scheduler<R>,
        mutex: &Mutex,
        notifier: ThreadId,
    ) -> SchedResult<Vec<ThreadId>> {
        let mut moved = Vec::new();
        while let Some(t) = self.notify_one(sched, mutex, notifier)? {
            moved.push(t);
        }
        Ok(moved)
    }

    /// Number of threads asleep on this condition.
    pub fn sleepers<R>(&self, sched: &Scheduler<R>) -> usize {
        sched.waiters(self.queue).len()
    }
}
