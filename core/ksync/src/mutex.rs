// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

//! A mutex whose waiters donate priority to the holder.

use ksched::{QueueId, SchedResult, Scheduler, ThreadId};
use rand_core::RngCore;

use crate::WaitOutcome;

/// A mutual exclusion lock backed by a donating resource queue.
///
/// While a thread holds the mutex, every thread blocked in [`Mutex::lock`]
/// lends it its effective priority, so a low-priority holder cannot be
/// starved by medium-priority threads while a high-priority one waits.
///
/// On [`Mutex::unlock`] ownership is handed directly to the best waiter.
#[derive(Debug)]
pub struct Mutex {
    queue: QueueId,
}

impl Mutex {
    /// Creates an unlocked mutex.
    pub fn new<R: RngCore>(sched: &mut Scheduler<R>) -> Self {
        Self {
            queue: sched.new_queue(true),
        }
    }

    /// The resource queue behind this mutex.
    pub fn queue(&self) -> QueueId {
        self.queue
    }

    /// Returns the thread holding the mutex.
    pub fn holder<R>(&self, sched: &Scheduler<R>) -> Option<ThreadId> {
        sched.owner(self.queue)
    }

    /// Returns `true` if `t` holds the mutex.
    pub fn is_held_by<R>(&self, sched: &Scheduler<R>, t: ThreadId) -> bool {
        self.holder(sched) == Some(t)
    }

    /// Takes the mutex for `t`, or queues `t` behind the holder.
    ///
    /// On [`WaitOutcome::Blocked`] the caller must put `t` to sleep, after
    /// dropping its [`SchedGuard`]; `t` owns the mutex when
    /// [`Mutex::unlock`] returns it.
    ///
    /// # Panics
    ///
    /// Panics if `t` already holds the mutex.
    ///
    /// [`SchedGuard`]: ksched::SchedGuard
    pub fn lock<R: RngCore>(&self, sched: &mut Scheduler<R>, t: ThreadId) -> WaitOutcome {
        match self.holder(sched) {
            None => {
                sched.acquire(self.queue, t);
                WaitOutcome::Acquired
            }
            Some(holder) => {
                assert_ne!(holder, t, "{t} tried to lock mutex it already holds");
                sched.wait_for_access(self.queue, t);
                WaitOutcome::Blocked
            }
        }
    }

    /// Takes the mutex for `t` if nobody holds it.
    ///
    /// Returns `true` if the mutex was acquired.
    pub fn try_lock<R: RngCore>(&self, sched: &mut Scheduler<R>, t: ThreadId) -> bool {
        if self.holder(sched).is_some() {
            return false;
        }
        sched.acquire(self.queue, t);
        true
    }

    /// Releases the mutex held by `t`.
    ///
    /// If threads are waiting, the best one becomes the holder and is
    /// returned; the caller must wake it. `t` drops back to the priority its
    /// remaining resources justify.
    ///
    /// # Panics
    ///
    /// Panics if `t` does not hold the mutex.
    pub fn unlock<R: RngCore>(
        &self,
        sched: &mut Scheduler<R>,
        t: ThreadId,
    ) -> SchedResult<Option<ThreadId>> {
        let holder = self.holder(sched);
        assert_eq!(holder, Some(t), "{t} tried to release mutex it doesn't own");

        if let Some(next) = sched.next_thread(self.queue) {
            trace!("mutex {}: {t} hands off to {next}", self.queue);
            return Ok(Some(next));
        }
        sched.release(self.queue, t)?;
        Ok(None)
    }

    /// Destroys the mutex.
    ///
    /// Fails with [`ResourceBusy`] while threads are blocked on it.
    ///
    /// [`ResourceBusy`]: ksched::SchedError::ResourceBusy
    pub fn destroy<R: RngCore>(self, sched: &mut Scheduler<R>) -> SchedResult {
        sched.remove_queue(self.queue)
    }
}
