// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

//! A counting semaphore implementation.

use ksched::{QueueId, SchedResult, Scheduler, ThreadId};
use rand_core::RngCore;

use crate::WaitOutcome;

/// A counting semaphore.
///
/// A permit has no owner, so blocked threads do not donate. A released
/// permit goes directly to the best sleeper instead of back to the count.
#[derive(Debug)]
pub struct Semaphore {
    queue: QueueId,
    permits: usize,
}

impl Semaphore {
    /// Creates a new semaphore with the given number of permits.
    pub fn new<R: RngCore>(sched: &mut Scheduler<R>, permits: usize) -> Self {
        Self {
            queue: sched.new_queue(false),
            permits,
        }
    }

    /// The resource queue blocked threads wait on.
    pub fn queue(&self) -> QueueId {
        self.queue
    }

    /// Takes a permit for `t`, or queues `t` until one is released.
    pub fn acquire<R: RngCore>(&mut self, sched: &mut Scheduler<R>, t: ThreadId) -> WaitOutcome {
        if self.try_acquire() {
            return WaitOutcome::Acquired;
        }
        sched.wait_for_access(self.queue, t);
        WaitOutcome::Blocked
    }

    /// Takes a permit if one is available.
    ///
    /// Returns `true` if a permit was acquired, `false` otherwise.
    pub fn try_acquire(&mut self) -> bool {
        match self.permits.checked_sub(1) {
            Some(left) => {
                self.permits = left;
                true
            }
            None => false,
        }
    }

    /// Returns a permit.
    ///
    /// If a thread is blocked in [`Semaphore::acquire`] it receives the
    /// permit and is returned; the caller must wake it.
    pub fn release<R: RngCore>(&mut self, sched: &mut Scheduler<R>) -> SchedResult<Option<ThreadId>> {
        let Some(t) = sched.next_thread(self.queue) else {
            self.permits += 1;
            return Ok(None);
        };
        sched.release(self.queue, t)?;
        Ok(Some(t))
    }

    /// Returns the number of available permits.
    pub fn available_permits(&self) -> usize {
        self.permits
    }
}
