// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

//! Waiting for a thread to finish.

use alloc::vec::Vec;

use ksched::{QueueId, SchedResult, Scheduler, ThreadId};
use rand_core::RngCore;

use crate::WaitOutcome;

/// Lets threads wait until `target` finishes.
///
/// `target` owns a donating queue for its whole lifetime, so joiners lend
/// it their priority: a high-priority thread joining a low-priority one
/// gets it finished sooner.
#[derive(Debug)]
pub struct JoinBarrier {
    target: ThreadId,
    queue: QueueId,
    finished: bool,
}

impl JoinBarrier {
    /// Creates the barrier of a newly created thread.
    pub fn new<R: RngCore>(sched: &mut Scheduler<R>, target: ThreadId) -> Self {
        let queue = sched.new_queue(true);
        sched.acquire(queue, target);
        Self {
            target,
            queue,
            finished: false,
        }
    }

    /// The thread being joined.
    pub fn target(&self) -> ThreadId {
        self.target
    }

    /// Returns `true` once [`JoinBarrier::finish`] has run.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Waits for the target on behalf of `joiner`.
    ///
    /// Returns [`WaitOutcome::Acquired`] immediately if the target already
    /// finished.
    ///
    /// # Panics
    ///
    /// Panics if a thread joins itself.
    pub fn join<R: RngCore>(&self, sched: &mut Scheduler<R>, joiner: ThreadId) -> WaitOutcome {
        assert_ne!(joiner, self.target, "{joiner} tried to join itself");
        if self.finished {
            return WaitOutcome::Acquired;
        }
        sched.wait_for_access(self.queue, joiner);
        WaitOutcome::Blocked
    }

    /// Marks the target finished and returns every joiner to wake, best
    /// first.
    ///
    /// Called by the target on its way out, before
    /// [`Scheduler::exit_thread`]. Calling it again returns nothing.
    pub fn finish<R: RngCore>(&mut self, sched: &mut Scheduler<R>) -> SchedResult<Vec<ThreadId>> {
        if self.finished {
            return Ok(Vec::new());
        }
        self.finished = true;

        let mut woken = Vec::new();
        while let Some(t) = sched.next_thread(self.queue) {
            sched.release(self.queue, t)?;
            woken.push(t);
        }
        sched.remove_queue(self.queue)?;
        debug!("{} finished, {} joiner(s) woken", self.target, woken.len());
        Ok(woken)
    }
}
