// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

//! Kernel blocking primitives built on [`ksched`] resource queues.
//!
//! - [`Mutex`]: Mutual exclusion lock whose waiters donate priority to the
//!   holder
//! - [`Condition`]: Condition variable bound to a [`Mutex`]
//! - [`Semaphore`]: Counting semaphore (no donation)
//! - [`JoinBarrier`]: Lets threads wait for another thread to finish,
//!   donating to it meanwhile
//! - [`Communicator`]: Synchronous word exchange between speakers and
//!   listeners, built on one [`Mutex`] and two [`Condition`]s
//! - [`spin`]: Re-export of `kspin` for spinlocks
//!
//! None of these put a thread to sleep. Every operation runs with the
//! scheduler locked and tells the caller what to do once the guard is
//! dropped: sleep ([`WaitOutcome::Blocked`]) or wake a given thread.
//!
//! # Examples
//!
//! ```
//! use ksched::{SchedConfig, SchedLock, Scheduler, ThreadId};
//! use ksync::{Mutex, WaitOutcome};
//!
//! let sched = SchedLock::new(Scheduler::new(SchedConfig::priority()).unwrap());
//! let (a, b) = (ThreadId::new(1), ThreadId::new(2));
//!
//! let mut guard = sched.lock();
//! let s = &mut *guard;
//! let mutex = Mutex::new(s);
//! assert_eq!(mutex.lock(s, a), WaitOutcome::Acquired);
//! assert_eq!(mutex.lock(s, b), WaitOutcome::Blocked);
//! // `a` unlocks and hands the mutex to `b`, which the kernel now wakes.
//! assert_eq!(mutex.unlock(s, a).unwrap(), Some(b));
//! ```
//!
//! # Features
//!
//! - `sched-lottery`: Build the scheduler with the lottery policy as default

#![cfg_attr(not(test), no_std)]

#[macro_use]
extern crate log;

extern crate alloc;

mod communicator;
mod condvar;
mod join;
mod mutex;
mod semaphore;

#[cfg(test)]
mod tests;

pub use kspin as spin;

pub use self::{
    communicator::{Communicator, Transfer},
    condvar::Condition,
    join::JoinBarrier,
    mutex::Mutex,
    semaphore::Semaphore,
};

/// What the calling thread must do after an acquiring operation.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The caller holds the resource and keeps running.
    Acquired,
    /// The caller was queued; it must sleep once the scheduler is unlocked.
    Blocked,
}

impl WaitOutcome {
    /// Returns `true` if the caller must sleep.
    pub fn is_blocked(self) -> bool {
        self == WaitOutcome::Blocked
    }
}
