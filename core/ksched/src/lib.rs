// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

//! Thread scheduling core with priority donation.
//!
//! For every contended resource the kernel creates a resource queue; the
//! queue decides which waiting thread gets the resource next. Two policies
//! are provided:
//!
//! - **Priority**: the waiter with the highest effective priority wins,
//!   ties going to the one that has waited longest. An owner inherits the
//!   maximum effective priority of the waiters of every donating queue it
//!   holds.
//! - **Lottery**: a random ticket is drawn, weighted by the waiters'
//!   effective priorities. An owner inherits the *sum* of its waiters'
//!   tickets, saturating at [`Priority::MAX`].
//!
//! Donation follows chains of ownership: if A waits on a resource held by
//! B and B waits on a resource held by C, C runs with A's contribution.
//!
//! # Critical section
//!
//! Every operation takes `&mut Scheduler`. Kernels share the scheduler as a
//! [`SchedLock`], a [`kspin::SpinNoIrq`]; its guard keeps IRQs and
//! preemption disabled for as long as the scheduler is borrowed.
//!
//! ```
//! use ksched::{SchedConfig, SchedLock, Scheduler, ThreadId};
//!
//! let sched = SchedLock::new(Scheduler::new(SchedConfig::priority()).unwrap());
//! let (low, high) = (ThreadId::new(1), ThreadId::new(2));
//!
//! let mut s = sched.lock();
//! s.set_priority(high, 6).unwrap();
//! let lock = s.new_queue(true);
//! s.acquire(lock, low);
//! s.wait_for_access(lock, high);
//! assert_eq!(s.get_effective_priority(low), 6);
//!
//! assert_eq!(s.next_thread(lock), Some(high));
//! assert_eq!(s.get_effective_priority(low), 1);
//! ```
//!
//! # Cargo Features
//!
//! - `sched-priority`: [`SchedConfig::default`] selects the priority policy
//!   (default).
//! - `sched-lottery`: [`SchedConfig::default`] selects the lottery policy.

#![cfg_attr(not(test), no_std)]

#[macro_use]
extern crate log;

extern crate alloc;

mod config;
mod donation;
mod error;
mod lottery;
mod priority;
mod queue;
mod scheduler;
mod thread;


pub use self::{
    config::{
        DEFAULT_POLICY, DEFAULT_SEED, LOTTERY_DEFAULT, LOTTERY_MAX, LOTTERY_MIN, PRIORITY_DEFAULT,
        PRIORITY_MAX, PRIORITY_MIN, Policy, PriorityRange, SchedConfig,
    },
    error::{SchedError, SchedResult},
    queue::QueueId,
    scheduler::Scheduler,
    thread::ThreadId,
};

/// Base, effective and ticket counts share this type.
pub type Priority = u32;

/// A scheduler shared by the kernel, with IRQs and preemption disabled while
/// it is locked.
pub type SchedLock<R = rand_chacha::ChaCha8Rng> = kspin::SpinNoIrq<Scheduler<R>>;

/// Guard for [`SchedLock`].
pub type SchedGuard<'a, R = rand_chacha::ChaCha8Rng> = kspin::SpinNoIrqGuard<'a, Scheduler<R>>;

#[doc(hidden)]
pub mod __priv {
    pub use log::warn;
}
