// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

//! Scheduler configuration: policy selection and priority bounds.

use crate::{Priority, SchedResult, sched_bail};

/// The minimum base priority under the priority policy.
pub const PRIORITY_MIN: Priority = 0;
/// The maximum base priority under the priority policy.
pub const PRIORITY_MAX: Priority = 7;
/// The base priority a thread starts with under the priority policy.
pub const PRIORITY_DEFAULT: Priority = 1;

/// The minimum ticket count under the lottery policy.
pub const LOTTERY_MIN: Priority = 1;
/// The maximum ticket count under the lottery policy.
pub const LOTTERY_MAX: Priority = Priority::MAX;
/// The ticket count a thread starts with under the lottery policy.
pub const LOTTERY_DEFAULT: Priority = 1;

/// Seed of the lottery random source when none is configured.
pub const DEFAULT_SEED: u64 = 0x5eed_1e55_c0ff_ee00;

/// How a resource queue picks the next thread and how waiters donate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Policy {
    /// Highest effective priority wins; owners inherit the maximum of their
    /// waiters.
    Priority,
    /// Ticket-weighted random draw; owners inherit the sum of their
    /// waiters' tickets.
    Lottery,
}

cfg_if::cfg_if! {
    if #[cfg(feature = "sched-lottery")] {
        /// The policy selected by cargo features.
        pub const DEFAULT_POLICY: Policy = Policy::Lottery;
    } else {
        /// The policy selected by cargo features.
        pub const DEFAULT_POLICY: Policy = Policy::Priority;
    }
}

/// Closed interval of legal base priorities plus the initial value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorityRange {
    /// Lowest legal base priority.
    pub min: Priority,
    /// Highest legal base priority.
    pub max: Priority,
    /// Base priority given to a thread on first use.
    pub default: Priority,
}

impl PriorityRange {
    /// Creates a range. Use [`PriorityRange::validate`] before relying on it.
    pub const fn new(min: Priority, max: Priority, default: Priority) -> Self {
        Self { min, max, default }
    }

    /// Returns `true` if `priority` is a legal base priority.
    #[inline]
    pub const fn contains(&self, priority: Priority) -> bool {
        priority >= self.min && priority <= self.max
    }

    /// Checks that the range is non-empty and holds its default.
    pub fn validate(&self) -> SchedResult {
        if self.min > self.max {
            sched_bail!(InvalidInput, "priority range minimum above maximum");
        }
        if !self.contains(self.default) {
            sched_bail!(InvalidInput, "default priority outside its range");
        }
        Ok(())
    }
}

/// Construction parameters for a [`Scheduler`](crate::Scheduler).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedConfig {
    /// Policy of every queue the scheduler creates.
    pub policy: Policy,
    /// Legal base priorities.
    pub range: PriorityRange,
    /// Seed of the lottery random source.
    pub seed: u64,
}

impl SchedConfig {
    /// Strict priority scheduling over `0..=7`.
    pub const fn priority() -> Self {
        Self {
            policy: Policy::Priority,
            range: PriorityRange::new(PRIORITY_MIN, PRIORITY_MAX, PRIORITY_DEFAULT),
            seed: DEFAULT_SEED,
        }
    }

    /// Lottery scheduling over `1..=Priority::MAX` tickets.
    pub const fn lottery() -> Self {
        Self {
            policy: Policy::Lottery,
            range: PriorityRange::new(LOTTERY_MIN, LOTTERY_MAX, LOTTERY_DEFAULT),
            seed: DEFAULT_SEED,
        }
    }

    /// Replaces the priority bounds.
    pub fn with_range(mut self, range: PriorityRange) -> SchedResult<Self> {
        self.range = range;
        self.validate()?;
        Ok(self)
    }

    /// Checks the range, and that every lottery thread holds a ticket.
    pub fn validate(&self) -> SchedResult {
        self.range.validate()?;
        if self.policy == Policy::Lottery && self.range.min == 0 {
            sched_bail!(InvalidInput, "lottery range admits threads without tickets");
        }
        Ok(())
    }

    /// Replaces the lottery seed.
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

impl Default for SchedConfig {
    fn default() -> Self {
        match DEFAULT_POLICY {
            Policy::Priority => Self::priority(),
            Policy::Lottery => Self::lottery(),
        }
    }
}
