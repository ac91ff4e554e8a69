// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

//! Synchronous word exchange between speakers and listeners.

use alloc::collections::BTreeMap;

use ksched::{SchedResult, Scheduler, ThreadId};
use rand_core::RngCore;

use crate::{Condition, Mutex, WaitOutcome};

/// What a thread is doing inside the communicator.
#[derive(Debug)]
enum Role<W> {
    Speak(W),
    Listen,
}

#[derive(Debug)]
enum Phase<W> {
    /// Blocked on the mutex before it could look for a partner.
    Entering(Role<W>),
    /// Asleep on its condition, waiting for a partner.
    Asleep(Role<W>),
    /// Paired; waiting for the mutex to finish. Listeners carry the word.
    Paired(Option<W>),
}

/// Result of [`Communicator::speak`], [`Communicator::listen`] and
/// [`Communicator::resume`].
#[must_use]
#[derive(Debug, PartialEq, Eq)]
pub struct Transfer<W> {
    /// [`WaitOutcome::Blocked`] if the caller must sleep until woken, then
    /// call [`Communicator::resume`].
    pub outcome: WaitOutcome,
    /// The word received, for a listener whose exchange completed.
    pub word: Option<W>,
    /// A thread the caller must wake.
    pub wake: Option<ThreadId>,
}

impl<W> Transfer<W> {
    fn blocked(wake: Option<ThreadId>) -> Self {
        Self {
            outcome: WaitOutcome::Blocked,
            word: None,
            wake,
        }
    }

    fn done(word: Option<W>, wake: Option<ThreadId>) -> Self {
        Self {
            outcome: WaitOutcome::Acquired,
            word,
            wake,
        }
    }
}

/// Lets threads hand words to each other synchronously.
///
/// A speaker does not finish until a listener takes its word, and a
/// listener does not finish until it has one. Waiting speakers and
/// listeners sleep on two conditions of one [`Mutex`]; a thread woken for
/// its partner blocks on that mutex and donates to whoever holds it.
///
/// A woken thread must call [`Communicator::resume`] to carry on.
#[derive(Debug)]
pub struct Communicator<W = u32> {
    mutex: Mutex,
    speakers: Condition,
    listeners: Condition,
    phases: BTreeMap<ThreadId, Phase<W>>,
}

impl<W> Communicator<W> {
    /// Creates a communicator with nobody waiting.
    pub fn new<R: RngCore>(sched: &mut Scheduler<R>) -> Self {
        Self {
            mutex: Mutex::new(sched),
            speakers: Condition::new(sched),
            listeners: Condition::new(sched),
            phases: BTreeMap::new(),
        }
    }

    /// The mutex guarding the exchange.
    pub fn mutex(&self) -> &Mutex {
        &self.mutex
    }

    /// Number of speakers asleep waiting for a listener.
    pub fn waiting_speakers<R>(&self, sched: &Scheduler<R>) -> usize {
        self.speakers.sleepers(sched)
    }

    /// Number of listeners asleep waiting for a speaker.
    pub fn waiting_listeners<R>(&self, sched: &Scheduler<R>) -> usize {
        self.listeners.sleepers(sched)
    }

    /// Offers `word` on behalf of `t`.
    ///
    /// # Panics
    ///
    /// Panics if `t` is already in an exchange.
    pub fn speak<R: RngCore>(
        &mut self,
        sched: &mut Scheduler<R>,
        t: ThreadId,
        word: W,
    ) -> SchedResult<Transfer<W>> {
        self.enter(sched, t, Role::Speak(word))
    }

    /// Asks for a word on behalf of `t`.
    ///
    /// # Panics
    ///
    /// Panics if `t` is already in an exchange.
    pub fn listen<R: RngCore>(
        &mut self,
        sched: &mut Scheduler<R>,
        t: ThreadId,
    ) -> SchedResult<Transfer<W>> {
        self.enter(sched, t, Role::Listen)
    }

    /// Continues the exchange of `t` after it was woken.
    ///
    /// # Panics
    ///
    /// Panics if `t` was not woken by this communicator.
    pub fn resume<R: RngCore>(
        &mut self,
        sched: &mut Scheduler<R>,
        t: ThreadId,
    ) -> SchedResult<Transfer<W>> {
        assert!(
            self.mutex.is_held_by(sched, t),
            "{t} resumed a communicator without being woken"
        );
        match self.phases.remove(&t) {
            Some(Phase::Entering(role)) => self.pair(sched, t, role),
            Some(Phase::Paired(word)) => {
                let wake = self.mutex.unlock(sched, t)?;
                Ok(Transfer::done(word, wake))
            }
            Some(Phase::Asleep(_)) | None => {
                panic!("{t} resumed a communicator it is not waiting on")
            }
        }
    }

    fn enter<R: RngCore>(
        &mut self,
        sched: &mut Scheduler<R>,
        t: ThreadId,
        role: Role<W>,
    ) -> SchedResult<Transfer<W>> {
        assert!(
            !self.phases.contains_key(&t),
            "{t} entered a communicator twice"
        );
        match self.mutex.lock(sched, t) {
            WaitOutcome::Acquired => self.pair(sched, t, role),
            WaitOutcome::Blocked => {
                self.phases.insert(t, Phase::Entering(role));
                Ok(Transfer::blocked(None))
            }
        }
    }

    /// With the mutex held by `t`, pairs it with a sleeping partner or puts
    /// it to sleep.
    fn pair<R: RngCore>(
        &mut self,
        sched: &mut Scheduler<R>,
        t: ThreadId,
        role: Role<W>,
    ) -> SchedResult<Transfer<W>> {
        let partners = match role {
            Role::Speak(_) => &self.listeners,
            Role::Listen => &self.speakers,
        };
        let Some(partner) = partners.notify_one(sched, &self.mutex, t)? else {
            let own = match role {
                Role::Speak(_) => &self.speakers,
                Role::Listen => &self.listeners,
            };
            let wake = own.wait(sched, &self.mutex, t)?;
            self.phases.insert(t, Phase::Asleep(role));
            return Ok(Transfer::blocked(wake));
        };

        let word = match role {
            Role::Speak(word) => {
                self.phases.insert(partner, Phase::Paired(Some(word)));
                None
            }
            Role::Listen => match self.phases.insert(partner, Phase::Paired(None)) {
                Some(Phase::Asleep(Role::Speak(word))) => Some(word),
                _ => panic!("{partner} slept among speakers without a word"),
            },
        };
        trace!("communicator: {t} paired with {partner}");
        let wake = self.mutex.unlock(sched, t)?;
        Ok(Transfer::done(word, wake))
    }
}
