// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

//! Waiter set of the lottery policy.
//!
//! A waiter's effective priority is its ticket count. Picking the next
//! thread draws a ticket uniformly from `1..=total` and walks the waiters in
//! enqueue order, accumulating tickets until the running sum reaches the
//! draw, so every waiter wins with probability proportional to its share.
//! All ticket sums saturate at [`Priority::MAX`].

use alloc::vec::Vec;

use rand_core::RngCore;

use crate::{Priority, ThreadId, thread::Waiter};

#[derive(Debug, Default)]
pub(crate) struct LotteryWaiters {
    entries: Vec<Waiter>,
    /// Ticket drawn by a `peek` and not yet consumed.
    drawn: Option<Priority>,
}

impl LotteryWaiters {
    pub(crate) fn insert(&mut self, waiter: Waiter) {
        debug_assert!(self.position(waiter.tid).is_none(), "{} queued twice", waiter.tid);
        self.entries.push(waiter);
        self.drawn = None;
    }

    pub(crate) fn remove(&mut self, waiter: &Waiter) -> bool {
        match self.position(waiter.tid) {
            Some(index) => {
                self.entries.remove(index);
                self.drawn = None;
                true
            }
            None => false,
        }
    }

    pub(crate) fn retune(&mut self, waiter: &Waiter, effective: Priority) {
        if let Some(index) = self.position(waiter.tid) {
            self.entries[index].effective = effective;
            self.drawn = None;
        }
    }

    /// Saturating sum of all waiters' tickets.
    pub(crate) fn total_tickets(&self) -> Priority {
        self.entries
            .iter()
            .fold(0, |total: Priority, w| total.saturating_add(w.effective))
    }

    /// What owners of this queue inherit: the sum of the waiters' tickets.
    pub(crate) fn donation(&self) -> Option<Priority> {
        (!self.entries.is_empty()).then(|| self.total_tickets())
    }

    /// Selects the winner without removing it. The draw is kept so that the
    /// next [`LotteryWaiters::pop`] returns the same waiter.
    pub(crate) fn peek<R: RngCore>(&mut self, rng: &mut R) -> Option<&Waiter> {
        let index = self.pick(rng)?;
        Some(&self.entries[index])
    }

    pub(crate) fn pop<R: RngCore>(&mut self, rng: &mut R) -> Option<Waiter> {
        let index = self.pick(rng)?;
        self.drawn = None;
        Some(self.entries.remove(index))
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Enqueue order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Waiter> {
        self.entries.iter()
    }

    fn pick<R: RngCore>(&mut self, rng: &mut R) -> Option<usize> {
        let total = self.total_tickets();
        if total == 0 {
            return None;
        }
        let ticket = match self.drawn {
            Some(ticket) => ticket,
            None => {
                let ticket = draw_ticket(rng, total);
                trace!("lottery: drew ticket {ticket} of {total}");
                self.drawn = Some(ticket);
                ticket
            }
        };
        winner(&self.entries, ticket)
    }

    fn position(&self, tid: ThreadId) -> Option<usize> {
        self.entries.iter().position(|w| w.tid == tid)
    }
}

/// Draws a ticket uniformly from `1..=total`.
///
/// Values from the top of the `u64` range that would bias the modulo are
/// rejected and redrawn.
pub(crate) fn draw_ticket<R: RngCore>(rng: &mut R, total: Priority) -> Priority {
    debug_assert!(total > 0);
    let range = u64::from(total);
    let limit = u64::MAX - u64::MAX % range;
    loop {
        let value = rng.next_u64();
        if value < limit {
            // `value % range < total`, so the cast is lossless.
            return (value % range) as Priority + 1;
        }
    }
}

/// Index of the first waiter whose cumulative ticket count reaches `ticket`.
fn winner(entries: &[Waiter], ticket: Priority) -> Option<usize> {
    let mut count: Priority = 0;
    for (index, waiter) in entries.iter().enumerate() {
        count = count.saturating_add(waiter.effective);
        if count >= ticket {
            return Some(index);
        }
    }
    // Only reachable if `ticket` exceeds the total; hand it to the last one.
    entries.len().checked_sub(1)
}

#[cfg(test)]
mod tests {
    use rand_core::impls;

    use super::*;

    /// Yields a fixed sequence of raw values.
    struct Script(Vec<u64>);

    impl RngCore for Script {
        fn next_u32(&mut self) -> u32 {
            self.next_u64() as u32
        }

        fn next_u64(&mut self) -> u64 {
            self.0.remove(0)
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            impls::fill_bytes_via_next(self, dest)
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }

    fn waiter(id: u64, tickets: Priority) -> Waiter {
        Waiter {
            tid: ThreadId::new(id),
            effective: tickets,
            since: id,
            seq: id,
        }
    }

    #[test]
    fn draw_maps_raw_value_into_range() {
        let mut rng = Script(vec![4, 99, 100]);
        assert_eq!(draw_ticket(&mut rng, 100), 5);
        assert_eq!(draw_ticket(&mut rng, 100), 100);
        assert_eq!(draw_ticket(&mut rng, 100), 1);
    }

    #[test]
    fn draw_rejects_biased_tail() {
        let mut rng = Script(vec![u64::MAX, 6]);
        assert_eq!(draw_ticket(&mut rng, 10), 7);
    }

    #[test]
    fn winner_follows_cumulative_ranges() {
        let entries = [waiter(1, 10), waiter(2, 30), waiter(3, 60)];
        assert_eq!(winner(&entries, 1), Some(0));
        assert_eq!(winner(&entries, 10), Some(0));
        assert_eq!(winner(&entries, 11), Some(1));
        assert_eq!(winner(&entries, 40), Some(1));
        assert_eq!(winner(&entries, 41), Some(2));
        assert_eq!(winner(&entries, 100), Some(2));
        assert_eq!(winner(&[], 1), None);
    }

    #[test]
    fn total_saturates() {
        let mut set = LotteryWaiters::default();
        set.insert(waiter(1, Priority::MAX - 5));
        set.insert(waiter(2, 10));
        assert_eq!(set.total_tickets(), Priority::MAX);
        assert_eq!(set.donation(), Some(Priority::MAX));
    }

    #[test]
    fn peek_is_sticky_until_the_set_changes() {
        let mut set = LotteryWaiters::default();
        set.insert(waiter(1, 10));
        set.insert(waiter(2, 30));
        set.insert(waiter(3, 60));

        let mut rng = Script(vec![94, 4]);
        assert_eq!(set.peek(&mut rng).map(|w| w.tid), Some(ThreadId::new(3)));
        assert_eq!(set.peek(&mut rng).map(|w| w.tid), Some(ThreadId::new(3)));
        assert_eq!(set.len(), 3);
        assert_eq!(set.pop(&mut rng).map(|w| w.tid), Some(ThreadId::new(3)));

        // The cached draw was consumed; the next pop draws 5.
        assert_eq!(set.pop(&mut rng).map(|w| w.tid), Some(ThreadId::new(1)));
        assert_eq!(set.len(), 1);
    }
}
