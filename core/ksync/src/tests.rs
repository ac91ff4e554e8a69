//! Test suite for ksync

use ksched::{PriorityRange, SchedConfig, SchedError, Scheduler, ThreadId};

use super::*;

fn tid(id: u64) -> ThreadId {
    ThreadId::new(id)
}

fn sched() -> Scheduler {
    Scheduler::new(SchedConfig::priority()).unwrap()
}

#[test]
fn outcome_reports_blocking() {
    assert!(WaitOutcome::Blocked.is_blocked());
    assert!(!WaitOutcome::Acquired.is_blocked());
}

#[test]
fn try_lock_only_when_free() {
    let mut s = sched();
    let mutex = Mutex::new(&mut s);
    assert!(mutex.try_lock(&mut s, tid(1)));
    assert!(!mutex.try_lock(&mut s, tid(2)));
    assert!(mutex.is_held_by(&s, tid(1)));
    assert_eq!(s.waiters(mutex.queue()), vec![]);
}

#[test]
fn unlock_without_waiters_frees_the_mutex() {
    let mut s = sched();
    let mutex = Mutex::new(&mut s);
    assert_eq!(mutex.lock(&mut s, tid(1)), WaitOutcome::Acquired);
    assert_eq!(mutex.unlock(&mut s, tid(1)).unwrap(), None);
    assert_eq!(mutex.holder(&s), None);
    assert!(s.owned(tid(1)).is_empty());
}

#[test]
#[should_panic(expected = "doesn't own")]
fn unlock_by_stranger_is_fatal() {
    let mut s = sched();
    let mutex = Mutex::new(&mut s);
    let _ = mutex.lock(&mut s, tid(1));
    let _ = mutex.unlock(&mut s, tid(2));
}

#[test]
#[should_panic(expected = "already holds")]
fn relock_is_fatal() {
    let mut s = sched();
    let mutex = Mutex::new(&mut s);
    let _ = mutex.lock(&mut s, tid(1));
    let _ = mutex.lock(&mut s, tid(1));
}

#[test]
fn destroy_busy_mutex_fails() {
    let mut s = sched();
    let mutex = Mutex::new(&mut s);
    let _ = mutex.lock(&mut s, tid(1));
    let _ = mutex.lock(&mut s, tid(2));
    let queue = mutex.queue();
    assert_eq!(mutex.destroy(&mut s), Err(SchedError::ResourceBusy));
    assert_eq!(s.transfers_priority(queue), Some(true));
}

#[test]
fn semaphore_counts_permits() {
    let mut s = sched();
    let mut sem = Semaphore::new(&mut s, 2);
    assert!(sem.try_acquire());
    assert_eq!(sem.acquire(&mut s, tid(1)), WaitOutcome::Acquired);
    assert!(!sem.try_acquire());
    assert_eq!(sem.available_permits(), 0);

    assert_eq!(sem.release(&mut s).unwrap(), None);
    assert_eq!(sem.release(&mut s).unwrap(), None);
    assert_eq!(sem.available_permits(), 2);
}

#[test]
fn finished_barrier_does_not_block() {
    let mut s = sched();
    let mut join = JoinBarrier::new(&mut s, tid(1));
    assert_eq!(join.finish(&mut s).unwrap(), vec![]);
    assert!(join.is_finished());
    assert_eq!(join.join(&mut s, tid(2)), WaitOutcome::Acquired);
    assert_eq!(join.finish(&mut s).unwrap(), vec![]);
    assert_eq!(s.queue_count(), 0);
}

#[test]
fn lottery_unlock_always_wakes_the_poorest_waiter() {
    let zero = SchedConfig {
        range: PriorityRange::new(0, 10, 1),
        ..SchedConfig::lottery()
    };
    assert_eq!(Scheduler::new(zero).err(), Some(SchedError::InvalidInput));

    let config = SchedConfig::lottery()
        .with_range(PriorityRange::new(1, 10, 1))
        .unwrap();
    let mut s = Scheduler::new(config).unwrap();
    let mutex = Mutex::new(&mut s);
    let (holder, waiter) = (tid(1), tid(2));
    s.set_priority(waiter, 1).unwrap();
    let _ = mutex.lock(&mut s, holder);
    assert!(mutex.lock(&mut s, waiter).is_blocked());

    assert_eq!(mutex.unlock(&mut s, holder).unwrap(), Some(waiter));
    assert!(mutex.is_held_by(&s, waiter));
    assert!(s.waiters(mutex.queue()).is_empty());
}
