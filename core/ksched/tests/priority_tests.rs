use ksched::{PRIORITY_DEFAULT, SchedConfig, SchedError, SchedLock, Scheduler, ThreadId};

fn new_lock() -> SchedLock {
    SchedLock::new(Scheduler::new(SchedConfig::priority()).unwrap())
}

fn tid(id: u64) -> ThreadId {
    ThreadId::new(id)
}

#[test]
fn high_waiter_lifts_low_holder() {
    let sched = new_lock();
    let (low, high) = (tid(1), tid(2));

    let lock = {
        let mut s = sched.lock();
        s.set_priority(low, 0).unwrap();
        s.set_priority(high, 7).unwrap();
        let lock = s.new_queue(true);
        s.acquire(lock, low);
        lock
    };

    {
        let mut s = sched.lock();
        s.wait_for_access(lock, high);
        assert!(s.get_effective_priority(low) >= s.get_priority(high));
    }

    let mut s = sched.lock();
    assert_eq!(s.next_thread(lock), Some(high));
    assert_eq!(s.get_effective_priority(low), 0);
    assert_eq!(s.get_effective_priority(high), 7);
}

#[test]
fn three_level_chain() {
    let sched = new_lock();
    let mut s = sched.lock();
    let (a, b, c, d) = (tid(1), tid(2), tid(3), tid(4));
    s.set_priority(a, 7).unwrap();

    let qb = s.new_queue(true);
    let qc = s.new_queue(true);
    let qd = s.new_queue(true);
    s.acquire(qb, b);
    s.acquire(qc, c);
    s.acquire(qd, d);
    s.wait_for_access(qd, c);
    s.wait_for_access(qc, b);
    s.wait_for_access(qb, a);

    for t in [b, c, d] {
        assert_eq!(s.get_effective_priority(t), 7, "{t}");
    }

    // d hands its resource to c; only c keeps a's priority.
    assert_eq!(s.next_thread(qd), Some(c));
    assert_eq!(s.get_effective_priority(d), PRIORITY_DEFAULT);
    assert_eq!(s.get_effective_priority(c), 7);
}

#[test]
fn chain_through_non_transferring_queue_stops() {
    let sched = new_lock();
    let mut s = sched.lock();
    let (a, b, c) = (tid(1), tid(2), tid(3));
    s.set_priority(a, 6).unwrap();

    let qb = s.new_queue(true);
    let qc = s.new_queue(false);
    s.acquire(qb, b);
    s.acquire(qc, c);
    s.wait_for_access(qc, b);
    s.wait_for_access(qb, a);

    assert_eq!(s.get_effective_priority(b), 6);
    assert_eq!(s.get_effective_priority(c), PRIORITY_DEFAULT);
}

#[test]
fn fifo_among_equals_after_donation() {
    let sched = new_lock();
    let mut s = sched.lock();
    let owner = tid(10);
    let q = s.new_queue(true);
    s.acquire(q, owner);

    let (first, second) = (tid(1), tid(2));
    let inner = s.new_queue(true);
    s.acquire(inner, second);
    s.wait_for_access(q, first);
    s.wait_for_access(q, second);
    assert_eq!(s.peek(q), Some(first));

    // `second` is lifted by a waiter of its own and overtakes `first`.
    s.set_priority(tid(3), 5).unwrap();
    s.wait_for_access(inner, tid(3));
    assert_eq!(s.get_effective_priority(owner), 5);
    assert_eq!(s.peek(q), Some(second));

    // Once the donor leaves, the original order is back.
    assert_eq!(s.next_thread(inner), Some(tid(3)));
    assert_eq!(s.peek(q), Some(first));
    assert_eq!(s.get_effective_priority(owner), PRIORITY_DEFAULT);
}

#[test]
fn out_of_range_is_rejected() {
    let sched = new_lock();
    let mut s = sched.lock();
    assert_eq!(s.set_priority(tid(1), 8), Err(SchedError::OutOfRange));
    assert_eq!(s.thread_count(), 0);
}
