//! Integration tests for the communicator.

use ksched::{SchedConfig, Scheduler, ThreadId};
use ksync::{Communicator, Transfer, WaitOutcome};

fn tid(id: u64) -> ThreadId {
    ThreadId::new(id)
}

fn done(word: Option<u32>, wake: Option<ThreadId>) -> Transfer<u32> {
    Transfer {
        outcome: WaitOutcome::Acquired,
        word,
        wake,
    }
}

fn blocked() -> Transfer<u32> {
    Transfer {
        outcome: WaitOutcome::Blocked,
        word: None,
        wake: None,
    }
}

#[test]
fn listener_first() {
    let mut s = Scheduler::new(SchedConfig::priority()).unwrap();
    let mut comm = Communicator::new(&mut s);
    let (listener, speaker) = (tid(1), tid(2));

    assert_eq!(comm.listen(&mut s, listener).unwrap(), blocked());
    assert_eq!(comm.waiting_listeners(&s), 1);

    assert_eq!(comm.speak(&mut s, speaker, 42).unwrap(), done(None, Some(listener)));
    assert_eq!(comm.resume(&mut s, listener).unwrap(), done(Some(42), None));
    assert_eq!(comm.mutex().holder(&s), None);
}

#[test]
fn speaker_first() {
    let mut s = Scheduler::new(SchedConfig::priority()).unwrap();
    let mut comm = Communicator::new(&mut s);
    let (speaker, listener) = (tid(1), tid(2));

    assert_eq!(comm.speak(&mut s, speaker, 7).unwrap(), blocked());
    assert_eq!(comm.waiting_speakers(&s), 1);

    assert_eq!(comm.listen(&mut s, listener).unwrap(), done(Some(7), Some(speaker)));
    assert_eq!(comm.resume(&mut s, speaker).unwrap(), done(None, None));
    assert_eq!(comm.waiting_speakers(&s), 0);
    assert_eq!(comm.mutex().holder(&s), None);
}

#[test]
fn late_listener_donates_to_the_woken_speaker() {
    let mut s = Scheduler::new(SchedConfig::priority()).unwrap();
    let mut comm = Communicator::new(&mut s);
    let (s1, s2, l1, l2) = (tid(1), tid(2), tid(3), tid(4));
    s.set_priority(l2, 6).unwrap();

    assert_eq!(comm.speak(&mut s, s1, 10).unwrap(), blocked());
    assert_eq!(comm.speak(&mut s, s2, 20).unwrap(), blocked());

    // Speakers are paired in arrival order.
    assert_eq!(comm.listen(&mut s, l1).unwrap(), done(Some(10), Some(s1)));

    // `s1` holds the mutex until it resumes; `l2` queues behind it.
    assert_eq!(comm.listen(&mut s, l2).unwrap(), blocked());
    assert_eq!(s.get_effective_priority(s1), 6);

    assert_eq!(comm.resume(&mut s, s1).unwrap(), done(None, Some(l2)));
    assert_eq!(s.get_effective_priority(s1), 1);
    assert_eq!(comm.resume(&mut s, l2).unwrap(), done(Some(20), Some(s2)));
    assert_eq!(comm.resume(&mut s, s2).unwrap(), done(None, None));
    assert_eq!(comm.waiting_speakers(&s), 0);
    assert_eq!(comm.waiting_listeners(&s), 0);
}

#[test]
fn every_word_is_heard_once() {
    let mut rng = fastrand::Rng::with_seed(150);
    let mut s = Scheduler::new(SchedConfig::lottery()).unwrap();
    let mut comm = Communicator::new(&mut s);
    let mut woken = Vec::new();
    let mut heard = Vec::new();
    let mut next = 0;

    for _ in 0..500 {
        let transfer = match woken.pop() {
            Some(t) if rng.bool() => comm.resume(&mut s, t).unwrap(),
            other => {
                woken.extend(other);
                next += 1;
                if rng.bool() {
                    comm.speak(&mut s, tid(next), next as u32).unwrap()
                } else {
                    comm.listen(&mut s, tid(next)).unwrap()
                }
            }
        };
        heard.extend(transfer.word);
        woken.extend(transfer.wake);
    }
    while let Some(t) = woken.pop() {
        let transfer = comm.resume(&mut s, t).unwrap();
        heard.extend(transfer.word);
        woken.extend(transfer.wake);
    }

    let mut sorted = heard.clone();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(sorted.len(), heard.len());
    assert_eq!(comm.mutex().holder(&s), None);
    // A speaker and a listener are never left waiting at the same time.
    assert!(comm.waiting_speakers(&s) == 0 || comm.waiting_listeners(&s) == 0);
}
