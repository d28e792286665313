use crate::device::Snapshot;
use std::sync::{
    Arc, Condvar, Mutex, MutexGuard, PoisonError,
    atomic::{AtomicBool, Ordering},
};

#[derive(Debug, Default)]
struct Slot {
    ready: Option<Snapshot>,
    signals: u64,
}

/// Single-slot handoff between the watcher and the consumer. The lock only
/// ever guards a slot swap and a counter bump, never a sweep.
#[derive(Debug, Default)]
pub struct PublishedState {
    slot: Mutex<Slot>,
    cond: Condvar,
    discovered: AtomicBool,
}

impl PublishedState {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn publish(&self, snapshot: Snapshot) {
        let superseded = {
            let mut slot = self.lock();
            let superseded = slot.ready.replace(snapshot);
            self.discovered.store(true, Ordering::Release);
            slot.signals = slot.signals.wrapping_add(1);
            self.cond.notify_all();
            superseded
        };
        drop(superseded);
    }

    pub fn has_discovered(&self) -> bool {
        self.discovered.load(Ordering::Acquire)
    }

    pub fn block_until_discovered(&self) {
        if self.has_discovered() {
            return;
        }
        let mut slot = self.lock();
        while !self.has_discovered() {
            slot = self.cond.wait(slot).unwrap_or_else(PoisonError::into_inner);
        }
    }

    pub fn take(&self) -> Option<Snapshot> {
        self.lock().ready.take()
    }

    /// Publishes and wakes counted so far. Read it before flushing so that
    /// nothing arriving during the flush is missed by `wait_signal`.
    pub fn signals(&self) -> u64 {
        self.lock().signals
    }

    /// Blocks until the signal count moves past `seen`.
    pub fn wait_signal(&self, seen: u64) {
        let mut slot = self.lock();
        while slot.signals == seen {
            slot = self.cond.wait(slot).unwrap_or_else(PoisonError::into_inner);
        }
    }

    pub fn signal(&self) {
        let mut slot = self.lock();
        slot.signals = slot.signals.wrapping_add(1);
        self.cond.notify_all();
    }
}

#[derive(Debug, Clone)]
pub struct Waker {
    state: Arc<PublishedState>,
}

impl Waker {
    pub fn new(state: Arc<PublishedState>) -> Self {
        Self { state }
    }

    pub fn wake(&self) {
        self.state.signal();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{Device, Purpose};
    use std::{sync::mpsc, thread, time::Duration};

    fn snapshot_with(name: &str) -> Snapshot {
        let mut snapshot = Snapshot::new();
        snapshot.push(
            Device::new(name.into(), name.into(), Purpose::Output, false),
            false,
        );
        snapshot
    }

    #[test]
    fn publish_replaces_unconsumed_snapshot() {
        let state = PublishedState::new();
        assert!(!state.has_discovered());
        state.publish(snapshot_with("first"));
        state.publish(snapshot_with("second"));
        assert!(state.has_discovered());

        let snapshot = state.take().expect("snapshot");
        assert_eq!(snapshot.outputs()[0].name, "second");
        assert_eq!(state.signals(), 2);
        assert!(state.take().is_none());
    }

    #[test]
    fn discovery_unblocks_waiter() {
        let state = Arc::new(PublishedState::new());
        let (tx, rx) = mpsc::channel();
        let waiter = {
            let state = state.clone();
            thread::spawn(move || {
                state.block_until_discovered();
                let _ = tx.send(());
            })
        };
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
        state.publish(Snapshot::new());
        rx.recv_timeout(Duration::from_secs(5))
            .expect("waiter should be released by the first publish");
        waiter.join().expect("waiter thread");
    }

    #[test]
    fn signal_after_take_releases_wait() {
        let state = Arc::new(PublishedState::new());
        let seen = state.signals();
        let waker = Waker::new(state.clone());
        let (tx, rx) = mpsc::channel();
        let waiter = {
            let state = state.clone();
            thread::spawn(move || {
                state.wait_signal(seen);
                let _ = tx.send(());
            })
        };
        waker.wake();
        rx.recv_timeout(Duration::from_secs(5))
            .expect("wake should release the waiter");
        waiter.join().expect("waiter thread");
    }

    #[test]
    fn stale_seen_returns_immediately() {
        let state = PublishedState::new();
        let seen = state.signals();
        state.signal();
        state.wait_signal(seen);
    }

    #[test]
    fn racing_publish_and_take_keep_defaults_in_bounds() {
        let state = Arc::new(PublishedState::new());
        let publisher = {
            let state = state.clone();
            thread::spawn(move || {
                for round in 0..2_000_usize {
                    let mut snapshot = Snapshot::new();
                    let len = round % 7;
                    for i in 0..len {
                        let name = format!("dev{i}");
                        snapshot.push(
                            Device::new(name.clone(), name.clone(), Purpose::Output, false),
                            i + 1 == len,
                        );
                        snapshot.push(Device::new(name.clone(), name, Purpose::Input, false), i == 0);
                    }
                    state.publish(snapshot);
                }
            })
        };

        let mut taken = 0;
        while !publisher.is_finished() || taken == 0 {
            if let Some(snapshot) = state.take() {
                taken += 1;
                for purpose in Purpose::ALL {
                    if let Some(idx) = snapshot.default_index(purpose) {
                        assert!(idx < snapshot.count(purpose));
                    }
                }
                assert_eq!(snapshot.outputs().len(), snapshot.inputs().len());
            }
        }
        publisher.join().expect("publisher thread");
    }
}
