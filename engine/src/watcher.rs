use crate::{
    enumerate::enumerate,
    native::SoundSystem,
    notify::{WakeSender, WatchSession},
    published::PublishedState,
};
use nix::{
    errno::Errno,
    poll::{PollFd, PollFlags, PollTimeout, poll},
};
use std::sync::{
    Arc,
    atomic::{AtomicU8, Ordering},
};
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherState {
    Running,
    Stopping,
    Stopped,
}

impl WatcherState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => WatcherState::Running,
            1 => WatcherState::Stopping,
            _ => WatcherState::Stopped,
        }
    }
}

#[derive(Debug)]
pub struct WatcherControl {
    state: AtomicU8,
    wake: WakeSender,
}

impl WatcherControl {
    pub fn new(wake: WakeSender) -> Self {
        Self {
            state: AtomicU8::new(WatcherState::Running as u8),
            wake,
        }
    }

    pub fn state(&self) -> WatcherState {
        WatcherState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn wake(&self) {
        self.wake.wake();
    }

    pub fn request_stop(&self) {
        let _ = self.state.compare_exchange(
            WatcherState::Running as u8,
            WatcherState::Stopping as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
        self.wake.wake();
    }

    fn stop_requested(&self) -> bool {
        self.state() != WatcherState::Running
    }

    fn mark_stopped(&self) {
        self.state
            .store(WatcherState::Stopped as u8, Ordering::Release);
    }
}

pub struct Watcher<S: SoundSystem> {
    system: S,
    session: WatchSession,
    published: Arc<PublishedState>,
    control: Arc<WatcherControl>,
    preferred_rate: u32,
}

enum Wake {
    Stop,
    Events { changes: bool, wakeups: bool },
}

impl<S: SoundSystem> Watcher<S> {
    pub fn new(
        system: S,
        session: WatchSession,
        published: Arc<PublishedState>,
        control: Arc<WatcherControl>,
        preferred_rate: u32,
    ) -> Self {
        Self {
            system,
            session,
            published,
            control,
            preferred_rate,
        }
    }

    pub fn run(mut self) {
        debug!("device watcher started");
        loop {
            let (changes, wakeups) = match self.wait() {
                Wake::Stop => break,
                Wake::Events { changes, wakeups } => (changes, wakeups),
            };
            let mut rescan = false;
            if changes {
                rescan |= self.session.drain_changes();
            }
            if wakeups {
                self.session.drain_wakeups();
                if self.control.stop_requested() {
                    break;
                }
                rescan = true;
            }
            if rescan {
                self.refresh();
            }
        }
        self.control.mark_stopped();
        debug!("device watcher stopped");
    }

    fn wait(&self) -> Wake {
        loop {
            let mut fds = [
                PollFd::new(self.session.notify_fd(), PollFlags::POLLIN),
                PollFd::new(self.session.wake_fd(), PollFlags::POLLIN),
            ];
            let result = poll(&mut fds, PollTimeout::NONE);
            if self.control.stop_requested() {
                return Wake::Stop;
            }
            match result {
                Ok(0) => continue,
                Ok(_) => {}
                Err(Errno::EINTR) => continue,
                Err(e) => fatal(&format!("waiting for device changes failed: {e}")),
            }
            let readable = |fd: &PollFd| {
                fd.revents()
                    .is_some_and(|r| r.intersects(PollFlags::POLLIN))
            };
            return Wake::Events {
                changes: readable(&fds[0]),
                wakeups: readable(&fds[1]),
            };
        }
    }

    fn refresh(&self) {
        match enumerate(&self.system, self.preferred_rate) {
            Ok(snapshot) => {
                info!(
                    "publishing {} outputs, {} inputs",
                    snapshot.outputs().len(),
                    snapshot.inputs().len()
                );
                self.published.publish(snapshot);
            }
            Err(e) => fatal(&format!("error refreshing devices: {e}")),
        }
    }
}

/// The device state is unknown after a failed sweep; there is nothing safe
/// left to publish.
fn fatal(msg: &str) -> ! {
    error!("{}", msg);
    eprintln!("soundwatch: {msg}");
    std::process::abort();
}
