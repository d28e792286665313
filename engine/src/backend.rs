use crate::{
    channel::{ChannelId, ChannelLayout},
    config::PREFERRED_SAMPLE_RATE,
    device::{Device, Purpose, Snapshot},
    published::{PublishedState, Waker},
};
use std::sync::Arc;

/// One way of discovering devices. Dropping a backend tears it down.
pub trait Backend: Send {
    fn name(&self) -> &'static str;

    /// Takes the snapshot published since the last call, if any. Blocks only
    /// until the backend has discovered devices for the first time.
    fn flush_events(&mut self) -> Option<Snapshot>;

    fn signals(&self) -> u64;

    /// Blocks until the signal count moves past `seen`.
    fn wait_for_signal(&self, seen: u64);

    fn waker(&self) -> Waker;
}

#[cfg(target_os = "linux")]
pub use hotplug::HotplugBackend;

#[cfg(target_os = "linux")]
mod hotplug {
    use super::Backend;
    use crate::{
        config::WatchConfig,
        device::Snapshot,
        error::{Error, Result},
        native::SoundSystem,
        notify::WatchSession,
        published::{PublishedState, Waker},
        watcher::{Watcher, WatcherControl, WatcherState},
    };
    use std::{sync::Arc, thread::JoinHandle};
    use tracing::{debug, error};

    const THREAD_NAME: &str = "soundwatch-hotplug";

    #[derive(Debug)]
    pub struct HotplugBackend {
        published: Arc<PublishedState>,
        control: Arc<WatcherControl>,
        thread: Option<JoinHandle<()>>,
    }

    impl HotplugBackend {
        pub fn start<S: SoundSystem>(system: S, config: &WatchConfig) -> Result<Self> {
            let published = Arc::new(PublishedState::new());
            let (session, wake) = WatchSession::open(&config.watch_dir)?;
            let control = Arc::new(WatcherControl::new(wake));
            // the first sweep runs without waiting for a hardware change
            control.wake();

            let watcher = Watcher::new(
                system,
                session,
                published.clone(),
                control.clone(),
                config.preferred_sample_rate,
            );
            let thread = std::thread::Builder::new()
                .name(THREAD_NAME.to_string())
                .spawn(move || watcher.run())
                .map_err(|e| Error::from_os("device watcher thread", &e))?;
            debug!("hotplug backend watching {}", config.watch_dir.display());

            Ok(Self {
                published,
                control,
                thread: Some(thread),
            })
        }

        pub fn watcher_state(&self) -> WatcherState {
            self.control.state()
        }

        /// Stops and joins the watcher. Safe to call more than once.
        pub fn shutdown(&mut self) {
            let Some(thread) = self.thread.take() else {
                return;
            };
            self.control.request_stop();
            if thread.join().is_err() {
                error!("device watcher thread panicked");
            }
            // release anyone still blocked in wait_events
            self.published.signal();
        }
    }

    impl Backend for HotplugBackend {
        fn name(&self) -> &'static str {
            "alsa"
        }

        fn flush_events(&mut self) -> Option<Snapshot> {
            self.published.block_until_discovered();
            self.published.take()
        }

        fn signals(&self) -> u64 {
            self.published.signals()
        }

        fn wait_for_signal(&self, seen: u64) {
            self.published.wait_signal(seen);
        }

        fn waker(&self) -> Waker {
            Waker::new(self.published.clone())
        }
    }

    impl Drop for HotplugBackend {
        fn drop(&mut self) {
            self.shutdown();
        }
    }
}

#[derive(Debug)]
pub struct DummyBackend {
    published: Arc<PublishedState>,
}

impl DummyBackend {
    pub fn new() -> Self {
        let published = Arc::new(PublishedState::new());
        published.publish(dummy_snapshot());
        Self { published }
    }
}

impl Default for DummyBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn dummy_device(name: &str, description: &str, purpose: Purpose, channels: &[ChannelId]) -> Device {
    let mut device = Device::new(name.to_string(), description.to_string(), purpose, false);
    device.layout = ChannelLayout::from_channels(channels.iter().copied());
    device.sample_rate_min = 8_000;
    device.sample_rate_max = 5_644_800;
    device.sample_rate_default = PREFERRED_SAMPLE_RATE;
    device
}

fn dummy_snapshot() -> Snapshot {
    let mut snapshot = Snapshot::new();
    snapshot.push(
        dummy_device(
            "dummy-out",
            "Dummy Output Device",
            Purpose::Output,
            &[ChannelId::FrontLeft, ChannelId::FrontRight],
        ),
        true,
    );
    snapshot.push(
        dummy_device(
            "dummy-in",
            "Dummy Input Device",
            Purpose::Input,
            &[ChannelId::FrontCenter],
        ),
        true,
    );
    snapshot
}

impl Backend for DummyBackend {
    fn name(&self) -> &'static str {
        "dummy"
    }

    fn flush_events(&mut self) -> Option<Snapshot> {
        self.published.take()
    }

    fn signals(&self) -> u64 {
        self.published.signals()
    }

    fn wait_for_signal(&self, seen: u64) {
        self.published.wait_signal(seen);
    }

    fn waker(&self) -> Waker {
        Waker::new(self.published.clone())
    }
}
