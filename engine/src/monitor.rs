use crate::{
    backend::{Backend, DummyBackend},
    config::{BackendKind, WatchConfig},
    device::{Device, Purpose, Snapshot},
    error::Result,
    published::Waker,
};
use std::sync::Arc;
use tracing::{debug, info};

pub type DevicesChanged = Box<dyn FnMut(&Snapshot) + Send>;

pub struct DeviceMonitor {
    backend: Box<dyn Backend>,
    current: Option<Arc<Snapshot>>,
    on_change: DevicesChanged,
}

impl std::fmt::Debug for DeviceMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceMonitor")
            .field("backend", &self.backend.name())
            .field("current", &self.current)
            .finish()
    }
}

impl DeviceMonitor {
    pub fn open(config: &WatchConfig) -> Result<Self> {
        let backend: Box<dyn Backend> = match config.backend {
            #[cfg(target_os = "linux")]
            BackendKind::Alsa => Box::new(crate::backend::HotplugBackend::start(
                crate::native::alsa::AlsaSystem,
                config,
            )?),
            #[cfg(not(target_os = "linux"))]
            BackendKind::Alsa => {
                return Err(crate::error::Error::OpeningDevice(
                    "ALSA is only available on Linux".to_string(),
                ));
            }
            BackendKind::Dummy => Box::new(DummyBackend::new()),
        };
        info!("device monitor using {} backend", backend.name());
        Ok(Self::with_backend(backend))
    }

    pub fn with_backend(backend: Box<dyn Backend>) -> Self {
        Self {
            backend,
            current: None,
            on_change: Box::new(|snapshot| {
                debug!(
                    "devices changed: {} outputs, {} inputs",
                    snapshot.outputs().len(),
                    snapshot.inputs().len()
                );
            }),
        }
    }

    pub fn on_devices_change(&mut self, callback: impl FnMut(&Snapshot) + Send + 'static) {
        self.on_change = Box::new(callback);
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn flush_events(&mut self) {
        self.flush();
    }

    /// Flushes, then blocks until the next publish or wake.
    pub fn wait_events(&mut self) {
        self.wait_events_unless(|| false);
    }

    /// Like `wait_events`, but skips the wait when `stopped` holds. The check
    /// runs after the signal count is sampled, so a caller that sets its flag
    /// and then wakes can never leave this blocked.
    pub fn wait_events_unless(&mut self, stopped: impl Fn() -> bool) {
        let seen = self.backend.signals();
        if stopped() {
            return;
        }
        self.flush();
        self.backend.wait_for_signal(seen);
    }

    fn flush(&mut self) {
        if let Some(snapshot) = self.backend.flush_events() {
            let previous = self.current.replace(Arc::new(snapshot));
            if let Some(current) = self.current.as_deref() {
                (self.on_change)(current);
            }
            drop(previous);
        }
    }

    pub fn waker(&self) -> Waker {
        self.backend.waker()
    }

    pub fn wakeup(&self) {
        self.backend.waker().wake();
    }

    pub fn devices(&self) -> Option<Arc<Snapshot>> {
        self.current.clone()
    }

    pub fn device_count(&self, purpose: Purpose) -> usize {
        self.current
            .as_ref()
            .map(|s| s.count(purpose))
            .unwrap_or(0)
    }

    pub fn device(&self, purpose: Purpose, idx: usize) -> Option<Arc<Device>> {
        self.current.as_ref()?.device(purpose, idx)
    }

    pub fn default_device(&self, purpose: Purpose) -> Option<Arc<Device>> {
        self.current.as_ref()?.default_device(purpose)
    }

    pub fn default_index(&self, purpose: Purpose) -> Option<usize> {
        self.current.as_ref()?.default_index(purpose)
    }

    pub fn close(self) {
        let Self {
            backend, current, ..
        } = self;
        drop(backend);
        drop(current);
    }
}
