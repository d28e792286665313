pub mod backend;
pub mod channel;
pub mod config;
pub mod device;
pub mod enumerate;
pub mod error;
pub mod monitor;
pub mod native;
pub mod notify;
pub mod probe;
pub mod published;
#[cfg(target_os = "linux")]
pub mod watcher;

pub use backend::{Backend, DummyBackend};
#[cfg(target_os = "linux")]
pub use backend::HotplugBackend;
pub use channel::{ChannelId, ChannelLayout};
pub use config::{BackendKind, WatchConfig};
pub use device::{Device, Purpose, Snapshot};
pub use error::{Error, Result};
pub use monitor::DeviceMonitor;
pub use published::Waker;
