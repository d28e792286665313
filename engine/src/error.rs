use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("out of memory")]
    NoMemory,
    #[error("system resources exhausted: {0}")]
    SystemResources(String),
    #[error("unable to open device: {0}")]
    OpeningDevice(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Maps an OS error raised while acquiring a resource. `what` names the
    /// resource so the message stays useful once it reaches the consumer.
    pub fn from_os(what: &str, err: &std::io::Error) -> Self {
        #[cfg(unix)]
        {
            use nix::libc;
            match err.raw_os_error() {
                Some(libc::ENOMEM) => return Error::NoMemory,
                Some(libc::EMFILE | libc::ENFILE | libc::ENOSPC | libc::EAGAIN) => {
                    return Error::SystemResources(format!("{what}: {err}"));
                }
                _ => {}
            }
        }
        Error::OpeningDevice(format!("{what}: {err}"))
    }
}
