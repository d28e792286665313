pub const IN_CREATE: u32 = 0x0000_0100;
pub const IN_DELETE: u32 = 0x0000_0200;
pub const IN_ISDIR: u32 = 0x4000_0000;

const HEADER_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeRecord<'a> {
    pub wd: i32,
    pub mask: u32,
    pub cookie: u32,
    // NUL padding stripped
    pub name: &'a [u8],
}

impl ChangeRecord<'_> {
    pub fn is_pcm_node_change(&self) -> bool {
        self.mask & (IN_CREATE | IN_DELETE) != 0
            && self.mask & IN_ISDIR == 0
            && self.name.len() >= 8
            && self.name.starts_with(b"pcm")
    }
}

/// Walks the kernel's variable-length change records in `buf`. Iteration stops
/// at the end of the buffer or at the first record whose header or name would
/// run past it; `is_truncated` tells the two apart. A fresh `parse` over the
/// same buffer starts again from the first record.
#[derive(Debug, Clone)]
pub struct ChangeRecords<'a> {
    buf: &'a [u8],
    pos: usize,
    truncated: bool,
}

pub fn parse(buf: &[u8]) -> ChangeRecords<'_> {
    ChangeRecords {
        buf,
        pos: 0,
        truncated: false,
    }
}

impl ChangeRecords<'_> {
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut raw = [0_u8; 4];
    raw.copy_from_slice(&bytes[..4]);
    u32::from_ne_bytes(raw)
}

impl<'a> Iterator for ChangeRecords<'a> {
    type Item = ChangeRecord<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = &self.buf[self.pos..];
        if rest.is_empty() || self.truncated {
            return None;
        }
        if rest.len() < HEADER_LEN {
            self.truncated = true;
            return None;
        }
        let wd = read_u32(&rest[0..4]) as i32;
        let mask = read_u32(&rest[4..8]);
        let cookie = read_u32(&rest[8..12]);
        let len = read_u32(&rest[12..16]) as usize;
        let Some(end) = HEADER_LEN.checked_add(len).filter(|end| *end <= rest.len()) else {
            self.truncated = true;
            return None;
        };
        let padded = &rest[HEADER_LEN..end];
        let name_len = padded.iter().position(|b| *b == 0).unwrap_or(padded.len());
        self.pos += end;
        Some(ChangeRecord {
            wd,
            mask,
            cookie,
            name: &padded[..name_len],
        })
    }
}

#[cfg(target_os = "linux")]
pub use session::{WakeSender, WatchSession};

#[cfg(target_os = "linux")]
mod session {
    use super::parse;
    use crate::error::{Error, Result};
    use inotify::{Inotify, WatchMask};
    use nix::{
        errno::Errno,
        fcntl::OFlag,
        unistd::{pipe2, read, write},
    };
    use std::{
        os::fd::{AsFd, BorrowedFd, OwnedFd},
        path::Path,
        sync::Arc,
    };
    use tracing::{debug, error};

    const READ_BUF_LEN: usize = 4096;

    #[derive(Debug)]
    pub struct WatchSession {
        inotify: Inotify,
        wake_rx: OwnedFd,
        buf: Box<[u8; READ_BUF_LEN]>,
    }

    #[derive(Debug, Clone)]
    pub struct WakeSender {
        tx: Arc<OwnedFd>,
    }

    impl WakeSender {
        pub fn wake(&self) {
            match write(self.tx.as_fd(), b"a") {
                Ok(_) => {}
                // a full pipe already guarantees a pending wakeup
                Err(Errno::EAGAIN) => {}
                Err(e) => error!("failed to wake device watcher: {}", e),
            }
        }
    }

    fn errno_error(what: &str, e: Errno) -> Error {
        Error::from_os(what, &std::io::Error::from(e))
    }

    impl WatchSession {
        pub fn open(dir: &Path) -> Result<(Self, WakeSender)> {
            let inotify = Inotify::init().map_err(|e| Error::from_os("inotify", &e))?;
            let wd = inotify
                .watches()
                .add(dir, WatchMask::CREATE | WatchMask::DELETE)
                .map_err(|e| Error::from_os(&format!("watch {}", dir.display()), &e))?;

            let (wake_rx, wake_tx) = pipe2(OFlag::O_NONBLOCK | OFlag::O_CLOEXEC)
                .map_err(|e| errno_error("wakeup pipe", e))?;
            debug!("watching {} ({:?})", dir.display(), wd);

            Ok((
                Self {
                    inotify,
                    wake_rx,
                    buf: Box::new([0; READ_BUF_LEN]),
                },
                WakeSender {
                    tx: Arc::new(wake_tx),
                },
            ))
        }

        pub fn notify_fd(&self) -> BorrowedFd<'_> {
            self.inotify.as_fd()
        }

        pub fn wake_fd(&self) -> BorrowedFd<'_> {
            self.wake_rx.as_fd()
        }

        pub fn drain_changes(&mut self) -> bool {
            let mut relevant = false;
            loop {
                let len = match read(self.inotify.as_fd(), &mut self.buf[..]) {
                    Ok(0) => break,
                    Ok(len) => len,
                    Err(Errno::EINTR) => continue,
                    Err(Errno::EAGAIN) => break,
                    Err(e) => {
                        error!("reading device directory changes failed: {}", e);
                        break;
                    }
                };
                let mut records = parse(&self.buf[..len]);
                relevant |= records.by_ref().any(|r| r.is_pcm_node_change());
                if records.is_truncated() {
                    error!("discarding a truncated change record");
                }
            }
            relevant
        }

        pub fn drain_wakeups(&mut self) -> bool {
            let mut woken = false;
            loop {
                match read(self.wake_rx.as_fd(), &mut self.buf[..]) {
                    Ok(0) => break,
                    Ok(_) => woken = true,
                    Err(Errno::EINTR) => continue,
                    Err(_) => break,
                }
            }
            woken
        }
    }
}
