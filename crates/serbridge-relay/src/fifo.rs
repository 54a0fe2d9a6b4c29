//! The named-pipe endpoints.
//!
//! Both FIFOs already exist on the filesystem, created out-of-band
//! (e.g. by mkfifo(1)). The bridge only opens them; it never creates,
//! removes or re-opens them.

use std::os::fd::OwnedFd;
use std::path::Path;

use nix::fcntl::{self, OFlag};
use nix::sys::stat::Mode;

use serbridge_core::{Error, Result};

/// Open the client→serial FIFO read-only, non-blocking.
///
/// The non-blocking open succeeds before any client has attached its
/// writing end; the readiness wait gates every subsequent read.
pub fn open_reader(path: &Path) -> Result<OwnedFd> {
    open(path, OFlag::O_RDONLY | OFlag::O_NONBLOCK)
}

/// Open the serial→client FIFO write-only.
///
/// This open blocks until the client opens its reading end, so the
/// bridge does not come up before anyone is listening.
pub fn open_writer(path: &Path) -> Result<OwnedFd> {
    open(path, OFlag::O_WRONLY)
}

fn open(path: &Path, flags: OFlag) -> Result<OwnedFd> {
    fcntl::open(path, flags, Mode::empty()).map_err(|source| Error::PipeUnavailable {
        path: path.to_owned(),
        source,
    })
}
