//! The readiness relay: a fixed three-descriptor poll loop.
//!
//! One `poll(2)` call gates every read and write. Per cycle the relay
//! moves at most one octet serial→client and at most one client→serial,
//! in that order, with no buffering beyond the single octet in flight.
//! The loop leaves its single "relaying" state only for a clean
//! end-of-stream on either side or a fatal error.

use std::os::fd::BorrowedFd;
use std::time::Duration;

use nix::errno::Errno;
use nix::poll::{self, PollFd, PollFlags, PollTimeout};
use nix::unistd;
use tracing::info;

use serbridge_core::octet::Octet;
use serbridge_core::{Endpoint, Error, Result};

/// Bound on a single readiness wait. The timeout only keeps the loop
/// responsive to external termination; expiry with nothing ready is a
/// no-op cycle, not a time-driven action.
pub const WAIT_TIMEOUT: Duration = Duration::from_secs(1);

/// Which side reached end-of-stream. Either one stops the whole relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disconnect {
    /// Zero-length read from the serial device.
    Serial,
    /// Zero-length read from the client→serial pipe.
    Client,
}

impl std::fmt::Display for Disconnect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Serial => f.write_str("serial device"),
            Self::Client => f.write_str("client"),
        }
    }
}

/// One relay direction, fixing source, destination and trace label.
#[derive(Debug, Clone, Copy)]
enum Direction {
    SerialToClient,
    ClientToSerial,
}

impl Direction {
    const fn source(self) -> Endpoint {
        match self {
            Self::SerialToClient => Endpoint::Serial,
            Self::ClientToSerial => Endpoint::ClientToSerial,
        }
    }

    const fn destination(self) -> Endpoint {
        match self {
            Self::SerialToClient => Endpoint::SerialToClient,
            Self::ClientToSerial => Endpoint::Serial,
        }
    }

    const fn disconnect(self) -> Disconnect {
        match self {
            Self::SerialToClient => Disconnect::Serial,
            Self::ClientToSerial => Disconnect::Client,
        }
    }

    /// Trace-record prefix: named after where the octet came from.
    const fn label(self) -> &'static str {
        match self {
            Self::SerialToClient => "serial",
            Self::ClientToSerial => "client",
        }
    }
}

/// Revents snapshot of one wait cycle.
#[derive(Debug, Clone, Copy)]
struct Readiness {
    serial: PollFlags,
    s2c: PollFlags,
    c2s: PollFlags,
}

/// POLLHUP counts as readable: buffered data may remain, and once it is
/// drained the next read yields the zero-length end-of-stream result.
/// select(2)-style loops observe a closed writer the same way.
fn readable(flags: PollFlags) -> bool {
    flags.intersects(PollFlags::POLLIN | PollFlags::POLLHUP)
}

fn writable(flags: PollFlags) -> bool {
    flags.contains(PollFlags::POLLOUT)
}

/// Error state deliberately excludes POLLHUP; a hang-up is an
/// end-of-stream condition, not a descriptor failure.
fn failed(flags: PollFlags) -> bool {
    flags.intersects(PollFlags::POLLERR | PollFlags::POLLNVAL)
}

impl Readiness {
    /// First endpoint in error state, serial checked first, then the
    /// outbound pipe, then the inbound pipe.
    fn failed_endpoint(self) -> Option<Endpoint> {
        if failed(self.serial) {
            Some(Endpoint::Serial)
        } else if failed(self.s2c) {
            Some(Endpoint::SerialToClient)
        } else if failed(self.c2s) {
            Some(Endpoint::ClientToSerial)
        } else {
            None
        }
    }

    /// A transfer needs both its source readable and its destination
    /// writable within the same cycle.
    fn serial_to_client(self) -> bool {
        readable(self.serial) && writable(self.s2c)
    }

    fn client_to_serial(self) -> bool {
        readable(self.c2s) && writable(self.serial)
    }
}

/// The relay proper.
///
/// Borrows its three descriptors; the callers keep them (and the serial
/// lock) alive. The interest set is fixed for the life of the value:
/// serial is watched for read and write readiness, the outbound pipe
/// for write, the inbound pipe for read.
#[derive(Debug)]
pub struct Relay<'fd> {
    serial: BorrowedFd<'fd>,
    s2c: BorrowedFd<'fd>,
    c2s: BorrowedFd<'fd>,
    timeout: PollTimeout,
}

impl<'fd> Relay<'fd> {
    pub fn new(serial: BorrowedFd<'fd>, s2c: BorrowedFd<'fd>, c2s: BorrowedFd<'fd>) -> Self {
        Self {
            serial,
            s2c,
            c2s,
            timeout: PollTimeout::try_from(WAIT_TIMEOUT).unwrap_or(PollTimeout::MAX),
        }
    }

    /// Replace the wait bound (tests run with short timeouts).
    /// Durations beyond the poll maximum saturate to an unbounded wait.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = PollTimeout::try_from(timeout).unwrap_or(PollTimeout::MAX);
        self
    }

    /// Run until end-of-stream on either direction or a fatal error.
    pub fn run(&mut self) -> Result<Disconnect> {
        loop {
            if let Some(side) = self.step()? {
                return Ok(side);
            }
        }
    }

    /// One wait cycle.
    ///
    /// Returns `Ok(None)` both for an idle cycle (timeout or EINTR) and
    /// for a cycle that relayed octets; `Ok(Some(_))` once a source
    /// reports end-of-stream.
    pub fn step(&mut self) -> Result<Option<Disconnect>> {
        let Some(ready) = self.wait()? else {
            return Ok(None);
        };

        if let Some(endpoint) = ready.failed_endpoint() {
            return Err(Error::EndpointFailed(endpoint));
        }

        if ready.serial_to_client()
            && let Some(side) = self.transfer(Direction::SerialToClient)?
        {
            return Ok(Some(side));
        }

        if ready.client_to_serial()
            && let Some(side) = self.transfer(Direction::ClientToSerial)?
        {
            return Ok(Some(side));
        }

        Ok(None)
    }

    fn wait(&self) -> Result<Option<Readiness>> {
        let mut fds = [
            PollFd::new(self.serial, PollFlags::POLLIN | PollFlags::POLLOUT),
            PollFd::new(self.s2c, PollFlags::POLLOUT),
            PollFd::new(self.c2s, PollFlags::POLLIN),
        ];

        match poll::poll(&mut fds, self.timeout) {
            // Nothing to relay; absence of activity is not an error.
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(Readiness {
                serial: revents(&fds[0]),
                s2c: revents(&fds[1]),
                c2s: revents(&fds[2]),
            })),
            // Recoverable interruption: restart the wait unchanged.
            Err(Errno::EINTR) => Ok(None),
            Err(source) => Err(Error::Wait(source)),
        }
    }

    /// Move exactly one octet, trading throughput for exact accounting
    /// of every read and write result.
    fn transfer(&self, direction: Direction) -> Result<Option<Disconnect>> {
        let (from, to) = match direction {
            Direction::SerialToClient => (self.serial, self.s2c),
            Direction::ClientToSerial => (self.c2s, self.serial),
        };

        let mut buffer = [0u8; 1];
        let count = unistd::read(from, &mut buffer)
            .map_err(|source| Error::Read(direction.source(), source))?;
        if count == 0 {
            // End-of-stream stops the whole relay, not just this direction.
            return Ok(Some(direction.disconnect()));
        }

        let written = unistd::write(to, &buffer)
            .map_err(|source| Error::Write(direction.destination(), source))?;
        match written {
            0 => Err(Error::WriteNothing(direction.destination())),
            1 => {
                info!("{}: {}", direction.label(), Octet(buffer[0]));
                Ok(None)
            }
            excess => Err(Error::WriteExcess(direction.destination(), excess)),
        }
    }
}

fn revents(fd: &PollFd<'_>) -> PollFlags {
    fd.revents().unwrap_or_else(PollFlags::empty)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NONE: PollFlags = PollFlags::empty();

    #[test]
    fn transfer_requires_source_and_destination_in_one_cycle() {
        let ready = Readiness {
            serial: PollFlags::POLLIN,
            s2c: NONE,
            c2s: NONE,
        };
        assert!(!ready.serial_to_client());

        let ready = Readiness {
            serial: PollFlags::POLLIN,
            s2c: PollFlags::POLLOUT,
            c2s: NONE,
        };
        assert!(ready.serial_to_client());
        assert!(!ready.client_to_serial());

        let ready = Readiness {
            serial: PollFlags::POLLOUT,
            s2c: NONE,
            c2s: PollFlags::POLLIN,
        };
        assert!(ready.client_to_serial());
        assert!(!ready.serial_to_client());
    }

    #[test]
    fn hang_up_counts_as_readable_not_as_failure() {
        let ready = Readiness {
            serial: PollFlags::POLLOUT,
            s2c: NONE,
            c2s: PollFlags::POLLHUP,
        };
        assert_eq!(ready.failed_endpoint(), None);
        assert!(ready.client_to_serial());
    }

    #[test]
    fn error_state_reported_before_transfers_serial_first() {
        let ready = Readiness {
            serial: PollFlags::POLLERR,
            s2c: PollFlags::POLLERR,
            c2s: NONE,
        };
        assert_eq!(ready.failed_endpoint(), Some(Endpoint::Serial));

        let ready = Readiness {
            serial: NONE,
            s2c: NONE,
            c2s: PollFlags::POLLNVAL,
        };
        assert_eq!(ready.failed_endpoint(), Some(Endpoint::ClientToSerial));
    }
}
