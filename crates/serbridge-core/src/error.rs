//! Error types for the serbridge workspace.

use std::path::PathBuf;

use nix::errno::Errno;
use thiserror::Error;

use crate::exit;

/// Result type alias using the serbridge [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// One of the three relayed descriptors, used to attribute failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// The serial device.
    Serial,
    /// The serial→client FIFO (opened write-only).
    SerialToClient,
    /// The client→serial FIFO (opened read-only, non-blocking).
    ClientToSerial,
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Serial => f.write_str("serial port"),
            Self::SerialToClient => f.write_str("serial-to-client pipe"),
            Self::ClientToSerial => f.write_str("client-to-serial pipe"),
        }
    }
}

/// Fatal conditions of the bridge.
///
/// Every variant terminates the process; none is retried. A byte relay
/// has no safe partial state to resume from, so there is deliberately no
/// recovery path here.
#[derive(Debug, Error)]
pub enum Error {
    /// The serial device could not be opened or exclusively locked.
    #[error("unable to open serial device {}: {source}", path.display())]
    DeviceUnavailable { path: PathBuf, source: Errno },

    /// Raw-mode attributes could not be applied to the serial device.
    #[error("unable to set terminal attributes for {}: {source}", path.display())]
    ConfigurationFailed { path: PathBuf, source: Errno },

    /// One of the externally created FIFOs could not be opened.
    #[error("unable to open FIFO {}: {source}", path.display())]
    PipeUnavailable { path: PathBuf, source: Errno },

    /// The readiness wait failed with something other than EINTR.
    #[error("poll() failed: {0}")]
    Wait(Errno),

    /// The readiness wait flagged a descriptor as being in an error state.
    #[error("poll() indicated error on {0}")]
    EndpointFailed(Endpoint),

    /// A single-octet read failed.
    #[error("read() from {0}: {1}")]
    Read(Endpoint, Errno),

    /// A single-octet write failed.
    #[error("write() to {0}: {1}")]
    Write(Endpoint, Errno),

    /// A write reported zero bytes transferred.
    #[error("write() to {0} wrote nothing")]
    WriteNothing(Endpoint),

    /// A write reported more bytes than the one octet handed to it.
    #[error("write() to {0} excess: {1} bytes for a single octet")]
    WriteExcess(Endpoint, usize),
}

impl Error {
    /// The `sysexits.h` status this condition terminates with.
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::DeviceUnavailable { .. } | Self::PipeUnavailable { .. } => exit::NOINPUT,
            Self::Wait(_) => exit::SOFTWARE,
            Self::WriteExcess(..) => exit::OSERR,
            Self::ConfigurationFailed { .. }
            | Self::EndpointFailed(_)
            | Self::Read(..)
            | Self::Write(..)
            | Self::WriteNothing(_) => exit::IOERR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_failures_map_to_noinput() {
        let err = Error::DeviceUnavailable {
            path: PathBuf::from("/dev/ttyUSB0"),
            source: Errno::ENOENT,
        };
        assert_eq!(err.exit_code(), exit::NOINPUT);

        let err = Error::PipeUnavailable {
            path: PathBuf::from("/tmp/s2c"),
            source: Errno::ENOENT,
        };
        assert_eq!(err.exit_code(), exit::NOINPUT);
    }

    #[test]
    fn wait_failure_maps_to_software() {
        assert_eq!(Error::Wait(Errno::EINVAL).exit_code(), exit::SOFTWARE);
    }

    #[test]
    fn excess_write_maps_to_oserr() {
        let err = Error::WriteExcess(Endpoint::Serial, 2);
        assert_eq!(err.exit_code(), exit::OSERR);
    }

    #[test]
    fn transfer_failures_map_to_ioerr() {
        assert_eq!(
            Error::EndpointFailed(Endpoint::SerialToClient).exit_code(),
            exit::IOERR
        );
        assert_eq!(
            Error::Read(Endpoint::ClientToSerial, Errno::EIO).exit_code(),
            exit::IOERR
        );
        assert_eq!(
            Error::WriteNothing(Endpoint::Serial).exit_code(),
            exit::IOERR
        );
    }

    #[test]
    fn endpoint_names_in_messages() {
        let err = Error::EndpointFailed(Endpoint::ClientToSerial);
        assert_eq!(
            err.to_string(),
            "poll() indicated error on client-to-serial pipe"
        );
    }
}
