//! The serial endpoint: open the device and pin it into raw mode.
//!
//! The line settings are fixed constants. 9600 baud, 8 data bits, no
//! parity, one stop bit, receiver enabled, modem status lines ignored,
//! no hardware or software flow control, and no input/output processing
//! of any kind: every byte value 0–255 crosses the line unmodified.

use std::fs::File;
use std::os::fd::AsFd;
use std::path::Path;

use nix::fcntl::{self, Flock, FlockArg, OFlag};
use nix::sys::stat::Mode;
use nix::sys::termios::{
    self, BaudRate, ControlFlags, InputFlags, LocalFlags, OutputFlags, SetArg,
};

use serbridge_core::{Error, Result};

/// Fixed line rate, both directions. The bridge does not negotiate speeds.
pub const BAUD: BaudRate = BaudRate::B9600;

/// Open `path` read/write and apply the raw-mode attributes.
///
/// The device is opened non-blocking without becoming the controlling
/// terminal; an exclusive advisory lock is taken and held for the
/// lifetime of the returned handle. Neither failure is retried.
pub fn open(path: &Path) -> Result<Flock<File>> {
    let unavailable = |source| Error::DeviceUnavailable {
        path: path.to_owned(),
        source,
    };

    let fd = fcntl::open(
        path,
        OFlag::O_RDWR | OFlag::O_NOCTTY | OFlag::O_NONBLOCK,
        Mode::empty(),
    )
    .map_err(unavailable)?;

    let serial = Flock::lock(File::from(fd), FlockArg::LockExclusiveNonblock)
        .map_err(|(_, source)| unavailable(source))?;

    configure(serial.as_fd(), path)?;
    Ok(serial)
}

/// Put the already-open descriptor into the fixed raw mode.
fn configure<Fd: AsFd>(fd: Fd, path: &Path) -> Result<()> {
    let failed = |source| Error::ConfigurationFailed {
        path: path.to_owned(),
        source,
    };

    let mut tio = termios::tcgetattr(&fd).map_err(failed)?;

    // cfmakeraw clears canonical mode, echo, signal generation, parity
    // checking, the input translations and output post-processing, and
    // selects 8-bit characters. The flags below pin down what it leaves
    // alone.
    termios::cfmakeraw(&mut tio);
    termios::cfsetispeed(&mut tio, BAUD).map_err(failed)?;
    termios::cfsetospeed(&mut tio, BAUD).map_err(failed)?;

    tio.control_flags &= !(ControlFlags::CSTOPB
        | ControlFlags::PARODD
        | ControlFlags::HUPCL
        | ControlFlags::CRTSCTS);
    tio.control_flags |= ControlFlags::CREAD | ControlFlags::CLOCAL;

    tio.input_flags &=
        !(InputFlags::IGNPAR | InputFlags::IXOFF | InputFlags::IXANY | InputFlags::IMAXBEL);
    tio.output_flags &= !(OutputFlags::ONLCR
        | OutputFlags::OCRNL
        | OutputFlags::ONOCR
        | OutputFlags::ONLRET);
    tio.local_flags &= !(LocalFlags::ECHOE
        | LocalFlags::ECHOK
        | LocalFlags::ECHOKE
        | LocalFlags::ECHOCTL
        | LocalFlags::ECHOPRT
        | LocalFlags::ECHONL
        | LocalFlags::TOSTOP
        | LocalFlags::FLUSHO
        | LocalFlags::PENDIN
        | LocalFlags::NOFLSH);

    termios::tcsetattr(&fd, SetArg::TCSANOW, &tio).map_err(failed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use nix::pty::{PtyMaster, grantpt, posix_openpt, ptsname_r, unlockpt};
    use serbridge_core::exit;

    /// A pty slave stands in for a serial device; the master must stay
    /// alive for the slave path to be openable.
    #[allow(clippy::unwrap_used)]
    fn pty_slave() -> (PtyMaster, PathBuf) {
        let master = posix_openpt(OFlag::O_RDWR | OFlag::O_NOCTTY).unwrap();
        grantpt(&master).unwrap();
        unlockpt(&master).unwrap();
        let path = PathBuf::from(ptsname_r(&master).unwrap());
        (master, path)
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn missing_device_is_unavailable() {
        let err = open(Path::new("/nonexistent/ttyS99")).unwrap_err();
        assert!(matches!(err, Error::DeviceUnavailable { .. }));
        assert_eq!(err.exit_code(), exit::NOINPUT);
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn raw_mode_applied() {
        let (_master, path) = pty_slave();
        let serial = open(&path).unwrap();
        let tio = termios::tcgetattr(&*serial).unwrap();

        assert!(!tio.local_flags.contains(LocalFlags::ICANON));
        assert!(!tio.local_flags.contains(LocalFlags::ECHO));
        assert!(!tio.local_flags.contains(LocalFlags::ISIG));
        assert!(!tio.output_flags.contains(OutputFlags::OPOST));
        assert!(
            !tio.input_flags
                .intersects(InputFlags::IXON | InputFlags::IXOFF | InputFlags::ISTRIP)
        );
        assert!(tio.control_flags.contains(ControlFlags::CS8));
        assert!(tio.control_flags.contains(ControlFlags::CREAD));
        assert!(tio.control_flags.contains(ControlFlags::CLOCAL));
        assert!(!tio.control_flags.contains(ControlFlags::PARENB));
        assert_eq!(termios::cfgetispeed(&tio), BAUD);
        assert_eq!(termios::cfgetospeed(&tio), BAUD);
    }
}
