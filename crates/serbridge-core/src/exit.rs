//! Exit statuses, following the `sysexits.h` convention.
//!
//! The bridge distinguishes its terminal conditions through the process
//! exit status, so supervising scripts can tell a missing FIFO from a
//! mid-relay I/O failure without parsing log output.

/// Clean termination: end-of-stream on either direction.
pub const OK: u8 = 0;

/// Malformed invocation (wrong argument count).
pub const USAGE: u8 = 64;

/// The serial device or one of the FIFOs could not be opened.
pub const NOINPUT: u8 = 66;

/// The readiness wait itself failed.
pub const SOFTWARE: u8 = 70;

/// A single-octet write reported more than one byte transferred.
pub const OSERR: u8 = 71;

/// Configuration failure, transfer failure, or descriptor error state.
pub const IOERR: u8 = 74;
