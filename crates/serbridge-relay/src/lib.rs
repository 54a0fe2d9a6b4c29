//! `serbridge` relay: data-plane bridge between a serial device and a
//! pair of named pipes (FIFOs).
//!
//! Data flow:
//! ```text
//! serial device → relay → serial-to-client FIFO
//! client-to-serial FIFO → relay → serial device
//! ```
//!
//! The FIFOs are created independently (e.g. by mkfifo(1)) before the
//! bridge starts; the bridge never creates them and does not re-open
//! them following SIGHUP.

pub mod fifo;
pub mod relay;
pub mod serial;

pub use relay::{Disconnect, Relay};
