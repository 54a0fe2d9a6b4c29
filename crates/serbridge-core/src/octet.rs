//! Trace formatting for relayed octets.
//!
//! Every successfully transferred byte is logged once, using its
//! printable-character form where it has one and hexadecimal otherwise.

use std::fmt;

/// Wrapper rendering an octet as `'A'` or `0x00`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Octet(pub u8);

impl fmt::Display for Octet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Same set isprint(3) accepts in the C locale: graphic chars plus space.
        if self.0.is_ascii_graphic() || self.0 == b' ' {
            write!(f, "'{}'", self.0 as char)
        } else {
            write!(f, "{:#04x}", self.0)
        }
    }
}
