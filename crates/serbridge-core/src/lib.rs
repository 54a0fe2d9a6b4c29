//! `serbridge` Core Library
//!
//! Shared functionality for the serbridge workspace:
//! - Error taxonomy and exit-status mapping (sysexits.h convention)
//! - Octet trace formatting
//! - Tracing initialisation

pub mod error;
pub mod exit;
pub mod octet;
pub mod tracing_init;

pub use error::{Endpoint, Error, Result};
