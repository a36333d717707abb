//! Core traits and types for cycle-accurate Spectrum emulation.
//!
//! Every bus access carries the CPU's cycle counter. Contention and
//! floating-bus values are functions of that counter, so no component
//! needs a back-reference to the CPU.

mod bus;
mod device;
mod error;
mod tape;

pub use bus::{Bus, ReadResult};
pub use device::{IoBus, IoDevice};
pub use error::MemoryError;
pub use tape::TapeProvider;
