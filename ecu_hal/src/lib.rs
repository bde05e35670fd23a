//! # ECU HAL
//!
//! The abstract output-driver contract and a simulation backend for
//! offline testing — the "x86 stub" of a hardware-free build. Bit-level
//! pin toggling per MCU family is out of scope; a real backend
//! implements [`OutputDriver`] against memory-mapped GPIO elsewhere and
//! is not part of this crate.

pub mod driver;
pub mod fatal;
pub mod sim;

pub use driver::OutputDriver;
pub use fatal::die;
pub use sim::SimulationDriver;
