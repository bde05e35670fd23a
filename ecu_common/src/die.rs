//! The terminal fatal-error taxonomy.
//!
//! There is no recoverable error channel in the core: any violated
//! invariant routes to one of these reasons and then to the fatal sink
//! (`ecu_hal::die`, which owns the output driver needed to call
//! `close_all`). `DieReason` deliberately does **not** implement
//! `std::error::Error` — composing it with `?` alongside recoverable
//! errors (config parse failures, CLI argument errors) would suggest a
//! recovery path that does not exist.

use std::fmt;

/// Why the ECU died. Mirrors the `DIE(kind)` argument taxonomy of the
/// original source, plus the `-1` engine-loop timeout as its own
/// variant instead of a magic number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DieReason {
    /// Configuration/startup failure.
    ErrorInit,
    /// Management Task invariant violated.
    Management,
    /// Engine Task invariant violated.
    Engine,
    /// Angle event table invariant violated (collision, overflow, double-pending).
    Event,
    /// Trigger-wheel decoder invariant violated (period out of bounds in the main ticker).
    Trigger,
    /// ISR/mailbox discipline violated (`capture_t` double-write).
    Irq,
    /// Unclassified fatal condition.
    Fatal,
    /// Engine Task timed out waiting for a tooth after reaching `Run`.
    Timeout,
}

impl DieReason {
    /// The short token printed in the `DIE kind : line` message.
    pub const fn tag(self) -> &'static str {
        match self {
            DieReason::ErrorInit => "ERROR_INIT",
            DieReason::Management => "MANAGEMENT",
            DieReason::Engine => "ENGINE",
            DieReason::Event => "EVENT",
            DieReason::Trigger => "TRIGGER",
            DieReason::Irq => "IRQ",
            DieReason::Fatal => "FATAL",
            DieReason::Timeout => "TIMEOUT(-1)",
        }
    }
}

impl fmt::Display for DieReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_distinct() {
        let all = [
            DieReason::ErrorInit,
            DieReason::Management,
            DieReason::Engine,
            DieReason::Event,
            DieReason::Trigger,
            DieReason::Irq,
            DieReason::Fatal,
            DieReason::Timeout,
        ];
        let mut tags: Vec<&str> = all.iter().map(|r| r.tag()).collect();
        tags.sort_unstable();
        tags.dedup();
        assert_eq!(tags.len(), all.len());
    }
}
