//! The output-driver trait.
//!
//! All operations are total, side-effect-only, O(1), non-blocking, and
//! expected to be interrupt-safe (plain memory-mapped writes on a real
//! backend). `open_injector`/`close_injector` take `Cyl` directly, so a
//! paired `CoilTarget` cannot be passed to them at all — the "injector
//! driver refuses `Pair`" rule is enforced by the type system rather
//! than a runtime check.

use ecu_common::cylinder::{Cyl, CoilTarget};

/// Platform output-driver contract.
///
/// `close_all` is the only state guaranteed safe to call after a fatal
/// condition, and must be idempotent — deferred-work callbacks may
/// race with it and with each other.
pub trait OutputDriver {
    fn open_injector(&mut self, cyl: Cyl);
    fn close_injector(&mut self, cyl: Cyl, now_usec: u64);
    fn open_coil(&mut self, target: CoilTarget, now_usec: u64);
    fn close_coil(&mut self, target: CoilTarget, now_usec: u64);
    fn relay_on(&mut self);
    fn relay_off(&mut self);
    fn starter_on(&mut self);
    fn starter_off(&mut self);
    fn gaz_on(&mut self);
    fn gaz_off(&mut self);
    fn gaz_toggle(&mut self);
    /// Idempotent: coils, injectors, relay, starter, and fuel pump off.
    /// The only state it is safe to be in after a fatal condition.
    fn close_all(&mut self);

    /// Monotonically non-decreasing microsecond clock. The decoder's
    /// arithmetic on this value is subtraction-only, so natural modular
    /// wrap at `u64::MAX` is acceptable.
    fn now_usec(&self) -> u64;
}
