//! The fatal sink.
//!
//! `die` disables interrupts (delegated to whatever critical-section
//! guard the caller is using — this crate has no RTOS binding, so the
//! disabling itself is the caller's responsibility via the
//! `ecu_control::isr::CriticalSection` abstraction run around the call
//! site), calls `close_all`, logs `DIE kind : line`, and then either
//! spins awaiting the hardware watchdog (production) or panics (with
//! the `testing` feature enabled, so integration tests in *other*
//! crates can assert on the reason without hanging the test process).
//!
//! A plain `#[cfg(test)]` only toggles when this crate's own test
//! binary is built — it would not be active when `ecu_control` or
//! `ecu_supervisor` call `die` from their own `#[test]`s, since those
//! compile `ecu_hal` as a normal (non-test) dependency. The `testing`
//! feature is the standard way around that: crates that need the
//! panicking behavior in their own tests enable it from
//! `[dev-dependencies]`, and Cargo's feature unification turns it on
//! for the whole build graph for that test invocation only.

use ecu_common::die::DieReason;

use crate::driver::OutputDriver;

/// Route a violated invariant to the fatal sink. Never returns under
/// normal operation (production, or any test build that did not enable
/// the `testing` feature).
#[track_caller]
pub fn die(reason: DieReason, driver: &mut impl OutputDriver) -> ! {
    driver.close_all();
    let location = std::panic::Location::caller();
    tracing::error!(reason = %reason, file = location.file(), line = location.line(), "DIE");

    #[cfg(any(test, feature = "testing"))]
    {
        panic!("DIE {reason} : {location}");
    }

    #[cfg(not(any(test, feature = "testing")))]
    {
        loop {
            std::hint::spin_loop();
        }
    }
}
