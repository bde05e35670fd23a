//! Trim success.
//!
//! Stable `avg_rpm = 1000` for 16 TDC-1 callbacks (the accumulation
//! window), then RPM staying >= 900 (90% of 1000) for 11 more cycles:
//! final coil_cyl and fuel_cyl vectors are both `[1, 3, 2, 4]`, and the
//! trim state machine freezes.

use ecu_common::cylinder::{Cyl, CoilTarget};
use ecu_control::scheduler::Scheduler;
use ecu_control::trim::Trim;

#[test]
fn stable_rpm_confirms_phase_0_permutation() {
    let scheduler = Scheduler::new(false);
    let mut entries = *scheduler.entries();
    let mut trim = Trim::new();

    for _ in 0..16 {
        trim.on_tdc1(1000, &mut entries);
    }
    for _ in 0..11 {
        trim.on_tdc1(1000, &mut entries);
    }

    assert!(trim.is_done());
    assert_eq!(
        entries.map(|e| e.coil),
        [
            CoilTarget::Single(Cyl::Cyl1),
            CoilTarget::Single(Cyl::Cyl3),
            CoilTarget::Single(Cyl::Cyl2),
            CoilTarget::Single(Cyl::Cyl4),
        ]
    );
    assert_eq!(
        entries.map(|e| e.fuel),
        [Cyl::Cyl1, Cyl::Cyl3, Cyl::Cyl2, Cyl::Cyl4]
    );
}
