//! Trim failure then success.
//!
//! Stable `avg_rpm = 1000`, then after dropping to singletons RPM falls
//! to 800 (below the 900 target): pairs are restored. Once RPM recovers
//! to the target, the final vectors are `[2, 4, 1, 3]`.

use ecu_common::cylinder::{Cyl, CoilTarget};
use ecu_control::scheduler::Scheduler;
use ecu_control::trim::{Trim, BOOT_PAIRS};

#[test]
fn failed_guess_recovers_to_phase_360_permutation() {
    let scheduler = Scheduler::new(false);
    let mut entries = *scheduler.entries();
    let mut trim = Trim::new();

    for _ in 0..16 {
        trim.on_tdc1(1000, &mut entries);
    }
    assert_eq!(entries[0].coil, CoilTarget::Single(Cyl::Cyl1));
    assert_eq!(entries[1].coil, CoilTarget::Single(Cyl::Cyl3));

    trim.on_tdc1(800, &mut entries); // below target (900): guess was wrong
    assert_eq!(entries.map(|e| e.coil), BOOT_PAIRS);
    assert!(!trim.is_done());

    trim.on_tdc1(900, &mut entries); // recovered
    assert!(trim.is_done());
    assert_eq!(
        entries.map(|e| e.coil),
        [
            CoilTarget::Single(Cyl::Cyl2),
            CoilTarget::Single(Cyl::Cyl4),
            CoilTarget::Single(Cyl::Cyl1),
            CoilTarget::Single(Cyl::Cyl3),
        ]
    );
    assert_eq!(
        entries.map(|e| e.fuel),
        [Cyl::Cyl2, Cyl::Cyl4, Cyl::Cyl1, Cyl::Cyl3]
    );
}
