//! Wasted-spark → sequential trim (sub-states 0-4).
//!
//! The crank wheel alone cannot distinguish 0° from 360° of the
//! four-stroke cycle, so the engine boots guessing that entries 0 and 1
//! are the compression-stroke pair. This module runs the run-time
//! experiment that confirms or refutes that guess from RPM behavior and
//! installs the resulting sequential firing order.

use heapless::Vec;

use ecu_common::cylinder::{Cyl, CoilTarget};

use crate::scheduler::ScheduleEntry;

const ACCUMULATE_SAMPLES: usize = 16;
const CONFIRM_STREAK: u16 = 10;

/// The boot (wasted-spark) pairing: `{12, 34, 21, 43}`.
pub const BOOT_PAIRS: [CoilTarget; 4] = [
    CoilTarget::Pair(Cyl::Cyl1, Cyl::Cyl2),
    CoilTarget::Pair(Cyl::Cyl3, Cyl::Cyl4),
    CoilTarget::Pair(Cyl::Cyl2, Cyl::Cyl1),
    CoilTarget::Pair(Cyl::Cyl4, Cyl::Cyl3),
];

/// The guessed 0°-phase sequential permutation, entries dropped first:
/// `[1, 3, 2, 4]`.
const PHASE_0_DEGREES: [Cyl; 4] = [Cyl::Cyl1, Cyl::Cyl3, Cyl::Cyl2, Cyl::Cyl4];

/// The alternate 360°-phase permutation, installed if the guess failed:
/// `[2, 4, 1, 3]`.
const PHASE_360_DEGREES: [Cyl; 4] = [Cyl::Cyl2, Cyl::Cyl4, Cyl::Cyl1, Cyl::Cyl3];

#[derive(Debug, Clone)]
enum Inner {
    /// Sub-state 0: accumulate RPM samples toward a target.
    Accumulating { samples: Vec<u32, ACCUMULATE_SAMPLES> },
    /// Sub-state 2: entries 0/1 already dropped to singletons; watching
    /// for either a confirming streak or a premature RPM drop.
    Confirming { target_rpm: u32, good_streak: u16 },
    /// Sub-state 3: the guess was wrong, pairs restored, waiting for
    /// RPM to recover before installing the other phase.
    Recovering { target_rpm: u32 },
    /// Sub-state 4 reached and frozen: trim complete.
    Done,
}

/// Owns the trim state machine; called once per TDC-1 (cookie 0) cycle
/// while `trim_flag` is set.
#[derive(Debug, Clone)]
pub struct Trim {
    inner: Inner,
}

impl Trim {
    pub fn new() -> Self {
        Self {
            inner: Inner::Accumulating {
                samples: Vec::new(),
            },
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self.inner, Inner::Done)
    }

    /// Advance the trim state machine by one TDC-1 cycle.
    pub fn on_tdc1(&mut self, rpm: u32, entries: &mut [ScheduleEntry; 4]) {
        match &mut self.inner {
            Inner::Done => {}
            Inner::Accumulating { samples } => {
                // heapless::Vec::push is infallible here: capacity equals
                // ACCUMULATE_SAMPLES and we stop pushing once full.
                let _ = samples.push(rpm);
                if samples.len() == ACCUMULATE_SAMPLES {
                    let sum: u64 = samples.iter().map(|&s| s as u64).sum();
                    let avg = (sum / ACCUMULATE_SAMPLES as u64) as u32;
                    let target = avg - avg / 10;
                    entries[0].coil = CoilTarget::Single(Cyl::Cyl1);
                    entries[0].fuel = Cyl::Cyl1;
                    entries[1].coil = CoilTarget::Single(Cyl::Cyl3);
                    entries[1].fuel = Cyl::Cyl3;
                    self.inner = Inner::Confirming {
                        target_rpm: target,
                        good_streak: 0,
                    };
                }
            }
            Inner::Confirming {
                target_rpm,
                good_streak,
            } => {
                if rpm >= *target_rpm {
                    *good_streak += 1;
                    if *good_streak > CONFIRM_STREAK {
                        install(entries, PHASE_0_DEGREES);
                        self.inner = Inner::Done;
                    }
                } else {
                    for (entry, pair) in entries.iter_mut().zip(BOOT_PAIRS) {
                        entry.coil = pair;
                    }
                    self.inner = Inner::Recovering {
                        target_rpm: *target_rpm,
                    };
                }
            }
            Inner::Recovering { target_rpm } => {
                if rpm >= *target_rpm {
                    install(entries, PHASE_360_DEGREES);
                    self.inner = Inner::Done;
                }
            }
        }
    }
}

impl Default for Trim {
    fn default() -> Self {
        Self::new()
    }
}

fn install(entries: &mut [ScheduleEntry; 4], perm: [Cyl; 4]) {
    for (entry, cyl) in entries.iter_mut().zip(perm) {
        entry.coil = CoilTarget::Single(cyl);
        entry.fuel = cyl;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::TDC_DEGREES;

    fn boot_entries() -> [ScheduleEntry; 4] {
        let mut entries = [ScheduleEntry {
            degree: 0,
            coil: BOOT_PAIRS[0],
            fuel: Cyl::Cyl1,
        }; 4];
        for (i, e) in entries.iter_mut().enumerate() {
            e.degree = TDC_DEGREES[i];
            e.coil = BOOT_PAIRS[i];
            e.fuel = Cyl::from_index(i as u8).unwrap();
        }
        entries
    }

    #[test]
    fn successful_guess_installs_phase_0_permutation() {
        let mut trim = Trim::new();
        let mut entries = boot_entries();
        for _ in 0..ACCUMULATE_SAMPLES {
            trim.on_tdc1(1000, &mut entries);
        }
        assert_eq!(entries[0].coil, CoilTarget::Single(Cyl::Cyl1));
        assert_eq!(entries[1].coil, CoilTarget::Single(Cyl::Cyl3));

        for _ in 0..(CONFIRM_STREAK + 1) {
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

    #[test]
    fn failed_guess_restores_pairs_then_installs_phase_360() {
        let mut trim = Trim::new();
        let mut entries = boot_entries();
        for _ in 0..ACCUMULATE_SAMPLES {
            trim.on_tdc1(1000, &mut entries);
        }
        let target = 900; // avg 1000 - 100
        // RPM drops below target: guess was wrong.
        trim.on_tdc1(800, &mut entries);
        assert_eq!(entries.map(|e| e.coil), BOOT_PAIRS);

        // RPM recovers: install the other phase.
        trim.on_tdc1(target, &mut entries);
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

    #[test]
    fn once_done_further_cycles_are_ignored() {
        let mut trim = Trim::new();
        let mut entries = boot_entries();
        for _ in 0..ACCUMULATE_SAMPLES {
            trim.on_tdc1(1000, &mut entries);
        }
        for _ in 0..(CONFIRM_STREAK + 1) {
            trim.on_tdc1(1000, &mut entries);
        }
        let snapshot = entries;
        trim.on_tdc1(0, &mut entries);
        assert_eq!(entries.map(|e| e.coil), snapshot.map(|e| e.coil));
    }
}
