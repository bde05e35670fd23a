//! The engine scheduler.
//!
//! Registers three angle events per TDC — an anchor at `-140°`, a
//! mode-dependent middle event at `-K°`, and the TDC event itself at
//! `-0°` — then dispatches them as tooth ticks bring them due. A single
//! `advance_enabled` flag replaces what the original carried as two
//! near-duplicate `engine.c` variants.

use ecu_common::cylinder::Cyl;
use ecu_common::die::DieReason;

use ecu_hal::driver::OutputDriver;

use crate::angle::{AngleTable, EventKind};
use crate::decoder::Decoder;
use crate::deferred::{DeferredAction, DeferredQueue};
use crate::trim::{Trim, BOOT_PAIRS};
use ecu_common::cylinder::CoilTarget;

/// Crank-degree position of each of the four TDC entries.
pub const TDC_DEGREES: [u16; 4] = [0, 180, 360, 540];

/// Offset, in degrees BTDC, of the always-present anchor event.
const ANCHOR_OFFSET: i32 = 140;
/// Middle-event offset with timing advance disabled: direct dwell start.
const FIXED_DWELL_OFFSET: i32 = 40;
/// Middle-event offset with timing advance enabled: safety-fallback close.
const ADVANCE_FALLBACK_OFFSET: i32 = 10;
/// Fixed dwell duration with timing advance enabled, microseconds.
const ADVANCE_DWELL_USEC: u64 = 5_000;

/// One TDC schedule slot. Mutated only by [`Trim`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleEntry {
    pub degree: u16,
    pub coil: CoilTarget,
    pub fuel: Cyl,
}

/// Owns the four schedule entries, the trim state machine, and the
/// advance-mode flag; registers and dispatches the twelve angle events.
pub struct Scheduler {
    entries: [ScheduleEntry; 4],
    trim: Trim,
    trim_flag: bool,
    advance_enabled: bool,
}

impl Scheduler {
    pub fn new(advance_enabled: bool) -> Self {
        let mut entries = [ScheduleEntry {
            degree: 0,
            coil: BOOT_PAIRS[0],
            fuel: Cyl::Cyl1,
        }; 4];
        for (i, e) in entries.iter_mut().enumerate() {
            e.degree = TDC_DEGREES[i];
            e.coil = BOOT_PAIRS[i];
            e.fuel = Cyl::from_index(i as u8).expect("i < 4");
        }
        Self {
            entries,
            trim: Trim::new(),
            trim_flag: false,
            advance_enabled,
        }
    }

    pub fn entries(&self) -> &[ScheduleEntry; 4] {
        &self.entries
    }

    pub fn advance_enabled(&self) -> bool {
        self.advance_enabled
    }

    /// Overwrite the four schedule entries directly, preserving
    /// whatever firing order trim has installed so far. Used when
    /// switching `advance_enabled` at runtime forces a fresh
    /// [`Scheduler`] (a new mode needs its events re-registered at
    /// different slots — see `ecu_control::task::EngineTask::set_advance_mode`).
    pub fn restore_entries(&mut self, entries: [ScheduleEntry; 4]) {
        self.entries = entries;
    }

    /// Register the 12 angle events (3 per TDC × 4 TDCs).
    pub fn register(&self, angle: &mut AngleTable) -> Result<(), DieReason> {
        let k = if self.advance_enabled {
            ADVANCE_FALLBACK_OFFSET
        } else {
            FIXED_DWELL_OFFSET
        };
        for (i, degree) in TDC_DEGREES.iter().enumerate() {
            let degree = *degree as i32;
            angle.register(degree - ANCHOR_OFFSET, EventKind::BtdcDwell, i as u8)?;
            angle.register(degree - k, EventKind::BtdcFire, i as u8)?;
            angle.register(degree, EventKind::BtdcTdc, i as u8)?;
        }
        Ok(())
    }

    /// Dispatch a pending event taken from the angle table.
    pub fn on_event(
        &mut self,
        kind: EventKind,
        cyl_idx: u8,
        decoder: &Decoder,
        driver: &mut impl OutputDriver,
        deferred: &mut DeferredQueue,
        timing_advance: u8,
        fuel_msec: u8,
    ) -> Result<(), DieReason> {
        let i = cyl_idx as usize;
        let now = driver.now_usec();
        match kind {
            // The -140 anchor: only does work in advance-enabled mode,
            // where it schedules the coil open/close as absolute
            // deadlines so output timing is isolated from task jitter.
            EventKind::BtdcDwell => {
                if self.advance_enabled {
                    let advance = timing_advance.min(140) as u32;
                    let time_usec = decoder.deg_to_usec(140u32.saturating_sub(advance));
                    let close_at = now + time_usec as u64;
                    let open_at = close_at.saturating_sub(ADVANCE_DWELL_USEC);
                    deferred.schedule_absolute(
                        DeferredAction::OpenCoil(self.entries[i].coil),
                        open_at,
                    )?;
                    deferred.schedule_absolute(
                        DeferredAction::CloseCoil(self.entries[i].coil),
                        close_at,
                    )?;
                }
                Ok(())
            }
            // The -K middle event: direct dwell-start when fixed-spark,
            // or the BTDC-10 safety fallback forcing the coil closed
            // when advance is enabled (in case the scheduled close
            // above hasn't fired yet).
            EventKind::BtdcFire => {
                if self.advance_enabled {
                    driver.close_coil(self.entries[i].coil, now);
                } else {
                    driver.open_coil(self.entries[i].coil, now);
                }
                Ok(())
            }
            // TDC: always force the coil closed (idempotent if already
            // closed by the time), start the fuel pulse, and run trim
            // on cookie 0.
            EventKind::BtdcTdc => {
                driver.close_coil(self.entries[i].coil, now);
                driver.open_injector(self.entries[i].fuel);
                deferred.schedule_absolute(
                    DeferredAction::CloseInjector(self.entries[i].fuel),
                    now + 1000 * fuel_msec as u64,
                )?;
                if i == 0 && self.trim_flag && !self.trim.is_done() {
                    self.trim.on_tdc1(decoder.rpm(), &mut self.entries);
                }
                Ok(())
            }
        }
    }

    /// Set `trim_flag`. Rising edge restarts the trim
    /// state machine from sub-state 0; a falling edge simply stops
    /// feeding it further TDC-1 cycles, leaving whatever schedule was
    /// installed so far in place (mid-trim abort is deliberately left
    /// undefined, see DESIGN.md).
    pub fn set_trim_flag(&mut self, enabled: bool) {
        if enabled && !self.trim_flag {
            self.trim = Trim::new();
        }
        self.trim_flag = enabled;
    }

    pub fn trim_flag(&self) -> bool {
        self.trim_flag
    }

    pub fn trim_done(&self) -> bool {
        self.trim.is_done()
    }
}
