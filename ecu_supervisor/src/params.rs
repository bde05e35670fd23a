//! Shared, lock-free parameters mutated by the management/CLI side and
//! read by the engine path: `timing_advance`, `fuel_msec`,
//! `timing_advance_enabled`, `trim_flag`, and `record_mode` are all
//! mutated without locking and read atomically (single-word) from the
//! engine path.
//!
//! Each field is a single-word atomic, matching that discipline exactly
//! — there is deliberately no mutex here, since the original source's
//! rationale (single-word read/write needs no critical section on this
//! hardware) still holds for `AtomicU8`/`AtomicBool` on any platform
//! Rust targets.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use ecu_common::config::{EcuConfig, MAX_FUEL_MSEC, MAX_TIMING_ADVANCE_DEG};

/// Lock-free parameter block shared between the CLI loop and the engine
/// loop within a single process.
pub struct SharedParams {
    timing_advance_deg: AtomicU8,
    fuel_msec: AtomicU8,
    timing_advance_enabled: AtomicBool,
    trim_flag: AtomicBool,
    record_mode: AtomicBool,
    /// Master relay latch (the `o` command; `ON` in the original
    /// source, gates the pump duty-cycler).
    relay_on: AtomicBool,
}

impl SharedParams {
    pub fn from_config(cfg: &EcuConfig) -> Self {
        Self {
            timing_advance_deg: AtomicU8::new(cfg.timing_advance_deg),
            fuel_msec: AtomicU8::new(cfg.fuel_msec),
            timing_advance_enabled: AtomicBool::new(cfg.timing_advance_enabled),
            trim_flag: AtomicBool::new(cfg.trim_flag),
            record_mode: AtomicBool::new(false),
            relay_on: AtomicBool::new(false),
        }
    }

    pub fn timing_advance_deg(&self) -> u8 {
        self.timing_advance_deg.load(Ordering::Relaxed)
    }

    pub fn fuel_msec(&self) -> u8 {
        self.fuel_msec.load(Ordering::Relaxed)
    }

    pub fn timing_advance_enabled(&self) -> bool {
        self.timing_advance_enabled.load(Ordering::Relaxed)
    }

    pub fn trim_flag(&self) -> bool {
        self.trim_flag.load(Ordering::Relaxed)
    }

    pub fn record_mode(&self) -> bool {
        self.record_mode.load(Ordering::Relaxed)
    }

    pub fn relay_on(&self) -> bool {
        self.relay_on.load(Ordering::Relaxed)
    }

    pub fn set_relay_on(&self, on: bool) {
        self.relay_on.store(on, Ordering::Relaxed);
    }

    pub fn set_trim_flag(&self, on: bool) {
        self.trim_flag.store(on, Ordering::Relaxed);
    }

    pub fn toggle_timing_advance_enabled(&self) -> bool {
        let next = !self.timing_advance_enabled.load(Ordering::Relaxed);
        self.timing_advance_enabled.store(next, Ordering::Relaxed);
        next
    }

    pub fn toggle_record_mode(&self) -> bool {
        let next = !self.record_mode.load(Ordering::Relaxed);
        self.record_mode.store(next, Ordering::Relaxed);
        next
    }

    /// `=` / `-`: bump/cut timing advance, clamped `0..=40`.
    pub fn bump_timing_advance(&self) -> u8 {
        let next = self
            .timing_advance_deg
            .load(Ordering::Relaxed)
            .saturating_add(1)
            .min(MAX_TIMING_ADVANCE_DEG);
        self.timing_advance_deg.store(next, Ordering::Relaxed);
        next
    }

    pub fn cut_timing_advance(&self) -> u8 {
        let next = self.timing_advance_deg.load(Ordering::Relaxed).saturating_sub(1);
        self.timing_advance_deg.store(next, Ordering::Relaxed);
        next
    }

    /// `]` / `[`: bump/cut fuel pulse width, clamped `0..=20`.
    pub fn bump_fuel_msec(&self) -> u8 {
        let next = self
            .fuel_msec
            .load(Ordering::Relaxed)
            .saturating_add(1)
            .min(MAX_FUEL_MSEC);
        self.fuel_msec.store(next, Ordering::Relaxed);
        next
    }

    pub fn cut_fuel_msec(&self) -> u8 {
        let next = self.fuel_msec.load(Ordering::Relaxed).saturating_sub(1);
        self.fuel_msec.store(next, Ordering::Relaxed);
        next
    }
}
