//! Simulation output driver (the "x86 stub" hardware-free backend).
//!
//! Backs every [`OutputDriver`] operation with plain in-memory state and
//! a monotonic [`std::time::Instant`]-derived clock. Used by
//! `ecu_control`'s tests and by `ecu_supervisor` when no real hardware
//! backend is configured.

use std::time::Instant;

use ecu_common::cylinder::{CoilTarget, Cyl};

use crate::driver::OutputDriver;

/// Per-cylinder/relay/starter/pump boolean state, observable by tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimState {
    pub injectors: [bool; 4],
    pub coils: [bool; 4],
    pub relay: bool,
    pub starter: bool,
    pub gaz: bool,
}

impl SimState {
    #[inline]
    fn idx(cyl: Cyl) -> usize {
        cyl.index() as usize
    }
}

/// The simulation driver: no real hardware, just observable state plus
/// a clock. `CRANK_VAL()` on a platform without hardware returns 0; here
/// that's modeled as the driver never being asked for a crank signal —
/// the decoder only ever receives synthetic tooth periods in tests.
#[derive(Debug, Clone)]
pub struct SimulationDriver {
    pub state: SimState,
    origin: Instant,
    /// Overridable clock for deterministic tests; `None` uses wall time.
    fixed_now_us: Option<u64>,
}

impl SimulationDriver {
    pub fn new() -> Self {
        Self {
            state: SimState::default(),
            origin: Instant::now(),
            fixed_now_us: None,
        }
    }

    /// Pin the clock to a fixed value, for deterministic deferred-work tests.
    pub fn set_fixed_now_usec(&mut self, now_usec: u64) {
        self.fixed_now_us = Some(now_usec);
    }

    pub fn advance_fixed_now_usec(&mut self, delta_usec: u64) {
        self.fixed_now_us = Some(self.fixed_now_us.unwrap_or(0) + delta_usec);
    }
}

impl Default for SimulationDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputDriver for SimulationDriver {
    fn open_injector(&mut self, cyl: Cyl) {
        self.state.injectors[SimState::idx(cyl)] = true;
    }

    fn close_injector(&mut self, cyl: Cyl, _now_usec: u64) {
        // Idempotent: closing an already-closed injector is a no-op toggle.
        self.state.injectors[SimState::idx(cyl)] = false;
    }

    fn open_coil(&mut self, target: CoilTarget, _now_usec: u64) {
        for cyl in target.cylinders() {
            self.state.coils[SimState::idx(cyl)] = true;
        }
    }

    fn close_coil(&mut self, target: CoilTarget, _now_usec: u64) {
        for cyl in target.cylinders() {
            self.state.coils[SimState::idx(cyl)] = false;
        }
    }

    fn relay_on(&mut self) {
        self.state.relay = true;
    }

    fn relay_off(&mut self) {
        self.state.relay = false;
    }

    fn starter_on(&mut self) {
        self.state.starter = true;
    }

    fn starter_off(&mut self) {
        self.state.starter = false;
    }

    fn gaz_on(&mut self) {
        self.state.gaz = true;
    }

    fn gaz_off(&mut self) {
        self.state.gaz = false;
    }

    fn gaz_toggle(&mut self) {
        self.state.gaz = !self.state.gaz;
    }

    fn close_all(&mut self) {
        self.state.injectors = [false; 4];
        self.state.coils = [false; 4];
        self.state.relay = false;
        self.state.starter = false;
        self.state.gaz = false;
    }

    fn now_usec(&self) -> u64 {
        match self.fixed_now_us {
            Some(t) => t,
            None => self.origin.elapsed().as_micros() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_then_close_injector() {
        let mut d = SimulationDriver::new();
        d.open_injector(Cyl::Cyl2);
        assert!(d.state.injectors[1]);
        d.close_injector(Cyl::Cyl2, 0);
        assert!(!d.state.injectors[1]);
    }

    #[test]
    fn repeated_close_is_noop() {
        let mut d = SimulationDriver::new();
        d.close_injector(Cyl::Cyl1, 0);
        d.close_injector(Cyl::Cyl1, 0);
        assert!(!d.state.injectors[0]);
    }

    #[test]
    fn pair_target_drives_both_coils() {
        let mut d = SimulationDriver::new();
        d.open_coil(CoilTarget::Pair(Cyl::Cyl1, Cyl::Cyl3), 0);
        assert!(d.state.coils[0]);
        assert!(d.state.coils[2]);
        d.close_coil(CoilTarget::Pair(Cyl::Cyl1, Cyl::Cyl3), 0);
        assert!(!d.state.coils[0]);
        assert!(!d.state.coils[2]);
    }

    #[test]
    fn gaz_toggle_twice_restores_state() {
        let mut d = SimulationDriver::new();
        let before = d.state.gaz;
        d.gaz_toggle();
        d.gaz_toggle();
        assert_eq!(d.state.gaz, before);
    }

    #[test]
    fn close_all_is_idempotent_and_total() {
        let mut d = SimulationDriver::new();
        d.open_coil(CoilTarget::Single(Cyl::Cyl4), 0);
        d.open_injector(Cyl::Cyl4);
        d.relay_on();
        d.starter_on();
        d.gaz_on();
        d.close_all();
        assert_eq!(d.state, SimState::default());
        d.close_all();
        assert_eq!(d.state, SimState::default());
    }

    #[test]
    fn fixed_clock_advances_by_delta() {
        let mut d = SimulationDriver::new();
        d.set_fixed_now_usec(1_000);
        assert_eq!(d.now_usec(), 1_000);
        d.advance_fixed_now_usec(500);
        assert_eq!(d.now_usec(), 1_500);
    }
}
