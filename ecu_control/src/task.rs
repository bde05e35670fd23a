//! The Engine Task.
//!
//! A read→process→write three-phase loop, adapted from fixed-rate
//! `clock_nanosleep` pacing to semaphore-driven pacing: here, a tooth
//! edge is an event instead of a clock tick, modeled as an `mpsc`
//! channel the tooth ISR sends into and [`EngineTask::run`] blocks on
//! with a 100 ms timeout (once `Run` has been reached at least once).

use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use ecu_common::die::DieReason;
use ecu_common::state::EngineState;
use ecu_common::wheel::WheelPattern;

use ecu_hal::driver::OutputDriver;
use ecu_hal::fatal::die;

use crate::angle::{AngleTable, TickKind};
use crate::decoder::Decoder;
use crate::deferred::DeferredQueue;
use crate::isr::{CaptureCell, CriticalSection, LocalCriticalSection};
use crate::scheduler::Scheduler;

const RUN_TIMEOUT: Duration = Duration::from_millis(100);

/// Owns every core component and the engine task's own bookkeeping
/// (previous edge timestamp, one-shot transition logging, the 100 ms
/// watchdog-once-running timeout).
pub struct EngineTask<D: OutputDriver> {
    decoder: Decoder,
    angle: AngleTable,
    scheduler: Scheduler,
    deferred: DeferredQueue,
    capture: CaptureCell,
    cs: LocalCriticalSection,
    driver: D,
    prev_edge_usec: Option<u64>,
    last_logged_state: EngineState,
    reached_run: bool,
    timing_advance: u8,
    fuel_msec: u8,
}

impl<D: OutputDriver> EngineTask<D> {
    pub fn new(wheel: WheelPattern, advance_enabled: bool, driver: D) -> Self {
        let scheduler = Scheduler::new(advance_enabled);
        let mut angle = AngleTable::new(wheel.event_table_size());
        // The 12 registrations are fixed by construction (3 offsets ×
        // 4 TDCs, each landing on a distinct slot) and can never
        // collide or overflow MAX_EVENT.
        scheduler
            .register(&mut angle)
            .expect("scheduler's fixed 12-event registration never collides");
        Self {
            decoder: Decoder::new(wheel),
            angle,
            scheduler,
            deferred: DeferredQueue::new(),
            capture: CaptureCell::new(),
            cs: LocalCriticalSection,
            driver,
            prev_edge_usec: None,
            last_logged_state: EngineState::Stop,
            reached_run: false,
            timing_advance: 0,
            fuel_msec: 2,
        }
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn engine_state(&self) -> EngineState {
        self.decoder.engine_state()
    }

    pub fn rpm(&self) -> u32 {
        self.decoder.rpm()
    }

    /// Convert a crank-degree span to microseconds at the decoder's
    /// current tooth period (the `r` CLI command's `deg_to_usec(10)`).
    pub fn deg_to_usec(&self, deg: u32) -> u32 {
        self.decoder.deg_to_usec(deg)
    }

    pub fn set_timing_advance(&mut self, deg: u8) {
        self.timing_advance = deg;
    }

    pub fn set_fuel_msec(&mut self, msec: u8) {
        self.fuel_msec = msec;
    }

    pub fn set_trim_flag(&mut self, enabled: bool) {
        self.scheduler.set_trim_flag(enabled);
    }

    pub fn trim_flag(&self) -> bool {
        self.scheduler.trim_flag()
    }

    pub fn trim_done(&self) -> bool {
        self.scheduler.trim_done()
    }

    pub fn advance_enabled(&self) -> bool {
        self.scheduler.advance_enabled()
    }

    /// The `s` CLI command: switch between fixed-spark and
    /// timing-advance-enabled scheduling. Because the two modes
    /// register their middle event at a different BTDC offset (-40 vs
    /// -10), a live switch can't just flip a flag read by `on_event` —
    /// the angle table's registered slots
    /// would no longer match. Instead this rebuilds the scheduler and
    /// angle table for the new mode, carrying over whatever firing
    /// order trim has installed so far. A no-op if already in the
    /// requested mode. Fatal only if the (fixed, never-colliding)
    /// 12-event re-registration somehow collides.
    pub fn set_advance_mode(&mut self, enabled: bool) -> Result<(), DieReason> {
        if enabled == self.advance_enabled() {
            return Ok(());
        }
        let preserved_entries = *self.scheduler.entries();
        let trim_flag = self.scheduler.trim_flag();
        let mut new_scheduler = Scheduler::new(enabled);
        new_scheduler.restore_entries(preserved_entries);
        new_scheduler.set_trim_flag(trim_flag);
        let mut new_angle = AngleTable::new(self.angle.size());
        new_scheduler.register(&mut new_angle)?;
        self.scheduler = new_scheduler;
        self.angle = new_angle;
        Ok(())
    }

    /// Tooth ISR entry point. Computes the
    /// delta from the previous edge, storing 0 (out of range) if it's
    /// `>= 65536`, else the 16-bit delta. FATAL if the capture cell was
    /// already non-zero (the task has fallen behind).
    pub fn on_tooth_edge(&mut self, now_usec: u64) {
        let delta = match self.prev_edge_usec {
            Some(prev) => now_usec.saturating_sub(prev),
            None => 0,
        };
        self.prev_edge_usec = Some(now_usec);
        let period = if delta >= 65536 { 0 } else { delta as u16 };
        let result = self.cs.enter(|| self.capture.write(period));
        if let Err(reason) = result {
            die(reason, &mut self.driver);
        }
    }

    /// One iteration of the task body: drain the capture cell, tick the
    /// decoder, dispatch any pending angle event, drain due deferred
    /// work. Returns `Ok(true)` if a sample was actually processed.
    /// Exposed so a caller that drives its own select loop over tooth
    /// edges and other event sources (e.g. `ecu_supervisor`) can pump
    /// the task body directly instead of going through [`Self::run`].
    pub fn pump(&mut self) -> Result<bool, DieReason> {
        let sample = self.cs.enter(|| self.capture.take());
        let Some(sample) = sample else {
            return Ok(false);
        };

        self.decoder.tick(sample as u32, &mut self.angle)?;
        self.log_transition();

        if let Some((kind, cookie)) = self.angle.take_pending() {
            self.scheduler.on_event(
                kind,
                cookie,
                &self.decoder,
                &mut self.driver,
                &mut self.deferred,
                self.timing_advance,
                self.fuel_msec,
            )?;
        }

        let now = self.driver.now_usec();
        self.deferred.drain_due(now, &mut self.driver);
        Ok(true)
    }

    fn log_transition(&mut self) {
        let state = self.decoder.engine_state();
        if state == self.last_logged_state {
            return;
        }
        tracing::info!(from = %self.last_logged_state, to = %state, "engine state transition");
        if state == EngineState::Run && !self.reached_run {
            self.reached_run = true;
            self.driver.starter_off();
        }
        self.last_logged_state = state;
    }

    /// Block on `edges` (the tooth ISR's channel) and pump the task
    /// body forever. Timeout after reaching `Run` is FATAL
    /// (`DieReason::Timeout`); before that, waits without a deadline.
    pub fn run(&mut self, edges: &Receiver<u64>) -> ! {
        loop {
            let recv = if self.reached_run {
                edges.recv_timeout(RUN_TIMEOUT)
            } else {
                edges.recv().map_err(|_| RecvTimeoutError::Disconnected)
            };
            match recv {
                Ok(now_usec) => self.on_tooth_edge(now_usec),
                Err(RecvTimeoutError::Timeout) => die(DieReason::Timeout, &mut self.driver),
                Err(RecvTimeoutError::Disconnected) => die(DieReason::Fatal, &mut self.driver),
            }
            if let Err(reason) = self.pump() {
                die(reason, &mut self.driver);
            }
        }
    }
}
