//! Trigger-wheel decoder.
//!
//! Turns a stream of tooth periods (microseconds between consecutive
//! tooth edges, as captured by the ISR) into: a synchronized angle
//! position fed to [`AngleTable`], a smoothed period `average` used for
//! RPM and degree/microsecond conversions, and an [`EngineState`].
//!
//! The state machine below implements five states (0 = init, 1 =
//! debounce, 2 = gap search, 3 = sync confirm, 4 = main ticker). One
//! point in that table is under-specified enough to need a concrete
//! choice, recorded in DESIGN.md: sync resolution in state 3 sets
//! `event_index` directly rather than setting-then-ticking. Each
//! missing-tooth trigger point (tooth 11/14/29 on the Subaru3622 wheel)
//! produces exactly two synthetic ticks, one per physically skipped
//! tooth, matching `tooth_ctr++; event_tick(-1);` issued twice in the
//! original source.

use ecu_common::die::DieReason;
use ecu_common::state::EngineState;
use ecu_common::wheel::WheelPattern;

use crate::angle::{AngleTable, TickKind};

/// Number of samples folded into the running average.
const AVERAGE_DEPTH: usize = 8;

/// How many consecutive ticks state 2 tolerates without finding a
/// candidate gap before giving up and resetting to state 0.
const STATE2_TIMEOUT_TICKS: u16 = 200;

/// How many ticks state 3 (Subaru only) waits for the confirming second
/// gap before accepting the single-gap fallback resolution.
const STATE3_CONFIRM_TICKS: u16 = 2;

/// Sync-resolution constants for the 36-2-2-2 wheel's two state-3
/// outcomes (fallback tooth 33 lands at slot `(680+10)/10 = 69`).
const SUBARU_CONFIRMED_TOOTH: u16 = 17;
const SUBARU_CONFIRMED_SLOT: usize = 17;
const SUBARU_FALLBACK_TOOTH: u16 = 33;
const SUBARU_FALLBACK_SLOT: usize = 69;

/// An 8-slot running-sum moving average of tooth periods, in microseconds.
#[derive(Debug, Clone, Copy)]
pub struct Average {
    samples: [u32; AVERAGE_DEPTH],
    next: usize,
    filled: usize,
    sum: u64,
}

impl Average {
    pub fn new() -> Self {
        Self {
            samples: [0; AVERAGE_DEPTH],
            next: 0,
            filled: 0,
            sum: 0,
        }
    }

    /// Fold a new sample in, evicting the oldest if the ring is full.
    pub fn push(&mut self, sample_us: u32) {
        if self.filled == AVERAGE_DEPTH {
            self.sum -= self.samples[self.next] as u64;
        } else {
            self.filled += 1;
        }
        self.samples[self.next] = sample_us;
        self.sum += sample_us as u64;
        self.next = (self.next + 1) % AVERAGE_DEPTH;
    }

    /// Current average, or 0 if nothing has been folded in yet.
    pub fn value(&self) -> u32 {
        if self.filled == 0 {
            0
        } else {
            (self.sum / self.filled as u64) as u32
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for Average {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Init,
    Debounce,
    GapSearch,
    SyncConfirm,
    Ticking,
}

/// The trigger-wheel decoder. One instance per engine; its wheel
/// pattern is fixed at construction — the pattern is a configuration
/// choice, not something detected at runtime.
#[derive(Debug, Clone)]
pub struct Decoder {
    wheel: WheelPattern,
    phase: Phase,
    average: Average,
    tooth_ctr: u16,
    debounce_count: u16,
    search_ticks: u16,
    confirm_ticks: u16,
}

impl Decoder {
    pub fn new(wheel: WheelPattern) -> Self {
        Self {
            wheel,
            phase: Phase::Init,
            average: Average::new(),
            tooth_ctr: 0,
            debounce_count: 0,
            search_ticks: 0,
            confirm_ticks: 0,
        }
    }

    pub fn wheel(&self) -> WheelPattern {
        self.wheel
    }

    /// Current engine state derived from decoder phase: states 0/1 ->
    /// Init, states 2/3 -> Crank, state 4 depends on `average`.
    pub fn engine_state(&self) -> EngineState {
        match self.phase {
            Phase::Init | Phase::Debounce => EngineState::Init,
            Phase::GapSearch | Phase::SyncConfirm => EngineState::Crank,
            Phase::Ticking => {
                if self.average.value() as u16 > self.wheel.constants().average_run_period_us {
                    EngineState::Crank
                } else {
                    EngineState::Run
                }
            }
        }
    }

    /// Current smoothed tooth period, microseconds.
    pub fn average_us(&self) -> u32 {
        self.average.value()
    }

    /// Instantaneous RPM from the smoothed period:
    /// `60_000_000 / (average * teeth_per_rev)`.
    pub fn rpm(&self) -> u32 {
        let avg = self.average.value();
        if avg == 0 {
            return 0;
        }
        60_000_000 / (avg * self.wheel.teeth_per_rev() as u32)
    }

    /// Convert a crank-degree span into microseconds at the current
    /// smoothed tooth period: `average * degrees / resolution`.
    pub fn deg_to_usec(&self, degrees: u32) -> u32 {
        let c = self.wheel.constants();
        (self.average.value() as u64 * degrees as u64 / c.resolution_deg as u64) as u32
    }

    /// Feed one tooth period (microseconds) into the decoder, advancing
    /// `angle` as appropriate. Returns `Err` only for conditions that
    /// are fatal (out-of-bounds sample while in the main ticker state,
    /// or a long sample at an unexpected tooth position); anything
    /// recoverable is handled internally by resetting to state 0.
    pub fn tick(&mut self, sample_us: u32, angle: &mut AngleTable) -> Result<(), DieReason> {
        let c = self.wheel.constants();
        let out_of_bounds = sample_us < c.min_period_us as u32 || sample_us > c.max_period_us;

        if self.phase == Phase::Ticking {
            if out_of_bounds {
                return Err(DieReason::Trigger);
            }
            return self.tick_main(sample_us, angle);
        }

        if out_of_bounds {
            self.reset_to_init();
            return Ok(());
        }

        match self.phase {
            Phase::Init => {
                self.reset_to_init();
                self.phase = Phase::Debounce;
                self.tick_debounce(sample_us)
            }
            Phase::Debounce => self.tick_debounce(sample_us),
            Phase::GapSearch => self.tick_gap_search(sample_us, angle),
            Phase::SyncConfirm => self.tick_sync_confirm(sample_us, angle),
            Phase::Ticking => unreachable!("handled above"),
        }
    }

    fn reset_to_init(&mut self) {
        self.phase = Phase::Init;
        self.average.reset();
        self.tooth_ctr = 0;
        self.debounce_count = 0;
        self.search_ticks = 0;
        self.confirm_ticks = 0;
    }

    /// State 1: accumulate stable (non-20ms-gap) samples until
    /// `min_sample` accepted, feeding the average as we go.
    fn tick_debounce(&mut self, sample_us: u32) -> Result<(), DieReason> {
        if sample_us >= 20_000 {
            self.reset_to_init();
            return Ok(());
        }
        self.average.push(sample_us);
        self.debounce_count += 1;
        if self.debounce_count >= self.wheel.constants().min_sample {
            self.phase = Phase::GapSearch;
            self.search_ticks = 0;
        }
        Ok(())
    }

    /// State 2: look for the first candidate gap, a sample more than
    /// twice the running average.
    fn tick_gap_search(&mut self, sample_us: u32, angle: &mut AngleTable) -> Result<(), DieReason> {
        let avg = self.average.value();
        if avg > 0 && sample_us > 2 * avg {
            match self.wheel {
                // Hyundai's single recurring gap needs no second
                // confirmation: the first candidate is the fiducial.
                WheelPattern::Hyundai602 => {
                    self.tooth_ctr = 1;
                    angle.set_position(0)?;
                    self.phase = Phase::Ticking;
                    Ok(())
                }
                WheelPattern::Subaru3622 => {
                    self.phase = Phase::SyncConfirm;
                    self.confirm_ticks = 0;
                    Ok(())
                }
            }
        } else {
            self.average.push(sample_us);
            self.search_ticks += 1;
            if self.search_ticks >= STATE2_TIMEOUT_TICKS {
                self.reset_to_init();
            }
            Ok(())
        }
    }

    /// State 3 (Subaru only): wait up to `STATE3_CONFIRM_TICKS` for a
    /// second gap sample confirming true sync (tooth 11/14/29, slot
    /// 17); otherwise accept the single-gap fallback resolution (tooth
    /// 33, slot 69). Sets `event_index` directly rather than setting
    /// then ticking once more (see DESIGN.md).
    fn tick_sync_confirm(
        &mut self,
        sample_us: u32,
        angle: &mut AngleTable,
    ) -> Result<(), DieReason> {
        let avg = self.average.value();
        if avg > 0 && sample_us > 2 * avg {
            self.tooth_ctr = SUBARU_CONFIRMED_TOOTH;
            angle.set_position(SUBARU_CONFIRMED_SLOT)?;
            self.phase = Phase::Ticking;
            return Ok(());
        }
        self.confirm_ticks += 1;
        if self.confirm_ticks >= STATE3_CONFIRM_TICKS {
            self.tooth_ctr = SUBARU_FALLBACK_TOOTH;
            angle.set_position(SUBARU_FALLBACK_SLOT)?;
            // The sample that failed to confirm still belongs in the
            // average (see DESIGN.md: samples fold into the average
            // even when they don't win the state transition they were
            // evaluated against).
            self.average.push(sample_us);
            self.phase = Phase::Ticking;
        }
        Ok(())
    }

    /// State 4: the main ticker. A sample at an expected missing-tooth
    /// position must be long (it's excluded from the average; one real
    /// tick plus two synthetic ticks account for the skipped pair of
    /// teeth). A long sample anywhere else, or a non-long sample at an
    /// expected missing position, is fatal.
    fn tick_main(&mut self, sample_us: u32, angle: &mut AngleTable) -> Result<(), DieReason> {
        let teeth = self.wheel.teeth_per_rev();
        let next_tooth = if self.tooth_ctr >= teeth {
            1
        } else {
            self.tooth_ctr + 1
        };
        let avg = self.average.value();
        let is_missing_position = self.wheel.missing_positions().contains(&next_tooth);
        let is_long = avg > 0 && sample_us > 2 * avg;

        if is_missing_position {
            if !is_long {
                return Err(DieReason::Trigger);
            }
            angle.tick(TickKind::Real)?;
            angle.tick(TickKind::Synthetic)?;
            angle.tick(TickKind::Synthetic)?;
        } else {
            if is_long {
                return Err(DieReason::Trigger);
            }
            self.average.push(sample_us);
            angle.tick(TickKind::Real)?;
        }
        self.tooth_ctr = next_tooth;
        Ok(())
    }
}
