//! The angle event table.
//!
//! A ring of `720° / resolution` slots, phase-indexed by tooth ticks.
//! `event_index` names the *next* slot to be checked on the next tick.
//! `pending_event` is the single-slot mailbox between the tick producer
//! (decoder, ISR-adjacent) and the callback consumer (Engine Task); its
//! at-most-one-in-flight discipline is the contract this module exists
//! to preserve.

use ecu_common::die::DieReason;

/// Maximum number of events that may be registered in one table:
/// 3 per cylinder × 4 cylinders.
pub const MAX_EVENT: usize = 12;

static_assertions::const_assert_eq!(MAX_EVENT, 3 * 4);

/// What kind of angular event fires at a slot, tagged with which
/// cylinder's TDC it belongs to (`cookie`, 0-based). Replaces the
/// open-coded `(fn, cookie)` callback pair of the original source with
/// a closed tagged variant — the Engine Task dispatches on this with a
/// `match`, the table itself does not own a function pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// BTDC-140 anchor event. Fires nothing directly in fixed-spark
    /// mode; in timing-advance mode, schedules the coil open/close as
    /// absolute deferred-queue deadlines from this earliest anchor.
    BtdcDwell,
    /// The mode-dependent BTDC-K event: direct coil-open (dwell start)
    /// in fixed-spark mode, or the BTDC-10 close-coil safety fallback
    /// in timing-advance mode.
    BtdcFire,
    /// BTDC-0 TDC event: close coil (if not already), open injector, schedule its close.
    BtdcTdc,
}

/// Whether a tick is a real tooth edge or a synthesized one (used by
/// the 36-2-2-2 wheel to keep the angle ring in step with real crank
/// degrees across its physical gaps).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickKind {
    Real,
    Synthetic,
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    kind: EventKind,
    cookie: u8,
}

/// The angle event ring.
#[derive(Debug, Clone)]
pub struct AngleTable {
    slots: Vec<Option<Slot>>,
    /// Next slot to be checked on the next tick.
    event_index: usize,
    /// At-most-one in-flight dispatch mailbox.
    pending_event: Option<(EventKind, u8)>,
    registered: usize,
}

impl AngleTable {
    /// `event_init(size)`. Asserts `size == 720/resolution` at the call
    /// site (the caller, `Scheduler`, knows the wheel's resolution).
    pub fn new(size: usize) -> Self {
        Self {
            slots: vec![None; size],
            event_index: 0,
            pending_event: None,
            registered: 0,
        }
    }

    pub fn size(&self) -> usize {
        self.slots.len()
    }

    /// `event_register(degree, fn, cookie)`. Normalizes `degree` into
    /// `[0, 720)`, maps to a slot, fatal on collision or on exceeding
    /// `MAX_EVENT` total registrations.
    pub fn register(
        &mut self,
        degree: i32,
        kind: EventKind,
        cookie: u8,
    ) -> Result<(), DieReason> {
        if self.registered >= MAX_EVENT {
            return Err(DieReason::Event);
        }
        let resolution = 720 / self.slots.len() as i32;
        let slot = normalize_deg(degree) as usize / resolution as usize;
        if self.slots[slot].is_some() {
            return Err(DieReason::Event);
        }
        self.slots[slot] = Some(Slot { kind, cookie });
        self.registered += 1;
        Ok(())
    }

    /// `event_set_position(slot)`. Used by the decoder at sync lock.
    pub fn set_position(&mut self, slot: usize) -> Result<(), DieReason> {
        if slot >= self.slots.len() {
            return Err(DieReason::Event);
        }
        self.event_index = slot;
        Ok(())
    }

    /// Current value of `event_index`, for diagnostics/tests.
    pub fn position(&self) -> usize {
        self.event_index
    }

    /// `event_tick(flag)`. If the current slot is registered, fatal if
    /// a pending event is already in flight, or if this is a synthetic
    /// tick landing on a real event (a synthetic tick must never land
    /// on a real event — this catches misaligned wheels). Otherwise
    /// latches the pending event. Always advances `event_index` modulo
    /// the table size.
    pub fn tick(&mut self, kind: TickKind) -> Result<(), DieReason> {
        if let Some(slot) = self.slots[self.event_index] {
            if self.pending_event.is_some() {
                return Err(DieReason::Event);
            }
            if matches!(kind, TickKind::Synthetic) {
                return Err(DieReason::Event);
            }
            self.pending_event = Some((slot.kind, slot.cookie));
        }
        self.event_index = (self.event_index + 1) % self.slots.len();
        Ok(())
    }

    /// `event_callback()` minus the invocation: the Engine Task takes
    /// the pending event and dispatches it itself, then this clears the
    /// mailbox. Returns `None` if no event is pending.
    pub fn take_pending(&mut self) -> Option<(EventKind, u8)> {
        self.pending_event.take()
    }
}

/// `normalize_deg(d)`: reduce into `[0, 720)` for any input in `[-720, 1440)`.
pub fn normalize_deg(d: i32) -> i32 {
    let mut d = d % 720;
    if d < 0 {
        d += 720;
    }
    d
}
