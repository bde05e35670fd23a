//! The deferred work queue.
//!
//! Replaces the `(fn_ptr, cookie)` raw callback pair of the original
//! timer-ISR work queue with a closed tagged enum. A scheduled action
//! fires no earlier than its deadline; late delivery (the drain runs
//! behind schedule) fires immediately rather than being dropped. There
//! is no cancellation API — once scheduled, an action always eventually
//! runs.

use heapless::binary_heap::{BinaryHeap, Min};

use ecu_common::cylinder::{CoilTarget, Cyl};
use ecu_common::die::DieReason;

use ecu_hal::driver::OutputDriver;

/// Upper bound on outstanding deferred work: steady state never exceeds
/// 2 per cylinder (coil close + injector close) across 4 cylinders.
pub const CAPACITY: usize = 16;

static_assertions::const_assert!(CAPACITY >= 2 * 4);

/// A unit of work the Timer ISR (modeled here as a periodic drain, see
/// `ecu_control::task`) must execute once its deadline has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredAction {
    CloseCoil(CoilTarget),
    CloseInjector(Cyl),
    OpenCoil(CoilTarget),
}

impl DeferredAction {
    fn run(self, now_usec: u64, driver: &mut impl OutputDriver) {
        match self {
            DeferredAction::CloseCoil(target) => driver.close_coil(target, now_usec),
            DeferredAction::CloseInjector(cyl) => driver.close_injector(cyl, now_usec),
            DeferredAction::OpenCoil(target) => driver.open_coil(target, now_usec),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct WorkItem {
    action: DeferredAction,
    deadline_usec: u64,
}

// Ordered by deadline only, reversed so the heap (a max-heap underneath)
// pops the earliest deadline first via the `Min` wrapper.
impl PartialOrd for WorkItem {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for WorkItem {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        self.deadline_usec.cmp(&other.deadline_usec)
    }
}

/// Fixed-capacity, deadline-ordered queue of deferred actions.
pub struct DeferredQueue {
    heap: BinaryHeap<WorkItem, Min, CAPACITY>,
}

impl DeferredQueue {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// `schedule_absolute`. Fatal if the queue's fixed capacity is
    /// exhausted — the queue never grows.
    pub fn schedule_absolute(
        &mut self,
        action: DeferredAction,
        deadline_usec: u64,
    ) -> Result<(), DieReason> {
        self.heap
            .push(WorkItem {
                action,
                deadline_usec,
            })
            .map_err(|_| DieReason::Event)
    }

    /// Execute every action whose deadline has passed (`<= now_usec`).
    /// Called once per tooth tick from the Engine Task, standing in for
    /// the original's periodic Timer ISR drain.
    pub fn drain_due(&mut self, now_usec: u64, driver: &mut impl OutputDriver) {
        while let Some(item) = self.heap.peek() {
            if item.deadline_usec > now_usec {
                break;
            }
            let item = self.heap.pop().expect("peek just confirmed an item");
            item.action.run(now_usec, driver);
        }
    }
}

impl Default for DeferredQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecu_common::cylinder::Cyl;
    use ecu_hal::sim::SimulationDriver;

    #[test]
    fn due_action_fires_on_drain() {
        let mut q = DeferredQueue::new();
        let mut d = SimulationDriver::new();
        d.open_injector(Cyl::Cyl1);
        q.schedule_absolute(DeferredAction::CloseInjector(Cyl::Cyl1), 1000)
            .unwrap();
        q.drain_due(500, &mut d);
        assert!(d.state.injectors[0], "not due yet");
        q.drain_due(1000, &mut d);
        assert!(!d.state.injectors[0]);
    }

    #[test]
    fn late_delivery_fires_immediately_rather_than_dropping() {
        let mut q = DeferredQueue::new();
        let mut d = SimulationDriver::new();
        d.open_injector(Cyl::Cyl2);
        q.schedule_absolute(DeferredAction::CloseInjector(Cyl::Cyl2), 100)
            .unwrap();
        // Drain runs far later than the deadline.
        q.drain_due(50_000, &mut d);
        assert!(!d.state.injectors[1]);
    }

    #[test]
    fn drains_in_deadline_order_regardless_of_schedule_order() {
        let mut q = DeferredQueue::new();
        let mut d = SimulationDriver::new();
        d.open_injector(Cyl::Cyl1);
        d.open_injector(Cyl::Cyl2);
        q.schedule_absolute(DeferredAction::CloseInjector(Cyl::Cyl2), 2000)
            .unwrap();
        q.schedule_absolute(DeferredAction::CloseInjector(Cyl::Cyl1), 1000)
            .unwrap();
        q.drain_due(1000, &mut d);
        assert!(!d.state.injectors[0]);
        assert!(d.state.injectors[1], "cyl2's deadline hasn't passed");
        q.drain_due(2000, &mut d);
        assert!(!d.state.injectors[1]);
    }

    #[test]
    fn capacity_exhaustion_is_fatal() {
        let mut q = DeferredQueue::new();
        for i in 0..CAPACITY {
            q.schedule_absolute(DeferredAction::CloseInjector(Cyl::Cyl1), i as u64)
                .unwrap();
        }
        assert_eq!(
            q.schedule_absolute(DeferredAction::CloseInjector(Cyl::Cyl1), 99),
            Err(DieReason::Event)
        );
    }

    #[test]
    fn drain_with_nothing_due_is_a_noop() {
        let mut q = DeferredQueue::new();
        let mut d = SimulationDriver::new();
        q.schedule_absolute(DeferredAction::OpenCoil(CoilTarget::Single(Cyl::Cyl3)), 5000)
            .unwrap();
        q.drain_due(100, &mut d);
        assert_eq!(q.len(), 1);
        assert!(!d.state.coils[2]);
    }
}
