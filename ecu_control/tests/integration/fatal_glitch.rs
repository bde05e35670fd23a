//! Fatal glitch.
//!
//! In the main ticker state, a single wildly out-of-range sample
//! (200_000us, far past the 60-2 wheel's `max_period_us` of 125ms) must
//! route to the fatal sink: `close_all` called (every coil, injector,
//! relay, starter, and the fuel pump off), and the process does not
//! feed the watchdog again — modeled here as the `testing`-feature
//! panic substitution in `ecu_hal::fatal::die` (see DESIGN.md).

use ecu_common::wheel::WheelPattern;
use ecu_control::angle::AngleTable;
use ecu_control::decoder::Decoder;
use ecu_hal::driver::OutputDriver;
use ecu_hal::fatal::die;
use ecu_hal::sim::SimulationDriver;

#[test]
fn out_of_range_sample_in_main_ticker_dies_with_close_all() {
    let wheel = WheelPattern::Hyundai602;
    let mut decoder = Decoder::new(wheel);
    let mut angle = AngleTable::new(wheel.event_table_size());
    let mut driver = SimulationDriver::new();

    for _ in 0..10 {
        decoder.tick(1000, &mut angle).unwrap();
    }
    decoder.tick(10_000, &mut angle).unwrap(); // sync -> Ticking / Run

    driver.relay_on();
    driver.starter_on();
    driver.open_coil(
        ecu_common::cylinder::CoilTarget::Single(ecu_common::cylinder::Cyl::Cyl1),
        0,
    );
    driver.open_injector(ecu_common::cylinder::Cyl::Cyl1);
    driver.gaz_on();

    let err = decoder
        .tick(200_000, &mut angle)
        .expect_err("200ms sample must be rejected as FATAL in the main ticker state");
    assert_eq!(err, ecu_common::die::DieReason::Trigger);

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        die(err, &mut driver);
    }));
    assert!(result.is_err(), "die() must not return");

    assert_eq!(driver.state, ecu_hal::sim::SimState::default());
}
