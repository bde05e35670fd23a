//! 36-2-2-2 sync lock.
//!
//! After 10 stable 3333us samples, a 7000/3333/7000 pattern (gap, one
//! stable tooth, gap again within 2 teeth) confirms sync at tooth 17 /
//! slot 17, reporting RUN once in the main ticker state.

use ecu_common::state::EngineState;
use ecu_common::wheel::WheelPattern;
use ecu_control::angle::AngleTable;
use ecu_control::decoder::Decoder;

#[test]
fn confirmed_second_gap_locks_tooth_17_slot_17() {
    let wheel = WheelPattern::Subaru3622;
    let mut decoder = Decoder::new(wheel);
    let mut angle = AngleTable::new(wheel.event_table_size());

    for _ in 0..10 {
        decoder.tick(3333, &mut angle).unwrap();
    }

    decoder.tick(7000, &mut angle).unwrap(); // candidate gap -> state 3
    decoder.tick(3333, &mut angle).unwrap(); // one stable tooth, not confirmed yet
    decoder.tick(7000, &mut angle).unwrap(); // confirming second gap within 2 teeth

    assert_eq!(angle.position(), 17);
    assert_eq!(decoder.engine_state(), EngineState::Run);
}
