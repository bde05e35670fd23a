//! Engine lifecycle state.
//!
//! Transitions are produced exclusively by the trigger-wheel decoder as
//! a function of tooth statistics (`ecu_control::decoder`); `Dead` is
//! reached only via the fatal-error path (`ecu_common::die`).

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EngineState {
    #[default]
    Stop,
    Init,
    Crank,
    Run,
    Dead,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EngineState::Stop => "STOP",
            EngineState::Init => "INIT",
            EngineState::Crank => "CRANK",
            EngineState::Run => "RUN",
            EngineState::Dead => "DEAD",
        };
        f.write_str(s)
    }
}
