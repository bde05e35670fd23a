//! # ECU Common Library
//!
//! Shared types for the four-cylinder engine control unit workspace:
//! cylinder identifiers, the engine lifecycle state, the terminal
//! fatal-error taxonomy, trigger-wheel pattern constants, and the TOML
//! configuration loader used by [`ecu_control`] and [`ecu_supervisor`].
//!
//! # Module Structure
//!
//! - [`cylinder`] - `Cyl` and `CoilTarget` identifiers
//! - [`state`] - `EngineState` lifecycle enum
//! - [`die`] - the terminal `DieReason` taxonomy and fatal sink
//! - [`wheel`] - trigger-wheel pattern constants (36-2-2-2 / 60-2)
//! - [`config`] - TOML configuration loader and validation

pub mod config;
pub mod cylinder;
pub mod die;
pub mod state;
pub mod wheel;
