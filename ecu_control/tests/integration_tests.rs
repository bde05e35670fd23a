//! Integration tests for the ECU control core.
//!
//! These exercise the decoder, angle table, scheduler, and deferred
//! queue together, reproducing the concrete scenarios worked through by
//! hand in the design document.

mod integration;
