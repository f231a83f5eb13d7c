//! The stage sequencer.
//!
//! [`Pipeline`] executes the fixed ordered stage list, threading each
//! stage's output into later stages' prompts and multiplexing backend
//! deltas and lifecycle transitions onto one ordered event sequence.

mod sequencer;

pub use sequencer::Pipeline;
