//! Core domain model types for litflow.
//!
//! This module contains the fundamental types used throughout the crate:
//! - Stage name and status enums
//! - Stage events and their wire frames
//! - Backend chunks
//! - Per-run pipeline state

mod chunk;
mod event;
mod stage;
mod state;

pub use chunk::BackendChunk;
pub use event::StageEvent;
pub use stage::{StageName, StageStatus};
pub use state::{GenerateResponse, PipelineState};
