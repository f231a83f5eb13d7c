//! # Litflow
//!
//! A streaming multi-stage article generation pipeline.
//!
//! Litflow turns a topic into a polished article through four fixed
//! stages (research, strategy, draft, edit), each powered by an LLM
//! backend behind the [`backend::GenerationBackend`] contract:
//!
//! - **Ordered event stream**: every run multiplexes stage lifecycle
//!   transitions and token deltas onto one ordered sequence
//! - **Backend adapters**: a subprocess CLI agent and a hosted
//!   chat-completions API, interchangeable per stage
//! - **Degradable research**: a pluggable web search collaborator whose
//!   failures fall back to model knowledge instead of aborting
//! - **Dual surfaces**: the same run is consumable as a live event
//!   stream or as a single synchronous result
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use litflow::prelude::*;
//!
//! let pipeline = Pipeline::article(
//!     Arc::new(ProcessBackend::new(ProcessBackendConfig::default())),
//!     Arc::new(ChatCompletionsBackend::new(chat_config)),
//!     Arc::new(DuckDuckGoProvider::default()),
//! );
//!
//! let mut events = pipeline.stream("the borrow checker, explained");
//! while let Some(event) = events.next().await {
//!     print!("{}", litflow::events::frame(&event));
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod backend;
pub mod core;
pub mod errors;
pub mod events;
pub mod pipeline;
pub mod stages;
pub mod testing;
pub mod websearch;

/// Prelude module for convenient imports
pub mod prelude {
    pub use std::sync::Arc;

    pub use crate::backend::{
        ChatBackendConfig, ChatCompletionsBackend, ChunkStream, GenerationBackend,
        ProcessBackend, ProcessBackendConfig,
    };
    pub use crate::core::{
        BackendChunk, GenerateResponse, PipelineState, StageEvent, StageName, StageStatus,
    };
    pub use crate::errors::{BackendError, PipelineError, SearchError};
    pub use crate::events::{frame, sse_stream, STREAM_TERMINATOR};
    pub use crate::pipeline::Pipeline;
    pub use crate::stages::{PromptBuilder, StageDefinition, StagePrompt};
    pub use crate::websearch::{SearchItem, SearchProvider};

    #[cfg(feature = "websearch")]
    pub use crate::websearch::DuckDuckGoProvider;

    pub use futures::StreamExt;
}
