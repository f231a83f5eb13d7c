//! Generation backend adapters.
//!
//! A backend wraps one text-generating capability (an interactive CLI agent
//! or a hosted streaming completion API) behind a uniform chunk-stream
//! contract. Callers never see process- or vendor-specific details.

mod chat;
mod process;

pub use chat::{ChatBackendConfig, ChatCompletionsBackend};
pub use process::{ProcessBackend, ProcessBackendConfig};

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::core::BackendChunk;
use crate::errors::BackendError;

/// A finite stream of backend chunks.
///
/// A successful stream yields zero or more `Delta` chunks followed by
/// exactly one `Complete` chunk; a failing stream ends with an `Err` before
/// any `Complete`. Dropping the stream releases the backend resource
/// (subprocess or HTTP connection).
pub type ChunkStream = BoxStream<'static, Result<BackendChunk, BackendError>>;

/// A text-generation capability exposed as a delta/complete chunk stream.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// A short identifier for logging (e.g., `"process"`, `"chat"`).
    fn name(&self) -> &str;

    /// Starts one generation and returns its chunk stream.
    ///
    /// Adapters never retry internally; retry policy, if any, belongs to
    /// the caller.
    async fn stream(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
    ) -> Result<ChunkStream, BackendError>;
}
