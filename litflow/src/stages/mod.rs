//! Stage definitions, pure descriptions of each pipeline step.
//!
//! A [`StageDefinition`] names its stage, owns the backend adapter handle,
//! and builds prompts from prior outputs. Definitions are immutable once the
//! pipeline is assembled and are shared by the streaming and non-streaming
//! surfaces, so the two cannot diverge.

mod extract;
mod prompts;

pub use extract::{extract_section, WRITER_PROMPT_MARKER};
pub use prompts::{
    EditorPromptBuilder, ResearchPromptBuilder, StrategyPromptBuilder, WriterPromptBuilder,
};

use async_trait::async_trait;
use std::sync::Arc;

use crate::backend::GenerationBackend;
use crate::core::{PipelineState, StageName};

/// The prompt pair a stage sends to its backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagePrompt {
    /// The user prompt.
    pub prompt: String,
    /// Optional system prompt.
    pub system_prompt: Option<String>,
    /// Optional progress notice, emitted as a streaming delta before the
    /// backend call (the research stage reports its source list this way).
    pub notice: Option<String>,
}

impl StagePrompt {
    /// Creates a prompt with no system prompt or notice.
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_prompt: None,
            notice: None,
        }
    }

    /// Sets the system prompt.
    #[must_use]
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    /// Sets the progress notice.
    #[must_use]
    pub fn with_notice(mut self, notice: impl Into<String>) -> Self {
        self.notice = Some(notice.into());
        self
    }
}

/// Builds a stage's prompt from the accumulated pipeline state.
///
/// May post-process prior outputs (marker extraction) or consult external
/// collaborators (the research builder's search call), but never a backend.
#[async_trait]
pub trait PromptBuilder: Send + Sync {
    /// Builds the prompt pair for the current state.
    async fn build(&self, state: &PipelineState) -> StagePrompt;
}

/// One step of the fixed pipeline.
#[derive(Clone)]
pub struct StageDefinition {
    name: StageName,
    start_message: String,
    backend: Arc<dyn GenerationBackend>,
    prompt_builder: Arc<dyn PromptBuilder>,
}

impl StageDefinition {
    /// Creates a stage definition.
    #[must_use]
    pub fn new(
        name: StageName,
        start_message: impl Into<String>,
        backend: Arc<dyn GenerationBackend>,
        prompt_builder: Arc<dyn PromptBuilder>,
    ) -> Self {
        Self {
            name,
            start_message: start_message.into(),
            backend,
            prompt_builder,
        }
    }

    /// The stage this definition describes.
    #[must_use]
    pub fn name(&self) -> StageName {
        self.name
    }

    /// The human-readable message for the stage's `start` event.
    #[must_use]
    pub fn start_message(&self) -> &str {
        &self.start_message
    }

    /// The backend adapter this stage runs on.
    #[must_use]
    pub fn backend(&self) -> &Arc<dyn GenerationBackend> {
        &self.backend
    }

    /// Builds the stage's prompt from the current state.
    pub async fn build_prompt(&self, state: &PipelineState) -> StagePrompt {
        self.prompt_builder.build(state).await
    }
}

impl std::fmt::Debug for StageDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageDefinition")
            .field("name", &self.name)
            .field("backend", &self.backend.name())
            .finish()
    }
}
