//! Sequential stage execution over a shared [`PipelineState`].

use std::sync::Arc;

use async_stream::try_stream;
use futures::stream::{BoxStream, StreamExt};
use uuid::Uuid;

use crate::backend::GenerationBackend;
use crate::core::{BackendChunk, PipelineState, StageEvent, StageName};
use crate::errors::{BackendError, PipelineError};
use crate::stages::{
    EditorPromptBuilder, ResearchPromptBuilder, StageDefinition, StrategyPromptBuilder,
    WriterPromptBuilder,
};
use crate::websearch::SearchProvider;

/// An ordered sequence of stages executed one after another.
///
/// Each stage's committed output is written into the shared
/// [`PipelineState`] before the next stage builds its prompt, so later
/// stages always observe the full transcript of earlier ones. A stage
/// failure aborts the remainder of the sequence without committing any
/// partial output.
pub struct Pipeline {
    stages: Vec<StageDefinition>,
}

impl Pipeline {
    /// Builds a pipeline from an explicit stage list.
    #[must_use]
    pub fn new(stages: Vec<StageDefinition>) -> Self {
        Self { stages }
    }

    /// Assembles the standard four-stage article pipeline.
    ///
    /// Research and strategy run on `agent_backend`; drafting and
    /// editing run on `completion_backend`. The research stage consults
    /// `search` before prompting and degrades to model knowledge when
    /// the provider fails.
    #[must_use]
    pub fn article(
        agent_backend: Arc<dyn GenerationBackend>,
        completion_backend: Arc<dyn GenerationBackend>,
        search: Arc<dyn SearchProvider>,
    ) -> Self {
        Self::new(vec![
            StageDefinition::new(
                StageName::Researcher,
                "Researching the topic...",
                Arc::clone(&agent_backend),
                Arc::new(ResearchPromptBuilder::new(search)),
            ),
            StageDefinition::new(
                StageName::Strategist,
                "Planning the article strategy...",
                agent_backend,
                Arc::new(StrategyPromptBuilder),
            ),
            StageDefinition::new(
                StageName::Writer,
                "Writing the first draft...",
                Arc::clone(&completion_backend),
                Arc::new(WriterPromptBuilder),
            ),
            StageDefinition::new(
                StageName::Editor,
                "Polishing the final article...",
                completion_backend,
                Arc::new(EditorPromptBuilder),
            ),
        ])
    }

    /// The stages in execution order.
    #[must_use]
    pub fn stages(&self) -> &[StageDefinition] {
        &self.stages
    }

    /// Runs the pipeline, yielding every event in order.
    ///
    /// This is the canonical execution path: both [`Pipeline::stream`]
    /// and [`Pipeline::run`] fold this one generator, so the two
    /// surfaces cannot diverge in prompt construction or backend
    /// selection. The first `Err` item is terminal; no further items
    /// follow it. Dropping the returned stream cancels the in-flight
    /// stage and releases its backend resources.
    pub fn events(&self, topic: &str) -> BoxStream<'static, Result<StageEvent, PipelineError>> {
        let stages = self.stages.clone();
        let topic = topic.to_owned();
        let run_id = Uuid::new_v4();

        try_stream! {
            let mut state = PipelineState::new(&topic);
            tracing::info!(%run_id, topic = %state.topic, stages = stages.len(), "pipeline started");

            let mut final_article = String::new();
            for stage in &stages {
                let name = stage.name();
                tracing::debug!(%run_id, stage = %name, "stage started");
                yield StageEvent::Start {
                    stage: name,
                    message: stage.start_message().to_owned(),
                };

                let prompt = stage.build_prompt(&state).await;
                if let Some(notice) = prompt.notice {
                    yield StageEvent::Streaming { stage: name, delta: notice };
                }

                let mut chunks = stage
                    .backend()
                    .stream(&prompt.prompt, prompt.system_prompt.as_deref())
                    .await
                    .map_err(|source| PipelineError::Backend { stage: name, source })?;

                let mut committed = None;
                while let Some(chunk) = chunks.next().await {
                    let chunk =
                        chunk.map_err(|source| PipelineError::Backend { stage: name, source })?;
                    match chunk {
                        BackendChunk::Delta(delta) => {
                            yield StageEvent::Streaming { stage: name, delta };
                        }
                        BackendChunk::Complete(content) => {
                            committed = Some(content);
                            break;
                        }
                    }
                }
                let content = committed.ok_or(PipelineError::Backend {
                    stage: name,
                    source: BackendError::Protocol {
                        detail: "stream ended without a completion chunk".to_owned(),
                    },
                })?;

                tracing::debug!(%run_id, stage = %name, chars = content.len(), "stage completed");
                state.set_output(name, content.clone());
                final_article.clone_from(&content);
                yield StageEvent::Complete { stage: name, content };
            }

            tracing::info!(%run_id, chars = final_article.len(), "pipeline completed");
            yield StageEvent::Done { final_article };
        }
        .boxed()
    }

    /// Runs the pipeline as an infallible event stream.
    ///
    /// Identical to [`Pipeline::events`] except that a failure becomes
    /// a terminal [`StageEvent::Error`] item instead of an `Err`, which
    /// is the shape wire transports want.
    pub fn stream(&self, topic: &str) -> BoxStream<'static, StageEvent> {
        let mut events = self.events(topic);
        async_stream::stream! {
            while let Some(event) = events.next().await {
                match event {
                    Ok(event) => yield event,
                    Err(err) => {
                        let stage = err.stage();
                        tracing::error!(stage = %stage, error = %err, "pipeline failed");
                        yield StageEvent::Error { stage, error: err.to_string() };
                        return;
                    }
                }
            }
        }
        .boxed()
    }

    /// Runs the pipeline to completion without streaming.
    ///
    /// Folds the event sequence into the final [`PipelineState`]. The
    /// returned state holds every stage's committed output.
    pub async fn run(&self, topic: &str) -> Result<PipelineState, PipelineError> {
        let mut state = PipelineState::new(topic);
        let mut events = self.events(topic);
        while let Some(event) = events.next().await {
            match event? {
                StageEvent::Complete { stage, content } => state.set_output(stage, content),
                StageEvent::Done { .. } | StageEvent::Start { .. } | StageEvent::Streaming { .. } => {}
                StageEvent::Error { .. } => unreachable!("events() reports failures as Err"),
            }
        }
        Ok(state)
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.stages.iter().map(StageDefinition::name).collect();
        f.debug_struct("Pipeline").field("stages", &names).finish()
    }
}
