//! Prompt builders for the four article stages.
//!
//! One builder per stage, shared verbatim by the streaming and synchronous
//! entry points.

use async_trait::async_trait;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::warn;

use super::{extract_section, PromptBuilder, StagePrompt, WRITER_PROMPT_MARKER};
use crate::core::{PipelineState, StageName};
use crate::websearch::{fallback_context, SearchProvider};

/// Builds the researcher prompt from live search results.
///
/// Search failures are recovered here: the prompt falls back to a fixed
/// "model knowledge only" context and the run continues.
pub struct ResearchPromptBuilder {
    search: Arc<dyn SearchProvider>,
    max_results: usize,
}

impl ResearchPromptBuilder {
    /// Creates a research builder over `search`, keeping the top five hits.
    #[must_use]
    pub fn new(search: Arc<dyn SearchProvider>) -> Self {
        Self {
            search,
            max_results: 5,
        }
    }
}

#[async_trait]
impl PromptBuilder for ResearchPromptBuilder {
    async fn build(&self, state: &PipelineState) -> StagePrompt {
        let (context, notice) = match self.search.search(&state.topic, self.max_results).await {
            Ok(items) => {
                let mut listing = String::new();
                for (idx, item) in items.iter().enumerate() {
                    let _ = writeln!(listing, "[{}] {}", idx + 1, item.title);
                }
                let notice = format!(
                    "Found {} sources:\n{listing}\nAnalyzing sources...\n",
                    items.len()
                );
                let context =
                    serde_json::to_string(&items).unwrap_or_else(|_| fallback_context(&state.topic));
                (context, notice)
            }
            Err(error) => {
                warn!(%error, topic = %state.topic, "web search failed, using fallback context");
                (
                    fallback_context(&state.topic),
                    "Web search failed, falling back to internal knowledge...\n".to_string(),
                )
            }
        };

        StagePrompt::new(format!(
            "You are a senior research analyst.\n\
             Topic: '{}'\n\n\
             Use the search results below as references (ignore if empty):\n\
             {context}\n\n\
             Produce a concise research briefing covering:\n\
             1. Key facts and history\n\
             2. Future implications\n\
             3. Deeper or philosophical angles\n\
             4. Cited sources (if any)\n\n\
             Keep it under 300 words.",
            state.topic
        ))
        .with_notice(notice)
    }
}

/// Builds the strategist prompt from the research briefing.
pub struct StrategyPromptBuilder;

#[async_trait]
impl PromptBuilder for StrategyPromptBuilder {
    async fn build(&self, state: &PipelineState) -> StagePrompt {
        let research = state.output(StageName::Researcher).unwrap_or_default();
        StagePrompt::new(format!(
            "You are a literary strategist.\n\
             Based on this research briefing:\n\
             {research}\n\n\
             First, decide the strategy:\n\
             1. Style: e.g. poetic and melancholic, sharp and critical, visionary and optimistic.\n\
             2. Structure: e.g. hero's journey, SCQA, golden circle.\n\
             3. Rationale: which aspect of the research drives these choices.\n\n\
             Then output a system prompt for the writer. It must contain concrete style\n\
             and structure directives plus a requirement to use metaphor and sensory\n\
             detail — nothing else.\n\n\
             Use exactly this format:\n\
             [STRATEGY]\n\
             ...style, structure, and rationale...\n\n\
             {WRITER_PROMPT_MARKER}\n\
             ...the writer's system prompt..."
        ))
    }
}

/// Builds the writer prompt; its system prompt is extracted from the
/// strategist output via the marker policy.
pub struct WriterPromptBuilder;

#[async_trait]
impl PromptBuilder for WriterPromptBuilder {
    async fn build(&self, state: &PipelineState) -> StagePrompt {
        let research = state.output(StageName::Researcher).unwrap_or_default();
        let strategy = state.output(StageName::Strategist).unwrap_or_default();
        let system_prompt = extract_section(strategy, WRITER_PROMPT_MARKER);

        StagePrompt::new(format!(
            "Write an article from the material below:\n\
             {research}\n\n\
             Write with grace and conviction. The finished piece must run between\n\
             1000 and 1500 words; develop the argument fully and favor concrete detail.\n\n\
             Begin now."
        ))
        .with_system_prompt(system_prompt)
    }
}

/// Builds the editor prompt from the draft.
pub struct EditorPromptBuilder;

#[async_trait]
impl PromptBuilder for EditorPromptBuilder {
    async fn build(&self, state: &PipelineState) -> StagePrompt {
        let draft = state.output(StageName::Writer).unwrap_or_default();
        StagePrompt::new(format!(
            "You are a masterful editor known for poetic, resonant prose.\n\
             Polish this draft:\n\
             {draft}\n\n\
             Rules:\n\
             1. Elevate the vocabulary with more expressive, literary word choices.\n\
             2. Fix flow and rhythm so the piece reads musically.\n\
             3. Add fine-grained sensory detail and genuine emotional resonance.\n\
             4. Keep the length close to the original — trim if long, expand if short.\n\
             5. Preserve every core argument and its supporting evidence.\n\n\
             Output only the final polished version."
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingSearchProvider, StaticSearchProvider};
    use crate::websearch::SearchItem;

    fn state_with(topic: &str, outputs: &[(StageName, &str)]) -> PipelineState {
        let mut state = PipelineState::new(topic);
        for (stage, text) in outputs {
            state.set_output(*stage, (*text).to_string());
        }
        state
    }

    #[tokio::test]
    async fn test_research_prompt_includes_results() {
        let search = Arc::new(StaticSearchProvider::new(vec![
            SearchItem::new("Tidal power today", "https://example.com/a"),
            SearchItem::new("Turbine economics", "https://example.com/b"),
        ]));
        let builder = ResearchPromptBuilder::new(search);
        let prompt = builder.build(&PipelineState::new("tidal power")).await;

        assert!(prompt.prompt.contains("tidal power"));
        assert!(prompt.prompt.contains("Tidal power today"));
        let notice = prompt.notice.unwrap();
        assert!(notice.contains("Found 2 sources"));
        assert!(notice.contains("[1] Tidal power today"));
        assert!(prompt.system_prompt.is_none());
    }

    #[tokio::test]
    async fn test_research_prompt_degrades_on_search_failure() {
        let builder = ResearchPromptBuilder::new(Arc::new(FailingSearchProvider));
        let prompt = builder.build(&PipelineState::new("XYZ")).await;

        assert!(prompt.prompt.contains("model knowledge only"));
        assert!(prompt.prompt.contains("XYZ"));
        assert!(prompt.notice.unwrap().contains("falling back"));
    }

    #[tokio::test]
    async fn test_strategy_prompt_embeds_research_and_marker() {
        let state = state_with("t", &[(StageName::Researcher, "the briefing text")]);
        let prompt = StrategyPromptBuilder.build(&state).await;

        assert!(prompt.prompt.contains("the briefing text"));
        assert!(prompt.prompt.contains(WRITER_PROMPT_MARKER));
        assert!(prompt.system_prompt.is_none());
    }

    #[tokio::test]
    async fn test_writer_prompt_extracts_system_prompt_from_marker() {
        let strategy = format!("[STRATEGY]\nplan\n\n{WRITER_PROMPT_MARKER}\nWrite like the sea.");
        let state = state_with(
            "t",
            &[
                (StageName::Researcher, "briefing"),
                (StageName::Strategist, &strategy),
            ],
        );
        let prompt = WriterPromptBuilder.build(&state).await;

        assert!(prompt.prompt.contains("briefing"));
        assert_eq!(prompt.system_prompt.as_deref(), Some("Write like the sea."));
    }

    #[tokio::test]
    async fn test_writer_prompt_falls_back_to_full_strategy() {
        let state = state_with(
            "t",
            &[
                (StageName::Researcher, "briefing"),
                (StageName::Strategist, "  free-form plan without the marker  "),
            ],
        );
        let prompt = WriterPromptBuilder.build(&state).await;
        assert_eq!(
            prompt.system_prompt.as_deref(),
            Some("free-form plan without the marker")
        );
    }

    #[tokio::test]
    async fn test_editor_prompt_embeds_draft() {
        let state = state_with("t", &[(StageName::Writer, "the rough draft")]);
        let prompt = EditorPromptBuilder.build(&state).await;

        assert!(prompt.prompt.contains("the rough draft"));
        assert!(prompt.prompt.contains("Output only the final polished version."));
        assert!(prompt.system_prompt.is_none());
    }
}
