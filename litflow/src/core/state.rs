//! Per-run pipeline state.

use serde::{Deserialize, Serialize};

use super::StageName;

/// The accumulated outputs of one pipeline run.
///
/// A stage's field is `None` until that stage has completed. The sequencer
/// is the only writer; one instance exists per request and is discarded when
/// the response closes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineState {
    /// The topic the run was invoked with.
    pub topic: String,
    /// Research briefing produced by the researcher stage.
    pub research_data: Option<String>,
    /// Strategy text produced by the strategist stage.
    pub strategy: Option<String>,
    /// Article draft produced by the writer stage.
    pub draft: Option<String>,
    /// Polished article produced by the editor stage.
    pub final_article: Option<String>,
}

impl PipelineState {
    /// Creates fresh state for a run on `topic`.
    #[must_use]
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            ..Self::default()
        }
    }

    /// Commits a completed stage's output.
    pub fn set_output(&mut self, stage: StageName, text: String) {
        match stage {
            StageName::Researcher => self.research_data = Some(text),
            StageName::Strategist => self.strategy = Some(text),
            StageName::Writer => self.draft = Some(text),
            StageName::Editor => self.final_article = Some(text),
        }
    }

    /// The output of `stage`, if it has completed.
    #[must_use]
    pub fn output(&self, stage: StageName) -> Option<&str> {
        match stage {
            StageName::Researcher => self.research_data.as_deref(),
            StageName::Strategist => self.strategy.as_deref(),
            StageName::Writer => self.draft.as_deref(),
            StageName::Editor => self.final_article.as_deref(),
        }
    }

    /// Whether every stage has committed an output.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        StageName::ALL.iter().all(|s| self.output(*s).is_some())
    }

    /// Converts the state into the synchronous response shape.
    #[must_use]
    pub fn into_response(self) -> GenerateResponse {
        GenerateResponse {
            status: "completed".to_string(),
            final_article: self.final_article,
            research_data: self.research_data,
            strategy: self.strategy,
            draft: self.draft,
        }
    }
}

/// The single synchronous response returned by the non-streaming surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// Run outcome, `"completed"` on success.
    pub status: String,
    /// The polished article.
    pub final_article: Option<String>,
    /// The research briefing.
    pub research_data: Option<String>,
    /// The strategist's output.
    pub strategy: Option<String>,
    /// The unedited draft.
    pub draft: Option<String>,
}
