//! Stage name and status enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The four fixed stages of the article pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageName {
    /// Gathers sources and produces a research briefing.
    Researcher,
    /// Plans style and structure, emits the writer's system prompt.
    Strategist,
    /// Drafts the article from the research briefing.
    Writer,
    /// Polishes the draft into the final article.
    Editor,
}

impl StageName {
    /// All stages in execution order.
    pub const ALL: [Self; 4] = [Self::Researcher, Self::Strategist, Self::Writer, Self::Editor];

    /// The `PipelineState` field this stage populates.
    #[must_use]
    pub fn output_field(self) -> &'static str {
        match self {
            Self::Researcher => "research_data",
            Self::Strategist => "strategy",
            Self::Writer => "draft",
            Self::Editor => "final_article",
        }
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Researcher => write!(f, "researcher"),
            Self::Strategist => write!(f, "strategist"),
            Self::Writer => write!(f, "writer"),
            Self::Editor => write!(f, "editor"),
        }
    }
}

/// The lifecycle status carried by an event frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// The stage is beginning; payload is a human-readable message.
    Start,
    /// An incremental text delta.
    Streaming,
    /// The stage finished; payload is its full output.
    Complete,
    /// The run aborted during this stage.
    Error,
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::Streaming => write!(f, "streaming"),
            Self::Complete => write!(f, "complete"),
            Self::Error => write!(f, "error"),
        }
    }
}
