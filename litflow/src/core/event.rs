//! Stage events, the single ordered sequence observed by clients.

use serde_json::json;

use super::{StageName, StageStatus};

/// An event on the pipeline's multiplexed output sequence.
///
/// For a given stage the order is strictly `Start`, zero or more
/// `Streaming`, then `Complete`; stages never interleave. A successful run
/// ends with one `Done`; an aborted run ends with one `Error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageEvent {
    /// A stage is beginning.
    Start {
        /// The stage.
        stage: StageName,
        /// Human-readable progress message.
        message: String,
    },
    /// An incremental fragment of the stage's output.
    Streaming {
        /// The stage.
        stage: StageName,
        /// The text fragment.
        delta: String,
    },
    /// A stage finished with its full output.
    Complete {
        /// The stage.
        stage: StageName,
        /// The complete stage output.
        content: String,
    },
    /// The whole run finished.
    Done {
        /// The polished article from the editor stage.
        final_article: String,
    },
    /// The run aborted; this is always the last event.
    Error {
        /// The stage whose backend failed.
        stage: StageName,
        /// Failure description.
        error: String,
    },
}

impl StageEvent {
    /// The stage this event belongs to, if any (`Done` has none).
    #[must_use]
    pub fn stage(&self) -> Option<StageName> {
        match self {
            Self::Start { stage, .. }
            | Self::Streaming { stage, .. }
            | Self::Complete { stage, .. }
            | Self::Error { stage, .. } => Some(*stage),
            Self::Done { .. } => None,
        }
    }

    /// The lifecycle status carried on the wire, if any.
    #[must_use]
    pub fn status(&self) -> Option<StageStatus> {
        match self {
            Self::Start { .. } => Some(StageStatus::Start),
            Self::Streaming { .. } => Some(StageStatus::Streaming),
            Self::Complete { .. } => Some(StageStatus::Complete),
            Self::Error { .. } => Some(StageStatus::Error),
            Self::Done { .. } => None,
        }
    }

    /// Whether this event terminates the sequence.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Error { .. })
    }

    /// Serializes the event into its wire frame.
    ///
    /// Frame shapes:
    /// `{"stage", "status": "start", "message"}`,
    /// `{"stage", "status": "streaming", "delta"}`,
    /// `{"stage", "status": "complete", "content"}`,
    /// `{"stage": "done", "final_article"}`,
    /// `{"stage", "status": "error", "error"}`.
    #[must_use]
    pub fn to_frame(&self) -> serde_json::Value {
        match self {
            Self::Start { stage, message } => json!({
                "stage": stage,
                "status": StageStatus::Start,
                "message": message,
            }),
            Self::Streaming { stage, delta } => json!({
                "stage": stage,
                "status": StageStatus::Streaming,
                "delta": delta,
            }),
            Self::Complete { stage, content } => json!({
                "stage": stage,
                "status": StageStatus::Complete,
                "content": content,
            }),
            Self::Done { final_article } => json!({
                "stage": "done",
                "final_article": final_article,
            }),
            Self::Error { stage, error } => json!({
                "stage": stage,
                "status": StageStatus::Error,
                "error": error,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_frame() {
        let event = StageEvent::Start {
            stage: StageName::Researcher,
            message: "Searching the web...".to_string(),
        };
        let frame = event.to_frame();
        assert_eq!(frame["stage"], "researcher");
        assert_eq!(frame["status"], "start");
        assert_eq!(frame["message"], "Searching the web...");
    }

    #[test]
    fn test_streaming_frame() {
        let event = StageEvent::Streaming {
            stage: StageName::Writer,
            delta: "Once".to_string(),
        };
        let frame = event.to_frame();
        assert_eq!(frame["stage"], "writer");
        assert_eq!(frame["status"], "streaming");
        assert_eq!(frame["delta"], "Once");
        assert!(frame.get("content").is_none());
    }

    #[test]
    fn test_done_frame_has_no_status() {
        let event = StageEvent::Done {
            final_article: "The article.".to_string(),
        };
        let frame = event.to_frame();
        assert_eq!(frame["stage"], "done");
        assert_eq!(frame["final_article"], "The article.");
        assert!(frame.get("status").is_none());
    }

    #[test]
    fn test_error_frame() {
        let event = StageEvent::Error {
            stage: StageName::Editor,
            error: "backend timed out after 300s".to_string(),
        };
        let frame = event.to_frame();
        assert_eq!(frame["stage"], "editor");
        assert_eq!(frame["status"], "error");
        assert!(frame["error"].as_str().unwrap().contains("timed out"));
    }

    #[test]
    fn test_terminal_classification() {
        assert!(StageEvent::Done { final_article: String::new() }.is_terminal());
        assert!(StageEvent::Error {
            stage: StageName::Researcher,
            error: String::new()
        }
        .is_terminal());
        assert!(!StageEvent::Start {
            stage: StageName::Researcher,
            message: String::new()
        }
        .is_terminal());
    }

    #[test]
    fn test_stage_and_status_accessors() {
        let event = StageEvent::Complete {
            stage: StageName::Strategist,
            content: "plan".to_string(),
        };
        assert_eq!(event.stage(), Some(StageName::Strategist));
        assert_eq!(event.status(), Some(StageStatus::Complete));

        let done = StageEvent::Done { final_article: String::new() };
        assert_eq!(done.stage(), None);
        assert_eq!(done.status(), None);
    }
}
