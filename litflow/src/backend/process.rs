//! Process-backed generation adapter.
//!
//! Launches an external interactive agent CLI per call and parses its
//! line-delimited stream-json output into backend chunks. The child gets no
//! stdin (so it can never block waiting for input), a hard wall-clock
//! deadline, and is killed if the chunk stream is dropped mid-run.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_stream::try_stream;
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, warn};

use super::{ChunkStream, GenerationBackend};
use crate::core::BackendChunk;
use crate::errors::BackendError;

/// Configuration for the process-backed adapter.
///
/// Everything the adapter needs is passed in explicitly; it never consults
/// or mutates ambient environment state.
#[derive(Debug, Clone)]
pub struct ProcessBackendConfig {
    /// Path to the agent CLI executable.
    pub program: PathBuf,
    /// Hard wall-clock bound on one call, spawn to completion.
    pub timeout: Duration,
}

impl Default for ProcessBackendConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("claude"),
            timeout: Duration::from_secs(300),
        }
    }
}

/// Generation backend driving an external CLI agent process.
#[derive(Debug, Clone)]
pub struct ProcessBackend {
    config: ProcessBackendConfig,
}

impl ProcessBackend {
    /// Creates a new process backend.
    #[must_use]
    pub fn new(config: ProcessBackendConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl GenerationBackend for ProcessBackend {
    fn name(&self) -> &str {
        "process"
    }

    async fn stream(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
    ) -> Result<ChunkStream, BackendError> {
        let mut cmd = Command::new(&self.config.program);
        cmd.arg("-p")
            .arg(prompt)
            .args(["--output-format", "stream-json", "--verbose", "--include-partial-messages"]);
        if let Some(sys) = system_prompt {
            cmd.arg("--system-prompt").arg(sys);
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let program = self.config.program.display().to_string();
        let mut child = cmd.spawn().map_err(|source| BackendError::Spawn {
            program: program.clone(),
            source,
        })?;

        debug!(program = %program, pid = ?child.id(), "spawned generation process");

        let stdout = child.stdout.take().ok_or_else(|| BackendError::Protocol {
            detail: "child stdout was not captured".to_string(),
        })?;
        let mut stderr = child.stderr.take().ok_or_else(|| BackendError::Protocol {
            detail: "child stderr was not captured".to_string(),
        })?;

        let timeout_secs = self.config.timeout.as_secs();
        let deadline = Instant::now() + self.config.timeout;

        let stream = try_stream! {
            let mut lines = BufReader::new(stdout).lines();
            let mut accumulator = String::new();
            let mut completed = false;

            loop {
                let next = match timeout_at(deadline, lines.next_line()).await {
                    Ok(result) => result.map_err(BackendError::Io),
                    Err(_) => {
                        warn!(program = %program, timeout_secs, "generation process timed out");
                        let _ = child.start_kill();
                        Err(BackendError::Timeout { seconds: timeout_secs })
                    }
                }?;
                let Some(line) = next else { break };

                match parse_line(&line) {
                    Some(StreamLine::Delta(text)) => {
                        accumulator.push_str(&text);
                        yield BackendChunk::Delta(text);
                    }
                    Some(StreamLine::Result(result_text)) => {
                        // The accumulator wins; the result field is the
                        // fallback when no partial deltas were seen.
                        let full = if accumulator.is_empty() { result_text } else { accumulator.clone() };
                        completed = true;
                        yield BackendChunk::Complete(full);
                        break;
                    }
                    // Malformed or unrecognized lines are skipped, not errors.
                    None => {}
                }
            }

            if completed {
                if timeout_at(deadline, child.wait()).await.is_err() {
                    let _ = child.start_kill();
                }
            } else {
                let mut detail = String::new();
                let _ = timeout_at(deadline, stderr.read_to_string(&mut detail)).await;
                let _ = child.wait().await;
                let detail = detail.trim().to_string();
                let failure: Result<(), BackendError> = Err(BackendError::Protocol {
                    detail: if detail.is_empty() {
                        "process exited without a result".to_string()
                    } else {
                        detail
                    },
                });
                failure?;
            }
        };

        Ok(Box::pin(stream))
    }
}

/// A recognizable stdout line from the agent CLI.
#[derive(Debug, PartialEq, Eq)]
enum StreamLine {
    /// A partial-text event's fragment.
    Delta(String),
    /// The final-result event's text.
    Result(String),
}

/// Parses one stream-json line; `None` for anything unrecognizable.
fn parse_line(line: &str) -> Option<StreamLine> {
    let value: serde_json::Value = serde_json::from_str(line.trim()).ok()?;
    match value.get("type")?.as_str()? {
        "stream_event" => {
            let event = value.get("event")?;
            if event.get("type")?.as_str()? != "content_block_delta" {
                return None;
            }
            let delta = event.get("delta")?;
            if delta.get("type")?.as_str()? != "text_delta" {
                return None;
            }
            Some(StreamLine::Delta(delta.get("text")?.as_str()?.to_string()))
        }
        "result" => {
            let text = value
                .get("result")
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default();
            Some(StreamLine::Result(text.to_string()))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn delta_line(text: &str) -> String {
        serde_json::json!({
            "type": "stream_event",
            "event": {
                "type": "content_block_delta",
                "delta": { "type": "text_delta", "text": text },
            },
        })
        .to_string()
    }

    fn result_line(text: &str) -> String {
        serde_json::json!({ "type": "result", "result": text }).to_string()
    }

    #[test]
    fn test_parse_delta_line() {
        assert_eq!(
            parse_line(&delta_line("Hello")),
            Some(StreamLine::Delta("Hello".to_string()))
        );
    }

    #[test]
    fn test_parse_result_line() {
        assert_eq!(
            parse_line(&result_line("done")),
            Some(StreamLine::Result("done".to_string()))
        );
    }

    #[test]
    fn test_parse_skips_noise() {
        assert_eq!(parse_line("not json at all"), None);
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line(r#"{"type":"system","subtype":"init"}"#), None);
        // A stream_event that is not a text delta.
        assert_eq!(
            parse_line(
                r#"{"type":"stream_event","event":{"type":"message_start","message":{}}}"#
            ),
            None
        );
    }

    #[test]
    fn test_parse_result_without_text_field() {
        assert_eq!(
            parse_line(r#"{"type":"result"}"#),
            Some(StreamLine::Result(String::new()))
        );
    }

    #[cfg(unix)]
    mod fake_cli {
        use super::*;
        use std::io::Write;
        use std::os::unix::fs::PermissionsExt;

        /// Writes an executable shell script standing in for the agent CLI.
        fn write_script(dir: &tempfile::TempDir, body: &str) -> PathBuf {
            let path = dir.path().join("fake-agent.sh");
            let mut file = std::fs::File::create(&path).unwrap();
            writeln!(file, "#!/bin/sh").unwrap();
            file.write_all(body.as_bytes()).unwrap();
            drop(file);
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        fn backend_for(program: PathBuf, timeout: Duration) -> ProcessBackend {
            ProcessBackend::new(ProcessBackendConfig { program, timeout })
        }

        #[tokio::test]
        async fn test_accumulator_matches_concatenated_deltas() {
            let dir = tempfile::tempdir().unwrap();
            let script = format!(
                "echo '{}'\necho 'garbage line'\necho '{}'\necho '{}'\n",
                delta_line("Hello, "),
                delta_line("world"),
                result_line("ignored because accumulator is non-empty"),
            );
            let backend = backend_for(write_script(&dir, &script), Duration::from_secs(10));

            let mut chunks = backend.stream("topic", None).await.unwrap();
            let mut deltas = String::new();
            let mut complete = None;
            while let Some(chunk) = chunks.next().await {
                match chunk.unwrap() {
                    BackendChunk::Delta(text) => deltas.push_str(&text),
                    BackendChunk::Complete(text) => complete = Some(text),
                }
            }

            assert_eq!(deltas, "Hello, world");
            assert_eq!(complete.as_deref(), Some("Hello, world"));
        }

        #[tokio::test]
        async fn test_result_text_used_when_no_deltas() {
            let dir = tempfile::tempdir().unwrap();
            let script = format!("echo '{}'\n", result_line("final text"));
            let backend = backend_for(write_script(&dir, &script), Duration::from_secs(10));

            let mut chunks = backend.stream("topic", None).await.unwrap();
            let chunk = chunks.next().await.unwrap().unwrap();
            assert_eq!(chunk, BackendChunk::Complete("final text".to_string()));
            assert!(chunks.next().await.is_none());
        }

        #[tokio::test]
        async fn test_exit_without_result_surfaces_stderr() {
            let dir = tempfile::tempdir().unwrap();
            let backend = backend_for(
                write_script(&dir, "echo 'credential error' >&2\nexit 1\n"),
                Duration::from_secs(10),
            );

            let mut chunks = backend.stream("topic", None).await.unwrap();
            let err = chunks.next().await.unwrap().unwrap_err();
            match err {
                BackendError::Protocol { detail } => assert!(detail.contains("credential error")),
                other => panic!("expected protocol error, got {other:?}"),
            }
        }

        #[tokio::test]
        async fn test_deadline_expiry_is_timeout_error() {
            let dir = tempfile::tempdir().unwrap();
            let backend = backend_for(
                write_script(&dir, "sleep 30\n"),
                Duration::from_millis(200),
            );

            let mut chunks = backend.stream("topic", None).await.unwrap();
            let err = chunks.next().await.unwrap().unwrap_err();
            assert!(matches!(err, BackendError::Timeout { .. }));
        }

        #[tokio::test]
        async fn test_spawn_failure() {
            let backend = backend_for(
                PathBuf::from("/nonexistent/agent-cli"),
                Duration::from_secs(1),
            );
            let Err(err) = backend.stream("topic", None).await else {
                panic!("expected the spawn to fail");
            };
            assert!(matches!(err, BackendError::Spawn { .. }));
        }
    }
}
