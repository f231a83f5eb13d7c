//! Scripted mock backends and search providers.

use async_stream::stream;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::backend::{ChunkStream, GenerationBackend};
use crate::core::BackendChunk;
use crate::errors::{BackendError, SearchError};
use crate::websearch::{SearchItem, SearchProvider};

/// One recorded backend invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// The prompt the stage sent.
    pub prompt: String,
    /// The system prompt, if any.
    pub system_prompt: Option<String>,
}

/// How a [`MockBackend`] misbehaves, if at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailureMode {
    None,
    /// `stream()` itself fails, as a spawn/connect error would.
    OnStart,
    /// The chunk stream yields an error after its deltas, before `Complete`.
    MidStream,
    /// The chunk stream ends without ever yielding `Complete`.
    MissingComplete,
}

/// A scripted generation backend.
///
/// Responses are consumed in order; the last response repeats once the
/// script is exhausted. Each response is streamed as word-sized deltas
/// followed by one `Complete` chunk, mirroring a well-behaved adapter.
pub struct MockBackend {
    responses: Mutex<VecDeque<String>>,
    last_response: Mutex<String>,
    calls: Mutex<Vec<RecordedCall>>,
    call_count: AtomicUsize,
    failure: FailureMode,
    drop_flag: Mutex<Option<Arc<AtomicBool>>>,
}

impl MockBackend {
    /// A backend that always streams `response`.
    #[must_use]
    pub fn with_response(response: impl Into<String>) -> Self {
        Self::with_responses(vec![response.into()])
    }

    /// A backend that streams `responses` in order, repeating the last.
    #[must_use]
    pub fn with_responses(responses: Vec<String>) -> Self {
        let last = responses.last().cloned().unwrap_or_default();
        Self {
            responses: Mutex::new(responses.into()),
            last_response: Mutex::new(last),
            calls: Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
            failure: FailureMode::None,
            drop_flag: Mutex::new(None),
        }
    }

    /// A backend whose `stream()` call fails outright.
    #[must_use]
    pub fn failing_on_start() -> Self {
        Self {
            failure: FailureMode::OnStart,
            ..Self::with_responses(Vec::new())
        }
    }

    /// A backend that yields its deltas, then an error instead of `Complete`.
    #[must_use]
    pub fn failing_mid_stream(response: impl Into<String>) -> Self {
        Self {
            failure: FailureMode::MidStream,
            ..Self::with_response(response)
        }
    }

    /// A misbehaving backend whose stream ends without a `Complete` chunk.
    #[must_use]
    pub fn without_complete(response: impl Into<String>) -> Self {
        Self {
            failure: FailureMode::MissingComplete,
            ..Self::with_response(response)
        }
    }

    /// Sets a flag that flips to `true` when a produced stream is dropped,
    /// for asserting resource release on cancellation.
    pub fn set_drop_flag(&self, flag: Arc<AtomicBool>) {
        *self.drop_flag.lock() = Some(flag);
    }

    /// How many times `stream()` was invoked.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// All recorded invocations, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    fn next_response(&self) -> String {
        let mut responses = self.responses.lock();
        match responses.pop_front() {
            Some(response) => {
                *self.last_response.lock() = response.clone();
                response
            }
            None => self.last_response.lock().clone(),
        }
    }
}

/// Flips a shared flag when dropped; stands in for resource release.
struct ReleaseOnDrop(Arc<AtomicBool>);

impl Drop for ReleaseOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl GenerationBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn stream(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
    ) -> Result<ChunkStream, BackendError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().push(RecordedCall {
            prompt: prompt.to_string(),
            system_prompt: system_prompt.map(str::to_string),
        });

        if self.failure == FailureMode::OnStart {
            return Err(BackendError::Spawn {
                program: "mock".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "injected"),
            });
        }

        let response = self.next_response();
        let deltas: Vec<String> = response.split_inclusive(' ').map(str::to_string).collect();
        let failure = self.failure;
        let guard = self.drop_flag.lock().clone().map(ReleaseOnDrop);

        let stream = stream! {
            let _guard = guard;
            for delta in deltas {
                yield Ok(BackendChunk::Delta(delta));
            }
            match failure {
                FailureMode::MidStream => {
                    yield Err(BackendError::Protocol {
                        detail: "injected mid-stream failure".to_string(),
                    });
                }
                FailureMode::MissingComplete => {}
                _ => yield Ok(BackendChunk::Complete(response)),
            }
        };

        Ok(Box::pin(stream))
    }
}

/// A search provider returning a fixed result list.
pub struct StaticSearchProvider {
    items: Vec<SearchItem>,
}

impl StaticSearchProvider {
    /// Creates a provider that always returns `items`.
    #[must_use]
    pub fn new(items: Vec<SearchItem>) -> Self {
        Self { items }
    }
}

#[async_trait]
impl SearchProvider for StaticSearchProvider {
    async fn search(
        &self,
        _query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchItem>, SearchError> {
        Ok(self.items.iter().take(max_results).cloned().collect())
    }
}

/// A search provider that always fails.
pub struct FailingSearchProvider;

#[async_trait]
impl SearchProvider for FailingSearchProvider {
    async fn search(
        &self,
        _query: &str,
        _max_results: usize,
    ) -> Result<Vec<SearchItem>, SearchError> {
        Err(SearchError::Unavailable {
            reason: "injected".to_string(),
        })
    }
}
