//! Server-sent-event framing for [`StageEvent`] streams.

use futures::stream::{Stream, StreamExt};

use crate::core::StageEvent;

/// The sentinel frame that closes every event stream.
pub const STREAM_TERMINATOR: &str = "data: [DONE]\n\n";

/// Encodes one event as an SSE `data:` frame.
///
/// The payload is a single-line JSON object, so the frame is always
/// exactly one `data:` line followed by the blank separator.
#[must_use]
pub fn frame(event: &StageEvent) -> String {
    format!("data: {}\n\n", event.to_frame())
}

/// Frames an event stream for an SSE response body.
///
/// Every event becomes one frame; after a terminal event ([`StageEvent::Done`]
/// or [`StageEvent::Error`]) the [`STREAM_TERMINATOR`] sentinel is appended
/// and the stream ends, even if the source would keep yielding.
pub fn sse_stream<S>(events: S) -> impl Stream<Item = String>
where
    S: Stream<Item = StageEvent>,
{
    async_stream::stream! {
        futures::pin_mut!(events);
        while let Some(event) = events.next().await {
            let terminal = event.is_terminal();
            yield frame(&event);
            if terminal {
                yield STREAM_TERMINATOR.to_string();
                return;
            }
        }
        // Source ended without a terminal event; still close the stream.
        yield STREAM_TERMINATOR.to_string();
    }
}
