//! Wire encodings for the pipeline's event sequence.

mod sse;

pub use sse::{frame, sse_stream, STREAM_TERMINATOR};
