mod sse;

pub use sse::{SseStreamBuilder, handle_progress_stream};
