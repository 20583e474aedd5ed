//! Terminal consumer for a progress SSE stream.
//!
//! [`app::StreamController`] owns the stream state machine and the display
//! log, [`client::StreamHandle`] reads the HTTP body on a background task,
//! and [`ui`] draws both.

pub mod app;
pub mod client;
pub mod endpoint;
pub mod settings;
pub mod ui;
