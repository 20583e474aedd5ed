use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmitError {
    #[error("message {index} unavailable: {reason}")]
    SourceFailed { index: usize, reason: String },

    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Supplies the text of each step of a progress stream.
///
/// The length is fixed up front so progress can be computed for every step;
/// individual lookups may still fail while the stream is running.
pub trait MessageSource: Send + 'static {
    fn len(&self) -> usize;

    fn message(&mut self, index: usize) -> Result<String, EmitError>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A fixed list of messages, usually taken from `[stream] messages`.
#[derive(Debug, Clone)]
pub struct StaticMessages(Vec<String>);

impl StaticMessages {
    pub fn new(messages: Vec<String>) -> Self {
        Self(messages)
    }
}

impl MessageSource for StaticMessages {
    fn len(&self) -> usize {
        self.0.len()
    }

    fn message(&mut self, index: usize) -> Result<String, EmitError> {
        self.0.get(index).cloned().ok_or(EmitError::SourceFailed {
            index,
            reason: "index out of range".to_string(),
        })
    }
}
