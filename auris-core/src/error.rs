use thiserror::Error;

/// Input rejected before any scoring happened.
///
/// Format checks run once, up front, never mid-scan.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("unsupported sample rate {actual} Hz (the detector requires {expected} Hz mono f32)")]
    SampleRate { expected: u32, actual: u32 },

    #[error("window size must be non-zero")]
    ZeroWindow,
}

/// The scorer backend failed to produce a probability for a window.
#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("model file not found: {path}")]
    ModelNotFound { path: std::path::PathBuf },

    #[error("ONNX session error: {0}")]
    OnnxSession(String),

    #[error("scorer output malformed: {0}")]
    MalformedOutput(String),
}

/// All errors surfaced at the public detection boundary.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("rejected input: {0}")]
    Format(#[from] FormatError),

    /// A scoring failure aborts the whole scan with no partial results: a
    /// skipped recurrent-state update would silently desynchronize every
    /// later score. Callers must `reset_state()` before retrying.
    #[error("window scoring failed: {0}")]
    Scoring(#[from] ScoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, DetectError>;
