use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::sections::SectionReport;
use crate::services::llm::{GenerationError, GenerationReply};

/// Identifies one generation request so its reply can be matched (and
/// stale replies dropped) when it comes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Everything the reactor reacts to.
#[derive(Debug, Clone)]
pub enum Event {
    /// User pressed the microphone control.
    ActivationRequested,
    /// User asked to stop the activation in flight.
    StopRequested,
    /// Lifecycle signal from the speech input adapter.
    Recognition(RecognitionSignal),
    /// A generation task finished (successfully or not).
    GenerationFinished {
        request_id: RequestId,
        result: Result<GenerationReply, GenerationError>,
    },
    /// A collaborator section handled a user action.
    SectionReported(SectionReport),
}

/// Speech input lifecycle. Per activation the adapter emits `Started`,
/// then at most one of `Result` / `Error`, then `Ended`. `Unsupported`
/// replaces the whole sequence when the platform cannot recognize speech.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionSignal {
    Unsupported,
    Started,
    Result(String),
    Error(String),
    Ended,
}
