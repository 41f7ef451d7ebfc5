//! Speech input and output adapters.
//!
//! A recognizer reports its lifecycle as [`RecognitionSignal`]s on the
//! session's event channel; a synthesizer speaks text fire-and-forget.

mod microphone;
mod synth;
mod text;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::kernel::event::{Event, RecognitionSignal};

pub use microphone::MicrophoneRecognizer;
pub use synth::{CommandSynthesizer, ConsoleSynthesizer};
pub use text::{TextFeed, TextRecognizer};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecognitionError {
    /// The platform has no way to recognize speech. Permanent.
    #[error("speech recognition unsupported: {0}")]
    Unsupported(String),

    /// An activation is already in flight; the request is dropped, not queued.
    #[error("an activation is already in flight")]
    Busy,

    #[error("speech recognition failed: {0}")]
    Failed(String),
}

#[derive(Debug, Error)]
#[error("speech output failed: {0}")]
pub struct SpeechError(pub String);

/// Speech input. One transcript (at most) per activation.
pub trait SpeechRecognizer: Send {
    /// Begin one activation. Signals go to `events`, in order:
    /// `Started`, then `Result` or `Error`, then `Ended`.
    fn start(&mut self, events: mpsc::Sender<Event>) -> Result<(), RecognitionError>;

    /// Abort the activation in flight. No-op when idle.
    fn stop(&mut self);
}

/// Speech output. Fire-and-forget.
pub trait SpeechSynthesizer: Send {
    fn speak(&mut self, text: &str, locale: &str) -> Result<(), SpeechError>;
}

/// Recognizer for platforms without speech recognition.
pub struct UnavailableRecognizer;

impl SpeechRecognizer for UnavailableRecognizer {
    fn start(&mut self, _events: mpsc::Sender<Event>) -> Result<(), RecognitionError> {
        Err(RecognitionError::Unsupported("no recognizer configured".to_string()))
    }

    fn stop(&mut self) {}
}

/// Bookkeeping shared by recognizers: whether an activation is in flight
/// and the token that aborts it.
#[derive(Default)]
struct Activation {
    busy: Arc<AtomicBool>,
    cancel: Option<CancellationToken>,
}

impl Activation {
    fn begin(&mut self) -> Result<(CancellationToken, Arc<AtomicBool>), RecognitionError> {
        if self.busy.swap(true, Ordering::SeqCst) {
            return Err(RecognitionError::Busy);
        }
        let token = CancellationToken::new();
        self.cancel = Some(token.clone());
        Ok((token, self.busy.clone()))
    }

    fn cancel(&mut self) {
        if !self.busy.load(Ordering::SeqCst) {
            return;
        }
        if let Some(token) = &self.cancel {
            token.cancel();
        }
    }
}

async fn emit(events: &mpsc::Sender<Event>, signal: RecognitionSignal) {
    if events.send(Event::Recognition(signal)).await.is_err() {
        tracing::debug!("session gone; dropping recognition signal");
    }
}

/// Close an activation: free the adapter, then report `Ended`.
async fn finish(events: &mpsc::Sender<Event>, busy: &AtomicBool) {
    busy.store(false, Ordering::SeqCst);
    emit(events, RecognitionSignal::Ended).await;
}
