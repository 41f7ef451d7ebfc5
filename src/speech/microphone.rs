use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use super::{emit, finish, Activation, RecognitionError, SpeechRecognizer};
use crate::audio::capture::input_available;
use crate::audio::{capture_utterance, samples_to_wav, CaptureSettings, Utterance, TRANSCRIPTION_RATE};
use crate::config::RecognitionConfig;
use crate::kernel::event::{Event, RecognitionSignal};
use crate::services::transcription::Transcriber;

/// Default microphone, endpointed locally, transcribed remotely.
pub struct MicrophoneRecognizer {
    transcriber: Arc<Transcriber>,
    settings: CaptureSettings,
    activation: Activation,
}

impl MicrophoneRecognizer {
    pub fn new(transcriber: Transcriber, config: &RecognitionConfig) -> Self {
        Self {
            transcriber: Arc::new(transcriber),
            settings: CaptureSettings::from(config),
            activation: Activation::default(),
        }
    }
}

impl SpeechRecognizer for MicrophoneRecognizer {
    fn start(&mut self, events: mpsc::Sender<Event>) -> Result<(), RecognitionError> {
        if !input_available() {
            return Err(RecognitionError::Unsupported("no input device available".to_string()));
        }

        let (cancel, busy) = self.activation.begin()?;
        let transcriber = self.transcriber.clone();
        let settings = self.settings;

        tokio::spawn(async move {
            emit(&events, RecognitionSignal::Started).await;

            let capture_cancel = cancel.clone();
            let captured = tokio::task::spawn_blocking(move || capture_utterance(&settings, &capture_cancel)).await;

            let outcome = match captured {
                Ok(Ok(Utterance::Speech(samples))) => {
                    match samples_to_wav(&samples, TRANSCRIPTION_RATE) {
                        Ok(wav) => {
                            tokio::select! {
                                result = transcriber.transcribe(wav) => match result {
                                    Ok(text) if text.is_empty() => Some(Err("no-speech")),
                                    Ok(text) => Some(Ok(text)),
                                    Err(e) => {
                                        warn!(error = %e, "transcription failed");
                                        Some(Err("network"))
                                    }
                                },
                                _ = cancel.cancelled() => None,
                            }
                        }
                        Err(e) => {
                            warn!(error = %e, "could not encode utterance");
                            Some(Err("audio-capture"))
                        }
                    }
                }
                Ok(Ok(Utterance::NoSpeech)) => Some(Err("no-speech")),
                Ok(Ok(Utterance::Cancelled)) => None,
                Ok(Err(e)) => {
                    warn!(error = %e, "microphone capture failed");
                    Some(Err("audio-capture"))
                }
                Err(e) => {
                    warn!(error = %e, "capture task panicked");
                    Some(Err("audio-capture"))
                }
            };

            match outcome {
                Some(Ok(text)) => emit(&events, RecognitionSignal::Result(text)).await,
                Some(Err(code)) => emit(&events, RecognitionSignal::Error(code.to_string())).await,
                None => info!("microphone activation aborted"),
            }

            finish(&events, &busy).await;
        });

        Ok(())
    }

    fn stop(&mut self) {
        self.activation.cancel();
    }
}
