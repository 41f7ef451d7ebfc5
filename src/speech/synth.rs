use tokio::process::Command;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use super::{SpeechError, SpeechSynthesizer};
use crate::config::SynthesisConfig;

/// Speaks through an external TTS program (`espeak-ng`, `say`, ...).
/// A new utterance interrupts the previous one.
pub struct CommandSynthesizer {
    program: String,
    args: Vec<String>,
    current: Option<oneshot::Sender<()>>,
}

impl CommandSynthesizer {
    pub fn new(config: &SynthesisConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            current: None,
        }
    }

    fn command_args(&self, text: &str, locale: &str) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| arg.replace("{locale}", locale))
            .chain(std::iter::once(text.to_string()))
            .collect()
    }
}

impl SpeechSynthesizer for CommandSynthesizer {
    fn speak(&mut self, text: &str, locale: &str) -> Result<(), SpeechError> {
        if let Some(stop_tx) = self.current.take() {
            let _ = stop_tx.send(());
        }

        let mut child = Command::new(&self.program)
            .args(self.command_args(text, locale))
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SpeechError(format!("failed to spawn {}: {e}", self.program)))?;

        let (stop_tx, mut stop_rx) = oneshot::channel();
        self.current = Some(stop_tx);

        tokio::spawn(async move {
            tokio::select! {
                status = child.wait() => match status {
                    Ok(status) if !status.success() => warn!(%status, "speech program exited with failure"),
                    Ok(_) => {}
                    Err(e) => warn!(error = %e, "speech program wait failed"),
                },
                _ = &mut stop_rx => {
                    debug!("interrupting previous utterance");
                    let _ = child.kill().await;
                }
            }
        });

        Ok(())
    }
}

/// Prints what would be spoken. Used when no TTS program is configured.
#[derive(Debug, Default)]
pub struct ConsoleSynthesizer;

impl SpeechSynthesizer for ConsoleSynthesizer {
    fn speak(&mut self, text: &str, _locale: &str) -> Result<(), SpeechError> {
        println!("🔊 {text}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locale_placeholder_is_substituted_and_text_goes_last() {
        let synth = CommandSynthesizer::new(&SynthesisConfig::default());
        assert_eq!(
            synth.command_args("Hola", "es-ES"),
            vec!["-v".to_string(), "es-ES".to_string(), "Hola".to_string()]
        );
    }

    #[tokio::test]
    async fn missing_program_is_a_speech_error() {
        let mut synth = CommandSynthesizer::new(&SynthesisConfig {
            program: "definitely-not-a-tts-program".to_string(),
            ..SynthesisConfig::default()
        });
        assert!(synth.speak("Hola", "es-ES").is_err());
    }
}
