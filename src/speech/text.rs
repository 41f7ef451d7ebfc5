use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::debug;

use super::{emit, finish, Activation, RecognitionError, SpeechRecognizer};
use crate::kernel::event::{Event, RecognitionSignal};

/// Line waiting for an activation. `seq` grows with every `say`.
#[derive(Debug, Clone, Default)]
struct Pending {
    seq: u64,
    line: Option<String>,
}

/// Producer side of a [`TextRecognizer`].
///
/// Holds at most one line: a line no activation has taken yet is replaced
/// by the next one, so an utterance typed while the session was busy is
/// never answered later.
#[derive(Clone)]
pub struct TextFeed {
    tx: Arc<watch::Sender<Pending>>,
}

impl TextFeed {
    /// Offer an utterance to the next activation. Returns false once the
    /// recognizer is gone.
    pub fn say(&self, text: impl Into<String>) -> bool {
        let text = text.into();
        self.tx.send_modify(|pending| {
            pending.seq += 1;
            pending.line = Some(text);
        });
        self.tx.receiver_count() > 0
    }

    /// Drop a line no activation has taken.
    pub fn clear(&self) {
        self.tx.send_modify(|pending| pending.line = None);
    }
}

/// Recognizer whose "speech" is typed text. Each activation takes the
/// pending line, or waits for the next one.
pub struct TextRecognizer {
    rx: watch::Receiver<Pending>,
    taken: Arc<AtomicU64>,
    activation: Activation,
}

impl TextRecognizer {
    pub fn channel() -> (TextFeed, Self) {
        let (tx, rx) = watch::channel(Pending::default());
        (
            TextFeed { tx: Arc::new(tx) },
            Self {
                rx,
                taken: Arc::new(AtomicU64::new(0)),
                activation: Activation::default(),
            },
        )
    }
}

/// Take the pending line if no activation has taken it already.
fn take_line(rx: &mut watch::Receiver<Pending>, taken: &AtomicU64) -> Option<String> {
    let pending = rx.borrow_and_update();
    let line = pending.line.as_ref()?;
    if pending.seq <= taken.load(Ordering::SeqCst) {
        return None;
    }
    taken.store(pending.seq, Ordering::SeqCst);
    Some(line.clone())
}

impl SpeechRecognizer for TextRecognizer {
    fn start(&mut self, events: mpsc::Sender<Event>) -> Result<(), RecognitionError> {
        let (cancel, busy) = self.activation.begin()?;
        let mut rx = self.rx.clone();
        let taken = self.taken.clone();

        tokio::spawn(async move {
            emit(&events, RecognitionSignal::Started).await;

            // Some(None): every feed was dropped
            let next = loop {
                if let Some(line) = take_line(&mut rx, &taken) {
                    break Some(Some(line));
                }
                tokio::select! {
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break Some(None);
                        }
                    }
                    _ = cancel.cancelled() => break None,
                }
            };

            match next {
                Some(Some(line)) => emit(&events, RecognitionSignal::Result(line)).await,
                Some(None) => emit(&events, RecognitionSignal::Error("no-speech".to_string())).await,
                None => debug!("text activation aborted"),
            }

            finish(&events, &busy).await;
        });

        Ok(())
    }

    fn stop(&mut self) {
        self.activation.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn activation(recognizer: &mut TextRecognizer) -> Vec<RecognitionSignal> {
        let (tx, mut rx) = mpsc::channel(8);
        recognizer.start(tx).unwrap();
        let mut signals = Vec::new();
        while let Some(Event::Recognition(signal)) = rx.recv().await {
            let ended = signal == RecognitionSignal::Ended;
            signals.push(signal);
            if ended {
                break;
            }
        }
        signals
    }

    #[tokio::test]
    async fn untaken_line_is_superseded() {
        let (feed, mut recognizer) = TextRecognizer::channel();
        feed.say("hola");
        feed.say("qué hora es");

        assert_eq!(
            activation(&mut recognizer).await,
            vec![
                RecognitionSignal::Started,
                RecognitionSignal::Result("qué hora es".to_string()),
                RecognitionSignal::Ended,
            ]
        );
    }

    #[tokio::test]
    async fn taken_line_is_not_replayed() {
        let (feed, mut recognizer) = TextRecognizer::channel();
        feed.say("hola");
        activation(&mut recognizer).await;

        let (tx, mut rx) = mpsc::channel(8);
        recognizer.start(tx).unwrap();
        assert_eq!(
            rx.recv().await.map(|e| matches!(e, Event::Recognition(RecognitionSignal::Started))),
            Some(true)
        );
        feed.say("adiós");
        match rx.recv().await {
            Some(Event::Recognition(RecognitionSignal::Result(text))) => assert_eq!(text, "adiós"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn cleared_line_is_not_taken() {
        let (feed, mut recognizer) = TextRecognizer::channel();
        feed.say("hola");
        feed.clear();

        let (tx, mut rx) = mpsc::channel(8);
        recognizer.start(tx).unwrap();
        recognizer.stop();

        let mut signals = Vec::new();
        while let Some(Event::Recognition(signal)) = rx.recv().await {
            signals.push(signal);
        }
        assert_eq!(signals, vec![RecognitionSignal::Started, RecognitionSignal::Ended]);
    }

    #[tokio::test]
    async fn dropped_feed_reports_no_speech() {
        let (feed, mut recognizer) = TextRecognizer::channel();
        drop(feed);
        assert_eq!(
            activation(&mut recognizer).await,
            vec![
                RecognitionSignal::Started,
                RecognitionSignal::Error("no-speech".to_string()),
                RecognitionSignal::Ended,
            ]
        );
    }
}
