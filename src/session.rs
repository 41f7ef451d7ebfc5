//! The session driver: feeds events to the [`Reactor`] and executes the
//! side effects it returns against the speech adapters, the language
//! service and the collaborator sections.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::kernel::event::{Event, RecognitionSignal, RequestId};
use crate::kernel::reactor::Reactor;
use crate::kernel::scheduler::SideEffect;
use crate::kernel::state::{SessionPhase, SessionState};
use crate::sections::{SectionAction, SectionBoard};
use crate::services::llm::{GenerationError, GenerationRequest, LanguageService};
use crate::speech::{RecognitionError, SpeechRecognizer, SpeechSynthesizer};

const EVENT_CAPACITY: usize = 64;

/// User controls, sent from the UI side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Activate,
    Stop,
    /// Microphone button: stop while listening, activate otherwise.
    Toggle,
    Section(SectionAction),
}

/// Cloneable sender of [`SessionCommand`]s.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<SessionCommand>,
}

impl SessionHandle {
    /// Returns false once the session has shut down.
    pub fn send(&self, command: SessionCommand) -> bool {
        self.tx.send(command).is_ok()
    }

    pub fn activate(&self) -> bool {
        self.send(SessionCommand::Activate)
    }

    pub fn stop(&self) -> bool {
        self.send(SessionCommand::Stop)
    }

    pub fn toggle(&self) -> bool {
        self.send(SessionCommand::Toggle)
    }

    pub fn section(&self, action: SectionAction) -> bool {
        self.send(SessionCommand::Section(action))
    }
}

pub struct Session {
    reactor: Reactor,
    recognizer: Box<dyn SpeechRecognizer>,
    synthesizer: Box<dyn SpeechSynthesizer>,
    language: Arc<dyn LanguageService>,
    board: SectionBoard,
    generation_timeout: Duration,

    events_tx: mpsc::Sender<Event>,
    events_rx: mpsc::Receiver<Event>,
    commands_tx: mpsc::UnboundedSender<SessionCommand>,
    commands_rx: mpsc::UnboundedReceiver<SessionCommand>,
    generations: HashMap<RequestId, JoinHandle<()>>,
}

impl Session {
    pub fn new(
        reactor: Reactor,
        recognizer: Box<dyn SpeechRecognizer>,
        synthesizer: Box<dyn SpeechSynthesizer>,
        language: Arc<dyn LanguageService>,
        generation_timeout: Duration,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel(EVENT_CAPACITY);
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        Self {
            reactor,
            recognizer,
            synthesizer,
            language,
            board: SectionBoard::new(),
            generation_timeout,
            events_tx,
            events_rx,
            commands_tx,
            commands_rx,
            generations: HashMap::new(),
        }
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            tx: self.commands_tx.clone(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.reactor.state
    }

    pub fn phase(&self) -> SessionPhase {
        self.reactor.phase()
    }

    pub fn board(&self) -> &SectionBoard {
        &self.board
    }

    pub fn activate(&mut self) {
        self.dispatch(Event::ActivationRequested);
    }

    pub fn stop(&mut self) {
        self.dispatch(Event::StopRequested);
    }

    pub fn toggle(&mut self) {
        if self.reactor.phase() == SessionPhase::Listening {
            self.stop();
        } else {
            self.activate();
        }
    }

    /// Let a collaborator section handle `action`, then apply its report.
    pub fn section(&mut self, action: SectionAction) {
        let today = self.reactor.now().date_naive();
        let report = self.board.apply(action, today);
        self.dispatch(Event::SectionReported(report));
    }

    pub fn apply(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Activate => self.activate(),
            SessionCommand::Stop => self.stop(),
            SessionCommand::Toggle => self.toggle(),
            SessionCommand::Section(action) => self.section(action),
        }
    }

    /// Step the reactor with `event` and execute the resulting effects.
    /// Adapter failures that surface synchronously are fed back in order.
    pub fn dispatch(&mut self, event: Event) {
        let mut queue = VecDeque::from([event]);
        while let Some(event) = queue.pop_front() {
            if let Event::GenerationFinished { request_id, .. } = &event {
                self.generations.remove(request_id);
            }
            for effect in self.reactor.step(vec![event]) {
                queue.extend(self.execute(effect));
            }
        }
    }

    fn execute(&mut self, effect: SideEffect) -> Vec<Event> {
        match effect {
            SideEffect::StartRecognition => match self.recognizer.start(self.events_tx.clone()) {
                Ok(()) => Vec::new(),
                Err(RecognitionError::Unsupported(reason)) => {
                    warn!(%reason, "speech recognition unavailable");
                    vec![Event::Recognition(RecognitionSignal::Unsupported)]
                }
                Err(RecognitionError::Busy) => {
                    // No Started/Ended will come for this request
                    debug!("recognizer busy; activation dropped");
                    vec![Event::Recognition(RecognitionSignal::Ended)]
                }
                Err(RecognitionError::Failed(code)) => vec![
                    Event::Recognition(RecognitionSignal::Error(code)),
                    Event::Recognition(RecognitionSignal::Ended),
                ],
            },
            SideEffect::StopRecognition => {
                self.recognizer.stop();
                Vec::new()
            }
            SideEffect::Speak(text) => {
                if let Err(e) = self.synthesizer.speak(&text, self.reactor.locale()) {
                    warn!(error = %e, "speech output failed");
                }
                Vec::new()
            }
            SideEffect::Generate { request_id, request } => {
                self.spawn_generation(request_id, request);
                Vec::new()
            }
        }
    }

    fn spawn_generation(&mut self, request_id: RequestId, request: GenerationRequest) {
        let language = self.language.clone();
        let events = self.events_tx.clone();
        let limit = self.generation_timeout;

        let task = tokio::spawn(async move {
            let result = match tokio::time::timeout(limit, language.generate(request)).await {
                Ok(result) => result,
                Err(_) => Err(GenerationError::Network(format!(
                    "no reply within {}s",
                    limit.as_secs()
                ))),
            };
            if events
                .send(Event::GenerationFinished { request_id, result })
                .await
                .is_err()
            {
                debug!(%request_id, "session gone; dropping generation result");
            }
        });
        self.generations.insert(request_id, task);
    }

    /// Process events until the session is back to Idle.
    /// Returns false if `limit` elapses first.
    pub async fn run_until_idle(&mut self, limit: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + limit;
        while self.reactor.phase() != SessionPhase::Idle {
            match tokio::time::timeout_at(deadline, self.events_rx.recv()).await {
                Ok(Some(event)) => self.dispatch(event),
                Ok(None) | Err(_) => return false,
            }
        }
        true
    }

    /// Drive the session until `shutdown` fires.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!(locale = %self.reactor.locale(), "session running");
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                Some(command) = self.commands_rx.recv() => self.apply(command),
                Some(event) = self.events_rx.recv() => self.dispatch(event),
            }
        }

        self.recognizer.stop();
        for (_, task) in self.generations.drain() {
            task.abort();
        }
        info!("session stopped");
    }
}
