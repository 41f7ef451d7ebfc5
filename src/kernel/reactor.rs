use chrono::{DateTime, Local};
use tracing::{debug, info, warn};

use super::event::{Event, RecognitionSignal, RequestId};
use super::intent::classify;
use super::phrases;
use super::scheduler::{Resolution, Scheduler, SideEffect};
use super::state::{PendingGeneration, SectionId, SessionPhase, SessionState, StateDelta};
use super::time::{Clock, SystemClock};
use crate::sections::SectionReport;
use crate::services::llm::{GenerationError, GenerationReply};

#[derive(Debug, Clone)]
pub struct ReactorConfig {
    pub locale: String,
    /// Drop a reply whose request predates a later section change.
    pub discard_stale_replies: bool,
}

impl Default for ReactorConfig {
    fn default() -> Self {
        Self {
            locale: "es-ES".to_string(),
            discard_stale_replies: false,
        }
    }
}

/// The session controller. Owns `SessionState` and runs the
/// Idle -> Listening -> Processing -> Idle cycle.
pub struct Reactor {
    pub state: SessionState,
    scheduler: Scheduler,
    clock: Box<dyn Clock>,
    config: ReactorConfig,
}

impl Reactor {
    pub fn new(config: ReactorConfig) -> Self {
        Self::with_clock(config, Box::new(SystemClock))
    }

    pub fn with_clock(config: ReactorConfig, clock: Box<dyn Clock>) -> Self {
        Self {
            state: SessionState::new(),
            scheduler: Scheduler::new(config.locale.clone()),
            clock,
            config,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.phase()
    }

    pub fn locale(&self) -> &str {
        &self.config.locale
    }

    pub fn now(&self) -> DateTime<Local> {
        self.clock.now()
    }

    /// Pure step: applies events in order and returns the side effects to
    /// be executed by the driver. MUST NOT await I/O or timers.
    pub fn step(&mut self, events: Vec<Event>) -> Vec<SideEffect> {
        let mut effects = Vec::new();
        for event in events {
            self.handle(event, &mut effects);
        }
        effects
    }

    fn handle(&mut self, event: Event, effects: &mut Vec<SideEffect>) {
        match event {
            Event::ActivationRequested => self.on_activation_requested(effects),
            Event::StopRequested => {
                // Idempotent: nothing in flight means nothing to stop
                if self.state.listening || self.state.activation_requested {
                    effects.push(SideEffect::StopRecognition);
                }
            }
            Event::Recognition(signal) => self.on_recognition(signal, effects),
            Event::GenerationFinished { request_id, result } => {
                self.on_generation_finished(request_id, result, effects)
            }
            Event::SectionReported(report) => self.on_section_report(report, effects),
        }
    }

    fn on_activation_requested(&mut self, effects: &mut Vec<SideEffect>) {
        if !self.state.recognition_available {
            debug!("activation ignored: speech recognition unavailable");
            return;
        }
        let phase = self.phase();
        if phase != SessionPhase::Idle {
            debug!(?phase, "activation ignored: session busy");
            return;
        }
        self.state.reduce(StateDelta::ActivationRequested);
        effects.push(SideEffect::StartRecognition);
    }

    fn on_recognition(&mut self, signal: RecognitionSignal, effects: &mut Vec<SideEffect>) {
        match signal {
            RecognitionSignal::Unsupported => {
                if !self.state.recognition_available {
                    return;
                }
                warn!("speech recognition unsupported; disabling activation for this session");
                self.state.reduce(StateDelta::RecognitionDisabled);
                self.respond(phrases::RECOGNITION_UNSUPPORTED.to_string(), effects);
            }
            RecognitionSignal::Started => {
                if !self.state.recognition_available {
                    return;
                }
                info!("listening");
                self.state.reduce(StateDelta::ListeningStarted);
                self.state.reduce(StateDelta::ResponseSet(phrases::LISTENING.to_string()));
            }
            RecognitionSignal::Result(transcript) => self.on_transcript(transcript, effects),
            RecognitionSignal::Error(code) => {
                warn!(%code, "speech recognition error");
                self.clear_indicator(phrases::LISTENING);
            }
            RecognitionSignal::Ended => {
                info!("listening ended");
                self.state.reduce(StateDelta::ListeningEnded);
                self.clear_indicator(phrases::LISTENING);
            }
        }
    }

    fn on_transcript(&mut self, transcript: String, effects: &mut Vec<SideEffect>) {
        if self.state.pending.is_some() {
            warn!("transcript ignored: a request is already being processed");
            return;
        }
        if transcript.trim().is_empty() {
            debug!("empty transcript ignored");
            return;
        }

        debug!(%transcript, "transcript received");
        self.state.reduce(StateDelta::TranscriptReceived(transcript.clone()));

        let intent = classify(&transcript);
        info!(kind = ?intent.kind(), "intent classified");

        match self.scheduler.schedule(intent, self.clock.now()) {
            Resolution::Immediate { deltas, response } => {
                for delta in deltas {
                    self.state.reduce(delta);
                }
                self.respond(response, effects);
            }
            Resolution::Deferred { kind, request } => {
                let request_id = RequestId::new();
                info!(%request_id, ?kind, "delegating to language service");
                self.state.reduce(StateDelta::GenerationIssued(PendingGeneration {
                    request_id,
                    kind,
                    navigation_epoch: self.state.navigation_epoch,
                }));
                self.state.reduce(StateDelta::ResponseSet(phrases::PROCESSING.to_string()));
                effects.push(SideEffect::Speak(phrases::PROCESSING_SPOKEN.to_string()));
                effects.push(SideEffect::Generate { request_id, request });
            }
        }
    }

    fn on_generation_finished(
        &mut self,
        request_id: RequestId,
        result: Result<GenerationReply, GenerationError>,
        effects: &mut Vec<SideEffect>,
    ) {
        let pending = match &self.state.pending {
            Some(pending) if pending.request_id == request_id => pending.clone(),
            _ => {
                debug!(%request_id, "dropping reply for unknown request");
                return;
            }
        };

        self.state.reduce(StateDelta::GenerationSettled);

        if self.config.discard_stale_replies && pending.navigation_epoch != self.state.navigation_epoch {
            info!(%request_id, "discarding stale reply: user navigated away");
            self.clear_indicator(phrases::PROCESSING);
            return;
        }

        let (deltas, response) = self.scheduler.settle(pending.kind, result);
        for delta in deltas {
            self.state.reduce(delta);
        }
        self.respond(response, effects);
    }

    fn on_section_report(&mut self, report: SectionReport, effects: &mut Vec<SideEffect>) {
        if let Some(section) = report.section {
            self.state.reduce(StateDelta::SectionChanged(section));
            if section == SectionId::Home {
                self.state.reduce(StateDelta::RecipeCleared);
            }
        }
        self.respond(report.response, effects);
    }

    /// Every resolved request ends here: record the response, then speak it.
    fn respond(&mut self, text: String, effects: &mut Vec<SideEffect>) {
        self.state.reduce(StateDelta::ResponseSet(text.clone()));
        effects.push(SideEffect::Speak(text));
    }

    /// Drop a transient indicator left behind by an activation or request
    /// that produced no answer.
    fn clear_indicator(&mut self, indicator: &str) {
        if self.state.last_response == indicator {
            let resting = self.state.resting_response.clone();
            self.state.reduce(StateDelta::ResponseSet(resting));
        }
    }
}
