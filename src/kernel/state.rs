use serde::{Deserialize, Serialize};

use super::event::RequestId;
use super::phrases;

/// Which collaborator view is visible. The reactor only ever writes this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum SectionId {
    #[default]
    Home,
    VideoCalls,
    Messages,
    Reminders,
    Activities,
    Emergency,
    Recipes,
    Medication,
    Appointments,
    NearbyHospitals,
}

impl SectionId {
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionId::Home => "home",
            SectionId::VideoCalls => "videollamadas",
            SectionId::Messages => "mensajes",
            SectionId::Reminders => "recordatorios",
            SectionId::Activities => "actividades",
            SectionId::Emergency => "emergencia",
            SectionId::Recipes => "recetas",
            SectionId::Medication => "medicamentos",
            SectionId::Appointments => "citasMedicas",
            SectionId::NearbyHospitals => "hospitalesCercanos",
        }
    }
}

impl std::fmt::Display for SectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A generated recipe, as returned by the language service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    #[serde(rename = "recipeName")]
    pub name: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
}

/// The three intents that are resolved by the remote language service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenerationKind {
    EmotionalSupport,
    Recipe,
    Open,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingGeneration {
    pub request_id: RequestId,
    pub kind: GenerationKind,
    /// `navigation_epoch` at the moment the request was issued.
    pub navigation_epoch: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    Idle,
    Listening,
    Processing,
}

/// Strict state delta. This is the ONLY way session state mutates.
#[derive(Debug, Clone, PartialEq)]
pub enum StateDelta {
    ActivationRequested,
    ListeningStarted,
    ListeningEnded,
    TranscriptReceived(String),
    ResponseSet(String),
    SectionChanged(SectionId),
    RecipeStored(Recipe),
    RecipeCleared,
    GenerationIssued(PendingGeneration),
    GenerationSettled,
    RecognitionDisabled,
}

#[derive(Debug, Clone)]
pub struct SessionState {
    /// True only between `Started` and `Ended` of one activation.
    pub listening: bool,
    pub last_transcript: String,
    pub last_response: String,
    /// Response shown before the current activation; restored when the
    /// activation ends without producing an answer.
    pub resting_response: String,
    pub active_section: SectionId,
    pub pending_recipe: Option<Recipe>,

    /// Activation was requested from the adapter but `Started` has not arrived.
    pub activation_requested: bool,
    /// Cleared for good once the platform reports it cannot recognize speech.
    pub recognition_available: bool,
    pub pending: Option<PendingGeneration>,
    /// Bumped on every section change; used to spot stale replies.
    pub navigation_epoch: u64,
    // Monotonic version, bumped by every reduction
    pub version: u64,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            listening: false,
            last_transcript: String::new(),
            last_response: phrases::WELCOME.to_string(),
            resting_response: phrases::WELCOME.to_string(),
            active_section: SectionId::Home,
            pending_recipe: None,
            activation_requested: false,
            recognition_available: true,
            pending: None,
            navigation_epoch: 0,
            version: 0,
        }
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> SessionPhase {
        if self.pending.is_some() {
            SessionPhase::Processing
        } else if self.listening || self.activation_requested {
            SessionPhase::Listening
        } else {
            SessionPhase::Idle
        }
    }

    /// Pure reduction: State + Delta -> Mutated State
    pub fn reduce(&mut self, delta: StateDelta) {
        self.version += 1;

        match delta {
            StateDelta::ActivationRequested => {
                self.activation_requested = true;
            }
            StateDelta::ListeningStarted => {
                self.activation_requested = false;
                self.listening = true;
                self.resting_response = self.last_response.clone();
            }
            StateDelta::ListeningEnded => {
                self.activation_requested = false;
                self.listening = false;
            }
            StateDelta::TranscriptReceived(text) => {
                self.last_transcript = text;
            }
            StateDelta::ResponseSet(text) => {
                self.last_response = text;
            }
            StateDelta::SectionChanged(section) => {
                self.active_section = section;
                self.navigation_epoch += 1;
            }
            StateDelta::RecipeStored(recipe) => {
                self.pending_recipe = Some(recipe);
            }
            StateDelta::RecipeCleared => {
                self.pending_recipe = None;
            }
            StateDelta::GenerationIssued(pending) => {
                self.pending = Some(pending);
            }
            StateDelta::GenerationSettled => {
                self.pending = None;
            }
            StateDelta::RecognitionDisabled => {
                self.recognition_available = false;
                self.activation_requested = false;
                self.listening = false;
            }
        }
    }
}
