use chrono::{DateTime, Local};
use tracing::warn;

use super::event::RequestId;
use super::intent::Intent;
use super::phrases;
use super::state::{GenerationKind, Recipe, SectionId, StateDelta};
use super::time::{spoken_date, spoken_time};
use crate::services::llm::{GenerationError, GenerationReply, GenerationRequest};

/// Work the driver performs on behalf of the reactor.
#[derive(Debug, Clone, PartialEq)]
pub enum SideEffect {
    StartRecognition,
    StopRecognition,
    /// Fire-and-forget speech output.
    Speak(String),
    Generate {
        request_id: RequestId,
        request: GenerationRequest,
    },
}

/// How an intent gets answered.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Answered within the same turn.
    Immediate {
        deltas: Vec<StateDelta>,
        response: String,
    },
    /// Needs the language service.
    Deferred {
        kind: GenerationKind,
        request: GenerationRequest,
    },
}

impl Resolution {
    fn navigate(section: SectionId, response: &str) -> Self {
        Resolution::Immediate {
            deltas: vec![StateDelta::SectionChanged(section)],
            response: response.to_string(),
        }
    }

    fn say(response: String) -> Self {
        Resolution::Immediate {
            deltas: Vec::new(),
            response,
        }
    }
}

pub struct Scheduler {
    locale: String,
}

impl Scheduler {
    pub fn new(locale: impl Into<String>) -> Self {
        Self { locale: locale.into() }
    }

    /// Pure projection: Intent + wall clock -> Resolution
    pub fn schedule(&self, intent: Intent, now: DateTime<Local>) -> Resolution {
        match intent {
            Intent::Greeting => Resolution::say(phrases::GREETING.to_string()),
            Intent::OpenVideoCall => Resolution::navigate(SectionId::VideoCalls, phrases::OPEN_VIDEO_CALL),
            Intent::OpenMessages => Resolution::navigate(SectionId::Messages, phrases::OPEN_MESSAGES),
            Intent::OpenReminders => Resolution::navigate(SectionId::Reminders, phrases::OPEN_REMINDERS),
            Intent::OpenActivities => Resolution::navigate(SectionId::Activities, phrases::OPEN_ACTIVITIES),
            Intent::OpenEmergency => Resolution::navigate(SectionId::Emergency, phrases::OPEN_EMERGENCY),
            Intent::OpenMedicationRequest => Resolution::navigate(SectionId::Medication, phrases::OPEN_MEDICATION),
            Intent::OpenAppointments => Resolution::navigate(SectionId::Appointments, phrases::OPEN_APPOINTMENTS),
            Intent::OpenNearbyHospitals => {
                Resolution::navigate(SectionId::NearbyHospitals, phrases::OPEN_HOSPITALS)
            }
            Intent::HealthRoutine => Resolution::navigate(SectionId::Reminders, phrases::HEALTH_ROUTINE),
            Intent::NavigateHome => Resolution::Immediate {
                deltas: vec![StateDelta::SectionChanged(SectionId::Home), StateDelta::RecipeCleared],
                response: phrases::NAVIGATE_HOME.to_string(),
            },
            Intent::TellTime => Resolution::say(spoken_time(&now)),
            Intent::TellDate => Resolution::say(spoken_date(&now, &self.locale)),
            Intent::EmotionalSupport(text) => Resolution::Deferred {
                kind: GenerationKind::EmotionalSupport,
                request: GenerationRequest::text(phrases::emotional_support_prompt(&text, &self.locale)),
            },
            Intent::RecipeRequest(query) => Resolution::Deferred {
                kind: GenerationKind::Recipe,
                request: GenerationRequest::structured(phrases::recipe_prompt(&query), phrases::recipe_schema()),
            },
            Intent::Fallback(text) => Resolution::Deferred {
                kind: GenerationKind::Open,
                request: GenerationRequest::text(text),
            },
        }
    }

    /// Turn a generation outcome into state changes and a response.
    /// Failures never escape: each kind has its canned answer.
    pub fn settle(
        &self,
        kind: GenerationKind,
        result: Result<GenerationReply, GenerationError>,
    ) -> (Vec<StateDelta>, String) {
        match kind {
            GenerationKind::EmotionalSupport => match result {
                Ok(reply) => (Vec::new(), reply.text.trim().to_string()),
                Err(e) => {
                    warn!(error = %e, "emotional support generation failed");
                    (Vec::new(), phrases::EMOTIONAL_FALLBACK.to_string())
                }
            },
            GenerationKind::Recipe => match result.and_then(|reply| parse_recipe(&reply)) {
                Ok(recipe) => {
                    let response = phrases::recipe_ready(&recipe.name);
                    (
                        vec![
                            StateDelta::RecipeStored(recipe),
                            StateDelta::SectionChanged(SectionId::Recipes),
                        ],
                        response,
                    )
                }
                Err(GenerationError::EmptyCandidate) => {
                    warn!("recipe generation returned no candidate");
                    (Vec::new(), phrases::RECIPE_EMPTY.to_string())
                }
                Err(e) => {
                    warn!(error = %e, "recipe generation failed");
                    (Vec::new(), phrases::RECIPE_FAILED.to_string())
                }
            },
            GenerationKind::Open => match result {
                Ok(reply) => (Vec::new(), reply.text),
                Err(e) => {
                    warn!(error = %e, "open-ended generation failed");
                    (Vec::new(), phrases::OPEN_FALLBACK.to_string())
                }
            },
        }
    }
}

/// A recipe is only accepted whole: every field present and a non-blank name.
fn parse_recipe(reply: &GenerationReply) -> Result<Recipe, GenerationError> {
    let recipe: Recipe = reply.parse_json()?;
    if recipe.name.trim().is_empty() {
        return Err(GenerationError::MalformedResponse("recipe has no name".to_string()));
    }
    Ok(recipe)
}
