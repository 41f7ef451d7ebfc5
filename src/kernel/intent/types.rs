use serde::{Deserialize, Serialize};

/// What the user asked for. Exactly one per transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    Greeting,
    OpenVideoCall,
    OpenMessages,
    OpenReminders,
    OpenActivities,
    OpenEmergency,
    /// Carries the transcript the user said.
    EmotionalSupport(String),
    /// Carries the recipe topic with the request phrase stripped.
    /// Empty means "surprise me".
    RecipeRequest(String),
    OpenMedicationRequest,
    OpenAppointments,
    OpenNearbyHospitals,
    HealthRoutine,
    NavigateHome,
    TellTime,
    TellDate,
    Fallback(String),
}

/// Fieldless tag of an [`Intent`]; the rule table is written in these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntentKind {
    Greeting,
    OpenVideoCall,
    OpenMessages,
    OpenReminders,
    OpenActivities,
    OpenEmergency,
    EmotionalSupport,
    RecipeRequest,
    OpenMedicationRequest,
    OpenAppointments,
    OpenNearbyHospitals,
    HealthRoutine,
    NavigateHome,
    TellTime,
    TellDate,
    Fallback,
}

impl Intent {
    pub fn kind(&self) -> IntentKind {
        match self {
            Intent::Greeting => IntentKind::Greeting,
            Intent::OpenVideoCall => IntentKind::OpenVideoCall,
            Intent::OpenMessages => IntentKind::OpenMessages,
            Intent::OpenReminders => IntentKind::OpenReminders,
            Intent::OpenActivities => IntentKind::OpenActivities,
            Intent::OpenEmergency => IntentKind::OpenEmergency,
            Intent::EmotionalSupport(_) => IntentKind::EmotionalSupport,
            Intent::RecipeRequest(_) => IntentKind::RecipeRequest,
            Intent::OpenMedicationRequest => IntentKind::OpenMedicationRequest,
            Intent::OpenAppointments => IntentKind::OpenAppointments,
            Intent::OpenNearbyHospitals => IntentKind::OpenNearbyHospitals,
            Intent::HealthRoutine => IntentKind::HealthRoutine,
            Intent::NavigateHome => IntentKind::NavigateHome,
            Intent::TellTime => IntentKind::TellTime,
            Intent::TellDate => IntentKind::TellDate,
            Intent::Fallback(_) => IntentKind::Fallback,
        }
    }

    /// Whether resolving this intent needs the remote language service.
    pub fn is_deferred(&self) -> bool {
        matches!(
            self,
            Intent::EmotionalSupport(_) | Intent::RecipeRequest(_) | Intent::Fallback(_)
        )
    }
}
