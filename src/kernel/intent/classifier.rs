use tracing::debug;

use super::types::{Intent, IntentKind};

/// One entry of the ordered rule table: any pattern contained in the
/// lower-cased transcript selects `kind`.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub kind: IntentKind,
    pub patterns: &'static [&'static str],
}

impl Rule {
    pub fn matches(&self, normalized: &str) -> bool {
        self.patterns.iter().any(|p| normalized.contains(p))
    }
}

/// First match wins. Order is part of the behavior: "estoy triste, dame
/// una receta" is emotional support because that rule comes first.
pub const RULES: &[Rule] = &[
    Rule {
        kind: IntentKind::Greeting,
        patterns: &["hola", "saludo"],
    },
    Rule {
        kind: IntentKind::OpenVideoCall,
        patterns: &["videollamada", "llamar a"],
    },
    Rule {
        kind: IntentKind::OpenMessages,
        patterns: &["mensaje"],
    },
    Rule {
        kind: IntentKind::OpenReminders,
        patterns: &["recordatorio"],
    },
    Rule {
        kind: IntentKind::OpenActivities,
        patterns: &["actividades", "eventos"],
    },
    Rule {
        kind: IntentKind::OpenEmergency,
        patterns: &["emergencia", "ayuda"],
    },
    Rule {
        kind: IntentKind::EmotionalSupport,
        patterns: &["me siento", "estoy triste", "estoy solo", "estoy feliz"],
    },
    Rule {
        kind: IntentKind::RecipeRequest,
        patterns: &["receta", "qué puedo cocinar", "que puedo cocinar"],
    },
    Rule {
        kind: IntentKind::OpenMedicationRequest,
        patterns: &["medicamento"],
    },
    Rule {
        kind: IntentKind::OpenAppointments,
        patterns: &["cita médica", "cita medica", "agendar cita", "citas"],
    },
    Rule {
        kind: IntentKind::OpenNearbyHospitals,
        patterns: &[
            "hospital cercano",
            "hospitales cercanos",
            "dónde hay un hospital",
            "donde hay un hospital",
        ],
    },
    Rule {
        kind: IntentKind::HealthRoutine,
        patterns: &["rutina", "salud"],
    },
    Rule {
        kind: IntentKind::NavigateHome,
        patterns: &["regresar", "inicio", "volver"],
    },
    Rule {
        kind: IntentKind::TellTime,
        patterns: &["qué hora es", "que hora es"],
    },
    Rule {
        kind: IntentKind::TellDate,
        patterns: &["qué día es hoy", "que día es hoy", "que dia es hoy"],
    },
];

/// Request phrases that introduce the recipe topic, longest first.
const RECIPE_PREFIXES: &[&str] = &[
    "dame una receta de",
    "dame una receta con",
    "qué puedo cocinar con",
    "que puedo cocinar con",
    "qué puedo cocinar",
    "que puedo cocinar",
    "dame una receta",
    "una receta de",
    "una receta con",
    "recetas de",
    "recetas con",
    "receta de",
    "receta con",
    "recetas",
    "receta",
];

/// Map a transcript to exactly one intent.
pub fn classify(transcript: &str) -> Intent {
    let raw = transcript.trim();
    let normalized = raw.to_lowercase();

    let kind = RULES
        .iter()
        .find(|rule| rule.matches(&normalized))
        .map(|rule| rule.kind)
        .unwrap_or(IntentKind::Fallback);

    debug!(?kind, "classified transcript");

    match kind {
        IntentKind::Greeting => Intent::Greeting,
        IntentKind::OpenVideoCall => Intent::OpenVideoCall,
        IntentKind::OpenMessages => Intent::OpenMessages,
        IntentKind::OpenReminders => Intent::OpenReminders,
        IntentKind::OpenActivities => Intent::OpenActivities,
        IntentKind::OpenEmergency => Intent::OpenEmergency,
        IntentKind::EmotionalSupport => Intent::EmotionalSupport(raw.to_string()),
        IntentKind::RecipeRequest => Intent::RecipeRequest(recipe_query(&normalized)),
        IntentKind::OpenMedicationRequest => Intent::OpenMedicationRequest,
        IntentKind::OpenAppointments => Intent::OpenAppointments,
        IntentKind::OpenNearbyHospitals => Intent::OpenNearbyHospitals,
        IntentKind::HealthRoutine => Intent::HealthRoutine,
        IntentKind::NavigateHome => Intent::NavigateHome,
        IntentKind::TellTime => Intent::TellTime,
        IntentKind::TellDate => Intent::TellDate,
        IntentKind::Fallback => Intent::Fallback(raw.to_string()),
    }
}

/// Topic of a recipe request: whatever follows the first request phrase
/// found as whole words. Text without such a phrase is kept as is.
pub fn recipe_query(normalized: &str) -> String {
    let topic = RECIPE_PREFIXES
        .iter()
        .find_map(|prefix| find_phrase(normalized, prefix).map(|at| &normalized[at + prefix.len()..]))
        .unwrap_or(normalized);

    topic
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, ',' | '.' | '?' | '¿' | '!' | '¡'))
        .to_string()
}

/// Byte offset of the first occurrence of `phrase` not glued to other letters.
fn find_phrase(text: &str, phrase: &str) -> Option<usize> {
    text.match_indices(phrase).map(|(at, _)| at).find(|&at| {
        let before = text[..at].chars().next_back();
        let after = text[at + phrase.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}
