//! Canned responses and prompt builders. All user-facing text is Spanish.

use serde_json::{json, Value};

pub const WELCOME: &str = "¡Hola! ¿En qué puedo ayudarte?";
pub const LISTENING: &str = "Escuchando...";
pub const PROCESSING: &str = "Procesando tu solicitud...";
pub const PROCESSING_SPOKEN: &str = "Procesando tu solicitud.";
pub const RECOGNITION_UNSUPPORTED: &str =
    "Tu dispositivo no soporta el reconocimiento de voz. Puedes seguir usando los botones de la pantalla.";

pub const GREETING: &str = "¡Hola! ¿Cómo puedo ayudarte hoy?";
pub const OPEN_VIDEO_CALL: &str = "Abriendo la sección de videollamadas. ¿A quién te gustaría llamar?";
pub const OPEN_MESSAGES: &str =
    "Abriendo la sección de mensajes. ¿A quién le quieres enviar un mensaje y qué quieres decir?";
pub const OPEN_REMINDERS: &str = "Abriendo la sección de recordatorios. ¿Qué recordatorio te gustaría añadir?";
pub const OPEN_ACTIVITIES: &str =
    "Buscando actividades y eventos cerca de ti. ¿Hay algo específico que te interese?";
pub const OPEN_EMERGENCY: &str = "Activando servicios de emergencia. Mantén la calma, la ayuda está en camino.";
pub const OPEN_MEDICATION: &str =
    "Abriendo la sección de solicitud de medicamentos. Por favor, dime qué medicamento necesitas y la cantidad.";
pub const OPEN_APPOINTMENTS: &str =
    "Abriendo la sección de citas médicas. Puedes agendar una nueva cita o revisar tus citas existentes.";
pub const OPEN_HOSPITALS: &str = "Buscando hospitales cercanos. Necesitaré permiso para acceder a tu ubicación.";
pub const HEALTH_ROUTINE: &str = "Para el seguimiento de rutinas y salud, puedo ayudarte a configurar recordatorios o buscar información. ¿Qué necesitas específicamente?";
pub const NAVIGATE_HOME: &str = "Volviendo a la página de inicio.";

pub const EMOTIONAL_FALLBACK: &str =
    "Gracias por compartir cómo te sientes. Siempre estoy aquí para escucharte.";
pub const RECIPE_EMPTY: &str =
    "Lo siento, no pude generar una receta en este momento. ¿Puedes ser más específico?";
pub const RECIPE_FAILED: &str = "Hubo un problema al generar la receta. Por favor, inténtalo de nuevo.";
pub const OPEN_FALLBACK: &str = "Lo siento, no pude entender tu solicitud. ¿Podrías repetirla?";

const DEFAULT_RECIPE_TOPIC: &str = "una receta saludable y fácil";

pub fn recipe_ready(name: &str) -> String {
    format!("¡Aquí tienes una receta para \"{name}\"!")
}

pub fn time_of_day(hour: u32, minute: u32) -> String {
    format!("Son las {hour} y {minute} minutos.")
}

pub fn today(long_date: &str) -> String {
    format!("Hoy es {long_date}.")
}

/// Human name of the response language for a BCP-47 style tag.
fn language_name(locale: &str) -> &'static str {
    match locale.split(['-', '_']).next().unwrap_or_default() {
        "en" => "inglés",
        "pt" => "portugués",
        "fr" => "francés",
        "it" => "italiano",
        _ => "español",
    }
}

pub fn emotional_support_prompt(text: &str, locale: &str) -> String {
    format!(
        "El usuario dice: \"{text}\". Responde con palabras de apoyo y ánimo, y sugiere una actividad \
         sencilla y positiva para mejorar su estado de ánimo. Usa un tono cálido y empático, \
         responde en {} y no uses lenguaje técnico.",
        language_name(locale)
    )
}

pub fn recipe_prompt(query: &str) -> String {
    let topic = if query.is_empty() { DEFAULT_RECIPE_TOPIC } else { query };
    format!(
        "Genera una receta saludable en formato JSON con los campos 'recipeName' (texto), \
         'ingredients' (lista de textos) e 'instructions' (lista de textos) para el siguiente \
         tema o ingredientes: {topic}."
    )
}

/// Output schema constraining recipe replies.
pub fn recipe_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "recipeName": { "type": "STRING" },
            "ingredients": { "type": "ARRAY", "items": { "type": "STRING" } },
            "instructions": { "type": "ARRAY", "items": { "type": "STRING" } }
        },
        "required": ["recipeName", "ingredients", "instructions"],
        "propertyOrdering": ["recipeName", "ingredients", "instructions"]
    })
}
