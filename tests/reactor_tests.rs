use chrono::{Local, TimeZone};

use senior_connect::kernel::event::{Event, RecognitionSignal, RequestId};
use senior_connect::kernel::phrases;
use senior_connect::kernel::reactor::{Reactor, ReactorConfig};
use senior_connect::kernel::scheduler::SideEffect;
use senior_connect::kernel::state::{GenerationKind, Recipe, SectionId, SessionPhase};
use senior_connect::kernel::time::FixedClock;
use senior_connect::sections::SectionReport;
use senior_connect::services::llm::{GenerationError, GenerationReply, GenerationRequest};

const PAELLA: &str = r#"{"recipeName":"Paella","ingredients":["arroz"],"instructions":["cocinar"]}"#;

fn reactor_with(discard_stale_replies: bool) -> Reactor {
    let now = Local
        .with_ymd_and_hms(2026, 10, 17, 9, 5, 0)
        .single()
        .expect("unambiguous local time");
    Reactor::with_clock(
        ReactorConfig {
            locale: "es-ES".to_string(),
            discard_stale_replies,
        },
        Box::new(FixedClock(now)),
    )
}

fn reactor() -> Reactor {
    reactor_with(false)
}

fn signal(signal: RecognitionSignal) -> Event {
    Event::Recognition(signal)
}

/// Run one activation through to the transcript and return the effects
/// emitted for the transcript.
fn hear(reactor: &mut Reactor, transcript: &str) -> Vec<SideEffect> {
    let effects = reactor.step(vec![Event::ActivationRequested]);
    assert_eq!(effects, vec![SideEffect::StartRecognition]);
    assert!(reactor.step(vec![signal(RecognitionSignal::Started)]).is_empty());
    reactor.step(vec![signal(RecognitionSignal::Result(transcript.to_string()))])
}

fn end(reactor: &mut Reactor) {
    assert!(reactor.step(vec![signal(RecognitionSignal::Ended)]).is_empty());
}

fn generate_effect(effects: &[SideEffect]) -> (RequestId, GenerationRequest) {
    effects
        .iter()
        .find_map(|effect| match effect {
            SideEffect::Generate { request_id, request } => Some((*request_id, request.clone())),
            _ => None,
        })
        .expect("deferred intent must emit Generate")
}

fn finished(request_id: RequestId, result: Result<GenerationReply, GenerationError>) -> Event {
    Event::GenerationFinished { request_id, result }
}

#[test]
fn test_initial_state() {
    let reactor = reactor();
    assert_eq!(reactor.phase(), SessionPhase::Idle);
    assert_eq!(reactor.state.last_response, phrases::WELCOME);
    assert_eq!(reactor.state.active_section, SectionId::Home);
    assert!(reactor.state.pending_recipe.is_none());
}

#[test]
fn test_greeting_cycle() {
    let mut reactor = reactor();

    // 1. Activation -> Listening
    assert_eq!(reactor.step(vec![Event::ActivationRequested]), vec![SideEffect::StartRecognition]);
    assert_eq!(reactor.phase(), SessionPhase::Listening);

    // 2. Started shows the listening indicator without speaking it
    assert!(reactor.step(vec![signal(RecognitionSignal::Started)]).is_empty());
    assert!(reactor.state.listening);
    assert_eq!(reactor.state.last_response, phrases::LISTENING);

    // 3. Transcript is answered in the same step
    let effects = reactor.step(vec![signal(RecognitionSignal::Result("Hola".to_string()))]);
    assert_eq!(effects, vec![SideEffect::Speak(phrases::GREETING.to_string())]);
    assert_eq!(reactor.state.last_transcript, "Hola");
    assert_eq!(reactor.state.last_response, phrases::GREETING);

    // 4. Ended -> Idle, answer stays on screen
    end(&mut reactor);
    assert_eq!(reactor.phase(), SessionPhase::Idle);
    assert_eq!(reactor.state.last_response, phrases::GREETING);
}

#[test]
fn test_activation_is_ignored_unless_idle() {
    let mut reactor = reactor();
    reactor.step(vec![Event::ActivationRequested]);
    assert!(
        reactor.step(vec![Event::ActivationRequested]).is_empty(),
        "Second activation while listening must be a no-op"
    );

    reactor.step(vec![signal(RecognitionSignal::Started)]);
    reactor.step(vec![signal(RecognitionSignal::Result("Estoy triste".to_string()))]);
    end(&mut reactor);
    assert_eq!(reactor.phase(), SessionPhase::Processing);

    let version = reactor.state.version;
    assert!(
        reactor.step(vec![Event::ActivationRequested]).is_empty(),
        "Activation while processing must be a no-op"
    );
    assert_eq!(reactor.state.version, version, "Ignored activation must not touch state");
}

#[test]
fn test_stop_is_idempotent() {
    let mut reactor = reactor();
    assert!(reactor.step(vec![Event::StopRequested]).is_empty(), "Nothing to stop while idle");

    reactor.step(vec![Event::ActivationRequested, signal(RecognitionSignal::Started)]);
    assert_eq!(reactor.step(vec![Event::StopRequested]), vec![SideEffect::StopRecognition]);

    // Adapter confirms with Ended and no Result
    end(&mut reactor);
    assert_eq!(reactor.phase(), SessionPhase::Idle);
    assert_eq!(reactor.state.last_response, phrases::WELCOME, "Listening indicator must be cleared");
    assert!(reactor.step(vec![Event::StopRequested]).is_empty());
}

#[test]
fn test_navigation_changes_section_and_speaks() {
    let mut reactor = reactor();
    let effects = hear(&mut reactor, "Quiero enviar un mensaje");
    assert_eq!(effects, vec![SideEffect::Speak(phrases::OPEN_MESSAGES.to_string())]);
    assert_eq!(reactor.state.active_section, SectionId::Messages);

    end(&mut reactor);
    hear(&mut reactor, "Mi rutina de salud");
    assert_eq!(reactor.state.active_section, SectionId::Reminders);
    assert_eq!(reactor.state.last_response, phrases::HEALTH_ROUTINE);
}

#[test]
fn test_time_and_date_are_immediate() {
    let mut reactor = reactor();
    let effects = hear(&mut reactor, "¿Qué hora es?");
    assert_eq!(effects, vec![SideEffect::Speak("Son las 9 y 5 minutos.".to_string())]);
    end(&mut reactor);

    let effects = hear(&mut reactor, "que dia es hoy");
    assert_eq!(effects.len(), 1, "TellDate must not reach the language service");
    match &effects[0] {
        SideEffect::Speak(text) => assert!(text.contains("17 de octubre de 2026"), "got {text}"),
        other => panic!("unexpected effect {other:?}"),
    }
    assert_eq!(reactor.state.active_section, SectionId::Home);
}

#[test]
fn test_recipe_success_stores_recipe_and_switches_section() {
    let mut reactor = reactor();
    let effects = hear(&mut reactor, "Dame una receta de pollo");

    // Processing indicator is shown and spoken
    assert_eq!(effects[0], SideEffect::Speak(phrases::PROCESSING_SPOKEN.to_string()));
    assert_eq!(reactor.state.last_response, phrases::PROCESSING);
    let (request_id, request) = generate_effect(&effects);
    assert!(request.is_structured());
    assert!(request.prompt.contains("pollo"));
    assert_eq!(reactor.state.pending.as_ref().map(|p| p.kind), Some(GenerationKind::Recipe));

    // Ended during the suspension must not clear the indicator
    end(&mut reactor);
    assert_eq!(reactor.state.last_response, phrases::PROCESSING);
    assert_eq!(reactor.phase(), SessionPhase::Processing);

    let effects = reactor.step(vec![finished(request_id, Ok(GenerationReply::new(PAELLA)))]);
    let expected = "¡Aquí tienes una receta para \"Paella\"!".to_string();
    assert_eq!(effects, vec![SideEffect::Speak(expected.clone())]);
    assert_eq!(reactor.state.last_response, expected);
    assert_eq!(reactor.state.active_section, SectionId::Recipes);
    assert_eq!(
        reactor.state.pending_recipe,
        Some(Recipe {
            name: "Paella".to_string(),
            ingredients: vec!["arroz".to_string()],
            instructions: vec!["cocinar".to_string()],
        })
    );
    assert_eq!(reactor.phase(), SessionPhase::Idle);
}

#[test]
fn test_recipe_failure_keeps_previous_recipe() {
    let mut reactor = reactor();
    let effects = hear(&mut reactor, "receta de pollo");
    let (request_id, _) = generate_effect(&effects);
    end(&mut reactor);
    reactor.step(vec![finished(request_id, Ok(GenerationReply::new(PAELLA)))]);

    // 1. Empty candidate -> ask to be more specific
    let effects = hear(&mut reactor, "receta de sopa");
    let (request_id, _) = generate_effect(&effects);
    end(&mut reactor);
    let effects = reactor.step(vec![finished(request_id, Err(GenerationError::EmptyCandidate))]);
    assert_eq!(effects, vec![SideEffect::Speak(phrases::RECIPE_EMPTY.to_string())]);
    assert_eq!(reactor.state.pending_recipe.as_ref().map(|r| r.name.as_str()), Some("Paella"));

    // 2. Malformed reply -> generic recipe failure
    let effects = hear(&mut reactor, "receta de sopa");
    let (request_id, _) = generate_effect(&effects);
    end(&mut reactor);
    let effects = reactor.step(vec![finished(request_id, Ok(GenerationReply::new("no es json")))]);
    assert_eq!(effects, vec![SideEffect::Speak(phrases::RECIPE_FAILED.to_string())]);
    assert_eq!(reactor.state.pending_recipe.as_ref().map(|r| r.name.as_str()), Some("Paella"));
}

#[test]
fn test_emotional_and_fallback_failures_use_canned_texts() {
    let mut reactor = reactor();
    let effects = hear(&mut reactor, "Me siento solo");
    let (request_id, request) = generate_effect(&effects);
    assert!(!request.is_structured());
    assert!(request.prompt.contains("Me siento solo"));
    end(&mut reactor);
    let effects = reactor.step(vec![finished(request_id, Err(GenerationError::Network("down".into())))]);
    assert_eq!(effects, vec![SideEffect::Speak(phrases::EMOTIONAL_FALLBACK.to_string())]);

    let effects = hear(&mut reactor, "Cuéntame un chiste");
    let (request_id, request) = generate_effect(&effects);
    assert_eq!(request.prompt, "Cuéntame un chiste", "Open questions are forwarded as-is");
    end(&mut reactor);
    let effects = reactor.step(vec![finished(request_id, Err(GenerationError::EmptyCandidate))]);
    assert_eq!(effects, vec![SideEffect::Speak(phrases::OPEN_FALLBACK.to_string())]);
    assert_eq!(reactor.phase(), SessionPhase::Idle);
}

#[test]
fn test_unknown_and_duplicate_replies_are_dropped() {
    let mut reactor = reactor();
    let effects = hear(&mut reactor, "Cuéntame un chiste");
    let (request_id, _) = generate_effect(&effects);
    end(&mut reactor);

    let version = reactor.state.version;
    assert!(reactor
        .step(vec![finished(RequestId::new(), Ok(GenerationReply::new("otro")))])
        .is_empty());
    assert_eq!(reactor.state.version, version);
    assert_eq!(reactor.phase(), SessionPhase::Processing);

    let effects = reactor.step(vec![finished(request_id, Ok(GenerationReply::new("Un chiste.")))]);
    assert_eq!(effects, vec![SideEffect::Speak("Un chiste.".to_string())]);
    assert!(reactor
        .step(vec![finished(request_id, Ok(GenerationReply::new("Otra vez.")))])
        .is_empty());
    assert_eq!(reactor.state.last_response, "Un chiste.");
}

#[test]
fn test_transcript_while_processing_is_ignored() {
    let mut reactor = reactor();
    let effects = hear(&mut reactor, "Cuéntame un chiste");
    let (request_id, _) = generate_effect(&effects);

    assert!(reactor
        .step(vec![signal(RecognitionSignal::Result("hola".to_string()))])
        .is_empty());
    assert_eq!(reactor.state.pending.as_ref().map(|p| p.request_id), Some(request_id));
}

#[test]
fn test_stale_reply_applies_by_default() {
    let mut reactor = reactor();
    let effects = hear(&mut reactor, "receta de pollo");
    let (request_id, _) = generate_effect(&effects);
    end(&mut reactor);

    reactor.step(vec![Event::SectionReported(SectionReport {
        section: Some(SectionId::Messages),
        response: "Sección de mensajes.".to_string(),
    })]);

    reactor.step(vec![finished(request_id, Ok(GenerationReply::new(PAELLA)))]);
    assert_eq!(reactor.state.active_section, SectionId::Recipes);
    assert!(reactor.state.pending_recipe.is_some());
}

#[test]
fn test_stale_reply_discarded_when_configured() {
    let mut reactor = reactor_with(true);
    let effects = hear(&mut reactor, "receta de pollo");
    let (request_id, _) = generate_effect(&effects);
    end(&mut reactor);

    reactor.step(vec![Event::SectionReported(SectionReport {
        section: Some(SectionId::Messages),
        response: "Sección de mensajes.".to_string(),
    })]);

    let effects = reactor.step(vec![finished(request_id, Ok(GenerationReply::new(PAELLA)))]);
    assert!(effects.is_empty(), "Stale reply must not be spoken");
    assert_eq!(reactor.phase(), SessionPhase::Idle);
    assert_eq!(reactor.state.active_section, SectionId::Messages);
    assert!(reactor.state.pending_recipe.is_none());
}

#[test]
fn test_navigate_home_clears_recipe() {
    let mut reactor = reactor();
    let effects = hear(&mut reactor, "receta de pollo");
    let (request_id, _) = generate_effect(&effects);
    end(&mut reactor);
    reactor.step(vec![finished(request_id, Ok(GenerationReply::new(PAELLA)))]);
    assert!(reactor.state.pending_recipe.is_some());

    let effects = hear(&mut reactor, "Volver al inicio");
    assert_eq!(effects, vec![SideEffect::Speak(phrases::NAVIGATE_HOME.to_string())]);
    assert_eq!(reactor.state.active_section, SectionId::Home);
    assert!(reactor.state.pending_recipe.is_none());
}

#[test]
fn test_recognition_error_restores_previous_response() {
    let mut reactor = reactor();
    hear(&mut reactor, "Hola");
    end(&mut reactor);

    reactor.step(vec![Event::ActivationRequested, signal(RecognitionSignal::Started)]);
    assert_eq!(reactor.state.last_response, phrases::LISTENING);
    let effects = reactor.step(vec![
        signal(RecognitionSignal::Error("no-speech".to_string())),
        signal(RecognitionSignal::Ended),
    ]);
    assert!(effects.is_empty(), "Recognition errors are not spoken");
    assert_eq!(reactor.state.last_response, phrases::GREETING);
    assert_eq!(reactor.phase(), SessionPhase::Idle);
}

#[test]
fn test_empty_transcript_is_ignored() {
    let mut reactor = reactor();
    assert!(hear(&mut reactor, "   ").is_empty());
    end(&mut reactor);
    assert_eq!(reactor.state.last_transcript, "");
    assert_eq!(reactor.state.last_response, phrases::WELCOME);
}

#[test]
fn test_unsupported_disables_activation() {
    let mut reactor = reactor();
    reactor.step(vec![Event::ActivationRequested]);

    let effects = reactor.step(vec![signal(RecognitionSignal::Unsupported)]);
    assert_eq!(effects, vec![SideEffect::Speak(phrases::RECOGNITION_UNSUPPORTED.to_string())]);
    assert!(!reactor.state.recognition_available);
    assert_eq!(reactor.phase(), SessionPhase::Idle);

    // Notice is given once; further activations do nothing
    assert!(reactor.step(vec![signal(RecognitionSignal::Unsupported)]).is_empty());
    assert!(reactor.step(vec![Event::ActivationRequested]).is_empty());
}

#[test]
fn test_section_report_to_home_clears_recipe() {
    let mut reactor = reactor();
    let effects = hear(&mut reactor, "receta de pollo");
    let (request_id, _) = generate_effect(&effects);
    end(&mut reactor);
    reactor.step(vec![finished(request_id, Ok(GenerationReply::new(PAELLA)))]);

    let effects = reactor.step(vec![Event::SectionReported(SectionReport {
        section: Some(SectionId::Home),
        response: "Volviendo a la página de inicio.".to_string(),
    })]);
    assert_eq!(effects, vec![SideEffect::Speak("Volviendo a la página de inicio.".to_string())]);
    assert_eq!(reactor.state.active_section, SectionId::Home);
    assert!(reactor.state.pending_recipe.is_none());
}
