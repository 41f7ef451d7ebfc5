use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use senior_connect::config::{RecognitionBackend, SynthesisBackend, CONFIG_PATH_ENV};
use senior_connect::kernel::phrases;
use senior_connect::kernel::state::SectionId;
use senior_connect::sections::SectionAction;
use senior_connect::services::llm::GeminiClient;
use senior_connect::services::transcription::Transcriber;
use senior_connect::speech::{
    CommandSynthesizer, ConsoleSynthesizer, MicrophoneRecognizer, SpeechRecognizer, SpeechSynthesizer, TextFeed,
    TextRecognizer, UnavailableRecognizer,
};
use senior_connect::{Config, Reactor, ReactorConfig, Session, SessionHandle};

const HELP: &str = "[Enter] micrófono · :inicio · :hospitales · :emergencia · :salir";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("senior_connect=info")))
        .init();

    let path = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
    let config = Config::load(path.as_deref()).context("loading configuration")?;
    tracing::info!(locale = %config.locale, recognizer = ?config.recognition.backend, "starting");

    let language = GeminiClient::new(&config.language).context("language service")?;
    let (recognizer, feed) = build_recognizer(&config)?;
    let synthesizer: Box<dyn SpeechSynthesizer> = match config.synthesis.backend {
        SynthesisBackend::Command => Box::new(CommandSynthesizer::new(&config.synthesis)),
        SynthesisBackend::Console => Box::new(ConsoleSynthesizer),
    };

    let reactor = Reactor::new(ReactorConfig {
        locale: config.locale.clone(),
        discard_stale_replies: config.session.discard_stale_replies,
    });
    let session = Session::new(
        reactor,
        recognizer,
        synthesizer,
        Arc::new(language),
        Duration::from_secs(config.language.timeout_secs),
    );
    let handle = session.handle();

    let shutdown = CancellationToken::new();
    let runner = tokio::spawn(session.run(shutdown.clone()));

    println!("{}", phrases::WELCOME);
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => match line? {
                Some(line) if handle_line(line.trim(), &handle, feed.as_ref()) => {}
                _ => break,
            },
        }
    }

    tracing::info!("shutting down");
    shutdown.cancel();
    runner.await?;
    Ok(())
}

fn build_recognizer(config: &Config) -> anyhow::Result<(Box<dyn SpeechRecognizer>, Option<TextFeed>)> {
    Ok(match config.recognition.backend {
        RecognitionBackend::Microphone => {
            let transcriber = Transcriber::new(&config.recognition, &config.locale).context("transcription service")?;
            (Box::new(MicrophoneRecognizer::new(transcriber, &config.recognition)), None)
        }
        RecognitionBackend::Console => {
            let (feed, recognizer) = TextRecognizer::channel();
            (Box::new(recognizer), Some(feed))
        }
        RecognitionBackend::Disabled => (Box::new(UnavailableRecognizer), None),
    })
}

/// Returns false when the user asked to quit.
fn handle_line(line: &str, handle: &SessionHandle, feed: Option<&TextFeed>) -> bool {
    match line {
        "" => {
            // The microphone button listens for what is typed next
            if let Some(feed) = feed {
                feed.clear();
            }
            handle.toggle();
        }
        ":salir" => return false,
        ":inicio" => {
            handle.section(SectionAction::Open(SectionId::Home));
        }
        ":hospitales" => {
            handle.section(SectionAction::FindNearbyHospitals);
        }
        ":emergencia" => {
            handle.section(SectionAction::CallEmergency);
        }
        text => match feed {
            Some(feed) => {
                feed.say(text);
                handle.activate();
            }
            None => println!("{HELP}"),
        },
    }
    true
}
