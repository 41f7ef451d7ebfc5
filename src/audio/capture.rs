use std::time::{Duration, Instant};

use anyhow::anyhow;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::HeapRb;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::processing::{frame_len, resample, EndpointConfig, Endpoint, Endpointer, VoiceDetector, VAD_RATES};
use super::TRANSCRIPTION_RATE;
use crate::config::RecognitionConfig;

#[derive(Debug, Clone, Copy)]
pub struct CaptureSettings {
    pub max_utterance: Duration,
    pub no_speech_timeout: Duration,
    pub trailing_silence: Duration,
}

impl From<&RecognitionConfig> for CaptureSettings {
    fn from(config: &RecognitionConfig) -> Self {
        Self {
            max_utterance: Duration::from_secs(config.max_utterance_secs),
            no_speech_timeout: Duration::from_secs(config.no_speech_timeout_secs),
            trailing_silence: Duration::from_millis(config.trailing_silence_ms),
        }
    }
}

/// Outcome of one listening window.
#[derive(Debug)]
pub enum Utterance {
    /// Mono samples at [`TRANSCRIPTION_RATE`]
    Speech(Vec<f32>),
    NoSpeech,
    Cancelled,
}

pub fn input_available() -> bool {
    cpal::default_host().default_input_device().is_some()
}

/// Live input stream feeding mono samples into a ring buffer.
/// Dropping it stops the device.
struct AudioCapture {
    _stream: cpal::Stream,
    sample_rate: u32,
}

impl AudioCapture {
    fn new<P>(mut producer: P) -> anyhow::Result<Self>
    where
        P: Producer<Item = f32> + Send + 'static,
    {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| anyhow!("no input device available"))?;

        debug!(device = %device.name().unwrap_or_default(), "opening input device");

        // First VAD-compatible rate the device supports, else its default
        let mut selected = None;
        'rates: for &rate in &VAD_RATES {
            for range in device.supported_input_configs()? {
                if range.min_sample_rate().0 <= rate && range.max_sample_rate().0 >= rate {
                    selected = Some(range.with_sample_rate(cpal::SampleRate(rate)));
                    break 'rates;
                }
            }
        }
        let config = match selected {
            Some(config) => config,
            None => {
                let fallback = device.default_input_config()?;
                if !VAD_RATES.contains(&fallback.sample_rate().0) {
                    return Err(anyhow!("unsupported input rate {}Hz", fallback.sample_rate().0));
                }
                fallback
            }
        };

        let sample_rate = config.sample_rate().0;
        let channels = usize::from(config.channels()).max(1);
        info!(sample_rate, channels, "microphone open");

        let err_fn = |err| error!(error = %err, "input stream error");

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => device.build_input_stream(
                &config.into(),
                move |data: &[f32], _: &_| {
                    for frame in data.chunks(channels) {
                        // Lossy when full
                        let _ = producer.try_push(frame.iter().sum::<f32>() / frame.len() as f32);
                    }
                },
                err_fn,
                None,
            )?,
            cpal::SampleFormat::I16 => device.build_input_stream(
                &config.into(),
                move |data: &[i16], _: &_| {
                    for frame in data.chunks(channels) {
                        let sum: f32 = frame.iter().map(|&s| f32::from(s) / f32::from(i16::MAX)).sum();
                        let _ = producer.try_push(sum / frame.len() as f32);
                    }
                },
                err_fn,
                None,
            )?,
            other => return Err(anyhow!("unsupported sample format {other:?}")),
        };

        stream.play()?;

        Ok(Self {
            _stream: stream,
            sample_rate,
        })
    }
}

/// Record from the default microphone until the speaker stops, nobody
/// speaks, or `cancel` fires. Blocking; run it on a blocking thread.
pub fn capture_utterance(settings: &CaptureSettings, cancel: &CancellationToken) -> anyhow::Result<Utterance> {
    let ring = HeapRb::<f32>::new(1 << 16);
    let (producer, mut consumer) = ring.split();
    let capture = AudioCapture::new(producer)?;
    let rate = capture.sample_rate;

    let mut detector = VoiceDetector::new(rate)?;
    let mut endpointer = Endpointer::new(EndpointConfig::new(
        settings.max_utterance,
        settings.no_speech_timeout,
        settings.trailing_silence,
    ));

    let mut frame = vec![0.0_f32; frame_len(rate)];
    let mut recorded = Vec::new();
    // A device that stops delivering samples must not hang the activation
    let deadline = Instant::now() + settings.max_utterance + Duration::from_secs(1);

    loop {
        if cancel.is_cancelled() {
            return Ok(Utterance::Cancelled);
        }
        if consumer.occupied_len() < frame.len() {
            if Instant::now() > deadline {
                return Ok(if endpointer.heard_speech() {
                    Utterance::Speech(resample(&recorded, rate, TRANSCRIPTION_RATE)?)
                } else {
                    Utterance::NoSpeech
                });
            }
            std::thread::sleep(Duration::from_millis(10));
            continue;
        }

        consumer.pop_slice(&mut frame);
        recorded.extend_from_slice(&frame);

        match endpointer.push(detector.is_speech(&frame)) {
            Endpoint::Continue => {}
            Endpoint::Complete => break,
            Endpoint::NoSpeech => return Ok(Utterance::NoSpeech),
        }
    }

    drop(capture);
    debug!(samples = recorded.len(), rate, "utterance captured");
    Ok(Utterance::Speech(resample(&recorded, rate, TRANSCRIPTION_RATE)?))
}
