//! Per-frame voice activity and the endpointing state machine that turns it
//! into "utterance complete" or "nobody spoke".

use std::time::Duration;

use rubato::{FftFixedIn, Resampler};
use tracing::debug;
use webrtc_vad::{SampleRate, Vad, VadMode};

use super::wav::to_pcm16;

/// VAD frame duration.
pub const FRAME_MS: u64 = 30;

/// Sample rates the VAD accepts, preferred first.
pub const VAD_RATES: [u32; 4] = [16_000, 32_000, 48_000, 8_000];

pub fn frame_len(sample_rate: u32) -> usize {
    (sample_rate as usize * FRAME_MS as usize) / 1000
}

/// WebRTC VAD wrapper working on f32 frames of [`frame_len`] samples.
pub struct VoiceDetector {
    vad: Vad,
    pcm: Vec<i16>,
}

impl VoiceDetector {
    pub fn new(sample_rate: u32) -> anyhow::Result<Self> {
        let rate = match sample_rate {
            8_000 => SampleRate::Rate8kHz,
            16_000 => SampleRate::Rate16kHz,
            32_000 => SampleRate::Rate32kHz,
            48_000 => SampleRate::Rate48kHz,
            other => anyhow::bail!("unsupported VAD rate {other}Hz"),
        };
        Ok(Self {
            vad: Vad::new_with_rate_and_mode(rate, VadMode::Aggressive),
            pcm: vec![0; frame_len(sample_rate)],
        })
    }

    pub fn is_speech(&mut self, frame: &[f32]) -> bool {
        self.pcm.clear();
        self.pcm.extend(frame.iter().map(|&s| to_pcm16(s)));
        match self.vad.is_voice_segment(&self.pcm) {
            Ok(speech) => speech,
            Err(()) => {
                debug!(len = frame.len(), "VAD rejected frame");
                false
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointConfig {
    /// Consecutive voiced frames that count as the start of speech
    pub min_speech_frames: u32,
    /// Consecutive silent frames that end an utterance
    pub trailing_silence_frames: u32,
    /// Hard cap on the whole activation
    pub max_frames: u32,
    /// Give up if speech has not started after this many frames
    pub no_speech_frames: u32,
}

impl EndpointConfig {
    pub fn new(max_utterance: Duration, no_speech_timeout: Duration, trailing_silence: Duration) -> Self {
        Self {
            min_speech_frames: 3,
            trailing_silence_frames: frames(trailing_silence).max(1),
            max_frames: frames(max_utterance).max(1),
            no_speech_frames: frames(no_speech_timeout).max(1),
        }
    }
}

fn frames(duration: Duration) -> u32 {
    u32::try_from(duration.as_millis() / u128::from(FRAME_MS)).unwrap_or(u32::MAX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Continue,
    /// Speech was heard and has ended (or hit the cap)
    Complete,
    NoSpeech,
}

/// Debounced speech start/end detection over VAD decisions.
#[derive(Debug)]
pub struct Endpointer {
    config: EndpointConfig,
    frames: u32,
    speech_run: u32,
    silence_run: u32,
    speaking: bool,
}

impl Endpointer {
    pub fn new(config: EndpointConfig) -> Self {
        Self {
            config,
            frames: 0,
            speech_run: 0,
            silence_run: 0,
            speaking: false,
        }
    }

    pub fn heard_speech(&self) -> bool {
        self.speaking
    }

    pub fn push(&mut self, voiced: bool) -> Endpoint {
        self.frames += 1;
        if voiced {
            self.speech_run += 1;
            self.silence_run = 0;
        } else {
            self.speech_run = 0;
            self.silence_run += 1;
        }

        if !self.speaking && self.speech_run >= self.config.min_speech_frames {
            self.speaking = true;
            debug!(frame = self.frames, "speech start");
        }

        if self.speaking && self.silence_run >= self.config.trailing_silence_frames {
            debug!(frame = self.frames, "speech end");
            return Endpoint::Complete;
        }
        if self.frames >= self.config.max_frames {
            return if self.speaking { Endpoint::Complete } else { Endpoint::NoSpeech };
        }
        if !self.speaking && self.frames >= self.config.no_speech_frames {
            return Endpoint::NoSpeech;
        }
        Endpoint::Continue
    }
}

/// Resample a mono buffer, e.g. 48kHz capture down to 16kHz for transcription.
pub fn resample(samples: &[f32], from: u32, to: u32) -> anyhow::Result<Vec<f32>> {
    if from == to || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let mut resampler = FftFixedIn::<f32>::new(from as usize, to as usize, 1024, 2, 1)?;
    let mut out = Vec::with_capacity(samples.len() * to as usize / from as usize + 1024);
    let mut rest = samples;

    while rest.len() >= resampler.input_frames_next() {
        let (chunk, tail) = rest.split_at(resampler.input_frames_next());
        let frames = resampler.process(&[chunk][..], None)?;
        out.extend_from_slice(&frames[0]);
        rest = tail;
    }
    if !rest.is_empty() {
        let frames = resampler.process_partial(Some(&[rest][..]), None)?;
        out.extend_from_slice(&frames[0]);
    }
    // Flush the filter delay
    let frames = resampler.process_partial::<&[f32]>(None, None)?;
    out.extend_from_slice(&frames[0]);

    Ok(out)
}
