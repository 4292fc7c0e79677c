//! Request parameters and the JSON control documents built from them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Audio container formats the engine can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioFormat {
    Mp3,
    OggOpus,
    /// Raw signed 16-bit little-endian samples, mono.
    Pcm,
}

impl AudioFormat {
    /// Name used in the session config document.
    pub fn as_str(self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::OggOpus => "ogg_opus",
            AudioFormat::Pcm => "pcm",
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AudioFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "mp3" => Ok(AudioFormat::Mp3),
            "ogg_opus" | "ogg-opus" => Ok(AudioFormat::OggOpus),
            "pcm" => Ok(AudioFormat::Pcm),
            other => Err(format!("unknown audio format: {other}")),
        }
    }
}

/// Everything one synthesis call needs.
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    /// Source text to synthesize.
    pub text: String,
    /// Voice identifier.
    pub voice: String,
    /// Requested audio container format.
    pub format: AudioFormat,
    /// Output sample rate in Hz.
    pub sample_rate: u32,
    /// Speech-rate offset relative to the voice default.
    pub speech_rate: i32,
    /// Loudness offset relative to the voice default.
    pub loudness_rate: i32,
    /// Opaque caller-chosen user id, echoed into the session config.
    pub uid: String,
}

impl SynthesisRequest {
    /// Request for `text` spoken by `voice`, with default audio parameters.
    pub fn new(text: impl Into<String>, voice: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice: voice.into(),
            format: AudioFormat::Mp3,
            sample_rate: 24_000,
            speech_rate: 0,
            loudness_rate: 0,
            uid: "vox".to_string(),
        }
    }

    /// Session config document sent with `StartSession`.
    pub(crate) fn session_config(&self) -> SessionConfig<'_> {
        SessionConfig {
            user: UserId { uid: &self.uid },
            req_params: ReqParams {
                speaker: &self.voice,
                text: &self.text,
                audio_params: AudioParams {
                    format: self.format.as_str(),
                    sample_rate: self.sample_rate,
                    speech_rate: self.speech_rate,
                    loudness_rate: self.loudness_rate,
                },
            },
        }
    }

    /// `TaskRequest` payload.
    pub(crate) fn task(&self) -> TaskPayload<'_> {
        TaskPayload { text: &self.text }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SessionConfig<'a> {
    pub user: UserId<'a>,
    pub req_params: ReqParams<'a>,
}

#[derive(Debug, Serialize)]
pub(crate) struct UserId<'a> {
    pub uid: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ReqParams<'a> {
    pub speaker: &'a str,
    pub text: &'a str,
    pub audio_params: AudioParams,
}

#[derive(Debug, Serialize)]
pub(crate) struct AudioParams {
    pub format: &'static str,
    pub sample_rate: u32,
    pub speech_rate: i32,
    pub loudness_rate: i32,
}

#[derive(Debug, Serialize)]
pub(crate) struct TaskPayload<'a> {
    pub text: &'a str,
}
