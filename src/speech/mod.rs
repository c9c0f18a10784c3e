//! Speech synthesis boundary and audio stitching.
//!
//! Synthesis is one blocking call per text chunk with a hard input-size
//! ceiling; the stitcher assembles per-chunk segments into the final artifact.

mod stitcher;

pub use stitcher::AudioAssembler;

use crate::error::{FortellError, Result};
use crate::openai::create_client;
use async_openai::types::{CreateSpeechRequestArgs, SpeechModel, Voice};
use async_trait::async_trait;
use tracing::{debug, warn};

/// Per-call input ceiling of the speech provider, in characters.
pub const MAX_INPUT_CHARS: usize = 4096;

/// Opaque per-chunk text-to-audio conversion.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Convert one text chunk into encoded audio bytes.
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;
}

/// OpenAI text-to-speech synthesizer.
pub struct OpenAiSpeech {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: SpeechModel,
    voice: Voice,
}

impl OpenAiSpeech {
    /// Create a synthesizer with the configured model and voice.
    pub fn with_config(model: &str, voice: &str) -> Self {
        Self {
            client: create_client(),
            model: parse_model(model),
            voice: parse_voice(voice),
        }
    }
}

fn parse_model(model: &str) -> SpeechModel {
    match model {
        "tts-1" => SpeechModel::Tts1,
        "tts-1-hd" => SpeechModel::Tts1Hd,
        other => SpeechModel::Other(other.to_string()),
    }
}

fn parse_voice(voice: &str) -> Voice {
    match voice.to_lowercase().as_str() {
        "alloy" => Voice::Alloy,
        "ash" => Voice::Ash,
        "coral" => Voice::Coral,
        "echo" => Voice::Echo,
        "fable" => Voice::Fable,
        "onyx" => Voice::Onyx,
        "nova" => Voice::Nova,
        "sage" => Voice::Sage,
        "shimmer" => Voice::Shimmer,
        other => {
            warn!("Unknown voice '{}', falling back to alloy", other);
            Voice::Alloy
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAiSpeech {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let char_count = text.chars().count();
        if char_count > MAX_INPUT_CHARS {
            return Err(FortellError::Synthesis(format!(
                "chunk of {} chars exceeds the provider ceiling of {}",
                char_count, MAX_INPUT_CHARS
            )));
        }

        debug!("Synthesizing chunk of {} chars", char_count);

        let request = CreateSpeechRequestArgs::default()
            .model(self.model.clone())
            .voice(self.voice.clone())
            .input(text.to_string())
            .build()
            .map_err(|e| FortellError::Synthesis(e.to_string()))?;

        let response = self
            .client
            .audio()
            .speech(request)
            .await
            .map_err(|e| FortellError::OpenAI(format!("Speech API error: {}", e)))?;

        Ok(response.bytes.to_vec())
    }
}
