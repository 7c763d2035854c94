/// Voice used for spoken responses when no other voice is configured.
pub const DEFAULT_VOICE_NAME: &str = "Aoede";

/// The first message of every live session.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Setup {
    /// Model resource name, ex: "gemini-2.0-flash-001" or a fully qualified Vertex AI path.
    model: String,

    /// Sampling and output configuration for the whole session.
    generation_config: GenerationConfig,
}

impl Setup {
    pub fn builder(model: &str) -> SetupBuilder {
        SetupBuilder::new(model)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn generation_config(&self) -> &GenerationConfig {
        &self.generation_config
    }

    pub fn response_modalities(&self) -> &[Modality] {
        self.generation_config.response_modalities()
    }
}

pub struct SetupBuilder {
    model: String,
    generation_config: GenerationConfig,
    voice_name: Option<String>,
}

impl SetupBuilder {
    pub fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
            generation_config: GenerationConfig::default(),
            voice_name: None,
        }
    }

    pub fn with_generation_config(mut self, generation_config: GenerationConfig) -> Self {
        self.generation_config = generation_config;
        self
    }

    pub fn with_voice_name(mut self, voice_name: &str) -> Self {
        self.voice_name = Some(voice_name.to_string());
        self
    }

    /// Fills in the session defaults: TEXT responses when no modality was chosen,
    /// and a prebuilt voice whenever AUDIO responses are requested.
    pub fn build(self) -> Setup {
        let mut generation_config = self.generation_config;
        if generation_config.response_modalities.is_empty() {
            generation_config.response_modalities = vec![Modality::Text];
        }
        if generation_config.response_modalities.contains(&Modality::Audio)
            && generation_config.speech_config.is_none()
        {
            let voice_name = self
                .voice_name
                .unwrap_or_else(|| DEFAULT_VOICE_NAME.to_string());
            generation_config.speech_config = Some(SpeechConfig::prebuilt(&voice_name));
        }
        Setup {
            model: self.model,
            generation_config,
        }
    }
}

/// The kinds of output the model may produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Modality {
    Text,
    Audio,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    candidate_count: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    presence_penalty: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    frequency_penalty: Option<f32>,

    /// The set of modalities the model can respond with. Empty means ["TEXT"].
    #[serde(default)]
    response_modalities: Vec<Modality>,

    #[serde(skip_serializing_if = "Option::is_none")]
    speech_config: Option<SpeechConfig>,
}

impl GenerationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_candidate_count(mut self, candidate_count: u32) -> Self {
        self.candidate_count = Some(candidate_count);
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn with_presence_penalty(mut self, presence_penalty: f32) -> Self {
        self.presence_penalty = Some(presence_penalty);
        self
    }

    pub fn with_frequency_penalty(mut self, frequency_penalty: f32) -> Self {
        self.frequency_penalty = Some(frequency_penalty);
        self
    }

    pub fn with_response_modalities(mut self, modalities: Vec<Modality>) -> Self {
        self.response_modalities = modalities;
        self
    }

    pub fn with_modalities_enable_audio(mut self) -> Self {
        self.response_modalities = vec![Modality::Audio];
        self
    }

    pub fn response_modalities(&self) -> &[Modality] {
        &self.response_modalities
    }

    pub fn speech_config(&self) -> Option<&SpeechConfig> {
        self.speech_config.as_ref()
    }

    pub fn temperature(&self) -> Option<f32> {
        self.temperature
    }

    pub fn max_output_tokens(&self) -> Option<u32> {
        self.max_output_tokens
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechConfig {
    voice_config: VoiceConfig,
}

impl SpeechConfig {
    pub fn prebuilt(voice_name: &str) -> Self {
        Self {
            voice_config: VoiceConfig {
                prebuilt_voice_config: PrebuiltVoiceConfig {
                    voice_name: voice_name.to_string(),
                },
            },
        }
    }

    pub fn voice_name(&self) -> &str {
        &self.voice_config.prebuilt_voice_config.voice_name
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceConfig {
    prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrebuiltVoiceConfig {
    voice_name: String,
}
