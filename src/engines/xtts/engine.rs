use std::fmt;
use std::path::Path;
use std::time::{Duration, Instant};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::{BoxError, SynthesisEngine, SynthesisResult};

use super::client::{ensure_language, wav_to_samples, XttsClient, XttsError};

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_MODEL_NAME: &str = "tts_models/multilingual/multi-dataset/xtts_v2";
pub const DEFAULT_LANGUAGE: &str = "en";

/// Compute device the model is loaded onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    #[default]
    Cuda,
    Cpu,
}

impl Device {
    pub fn as_str(&self) -> &'static str {
        match self {
            Device::Cuda => "cuda",
            Device::Cpu => "cpu",
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters for configuring XTTS model loading.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into), default)]
pub struct XttsModelParams {
    /// Base URL of the inference server.
    pub server_url: String,
    /// Model identifier the server should load.
    pub model_name: String,
    /// Device the server binds the model to.
    pub device: Device,
    /// Target language for every synthesis request (e.g. `"en"`, `"de"`).
    pub language: String,
    /// Upper bound for each speaker-cloning and synthesis request. `None`
    /// waits as long as the server takes. Loading is never bounded.
    pub timeout: Option<Duration>,
}

impl Default for XttsModelParams {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            model_name: DEFAULT_MODEL_NAME.to_string(),
            device: Device::default(),
            language: DEFAULT_LANGUAGE.to_string(),
            timeout: None,
        }
    }
}

struct LoadedXtts {
    client: XttsClient,
    language: String,
}

/// XTTS v2 voice-cloning engine.
///
/// # Quick Start
///
/// ```rust,no_run
/// use voice101::{SynthesisEngine, engines::xtts::XttsEngine};
/// use std::path::Path;
///
/// let mut engine = XttsEngine::new();
/// engine.load_model()?;
/// let result = engine.synthesize("Hello, world!", Path::new("presets/alice.wav"))?;
/// println!("{:.1}s of audio", result.duration_secs());
/// # Ok::<(), Box<dyn std::error::Error + Send + Sync>>(())
/// ```
#[derive(Default)]
pub struct XttsEngine {
    loaded: Option<LoadedXtts>,
}

impl XttsEngine {
    pub fn new() -> Self {
        Self { loaded: None }
    }
}

impl Drop for XttsEngine {
    fn drop(&mut self) {
        self.unload_model();
    }
}

impl SynthesisEngine for XttsEngine {
    type ModelParams = XttsModelParams;

    fn load_model_with_params(&mut self, params: Self::ModelParams) -> Result<(), BoxError> {
        let start = Instant::now();
        log::info!(
            "Loading {} on {} via {}",
            params.model_name,
            params.device,
            params.server_url
        );

        let client = XttsClient::new(&params.server_url, params.timeout)?;
        let model = client.load(&params.model_name, params.device.as_str())?;
        ensure_language(&model, &params.language)?;

        log::info!(
            "XTTS init done in {:.2} sec ({} on {})",
            start.elapsed().as_secs_f64(),
            model.model_name,
            model.device
        );

        self.loaded = Some(LoadedXtts {
            client,
            language: params.language,
        });
        Ok(())
    }

    fn unload_model(&mut self) {
        self.loaded = None;
    }

    fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    fn synthesize(&mut self, text: &str, reference: &Path) -> Result<SynthesisResult, BoxError> {
        let loaded = self.loaded.as_ref().ok_or(XttsError::ModelNotLoaded)?;

        if text.trim().is_empty() {
            return Err(XttsError::EmptyText.into());
        }
        if !reference.is_file() {
            return Err(XttsError::ReferenceNotFound(reference.display().to_string()).into());
        }

        log::info!("Voicing: '{}'", text);
        let latents = loaded.client.clone_speaker(reference)?;
        log::debug!(
            "Cloned speaker from {} ({} latent frames)",
            reference.display(),
            latents.gpt_cond_latent.len()
        );

        let wav = loaded.client.tts(text, &loaded.language, &latents)?;
        let (samples, sample_rate) = wav_to_samples(&wav)?;

        Ok(SynthesisResult {
            samples,
            sample_rate,
        })
    }
}
