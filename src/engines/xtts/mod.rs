//! XTTS v2 voice-cloning engine.
//!
//! The model itself runs in an XTTS inference server; this module loads it
//! onto the requested compute device and drives synthesis over HTTP. A short
//! reference recording is enough to clone a voice: the server turns it into
//! conditioning latents, which are then sent along with the text.
//!
//! # Server Endpoints
//!
//! | Method | Path | Request | Response |
//! |---|---|---|---|
//! | `POST` | `/load` | `{model_name, device}` | `{model_name, device, languages}` |
//! | `POST` | `/clone_speaker` | multipart `wav_file` | `{gpt_cond_latent, speaker_embedding}` |
//! | `POST` | `/tts` | `{text, language, speaker_embedding, gpt_cond_latent}` | base64 WAV string |
//!
//! # Examples
//!
//! ```rust,no_run
//! use voice101::{SynthesisEngine, engines::xtts::{Device, XttsEngine, XttsModelParamsBuilder}};
//! use std::path::Path;
//!
//! let params = XttsModelParamsBuilder::default()
//!     .server_url("http://127.0.0.1:8000")
//!     .device(Device::Cpu)
//!     .language("de")
//!     .build()?;
//!
//! let mut engine = XttsEngine::new();
//! engine.load_model_with_params(params)?;
//! engine.synthesize_to_file(
//!     "Guten Tag!",
//!     Path::new("presets/alice.wav"),
//!     Path::new("outputs/guten_tag.wav"),
//! )?;
//! # Ok::<(), Box<dyn std::error::Error + Send + Sync>>(())
//! ```

pub mod client;
pub mod engine;

pub use client::{SpeakerLatents, XttsError};
pub use engine::{
    Device, XttsEngine, XttsModelParams, XttsModelParamsBuilder, DEFAULT_LANGUAGE,
    DEFAULT_MODEL_NAME, DEFAULT_SERVER_URL,
};
