//! # voice101
//!
//! A desktop front-end for voice-cloning text-to-speech.
//!
//! Type some text, pick a short reference recording ("preset") and the
//! engine speaks the text in that voice, writing a timestamped WAV file that
//! can then be played back.
//!
//! ## Features
//!
//! - **XTTS engine** (`xtts`, default): voice cloning through an XTTS inference server
//! - **Playback** (`playback`): play generated files on the default output device
//! - **GUI** (`gui`): the `voice101` desktop window
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::path::Path;
//! use voice101::{engines::xtts::XttsEngine, SynthesisEngine};
//!
//! let mut engine = XttsEngine::new();
//! engine.load_model()?;
//!
//! engine.synthesize_to_file(
//!     "Hello, world!",
//!     Path::new("presets/alice.wav"),
//!     Path::new("outputs/hello.wav"),
//! )?;
//! # Ok::<(), Box<dyn std::error::Error + Send + Sync>>(())
//! ```

pub mod config;
pub mod console;
pub mod controller;
pub mod engines;
pub mod output;
pub mod player;
pub mod presets;
pub mod service;

#[cfg(feature = "gui")]
pub mod gui;

use std::path::Path;

/// Error type returned by [`SynthesisEngine`] implementations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The result of a synthesis (text-to-speech) operation.
///
/// Contains raw f32 audio samples and the sample rate of the output audio.
#[derive(Debug)]
pub struct SynthesisResult {
    /// Raw audio samples as f32 values
    pub samples: Vec<f32>,
    /// Sample rate of the audio (24000 for XTTS)
    pub sample_rate: u32,
}

impl SynthesisResult {
    /// Write the audio to a 32-bit float WAV file.
    pub fn write_wav(&self, path: &Path) -> Result<(), BoxError> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(path, spec)?;
        for &sample in &self.samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
        Ok(())
    }

    /// Duration of the audio in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Common interface for voice-cloning synthesis engines.
///
/// An engine is loaded once with its model parameters (model name, compute
/// device, ...) and then turns text plus a reference voice sample into audio.
pub trait SynthesisEngine {
    /// Parameters for configuring model loading (model name, device, etc.)
    type ModelParams: Default;

    /// Load the model using default parameters.
    fn load_model(&mut self) -> Result<(), BoxError> {
        self.load_model_with_params(Self::ModelParams::default())
    }

    /// Load the model with custom parameters.
    fn load_model_with_params(&mut self, params: Self::ModelParams) -> Result<(), BoxError>;

    /// Unload the currently loaded model and free associated resources.
    fn unload_model(&mut self);

    /// Whether a model is currently loaded.
    fn is_loaded(&self) -> bool;

    /// Synthesize `text` in the voice of the `reference` sample.
    fn synthesize(&mut self, text: &str, reference: &Path) -> Result<SynthesisResult, BoxError>;

    /// Synthesize speech and write it to a WAV file.
    ///
    /// Default implementation calls `synthesize()` then `SynthesisResult::write_wav()`.
    fn synthesize_to_file(
        &mut self,
        text: &str,
        reference: &Path,
        wav_path: &Path,
    ) -> Result<SynthesisResult, BoxError> {
        let result = self.synthesize(text, reference)?;
        result.write_wav(wav_path)?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::SynthesisResult;

    #[test]
    fn writes_float_wav_that_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let result = SynthesisResult {
            samples: vec![0.0, 0.25, -0.5, 1.0],
            sample_rate: 24000,
        };

        result.write_wav(&path).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().sample_rate, 24000);
        assert_eq!(reader.spec().sample_format, hound::SampleFormat::Float);
        let samples: Vec<f32> = reader.samples::<f32>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, result.samples);
    }

    #[test]
    fn duration_follows_sample_rate() {
        let result = SynthesisResult {
            samples: vec![0.0; 12000],
            sample_rate: 24000,
        };
        assert!((result.duration_secs() - 0.5).abs() < f64::EPSILON);

        let empty = SynthesisResult {
            samples: Vec::new(),
            sample_rate: 0,
        };
        assert_eq!(empty.duration_secs(), 0.0);
    }
}
