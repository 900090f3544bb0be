//! Load-once wrapper around a [`SynthesisEngine`] that can be shared with
//! worker threads.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use crate::{BoxError, SynthesisEngine, SynthesisResult};

#[derive(thiserror::Error, Debug)]
pub enum ServiceError {
    #[error("TTS not initialized")]
    NotLoaded,
    #[error("Initialization failed: {0}")]
    Init(#[source] BoxError),
    #[error("Synthesis failed: {0}")]
    Synthesis(#[source] BoxError),
    #[error("Refusing to overwrite existing output {}", .0.display())]
    OutputExists(PathBuf),
}

/// The synthesis service.
///
/// Holds the engine and the parameters it is loaded with. `synthesize` is
/// rejected until `load` has succeeded; it never waits on a load that is
/// still running.
pub struct SynthesisService<E: SynthesisEngine> {
    engine: Mutex<E>,
    params: E::ModelParams,
    ready: AtomicBool,
}

impl<E: SynthesisEngine> SynthesisService<E> {
    pub fn new(engine: E, params: E::ModelParams) -> Self {
        Self {
            engine: Mutex::new(engine),
            params,
            ready: AtomicBool::new(false),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Load the model with the configured parameters.
    ///
    /// A failure leaves the service unloaded.
    pub fn load(&self) -> Result<(), ServiceError>
    where
        E::ModelParams: Clone,
    {
        let mut engine = self.engine.lock().unwrap_or_else(PoisonError::into_inner);
        self.ready.store(false, Ordering::Release);

        match engine.load_model_with_params(self.params.clone()) {
            Ok(()) => {
                self.ready.store(true, Ordering::Release);
                Ok(())
            }
            Err(e) => {
                engine.unload_model();
                Err(ServiceError::Init(e))
            }
        }
    }

    /// Synthesize `text` in the voice of `reference` into a new file at `output`.
    pub fn synthesize(
        &self,
        text: &str,
        reference: &Path,
        output: &Path,
    ) -> Result<SynthesisResult, ServiceError> {
        if !self.is_ready() {
            return Err(ServiceError::NotLoaded);
        }
        if output.exists() {
            return Err(ServiceError::OutputExists(output.to_path_buf()));
        }

        let start = Instant::now();
        let mut engine = self.engine.lock().unwrap_or_else(PoisonError::into_inner);
        let result = match engine.synthesize_to_file(text, reference, output) {
            Ok(result) => result,
            Err(e) => {
                // Whatever is at `output` now is a partial write of ours.
                if output.exists() {
                    if let Err(rm) = fs::remove_file(output) {
                        log::warn!("Could not remove partial {}: {rm}", output.display());
                    }
                }
                return Err(ServiceError::Synthesis(e));
            }
        };

        log::debug!(
            "synthesized {} ({:.2}s of audio in {:.2?})",
            output.display(),
            result.duration_secs(),
            start.elapsed()
        );
        Ok(result)
    }
}
