//! Audio playback.

use std::path::Path;

#[derive(thiserror::Error, Debug)]
pub enum PlaybackError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("No audio output device: {0}")]
    Device(String),
    #[error("Could not decode {path}: {reason}")]
    Decode { path: String, reason: String },
}

/// Plays an audio file to completion.
pub trait AudioPlayer {
    /// Play `path` and return once playback has finished.
    fn play_blocking(&mut self, path: &Path) -> Result<(), PlaybackError>;
}

#[cfg(feature = "playback")]
pub use rodio_player::RodioPlayer;

#[cfg(feature = "playback")]
mod rodio_player {
    use std::fs::File;
    use std::io::BufReader;
    use std::path::Path;
    use std::time::Instant;

    use rodio::{Decoder, OutputStream, Sink};

    use super::{AudioPlayer, PlaybackError};

    /// Plays through the default output device.
    #[derive(Debug, Default)]
    pub struct RodioPlayer;

    impl RodioPlayer {
        pub fn new() -> Self {
            Self
        }
    }

    impl AudioPlayer for RodioPlayer {
        fn play_blocking(&mut self, path: &Path) -> Result<(), PlaybackError> {
            let file = BufReader::new(File::open(path)?);
            let source = Decoder::new(file).map_err(|e| PlaybackError::Decode {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

            let (_stream, stream_handle) =
                OutputStream::try_default().map_err(|e| PlaybackError::Device(e.to_string()))?;
            let sink =
                Sink::try_new(&stream_handle).map_err(|e| PlaybackError::Device(e.to_string()))?;

            let now = Instant::now();
            sink.append(source);
            sink.sleep_until_end();
            log::debug!("played {} in {:?}", path.display(), now.elapsed());
            Ok(())
        }
    }
}
