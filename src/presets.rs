//! Voice preset directory scanning.

use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

/// Extension a file needs to count as a voice preset (compared case-insensitively).
pub const PRESET_EXTENSION: &str = "wav";

/// Upper bound for the poll interval while the preset directory is unreadable.
pub const MAX_BACKOFF: Duration = Duration::from_secs(32);

/// List preset file names in `dir`, sorted.
///
/// Only regular files with a `.wav` extension count; subdirectories and other
/// files are skipped.
pub fn scan(dir: &Path) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        let is_preset = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(PRESET_EXTENSION));
        if !is_preset {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}

/// Outcome of one poll of the preset directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Same file set as last time; nothing to do.
    Unchanged,
    /// The file set changed; carries the new list.
    Changed(Vec<String>),
    /// The directory could not be read. `first` is true for the first
    /// failure of a streak.
    Failed { error: String, first: bool },
}

/// Periodic preset poller.
///
/// Remembers the previous snapshot so unchanged directories produce no
/// updates, and doubles its interval (up to [`MAX_BACKOFF`]) while the
/// directory is unreadable.
#[derive(Debug)]
pub struct PresetWatcher {
    interval: Duration,
    last: Option<Vec<String>>,
    failures: u32,
}

impl PresetWatcher {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
            failures: 0,
        }
    }

    /// Delay until the next poll should run.
    pub fn next_delay(&self) -> Duration {
        if self.failures == 0 {
            return self.interval;
        }
        let factor = 1u32 << self.failures.min(16);
        self.interval.saturating_mul(factor).min(MAX_BACKOFF.max(self.interval))
    }

    pub fn poll(&mut self, dir: &Path) -> PollOutcome {
        match scan(dir) {
            Ok(names) => {
                self.failures = 0;
                if self.last.as_ref() == Some(&names) {
                    return PollOutcome::Unchanged;
                }
                self.last = Some(names.clone());
                PollOutcome::Changed(names)
            }
            Err(e) => {
                self.failures = self.failures.saturating_add(1);
                PollOutcome::Failed {
                    error: e.to_string(),
                    first: self.failures == 1,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_keeps_only_wav_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("zoe.wav"), b"").unwrap();
        fs::write(dir.path().join("Adam.WAV"), b"").unwrap();
        fs::write(dir.path().join("notes.txt"), b"").unwrap();
        fs::write(dir.path().join("wav"), b"").unwrap();
        fs::create_dir(dir.path().join("folder.wav")).unwrap();

        let names = scan(dir.path()).unwrap();
        assert_eq!(names, vec!["Adam.WAV".to_string(), "zoe.wav".to_string()]);
    }

    #[test]
    fn scan_of_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(scan(&dir.path().join("nope")).is_err());
    }

    #[test]
    fn unchanged_directory_reports_no_update() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("alice.wav"), b"").unwrap();
        let mut watcher = PresetWatcher::new(Duration::from_secs(1));

        assert_eq!(
            watcher.poll(dir.path()),
            PollOutcome::Changed(vec!["alice.wav".to_string()])
        );
        assert_eq!(watcher.poll(dir.path()), PollOutcome::Unchanged);

        fs::write(dir.path().join("bob.wav"), b"").unwrap();
        assert_eq!(
            watcher.poll(dir.path()),
            PollOutcome::Changed(vec!["alice.wav".to_string(), "bob.wav".to_string()])
        );
    }

    #[test]
    fn empty_directory_is_a_change_from_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut watcher = PresetWatcher::new(Duration::from_secs(1));
        assert_eq!(watcher.poll(dir.path()), PollOutcome::Changed(Vec::new()));
        assert_eq!(watcher.poll(dir.path()), PollOutcome::Unchanged);
    }

    #[test]
    fn backs_off_while_unreadable_and_recovers() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("presets");
        let mut watcher = PresetWatcher::new(Duration::from_secs(1));

        assert!(matches!(
            watcher.poll(&missing),
            PollOutcome::Failed { first: true, .. }
        ));
        assert_eq!(watcher.next_delay(), Duration::from_secs(2));
        assert!(matches!(
            watcher.poll(&missing),
            PollOutcome::Failed { first: false, .. }
        ));
        assert_eq!(watcher.next_delay(), Duration::from_secs(4));

        for _ in 0..10 {
            watcher.poll(&missing);
        }
        assert_eq!(watcher.next_delay(), MAX_BACKOFF);

        fs::create_dir(&missing).unwrap();
        assert_eq!(watcher.poll(&missing), PollOutcome::Changed(Vec::new()));
        assert_eq!(watcher.next_delay(), Duration::from_secs(1));
    }
}
