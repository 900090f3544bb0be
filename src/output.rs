//! Output file naming.

use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Path of the file a synthesis started at `at` with `preset` writes to.
///
/// The name is `output_<timestamp>_<preset stem>.wav`. When that file already
/// exists or `reserved` claims it (an output of a request still in flight), a
/// `_2`, `_3`, ... suffix is added so no output is ever overwritten.
pub fn output_path_avoiding<Tz>(
    dir: &Path,
    preset: &str,
    at: &DateTime<Tz>,
    reserved: impl Fn(&Path) -> bool,
) -> PathBuf
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let stem = Path::new(preset)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(preset);
    let base = format!("output_{}_{}", at.format(TIMESTAMP_FORMAT), stem);

    let taken = |p: &Path| p.exists() || reserved(p);

    let first = dir.join(format!("{base}.wav"));
    if !taken(first.as_path()) {
        return first;
    }
    (2u32..)
        .map(|n| dir.join(format!("{base}_{n}.wav")))
        .find(|p| !taken(p.as_path()))
        .unwrap_or(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, Utc};
    use std::fs;

    fn output_path<Tz>(dir: &Path, preset: &str, at: &DateTime<Tz>) -> PathBuf
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        output_path_avoiding(dir, preset, at, |_| false)
    }

    #[test]
    fn name_encodes_timestamp_and_preset_stem() {
        let dir = tempfile::tempdir().unwrap();
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();

        let path = output_path(dir.path(), "alice.wav", &at);

        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "output_2024-03-09_07-05-01_alice.wav"
        );
        assert_eq!(path.parent().unwrap(), dir.path());
    }

    #[test]
    fn keeps_dots_inside_preset_stem() {
        let dir = tempfile::tempdir().unwrap();
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let path = output_path(dir.path(), "dr.who.WAV", &at);

        assert!(path.ends_with("output_2024-01-01_00-00-00_dr.who.wav"));
    }

    #[test]
    fn same_second_gets_a_numbered_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let at = Local::now();

        let first = output_path(dir.path(), "bob.wav", &at);
        fs::write(&first, b"").unwrap();
        let second = output_path(dir.path(), "bob.wav", &at);
        fs::write(&second, b"").unwrap();
        let third = output_path(dir.path(), "bob.wav", &at);

        assert_ne!(first, second);
        assert!(second.to_str().unwrap().ends_with("_bob_2.wav"));
        assert!(third.to_str().unwrap().ends_with("_bob_3.wav"));
    }

    #[test]
    fn reserved_paths_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        let pending = output_path(dir.path(), "bob.wav", &at);

        let next = output_path_avoiding(dir.path(), "bob.wav", &at, |p| p == pending);

        assert!(next.ends_with("output_2024-03-09_07-05-01_bob_2.wav"));
    }
}
