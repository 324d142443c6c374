//! On-disk layout of generation sessions.
//!
//! A session is one batch run across the selected generators. Each
//! generator writes into its own numbered directory:
//!
//! ```text
//! result/
//! ├── gpt/
//! │   ├── session1/
//! │   │   ├── FibonacciGenerator.kt
//! │   │   └── timing.json
//! │   └── session2/
//! └── gemini/
//!     └── session2/
//! ```
//!
//! Session numbers are shared across generators: the next session is one
//! past the highest number found under any generator directory.

use crate::error::{Result, TestbenchError};
use crate::types::GeneratorKind;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Prefix of every session directory name.
pub const SESSION_PREFIX: &str = "session";

/// Per-session timing file.
pub const TIMING_FILE: &str = "timing.json";

/// A freshly allocated session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionHandle {
    pub number: u32,
    pub created_at: DateTime<Utc>,
    pub generators: Vec<GeneratorKind>,
}

/// A session found on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub number: u32,
    pub generators: Vec<GeneratorKind>,
}

/// Filesystem-backed store rooted at the results directory.
#[derive(Debug, Clone)]
pub struct SessionStore {
    root: PathBuf,
}

impl SessionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn generator_dir(&self, kind: GeneratorKind) -> PathBuf {
        self.root.join(kind.dir_name())
    }

    pub fn session_dir(&self, kind: GeneratorKind, number: u32) -> PathBuf {
        self.generator_dir(kind)
            .join(format!("{}{}", SESSION_PREFIX, number))
    }

    pub fn ensure_session_dir(&self, kind: GeneratorKind, number: u32) -> Result<PathBuf> {
        let dir = self.session_dir(kind, number);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Session numbers present for one generator, ascending.
    pub fn session_numbers(&self, kind: GeneratorKind) -> Vec<u32> {
        let dir = self.generator_dir(kind);
        let Ok(entries) = fs::read_dir(&dir) else {
            return Vec::new();
        };

        let mut numbers: Vec<u32> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().to_string();
                name.strip_prefix(SESSION_PREFIX)?.parse::<u32>().ok()
            })
            .collect();
        numbers.sort_unstable();
        numbers.dedup();
        numbers
    }

    /// One past the highest session number of any generator.
    ///
    /// Fails once `u32::MAX` is taken rather than reusing a number.
    pub fn next_session_number(&self) -> Result<u32> {
        let highest = GeneratorKind::ALL
            .iter()
            .flat_map(|kind| self.session_numbers(*kind))
            .max()
            .unwrap_or(0);
        highest.checked_add(1).ok_or_else(|| {
            TestbenchError::invalid_input(format!(
                "No session number left after {}{} in {}",
                SESSION_PREFIX,
                highest,
                self.root.display()
            ))
        })
    }

    /// Allocate the next session and create its directories.
    pub fn create_session(&self, generators: &[GeneratorKind]) -> Result<SessionHandle> {
        let number = self.next_session_number()?;
        for kind in generators {
            self.ensure_session_dir(*kind, number)?;
        }
        debug!("Created session {} for {} generator(s)", number, generators.len());
        Ok(SessionHandle {
            number,
            created_at: Utc::now(),
            generators: generators.to_vec(),
        })
    }

    /// Write a generated test under the original source file name.
    pub fn save_test(
        &self,
        kind: GeneratorKind,
        number: u32,
        file_name: &str,
        content: &str,
    ) -> Result<PathBuf> {
        validate_file_name(file_name)?;
        let path = self.ensure_session_dir(kind, number)?.join(file_name);
        fs::write(&path, content)?;
        Ok(path)
    }

    /// Write `timing.json` for a generator's session.
    pub fn save_timings<T: Serialize>(
        &self,
        kind: GeneratorKind,
        number: u32,
        timings: &BTreeMap<String, T>,
    ) -> Result<PathBuf> {
        let path = self.ensure_session_dir(kind, number)?.join(TIMING_FILE);
        fs::write(&path, serde_json::to_string_pretty(timings)?)?;
        Ok(path)
    }

    /// Read `timing.json`; missing or unreadable files give an empty map.
    pub fn load_timings<T: DeserializeOwned>(
        &self,
        kind: GeneratorKind,
        number: u32,
    ) -> BTreeMap<String, T> {
        let path = self.session_dir(kind, number).join(TIMING_FILE);
        let Ok(content) = fs::read_to_string(&path) else {
            return BTreeMap::new();
        };
        match serde_json::from_str(&content) {
            Ok(timings) => timings,
            Err(e) => {
                warn!("Error reading timing metrics from {}: {}", path.display(), e);
                BTreeMap::new()
            }
        }
    }

    /// Highest-numbered session of a generator.
    pub fn latest_session(&self, kind: GeneratorKind) -> Option<u32> {
        self.session_numbers(kind).last().copied()
    }

    /// File in a session whose stem matches `stem`.
    pub fn find_test(&self, kind: GeneratorKind, number: u32, stem: &str) -> Option<PathBuf> {
        let dir = self.session_dir(kind, number);
        let mut matches: Vec<PathBuf> = fs::read_dir(&dir)
            .ok()?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| path.file_name().is_some_and(|name| name != TIMING_FILE))
            .filter(|path| path.file_stem().is_some_and(|s| s.to_string_lossy() == stem))
            .collect();
        matches.sort();
        matches.into_iter().next()
    }

    /// Content of the matching test file, if any.
    pub fn read_test(&self, kind: GeneratorKind, number: u32, stem: &str) -> Result<Option<String>> {
        match self.find_test(kind, number, stem) {
            Some(path) => Ok(Some(fs::read_to_string(path)?)),
            None => Ok(None),
        }
    }

    /// All sessions on disk with the generators that wrote into them.
    pub fn list_sessions(&self) -> Vec<SessionInfo> {
        let mut sessions: BTreeMap<u32, Vec<GeneratorKind>> = BTreeMap::new();
        for kind in GeneratorKind::ALL {
            for number in self.session_numbers(kind) {
                sessions.entry(number).or_default().push(kind);
            }
        }
        sessions
            .into_iter()
            .map(|(number, generators)| SessionInfo { number, generators })
            .collect()
    }
}

fn validate_file_name(file_name: &str) -> Result<()> {
    let path = Path::new(file_name);
    let is_plain = path.components().count() == 1
        && path.file_name().is_some_and(|name| name == file_name);
    if file_name.is_empty() || !is_plain || file_name == TIMING_FILE {
        return Err(TestbenchError::invalid_input(format!(
            "Not a valid test file name: '{}'",
            file_name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_session_number_starts_at_one() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        assert_eq!(store.next_session_number().unwrap(), 1);
    }

    #[test]
    fn test_next_session_number_spans_generators() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        store.ensure_session_dir(GeneratorKind::Gpt, 2).unwrap();
        store.ensure_session_dir(GeneratorKind::Gemini, 5).unwrap();
        // Unparseable or out-of-range suffixes are not sessions
        fs::create_dir_all(store.generator_dir(GeneratorKind::Gpt).join("session_old")).unwrap();
        fs::create_dir_all(store.generator_dir(GeneratorKind::Gpt).join("session99999999999")).unwrap();

        assert_eq!(store.next_session_number().unwrap(), 6);
        assert_eq!(store.session_numbers(GeneratorKind::Gpt), vec![2]);
    }

    #[test]
    fn test_next_session_number_exhausted() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        fs::create_dir_all(
            store
                .generator_dir(GeneratorKind::Gpt)
                .join(format!("{}{}", SESSION_PREFIX, u32::MAX)),
        )
        .unwrap();

        let err = store.next_session_number().unwrap_err();
        assert!(matches!(err, TestbenchError::InvalidInput(_)), "{err}");
        assert!(store.create_session(&[GeneratorKind::Gpt]).is_err());
        assert!(!store.session_dir(GeneratorKind::Gpt, 0).exists());
    }

    #[test]
    fn test_rejects_path_like_file_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        assert!(store.save_test(GeneratorKind::Gpt, 1, "../escape.kt", "x").is_err());
        assert!(store.save_test(GeneratorKind::Gpt, 1, "", "x").is_err());
        assert!(store.save_test(GeneratorKind::Gpt, 1, TIMING_FILE, "x").is_err());
        assert!(store.save_test(GeneratorKind::Gpt, 1, "Ok.kt", "x").is_ok());
    }

    #[test]
    fn test_malformed_timing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let session = store.ensure_session_dir(GeneratorKind::Gpt, 1).unwrap();
        fs::write(session.join(TIMING_FILE), "{ not json").unwrap();

        let timings: BTreeMap<String, u64> = store.load_timings(GeneratorKind::Gpt, 1);
        assert!(timings.is_empty());
    }
}
