//! Batch merging of git branches
//!
//! gitbatch asks for a local target branch and one or more source branches,
//! then merges each source into the target in turn: check out the source, pull
//! it, check out the target, merge. Branches are listed as a tree built from
//! their `/` separated names, picked by number or range (`1,3-5,8`), and the
//! last selection is remembered as the default for the next run.

use std::path::Path;

use log::warn;

use crate::prefs::Preferences;

pub mod batch;
pub mod git;
pub mod logger;
pub mod prefs;
pub mod range;
pub mod select;
pub mod style;
pub mod tree;

/// Load remembered selections from `path`.
///
/// Returns `None` when there is no preferences file or it cannot be read; read
/// failures are logged as warnings.
#[must_use]
pub fn load_preferences(path: &Path) -> Option<Preferences> {
    match Preferences::load(path) {
        Ok(preferences) => preferences,
        Err(e) => {
            warn!("Could not load preferences. {e}");
            None
        }
    }
}

/// Persist `preferences` to `path`, logging a warning instead of failing.
///
/// Returns whether the file was written.
pub fn save_preferences(preferences: &Preferences, path: &Path) -> bool {
    match preferences.save(path) {
        Ok(()) => true,
        Err(e) => {
            warn!("Could not save preferences. {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_preferences_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_preferences(&dir.path().join("absent.properties")), None);
    }

    #[test]
    fn test_save_preferences_failure_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();
        let prefs = Preferences::after_batch("main", &["dev".to_string()]);
        assert!(!save_preferences(&prefs, &blocker.join("config.properties")));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".gitbatch").join("config.properties");
        let prefs = Preferences::after_batch("main", &["dev".to_string()]);
        assert!(save_preferences(&prefs, &path));
        assert_eq!(load_preferences(&path), Some(prefs));
    }
}
