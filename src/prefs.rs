//! Remembered selections between runs
//!
//! Stored as a Java-style properties file under the user's home directory so
//! that files written by earlier versions of the tool keep working.

use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};

use java_properties::{PropertiesError, PropertiesWriter};
use log::{debug, info};
use thiserror::Error;

const LOCAL_KEY: &str = "lastSelectedLocalBranch";
const MERGE_KEY: &str = "lastSelectedMergeBranch";
const HEADER: &str = "GitBatch Preferences";

#[derive(Error, Debug)]
pub enum PrefsError {
    #[error("could not determine the home directory")]
    NoHomeDir,
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{path}: {source}")]
    Properties {
        path: PathBuf,
        #[source]
        source: PropertiesError,
    },
}

/// Selections remembered from the last successful batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preferences {
    pub last_local_branch: Option<String>,
    /// Comma-joined source branches of the last batch
    pub last_merge_branches: Option<String>,
}

impl Preferences {
    /// `~/.gitbatch/config.properties`
    ///
    /// # Errors
    ///
    /// Returns `PrefsError::NoHomeDir` if the home directory is unknown.
    pub fn default_path() -> Result<PathBuf, PrefsError> {
        dirs::home_dir()
            .map(|home| home.join(".gitbatch").join("config.properties"))
            .ok_or(PrefsError::NoHomeDir)
    }

    /// Preferences recorded after merging `sources` into `target`
    #[must_use]
    pub fn after_batch(target: &str, sources: &[String]) -> Self {
        Self {
            last_local_branch: Some(target.to_string()),
            last_merge_branches: Some(sources.join(",")),
        }
    }

    /// Read preferences from `path`, `None` if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns `PrefsError::Io` if the file cannot be opened, or
    /// `PrefsError::Properties` if it is not a valid properties file.
    pub fn load(path: &Path) -> Result<Option<Self>, PrefsError> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No preferences at {}", path.display());
                return Ok(None);
            }
            Err(e) => {
                return Err(PrefsError::Io {
                    path: path.to_path_buf(),
                    source: e,
                });
            }
        };
        let mut props =
            java_properties::read(BufReader::new(file)).map_err(|e| PrefsError::Properties {
                path: path.to_path_buf(),
                source: e,
            })?;
        info!("Loaded preferences from {}", path.display());
        Ok(Some(Self {
            last_local_branch: props.remove(LOCAL_KEY),
            last_merge_branches: props.remove(MERGE_KEY),
        }))
    }

    /// Write preferences to `path`, creating its parent directory if needed.
    ///
    /// # Errors
    ///
    /// Returns `PrefsError::Io` if the directory or file cannot be created, or
    /// `PrefsError::Properties` if writing fails.
    pub fn save(&self, path: &Path) -> Result<(), PrefsError> {
        let io_err = |source| PrefsError::Io {
            path: path.to_path_buf(),
            source,
        };
        let props_err = |source| PrefsError::Properties {
            path: path.to_path_buf(),
            source,
        };

        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(io_err)?;
        }
        let file = File::create(path).map_err(io_err)?;

        let mut writer = PropertiesWriter::new(BufWriter::new(file));
        writer.write_comment(HEADER).map_err(props_err)?;
        if let Some(branch) = &self.last_local_branch {
            writer.write(LOCAL_KEY, branch).map_err(props_err)?;
        }
        if let Some(branches) = &self.last_merge_branches {
            writer.write(MERGE_KEY, branches).map_err(props_err)?;
        }
        writer.finish().map_err(props_err)?;

        info!("Saved preferences to {}", path.display());
        Ok(())
    }
}
