//! High score kept in a plain text file holding one decimal number.

use std::fs;
use std::io;
use std::num::ParseIntError;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use thiserror::Error;
use tracing::warn;

use crate::ports::HighScoreStore;

const FILE_NAME: &str = "high_score.txt";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("high score file i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("high score file holds {contents:?}, not a score")]
    Corrupt {
        contents: String,
        #[source]
        source: ParseIntError,
    },
    #[error("could not determine a config directory")]
    NoConfigDir,
}

#[derive(Clone, Debug)]
pub struct FileHighScoreStore {
    path: PathBuf,
}

impl FileHighScoreStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `high_score.txt` in the platform config directory, created if needed.
    pub fn default_path() -> Result<PathBuf, StoreError> {
        let dirs = ProjectDirs::from("", "", "flappy-plus").ok_or(StoreError::NoConfigDir)?;
        let config_dir = dirs.config_dir();
        fs::create_dir_all(config_dir)?;
        Ok(config_dir.join(FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<u32, StoreError> {
        let contents = fs::read_to_string(&self.path)?;
        contents
            .trim()
            .parse()
            .map_err(|source| StoreError::Corrupt { contents, source })
    }

    pub fn save(&self, score: u32) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, score.to_string())?;
        Ok(())
    }
}

impl HighScoreStore for FileHighScoreStore {
    /// Missing or unreadable files count as 0 and are rewritten with 0.
    fn read_high_score(&mut self) -> u32 {
        match self.load() {
            Ok(score) => score,
            Err(error) => {
                warn!(path = %self.path.display(), %error, "high score unusable, starting from 0");
                self.write_high_score(0);
                0
            }
        }
    }

    fn write_high_score(&mut self, score: u32) {
        if let Err(error) = self.save(score) {
            warn!(path = %self.path.display(), %error, "could not save high score");
        }
    }
}
