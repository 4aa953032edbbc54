use std::error::Error as StdError;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rail_engine::{LeaderboardRecord, LeaderboardStore};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use super::atomic_io::write_text_atomic;

pub(crate) const LEADERBOARD_FILE: &str = "leaderboard.json";
pub(crate) const LEADERBOARD_CAPACITY: usize = 10;
const LEADERBOARD_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct LeaderboardFile {
    version: u32,
    entries: Vec<LeaderboardRecord>,
}

#[derive(Debug, Error)]
pub(crate) enum LeaderboardError {
    #[error("failed to read leaderboard {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse leaderboard {} at {field_path}: {message}", path.display())]
    Parse {
        path: PathBuf,
        field_path: String,
        message: String,
    },
    #[error("leaderboard {} has version {actual}, expected {expected}", path.display())]
    Version {
        path: PathBuf,
        expected: u32,
        actual: u32,
    },
    #[error("failed to encode leaderboard: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to write leaderboard {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone)]
pub(crate) struct JsonFileLeaderboard {
    path: PathBuf,
    capacity: usize,
}

impl JsonFileLeaderboard {
    pub(crate) fn in_dir(saves_dir: &Path) -> Self {
        Self {
            path: saves_dir.join(LEADERBOARD_FILE),
            capacity: LEADERBOARD_CAPACITY,
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Entries best first; a missing file is an empty board.
    pub(crate) fn load(&self) -> Result<Vec<LeaderboardRecord>, LeaderboardError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(LeaderboardError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let mut deserializer = serde_json::Deserializer::from_str(&raw);
        let file: LeaderboardFile = serde_path_to_error::deserialize(&mut deserializer)
            .map_err(|error| {
                let field_path = error.path().to_string();
                LeaderboardError::Parse {
                    path: self.path.clone(),
                    field_path,
                    message: error.into_inner().to_string(),
                }
            })?;
        if file.version != LEADERBOARD_VERSION {
            return Err(LeaderboardError::Version {
                path: self.path.clone(),
                expected: LEADERBOARD_VERSION,
                actual: file.version,
            });
        }
        Ok(file.entries)
    }

    /// Inserts `record`, keeps the best `capacity` entries, and rewrites the file.
    /// Returns the 1-based rank, or `None` when the run did not make the board.
    pub(crate) fn insert(
        &self,
        record: &LeaderboardRecord,
    ) -> Result<Option<usize>, LeaderboardError> {
        let mut entries = match self.load() {
            Ok(entries) => entries,
            Err(error @ (LeaderboardError::Parse { .. } | LeaderboardError::Version { .. })) => {
                warn!(error = %error, "leaderboard_reset");
                Vec::new()
            }
            Err(error) => return Err(error),
        };

        let rank = entries
            .iter()
            .position(|entry| entry.score < record.score)
            .unwrap_or(entries.len());
        entries.insert(rank, record.clone());
        entries.truncate(self.capacity);
        let placed = (rank < self.capacity).then_some(rank + 1);

        let file = LeaderboardFile {
            version: LEADERBOARD_VERSION,
            entries,
        };
        let json = serde_json::to_string_pretty(&file).map_err(LeaderboardError::Encode)?;
        write_text_atomic(&self.path, &json).map_err(|source| LeaderboardError::Write {
            path: self.path.clone(),
            source,
        })?;
        Ok(placed)
    }
}

impl LeaderboardStore for JsonFileLeaderboard {
    fn record(
        &mut self,
        record: &LeaderboardRecord,
    ) -> Result<(), Box<dyn StdError + Send + Sync>> {
        let rank = self.insert(record)?;
        info!(
            path = %self.path.display(),
            score = record.score,
            rank = rank.unwrap_or(0),
            "leaderboard_recorded"
        );
        Ok(())
    }
}
