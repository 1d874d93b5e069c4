//! Process-wide ranking of the best finished games
//!
//! Every session reports its final score here once the word is solved. The
//! board keeps only the `capacity` lowest scores, sorted ascending; ties keep
//! the earlier submission ahead. All access goes through one `RwLock`, and a
//! submission performs its search, insert and truncate under a single write
//! guard so no reader ever sees a half-applied update.
//!
//! The board can optionally be mirrored to a file so rankings survive a
//! server restart. Saving is best-effort: callers log failures and move on.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use shared::{parse_player_name, ProtocolError, MAX_FRAME_LEN, MAX_NAME_LEN};
use std::io;
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, RwLock};

pub const DEFAULT_LEADERBOARD_SIZE: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    pub score: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum LeaderboardError {
    #[error("leaderboard file I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("leaderboard file is corrupt: {0}")]
    Encoding(#[from] bincode::Error),
}

pub struct Leaderboard {
    capacity: usize,
    entries: RwLock<Vec<LeaderboardEntry>>,
    /// Backing file; the mutex serializes writers
    store: Option<Mutex<PathBuf>>,
}

impl Leaderboard {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: RwLock::new(Vec::with_capacity(capacity + 1)),
            store: None,
        }
    }

    /// Opens a board mirrored to `path`, seeding it from the file if present
    ///
    /// Stored entries are re-ranked on load, so a file written with a larger
    /// capacity is trimmed to this one. Entries whose name would not be
    /// accepted from a player today are dropped.
    pub async fn open(capacity: usize, path: impl Into<PathBuf>) -> Result<Self, LeaderboardError> {
        let path = path.into();
        let mut entries = Vec::with_capacity(capacity + 1);

        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let stored: Vec<LeaderboardEntry> = bincode::deserialize(&bytes)?;
                for entry in stored {
                    if let Err(e) = check_stored_name(&entry.name) {
                        warn!("Dropping stored leaderboard entry {:?}: {}", entry.name, e);
                        continue;
                    }
                    insert_ranked(&mut entries, capacity, entry);
                }
                info!(
                    "Loaded {} leaderboard entries from {}",
                    entries.len(),
                    path.display()
                );
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("No leaderboard file at {}, starting empty", path.display());
            }
            Err(e) => return Err(e.into()),
        }

        Ok(Self {
            capacity,
            entries: RwLock::new(entries),
            store: Some(Mutex::new(path)),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Records a finished game, returning its 1-based rank if it made the board
    pub async fn submit(&self, name: &str, score: f64) -> Option<usize> {
        if !score.is_finite() {
            debug!("Ignoring non-finite score {} for {}", score, name);
            return None;
        }

        let mut entries = self.entries.write().await;
        insert_ranked(
            &mut entries,
            self.capacity,
            LeaderboardEntry {
                name: name.to_string(),
                score,
            },
        )
    }

    /// Point-in-time copy of the ranking
    pub async fn snapshot(&self) -> Vec<LeaderboardEntry> {
        self.entries.read().await.clone()
    }

    /// Writes the current ranking to the backing file, if there is one
    pub async fn persist(&self) -> Result<(), LeaderboardError> {
        let Some(store) = &self.store else {
            return Ok(());
        };

        // Snapshot after taking the store lock so the last writer saves the
        // newest ranking.
        let path = store.lock().await;
        let bytes = bincode::serialize(&self.snapshot().await)?;
        write_atomically(&path, &bytes).await?;
        debug!("Saved leaderboard to {}", path.display());
        Ok(())
    }
}

/// A stored name must survive `parse_player_name` unchanged
fn check_stored_name(name: &str) -> Result<(), ProtocolError> {
    if parse_player_name(name)? == name {
        Ok(())
    } else {
        Err(ProtocolError::violation("name has surrounding whitespace"))
    }
}

/// Inserts `entry` before the first strictly worse score and trims to `capacity`
fn insert_ranked(
    entries: &mut Vec<LeaderboardEntry>,
    capacity: usize,
    entry: LeaderboardEntry,
) -> Option<usize> {
    let index = entries
        .iter()
        .position(|existing| existing.score > entry.score)
        .unwrap_or(entries.len());

    if index >= capacity {
        return None;
    }

    entries.insert(index, entry);
    entries.truncate(capacity);
    Some(index + 1)
}

async fn write_atomically(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await
}

const REPORT_HEADER: &str = "\nLEADERBOARD:\n-------------------\n";

/// Largest board whose report always fits in one frame
///
/// Sized for the worst entry a session can produce: a name of
/// `MAX_NAME_LEN` four-byte characters and the score of a one-letter word
/// after `u32::MAX` guesses.
pub fn max_capacity() -> usize {
    let widest_score = format!("{:.2}", u32::MAX as f64).len();
    let entry_without_rank =
        ":\n".len() + MAX_NAME_LEN * 4 + "\n".len() + widest_score + "\n\n".len();

    let mut len = REPORT_HEADER.len();
    let mut capacity = 0;
    loop {
        let next = len + (capacity + 1).to_string().len() + entry_without_rank;
        if next > MAX_FRAME_LEN {
            return capacity;
        }
        len = next;
        capacity += 1;
    }
}

/// Human-readable ranking sent to a player after their game
pub fn render_report(entries: &[LeaderboardEntry]) -> String {
    let mut report = String::from(REPORT_HEADER);
    for (rank, entry) in entries.iter().enumerate() {
        report.push_str(&format!(
            "{}:\n{}\n{:.2}\n\n",
            rank + 1,
            entry.name,
            entry.score
        ));
    }
    report
}
