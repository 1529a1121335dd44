/// Persistent high scores.
///
/// ## File format:
///   `high_scores.toml` in the data directory, one `[[records]]` table per
///   finished run that beat the best score:
///
///   ```toml
///   [[records]]
///   score = 1250
///   level = 3
///   achieved_at = "2026-10-16T21:04:11.512+02:00"
///   ```
///
/// Records are ranked by score, then level, highest first. Reading never
/// fails from the game's point of view: a missing or unreadable file is an
/// empty table and a failed write is logged and dropped.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::sim::world::WorldState;

const SCORE_FILE: &str = "high_scores.toml";
/// How many records the game-over screen lists.
pub const TOP_SHOWN: usize = 3;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub score: u32,
    pub level: u32,
    pub achieved_at: DateTime<Local>,
}

/// The record store the game talks to.
pub trait ScoreStore {
    /// Best `(score, level)`, or `(0, 1)` when nothing is stored.
    fn get_high_score(&self) -> (u32, u32);
    fn save_high_score(&mut self, score: u32, level: u32);
    fn get_top_scores(&self, n: usize) -> Vec<ScoreRecord>;
}

#[derive(Serialize, Deserialize, Default)]
struct ScoreFile {
    #[serde(default)]
    records: Vec<ScoreRecord>,
}

pub struct FileScoreStore {
    path: PathBuf,
}

impl FileScoreStore {
    pub fn new(data_dir: &Path) -> Self {
        FileScoreStore { path: data_dir.join(SCORE_FILE) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_ranked(&self) -> Result<Vec<ScoreRecord>> {
        if !self.path.exists() {
            return Ok(vec![]);
        }
        let text = std::fs::read_to_string(&self.path)
            .with_context(|| format!("reading {}", self.path.display()))?;
        let file: ScoreFile = toml::from_str(&text)
            .with_context(|| format!("parsing {}", self.path.display()))?;
        let mut records = file.records;
        rank(&mut records);
        Ok(records)
    }

    fn append(&self, record: ScoreRecord) -> Result<()> {
        let mut records = self.read_ranked()?;
        records.push(record);
        rank(&mut records);
        let text = toml::to_string(&ScoreFile { records }).context("encoding high scores")?;
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating {}", dir.display()))?;
        }
        std::fs::write(&self.path, text)
            .with_context(|| format!("writing {}", self.path.display()))
    }

    fn records_or_empty(&self) -> Vec<ScoreRecord> {
        self.read_ranked().unwrap_or_else(|e| {
            tracing::warn!("high scores unavailable: {e:#}");
            vec![]
        })
    }
}

impl ScoreStore for FileScoreStore {
    fn get_high_score(&self) -> (u32, u32) {
        self.records_or_empty()
            .first()
            .map_or((0, 1), |r| (r.score, r.level))
    }

    fn save_high_score(&mut self, score: u32, level: u32) {
        let record = ScoreRecord { score, level, achieved_at: Local::now() };
        match self.append(record) {
            Ok(()) => tracing::info!(score, level, "high score saved"),
            Err(e) => tracing::warn!("could not save high score: {e:#}"),
        }
    }

    fn get_top_scores(&self, n: usize) -> Vec<ScoreRecord> {
        let mut records = self.records_or_empty();
        records.truncate(n);
        records
    }
}

fn rank(records: &mut [ScoreRecord]) {
    records.sort_by(|a, b| b.score.cmp(&a.score).then(b.level.cmp(&a.level)));
}

/// Close out a run: store the score if it beats the best, then refresh the
/// table the game-over screen shows.
pub fn record_run(world: &mut WorldState, store: &mut dyn ScoreStore, score: u32, level: u32) {
    world.new_high_score = false;
    if score > world.high_score.0 {
        store.save_high_score(score, level);
        world.high_score = (score, level);
        world.new_high_score = true;
    }
    world.top_scores = store.get_top_scores(TOP_SHOWN);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::world::testing::world_from;

    #[test]
    fn empty_store_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileScoreStore::new(tmp.path());
        assert_eq!(store.get_high_score(), (0, 1));
        assert!(store.get_top_scores(3).is_empty());
    }

    #[test]
    fn records_ranked_by_score_then_level() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = FileScoreStore::new(tmp.path());
        store.save_high_score(300, 1);
        store.save_high_score(500, 2);
        store.save_high_score(300, 4);
        store.save_high_score(100, 9);
        assert_eq!(store.get_high_score(), (500, 2));
        let top: Vec<(u32, u32)> = store.get_top_scores(3).iter().map(|r| (r.score, r.level)).collect();
        assert_eq!(top, vec![(500, 2), (300, 4), (300, 1)]);
    }

    #[test]
    fn survives_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        FileScoreStore::new(tmp.path()).save_high_score(750, 3);
        let store = FileScoreStore::new(tmp.path());
        assert_eq!(store.get_high_score(), (750, 3));
        assert!(store.path().ends_with("high_scores.toml"));
    }

    #[test]
    fn corrupt_file_degrades_to_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("high_scores.toml"), "records = 12 [[").unwrap();
        let mut store = FileScoreStore::new(tmp.path());
        assert_eq!(store.get_high_score(), (0, 1));
        assert!(store.get_top_scores(3).is_empty());
        // writing on top of a broken file is refused, not panicked on
        store.save_high_score(10, 1);
        assert_eq!(store.get_high_score(), (0, 1));
    }

    #[test]
    fn record_run_saves_only_new_best() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = FileScoreStore::new(tmp.path());
        let mut w = world_from(&[" P E", "####"]);

        record_run(&mut w, &mut store, 400, 2);
        assert!(w.new_high_score);
        assert_eq!(w.high_score, (400, 2));
        assert_eq!(w.top_scores.len(), 1);

        record_run(&mut w, &mut store, 200, 3);
        assert!(!w.new_high_score);
        assert_eq!(w.high_score, (400, 2));
        assert_eq!(store.get_top_scores(10).len(), 1);

        record_run(&mut w, &mut store, 0, 1);
        assert!(!w.new_high_score);
    }
}
