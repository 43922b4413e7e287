//! Stage completion sentinels.
//!
//! A stage counts as done only when `FGNET/.stages/<stage>.json` exists and
//! carries the fingerprint of the current configuration. The sentinel is
//! written last, through a temp file and a rename, so an interrupted stage
//! never looks complete.

use crate::constants;
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSentinel {
    pub stage: String,
    pub fingerprint: String,
    pub completed_at: DateTime<Utc>,
    pub rows: usize,
}

/// What a stage found when it was asked to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageState {
    /// Sentinel present with a matching fingerprint.
    Complete,
    /// Sentinel present but written for a different configuration or input.
    Stale,
    /// No sentinel.
    Missing,
}

pub fn sentinel_path(root: &Path, stage: &str) -> PathBuf {
    root.join(constants::STAGES_DIR).join(format!("{stage}.json"))
}

/// SHA-256 over `|`-joined parts, hex encoded.
pub fn compute_fingerprint(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            hasher.update(b"|");
        }
        hasher.update(part.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// SHA-256 of a file's bytes, hex encoded.
pub fn file_digest(path: &Path) -> Result<String> {
    let bytes = fs::read(path)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

pub fn read_sentinel(root: &Path, stage: &str) -> Result<Option<StageSentinel>> {
    let path = sentinel_path(root, stage);
    if !path.exists() {
        return Ok(None);
    }
    let text = fs::read_to_string(&path)?;
    Ok(Some(serde_json::from_str(&text)?))
}

pub fn stage_state(root: &Path, stage: &str, fingerprint: &str) -> Result<StageState> {
    Ok(match read_sentinel(root, stage)? {
        Some(s) if s.fingerprint == fingerprint => StageState::Complete,
        Some(_) => StageState::Stale,
        None => StageState::Missing,
    })
}

pub fn mark_complete(root: &Path, stage: &str, fingerprint: &str, rows: usize) -> Result<StageSentinel> {
    let sentinel = StageSentinel {
        stage: stage.to_string(),
        fingerprint: fingerprint.to_string(),
        completed_at: Utc::now(),
        rows,
    };
    let path = sentinel_path(root, stage);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, serde_json::to_string_pretty(&sentinel)?)?;
    fs::rename(&tmp, &path)?;
    Ok(sentinel)
}

/// Removes a stage's sentinel so later stages see it as not done.
pub fn clear(root: &Path, stage: &str) -> Result<()> {
    let path = sentinel_path(root, stage);
    if path.exists() {
        fs::remove_file(path)?;
    }
    Ok(())
}
