//! Timestamped backups taken before a save file is overwritten.
//!
//! Backups sit next to the live file as `<name>.<YYYYmmdd-HHMMSS>.bak`. The
//! game keeps its own `<name>.bak`; that one is never counted or rotated here.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{CoreError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackupPolicy {
    /// How many of our backups to keep per file; 0 keeps all of them.
    pub keep: usize,
}

impl Default for BackupPolicy {
    fn default() -> Self {
        Self { keep: 10 }
    }
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(str::to_owned)
        .ok_or_else(|| {
            CoreError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a file path"),
            )
        })
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

/// Next free backup path for `path`, stamped with the local time.
pub fn next_backup_path(path: &Path) -> Result<PathBuf> {
    let name = file_name(path)?;
    let dir = parent_dir(path);
    let ts = chrono::Local::now().format("%Y%m%d-%H%M%S");
    let mut candidate = dir.join(format!("{name}.{ts}.bak"));
    let mut n = 1;
    while candidate.exists() {
        candidate = dir.join(format!("{name}.{ts}-{n}.bak"));
        n += 1;
    }
    Ok(candidate)
}

// `YYYYmmdd-HHMMSS` plus an optional `-N` collision counter.
const STAMP_LEN: usize = 15;

/// Age key of a backup stamp; `None` for anything we did not name.
fn stamp_key(stamp: &str) -> Option<(&str, u32)> {
    if stamp.len() < STAMP_LEN || !stamp.is_char_boundary(STAMP_LEN) {
        return None;
    }
    let (ts, rest) = stamp.split_at(STAMP_LEN);
    let b = ts.as_bytes();
    let digits = |s: &[u8]| s.iter().all(u8::is_ascii_digit);
    if !(digits(&b[..8]) && b[8] == b'-' && digits(&b[9..])) {
        return None;
    }
    let counter = match rest {
        "" => 0,
        _ => rest.strip_prefix('-')?.parse().ok()?,
    };
    Some((ts, counter))
}

/// Existing backups of `path` made by us, oldest first.
pub fn list_backups(path: &Path) -> Result<Vec<PathBuf>> {
    let name = file_name(path)?;
    let dir = parent_dir(path);
    let prefix = format!("{name}.");
    let rd = fs::read_dir(dir).map_err(|e| CoreError::io(dir, e))?;
    let mut keyed: Vec<((String, u32), PathBuf)> = rd
        .flatten()
        .map(|e| e.path())
        .filter_map(|p| {
            let key = p
                .file_name()
                .and_then(|s| s.to_str())
                .and_then(|n| n.strip_prefix(&prefix))
                .and_then(|rest| rest.strip_suffix(".bak"))
                .and_then(stamp_key)
                .map(|(ts, n)| (ts.to_owned(), n))?;
            Some((key, p))
        })
        .collect();
    keyed.sort();
    Ok(keyed.into_iter().map(|(_, p)| p).collect())
}

/// Writes `bytes` to a fresh backup of `path`, then prunes old ones. The
/// backup just written is never pruned.
pub fn create_backup(path: &Path, bytes: &[u8], policy: BackupPolicy) -> Result<PathBuf> {
    let dest = next_backup_path(path)?;
    fs::write(&dest, bytes).map_err(|e| CoreError::io(&dest, e))?;
    info!(backup = %dest.display(), "backup created");
    if policy.keep > 0 {
        let older: Vec<PathBuf> = list_backups(path)?.into_iter().filter(|p| *p != dest).collect();
        let excess = older.len().saturating_sub(policy.keep - 1);
        for old in older.into_iter().take(excess) {
            // A stale backup that refuses to go is not worth failing a copy over.
            if let Err(e) = fs::remove_file(&old) {
                warn!(path = %old.display(), error = %e, "could not prune backup");
            }
        }
    }
    Ok(dest)
}

/// Removes the game's own `<path>.bak`, which it would otherwise restore over
/// the freshly written file. Returns whether one was there.
pub fn remove_stale_game_backup(path: &Path) -> Result<bool> {
    let mut s = path.as_os_str().to_owned();
    s.push(".bak");
    let bak = PathBuf::from(s);
    match fs::remove_file(&bak) {
        Ok(()) => {
            info!(path = %bak.display(), "removed game backup");
            Ok(true)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(CoreError::io(bak, e)),
    }
}
