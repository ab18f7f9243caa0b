use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};

pub const SAVE_FILE_NAMES: [&str; 2] = ["ER0000.sl2", "ER0000.co2"];

pub fn is_save_file(p: &Path) -> bool {
    p.is_file()
        && p.file_name().and_then(|s| s.to_str()).map(|n| SAVE_FILE_NAMES.contains(&n)) == Some(true)
}

/// First known save file in `dir`, vanilla before Seamless Co-op.
pub fn find_save_file(dir: &Path) -> Option<PathBuf> {
    SAVE_FILE_NAMES.iter().map(|n| dir.join(n)).find(|p| p.is_file())
}

/// `%APPDATA%\EldenRing` (or the platform equivalent) when it exists.
pub fn default_save_dir() -> Option<PathBuf> {
    let dir = dirs::config_dir()?.join("EldenRing");
    dir.is_dir().then_some(dir)
}

pub fn read_container(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| CoreError::io(path, e))
}

pub fn write_container(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).map_err(|e| CoreError::io(path, e))
}
