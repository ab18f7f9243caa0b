use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};

pub const ERROR_LOG_NAME: &str = "error.log";

/// Appends a timestamped entry to `dir/error.log` and returns the log path.
pub fn append_error_log(dir: &Path, message: &str, detail: Option<&str>) -> Result<PathBuf> {
    let path = dir.join(ERROR_LOG_NAME);
    let mut entry = format!(
        "[{}] {}\n",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        message
    );
    if let Some(d) = detail {
        entry.push_str(&format!("Error: {d}\n"));
    }
    let mut f = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| CoreError::io(&path, e))?;
    f.write_all(entry.as_bytes()).map_err(|e| CoreError::io(&path, e))?;
    Ok(path)
}
