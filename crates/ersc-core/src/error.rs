use std::path::PathBuf;

use thiserror::Error;

/// Which part of a copy was running when something went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    ReadSlot,
    ReadOwnerId,
    ReplaceOwnerId,
    SlotChecksum,
    HeadersChecksum,
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Step::ReadSlot => "read slot",
            Step::ReadOwnerId => "read owner id",
            Step::ReplaceOwnerId => "replace owner id",
            Step::SlotChecksum => "write slot checksum",
            Step::HeadersChecksum => "write headers checksum",
        };
        f.write_str(s)
    }
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("format error ({step}, slot {slot:?}): {detail}")]
    Format {
        step: Step,
        slot: Option<usize>,
        detail: String,
    },

    #[error("checksum error ({step}, slot {slot:?}): {detail}")]
    Digest {
        step: Step,
        slot: Option<usize>,
        detail: String,
    },

    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no active save slots found in {}", .0.display())]
    NoActiveSlots(PathBuf),

    #[error("source and destination character must both be selected")]
    NothingSelected,

    #[error("source and destination are the same file: {}", .0.display())]
    SamePath(PathBuf),
}

impl CoreError {
    pub(crate) fn format(step: Step, slot: Option<usize>, detail: impl Into<String>) -> Self {
        CoreError::Format { step, slot, detail: detail.into() }
    }

    pub(crate) fn digest(step: Step, slot: Option<usize>, detail: impl Into<String>) -> Self {
        CoreError::Digest { step, slot, detail: detail.into() }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CoreError::Io { path: path.into(), source }
    }

    /// Too short for the region a step needs.
    pub(crate) fn too_short(step: Step, slot: Option<usize>, needed: usize, actual: usize) -> Self {
        Self::format(
            step,
            slot,
            format!("buffer is {actual:#x} bytes, need at least {needed:#x}"),
        )
    }
}

pub type Result<T, E = CoreError> = std::result::Result<T, E>;
