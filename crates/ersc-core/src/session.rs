//! Load/select/copy workflow shared by the CLI and the GUI.
//!
//! The session owns the loaded buffers and the current selection; the core
//! functions it calls only ever see plain slices and indices.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::backup::{self, BackupPolicy};
use crate::error::{CoreError, Result};
use crate::saves;
use crate::slot::{self, SlotRole, SlotSelection, SlotSummary};
use crate::transplant::transplant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyOptions {
    pub backup: BackupPolicy,
    /// Delete the game's own `<file>.bak` after writing.
    pub remove_game_backup: bool,
}

impl Default for CopyOptions {
    fn default() -> Self {
        Self { backup: BackupPolicy::default(), remove_game_backup: true }
    }
}

/// One loaded save file and the slots listed from it.
#[derive(Debug, Clone)]
pub struct LoadedSave {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
    pub slots: Vec<SlotSummary>,
    pub role: SlotRole,
}

impl LoadedSave {
    pub fn load(path: &Path, role: SlotRole) -> Result<Self> {
        let bytes = saves::read_container(path)?;
        Self::from_bytes(path, bytes, role)
    }

    pub fn from_bytes(path: &Path, bytes: Vec<u8>, role: SlotRole) -> Result<Self> {
        let slots = slot::list_slots(&bytes, role)?;
        Ok(Self { path: path.to_path_buf(), bytes, slots, role })
    }

    pub fn owner_id(&self) -> Result<slot::OwnerId> {
        slot::owner_id(&self.bytes)
    }

    pub fn slot(&self, index: usize) -> Option<&SlotSummary> {
        self.slots.iter().find(|s| s.index == index)
    }

    fn replace_bytes(&mut self, bytes: Vec<u8>) -> Result<()> {
        self.slots = slot::list_slots(&bytes, self.role)?;
        self.bytes = bytes;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct CopyOutcome {
    pub backup: PathBuf,
    pub target_path: PathBuf,
    pub target_slot: usize,
    pub character: String,
    pub removed_game_backup: bool,
}

#[derive(Debug, Default)]
pub struct CopySession {
    pub source: Option<LoadedSave>,
    pub target: Option<LoadedSave>,
    pub source_selection: SlotSelection,
    pub target_selection: SlotSelection,
}

impl CopySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_source(&mut self, path: &Path) -> Result<()> {
        self.source = None;
        self.source_selection = SlotSelection::None;
        let loaded = LoadedSave::load(path, SlotRole::Source)?;
        let Some(first) = loaded.slots.first() else {
            return Err(CoreError::NoActiveSlots(path.to_path_buf()));
        };
        self.source_selection = SlotSelection::Slot(first.index);
        info!(path = %path.display(), slots = loaded.slots.len(), "source loaded");
        self.source = Some(loaded);
        Ok(())
    }

    pub fn load_target(&mut self, path: &Path) -> Result<()> {
        self.target = None;
        self.target_selection = SlotSelection::None;
        let loaded = LoadedSave::load(path, SlotRole::Target)?;
        self.target_selection =
            loaded.slots.first().map_or(SlotSelection::None, |s| SlotSelection::Slot(s.index));
        info!(path = %path.display(), "target loaded");
        self.target = Some(loaded);
        Ok(())
    }

    /// Selects a listed source slot by its container index; unknown indices
    /// clear the selection.
    pub fn select_source(&mut self, index: usize) {
        self.source_selection = select_in(self.source.as_ref(), index);
    }

    pub fn select_target(&mut self, index: usize) {
        self.target_selection = select_in(self.target.as_ref(), index);
    }

    pub fn selected_source(&self) -> Option<&SlotSummary> {
        self.source.as_ref()?.slot(self.source_selection.index()?)
    }

    pub fn selected_target(&self) -> Option<&SlotSummary> {
        self.target.as_ref()?.slot(self.target_selection.index()?)
    }

    pub fn can_copy(&self) -> bool {
        match (&self.source, &self.target) {
            (Some(s), Some(t)) => {
                !s.bytes.is_empty()
                    && !t.bytes.is_empty()
                    && s.path != t.path
                    && self.selected_source().is_some()
                    && self.selected_target().is_some()
            }
            _ => false,
        }
    }

    pub fn copy_label(&self) -> String {
        if !self.can_copy() {
            return "Select Source and Destination file and characters".to_string();
        }
        let (Some(src), Some(dst)) = (self.selected_source(), self.selected_target()) else {
            return "Select Source and Destination file and characters".to_string();
        };
        if dst.active {
            format!(
                "Copy source character {} over destination character {}",
                src.name, dst.name
            )
        } else {
            format!("Copy source character {} on destination file {}", src.name, dst.name)
        }
    }

    /// Copies the selected source character into the selected target slot and
    /// writes the target file. A backup of the current target bytes is taken
    /// first; if that or the transplant fails the target file is not touched.
    pub fn copy(&mut self, options: CopyOptions) -> Result<CopyOutcome> {
        let (Some(source), Some(target)) = (&self.source, &self.target) else {
            return Err(CoreError::NothingSelected);
        };
        if source.path == target.path {
            return Err(CoreError::SamePath(target.path.clone()));
        }
        let (Some(src_slot), Some(dst_slot)) = (self.selected_source(), self.selected_target())
        else {
            return Err(CoreError::NothingSelected);
        };
        let (src_index, dst_index) = (src_slot.index, dst_slot.index);
        let character = src_slot.name.clone();

        let src_owner = source.owner_id()?;
        let dst_owner = target.owner_id()?;
        let written = transplant(
            &source.bytes,
            src_index,
            &target.bytes,
            dst_index,
            &src_owner,
            &dst_owner,
        )?;

        let backup = backup::create_backup(&target.path, &target.bytes, options.backup)?;
        saves::write_container(&target.path, &written)?;
        let target_path = target.path.clone();
        let removed_game_backup = if options.remove_game_backup {
            match backup::remove_stale_game_backup(&target_path) {
                Ok(removed) => removed,
                Err(e) => {
                    warn!(error = %e, "written, but the game backup could not be removed");
                    false
                }
            }
        } else {
            false
        };

        // The file on disk is now `written`; adopt it so later copies build on it.
        if let Some(t) = self.target.as_mut() {
            t.replace_bytes(written)?;
        }
        self.target_selection = SlotSelection::Slot(dst_index);
        info!(
            character = %character,
            from = src_index,
            to = dst_index,
            target = %target_path.display(),
            "character copied"
        );
        Ok(CopyOutcome {
            backup,
            target_path,
            target_slot: dst_index,
            character,
            removed_game_backup,
        })
    }
}

fn select_in(save: Option<&LoadedSave>, index: usize) -> SlotSelection {
    match save.and_then(|s| s.slot(index)) {
        Some(s) => SlotSelection::Slot(s.index),
        None => SlotSelection::None,
    }
}
