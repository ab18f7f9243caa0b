use crate::error::{CoreError, Result, Step};
use crate::layout::{self, CHAR_ACTIVE, OWNER_ID_LENGTH, SLOT_COUNT};
use crate::pattern;

pub type OwnerId = [u8; OWNER_ID_LENGTH];

/// A borrowed view of one character slot inside a container buffer.
///
/// Views are cheap and never outlive the buffer they were cut from; re-read
/// them after every mutation instead of keeping them around.
#[derive(Debug, Clone, Copy)]
pub struct SaveSlot<'a> {
    pub index: usize,
    pub data: &'a [u8],
    pub header: &'a [u8],
    pub active: bool,
}

impl<'a> SaveSlot<'a> {
    pub fn read(buf: &'a [u8], index: usize) -> Result<Self> {
        if index >= SLOT_COUNT {
            return Err(CoreError::format(
                Step::ReadSlot,
                Some(index),
                format!("slot index out of range (0..{SLOT_COUNT})"),
            ));
        }
        let needed = layout::slot_required_len(index);
        if buf.len() < needed {
            return Err(CoreError::too_short(Step::ReadSlot, Some(index), needed, buf.len()));
        }
        Ok(Self {
            index,
            data: &buf[layout::slot_data_range(index)],
            header: &buf[layout::header_range(index)],
            active: buf[layout::active_flag_index(index)] == CHAR_ACTIVE,
        })
    }

    /// Name stored in the header, cut at the first NUL.
    pub fn character_name(&self) -> String {
        let raw = &self.header[..layout::CHAR_NAME_LENGTH];
        let units: Vec<u16> = raw
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .take_while(|&u| u != 0)
            .collect();
        String::from_utf16_lossy(&units)
    }

    /// What a slot list shows: the character name, or `Slot N` when empty.
    pub fn display_name(&self) -> String {
        if self.active {
            self.character_name()
        } else {
            placeholder_name(self.index)
        }
    }

    pub fn level(&self) -> u32 {
        read_u32(self.header, layout::CHAR_LEVEL_LOCATION)
    }

    pub fn seconds_played(&self) -> u32 {
        read_u32(self.header, layout::CHAR_PLAYED_START_INDEX)
    }

    /// Offsets inside `data` where `owner` appears.
    pub fn owner_id_offsets(&self, owner: &[u8]) -> Vec<usize> {
        pattern::starting_indices(self.data, owner).collect()
    }

    pub fn summary(&self) -> SlotSummary {
        SlotSummary {
            index: self.index,
            active: self.active,
            name: self.display_name(),
            level: self.level(),
            seconds_played: self.seconds_played(),
        }
    }
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    let mut b = [0u8; 4];
    b.copy_from_slice(&bytes[at..at + 4]);
    u32::from_le_bytes(b)
}

pub fn placeholder_name(index: usize) -> String {
    format!("Slot {}", index + 1)
}

/// Owned copy of what a slot list needs; survives buffer replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotSummary {
    pub index: usize,
    pub active: bool,
    pub name: String,
    pub level: u32,
    pub seconds_played: u32,
}

impl SlotSummary {
    pub fn play_time(&self) -> String {
        format_play_time(self.seconds_played)
    }
}

pub fn format_play_time(seconds: u32) -> String {
    format!("{:02}h {:02}m", seconds / 3600, (seconds % 3600) / 60)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotRole {
    /// Only slots holding a character.
    Source,
    /// All ten slots, empty ones under a placeholder name.
    Target,
}

pub fn list_slots(buf: &[u8], role: SlotRole) -> Result<Vec<SlotSummary>> {
    let mut out = Vec::with_capacity(SLOT_COUNT);
    for i in 0..SLOT_COUNT {
        let slot = SaveSlot::read(buf, i)?;
        if role == SlotRole::Target || slot.active {
            out.push(slot.summary());
        }
    }
    Ok(out)
}

/// Nothing selected is distinct from slot 0 being selected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SlotSelection {
    #[default]
    None,
    Slot(usize),
}

impl SlotSelection {
    pub fn index(self) -> Option<usize> {
        match self {
            SlotSelection::None => None,
            SlotSelection::Slot(i) => Some(i),
        }
    }
    pub fn is_none(self) -> bool {
        self == SlotSelection::None
    }
}

/// The platform account id the container is bound to.
pub fn owner_id(buf: &[u8]) -> Result<OwnerId> {
    let range = layout::owner_id_range();
    let bytes = buf
        .get(range.clone())
        .ok_or_else(|| CoreError::too_short(Step::ReadOwnerId, None, range.end, buf.len()))?;
    let mut id = [0u8; OWNER_ID_LENGTH];
    id.copy_from_slice(bytes);
    Ok(id)
}
