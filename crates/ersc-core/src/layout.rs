//! Fixed offsets of the `ER0000.sl2` / `ER0000.co2` container.
//!
//! ```text
//! 0x0000000  BND4 header
//! 0x0000300  [md5 0x10][slot 0 data 0x280000] ... x10
//! 0x19003A0  [md5 0x10]
//! 0x19003B0  headers section (0x60000)
//!              +0x0004  owner id (8 bytes)
//!              +0x1954  active flags (10 bytes)
//!              +0x195E  slot headers (10 x 0x24C)
//! 0x19603B0  end of the region this crate touches
//! ```
//!
//! These values come from the game, not from us. If they drift, saves get
//! corrupted without any error, so only change them against real files.

use std::ops::Range;

pub const SLOT_COUNT: usize = 10;

pub const CHECKSUM_LENGTH: usize = 0x10;

pub const SLOT_START_INDEX: usize = 0x310;
pub const SLOT_LENGTH: usize = 0x280000;
pub const SLOT_STRIDE: usize = CHECKSUM_LENGTH + SLOT_LENGTH;

pub const SAVE_HEADERS_SECTION_START_INDEX: usize = 0x19003B0;
pub const SAVE_HEADERS_SECTION_LENGTH: usize = 0x60000;

pub const SAVE_HEADER_START_INDEX: usize = 0x1901D0E;
pub const SAVE_HEADER_LENGTH: usize = 0x24C;

pub const CHAR_ACTIVE_STATUS_START_INDEX: usize = 0x1901D04;
pub const CHAR_ACTIVE: u8 = 0x01;

// Offsets inside a single slot header
pub const CHAR_NAME_LENGTH: usize = 0x22;
pub const CHAR_LEVEL_LOCATION: usize = 0x22;
pub const CHAR_PLAYED_START_INDEX: usize = 0x26;

pub const OWNER_ID_START_INDEX: usize = 0x19003B4;
pub const OWNER_ID_LENGTH: usize = 8;

/// Smallest buffer that holds every region this crate reads or writes.
pub const MIN_CONTAINER_LENGTH: usize =
    SAVE_HEADERS_SECTION_START_INDEX + SAVE_HEADERS_SECTION_LENGTH;

pub const fn slot_data_start(index: usize) -> usize {
    SLOT_START_INDEX + index * SLOT_STRIDE
}

pub const fn slot_data_range(index: usize) -> Range<usize> {
    let start = slot_data_start(index);
    start..start + SLOT_LENGTH
}

pub const fn header_start(index: usize) -> usize {
    SAVE_HEADER_START_INDEX + index * SAVE_HEADER_LENGTH
}

pub const fn header_range(index: usize) -> Range<usize> {
    let start = header_start(index);
    start..start + SAVE_HEADER_LENGTH
}

pub const fn active_flag_index(index: usize) -> usize {
    CHAR_ACTIVE_STATUS_START_INDEX + index
}

pub const fn headers_section_range() -> Range<usize> {
    SAVE_HEADERS_SECTION_START_INDEX..MIN_CONTAINER_LENGTH
}

pub const fn owner_id_range() -> Range<usize> {
    OWNER_ID_START_INDEX..OWNER_ID_START_INDEX + OWNER_ID_LENGTH
}

/// Bytes a buffer needs before slot `index` can be read out of it.
pub const fn slot_required_len(index: usize) -> usize {
    let data_end = slot_data_range(index).end;
    let header_end = header_range(index).end;
    let flag_end = active_flag_index(index) + 1;
    let mut max = data_end;
    if header_end > max {
        max = header_end;
    }
    if flag_end > max {
        max = flag_end;
    }
    max
}
