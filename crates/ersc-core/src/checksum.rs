use std::ops::Range;

use md5::{Digest, Md5};
use tracing::debug;

use crate::error::{CoreError, Result, Step};
use crate::layout::{self, CHECKSUM_LENGTH};

pub type Checksum = [u8; CHECKSUM_LENGTH];

/// MD5 of `bytes`. The container format fixes the algorithm.
pub fn digest(bytes: &[u8]) -> Checksum {
    let hash = Md5::digest(bytes);
    let mut out = [0u8; CHECKSUM_LENGTH];
    out.copy_from_slice(&hash);
    out
}

/// Hashes `buf[range]` and stores the digest at `buf[placement..placement + 16]`.
///
/// The digest must sit entirely before the range it protects; anything else
/// is rejected rather than trusted to layout arithmetic.
pub fn write_digest(
    buf: &mut [u8],
    range: Range<usize>,
    placement: usize,
    step: Step,
    slot: Option<usize>,
) -> Result<Checksum> {
    if range.start > range.end || range.end > buf.len() {
        return Err(CoreError::digest(
            step,
            slot,
            format!("range {range:#x?} outside buffer of {:#x} bytes", buf.len()),
        ));
    }
    match placement.checked_add(CHECKSUM_LENGTH) {
        Some(end) if end <= range.start => {}
        _ => {
            return Err(CoreError::digest(
                step,
                slot,
                format!("checksum at {placement:#x} does not precede range {range:#x?}"),
            ));
        }
    }
    let sum = digest(&buf[range.clone()]);
    buf[placement..placement + CHECKSUM_LENGTH].copy_from_slice(&sum);
    debug!(?step, ?slot, placement, "checksum written");
    Ok(sum)
}

fn stored(buf: &[u8], placement: usize, step: Step, slot: Option<usize>) -> Result<Checksum> {
    let end = placement + CHECKSUM_LENGTH;
    let bytes = buf
        .get(placement..end)
        .ok_or_else(|| CoreError::too_short(step, slot, end, buf.len()))?;
    let mut out = [0u8; CHECKSUM_LENGTH];
    out.copy_from_slice(bytes);
    Ok(out)
}

fn check_index(index: usize, step: Step) -> Result<()> {
    if index >= layout::SLOT_COUNT {
        return Err(CoreError::format(
            step,
            Some(index),
            format!("slot index out of range (0..{})", layout::SLOT_COUNT),
        ));
    }
    Ok(())
}

pub fn slot_checksum_offset(index: usize) -> Result<usize> {
    check_index(index, Step::SlotChecksum)?;
    Ok(layout::slot_data_start(index) - CHECKSUM_LENGTH)
}

pub fn headers_checksum_offset() -> usize {
    layout::SAVE_HEADERS_SECTION_START_INDEX - CHECKSUM_LENGTH
}

pub fn write_slot_checksum(buf: &mut [u8], index: usize) -> Result<Checksum> {
    let placement = slot_checksum_offset(index)?;
    write_digest(
        buf,
        layout::slot_data_range(index),
        placement,
        Step::SlotChecksum,
        Some(index),
    )
}

pub fn write_headers_checksum(buf: &mut [u8]) -> Result<Checksum> {
    write_digest(
        buf,
        layout::headers_section_range(),
        headers_checksum_offset(),
        Step::HeadersChecksum,
        None,
    )
}

/// Whether the checksum stored in front of slot `index` matches its data.
pub fn verify_slot(buf: &[u8], index: usize) -> Result<bool> {
    let placement = slot_checksum_offset(index)?;
    let range = layout::slot_data_range(index);
    let data = buf
        .get(range.clone())
        .ok_or_else(|| CoreError::too_short(Step::SlotChecksum, Some(index), range.end, buf.len()))?;
    let want = stored(buf, placement, Step::SlotChecksum, Some(index))?;
    Ok(digest(data) == want)
}

pub fn verify_headers(buf: &[u8]) -> Result<bool> {
    let range = layout::headers_section_range();
    let data = buf
        .get(range.clone())
        .ok_or_else(|| CoreError::too_short(Step::HeadersChecksum, None, range.end, buf.len()))?;
    let want = stored(buf, headers_checksum_offset(), Step::HeadersChecksum, None)?;
    Ok(digest(data) == want)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyReport {
    /// Active slots whose stored checksum does not match.
    pub bad_slots: Vec<usize>,
    pub headers_ok: bool,
}

impl VerifyReport {
    pub fn is_ok(&self) -> bool {
        self.headers_ok && self.bad_slots.is_empty()
    }
}

/// Checks every active slot and the headers section. Empty slots are
/// skipped; the game does not keep their checksums current.
pub fn verify_container(buf: &[u8]) -> Result<VerifyReport> {
    let mut report = VerifyReport { headers_ok: verify_headers(buf)?, ..Default::default() };
    for i in 0..layout::SLOT_COUNT {
        let flag = layout::active_flag_index(i);
        let active = buf.get(flag).copied() == Some(layout::CHAR_ACTIVE);
        if active && !verify_slot(buf, i)? {
            report.bad_slots.push(i);
        }
    }
    Ok(report)
}
