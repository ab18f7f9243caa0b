use tracing::{debug, info};

use crate::checksum;
use crate::error::{CoreError, Result, Step};
use crate::layout::{self, CHAR_ACTIVE, MIN_CONTAINER_LENGTH};
use crate::pattern;
use crate::slot::SaveSlot;

/// Copies slot `source_slot` of `source` into slot `target_slot` of a copy of
/// `target`, re-owned from `source_owner` to `target_owner`, with both
/// checksums repaired.
///
/// Neither input is modified. On error nothing has been written anywhere; on
/// success the caller persists the returned buffer and drops its old copy of
/// `target`.
pub fn transplant(
    source: &[u8],
    source_slot: usize,
    target: &[u8],
    target_slot: usize,
    source_owner: &[u8],
    target_owner: &[u8],
) -> Result<Vec<u8>> {
    if source_owner.is_empty() || source_owner.len() != target_owner.len() {
        return Err(CoreError::format(
            Step::ReplaceOwnerId,
            Some(source_slot),
            format!(
                "owner ids must be non-empty and equally long (source {}, target {})",
                source_owner.len(),
                target_owner.len()
            ),
        ));
    }
    let src = SaveSlot::read(source, source_slot)?;
    // Validates the target slot's own ranges as well.
    SaveSlot::read(target, target_slot)?;
    if target.len() < MIN_CONTAINER_LENGTH {
        return Err(CoreError::too_short(
            Step::HeadersChecksum,
            Some(target_slot),
            MIN_CONTAINER_LENGTH,
            target.len(),
        ));
    }

    let mut data = src.data.to_vec();
    let hits = pattern::replace_all(&mut data, source_owner, target_owner);
    debug!(slot = source_slot, hits = hits.len(), "owner id replaced");

    let mut out = target.to_vec();
    out[layout::slot_data_range(target_slot)].copy_from_slice(&data);
    out[layout::header_range(target_slot)].copy_from_slice(src.header);
    out[layout::active_flag_index(target_slot)] = CHAR_ACTIVE;

    checksum::write_slot_checksum(&mut out, target_slot)?;
    checksum::write_headers_checksum(&mut out)?;

    info!(
        from = source_slot,
        to = target_slot,
        name = %src.character_name(),
        "slot transplanted"
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::{verify_headers, verify_slot};
    use crate::layout::SLOT_COUNT;

    const SRC_ID: [u8; 8] = [0x11, 0x00, 0x00, 0x01, 0xAA, 0xBB, 0xCC, 0xDD];
    const DST_ID: [u8; 8] = [0x11, 0x00, 0x00, 0x01, 0x01, 0x02, 0x03, 0x04];

    fn container(owner: [u8; 8], active: &[usize]) -> Vec<u8> {
        let mut buf = vec![0u8; MIN_CONTAINER_LENGTH];
        buf[layout::owner_id_range()].copy_from_slice(&owner);
        for &i in active {
            let d = layout::slot_data_start(i);
            buf[d] = i as u8 + 1;
            buf[d + 0x100..d + 0x108].copy_from_slice(&owner);
            buf[d + 0x2000..d + 0x2008].copy_from_slice(&owner);
            let h = layout::header_start(i);
            buf[h..h + 2].copy_from_slice(&(b'A' as u16 + i as u16).to_le_bytes());
            buf[layout::active_flag_index(i)] = CHAR_ACTIVE;
        }
        for i in 0..SLOT_COUNT {
            checksum::write_slot_checksum(&mut buf, i).unwrap();
        }
        checksum::write_headers_checksum(&mut buf).unwrap();
        buf
    }

    #[test]
    fn checksums_valid_after_transplant() {
        let src = container(SRC_ID, &[0, 2]);
        let dst = container(DST_ID, &[1]);
        let out = transplant(&src, 2, &dst, 5, &SRC_ID, &DST_ID).unwrap();
        assert_eq!(out.len(), dst.len());
        assert!(verify_slot(&out, 5).unwrap());
        assert!(verify_headers(&out).unwrap());
        assert_eq!(SaveSlot::read(&out, 5).unwrap().character_name(), "C");
    }

    #[test]
    fn owner_id_rewritten_inside_slot_only() {
        let src = container(SRC_ID, &[0]);
        let mut dst = container(DST_ID, &[]);
        // A stray copy of the source id elsewhere in the target must survive.
        let stray = layout::slot_data_start(7) + 0x40;
        dst[stray..stray + 8].copy_from_slice(&SRC_ID);
        let out = transplant(&src, 0, &dst, 3, &SRC_ID, &DST_ID).unwrap();
        let d = layout::slot_data_start(3);
        assert_eq!(&out[d + 0x100..d + 0x108], &DST_ID);
        assert_eq!(&out[d + 0x2000..d + 0x2008], &DST_ID);
        let slot = SaveSlot::read(&out, 3).unwrap();
        assert!(slot.owner_id_offsets(&SRC_ID).is_empty());
        assert_eq!(&out[stray..stray + 8], &SRC_ID);
    }

    #[test]
    fn inputs_are_left_untouched() {
        let src = container(SRC_ID, &[0]);
        let dst = container(DST_ID, &[]);
        let (src_before, dst_before) = (src.clone(), dst.clone());
        transplant(&src, 0, &dst, 0, &SRC_ID, &DST_ID).unwrap();
        assert_eq!(src, src_before);
        assert_eq!(dst, dst_before);
    }

    #[test]
    fn mismatched_owner_lengths_fail() {
        let src = container(SRC_ID, &[0]);
        let dst = container(DST_ID, &[]);
        let err = transplant(&src, 0, &dst, 1, &SRC_ID, &DST_ID[..4]).unwrap_err();
        assert!(matches!(err, CoreError::Format { step: Step::ReplaceOwnerId, .. }));
    }

    #[test]
    fn empty_owner_id_fails() {
        let src = container(SRC_ID, &[0]);
        let dst = container(DST_ID, &[]);
        assert!(transplant(&src, 0, &dst, 1, &[], &[]).is_err());
    }

    #[test]
    fn short_target_slot_reports_read_step() {
        let src = container(SRC_ID, &[0]);
        let dst = vec![0u8; layout::slot_required_len(9) - 1];
        let err = transplant(&src, 0, &dst, 9, &SRC_ID, &DST_ID).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Format { step: Step::ReadSlot, slot: Some(9), .. }
        ));
        assert!(err.to_string().contains("read slot"));
    }

    #[test]
    fn short_target_fails() {
        let src = container(SRC_ID, &[0]);
        let dst = vec![0u8; layout::slot_required_len(0)];
        let err = transplant(&src, 0, &dst, 0, &SRC_ID, &DST_ID).unwrap_err();
        assert!(matches!(err, CoreError::Format { .. }));
    }
}
