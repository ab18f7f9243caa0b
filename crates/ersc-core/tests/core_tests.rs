use std::fs;
use std::path::Path;

use ersc_core::layout::{self, MIN_CONTAINER_LENGTH, SLOT_COUNT};
use ersc_core::{
    CopyOptions, CopySession, CoreError, SaveSlot, SlotSelection, checksum, transplant,
    verify_container, verify_headers, verify_slot,
};

const SRC_ID: [u8; 8] = [0x10, 0x00, 0x00, 0x01, 0x12, 0x34, 0x56, 0x78];
const DST_ID: [u8; 8] = [0x10, 0x00, 0x00, 0x01, 0x9A, 0xBC, 0xDE, 0xF0];

// Synthetic container: every named slot active with a UTF-16 name, some
// filler, two embedded copies of the owner id, and valid checksums.
fn build_container(owner: [u8; 8], chars: &[(usize, &str)]) -> Vec<u8> {
    let mut buf = vec![0u8; MIN_CONTAINER_LENGTH];
    buf[layout::owner_id_range()].copy_from_slice(&owner);
    for &(i, name) in chars {
        let d = layout::slot_data_start(i);
        for (k, b) in buf[d..d + 0x400].iter_mut().enumerate() {
            *b = (k as u8).wrapping_mul(31).wrapping_add(i as u8);
        }
        buf[d + 0x10..d + 0x18].copy_from_slice(&owner);
        buf[d + 0x1_F000..d + 0x1_F008].copy_from_slice(&owner);
        let h = layout::header_start(i);
        for (k, u) in name.encode_utf16().enumerate() {
            buf[h + 2 * k..h + 2 * k + 2].copy_from_slice(&u.to_le_bytes());
        }
        let lvl = h + layout::CHAR_LEVEL_LOCATION;
        buf[lvl..lvl + 4].copy_from_slice(&(40 + i as u32).to_le_bytes());
        buf[layout::active_flag_index(i)] = layout::CHAR_ACTIVE;
    }
    for i in 0..SLOT_COUNT {
        checksum::write_slot_checksum(&mut buf, i).unwrap();
    }
    checksum::write_headers_checksum(&mut buf).unwrap();
    buf
}

fn write(dir: &Path, sub: &str, bytes: &[u8]) -> std::path::PathBuf {
    let d = dir.join(sub);
    fs::create_dir_all(&d).unwrap();
    let p = d.join("ER0000.sl2");
    fs::write(&p, bytes).unwrap();
    p
}

#[test]
fn slot_zero_into_empty_slot_three() {
    let src = build_container(SRC_ID, &[(0, "Tarnished")]);
    let dst = build_container(DST_ID, &[]);
    let out = transplant(&src, 0, &dst, 3, &SRC_ID, &DST_ID).unwrap();

    assert_eq!(out.len(), dst.len());
    let slot = SaveSlot::read(&out, 3).unwrap();
    assert!(slot.active);
    assert_eq!(slot.character_name(), "Tarnished");

    // Data equals the source slot with the id swapped.
    let mut expected = src[layout::slot_data_range(0)].to_vec();
    expected[0x10..0x18].copy_from_slice(&DST_ID);
    expected[0x1_F000..0x1_F008].copy_from_slice(&DST_ID);
    assert_eq!(slot.data, expected.as_slice());
    assert_eq!(slot.header, &src[layout::header_range(0)]);

    assert!(verify_slot(&out, 3).unwrap());
    assert!(verify_headers(&out).unwrap());

    // Everything that changed belongs to slot 3 or the headers checksum.
    let slot_sum = layout::slot_data_start(3) - layout::CHECKSUM_LENGTH;
    let headers_sum = layout::SAVE_HEADERS_SECTION_START_INDEX - layout::CHECKSUM_LENGTH;
    let allowed = |i: usize| {
        layout::slot_data_range(3).contains(&i)
            || (slot_sum..slot_sum + 16).contains(&i)
            || layout::header_range(3).contains(&i)
            || i == layout::active_flag_index(3)
            || (headers_sum..headers_sum + 16).contains(&i)
    };
    let stray = (0..out.len()).find(|&i| out[i] != dst[i] && !allowed(i));
    assert_eq!(stray, None);
    for i in (0..SLOT_COUNT).filter(|&i| i != 3) {
        let r = layout::slot_data_range(i);
        assert_eq!(&out[r.clone()], &dst[r]);
        assert!(!SaveSlot::read(&out, i).unwrap().active);
    }
}

#[test]
fn self_transplant_is_identity() {
    let buf = build_container(SRC_ID, &[(2, "Blaidd"), (5, "Ranni")]);
    let out = transplant(&buf, 2, &buf, 2, &SRC_ID, &SRC_ID).unwrap();
    assert_eq!(out, buf);
}

#[test]
fn owner_ids_of_different_length_change_nothing() {
    let src = build_container(SRC_ID, &[(0, "A")]);
    let dst = build_container(DST_ID, &[]);
    let before = dst.clone();
    let err = transplant(&src, 0, &dst, 1, &SRC_ID, &DST_ID[..7]).unwrap_err();
    assert!(matches!(err, CoreError::Format { .. }));
    assert_eq!(dst, before);
}

#[test]
fn buffer_too_short_for_slot_nine() {
    let buf = vec![0u8; layout::slot_required_len(9) - 1];
    assert!(SaveSlot::read(&buf, 0).is_ok());
    let err = SaveSlot::read(&buf, 9).unwrap_err();
    assert!(err.to_string().contains("slot Some(9)"));
}

#[test]
fn repeated_copies_keep_container_valid() {
    let src = build_container(SRC_ID, &[(0, "One"), (1, "Two")]);
    let mut dst = build_container(DST_ID, &[(4, "Keep")]);
    dst = transplant(&src, 0, &dst, 0, &SRC_ID, &DST_ID).unwrap();
    dst = transplant(&src, 1, &dst, 9, &SRC_ID, &DST_ID).unwrap();
    let report = verify_container(&dst).unwrap();
    assert!(report.is_ok(), "{report:?}");
    let names: Vec<String> = ersc_core::list_slots(&dst, ersc_core::SlotRole::Source)
        .unwrap()
        .into_iter()
        .map(|s| s.name)
        .collect();
    assert_eq!(names, vec!["One", "Keep", "Two"]);
}

#[test]
fn verify_reports_tampered_slot() {
    let mut buf = build_container(SRC_ID, &[(1, "X")]);
    buf[layout::slot_data_start(1) + 5] ^= 0xFF;
    let report = verify_container(&buf).unwrap();
    assert_eq!(report.bad_slots, vec![1]);
    assert!(report.headers_ok);
}

#[test]
fn session_copy_writes_backup_and_target() {
    let dir = tempfile::tempdir().unwrap();
    let src_path = write(dir.path(), "src", &build_container(SRC_ID, &[(0, "Tarnished")]));
    let original = build_container(DST_ID, &[(0, "Old")]);
    let dst_path = write(dir.path(), "dst", &original);
    let game_bak = dst_path.with_file_name("ER0000.sl2.bak");
    fs::write(&game_bak, b"game").unwrap();

    let mut session = CopySession::new();
    assert!(!session.can_copy());
    assert_eq!(session.copy_label(), "Select Source and Destination file and characters");
    session.load_source(&src_path).unwrap();
    session.load_target(&dst_path).unwrap();
    assert_eq!(session.source_selection, SlotSelection::Slot(0));
    assert_eq!(
        session.copy_label(),
        "Copy source character Tarnished over destination character Old"
    );
    session.select_target(2);
    assert_eq!(
        session.copy_label(),
        "Copy source character Tarnished on destination file Slot 3"
    );

    let outcome = session.copy(CopyOptions::default()).unwrap();
    assert_eq!(outcome.target_slot, 2);
    assert_eq!(outcome.character, "Tarnished");
    assert!(outcome.removed_game_backup);
    assert!(!game_bak.exists());
    assert_eq!(fs::read(&outcome.backup).unwrap(), original);

    let on_disk = fs::read(&dst_path).unwrap();
    assert_eq!(session.target.as_ref().unwrap().bytes, on_disk);
    assert!(verify_container(&on_disk).unwrap().is_ok());
    let t = session.selected_target().unwrap();
    assert!(t.active);
    assert_eq!(t.name, "Tarnished");
}

#[test]
fn session_rejects_same_file_and_empty_source() {
    let dir = tempfile::tempdir().unwrap();
    let p = write(dir.path(), "one", &build_container(SRC_ID, &[(0, "Me")]));
    let mut session = CopySession::new();
    session.load_source(&p).unwrap();
    session.load_target(&p).unwrap();
    assert!(!session.can_copy());
    assert!(matches!(
        session.copy(CopyOptions::default()),
        Err(CoreError::SamePath(_))
    ));

    let empty = write(dir.path(), "empty", &build_container(DST_ID, &[]));
    let err = session.load_source(&empty).unwrap_err();
    assert!(matches!(err, CoreError::NoActiveSlots(_)));
    assert!(session.source.is_none());
    assert!(session.source_selection.is_none());
}

#[test]
fn session_load_of_truncated_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let p = write(dir.path(), "short", &[0u8; 4096]);
    let mut session = CopySession::new();
    assert!(matches!(
        session.load_target(&p),
        Err(CoreError::Format { .. })
    ));
}
