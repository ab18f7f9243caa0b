//! ersc-core: copy characters between Elden Ring save containers
//!
//! The pieces, leaf first:
//! - `layout`: fixed offsets of the container format
//! - `pattern`: byte subsequence search used to find owner ids
//! - `slot`: read-only views of a slot and its header
//! - `checksum`: MD5 digests stored in front of protected ranges
//! - `transplant`: the slot copy itself, pure over byte buffers
//!
//! Around them, the collaborators a front end needs: file discovery and IO
//! (`saves`), backups (`backup`), the on-disk error log (`errlog`) and the
//! load/select/copy workflow (`session`).
pub mod backup;
pub mod checksum;
pub mod errlog;
pub mod error;
pub mod layout;
pub mod pattern;
pub mod saves;
pub mod session;
pub mod slot;
pub mod transplant;

pub use backup::{BackupPolicy, create_backup, remove_stale_game_backup};
pub use checksum::{VerifyReport, digest, verify_container, verify_headers, verify_slot};
pub use errlog::append_error_log;
pub use error::{CoreError, Result, Step};
pub use saves::{default_save_dir, find_save_file, read_container, write_container};
pub use session::{CopyOptions, CopyOutcome, CopySession, LoadedSave};
pub use slot::{
    OwnerId, SaveSlot, SlotRole, SlotSelection, SlotSummary, list_slots, owner_id,
};
pub use transplant::transplant;
