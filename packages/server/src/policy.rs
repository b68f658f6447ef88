//! Access decisions for files and labels.
//!
//! Everything here is a pure function of the principal, a loaded record and
//! the requested operation. Callers load the record first (so a missing id
//! reports `NotFound` before anything else) and consult the policy before
//! touching either store.

use crate::error::AppError;
use crate::records::{FileRecord, Label, PermissionLevel, UserId};

/// What a principal may do with one file, weakest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum FileAccess {
    None,
    ReadOnly,
    ReadWrite,
    Owner,
}

impl From<PermissionLevel> for FileAccess {
    fn from(level: PermissionLevel) -> Self {
        match level {
            PermissionLevel::ReadOnly => FileAccess::ReadOnly,
            PermissionLevel::ReadWrite => FileAccess::ReadWrite,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileOperation {
    Read,
    Download,
    UpdateMetadata,
    Delete,
    ManageContributors,
}

impl FileOperation {
    pub fn required_access(self) -> FileAccess {
        match self {
            FileOperation::Read | FileOperation::Download => FileAccess::ReadOnly,
            FileOperation::UpdateMetadata => FileAccess::ReadWrite,
            FileOperation::Delete | FileOperation::ManageContributors => FileAccess::Owner,
        }
    }
}

/// Every label operation is reserved to the label's owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LabelOperation {
    Read,
    Update,
    LinkFile,
    Delete,
}

/// Resolve the strongest access `principal` holds on `file`.
///
/// Duplicate contributor entries for the same user are tolerated; the
/// highest level among them applies.
pub fn file_access(principal: UserId, file: &FileRecord) -> FileAccess {
    if file.owner == principal {
        return FileAccess::Owner;
    }

    file.contributors
        .iter()
        .filter(|c| c.user == principal)
        .map(|c| FileAccess::from(c.permission_level))
        .max()
        .unwrap_or(FileAccess::None)
}

pub fn can_read(principal: UserId, file: &FileRecord) -> bool {
    file_access(principal, file) >= FileAccess::ReadOnly
}

pub fn can_write(principal: UserId, file: &FileRecord) -> bool {
    file_access(principal, file) >= FileAccess::ReadWrite
}

pub fn is_file_allowed(principal: UserId, file: &FileRecord, op: FileOperation) -> bool {
    file_access(principal, file) >= op.required_access()
}

pub fn is_label_allowed(principal: UserId, label: &Label, _op: LabelOperation) -> bool {
    label.owner == principal
}

/// `Ok(())` if `principal` may perform `op` on `file`, `Err(PermissionDenied)` otherwise.
pub fn authorize_file(
    principal: UserId,
    file: &FileRecord,
    op: FileOperation,
) -> Result<(), AppError> {
    if is_file_allowed(principal, file, op) {
        Ok(())
    } else {
        tracing::debug!(%principal, file_id = %file.id, ?op, "file access denied");
        Err(AppError::PermissionDenied)
    }
}

pub fn authorize_label(
    principal: UserId,
    label: &Label,
    op: LabelOperation,
) -> Result<(), AppError> {
    if is_label_allowed(principal, label, op) {
        Ok(())
    } else {
        tracing::debug!(%principal, label_id = %label.id, ?op, "label access denied");
        Err(AppError::PermissionDenied)
    }
}
