use kernel_api_types::fs::FsResult;

use crate::block::DiskError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FsError {
    /// The parent cluster is not a single terminal cluster, so it cannot hold a directory table.
    InvalidParent,
    AlreadyExists,
    NotFound,
    /// File where a directory was expected, or the other way round.
    WrongType,
    BufferTooSmall,
    DirectoryFull,
    InsufficientSpace,
    /// The block device failed underneath the driver. The kernel treats this as fatal.
    Device(DiskError),
}

impl From<DiskError> for FsError {
    fn from(e: DiskError) -> Self {
        FsError::Device(e)
    }
}

impl From<FsError> for FsResult {
    fn from(e: FsError) -> Self {
        match e {
            FsError::InvalidParent     => FsResult::InvalidParent,
            FsError::AlreadyExists     => FsResult::AlreadyExists,
            FsError::NotFound          => FsResult::NotFound,
            FsError::WrongType         => FsResult::WrongType,
            FsError::BufferTooSmall    => FsResult::BufferTooSmall,
            FsError::DirectoryFull     => FsResult::DirectoryFull,
            FsError::InsufficientSpace => FsResult::InsufficientSpace,
            FsError::Device(_)         => FsResult::DeviceError,
        }
    }
}
