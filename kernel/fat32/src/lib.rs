// Host builds (`cargo test -p fat32`) get std for the test harness;
// the kernel links this crate no_std.
#![cfg_attr(not(test), no_std)]

pub mod block;
pub mod cluster;
pub mod consts;
pub mod dir;
pub mod driver;
pub mod error;
pub mod fat;
pub mod syscall;

#[cfg(test)]
pub(crate) mod testing;

pub use block::{BlockDevice, DiskError};
pub use dir::{DirectoryTable, EntryKind};
pub use driver::{DriverRequest, FilesystemDriver};
pub use error::FsError;
pub use fat::AllocationTable;
pub use kernel_api_types::fs::{DirectoryEntry, ShortName};
