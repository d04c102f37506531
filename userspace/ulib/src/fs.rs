//! Filesystem calls from user mode.
//!
//! Every call passes a pointer to an [`FsRequest`] in `rsi` and gets an
//! [`FsResult`] back. Parents are named by cluster number; the root directory
//! is [`ROOT_CLUSTER_NUMBER`].

use kernel_api_types::SysCallNumber;
use kernel_api_types::fs::{
    CLUSTER_SIZE, DIR_ENTRY_SIZE, DirectoryEntry, FsRequest, FsResult, ShortName,
};

pub use kernel_api_types::fs::ROOT_CLUSTER_NUMBER;

fn fs_syscall(call: SysCallNumber, request: &FsRequest) -> FsResult {
    let mut args = [0u64; 7];
    args[0] = call as u64;
    args[1] = request as *const FsRequest as u64;
    crate::syscall(&mut args);
    FsResult::from_u64(args[6])
}

fn buffer_len(len: usize) -> Result<u32, FsResult> {
    u32::try_from(len).map_err(|_| FsResult::InvalidRequest)
}

/// Read file `name` from directory `parent` into `buf`.
///
/// `buf` must hold the file rounded up to whole clusters; see
/// [`read_buffer_size`].
pub fn fs_read(parent: u32, name: ShortName, buf: &mut [u8]) -> FsResult {
    let size = match buffer_len(buf.len()) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let request = FsRequest::new(name, parent, buf.as_mut_ptr() as u64, size);
    fs_syscall(SysCallNumber::FsRead, &request)
}

/// Copy the table of subdirectory `name` into `table`. Walk it with
/// [`DirectoryEntry::children`].
pub fn fs_read_directory(parent: u32, name: ShortName, table: &mut [u8; CLUSTER_SIZE]) -> FsResult {
    let request = FsRequest::new(name, parent, table.as_mut_ptr() as u64, CLUSTER_SIZE as u32);
    fs_syscall(SysCallNumber::FsReadDirectory, &request)
}

/// Create file `name` in `parent` holding `data`. `data` must not be empty.
pub fn fs_write(parent: u32, name: ShortName, data: &[u8]) -> FsResult {
    if data.is_empty() {
        return FsResult::InvalidRequest;
    }
    let size = match buffer_len(data.len()) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let request = FsRequest::new(name, parent, data.as_ptr() as u64, size);
    fs_syscall(SysCallNumber::FsWrite, &request)
}

/// Create an empty subdirectory `name` in `parent`.
pub fn fs_mkdir(parent: u32, name: ShortName) -> FsResult {
    let request = FsRequest::new(name, parent, 0, 0);
    fs_syscall(SysCallNumber::FsWrite, &request)
}

/// Remove `name` from `parent`. Directories are removed without their contents.
pub fn fs_delete(parent: u32, name: ShortName) -> FsResult {
    let request = FsRequest::new(name, parent, 0, 0);
    fs_syscall(SysCallNumber::FsDelete, &request)
}

/// Cluster of the directory whose table [`fs_read_directory`] returned, for
/// use as the `parent` of further calls. Slot 0 of a table describes itself.
pub fn table_cluster(table: &[u8; CLUSTER_SIZE]) -> u32 {
    let mut this = [0u8; DIR_ENTRY_SIZE];
    this.copy_from_slice(&table[..DIR_ENTRY_SIZE]);
    DirectoryEntry::from_bytes(&this).cluster()
}

/// Smallest buffer [`fs_read`] accepts for a file of `filesize` bytes.
pub const fn read_buffer_size(filesize: u32) -> usize {
    (filesize as usize).div_ceil(CLUSTER_SIZE) * CLUSTER_SIZE
}
