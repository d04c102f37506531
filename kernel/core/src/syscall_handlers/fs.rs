use core::mem::size_of;

use kernel_api_types::SysCallNumber;
use kernel_api_types::fs::{FsRequest, FsResult};

use super::validate_user_ptr;
use crate::filesystem;

/// Syscall: read a file into the request's buffer.
///
/// args: request_ptr (`*const FsRequest`)
/// returns: `FsResult` as u64.
pub fn sys_fs_read(request_ptr: u64, _: u64, _: u64, _: u64, _: u64, _: u64) -> u64 {
    fs_call(SysCallNumber::FsRead, request_ptr).as_u64()
}

/// Syscall: copy a subdirectory's table cluster into the request's buffer.
pub fn sys_fs_read_directory(request_ptr: u64, _: u64, _: u64, _: u64, _: u64, _: u64) -> u64 {
    fs_call(SysCallNumber::FsReadDirectory, request_ptr).as_u64()
}

/// Syscall: create a file from the request's buffer, or a directory when
/// `buffer_size` is 0.
pub fn sys_fs_write(request_ptr: u64, _: u64, _: u64, _: u64, _: u64, _: u64) -> u64 {
    fs_call(SysCallNumber::FsWrite, request_ptr).as_u64()
}

/// Syscall: remove a file or directory entry.
pub fn sys_fs_delete(request_ptr: u64, _: u64, _: u64, _: u64, _: u64, _: u64) -> u64 {
    fs_call(SysCallNumber::FsDelete, request_ptr).as_u64()
}

fn fs_call(call: SysCallNumber, request_ptr: u64) -> FsResult {
    if !validate_user_ptr(request_ptr, size_of::<FsRequest>() as u64) {
        return FsResult::InvalidRequest;
    }
    let request = unsafe { core::ptr::read_unaligned(request_ptr as *const FsRequest) };

    let size = request.buffer_size as u64;
    let buffer: &mut [u8] = if call == SysCallNumber::FsDelete || size == 0 {
        &mut []
    } else if validate_user_ptr(request.buf, size) {
        unsafe { core::slice::from_raw_parts_mut(request.buf as *mut u8, size as usize) }
    } else {
        return FsResult::InvalidRequest;
    };

    let Some(result) = filesystem::with(|fs| fat32::syscall::handle(fs, call, &request, buffer)) else {
        return FsResult::DeviceError;
    };
    if result == FsResult::DeviceError {
        filesystem::fatal(call);
    }
    result
}
