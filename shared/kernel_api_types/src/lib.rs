#![no_std]

#[cfg(test)]
extern crate std;

pub mod fs;

/// Syscall numbers understood by the kernel.
///
/// The filesystem calls keep the numbering the shell has always used: the
/// operation selector goes in `rdi`, a pointer to an [`fs::FsRequest`] in `rsi`.
#[repr(u64)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SysCallNumber {
    FsRead = 0,
    FsReadDirectory = 1,
    FsWrite = 2,
    FsDelete = 3,
}

/// Returned in `rax` for a syscall number the kernel has no handler for.
pub const SYSCALL_ERR_UNKNOWN: u64 = 0xFFFF_FFFF_FFFF_FFFF;
