mod fs;

pub use fs::{sys_fs_delete, sys_fs_read, sys_fs_read_directory, sys_fs_write};

use kernel_api_types::{SYSCALL_ERR_UNKNOWN, SysCallNumber};

pub type SyscallFn = fn(u64, u64, u64, u64, u64, u64) -> u64;
static SYSCALL_TABLE: spin::Once<[Option<SyscallFn>; 256]> = spin::Once::new();

pub fn init() {
    SYSCALL_TABLE.call_once(|| {
        let mut table = [None::<SyscallFn>; 256];
        table[SysCallNumber::FsRead as usize] = Some(sys_fs_read);
        table[SysCallNumber::FsReadDirectory as usize] = Some(sys_fs_read_directory);
        table[SysCallNumber::FsWrite as usize] = Some(sys_fs_write);
        table[SysCallNumber::FsDelete as usize] = Some(sys_fs_delete);
        table
    });
}

/// Route syscall `syscall_number` (from `rdi`) to its handler with the
/// remaining argument registers. The return value goes back in `rax`.
pub fn dispatch_syscall(syscall_number: u64, args: &[u64; 6]) -> u64 {
    let handler = SYSCALL_TABLE
        .get()
        .and_then(|table| table.get(syscall_number as usize).copied().flatten());
    match handler {
        Some(f) => f(args[0], args[1], args[2], args[3], args[4], args[5]),
        None => {
            log::error!("SYSCALL: unknown syscall number {}", syscall_number);
            SYSCALL_ERR_UNKNOWN
        }
    }
}

/// Returns true if [ptr, ptr+size) is non-empty and lies within canonical
/// lower-half user bounds.
fn validate_user_ptr(ptr: u64, size: u64) -> bool {
    if ptr == 0 || size == 0 {
        return false;
    }
    let end = match ptr.checked_add(size) {
        Some(e) => e,
        None => return false,
    };
    ptr >= crate::consts::USER_MIN && end <= crate::consts::USER_MAX + 1
}
