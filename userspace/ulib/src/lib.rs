#![cfg_attr(not(test), no_std)]

pub mod fs;

use core::arch::asm;

/// Issue `syscall` with `rdi, rsi, rdx, r10, r8, r9, rax` taken from and
/// written back to `inputs_and_outputs`. The kernel's return value lands in
/// index 6.
pub fn syscall(inputs_and_outputs: &mut [u64; 7]) {
    unsafe {
        asm!("
            syscall
            ",
        inlateout("rdi") inputs_and_outputs[0],
        inlateout("rsi") inputs_and_outputs[1],
        inlateout("rdx") inputs_and_outputs[2],
        inlateout("r10") inputs_and_outputs[3],
        inlateout("r8") inputs_and_outputs[4],
        inlateout("r9") inputs_and_outputs[5],
        inlateout("rax") inputs_and_outputs[6],
        out("rcx") _,
        out("r11") _,
        );
    }
}
