//! The hardware half: exception entry, SCB capture and terminal actions.
//!
//! Control arrives here from the `FaultHandler` trampoline with three
//! arguments the exception entry sequence would otherwise destroy: r7, the
//! active stack pointer (address of the auto-saved frame) and the
//! EXC_RETURN encoding from LR. Everything after that is ordinary Rust —
//! read the remaining state, run the installed reporter, dispatch the
//! action it returns.
//!
//! This module only exists on ARM targets with the `hardware` feature; the
//! registry and the core crate remain host-buildable for tests.

use faultline::{FaultContext, PostFaultAction, StackMemory, StackedFrame, SystemState};

use crate::registry;

/// Volatile word reads of real RAM for the call-stack scan.
///
/// The scanner bounds every address between the auto-saved frame and the
/// configured stack top before asking for it, and treats whatever comes
/// back as untrusted data.
pub struct RamMemory;

impl StackMemory for RamMemory {
    fn read_word(&self, addr: u32) -> Option<u32> {
        if !addr.is_multiple_of(4) {
            return None;
        }
        // SAFETY: addr is word-aligned and lies inside the caller-configured
        // stack region, which is plain always-mapped SRAM on this
        // architecture; a volatile read has no side effects there.
        Some(unsafe { core::ptr::read_volatile(addr as usize as *const u32) })
    }
}

/// Rust-side fault entry, reached by a tail jump from [`FaultHandler`].
///
/// Runs the full capture sequence against the installed reporter and
/// dispatches the action it returns. With no reporter installed the fault
/// is dropped silently — better no report than a second fault inside an
/// unconfigured handler. Returning from this function (the `Return` action
/// or the silent drop) completes the exception return via the LR the
/// trampoline preserved.
///
/// # Safety
///
/// `frame_addr` must point at the eight hardware-auto-saved words, i.e. the
/// value of the stack pointer that was active at exception entry, and
/// `exc_return` must be the LR value from the same entry. The trampoline
/// guarantees both.
///
/// [`FaultHandler`]: crate#vector-wiring
#[no_mangle]
pub unsafe extern "C" fn faultline_fault_entry(frame_pointer: u32, frame_addr: u32, exc_return: u32) {
    // SAFETY: per the entry contract, frame_addr points at the eight words
    // the processor pushed before vectoring here.
    let stacked = unsafe { read_stacked_frame(frame_addr) };
    let ctx = FaultContext {
        frame_pointer,
        frame_addr,
        stacked,
        exc_return,
    };
    let sys = read_system_state();

    let action = registry::with_reporter(|reporter| reporter.record_fault(&ctx, &sys, &RamMemory));
    if let Some(action) = action {
        dispatch(action);
    }
}

/// Read the eight auto-saved words from the faulting stack.
///
/// # Safety
///
/// `frame_addr` must point at a valid, aligned auto-saved frame.
unsafe fn read_stacked_frame(frame_addr: u32) -> StackedFrame {
    let base = frame_addr as usize as *const u32;
    let mut words = [0u32; 8];
    for (index, word) in words.iter_mut().enumerate() {
        // SAFETY: the eight words at frame_addr were pushed by hardware on
        // exception entry; reads are volatile in case the region aliases
        // anything the compiler believes it knows.
        *word = unsafe { core::ptr::read_volatile(base.add(index)) };
    }
    StackedFrame::from_words(words)
}

/// Read the register state that is still live inside the handler: current
/// xPSR, SHCSR, and on `armv7m` the fault-status and fault-address set.
fn read_system_state() -> SystemState {
    // SAFETY: shared reference to the SCB register block; status reads have
    // no side effects.
    let scb = unsafe { &*cortex_m::peripheral::SCB::PTR };
    SystemState {
        psr: read_xpsr(),
        shcsr: scb.shcsr.read(),
        #[cfg(feature = "armv7m")]
        hfsr: scb.hfsr.read(),
        #[cfg(feature = "armv7m")]
        cfsr: scb.cfsr.read(),
        #[cfg(feature = "armv7m")]
        mmfar: scb.mmfar.read(),
        #[cfg(feature = "armv7m")]
        bfar: scb.bfar.read(),
    }
}

/// Current xPSR. IPSR\[8:0\] names the active handler, which tells the
/// analyzer which fault class actually fired.
fn read_xpsr() -> u32 {
    let xpsr: u32;
    // SAFETY: MRS of xPSR reads processor state without side effects.
    unsafe {
        core::arch::asm!("mrs {}, XPSR", out(reg) xpsr, options(nomem, nostack, preserves_flags));
    }
    xpsr
}

/// Execute a post-fault action's terminal behavior.
///
/// `Loop` and `Reset` never return; `DebugBreak` returns after the debugger
/// resumes; `Return` returns immediately, which completes the exception
/// return in the entry's caller.
pub fn dispatch(action: PostFaultAction) {
    match action {
        PostFaultAction::Loop => loop {
            cortex_m::asm::nop();
        },
        PostFaultAction::Reset => cortex_m::peripheral::SCB::sys_reset(),
        PostFaultAction::DebugBreak => cortex_m::asm::bkpt(),
        PostFaultAction::Return => (),
    }
}

// The trampoline. Must be a plain jump chain (never a call) so LR still
// holds EXC_RETURN when Rust code runs, and must read r7 and the active
// stack pointer before any prologue could touch them. The MSP/PSP choice
// mirrors EXC_RETURN bit 2. Encoded with ARMv6-M-compatible instructions so
// the same sequence assembles on every Cortex-M.
core::arch::global_asm!(
    ".section .text.FaultHandler, \"ax\"",
    ".syntax unified",
    ".global FaultHandler",
    ".type FaultHandler, %function",
    ".thumb_func",
    "FaultHandler:",
    "    mov r0, r7",
    "    mov r2, lr",
    "    movs r3, #4",
    "    tst r2, r3",
    "    beq 1f",
    "    mrs r1, psp",
    "    b 2f",
    "1:",
    "    mrs r1, msp",
    "2:",
    "    ldr r3, ={entry}",
    "    bx r3",
    ".ltorg",
    entry = sym faultline_fault_entry,
);
