//! Cortex-M glue for the `faultline` fault reporter.
//!
//! The core crate is target-agnostic; this crate supplies the pieces that
//! need a real Cortex-M under them: the exception-entry trampoline, the SCB
//! register reads, a process-wide reporter registry, and the terminal
//! behaviors of the post-fault actions.
//!
//! # Start-up sequence
//!
//! ```rust,ignore
//! use faultline::{FaultReporter, PostFaultAction, ScanBounds, DUMP_RECORD_BYTES};
//!
//! static mut DUMP_BUFFER: [u8; DUMP_RECORD_BYTES] = [0; DUMP_RECORD_BYTES];
//!
//! fn console_sink() {
//!     // SAFETY: the fault path is single-threaded and non-reentrant; the
//!     // reporter finished writing before this sink runs.
//!     let record = unsafe { &*core::ptr::addr_of!(DUMP_BUFFER) };
//!     // ... write `record` to a UART, storage, or a radio link ...
//! }
//!
//! // Early in main, before faults can occur:
//! let buffer = unsafe { &mut *core::ptr::addr_of_mut!(DUMP_BUFFER) };
//! let reporter = FaultReporter::builder(buffer, console_sink)
//!     // Linker-script symbols bracket the code region and stack top.
//!     .call_stack_bounds(ScanBounds::new(0x0000_0004, 0x0003_FFFF, 0x2002_0000, None)?)
//!     .post_fault_action(PostFaultAction::Reset)
//!     .build()?;
//! faultline_cortexm::registry::install(reporter);
//! ```
//!
//! # Vector wiring
//!
//! The `hardware` feature exports a `FaultHandler` symbol: the assembly
//! trampoline that captures r7, the active stack pointer and EXC_RETURN,
//! then tail-jumps into this crate. Start-up code must route the fault
//! vectors at it with a plain jump — never a call, so the processor's
//! exception-return bookkeeping in LR survives:
//!
//! ```text
//! HardFault_Handler:  B FaultHandler
//! MemManage_Handler:  B FaultHandler    (ARMv7-M, optional)
//! BusFault_Handler:   B FaultHandler    (ARMv7-M, optional)
//! UsageFault_Handler: B FaultHandler    (ARMv7-M, optional)
//! ```
//!
//! Only the HardFault vector is mandatory. Routing the other three
//! (ARMv7-M) preserves the exact fault class in the dumped IPSR instead of
//! showing an escalated HardFault — but each must also be enabled in
//! SHCSR (`MEMFAULTENA`, `BUSFAULTENA`, `USGFAULTENA`) during start-up, or
//! the hardware escalates to HardFault anyway.
//!
//! # Faults before installation
//!
//! A fault that fires before [`registry::install`] completes is dropped:
//! the entry returns without touching memory and the core takes whatever
//! escalation behavior the platform defines. A second fault *during*
//! reporting is out of scope by design — on Cortex-M a fault inside the
//! fault handler escalates to lockup, and this crate relies on that instead
//! of inventing a nested-fault policy.

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(unused_must_use)]
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)]
#![allow(clippy::doc_markdown)] // register names and symbol names in doc comments
#![allow(clippy::module_name_repetitions)]

pub mod registry;

#[cfg(all(feature = "hardware", target_arch = "arm"))]
pub mod hardware;

// Re-export the core surface so applications depend on one crate.
pub use faultline::{
    ConfigError, DumpRecord, FaultContext, FaultReporter, FaultReporterBuilder, PostFaultAction,
    RegisterId, ScanBounds, StackMemory, StackedFrame, SystemState, DUMP_RECORD_BYTES,
    MAX_CALL_STACK_ENTRIES, REGISTER_ROW_COUNT,
};
