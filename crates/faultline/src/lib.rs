//! Fault-time CPU state capture and reporting for Cortex-M targets.
//!
//! When an unrecoverable hardware fault fires, this crate captures the
//! processor state, renders it into a fixed-layout human-readable record
//! inside a pre-allocated buffer, heuristically reconstructs the function
//! call chain by scanning stack memory, and hands the completed record to an
//! application-supplied sink before a configured terminal action runs.
//!
//! # Architecture Layers
//!
//! ```text
//! Application start-up (allocates buffer, builds reporter, installs it)
//!         ↓
//! faultline-cortexm (trampoline, SCB reads, registry, action dispatch)
//!         ↓
//! faultline (this crate — layout, formatting, scanning; target-agnostic)
//! ```
//!
//! This crate is deliberately free of hardware access so every fault-path
//! decision is testable on the host. The Cortex-M specifics — reading the
//! SCB, the assembly trampoline, executing the terminal actions — live in
//! the `faultline-cortexm` companion crate.
//!
//! # Design constraints
//!
//! The fault path runs at exception level with no OS services, possibly on a
//! corrupted stack. Accordingly, after the reporter is built:
//!
//! - no dynamic allocation, ever — the one buffer is caller-owned;
//! - no `core::fmt` — value formatting is a fixed-offset nibble table write;
//! - no runtime error paths — anything checkable is checked at build time;
//! - all writes are in-place overwrites of pre-reserved holes.
//!
//! # Features
//!
//! - `armv7m`: register-set variant with the fault-status/address rows
//!   (CM3/CM4/CM7). Off = baseline ARMv6-M set (CM0/CM0+).
//! - `defmt`: `defmt::Format` derives on public configuration types.
//!
//! # Example
//!
//! ```
//! use faultline::{FaultReporter, PostFaultAction, ScanBounds, DUMP_RECORD_BYTES};
//!
//! fn report_sink() {
//!     // Read the completed record from the shared buffer; write it to a
//!     // console, storage, or a radio link.
//! }
//!
//! # fn main() -> Result<(), faultline::ConfigError> {
//! // On hardware this buffer is a static; the reporter only needs `&mut`.
//! let mut buffer = [0u8; DUMP_RECORD_BYTES];
//! let bounds = ScanBounds::new(0x0000_0004, 0x0004_0000, 0x2002_0000, None)?;
//! let reporter = FaultReporter::builder(&mut buffer, report_sink)
//!     .call_stack_bounds(bounds)
//!     .post_fault_action(PostFaultAction::Reset)
//!     .build()?;
//! # let _ = reporter;
//! # Ok(())
//! # }
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
// A panic inside the fault handler is itself an unrecoverable fault, so the
// panic-free rules the workspace applies everywhere are load-bearing here.
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
// Pedantic lints suppressed for this crate:
#![allow(clippy::doc_markdown)] // register names and hex addresses in doc comments
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)] // error conditions documented on the error enum

pub mod config;
pub mod layout;
pub mod record;
pub mod reporter;
pub mod scan;

// Re-export the one-stop fault-reporting surface
pub use config::{ConfigError, PostFaultAction};
pub use layout::{RegisterId, DUMP_RECORD_BYTES, MAX_CALL_STACK_ENTRIES, REGISTER_ROW_COUNT};
pub use record::DumpRecord;
pub use reporter::{FaultContext, FaultReporter, FaultReporterBuilder, StackedFrame, SystemState};
pub use scan::{ScanBounds, StackMemory, STACKED_FRAME_BYTES};
