//! Fault capture orchestration.
//!
//! [`FaultReporter`] is the write-once product of the builder: it owns the
//! laid-out [`DumpRecord`], the report sink, the optional scan bounds and
//! the post-fault action. At fault time [`FaultReporter::record_fault`]
//! fills the register holes, scans the stack, hands the record to the sink,
//! and returns the configured action for the caller to dispatch. Nothing in
//! that path allocates, formats, blocks or returns an error.

use crate::config::{ConfigError, PostFaultAction};
use crate::layout::RegisterId;
use crate::record::DumpRecord;
use crate::scan::{self, ScanBounds, StackMemory};

/// The eight hardware-auto-saved registers, in push order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StackedFrame {
    /// Auto-saved r0.
    pub r0: u32,
    /// Auto-saved r1.
    pub r1: u32,
    /// Auto-saved r2.
    pub r2: u32,
    /// Auto-saved r3.
    pub r3: u32,
    /// Auto-saved r12.
    pub r12: u32,
    /// Auto-saved LR of the faulting code.
    pub lr: u32,
    /// Auto-saved PC.
    pub pc: u32,
    /// Auto-saved xPSR.
    pub psr: u32,
}

impl StackedFrame {
    /// Build from the eight consecutive words at the frame address, in
    /// hardware push order: r0, r1, r2, r3, r12, lr, pc, psr.
    #[must_use]
    pub const fn from_words(words: [u32; 8]) -> Self {
        Self {
            r0: words[0],
            r1: words[1],
            r2: words[2],
            r3: words[3],
            r12: words[4],
            lr: words[5],
            pc: words[6],
            psr: words[7],
        }
    }
}

/// What the trampoline delivered to the fault entry.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FaultContext {
    /// r7 as captured before the handler body could touch it.
    pub frame_pointer: u32,
    /// Address of the eight auto-saved words — the active stack pointer at
    /// exception entry.
    pub frame_addr: u32,
    /// The auto-saved words read from `frame_addr`.
    pub stacked: StackedFrame,
    /// The exception-return encoding found in LR at entry.
    pub exc_return: u32,
}

/// System-control register state read inside the handler.
///
/// Fields follow the active register-set variant: the fault-status and
/// fault-address registers only exist on cores with a fault architecture.
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SystemState {
    /// Current xPSR; IPSR\[8:0\] names the active fault handler.
    pub psr: u32,
    /// SHCSR — enabled system handlers at fault time.
    pub shcsr: u32,
    /// HFSR.
    #[cfg(feature = "armv7m")]
    pub hfsr: u32,
    /// CFSR.
    #[cfg(feature = "armv7m")]
    pub cfsr: u32,
    /// MMFAR. Whether it is valid is encoded in CFSR; the dump records the
    /// raw value either way and leaves interpretation to the analyzer.
    #[cfg(feature = "armv7m")]
    pub mmfar: u32,
    /// BFAR, same validity caveat as MMFAR.
    #[cfg(feature = "armv7m")]
    pub bfar: u32,
}

/// Builder for [`FaultReporter`]. Destination buffer and report sink are the
/// mandatory pieces; scan bounds and the post-fault action are optional
/// (no scan, [`PostFaultAction::Loop`]).
pub struct FaultReporterBuilder<'a> {
    buffer: &'a mut [u8],
    sink: fn(),
    bounds: Option<ScanBounds>,
    action: PostFaultAction,
}

impl<'a> FaultReporterBuilder<'a> {
    /// Enable call-stack inference with these bounds.
    #[must_use]
    pub fn call_stack_bounds(mut self, bounds: ScanBounds) -> Self {
        self.bounds = Some(bounds);
        self
    }

    /// Choose the terminal behavior after the sink has run.
    #[must_use]
    pub fn post_fault_action(mut self, action: PostFaultAction) -> Self {
        self.action = action;
        self
    }

    /// Validate the configuration, lay out the record template and freeze
    /// everything into an immutable reporter.
    ///
    /// # Errors
    ///
    /// [`ConfigError::BufferTooSmall`] if the buffer cannot hold the record
    /// for the active register-set variant.
    pub fn build(self) -> Result<FaultReporter<'a>, ConfigError> {
        let record = DumpRecord::new(self.buffer)?;
        Ok(FaultReporter {
            record,
            sink: self.sink,
            bounds: self.bounds,
            action: self.action,
        })
    }
}

/// A fully configured fault reporter: the only object the fault path needs.
///
/// Configuration is write-once by construction — there are no setters. A
/// second fault arriving while [`record_fault`](Self::record_fault) runs is
/// out of scope: on this architecture family a fault inside the fault
/// handler escalates to lockup before re-entry could occur, and this crate
/// relies on that platform behavior rather than inventing a nested-fault
/// policy.
pub struct FaultReporter<'a> {
    record: DumpRecord<'a>,
    sink: fn(),
    bounds: Option<ScanBounds>,
    action: PostFaultAction,
}

impl<'a> FaultReporter<'a> {
    /// Start building a reporter over `buffer`, delivering completed records
    /// to `sink`.
    ///
    /// The sink takes no arguments: it reads the finished record from the
    /// buffer it shares with the reporter, and owns all fault-time I/O
    /// (console, storage, radio). It must not block indefinitely, recurse
    /// into the reporter, or do anything that could itself fault.
    pub fn builder(buffer: &'a mut [u8], sink: fn()) -> FaultReporterBuilder<'a> {
        FaultReporterBuilder {
            buffer,
            sink,
            bounds: None,
            action: PostFaultAction::default(),
        }
    }

    /// Capture one fault: overwrite every register hole, infer the call
    /// stack, hand the record to the sink, and return the action the caller
    /// must dispatch.
    ///
    /// Runs to completion without suspension and cannot fail — every input
    /// is either trusted (validated at build time) or treated as untrusted
    /// data to be bounds-checked (scanned stack words).
    pub fn record_fault<M: StackMemory>(
        &mut self,
        ctx: &FaultContext,
        sys: &SystemState,
        mem: &M,
    ) -> PostFaultAction {
        let record = &mut self.record;
        record.set_register(RegisterId::FramePointer, ctx.frame_pointer);
        record.set_register(RegisterId::StackPointer, ctx.frame_addr);
        record.set_register(RegisterId::ExceptionReturn, ctx.exc_return);
        record.set_register(RegisterId::ProgramStatus, sys.psr);
        #[cfg(feature = "armv7m")]
        {
            record.set_register(RegisterId::HardFaultStatus, sys.hfsr);
            record.set_register(RegisterId::ConfigurableFaultStatus, sys.cfsr);
            record.set_register(RegisterId::MemFaultAddress, sys.mmfar);
            record.set_register(RegisterId::BusFaultAddress, sys.bfar);
        }
        record.set_register(RegisterId::SystemHandlerControl, sys.shcsr);
        record.set_register(RegisterId::StackedR0, ctx.stacked.r0);
        record.set_register(RegisterId::StackedR1, ctx.stacked.r1);
        record.set_register(RegisterId::StackedR2, ctx.stacked.r2);
        record.set_register(RegisterId::StackedR3, ctx.stacked.r3);
        record.set_register(RegisterId::StackedR12, ctx.stacked.r12);
        record.set_register(RegisterId::StackedLr, ctx.stacked.lr);
        record.set_register(RegisterId::StackedPc, ctx.stacked.pc);
        record.set_register(RegisterId::StackedPsr, ctx.stacked.psr);

        if let Some(bounds) = &self.bounds {
            scan::scan_call_stack(mem, bounds, ctx.frame_addr, ctx.exc_return, record);
        }

        (self.sink)();
        self.action
    }

    /// The laid-out record (template state before the first fault).
    #[must_use]
    pub fn record(&self) -> &DumpRecord<'a> {
        &self.record
    }

    /// The configured post-fault action.
    #[must_use]
    pub fn post_fault_action(&self) -> PostFaultAction {
        self.action
    }
}
