//! Write-once configuration: post-fault actions and registration-time errors.
//!
//! Everything that can be validated is validated here, at application
//! start-up, so the fault path stays free of checks whose failure mode would
//! itself need fault handling. A configuration that builds is a
//! configuration the fault path can trust blindly.

use thiserror_no_std::Error;

/// What to do after the completed record has been handed to the report sink.
///
/// Exactly four terminal behaviors exist; the enum makes an unrecognized
/// action unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PostFaultAction {
    /// Spin forever. Used when a human, watchdog or external watcher must
    /// intervene. The default.
    #[default]
    Loop,
    /// Trigger a full system reset.
    Reset,
    /// Trigger a software breakpoint trap — attached-debugger workflows.
    DebugBreak,
    /// Return to the trampoline's caller, completing the exception return.
    /// Only sane when the surrounding system has independently decided the
    /// fault is survivable (e.g. test harnesses).
    Return,
}

/// A configuration rejected at registration time.
///
/// None of these can occur at fault time: a reporter that was built is
/// correct by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The destination buffer cannot hold the record for the active
    /// register-set variant.
    #[error("dump buffer holds {got} bytes, the record needs {need}")]
    BufferTooSmall {
        /// Bytes the caller supplied.
        got: usize,
        /// Bytes the active variant requires.
        need: usize,
    },
    /// The code-region lower bound was zero. Address zero holds the vector
    /// table, not code; a zero lower bound would accept spurious words.
    #[error("code region lower bound must be nonzero")]
    CodeLowerBoundZero,
    /// The code-region bounds are inverted.
    #[error("code region upper bound {high:#010x} below lower bound {low:#010x}")]
    CodeBoundsInverted {
        /// Configured lower bound.
        low: u32,
        /// Configured upper bound.
        high: u32,
    },
    /// The main-stack top was zero; no scan could ever run below it.
    #[error("main stack top must be nonzero")]
    StackTopZero,
}

// ─── Tests ───────────────────────────────────────────────────────────────────
