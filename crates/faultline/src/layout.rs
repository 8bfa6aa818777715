//! Fixed geometry of the fault dump record.
//!
//! The record is a newline-delimited, NUL-terminated ASCII table: one 15-byte
//! row per CPU register, then four 18-byte call-stack rows, then the
//! terminator. Row membership and order are a **compile-time contract** —
//! any offline tool that parses a dump must be built with the same
//! register-set variant, because the variant fixes [`REGISTER_ROW_COUNT`] and
//! therefore every byte offset and [`DUMP_RECORD_BYTES`] itself.
//!
//! With the `armv7m` feature a record looks like this (17 register rows,
//! 328 bytes total):
//!
//! ```text
//! r7    2001FFF0
//! sp    2001FFD0
//! excrt FFFFFFF9
//! psr   20000003
//! hfsr  40000000
//! cfsr  00020000
//! mmfar E000ED34
//! bfar  E000ED38
//! shcsr 00000000
//! s.r0  00000002
//! s.r1  0000000A
//! s.r2  20000A3C
//! s.r3  00000000
//! s.r12 20000B38
//! s.lr  000001AF
//! s.pc  00000000
//! s.psr 40000000
//! 20000FE4 00000317
//! 20000FEC 000002ED
//! 20000FF4 000002AF
//! 20000FFC 00000127
//! ```
//!
//! The call-stack rows pair the RAM address where a pushed LR was found with
//! the LR value itself; combined with the application's map file they yield
//! the function call chain leading to the fault. Rows without a finding stay
//! at their zeroed template state.

/// Bytes in one 5-char register label (space-padded).
pub const LABEL_BYTES: usize = 5;

/// Bytes in one register row: label/5 + separator/1 + value/8 + newline/1.
pub const REGISTER_ROW_BYTES: usize = 15;

/// Byte offset of the 8-char value hole inside a register row.
pub const REGISTER_VALUE_OFFSET: usize = 6;

/// Bytes in one call-stack row: address/8 + separator/1 + value/8 + newline/1.
pub const CALL_STACK_ROW_BYTES: usize = 18;

/// Byte offset of the value hole inside a call-stack row.
pub const CALL_STACK_VALUE_OFFSET: usize = 9;

/// Maximum recorded call-stack entries. Entries beyond the findings of a scan
/// remain all-zero, so a short scan still yields a well-formed record.
pub const MAX_CALL_STACK_ENTRIES: usize = 4;

/// Hex characters in one formatted 32-bit value.
pub const HEX_CHARS: usize = 8;

/// Register rows in the active variant: 17 with the ARMv7-M fault-status
/// registers, 13 on the baseline ARMv6-M set.
pub const REGISTER_ROW_COUNT: usize = if cfg!(feature = "armv7m") { 17 } else { 13 };

// Geometry arithmetic in the constants and offset functions below is a
// compile-time function of the row counts: overflow is a build error, not a
// runtime hazard, and every offset is bounded by DUMP_RECORD_BYTES.

/// Byte offset where the call-stack rows begin.
#[allow(clippy::arithmetic_side_effects)]
pub const CALL_STACK_BASE: usize = REGISTER_ROW_COUNT * REGISTER_ROW_BYTES;

/// Total size of the dump record in bytes, including the trailing NUL.
///
/// This is the producer/consumer contract: the destination buffer handed to
/// the reporter must hold at least this many bytes, and an offline parser
/// must compute the identical value. 328 bytes with `armv7m`, 268 baseline.
#[allow(clippy::arithmetic_side_effects)]
pub const DUMP_RECORD_BYTES: usize =
    REGISTER_ROW_COUNT * REGISTER_ROW_BYTES + MAX_CALL_STACK_ENTRIES * CALL_STACK_ROW_BYTES + 1;

/// One register row of the dump, in wire order.
///
/// The discriminant is the row index. Variant-dependent rows are
/// compile-time members, not runtime optionals, so the row layout stays a
/// constant shared with offline parsers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(usize)]
pub enum RegisterId {
    /// r7, the Thumb frame pointer. The usual C prolog is `push {r7, lr}`;
    /// if a dump shows related r7 and s.pc values, stack smashing of the
    /// pushed pair is a likely fault cause.
    FramePointer,
    /// The active stack pointer at fault entry, i.e. the address of the
    /// eight hardware-auto-saved words.
    StackPointer,
    /// EXC_RETURN: the exception-return encoding left in LR at fault entry.
    /// Bit 2 records which stack pointer the faulting code was using.
    ExceptionReturn,
    /// xPSR read inside the handler; IPSR\[8:0\] names the active fault
    /// handler (always 3 = HardFault on ARMv6-M).
    ProgramStatus,
    /// HFSR — HardFault status, e.g. the FORCED escalation bit.
    #[cfg(feature = "armv7m")]
    HardFaultStatus,
    /// CFSR — combined usage/bus/memory-management fault status.
    #[cfg(feature = "armv7m")]
    ConfigurableFaultStatus,
    /// MMFAR — faulting address for a memory-management fault. Validity is
    /// gated by CFSR bits; the dump just makes the raw value available.
    #[cfg(feature = "armv7m")]
    MemFaultAddress,
    /// BFAR — faulting address for a precise bus fault. Validity is gated by
    /// CFSR bits, as with MMFAR.
    #[cfg(feature = "armv7m")]
    BusFaultAddress,
    /// SHCSR — which system handlers were enabled at fault time.
    SystemHandlerControl,
    /// Auto-saved r0.
    StackedR0,
    /// Auto-saved r1.
    StackedR1,
    /// Auto-saved r2.
    StackedR2,
    /// Auto-saved r3.
    StackedR3,
    /// Auto-saved r12.
    StackedR12,
    /// Auto-saved LR of the faulting code.
    StackedLr,
    /// Auto-saved PC: the faulting instruction (or garbage, if the PC itself
    /// was the problem).
    StackedPc,
    /// Auto-saved xPSR of the faulting code.
    StackedPsr,
}

impl RegisterId {
    /// Every row in wire order.
    #[cfg(feature = "armv7m")]
    pub const ALL: [Self; REGISTER_ROW_COUNT] = [
        Self::FramePointer,
        Self::StackPointer,
        Self::ExceptionReturn,
        Self::ProgramStatus,
        Self::HardFaultStatus,
        Self::ConfigurableFaultStatus,
        Self::MemFaultAddress,
        Self::BusFaultAddress,
        Self::SystemHandlerControl,
        Self::StackedR0,
        Self::StackedR1,
        Self::StackedR2,
        Self::StackedR3,
        Self::StackedR12,
        Self::StackedLr,
        Self::StackedPc,
        Self::StackedPsr,
    ];

    /// Every row in wire order.
    #[cfg(not(feature = "armv7m"))]
    pub const ALL: [Self; REGISTER_ROW_COUNT] = [
        Self::FramePointer,
        Self::StackPointer,
        Self::ExceptionReturn,
        Self::ProgramStatus,
        Self::SystemHandlerControl,
        Self::StackedR0,
        Self::StackedR1,
        Self::StackedR2,
        Self::StackedR3,
        Self::StackedR12,
        Self::StackedLr,
        Self::StackedPc,
        Self::StackedPsr,
    ];

    /// Row index of this register in the record.
    #[must_use]
    pub const fn row(self) -> usize {
        self as usize
    }

    /// The 5-byte space-padded label written into the row at template time.
    #[must_use]
    pub const fn label(self) -> &'static [u8; LABEL_BYTES] {
        match self {
            Self::FramePointer => b"r7   ",
            Self::StackPointer => b"sp   ",
            Self::ExceptionReturn => b"excrt",
            Self::ProgramStatus => b"psr  ",
            #[cfg(feature = "armv7m")]
            Self::HardFaultStatus => b"hfsr ",
            #[cfg(feature = "armv7m")]
            Self::ConfigurableFaultStatus => b"cfsr ",
            #[cfg(feature = "armv7m")]
            Self::MemFaultAddress => b"mmfar",
            #[cfg(feature = "armv7m")]
            Self::BusFaultAddress => b"bfar ",
            Self::SystemHandlerControl => b"shcsr",
            Self::StackedR0 => b"s.r0 ",
            Self::StackedR1 => b"s.r1 ",
            Self::StackedR2 => b"s.r2 ",
            Self::StackedR3 => b"s.r3 ",
            Self::StackedR12 => b"s.r12",
            Self::StackedLr => b"s.lr ",
            Self::StackedPc => b"s.pc ",
            Self::StackedPsr => b"s.psr",
        }
    }
}

/// Byte offset of a register row's first byte.
// `row` comes from RegisterId::row() and is < REGISTER_ROW_COUNT.
#[allow(clippy::arithmetic_side_effects)]
#[must_use]
pub const fn register_row_offset(row: usize) -> usize {
    row * REGISTER_ROW_BYTES
}

/// Byte offset of a register row's value hole.
// `row` comes from RegisterId::row() and is < REGISTER_ROW_COUNT.
#[allow(clippy::arithmetic_side_effects)]
#[must_use]
pub const fn register_value_offset(row: usize) -> usize {
    row * REGISTER_ROW_BYTES + REGISTER_VALUE_OFFSET
}

/// Byte offset of a call-stack row's first byte.
// `index` is bounds-checked against MAX_CALL_STACK_ENTRIES by every caller.
#[allow(clippy::arithmetic_side_effects)]
#[must_use]
pub const fn call_stack_row_offset(index: usize) -> usize {
    CALL_STACK_BASE + index * CALL_STACK_ROW_BYTES
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    #![allow(clippy::arithmetic_side_effects, clippy::unwrap_used, clippy::panic)]

    use super::*;

    /// The size formula must match the documented contract value.
    #[test]
    fn dump_record_bytes_matches_contract() {
        let expected = REGISTER_ROW_COUNT * REGISTER_ROW_BYTES
            + MAX_CALL_STACK_ENTRIES * CALL_STACK_ROW_BYTES
            + 1;
        assert_eq!(DUMP_RECORD_BYTES, expected);
        if cfg!(feature = "armv7m") {
            assert_eq!(DUMP_RECORD_BYTES, 328, "17 rows x 15 + 4 x 18 + 1");
        } else {
            assert_eq!(DUMP_RECORD_BYTES, 268, "13 rows x 15 + 4 x 18 + 1");
        }
    }

    /// ALL must enumerate rows in discriminant order with no gaps, so that
    /// `row()` indexes the record directly.
    #[test]
    fn all_rows_are_contiguous_and_ordered() {
        assert_eq!(RegisterId::ALL.len(), REGISTER_ROW_COUNT);
        for (index, id) in RegisterId::ALL.iter().enumerate() {
            assert_eq!(id.row(), index, "row {index} out of order: {id:?}");
        }
    }

    /// Every label is printable ASCII — the template must yield a valid
    /// string before any fault.
    #[test]
    fn labels_are_printable_ascii() {
        for id in RegisterId::ALL {
            for byte in id.label() {
                assert!(
                    byte.is_ascii_graphic() || *byte == b' ',
                    "label byte {byte:#04x} of {id:?} not printable"
                );
            }
        }
    }

    /// Row order of the wire contract: frame pointer first, stacked psr last,
    /// fault-status rows (when present) between psr and shcsr.
    #[test]
    fn wire_order_pins_first_and_last_rows() {
        assert_eq!(RegisterId::ALL.first(), Some(&RegisterId::FramePointer));
        assert_eq!(RegisterId::ALL.last(), Some(&RegisterId::StackedPsr));
        assert!(RegisterId::SystemHandlerControl.row() < RegisterId::StackedR0.row());
    }

    /// Call-stack rows start where register rows end.
    #[test]
    fn call_stack_base_follows_register_rows() {
        assert_eq!(CALL_STACK_BASE, REGISTER_ROW_COUNT * REGISTER_ROW_BYTES);
        assert_eq!(call_stack_row_offset(0), CALL_STACK_BASE);
        assert_eq!(
            call_stack_row_offset(MAX_CALL_STACK_ENTRIES),
            DUMP_RECORD_BYTES - 1,
            "terminator byte follows the last call-stack row"
        );
    }
}
