//! Call-stack inference by bounded stack scanning.
//!
//! A best-effort heuristic, not an unwinder: walk stack memory upward from
//! the auto-saved frame and collect words that look like pushed LR values —
//! inside the code region, Thumb bit set. False positives (data that happens
//! to look like a code address) and false negatives (call depth beyond the
//! entry limit, stacks outside the configured bounds) are accepted
//! trade-offs. Combined with the application's map file, the recovered pairs
//! give the function call chain leading to the fault.
//!
//! The scan runs over possibly-corrupted memory — that is the whole point —
//! so every access is bounds-checked before the dereference and nothing read
//! is trusted to be well-formed.

use crate::config::ConfigError;
use crate::layout::MAX_CALL_STACK_ENTRIES;
use crate::record::DumpRecord;

/// Bytes occupied by the eight hardware-auto-saved registers; the scan
/// starts one word above them.
pub const STACKED_FRAME_BYTES: u32 = 32;

/// EXC_RETURN bit 2: set when the faulting code was running on the process
/// stack rather than the main stack.
const EXC_RETURN_PSP_BIT: u32 = 0x4;

/// Read access to stack memory during a scan.
///
/// The seam between the scanner and real RAM: the Cortex-M glue implements
/// it with volatile reads, host tests substitute synthetic stack images.
pub trait StackMemory {
    /// The 32-bit word at `addr`, or `None` if the word is unreadable.
    /// Unreadable words are skipped without interrupting the scan.
    fn read_word(&self, addr: u32) -> Option<u32>;
}

/// Validated bounds for the call-stack scan.
///
/// `code_low..=code_high` brackets every address that could hold code
/// (typically linker symbols for the vector table and `__etext`). The stack
/// tops bound the upward walk; which one applies is decided per fault from
/// the EXC_RETURN encoding.
///
/// Code placed outside these bounds (RAM functions) will not be identified —
/// a known limitation inherited from the bounds themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScanBounds {
    code_low: u32,
    code_high: u32,
    main_stack_top: u32,
    process_stack_top: u32,
}

impl ScanBounds {
    /// Validate and freeze the scan bounds.
    ///
    /// `process_stack_top` is only meaningful when threads run on the
    /// process stack (an RTOS); `None` falls back to `main_stack_top`.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::CodeLowerBoundZero`] if `code_low == 0`
    /// - [`ConfigError::CodeBoundsInverted`] if `code_high < code_low`
    /// - [`ConfigError::StackTopZero`] if `main_stack_top == 0`
    pub fn new(
        code_low: u32,
        code_high: u32,
        main_stack_top: u32,
        process_stack_top: Option<u32>,
    ) -> Result<Self, ConfigError> {
        if code_low == 0 {
            return Err(ConfigError::CodeLowerBoundZero);
        }
        if code_high < code_low {
            return Err(ConfigError::CodeBoundsInverted {
                low: code_low,
                high: code_high,
            });
        }
        if main_stack_top == 0 {
            return Err(ConfigError::StackTopZero);
        }
        Ok(Self {
            code_low,
            code_high,
            main_stack_top,
            process_stack_top: process_stack_top.unwrap_or(main_stack_top),
        })
    }

    /// The scan's exclusive upper bound for this EXC_RETURN encoding.
    #[must_use]
    pub fn stack_top_for(&self, exc_return: u32) -> u32 {
        if exc_return & EXC_RETURN_PSP_BIT != 0 {
            self.process_stack_top
        } else {
            self.main_stack_top
        }
    }

    /// Whether `word` plausibly is a pushed LR: inside the code region
    /// (bounds inclusive) with the Thumb state bit set, as every valid code
    /// address on this architecture family has.
    #[must_use]
    pub fn is_plausible_return_address(&self, word: u32) -> bool {
        (self.code_low..=self.code_high).contains(&word) && (word & 1) != 0
    }
}

/// Walk stack words upward from one word above the auto-saved frame,
/// recording plausible return addresses into the record's call-stack rows in
/// increasing address order.
///
/// Stops at the stack top selected by `exc_return` or after
/// [`MAX_CALL_STACK_ENTRIES`] findings. Rows not refilled by this run are
/// re-zeroed so no stale entries from an earlier capture survive. Returns
/// the number of entries recorded.
pub(crate) fn scan_call_stack<M: StackMemory>(
    mem: &M,
    bounds: &ScanBounds,
    frame_addr: u32,
    exc_return: u32,
    record: &mut DumpRecord<'_>,
) -> usize {
    let top = bounds.stack_top_for(exc_return);
    let mut found = 0;
    let mut addr = frame_addr.saturating_add(STACKED_FRAME_BYTES);
    while addr < top && found < MAX_CALL_STACK_ENTRIES {
        if let Some(word) = mem.read_word(addr) {
            if bounds.is_plausible_return_address(word) {
                record.set_call_stack_entry(found, addr, word);
                found = found.saturating_add(1);
            }
        }
        addr = match addr.checked_add(4) {
            Some(next) => next,
            None => break,
        };
    }
    record.reset_call_stack_from(found);
    found
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::indexing_slicing,
        clippy::panic,
        clippy::arithmetic_side_effects
    )]

    use super::*;
    use crate::layout::{DUMP_RECORD_BYTES, REGISTER_ROW_COUNT};

    /// A synthetic stack image: `words[i]` lives at `base + 4*i`.
    struct SyntheticStack {
        base: u32,
        words: Vec<u32>,
    }

    impl StackMemory for SyntheticStack {
        fn read_word(&self, addr: u32) -> Option<u32> {
            if addr < self.base || !addr.is_multiple_of(4) {
                return None;
            }
            let index = ((addr - self.base) / 4) as usize;
            self.words.get(index).copied()
        }
    }

    const CODE_LOW: u32 = 0x0000_0004;
    const CODE_HIGH: u32 = 0x0004_0000;
    const FRAME: u32 = 0x2000_0F00;

    fn bounds(top: u32) -> ScanBounds {
        ScanBounds::new(CODE_LOW, CODE_HIGH, top, None).unwrap()
    }

    fn call_stack_lines(record: &DumpRecord<'_>) -> Vec<String> {
        record
            .as_text()
            .lines()
            .skip(REGISTER_ROW_COUNT)
            .map(str::to_owned)
            .collect()
    }

    #[test]
    fn bounds_reject_zero_code_low() {
        assert_eq!(
            ScanBounds::new(0, CODE_HIGH, 0x2000_2000, None),
            Err(ConfigError::CodeLowerBoundZero)
        );
    }

    #[test]
    fn bounds_reject_inverted_code_region() {
        assert_eq!(
            ScanBounds::new(0x2000, 0x1000, 0x2000_2000, None),
            Err(ConfigError::CodeBoundsInverted {
                low: 0x2000,
                high: 0x1000
            })
        );
    }

    #[test]
    fn bounds_reject_zero_stack_top() {
        assert_eq!(
            ScanBounds::new(CODE_LOW, CODE_HIGH, 0, None),
            Err(ConfigError::StackTopZero)
        );
    }

    #[test]
    fn missing_process_top_falls_back_to_main_top() {
        let b = ScanBounds::new(CODE_LOW, CODE_HIGH, 0x2000_2000, None).unwrap();
        assert_eq!(b.stack_top_for(0xFFFF_FFFD), 0x2000_2000, "PSP bit set");
        assert_eq!(b.stack_top_for(0xFFFF_FFF9), 0x2000_2000, "MSP");
    }

    #[test]
    fn exc_return_bit_selects_process_top() {
        let b = ScanBounds::new(CODE_LOW, CODE_HIGH, 0x2000_2000, Some(0x2000_1000)).unwrap();
        assert_eq!(b.stack_top_for(0xFFFF_FFF9), 0x2000_2000);
        assert_eq!(b.stack_top_for(0xFFFF_FFFD), 0x2000_1000);
    }

    #[test]
    fn plausibility_needs_code_range_and_thumb_bit() {
        let b = bounds(0x2000_2000);
        assert!(b.is_plausible_return_address(0x0000_0317));
        assert!(!b.is_plausible_return_address(0x0000_0316), "thumb bit clear");
        assert!(!b.is_plausible_return_address(0x2000_0001), "above code region");
        assert!(!b.is_plausible_return_address(0x0000_0001), "below code region");
        assert!(b.is_plausible_return_address(CODE_LOW | 1), "lower bound inclusive");
        assert!(
            b.is_plausible_return_address(CODE_HIGH - 1),
            "upper bound inclusive (odd word at the boundary)"
        );
    }

    #[test]
    fn scan_records_qualifying_words_in_address_order() {
        let mut buf = [0u8; DUMP_RECORD_BYTES];
        let mut record = DumpRecord::new(&mut buf).unwrap();
        // 8 auto-saved words, then the region the scanner examines.
        let mut words = vec![0u32; 8];
        words.extend_from_slice(&[
            0x0000_0317, // plausible
            0x2000_0A3C, // RAM address, skipped
            0x0000_02EC, // thumb bit clear, skipped
            0x0000_02AF, // plausible
        ]);
        let stack = SyntheticStack { base: FRAME, words };
        let top = FRAME + 4 * 12;
        let found = scan_call_stack(&stack, &bounds(top), FRAME, 0xFFFF_FFF9, &mut record);
        assert_eq!(found, 2);
        let lines = call_stack_lines(&record);
        assert_eq!(lines[0], "20000F20 00000317");
        assert_eq!(lines[1], "20000F2C 000002AF");
        assert_eq!(lines[2], "00000000 00000000");
        assert_eq!(lines[3], "00000000 00000000");
    }

    #[test]
    fn scan_stops_at_entry_limit() {
        let mut buf = [0u8; DUMP_RECORD_BYTES];
        let mut record = DumpRecord::new(&mut buf).unwrap();
        let mut words = vec![0u32; 8];
        words.extend_from_slice(&[0x0101; 6]); // six plausible words
        let stack = SyntheticStack { base: FRAME, words };
        let top = FRAME + 4 * 14;
        let found = scan_call_stack(&stack, &bounds(top), FRAME, 0xFFFF_FFF9, &mut record);
        assert_eq!(found, MAX_CALL_STACK_ENTRIES);
        for line in call_stack_lines(&record) {
            assert_ne!(line, "00000000 00000000");
        }
    }

    #[test]
    fn scan_never_reads_the_saved_frame_or_past_the_top() {
        let mut buf = [0u8; DUMP_RECORD_BYTES];
        let mut record = DumpRecord::new(&mut buf).unwrap();
        // Plausible words inside the auto-saved frame and above the top —
        // neither may be recorded.
        let mut words = vec![0x0000_0125u32; 8];
        words.extend_from_slice(&[
            0x2000_0000, // skipped: RAM
            0x0000_0127, // the only legitimate finding
        ]);
        words.push(0x0000_0129); // at the top boundary: excluded (exclusive)
        let stack = SyntheticStack { base: FRAME, words };
        let top = FRAME + 4 * 10;
        let found = scan_call_stack(&stack, &bounds(top), FRAME, 0xFFFF_FFF9, &mut record);
        assert_eq!(found, 1);
        assert_eq!(call_stack_lines(&record)[0], "20000F24 00000127");
    }

    #[test]
    fn unreadable_words_are_skipped_not_fatal() {
        let mut buf = [0u8; DUMP_RECORD_BYTES];
        let mut record = DumpRecord::new(&mut buf).unwrap();
        // Memory only models the frame; everything above is unreadable.
        let stack = SyntheticStack {
            base: FRAME,
            words: vec![0u32; 8],
        };
        let top = FRAME + 4 * 64;
        let found = scan_call_stack(&stack, &bounds(top), FRAME, 0xFFFF_FFF9, &mut record);
        assert_eq!(found, 0);
        for line in call_stack_lines(&record) {
            assert_eq!(line, "00000000 00000000");
        }
    }

    #[test]
    fn rescan_with_fewer_findings_rezeroes_stale_rows() {
        let mut buf = [0u8; DUMP_RECORD_BYTES];
        let mut record = DumpRecord::new(&mut buf).unwrap();
        let mut many = vec![0u32; 8];
        many.extend_from_slice(&[0x0101, 0x0103, 0x0105]);
        let top = FRAME + 4 * 11;
        let b = bounds(top);
        scan_call_stack(
            &SyntheticStack { base: FRAME, words: many },
            &b,
            FRAME,
            0xFFFF_FFF9,
            &mut record,
        );
        let mut few = vec![0u32; 8];
        few.extend_from_slice(&[0x0201, 0x2000_0000, 0x2000_0004]);
        let found = scan_call_stack(
            &SyntheticStack { base: FRAME, words: few },
            &b,
            FRAME,
            0xFFFF_FFF9,
            &mut record,
        );
        assert_eq!(found, 1);
        let lines = call_stack_lines(&record);
        assert_eq!(lines[0], "20000F20 00000201");
        assert_eq!(lines[1], "00000000 00000000", "stale row re-zeroed");
        assert_eq!(lines[2], "00000000 00000000", "stale row re-zeroed");
    }
}
