//! The dump record: a caller-owned buffer with pre-reserved value holes.
//!
//! All string layout happens once, at registration time
//! ([`DumpRecord::new`]). The fault path then only overwrites fixed-width
//! holes in place — no insertion, no growth, no `core::fmt`. Keeping a
//! general-purpose formatter out of the fault path is a load-bearing safety
//! property: formatting machinery has unverified stack depth and failure
//! modes, and a fault inside the fault handler is unrecoverable.

use crate::config::ConfigError;
use crate::layout::{
    self, RegisterId, CALL_STACK_ROW_BYTES, DUMP_RECORD_BYTES, HEX_CHARS, LABEL_BYTES,
    MAX_CALL_STACK_ENTRIES, REGISTER_ROW_BYTES,
};

/// Uppercase hex digits, indexed by nibble value.
const HEX_DIGITS: [u8; 16] = *b"0123456789ABCDEF";

/// Expand `value` into 8 uppercase hex characters, most-significant nibble
/// first, into the leading bytes of `dst`.
///
/// Deliberately a nibble-by-nibble table lookup rather than `core::fmt`:
/// constant time, no branches on the value, bounded stack.
fn write_hex_word(dst: &mut [u8], value: u32) {
    let mut v = value;
    for slot in dst.iter_mut().take(HEX_CHARS) {
        v = v.rotate_left(4);
        // The nibble is masked to 0..=15 and the table has 16 entries.
        #[allow(clippy::indexing_slicing)]
        {
            *slot = HEX_DIGITS[(v & 0xF) as usize];
        }
    }
}

/// A fault dump record laid out over a caller-owned byte buffer.
///
/// Constructed once at registration time; the same record is overwritten in
/// place on every fault. The buffer always holds a printable, NUL-terminated
/// ASCII table — before the first fault every value hole reads `00000000`.
#[derive(Debug)]
pub struct DumpRecord<'a> {
    buf: &'a mut [u8; DUMP_RECORD_BYTES],
}

impl<'a> DumpRecord<'a> {
    /// Claim the leading [`DUMP_RECORD_BYTES`] of `buf` and write the
    /// template: labels, separators, line ends, zeroed value holes and the
    /// trailing NUL.
    ///
    /// # Errors
    ///
    /// [`ConfigError::BufferTooSmall`] if `buf` cannot hold the record for
    /// the active register-set variant.
    pub fn new(buf: &'a mut [u8]) -> Result<Self, ConfigError> {
        let got = buf.len();
        let head: &mut [u8; DUMP_RECORD_BYTES] = buf
            .get_mut(..DUMP_RECORD_BYTES)
            .and_then(|head| head.try_into().ok())
            .ok_or(ConfigError::BufferTooSmall {
                got,
                need: DUMP_RECORD_BYTES,
            })?;
        let mut record = Self { buf: head };
        record.write_template();
        Ok(record)
    }

    /// Lay out the static skeleton. Value holes are zero-filled so the
    /// record is a well-formed string before any fault occurs.
    fn write_template(&mut self) {
        // Offsets are compile-time functions of the row geometry and the
        // backing store is exactly DUMP_RECORD_BYTES long.
        #[allow(clippy::indexing_slicing, clippy::arithmetic_side_effects)]
        {
            let mut cursor = 0;
            for id in RegisterId::ALL {
                self.buf[cursor..cursor + LABEL_BYTES].copy_from_slice(id.label());
                self.buf[cursor + LABEL_BYTES] = b' ';
                self.buf[cursor + REGISTER_ROW_BYTES - 1] = b'\n';
                cursor += REGISTER_ROW_BYTES;
            }
            for _ in 0..MAX_CALL_STACK_ENTRIES {
                self.buf[cursor + HEX_CHARS] = b' ';
                self.buf[cursor + CALL_STACK_ROW_BYTES - 1] = b'\n';
                cursor += CALL_STACK_ROW_BYTES;
            }
            self.buf[cursor] = 0;
        }
        for id in RegisterId::ALL {
            self.set_register(id, 0);
        }
        self.reset_call_stack_from(0);
    }

    /// Overwrite the value hole of `id` with the hex expansion of `value`.
    pub fn set_register(&mut self, id: RegisterId, value: u32) {
        let start = layout::register_value_offset(id.row());
        if let Some(hole) = self.buf.get_mut(start..).and_then(|s| s.get_mut(..HEX_CHARS)) {
            write_hex_word(hole, value);
        }
    }

    /// Record call-stack entry `index` as an (address, value) pair. Indices
    /// past [`MAX_CALL_STACK_ENTRIES`] are ignored.
    pub fn set_call_stack_entry(&mut self, index: usize, addr: u32, value: u32) {
        if index >= MAX_CALL_STACK_ENTRIES {
            return;
        }
        let start = layout::call_stack_row_offset(index);
        let Some(row) = self
            .buf
            .get_mut(start..)
            .and_then(|s| s.get_mut(..CALL_STACK_ROW_BYTES))
        else {
            return;
        };
        let (addr_hole, rest) = row.split_at_mut(HEX_CHARS);
        write_hex_word(addr_hole, addr);
        // Skip the separator byte; the row's trailing newline is untouched.
        if let Some(value_hole) = rest.get_mut(1..) {
            write_hex_word(value_hole, value);
        }
    }

    /// Re-zero call-stack rows from `index` to the end.
    ///
    /// Run after every scan so a capture that finds fewer entries than a
    /// previous one leaves no stale rows behind.
    pub fn reset_call_stack_from(&mut self, index: usize) {
        for row in index..MAX_CALL_STACK_ENTRIES {
            self.set_call_stack_entry(row, 0, 0);
        }
    }

    /// The completed record, trailing NUL included.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.buf
    }

    /// The record as text, trailing NUL excluded.
    ///
    /// The template guarantees ASCII content, so the conversion always
    /// succeeds after construction.
    #[must_use]
    pub fn as_text(&self) -> &str {
        self.buf
            .get(..DUMP_RECORD_BYTES.saturating_sub(1))
            .and_then(|bytes| core::str::from_utf8(bytes).ok())
            .unwrap_or("")
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
