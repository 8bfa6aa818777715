//! Minimal faultline wiring for a bare Cortex-M target with no peripherals:
//! the sink does nothing, so the only observable effect of a fault is the
//! post-fault spin. Useful as a template and as a link-level smoke test.
//!
//! Build for a thumbv* target with the `hardware` feature. The fault vectors
//! must route to `FaultHandler` (see the crate docs on vector wiring).

#![no_std]
#![no_main]

use cortex_m_rt::entry;
use faultline::{FaultReporter, PostFaultAction, ScanBounds, DUMP_RECORD_BYTES};
use faultline_cortexm::registry;

static mut DUMP_BUFFER: [u8; DUMP_RECORD_BYTES] = [0; DUMP_RECORD_BYTES];

/// Nothing to send the dump to — not even a serial port. The record still
/// sits complete in `DUMP_BUFFER` for a debugger to inspect.
fn noop_sink() {}

#[entry]
fn main() -> ! {
    // SAFETY: taken exactly once, before any fault can occur.
    let buffer = unsafe { &mut *core::ptr::addr_of_mut!(DUMP_BUFFER) };

    // Generic bounds for a 256 KB flash / RAM-top-at-0x2002_0000 part;
    // real applications take these from linker-script symbols.
    let reporter = ScanBounds::new(0x0000_0004, 0x0003_FFFF, 0x2002_0000, None)
        .and_then(|bounds| {
            FaultReporter::builder(buffer, noop_sink)
                .call_stack_bounds(bounds)
                .post_fault_action(PostFaultAction::Loop)
                .build()
        });

    if let Ok(reporter) = reporter {
        registry::install(reporter);
    }

    loop {
        cortex_m::asm::wfi();
    }
}

#[panic_handler]
fn panic(_info: &core::panic::PanicInfo) -> ! {
    loop {
        cortex_m::asm::nop();
    }
}
