//! Process-wide reporter registry.
//!
//! The exception entry has no arguments to smuggle a reporter through, so
//! the application installs it here during start-up, before faults can
//! occur. Written once, read once per fault.

use core::cell::RefCell;

use critical_section::Mutex;
use faultline::FaultReporter;

static REPORTER: Mutex<RefCell<Option<FaultReporter<'static>>>> = Mutex::new(RefCell::new(None));

/// Install `reporter` as the process-wide fault reporter, returning the
/// previously installed one, if any.
///
/// Call once from start-up code. Until this runs, faults are silently
/// dropped by the entry — a missing reporter must not turn into a second
/// fault inside an unconfigured handler.
pub fn install(reporter: FaultReporter<'static>) -> Option<FaultReporter<'static>> {
    #[cfg(feature = "defmt")]
    defmt::debug!(
        "faultline: reporter installed, post-fault action {}",
        reporter.post_fault_action()
    );
    critical_section::with(|cs| REPORTER.borrow(cs).replace(Some(reporter)))
}

/// Remove and return the installed reporter. Mainly for test harnesses that
/// rebuild the configuration between cases.
pub fn take() -> Option<FaultReporter<'static>> {
    critical_section::with(|cs| REPORTER.borrow(cs).take())
}

/// Run `f` on the installed reporter, or return `None` without running it
/// when nothing is installed.
pub fn with_reporter<R>(f: impl FnOnce(&mut FaultReporter<'static>) -> R) -> Option<R> {
    critical_section::with(|cs| REPORTER.borrow_ref_mut(cs).as_mut().map(f))
}
