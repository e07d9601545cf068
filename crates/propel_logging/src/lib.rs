#![deny(missing_docs)]
//! Shared logging utilities for the propel workspace.
//!
//! This crate provides the `propel_*` logging macros used across the codebase,
//! a thread-local "current cycle" context that the macros prefix onto every
//! line, and a minimal test initializer for the global logger.

use std::cell::Cell;

#[doc(hidden)]
pub mod __private {
    pub use log;
}

thread_local! {
    /// Correlation id of the relay cycle being handled on this thread, if any.
    static CURRENT_CYCLE: Cell<Option<u64>> = const { Cell::new(None) };
}

/// Restores the previously active cycle when dropped.
#[must_use = "the cycle context ends when the guard is dropped"]
pub struct CycleGuard {
    previous: Option<u64>,
}

impl Drop for CycleGuard {
    fn drop(&mut self) {
        CURRENT_CYCLE.with(|v| v.set(self.previous));
    }
}

/// Marks `cycle` as the active relay cycle for this thread until the guard drops.
pub fn enter_cycle(cycle: u64) -> CycleGuard {
    let previous = CURRENT_CYCLE.with(|v| v.replace(Some(cycle)));
    CycleGuard { previous }
}

/// Returns the relay cycle active on this thread, if any.
pub fn current_cycle() -> Option<u64> {
    CURRENT_CYCLE.with(|v| v.get())
}

#[doc(hidden)]
#[macro_export]
macro_rules! __propel_log {
    ($level:ident, $($arg:tt)*) => {{
        match $crate::current_cycle() {
            Some(cycle) => $crate::__private::log::$level!(
                "[cycle {}] {}",
                cycle,
                format_args!($($arg)*)
            ),
            None => $crate::__private::log::$level!($($arg)*),
        }
    }};
}

/// Logs a trace-level message, prefixed with the active cycle.
#[macro_export]
macro_rules! propel_trace {
    ($($arg:tt)*) => { $crate::__propel_log!(trace, $($arg)*) };
}

/// Logs a debug-level message, prefixed with the active cycle.
#[macro_export]
macro_rules! propel_debug {
    ($($arg:tt)*) => { $crate::__propel_log!(debug, $($arg)*) };
}

/// Logs an info-level message, prefixed with the active cycle.
#[macro_export]
macro_rules! propel_info {
    ($($arg:tt)*) => { $crate::__propel_log!(info, $($arg)*) };
}

/// Logs a warn-level message, prefixed with the active cycle.
#[macro_export]
macro_rules! propel_warn {
    ($($arg:tt)*) => { $crate::__propel_log!(warn, $($arg)*) };
}

/// Logs an error-level message, prefixed with the active cycle.
#[macro_export]
macro_rules! propel_error {
    ($($arg:tt)*) => { $crate::__propel_log!(error, $($arg)*) };
}

/// Initializes a simple terminal logger for use in tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Another test may have installed the logger already.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

#[cfg(test)]
mod tests {
    use super::{current_cycle, enter_cycle};

    #[test]
    fn cycle_context_nests_and_restores() {
        assert_eq!(current_cycle(), None);
        {
            let _outer = enter_cycle(1);
            assert_eq!(current_cycle(), Some(1));
            {
                let _inner = enter_cycle(2);
                assert_eq!(current_cycle(), Some(2));
                propel_info!("inside nested cycle {}", 2);
            }
            assert_eq!(current_cycle(), Some(1));
        }
        assert_eq!(current_cycle(), None);
    }
}
