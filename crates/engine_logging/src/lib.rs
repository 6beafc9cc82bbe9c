#![deny(missing_docs)]
//! Shared logging utilities for the scout workspace.
//!
//! This crate provides the `engine_*` logging macros used across the codebase
//! and a minimal test initializer for the global logger. Every line is stamped
//! with the engine's virtual clock so that log output lines up with scheduler
//! time instead of wall time.

use std::cell::Cell;

#[doc(hidden)]
pub use log;

thread_local! {
    /// Thread-local storage for the engine's virtual clock, in milliseconds.
    static CLOCK_MS: Cell<u64> = const { Cell::new(0) };
}

/// Sets the virtual clock for the current thread.
/// The scheduler calls this every time it advances.
pub fn set_clock_ms(now_ms: u64) {
    CLOCK_MS.with(|v| v.set(now_ms));
}

/// Retrieves the virtual clock for the current thread.
/// Returns 0 if the clock has not been set.
pub fn clock_ms() -> u64 {
    CLOCK_MS.with(|v| v.get())
}

/// Logs a trace-level message stamped with the virtual clock.
#[macro_export]
macro_rules! engine_trace {
    ($($arg:tt)*) => {{
        $crate::log::trace!("[{}ms] {}", $crate::clock_ms(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message stamped with the virtual clock.
#[macro_export]
macro_rules! engine_info {
    ($($arg:tt)*) => {{
        $crate::log::info!("[{}ms] {}", $crate::clock_ms(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message stamped with the virtual clock.
#[macro_export]
macro_rules! engine_debug {
    ($($arg:tt)*) => {{
        $crate::log::debug!("[{}ms] {}", $crate::clock_ms(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message stamped with the virtual clock.
#[macro_export]
macro_rules! engine_warn {
    ($($arg:tt)*) => {{
        $crate::log::warn!("[{}ms] {}", $crate::clock_ms(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message stamped with the virtual clock.
#[macro_export]
macro_rules! engine_error {
    ($($arg:tt)*) => {{
        $crate::log::error!("[{}ms] {}", $crate::clock_ms(), format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, ConfigBuilder, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    let config = ConfigBuilder::new()
        .set_target_level(log::LevelFilter::Error)
        .build();

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        config,
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
