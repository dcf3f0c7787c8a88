#![deny(missing_docs)]
//! Shared logging utilities for the slotwatch workspace.
//!
//! This crate provides the `engine_*` logging macros used across the codebase,
//! a per-thread run phase that the macros prefix onto every line, and a
//! minimal test initializer for the global logger.

use std::cell::Cell;
use std::fmt;

/// Stage of a watch run, used to tag log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunPhase {
    /// Before discovery starts or after the run has finished.
    #[default]
    Idle,
    /// Loading the listing page and extracting activity links.
    Discovery,
    /// Checking activity pages one at a time.
    Probe,
    /// Sending the consolidated alert.
    Notify,
}

impl RunPhase {
    /// Short lowercase label used in log output.
    pub fn label(self) -> &'static str {
        match self {
            RunPhase::Idle => "idle",
            RunPhase::Discovery => "discovery",
            RunPhase::Probe => "probe",
            RunPhase::Notify => "notify",
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

thread_local! {
    /// Thread-local storage for the phase of the run driven on this thread.
    static RUN_PHASE: Cell<RunPhase> = const { Cell::new(RunPhase::Idle) };
}

/// Sets the run phase for the current thread.
/// The pipeline calls this whenever it moves to the next stage.
pub fn set_phase(phase: RunPhase) {
    RUN_PHASE.with(|v| v.set(phase));
}

/// Retrieves the run phase for the current thread.
/// Returns [`RunPhase::Idle`] if no phase has been set.
pub fn current_phase() -> RunPhase {
    RUN_PHASE.with(|v| v.get())
}

/// Logs a trace-level message tagged with the current run phase.
#[macro_export]
macro_rules! engine_trace {
    ($($arg:tt)*) => {{
        log::trace!("[{}] {}", $crate::current_phase(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message tagged with the current run phase.
#[macro_export]
macro_rules! engine_info {
    ($($arg:tt)*) => {{
        log::info!("[{}] {}", $crate::current_phase(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message tagged with the current run phase.
#[macro_export]
macro_rules! engine_debug {
    ($($arg:tt)*) => {{
        log::debug!("[{}] {}", $crate::current_phase(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message tagged with the current run phase.
#[macro_export]
macro_rules! engine_warn {
    ($($arg:tt)*) => {{
        log::warn!("[{}] {}", $crate::current_phase(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message tagged with the current run phase.
#[macro_export]
macro_rules! engine_error {
    ($($arg:tt)*) => {{
        log::error!("[{}] {}", $crate::current_phase(), format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
