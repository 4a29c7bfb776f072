#![deny(missing_docs)]
//! Shared logging utilities for the harvest workspace.
//!
//! This crate provides the `harvest_*` logging macros used across the codebase,
//! an item scope that tags log lines with the conversation being visited, and a
//! minimal test initializer for the global logger.

use std::cell::RefCell;

#[doc(hidden)]
pub use log;

thread_local! {
    /// Label of the outer item currently being visited on this thread.
    static CURRENT_ITEM: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Guard returned by [`enter_item`]. Restores the previous item label on drop.
#[must_use = "the item scope ends as soon as the guard is dropped"]
#[derive(Debug)]
pub struct ItemScope {
    previous: Option<String>,
}

impl Drop for ItemScope {
    fn drop(&mut self) {
        let previous = self.previous.take();
        CURRENT_ITEM.with(|slot| *slot.borrow_mut() = previous);
    }
}

/// Marks `label` as the item being visited on the current thread.
///
/// Every `harvest_*` macro invoked while the returned guard is alive prefixes its
/// message with `[label]`. Scopes nest; dropping a guard restores the outer label.
pub fn enter_item(label: &str) -> ItemScope {
    let previous = CURRENT_ITEM.with(|slot| slot.borrow_mut().replace(label.to_string()));
    ItemScope { previous }
}

/// Returns the label of the item currently in scope, if any.
pub fn current_item() -> Option<String> {
    CURRENT_ITEM.with(|slot| slot.borrow().clone())
}

#[doc(hidden)]
#[macro_export]
macro_rules! __harvest_log {
    ($level:ident, $($arg:tt)*) => {{
        match $crate::current_item() {
            Some(item) => $crate::log::$level!("[{}] {}", item, format_args!($($arg)*)),
            None => $crate::log::$level!($($arg)*),
        }
    }};
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! harvest_trace {
    ($($arg:tt)*) => {{
        $crate::__harvest_log!(trace, $($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! harvest_debug {
    ($($arg:tt)*) => {{
        $crate::__harvest_log!(debug, $($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! harvest_info {
    ($($arg:tt)*) => {{
        $crate::__harvest_log!(info, $($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! harvest_warn {
    ($($arg:tt)*) => {{
        $crate::__harvest_log!(warn, $($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! harvest_error {
    ($($arg:tt)*) => {{
        $crate::__harvest_log!(error, $($arg)*);
    }};
}

/// Initializes a simple terminal logger for use in unit tests.
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
