//! Logging facade shared by the wasm and native builds.
//!
//! Call sites use the `log_*!` macros below. Records land in the
//! browser devtools console on wasm and in the `tracing` subscriber
//! installed by the native entry point.

/// Severity carried from the macros to the active backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

#[cfg(target_arch = "wasm32")]
pub fn write(level: Level, msg: &str) {
    use web_sys::console;
    let msg = msg.into();
    match level {
        Level::Debug => console::debug_1(&msg),
        Level::Info => console::log_1(&msg),
        Level::Warn => console::warn_1(&msg),
        Level::Error => console::error_1(&msg),
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn write(level: Level, msg: &str) {
    match level {
        Level::Debug => tracing::debug!("{}", msg),
        Level::Info => tracing::info!("{}", msg),
        Level::Warn => tracing::warn!("{}", msg),
        Level::Error => tracing::error!("{}", msg),
    }
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        $crate::logging::write($crate::logging::Level::Debug, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::logging::write($crate::logging::Level::Info, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::logging::write($crate::logging::Level::Warn, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::logging::write($crate::logging::Level::Error, &format!($($arg)*))
    };
}
