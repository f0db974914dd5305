//! Logging macros
//!
//! Forward to `defmt` when the `defmt` feature is enabled and discard the
//! message otherwise, so host tests need no global logger.

#[cfg(feature = "defmt")]
macro_rules! debug {
    ($($arg:tt)*) => { ::defmt::debug!($($arg)*) };
}

#[cfg(feature = "defmt")]
macro_rules! error {
    ($($arg:tt)*) => { ::defmt::error!($($arg)*) };
}

// Stub macros when defmt is not available. Arguments are still evaluated
// so values that only feed a log line don't trip unused warnings.
#[cfg(not(feature = "defmt"))]
macro_rules! debug {
    ($($arg:tt)*) => {{
        let _ = ($($arg)*);
    }};
}

#[cfg(not(feature = "defmt"))]
macro_rules! error {
    ($($arg:tt)*) => {{
        let _ = ($($arg)*);
    }};
}

pub(crate) use {debug, error};
