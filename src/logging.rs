//! Logging macros
//!
//! The scheduler runs inside the firmware main loop, so logging must cost
//! nothing unless asked for:
//! - `defmt` feature on target: forwards to `defmt`
//! - host tests: prints to stdout, with or without `defmt`
//! - otherwise: compiled out

#[doc(hidden)]
#[macro_export]
macro_rules! log_trace {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {{
        #[cfg(all(feature = "defmt", not(test)))]
        ::defmt::trace!($fmt $(, $arg)*);

        #[cfg(test)]
        println!(concat!("[TRACE] ", $fmt) $(, $arg)*);

        #[cfg(all(not(feature = "defmt"), not(test)))]
        {
            $(let _ = &$arg;)*
        }
    }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! log_debug {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {{
        #[cfg(all(feature = "defmt", not(test)))]
        ::defmt::debug!($fmt $(, $arg)*);

        #[cfg(test)]
        println!(concat!("[DEBUG] ", $fmt) $(, $arg)*);

        #[cfg(all(not(feature = "defmt"), not(test)))]
        {
            $(let _ = &$arg;)*
        }
    }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! log_info {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {{
        #[cfg(all(feature = "defmt", not(test)))]
        ::defmt::info!($fmt $(, $arg)*);

        #[cfg(test)]
        println!(concat!("[INFO] ", $fmt) $(, $arg)*);

        #[cfg(all(not(feature = "defmt"), not(test)))]
        {
            $(let _ = &$arg;)*
        }
    }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! log_warn {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {{
        #[cfg(all(feature = "defmt", not(test)))]
        ::defmt::warn!($fmt $(, $arg)*);

        #[cfg(test)]
        println!(concat!("[WARN] ", $fmt) $(, $arg)*);

        #[cfg(all(not(feature = "defmt"), not(test)))]
        {
            $(let _ = &$arg;)*
        }
    }};
}
