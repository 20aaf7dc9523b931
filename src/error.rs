use core::fmt;
use embedded_time::{clock, ConversionError};

/// Failure to read the time source driving the scheduler.
///
/// Task bodies are infallible, so this is the only error a pass can return.
#[derive(Debug)]
pub enum Error {
    /// The clock could not be read.
    Clock(clock::Error),

    /// The clock reading does not fit in microseconds.
    Time(ConversionError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Clock(error) => write!(f, "failed to read clock: {:?}", error),
            Error::Time(error) => write!(f, "clock reading out of range: {:?}", error),
        }
    }
}

impl From<clock::Error> for Error {
    fn from(clock_error: clock::Error) -> Self {
        Error::Clock(clock_error)
    }
}

impl From<ConversionError> for Error {
    fn from(time_error: ConversionError) -> Self {
        Error::Time(time_error)
    }
}
