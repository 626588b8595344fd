/*
 *  display/error.rs
 *
 *  ht16k33-display - seg_14_x_4 model
 *  (c) 2020-26 Stuart Hunter
 *
 *  Transport level error type for the display subsystem
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use std::fmt;
use std::error::Error;

/// Error raised by the hardware boundary (bus, display controller)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayError {
    /// Bus device could not be opened
    BusUnavailable(String),

    /// Display controller did not come up
    InitializationFailed(String),

    /// I2C communication error
    I2cError(String),

    /// Address cannot be driven on this bus
    InvalidAddress(u16),

    /// Handle was already released
    NotOpen,

    /// Unsupported operation for this display
    UnsupportedOperation,

    /// Generic error with message
    Other(String),
}

impl fmt::Display for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayError::BusUnavailable(msg) =>
                write!(f, "I2C bus unavailable: {}", msg),
            DisplayError::InitializationFailed(msg) =>
                write!(f, "Display initialization failed: {}", msg),
            DisplayError::I2cError(msg) =>
                write!(f, "I2C communication error: {}", msg),
            DisplayError::InvalidAddress(addr) =>
                write!(f, "Address 0x{:X} is outside the 7-bit I2C range", addr),
            DisplayError::NotOpen =>
                write!(f, "Display handle is not open"),
            DisplayError::UnsupportedOperation =>
                write!(f, "Operation not supported by this display"),
            DisplayError::Other(msg) =>
                write!(f, "{}", msg),
        }
    }
}

impl Error for DisplayError {}

// Conversion from Linux I2C errors
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_address_message() {
        let err = DisplayError::InvalidAddress(0x1F0);
        assert_eq!(err.to_string(), "Address 0x1F0 is outside the 7-bit I2C range");
    }

    #[test]
    fn test_other_is_passthrough() {
        let err = DisplayError::Other("bus went away".to_string());
        assert_eq!(err.to_string(), "bus went away");
    }
}
