/*
 *  display/traits.rs
 *
 *  ht16k33-display - seg_14_x_4 model
 *  (c) 2020-26 Stuart Hunter
 *
 *  Hardware abstraction seam between the session and the bus/display drivers
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

use crate::display::error::DisplayError;

/// Display capabilities and metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayCapabilities {
    /// Number of character cells (the scroll window width)
    pub digits: usize,

    /// Whether the display supports brightness control
    pub supports_brightness: bool,
}

impl DisplayCapabilities {
    /// 4 digit 14-segment backpack
    pub const fn seg14x4() -> Self {
        Self {
            digits: 4,
            supports_brightness: true,
        }
    }
}

/// An opened character display. Every call may fail with a transport error.
pub trait SegmentDisplay: Send {
    /// Returns the capabilities of this display
    fn capabilities(&self) -> &DisplayCapabilities;

    /// Paint `text` starting at the left-most cell
    fn write_text(&mut self, text: &str) -> Result<(), DisplayError>;

    /// Blank every cell, leaving the controller running
    fn clear(&mut self) -> Result<(), DisplayError>;

    /// Blank the display and put the controller into standby
    fn halt(&mut self) -> Result<(), DisplayError>;

    /// Set display brightness (0-15)
    fn set_brightness(&mut self, _level: u8) -> Result<(), DisplayError> {
        Err(DisplayError::UnsupportedOperation)
    }
}

/// Opens and releases the bus and the display controller on it.
///
/// The session holds the returned handles and hands them back here for
/// release; a provider never keeps a handle alive on its own.
pub trait BusProvider: Send {
    /// Owned bus handle
    type Bus: Send + 'static;

    /// Display opened on a bus
    type Display: SegmentDisplay + 'static;

    /// Open the hardware bus
    fn open_bus(&mut self) -> Result<Self::Bus, DisplayError>;

    /// Release the bus. Consumes the handle whatever the outcome.
    fn close_bus(&mut self, bus: Self::Bus) -> Result<(), DisplayError>;

    /// Open the display controller at `address` on `bus`
    fn open_display(&mut self, bus: &mut Self::Bus, address: u16) -> Result<Self::Display, DisplayError>;

    /// Release a display handle. The default simply drops it.
    fn close_display(&mut self, display: Self::Display) -> Result<(), DisplayError> {
        drop(display);
        Ok(())
    }
}
