/*
 *  display/drivers/ht16k33.rs
 *
 *  ht16k33-display - seg_14_x_4 model
 *  (c) 2020-26 Stuart Hunter
 *
 *  HT16K33 14-segment alphanumeric backpack driver
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

use embedded_hal::i2c::{Error as _, I2c};

use crate::display::error::DisplayError;
use crate::display::traits::{DisplayCapabilities, SegmentDisplay};

use log::{debug, info};

/// Factory default backpack address
pub const DEFAULT_ADDRESS: u16 = 0x70;

const CMD_OSCILLATOR_OFF: u8 = 0x20;
const CMD_OSCILLATOR_ON: u8 = 0x21;
const CMD_DISPLAY_OFF: u8 = 0x80;
const CMD_DISPLAY_ON: u8 = 0x81; // blink off
const CMD_BRIGHTNESS: u8 = 0xE0;
const MAX_BRIGHTNESS: u8 = 0x0F;
const RAM_START: u8 = 0x00;

const DECIMAL_POINT: u16 = 0x4000;

// segment bits for printable ASCII 0x20..=0x7F
const FONT: [u16; 96] = [
    0x0000, 0x0006, 0x0220, 0x12CE, 0x12ED, 0x0C24, 0x235D, 0x0400, // ' ' .. '\''
    0x2400, 0x0900, 0x3FC0, 0x12C0, 0x0800, 0x00C0, 0x0000, 0x0C00, // '(' .. '/'
    0x0C3F, 0x0006, 0x00DB, 0x008F, 0x00E6, 0x2069, 0x00FD, 0x0007, // '0' .. '7'
    0x00FF, 0x00EF, 0x1200, 0x0A00, 0x2400, 0x00C8, 0x0900, 0x1083, // '8' .. '?'
    0x02BB, 0x00F7, 0x128F, 0x0039, 0x120F, 0x00F9, 0x0071, 0x00BD, // '@' .. 'G'
    0x00F6, 0x1209, 0x001E, 0x2470, 0x0038, 0x0536, 0x2136, 0x003F, // 'H' .. 'O'
    0x00F3, 0x203F, 0x20F3, 0x00ED, 0x1201, 0x003E, 0x0C30, 0x2836, // 'P' .. 'W'
    0x2D00, 0x1500, 0x0C09, 0x0039, 0x2100, 0x000F, 0x0C03, 0x0008, // 'X' .. '_'
    0x0100, 0x1058, 0x2078, 0x00D8, 0x088E, 0x0858, 0x0071, 0x048E, // '`' .. 'g'
    0x1070, 0x1000, 0x000E, 0x3600, 0x0030, 0x10D4, 0x1050, 0x00DC, // 'h' .. 'o'
    0x0170, 0x0486, 0x0050, 0x2088, 0x0078, 0x001C, 0x2004, 0x2814, // 'p' .. 'w'
    0x28C0, 0x200C, 0x0848, 0x0949, 0x1200, 0x2489, 0x0520, 0x3FFF, // 'x' .. DEL
];

/// Segment pattern for a single character; anything outside ASCII lights every segment.
fn glyph(c: char) -> u16 {
    match c as u32 {
        code @ 0x20..=0x7F => FONT[(code - 0x20) as usize],
        _ => 0x3FFF,
    }
}

/// Encode `text` into one segment word per cell.
///
/// A `.` following a character lights that cell's decimal point instead of
/// taking a cell of its own. Short text is left aligned, long text truncated.
pub fn encode(text: &str, digits: usize) -> Vec<u16> {
    let mut cells: Vec<u16> = Vec::with_capacity(digits);
    let mut previous_was_glyph = false;

    for c in text.chars() {
        if c == '.' && previous_was_glyph {
            if let Some(last) = cells.last_mut() {
                *last |= DECIMAL_POINT;
            }
            previous_was_glyph = false;
            continue;
        }
        if cells.len() == digits {
            break;
        }
        cells.push(glyph(c));
        previous_was_glyph = c != '.';
    }

    cells.resize(digits, 0);
    cells
}

/// HT16K33 display wrapper over any embedded-hal I2C bus
pub struct Ht16k33<I> {
    i2c: I,
    address: u8,
    capabilities: DisplayCapabilities,
}

impl<I: I2c + Send> Ht16k33<I> {
    /// Bring up the controller at `address`: oscillator on, display on,
    /// RAM blanked.
    pub fn new(i2c: I, address: u16) -> Result<Self, DisplayError> {
        let address = u8::try_from(address)
            .ok()
            .filter(|a| *a <= 0x7F)
            .ok_or(DisplayError::InvalidAddress(address))?;

        info!("Initializing HT16K33 at address 0x{:02X}", address);

        let mut display = Self {
            i2c,
            address,
            capabilities: DisplayCapabilities::seg14x4(),
        };

        display.command(CMD_OSCILLATOR_ON)
            .map_err(|e| DisplayError::InitializationFailed(e.to_string()))?;
        display.command(CMD_DISPLAY_ON)
            .map_err(|e| DisplayError::InitializationFailed(e.to_string()))?;
        display.command(CMD_BRIGHTNESS | MAX_BRIGHTNESS)
            .map_err(|e| DisplayError::InitializationFailed(e.to_string()))?;

        Ok(display)
    }

    /// Hand the bus back
    pub fn release(self) -> I {
        self.i2c
    }

    fn command(&mut self, cmd: u8) -> Result<(), DisplayError> {
        self.i2c.write(self.address, &[cmd])
            .map_err(|e| DisplayError::I2cError(format!("{:?}", e.kind())))
    }

    fn write_cells(&mut self, cells: &[u16]) -> Result<(), DisplayError> {
        let mut buffer = Vec::with_capacity(1 + cells.len() * 2);
        buffer.push(RAM_START);
        for cell in cells {
            buffer.extend_from_slice(&cell.to_le_bytes());
        }
        self.i2c.write(self.address, &buffer)
            .map_err(|e| DisplayError::I2cError(format!("{:?}", e.kind())))
    }
}

impl<I: I2c + Send> SegmentDisplay for Ht16k33<I> {
    fn capabilities(&self) -> &DisplayCapabilities {
        &self.capabilities
    }

    fn write_text(&mut self, text: &str) -> Result<(), DisplayError> {
        debug!("HT16K33 0x{:02X} <- {:?}", self.address, text);
        let cells = encode(text, self.capabilities.digits);
        self.write_cells(&cells)
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        let blank = vec![0u16; self.capabilities.digits];
        self.write_cells(&blank)
    }

    fn halt(&mut self) -> Result<(), DisplayError> {
        self.clear()?;
        self.command(CMD_DISPLAY_OFF)?;
        self.command(CMD_OSCILLATOR_OFF)
    }

    fn set_brightness(&mut self, level: u8) -> Result<(), DisplayError> {
        self.command(CMD_BRIGHTNESS | level.min(MAX_BRIGHTNESS))
    }
}
