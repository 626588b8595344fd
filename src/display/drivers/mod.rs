/*
 *  display/drivers/mod.rs
 *
 *  ht16k33-display - seg_14_x_4 model
 *  (c) 2020-26 Stuart Hunter
 *
 *  Display driver implementations
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

// HT16K33 controller over any embedded-hal I2C bus
pub mod ht16k33;

// Linux /dev/i2c-N backend
pub mod linux;

// Mock driver for testing and emulated mode
pub mod mock;

pub use ht16k33::{Ht16k33, DEFAULT_ADDRESS};
pub use linux::LinuxI2cProvider;
pub use mock::MockProvider;
