/*
 *  display/drivers/linux.rs
 *
 *  ht16k33-display - seg_14_x_4 model
 *  (c) 2020-26 Stuart Hunter
 *
 *  Linux /dev/i2c-N bus provider
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

use std::sync::{Arc, Mutex};

use embedded_hal::i2c::{ErrorType, I2c, Operation};
use linux_embedded_hal::{I2CError, I2cdev};

use crate::display::drivers::ht16k33::Ht16k33;
use crate::display::error::DisplayError;
use crate::display::traits::{BusProvider, SegmentDisplay};

use log::{debug, info, warn};

/// A clone of the bus that a display holds on to.
///
/// Every transaction takes the lock so a display never outlives its
/// usefulness by holding the descriptor exclusively.
#[derive(Clone)]
pub struct SharedI2c(Arc<Mutex<I2cdev>>);

impl ErrorType for SharedI2c {
    type Error = I2CError;
}

impl I2c for SharedI2c {
    fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
        // a poisoned lock only means another writer panicked mid-transfer
        let mut dev = self.0.lock().unwrap_or_else(|e| e.into_inner());
        dev.transaction(address, operations)
    }
}

/// Opened `/dev/i2c-N`
pub struct LinuxBus {
    path: String,
    dev: SharedI2c,
}

/// Provider for the real backpack on a Linux I2C adapter
pub struct LinuxI2cProvider {
    bus_path: String,
    brightness: Option<u8>,
}

impl LinuxI2cProvider {
    /// # Arguments
    ///
    /// * `bus_path` - Path to I2C device (e.g., "/dev/i2c-1")
    /// * `brightness` - Optional brightness (0-15) applied when a display is opened
    pub fn new(bus_path: impl Into<String>, brightness: Option<u8>) -> Self {
        Self {
            bus_path: bus_path.into(),
            brightness,
        }
    }
}

impl BusProvider for LinuxI2cProvider {
    type Bus = LinuxBus;
    type Display = Ht16k33<SharedI2c>;

    fn open_bus(&mut self) -> Result<Self::Bus, DisplayError> {
        info!("Opening I2C bus {}", self.bus_path);
        let dev = I2cdev::new(&self.bus_path)
            .map_err(|e| DisplayError::BusUnavailable(format!("Failed to open {}: {}", self.bus_path, e)))?;
        Ok(LinuxBus {
            path: self.bus_path.clone(),
            dev: SharedI2c(Arc::new(Mutex::new(dev))),
        })
    }

    fn close_bus(&mut self, bus: Self::Bus) -> Result<(), DisplayError> {
        let holders = Arc::strong_count(&bus.dev.0);
        if holders > 1 {
            warn!("Closing {} while {} display handle(s) still reference it", bus.path, holders - 1);
        }
        debug!("Closing I2C bus {}", bus.path);
        drop(bus);
        Ok(())
    }

    fn open_display(&mut self, bus: &mut Self::Bus, address: u16) -> Result<Self::Display, DisplayError> {
        let mut display = Ht16k33::new(bus.dev.clone(), address)?;
        if let Some(level) = self.brightness {
            if display.capabilities().supports_brightness {
                display.set_brightness(level)?;
            } else {
                warn!("Display at 0x{:02X} has no brightness control, ignoring {}", address, level);
            }
        }
        Ok(display)
    }
}
