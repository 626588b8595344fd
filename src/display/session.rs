/*
 *  display/session.rs
 *
 *  ht16k33-display - seg_14_x_4 model
 *  (c) 2020-26 Stuart Hunter
 *
 *  Device session - owns the bus and display handles for one resource
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

use crate::display::drivers::ht16k33::DEFAULT_ADDRESS;
use crate::display::error::DisplayError;
use crate::display::traits::{BusProvider, SegmentDisplay};

use log::{debug, info, warn};

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Ready,
    Closed,
}

/// Owns the bus and display handles.
///
/// The session is Ready only while both handles are held. It never leaves a
/// half built pair behind: a failed open releases whatever was acquired.
pub struct DeviceSession<P: BusProvider> {
    provider: P,
    bus: Option<P::Bus>,
    display: Option<P::Display>,
    current_address: u16,
    state: SessionState,
}

impl<P: BusProvider> DeviceSession<P> {
    /// A session that has not touched the hardware yet
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            bus: None,
            display: None,
            current_address: DEFAULT_ADDRESS,
            state: SessionState::Uninitialized,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == SessionState::Ready
    }

    /// Address of the display currently (or last successfully) opened
    pub fn current_address(&self) -> u16 {
        self.current_address
    }

    /// Cell count of the open display
    pub fn display_width(&self) -> Option<usize> {
        self.display.as_ref().map(|d| d.capabilities().digits)
    }

    /// The open display, if Ready
    pub fn display_mut(&mut self) -> Option<&mut P::Display> {
        match self.state {
            SessionState::Ready => self.display.as_mut(),
            _ => None,
        }
    }

    /// Open the bus, then the display at `address`, and blank it.
    pub fn initialize(&mut self, address: u16) -> Result<(), DisplayError> {
        if self.state == SessionState::Closed {
            return Err(DisplayError::NotOpen);
        }
        if self.state == SessionState::Ready {
            // never open a second pair over a live one
            self.release_handles();
            self.state = SessionState::Uninitialized;
        }

        let mut bus = self.provider.open_bus()?;

        let mut display = match self.provider.open_display(&mut bus, address) {
            Ok(display) => display,
            Err(e) => {
                self.close_bus_logged(bus);
                return Err(e);
            }
        };

        if let Err(e) = display.clear() {
            self.close_display_logged(display);
            self.close_bus_logged(bus);
            return Err(e);
        }

        self.bus = Some(bus);
        self.display = Some(display);
        self.current_address = address;
        self.state = SessionState::Ready;
        info!("Display session ready at 0x{:02X}", address);
        Ok(())
    }

    /// Rebuild the session at `new_address`.
    ///
    /// A Ready session at the same address is left untouched. Otherwise the
    /// current pair is halted and released before the new one is opened; on
    /// failure the session stays Uninitialized.
    pub fn reinitialize(&mut self, new_address: u16) -> Result<(), DisplayError> {
        match self.state {
            SessionState::Closed => return Err(DisplayError::NotOpen),
            SessionState::Ready if new_address == self.current_address => {
                debug!("Address unchanged (0x{:02X}), keeping session", new_address);
                return Ok(());
            }
            _ => {}
        }

        info!("Reinitializing display session 0x{:02X} -> 0x{:02X}", self.current_address, new_address);
        self.release_handles();
        self.state = SessionState::Uninitialized;
        self.initialize(new_address)
    }

    /// Release everything and close the session for good. Idempotent.
    pub fn teardown(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        self.release_handles();
        self.state = SessionState::Closed;
        info!("Display session closed");
    }

    // halt and drop the display, then the bus; errors are logged only
    fn release_handles(&mut self) {
        if let Some(mut display) = self.display.take() {
            if let Err(e) = display.halt() {
                debug!("Ignoring halt failure during release: {}", e);
            }
            self.close_display_logged(display);
        }
        if let Some(bus) = self.bus.take() {
            self.close_bus_logged(bus);
        }
    }

    fn close_display_logged(&mut self, display: P::Display) {
        if let Err(e) = self.provider.close_display(display) {
            warn!("Failed to release display: {}", e);
        }
    }

    fn close_bus_logged(&mut self, bus: P::Bus) {
        if let Err(e) = self.provider.close_bus(bus) {
            warn!("Failed to release I2C bus: {}", e);
        }
    }
}

impl<P: BusProvider> Drop for DeviceSession<P> {
    fn drop(&mut self) {
        if self.state != SessionState::Closed {
            debug!("DeviceSession dropped, releasing handles.");
            self.release_handles();
        }
    }
}
