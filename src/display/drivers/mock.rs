/*
 *  display/drivers/mock.rs
 *
 *  ht16k33-display - seg_14_x_4 model
 *  (c) 2020-26 Stuart Hunter
 *
 *  Mock bus provider for testing and emulated runs without hardware
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

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use crate::display::error::DisplayError;
use crate::display::traits::{BusProvider, DisplayCapabilities, SegmentDisplay};

use log::info;

/// One call across the hardware boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HalCall {
    OpenBus,
    CloseBus,
    OpenDisplay(u16),
    CloseDisplay(u16),
    WriteText(String),
    Clear,
    Halt,
    SetBrightness(u8),
}

/// Internal state for the mock provider (shared for inspection in tests)
#[derive(Debug, Default)]
pub struct MockState {
    /// Every call in the order it was made
    pub calls: Vec<HalCall>,

    /// When each `WriteText` landed
    pub write_times: Vec<Instant>,

    /// Buses currently open
    pub open_buses: usize,

    /// Displays currently open
    pub open_displays: usize,

    /// What the cells currently show
    pub shown: String,

    /// Simulate failures (for error testing)
    pub simulate_bus_failure: bool,
    pub simulate_display_failure: bool,
    pub simulate_write_failure: bool,
    pub simulate_clear_failure: bool,
    pub simulate_halt_failure: bool,
    pub simulate_close_failure: bool,
}

impl MockState {
    /// Texts handed to `write_text`, in order
    pub fn written(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                HalCall::WriteText(t) => Some(t.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of recorded calls equal to `call`
    pub fn count(&self, call: &HalCall) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }
}

/// Mock bus provider
///
/// Records every operation and lets tests inject failures. Cloning shares the
/// same recorded state, so a test keeps one clone while the session owns another.
#[derive(Debug, Clone)]
pub struct MockProvider {
    capabilities: DisplayCapabilities,
    brightness: Option<u8>,
    echo: bool,
    state: Arc<Mutex<MockState>>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    /// A 4 digit mock display
    pub fn new() -> Self {
        Self::new_with_capabilities(DisplayCapabilities::seg14x4())
    }

    /// A mock display with a specific number of cells
    pub fn new_with_digits(digits: usize) -> Self {
        Self::new_with_capabilities(DisplayCapabilities {
            digits,
            ..DisplayCapabilities::seg14x4()
        })
    }

    /// A mock display reporting `capabilities`
    pub fn new_with_capabilities(capabilities: DisplayCapabilities) -> Self {
        Self {
            capabilities,
            brightness: None,
            echo: false,
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Brightness applied to every display opened, where supported
    pub fn with_brightness(mut self, level: Option<u8>) -> Self {
        self.brightness = level;
        self
    }

    /// Emulated mode: log what the cells would show
    pub fn emulated() -> Self {
        Self { echo: true, ..Self::new() }
    }

    /// Get reference to state for inspection in tests
    pub fn state(&self) -> Arc<Mutex<MockState>> {
        Arc::clone(&self.state)
    }

    /// Lock the shared state
    pub fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Reset state counters (useful between tests)
    pub fn reset_state(&self) {
        *self.lock() = MockState::default();
    }
}

/// Handle returned by `MockProvider::open_bus`
#[derive(Debug)]
pub struct MockBus {
    _private: (),
}

/// Handle returned by `MockProvider::open_display`
#[derive(Debug)]
pub struct MockDisplay {
    address: u16,
    echo: bool,
    capabilities: DisplayCapabilities,
    state: Arc<Mutex<MockState>>,
}

impl MockDisplay {
    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl BusProvider for MockProvider {
    type Bus = MockBus;
    type Display = MockDisplay;

    fn open_bus(&mut self) -> Result<Self::Bus, DisplayError> {
        let mut state = self.lock();
        state.calls.push(HalCall::OpenBus);
        if state.simulate_bus_failure {
            return Err(DisplayError::BusUnavailable("Simulated bus failure".to_string()));
        }
        state.open_buses += 1;
        Ok(MockBus { _private: () })
    }

    fn close_bus(&mut self, _bus: Self::Bus) -> Result<(), DisplayError> {
        let mut state = self.lock();
        state.calls.push(HalCall::CloseBus);
        state.open_buses = state.open_buses.saturating_sub(1);
        if state.simulate_close_failure {
            return Err(DisplayError::Other("Simulated close failure".to_string()));
        }
        Ok(())
    }

    fn open_display(&mut self, _bus: &mut Self::Bus, address: u16) -> Result<Self::Display, DisplayError> {
        let mut state = self.lock();
        state.calls.push(HalCall::OpenDisplay(address));
        if state.simulate_display_failure {
            return Err(DisplayError::InitializationFailed("Simulated display failure".to_string()));
        }
        state.open_displays += 1;
        drop(state);

        let mut display = MockDisplay {
            address,
            echo: self.echo,
            capabilities: self.capabilities.clone(),
            state: Arc::clone(&self.state),
        };
        if let Some(level) = self.brightness {
            if display.capabilities.supports_brightness {
                display.set_brightness(level)?;
            }
        }
        Ok(display)
    }

    fn close_display(&mut self, display: Self::Display) -> Result<(), DisplayError> {
        let mut state = self.lock();
        state.calls.push(HalCall::CloseDisplay(display.address));
        state.open_displays = state.open_displays.saturating_sub(1);
        Ok(())
    }
}

impl SegmentDisplay for MockDisplay {
    fn capabilities(&self) -> &DisplayCapabilities {
        &self.capabilities
    }

    fn write_text(&mut self, text: &str) -> Result<(), DisplayError> {
        let mut state = self.lock();
        state.calls.push(HalCall::WriteText(text.to_string()));
        if state.simulate_write_failure {
            return Err(DisplayError::I2cError("Simulated write failure".to_string()));
        }
        state.write_times.push(Instant::now());
        state.shown = text.chars().take(self.capabilities.digits).collect();
        if self.echo {
            info!("[0x{:02X}] |{:<width$}|", self.address, state.shown, width = self.capabilities.digits);
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        let mut state = self.lock();
        state.calls.push(HalCall::Clear);
        if state.simulate_clear_failure {
            return Err(DisplayError::I2cError("Simulated clear failure".to_string()));
        }
        state.shown.clear();
        Ok(())
    }

    fn halt(&mut self) -> Result<(), DisplayError> {
        let mut state = self.lock();
        state.calls.push(HalCall::Halt);
        if state.simulate_halt_failure {
            return Err(DisplayError::I2cError("Simulated halt failure".to_string()));
        }
        state.shown.clear();
        Ok(())
    }

    fn set_brightness(&mut self, level: u8) -> Result<(), DisplayError> {
        if !self.capabilities.supports_brightness {
            return Err(DisplayError::UnsupportedOperation);
        }
        self.lock().calls.push(HalCall::SetBrightness(level));
        Ok(())
    }
}
