/*
 *  pacer.rs
 *
 *  ht16k33-display - seg_14_x_4 model
 *  (c) 2020-26 Stuart Hunter
 *
 *  Inter-frame pacing for scrolled text
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
use std::time::Duration;

use crate::shutdown::ShutdownListener;

pub const DEFAULT_FRAME_DELAY_MS: u64 = 150;

/// Frame pause was cut short by shutdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interrupted;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacer {
    frame: Duration,
}

impl Default for Pacer {
    fn default() -> Self {
        Self::from_millis(DEFAULT_FRAME_DELAY_MS)
    }
}

impl Pacer {
    pub fn new(frame: Duration) -> Self {
        Self { frame }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    #[inline]
    pub fn frame(&self) -> Duration {
        self.frame
    }

    /// Hold the current frame for one frame period, or until shutdown.
    pub async fn hold(&self, shutdown: &mut ShutdownListener) -> Result<(), Interrupted> {
        if shutdown.is_raised() {
            return Err(Interrupted);
        }
        tokio::select! {
            _ = tokio::time::sleep(self.frame) => Ok(()),
            _ = shutdown.raised() => Err(Interrupted),
        }
    }
}
