/*
 *  error.rs
 *
 *  ht16k33-display - seg_14_x_4 model
 *  (c) 2020-26 Stuart Hunter
 *
 *  Errors surfaced to the host by a resource
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

use thiserror::Error;

use crate::config::ConfigError;
use crate::display::error::DisplayError;

/// Everything construction, reconfiguration or a command can fail with.
///
/// "Unknown command" and "uninitialized" are not here: those are ordinary
/// replies, see `CommandReply`.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// Malformed configuration; nothing was applied
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// Bus or display could not be brought up
    #[error("hardware initialization failed: {0}")]
    HardwareInit(#[source] DisplayError),

    /// A write failed while running a command; the session is unchanged
    #[error("command failed: {0}")]
    Command(#[source] DisplayError),

    /// Recognized command with a payload of the wrong type
    #[error("invalid payload for {command:?}: expected {expected}, got {found}")]
    InvalidPayload {
        command: String,
        expected: &'static str,
        found: String,
    },

    /// The resource was closed
    #[error("resource is closed")]
    Closed,

    /// The command was preempted by close
    #[error("command cancelled by shutdown")]
    Cancelled,

    /// No constructor registered for the model
    #[error("unknown model {0}")]
    UnknownModel(String),

    /// A constructor is already registered for the model
    #[error("model {0} is already registered")]
    DuplicateModel(String),
}
