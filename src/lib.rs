/*
 *  lib.rs
 *
 *  ht16k33-display - seg_14_x_4 model
 *  (c) 2020-26 Stuart Hunter
 *
 *  HT16K33 14-segment x 4 alphanumeric display model
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

pub mod command;
pub mod config;
pub mod deutils;
pub mod display;
pub mod error;
pub mod pacer;
pub mod registry;
pub mod resource;
pub mod shutdown;
pub mod textable;

pub use command::{Command, CommandDispatcher, CommandReply};
pub use config::{Configuration, ResourceConfig};
pub use error::ResourceError;
pub use registry::{GenericResource, Model, Registry, SEG_14_X_4};
pub use resource::Seg14x4;
