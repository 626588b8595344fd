/*
 *  command.rs
 *
 *  ht16k33-display - seg_14_x_4 model
 *  (c) 2020-26 Stuart Hunter
 *
 *  Command validation and dispatch against a device session
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

use serde_json::{Map, Value, json};

use crate::display::session::{DeviceSession, SessionState};
use crate::display::traits::{BusProvider, SegmentDisplay};
use crate::error::ResourceError;
use crate::pacer::Pacer;
use crate::shutdown::ShutdownListener;
use crate::textable::TextScroller;

use log::{debug, info, warn};

pub const PRINT: &str = "print";
pub const CLEAR: &str = "clear";

/// A validated command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Print(String),
    Clear,
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl Command {
    /// Pick the command out of an untyped request.
    ///
    /// Only one command runs per request. If several recognized keys are
    /// present the first one in the map's iteration order wins; callers should
    /// not rely on which. `Ok(None)` means nothing recognized.
    pub fn from_map(request: &Map<String, Value>) -> Result<Option<Command>, ResourceError> {
        if request.len() > 1 {
            warn!("Request carries {} keys; only single-command requests are supported", request.len());
        }

        for (key, value) in request {
            match key.as_str() {
                PRINT => {
                    return match value {
                        Value::String(text) => Ok(Some(Command::Print(text.clone()))),
                        other => Err(ResourceError::InvalidPayload {
                            command: PRINT.to_string(),
                            expected: "string",
                            found: type_name(other).to_string(),
                        }),
                    };
                }
                CLEAR => return Ok(Some(Command::Clear)),
                _ => continue,
            }
        }
        Ok(None)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Print(_) => PRINT,
            Command::Clear => CLEAR,
        }
    }
}

/// Non-error outcome of a dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatched {
    Ack,
    Uninitialized,
}

/// What the host gets back for a request
#[derive(Debug, Clone, PartialEq)]
pub enum CommandReply {
    /// The command ran; echoes the request
    Ack(Map<String, Value>),
    /// Hardware not ready yet
    Uninitialized,
    /// Nothing in the request was recognized
    UnknownCommand(Map<String, Value>),
}

impl CommandReply {
    pub fn into_map(self) -> Map<String, Value> {
        match self {
            CommandReply::Ack(request) => request,
            CommandReply::Uninitialized => {
                let mut map = Map::new();
                map.insert("status".to_string(), json!("uninitialized"));
                map
            }
            CommandReply::UnknownCommand(request) => {
                let mut map = Map::new();
                map.insert("error".to_string(), json!("unknown command"));
                map.insert("command".to_string(), Value::Object(request));
                map
            }
        }
    }
}

/// Routes commands to the display of a session
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandDispatcher {
    pacer: Pacer,
}

impl CommandDispatcher {
    pub fn new(pacer: Pacer) -> Self {
        Self { pacer }
    }

    /// Validate an untyped request and run it.
    ///
    /// The caller must hold the session exclusively for the whole call.
    pub async fn handle<P: BusProvider>(
        &self,
        request: &Map<String, Value>,
        session: &mut DeviceSession<P>,
        shutdown: &mut ShutdownListener,
    ) -> Result<CommandReply, ResourceError> {
        if shutdown.is_raised() {
            return Err(ResourceError::Closed);
        }
        match session.state() {
            SessionState::Closed => return Err(ResourceError::Closed),
            SessionState::Uninitialized => return Ok(CommandReply::Uninitialized),
            SessionState::Ready => {}
        }

        let Some(command) = Command::from_map(request)? else {
            info!("Ignoring unknown command {:?}", request.keys().collect::<Vec<_>>());
            return Ok(CommandReply::UnknownCommand(request.clone()));
        };

        match self.dispatch(&command, session, shutdown).await? {
            Dispatched::Ack => Ok(CommandReply::Ack(request.clone())),
            Dispatched::Uninitialized => Ok(CommandReply::Uninitialized),
        }
    }

    /// Run a validated command against the session.
    pub async fn dispatch<P: BusProvider>(
        &self,
        command: &Command,
        session: &mut DeviceSession<P>,
        shutdown: &mut ShutdownListener,
    ) -> Result<Dispatched, ResourceError> {
        if shutdown.is_raised() || session.state() == SessionState::Closed {
            return Err(ResourceError::Closed);
        }
        let Some(display) = session.display_mut() else {
            return Ok(Dispatched::Uninitialized);
        };

        debug!("Dispatching {}", command.name());
        match command {
            Command::Print(text) => self.print(display, text, shutdown).await?,
            Command::Clear => display.clear().map_err(ResourceError::Command)?,
        }
        Ok(Dispatched::Ack)
    }

    /// Scroll `text` across `display`, one frame period per window.
    ///
    /// Text that fits is written once as is. Stops between frames when the
    /// shutdown signal is raised.
    pub async fn print<D: SegmentDisplay>(
        &self,
        display: &mut D,
        text: &str,
        shutdown: &mut ShutdownListener,
    ) -> Result<(), ResourceError> {
        let scroller = TextScroller::new(display.capabilities().digits);
        let frames = scroller.frames(text);
        let total = frames.len();

        if total == 0 {
            return display.write_text(text).map_err(ResourceError::Command);
        }

        for (i, frame) in frames.enumerate() {
            if shutdown.is_raised() {
                info!("Print cancelled after {} of {} frames", i, total);
                return Err(ResourceError::Cancelled);
            }
            debug!("frame {}/{} {:?}", i + 1, total, frame);
            display.write_text(frame).map_err(ResourceError::Command)?;

            if self.pacer.hold(shutdown).await.is_err() && i + 1 < total {
                info!("Print cancelled after {} of {} frames", i + 1, total);
                return Err(ResourceError::Cancelled);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::drivers::mock::{HalCall, MockProvider};
    use crate::shutdown::Shutdown;
    use std::time::Duration;

    fn request(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn ready(provider: &MockProvider) -> DeviceSession<MockProvider> {
        let mut session = DeviceSession::new(provider.clone());
        session.initialize(0x70).unwrap();
        provider.reset_state();
        session
    }

    fn dispatcher() -> CommandDispatcher {
        CommandDispatcher::new(Pacer::new(Duration::from_millis(1)))
    }

    #[test]
    fn test_from_map_print() {
        let cmd = Command::from_map(&request(json!({"print": "HELLO"}))).unwrap();
        assert_eq!(cmd, Some(Command::Print("HELLO".into())));
    }

    #[test]
    fn test_from_map_clear_ignores_value() {
        for value in [json!(true), json!(null), json!({"x": 1})] {
            let cmd = Command::from_map(&request(json!({"clear": value}))).unwrap();
            assert_eq!(cmd, Some(Command::Clear));
        }
    }

    #[test]
    fn test_from_map_rejects_non_string_print() {
        let err = Command::from_map(&request(json!({"print": 42}))).unwrap_err();
        assert!(matches!(
            err,
            ResourceError::InvalidPayload { ref found, .. } if found == "number"
        ));
    }

    #[test]
    fn test_from_map_unknown() {
        assert_eq!(Command::from_map(&request(json!({"bogus": "x"}))).unwrap(), None);
        assert_eq!(Command::from_map(&Map::new()).unwrap(), None);
    }

    #[test]
    fn test_from_map_skips_unrecognized_keys() {
        let cmd = Command::from_map(&request(json!({"bogus": 1, "print": "AB"}))).unwrap();
        assert_eq!(cmd, Some(Command::Print("AB".into())));
    }

    #[test]
    fn test_reply_maps() {
        let req = request(json!({"bogus": "x"}));
        let unknown = CommandReply::UnknownCommand(req.clone()).into_map();
        assert_eq!(unknown["error"], json!("unknown command"));
        assert_eq!(unknown["command"], Value::Object(req.clone()));

        assert_eq!(CommandReply::Uninitialized.into_map()["status"], json!("uninitialized"));
        assert_eq!(CommandReply::Ack(req.clone()).into_map(), req);
    }

    #[tokio::test]
    async fn test_print_scrolls_frames_in_order() {
        let provider = MockProvider::new();
        let mut session = ready(&provider);
        let (_shutdown, mut listener) = Shutdown::new();

        let req = request(json!({"print": "HELLO"}));
        let reply = dispatcher().handle(&req, &mut session, &mut listener).await.unwrap();

        assert_eq!(reply, CommandReply::Ack(req));
        assert_eq!(provider.lock().written(), vec!["HELL", "ELLO"]);
    }

    #[tokio::test]
    async fn test_print_short_text_written_once() {
        let provider = MockProvider::new();
        let mut session = ready(&provider);
        let (_shutdown, mut listener) = Shutdown::new();

        dispatcher()
            .dispatch(&Command::Print("HI".into()), &mut session, &mut listener)
            .await
            .unwrap();

        assert_eq!(provider.lock().written(), vec!["HI"]);
    }

    #[tokio::test]
    async fn test_print_empty_text_written_once() {
        let provider = MockProvider::new();
        let mut session = ready(&provider);
        let (_shutdown, mut listener) = Shutdown::new();

        dispatcher()
            .dispatch(&Command::Print(String::new()), &mut session, &mut listener)
            .await
            .unwrap();

        assert_eq!(provider.lock().written(), vec![""]);
    }

    #[tokio::test]
    async fn test_clear_makes_one_call() {
        let provider = MockProvider::new();
        let mut session = ready(&provider);
        let (_shutdown, mut listener) = Shutdown::new();

        let req = request(json!({"clear": true}));
        let reply = dispatcher().handle(&req, &mut session, &mut listener).await.unwrap();

        assert_eq!(reply, CommandReply::Ack(req));
        assert_eq!(provider.lock().calls, vec![HalCall::Clear]);
    }

    #[tokio::test]
    async fn test_uninitialized_for_every_command() {
        let provider = MockProvider::new();
        let mut session = DeviceSession::new(provider.clone());
        let (_shutdown, mut listener) = Shutdown::new();

        for req in [json!({"print": "HELLO"}), json!({"clear": true}), json!({"bogus": 1}), json!({"print": 7})] {
            let reply = dispatcher().handle(&request(req), &mut session, &mut listener).await.unwrap();
            assert_eq!(reply, CommandReply::Uninitialized);
        }
        assert!(provider.lock().calls.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_command_has_no_side_effects() {
        let provider = MockProvider::new();
        let mut session = ready(&provider);
        let (_shutdown, mut listener) = Shutdown::new();

        let req = request(json!({"bogus": "x"}));
        let reply = dispatcher().handle(&req, &mut session, &mut listener).await.unwrap();

        assert_eq!(reply, CommandReply::UnknownCommand(req));
        assert!(provider.lock().calls.is_empty());
        assert!(session.is_ready());
    }

    #[tokio::test]
    async fn test_write_failure_keeps_session() {
        let provider = MockProvider::new();
        let mut session = ready(&provider);
        let (_shutdown, mut listener) = Shutdown::new();
        provider.lock().simulate_write_failure = true;

        let err = dispatcher()
            .dispatch(&Command::Print("HELLO".into()), &mut session, &mut listener)
            .await
            .unwrap_err();

        assert!(matches!(err, ResourceError::Command(_)));
        assert!(session.is_ready());
        assert_eq!(provider.lock().written(), vec!["HELL"]);
    }

    #[tokio::test]
    async fn test_closed_session_is_an_error() {
        let provider = MockProvider::new();
        let mut session = ready(&provider);
        session.teardown();
        provider.reset_state();
        let (_shutdown, mut listener) = Shutdown::new();

        let err = dispatcher()
            .handle(&request(json!({"clear": true})), &mut session, &mut listener)
            .await
            .unwrap_err();
        assert!(matches!(err, ResourceError::Closed));
        assert!(provider.lock().calls.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_print_between_frames() {
        let provider = MockProvider::new();
        let mut session = ready(&provider);
        let (shutdown, mut listener) = Shutdown::new();
        let slow = CommandDispatcher::new(Pacer::from_millis(1000));

        let raiser = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(1500)).await;
            shutdown.raise();
            shutdown
        });

        let err = slow
            .dispatch(&Command::Print("ABCDEFGHIJ".into()), &mut session, &mut listener)
            .await
            .unwrap_err();

        assert!(matches!(err, ResourceError::Cancelled));
        assert_eq!(provider.lock().written(), vec!["ABCD", "BCDE"]);
        let _ = raiser.await;
    }
}
