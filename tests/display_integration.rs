/*
 *  tests/display_integration.rs
 *
 *  ht16k33-display - seg_14_x_4 model
 *  (c) 2020-26 Stuart Hunter
 *
 *  End to end: registry, resource and mock hardware
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

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value, json};

use ht16k33_display::command::CommandDispatcher;
use ht16k33_display::config::{Configuration, ResourceConfig};
use ht16k33_display::display::drivers::mock::{HalCall, MockProvider};
use ht16k33_display::error::ResourceError;
use ht16k33_display::pacer::Pacer;
use ht16k33_display::registry::{GenericResource, Registry, SEG_14_X_4};
use ht16k33_display::resource::{self, Seg14x4};
use ht16k33_display::shutdown::Shutdown;

const FRAME: Duration = Duration::from_millis(20);

fn request(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

fn attributes() -> Configuration {
    serde_json::from_value(json!({"address": "0x70", "skip_intro": true})).unwrap()
}

#[tokio::test]
async fn test_print_clear_close_scenario() {
    let provider = MockProvider::new();
    let resource = Seg14x4::new("front", attributes(), provider.clone(), CommandDispatcher::new(Pacer::new(FRAME)))
        .await
        .unwrap();

    {
        let state = provider.lock();
        assert_eq!(state.count(&HalCall::OpenBus), 1);
        assert_eq!(state.count(&HalCall::OpenDisplay(0x70)), 1);
    }
    provider.reset_state();

    let req = request(json!({"print": "HELLO"}));
    let reply = resource.do_command(&req).await.unwrap().into_map();
    assert_eq!(reply, req);
    {
        let state = provider.lock();
        assert_eq!(state.written(), vec!["HELL", "ELLO"]);
        assert!(state.write_times[1].duration_since(state.write_times[0]) >= FRAME);
    }

    provider.reset_state();
    resource.do_command(&request(json!({"clear": true}))).await.unwrap();
    assert_eq!(provider.lock().calls, vec![HalCall::Clear]);

    resource.close().await.unwrap();
    assert_eq!(provider.lock().count(&HalCall::CloseBus), 1);

    let err = resource.do_command(&request(json!({"print": "HI"}))).await.unwrap_err();
    assert!(matches!(err, ResourceError::Closed));
}

#[tokio::test]
async fn test_registry_builds_model_and_routes_commands() {
    let provider = MockProvider::new();
    let shared = provider.clone();
    let (_shutdown, stopping) = Shutdown::new();
    let mut registry = Registry::new();
    registry
        .register(
            SEG_14_X_4,
            resource::constructor(move || shared.clone(), CommandDispatcher::new(Pacer::new(FRAME)), stopping),
        )
        .unwrap();

    let config = ResourceConfig {
        name: "front".into(),
        model: SEG_14_X_4.to_string(),
        attributes: attributes(),
    };
    let display: Arc<dyn GenericResource> = registry.construct(config.clone()).await.unwrap();
    assert_eq!(display.name(), "front");

    let reply = display.do_command(request(json!({"bogus": "x"}))).await.unwrap();
    assert_eq!(reply["error"], json!("unknown command"));
    assert_eq!(reply["command"], json!({"bogus": "x"}));

    let moved = ResourceConfig {
        attributes: serde_json::from_value(json!({"address": 113, "skip_intro": true})).unwrap(),
        ..config
    };
    display.reconfigure(&moved).await.unwrap();
    assert_eq!(provider.lock().count(&HalCall::OpenDisplay(0x71)), 1);

    display.close().await.unwrap();
    display.close().await.unwrap();
    let state = provider.lock();
    assert_eq!(state.open_buses, 0);
    assert_eq!(state.open_displays, 0);
}

#[tokio::test]
async fn test_malformed_attributes_never_reach_the_bus() {
    let provider = MockProvider::new();
    let shared = provider.clone();
    let (_shutdown, stopping) = Shutdown::new();
    let mut registry = Registry::new();
    registry
        .register(SEG_14_X_4, resource::constructor(move || shared.clone(), CommandDispatcher::default(), stopping))
        .unwrap();

    let config = ResourceConfig {
        name: "front".into(),
        model: SEG_14_X_4.to_string(),
        attributes: Configuration { address: Some("0x7G".into()), skip_intro: true },
    };
    let result = registry.construct(config).await;
    assert!(matches!(result, Err(ResourceError::Configuration(_))));
    assert!(provider.lock().calls.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_host_shutdown_reaches_intro_through_registry() {
    let provider = MockProvider::new();
    let shared = provider.clone();
    let (shutdown, stopping) = Shutdown::new();
    let mut registry = Registry::new();
    registry
        .register(
            SEG_14_X_4,
            resource::constructor(move || shared.clone(), CommandDispatcher::new(Pacer::from_millis(1000)), stopping),
        )
        .unwrap();

    shutdown.raise();
    let config = ResourceConfig {
        name: "front".into(),
        model: SEG_14_X_4.to_string(),
        attributes: Configuration { address: None, skip_intro: false },
    };
    let display = registry.construct(config).await.unwrap();

    assert!(provider.lock().written().is_empty());
    display.close().await.unwrap();
    assert_eq!(provider.lock().count(&HalCall::CloseBus), 1);
}
