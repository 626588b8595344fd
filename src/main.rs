/*
 *  main.rs
 *
 *  ht16k33-display - seg_14_x_4 model
 *  (c) 2020-26 Stuart Hunter
 *
 *  Host bootstrap - builds the configured displays and serves JSON commands on stdin
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

use anyhow::{Context, bail};
use env_logger::Env;
use log::{debug, error, info, warn};
use serde_json::{Map, Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::signal::unix::{SignalKind, signal};

use ht16k33_display::command::CommandDispatcher;
use ht16k33_display::config;
use ht16k33_display::display::drivers::{LinuxI2cProvider, MockProvider};
use ht16k33_display::pacer::Pacer;
use ht16k33_display::registry::{GenericResource, Registry, SEG_14_X_4};
use ht16k33_display::resource;
use ht16k33_display::shutdown::Shutdown;

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

/// Routing key a request may carry to pick a resource by name
const RESOURCE_KEY: &str = "resource";

/// Waits for a SIGINT, SIGTERM, or SIGHUP signal.
async fn signal_handler() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sighup = signal(SignalKind::hangup())?;

    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT received. Initiating graceful shutdown.");
        }
        _ = sigterm.recv() => {
            info!("SIGTERM received. Initiating graceful shutdown.");
        }
        _ = sighup.recv() => {
            info!("SIGHUP received. Initiating graceful shutdown.");
        }
    }
    Ok(())
}

fn error_reply(message: impl ToString) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("error".to_string(), json!(message.to_string()));
    map
}

/// Parse one request line and run it against the named (or first) resource.
///
/// A routing key is handed back in the reply so an ack still mirrors the line.
async fn serve_line(line: &str, resources: &[Arc<dyn GenericResource>]) -> Map<String, Value> {
    let mut request = match serde_json::from_str::<Value>(line) {
        Ok(Value::Object(map)) => map,
        Ok(other) => return error_reply(format!("request must be a JSON object, got {}", other)),
        Err(e) => return error_reply(format!("malformed request: {}", e)),
    };

    let routed = match request.remove(RESOURCE_KEY) {
        Some(Value::String(name)) => Some(name),
        Some(other) => return error_reply(format!("{} must be a string, got {}", RESOURCE_KEY, other)),
        None => None,
    };
    let target = match routed.as_deref() {
        Some(name) => resources.iter().find(|r| r.name() == name),
        None => resources.first(),
    };
    let Some(target) = target else {
        return error_reply("no such resource");
    };

    debug!("{} <- {:?}", target.name(), request);
    let mut reply = match target.do_command(request).await {
        Ok(reply) => reply,
        Err(e) => {
            warn!("{}: {}", target.name(), e);
            error_reply(e)
        }
    };
    if let Some(name) = routed {
        reply.insert(RESOURCE_KEY.to_string(), Value::String(name));
    }
    reply
}

/// Serve stdin until EOF.
async fn command_loop(resources: &[Arc<dyn GenericResource>]) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let reply = serve_line(line, resources).await;
        let mut out = serde_json::to_string(&reply)?;
        out.push('\n');
        stdout.write_all(out.as_bytes()).await?;
        stdout.flush().await?;
    }
    info!("stdin closed");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (cfg, cli) = config::load()?;

    if cli.dump_config {
        print!("{}", config::dump(&cfg)?);
        return Ok(());
    }

    let level = cfg.log_level.clone().unwrap_or_else(|| "info".to_string());
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();

    info!("This is {}", env!("CARGO_PKG_NAME"));
    info!("v.{} built {}", env!("CARGO_PKG_VERSION"), BUILD_DATE);

    // signals are watched from here on so intros can be cut short
    let (shutdown, mut stopping) = Shutdown::new();
    tokio::spawn(async move {
        match signal_handler().await {
            Ok(()) => shutdown.raise(),
            Err(e) => {
                error!("Signal handler failed: {}", e);
                // the sender must outlive the listeners
                std::future::pending::<()>().await;
            }
        }
    });

    let dispatcher = CommandDispatcher::new(Pacer::from_millis(cfg.frame_delay_ms()));
    let brightness = cfg.brightness;
    let mut registry = Registry::new();
    if cfg.emulated() {
        info!("Emulation mode enabled - display output is logged");
        registry.register(
            SEG_14_X_4,
            resource::constructor(
                move || MockProvider::emulated().with_brightness(brightness),
                dispatcher,
                stopping.clone(),
            ),
        )?;
    } else {
        let bus = cfg.i2c_bus().to_string();
        info!("Using I2C bus {}", bus);
        registry.register(
            SEG_14_X_4,
            resource::constructor(
                move || LinuxI2cProvider::new(bus.clone(), brightness),
                dispatcher,
                stopping.clone(),
            ),
        )?;
    }

    let mut resources: Vec<Arc<dyn GenericResource>> = Vec::new();
    for rc in cfg.resources.clone().unwrap_or_default() {
        if stopping.is_raised() {
            break;
        }
        let name = rc.name.clone();
        match registry.construct(rc).await {
            Ok(r) => {
                info!("Resource {} ready", name);
                resources.push(r);
            }
            Err(e) => error!("Resource {} failed to start: {}", name, e),
        }
    }
    if resources.is_empty() && !stopping.is_raised() {
        bail!("no display could be started");
    }

    if !stopping.is_raised() {
        tokio::select! {
            res = command_loop(&resources) => {
                if let Err(e) = res {
                    error!("Command loop failed: {:#}", e);
                }
            }
            _ = stopping.raised() => {}
        }
    }

    for r in &resources {
        if let Err(e) = r.close().await {
            warn!("Closing {} failed: {}", r.name(), e);
        }
    }
    info!("Shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ht16k33_display::config::Configuration;
    use ht16k33_display::display::drivers::mock::HalCall;
    use ht16k33_display::resource::Seg14x4;

    async fn displays(provider: &MockProvider) -> Vec<Arc<dyn GenericResource>> {
        let mut out: Vec<Arc<dyn GenericResource>> = Vec::new();
        for name in ["front", "back"] {
            let config = Configuration { address: None, skip_intro: true };
            let display = Seg14x4::new(name, config, provider.clone(), CommandDispatcher::new(Pacer::from_millis(1)))
                .await
                .unwrap();
            out.push(Arc::new(display));
        }
        provider.reset_state();
        out
    }

    #[tokio::test]
    async fn test_routed_ack_mirrors_the_line() {
        let provider = MockProvider::new();
        let resources = displays(&provider).await;

        let line = r#"{"resource": "back", "print": "HI"}"#;
        let reply = serve_line(line, &resources).await;

        assert_eq!(Value::Object(reply), serde_json::from_str::<Value>(line).unwrap());
        assert_eq!(provider.lock().written(), vec!["HI"]);
    }

    #[tokio::test]
    async fn test_unrouted_line_goes_to_first_display() {
        let provider = MockProvider::new();
        let resources = displays(&provider).await;
        resources[1].close().await.unwrap();
        provider.reset_state();

        let reply = serve_line(r#"{"clear": true}"#, &resources).await;
        assert_eq!(reply, json!({"clear": true}).as_object().cloned().unwrap());
        assert_eq!(provider.lock().calls, vec![HalCall::Clear]);
    }

    #[tokio::test]
    async fn test_bad_lines_get_error_replies() {
        let provider = MockProvider::new();
        let resources = displays(&provider).await;

        for line in ["not json", "[1, 2]", r#"{"resource": 3, "clear": true}"#] {
            assert!(serve_line(line, &resources).await.contains_key("error"), "{line}");
        }
        let reply = serve_line(r#"{"resource": "side", "clear": true}"#, &resources).await;
        assert_eq!(reply["error"], json!("no such resource"));
        assert!(provider.lock().calls.is_empty());
    }
}
