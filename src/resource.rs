/*
 *  resource.rs
 *
 *  ht16k33-display - seg_14_x_4 model
 *  (c) 2020-26 Stuart Hunter
 *
 *  The seg_14_x_4 resource: lifecycle, reconfiguration and commands
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

use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::command::{CommandDispatcher, CommandReply};
use crate::config::{Configuration, ResourceConfig};
use crate::display::session::{DeviceSession, SessionState};
use crate::display::traits::{BusProvider, SegmentDisplay};
use crate::error::ResourceError;
use crate::registry::{BoxFuture, Constructor, GenericResource};
use crate::shutdown::{Shutdown, ShutdownListener};

use log::{debug, info, warn};

/// Scrolled once across the display after construction
pub const INTRO_BANNER: &str = "    HT16K33    ";

struct Inner<P: BusProvider> {
    session: DeviceSession<P>,
    config: Configuration,
}

/// One HT16K33 14-segment x 4 display.
///
/// Commands, reconfiguration and close are serialized on one lock; close
/// raises the shutdown signal first so a running scroll stops at the next
/// frame boundary instead of holding the lock to the end.
pub struct Seg14x4<P: BusProvider> {
    name: String,
    inner: Mutex<Inner<P>>,
    dispatcher: CommandDispatcher,
    shutdown: Shutdown,
}

impl<P: BusProvider> Seg14x4<P> {
    /// Validate `config`, bring up the hardware and run the intro.
    pub async fn new(
        name: impl Into<String>,
        config: Configuration,
        provider: P,
        dispatcher: CommandDispatcher,
    ) -> Result<Self, ResourceError> {
        let (shutdown, intro_listener) = Shutdown::new();
        Self::assemble(name.into(), config, provider, dispatcher, shutdown, intro_listener).await
    }

    /// As `new`, but the intro stops early once `host` is raised.
    pub async fn with_shutdown(
        name: impl Into<String>,
        config: Configuration,
        provider: P,
        dispatcher: CommandDispatcher,
        host: ShutdownListener,
    ) -> Result<Self, ResourceError> {
        let (shutdown, _) = Shutdown::new();
        Self::assemble(name.into(), config, provider, dispatcher, shutdown, host).await
    }

    async fn assemble(
        name: String,
        config: Configuration,
        provider: P,
        dispatcher: CommandDispatcher,
        shutdown: Shutdown,
        mut intro_listener: ShutdownListener,
    ) -> Result<Self, ResourceError> {
        let address = config.validate()?;

        let mut session = DeviceSession::new(provider);
        session.initialize(address).map_err(ResourceError::HardwareInit)?;
        info!("{}: display ready at 0x{:02X}", name, address);

        let skip_intro = config.skip_intro;
        let resource = Self {
            name,
            inner: Mutex::new(Inner { session, config }),
            dispatcher,
            shutdown,
        };

        if !skip_intro {
            resource.intro(&mut intro_listener).await;
        }
        Ok(resource)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The configuration currently in force
    pub async fn config(&self) -> Configuration {
        self.inner.lock().await.config.clone()
    }

    pub async fn state(&self) -> SessionState {
        self.inner.lock().await.session.state()
    }

    pub async fn current_address(&self) -> u16 {
        self.inner.lock().await.session.current_address()
    }

    /// Apply a new configuration.
    ///
    /// Nothing changes if `config` does not validate. A changed address
    /// rebuilds the session; if that fails the resource is left
    /// Uninitialized and the previous configuration is kept.
    pub async fn reconfigure(&self, config: Configuration) -> Result<(), ResourceError> {
        let address = config.validate()?;
        if self.shutdown.is_raised() {
            return Err(ResourceError::Closed);
        }

        let mut inner = self.inner.lock().await;
        if inner.session.state() == SessionState::Closed {
            return Err(ResourceError::Closed);
        }
        if let Err(e) = inner.session.reinitialize(address) {
            warn!("{}: reconfigure to 0x{:02X} failed: {}", self.name, address, e);
            return Err(ResourceError::HardwareInit(e));
        }
        debug!("{}: configuration applied {:?}", self.name, config);
        inner.config = config;
        Ok(())
    }

    /// Run one command request
    pub async fn do_command(&self, request: &Map<String, Value>) -> Result<CommandReply, ResourceError> {
        if self.shutdown.is_raised() {
            return Err(ResourceError::Closed);
        }
        let mut listener = self.shutdown.subscribe();
        let mut inner = self.inner.lock().await;
        self.dispatcher.handle(request, &mut inner.session, &mut listener).await
    }

    /// Stop any command in flight and release the hardware. Idempotent.
    pub async fn close(&self) -> Result<(), ResourceError> {
        self.shutdown.raise();
        let mut inner = self.inner.lock().await;
        if inner.session.state() != SessionState::Closed {
            info!("{}: closing", self.name);
            inner.session.teardown();
        }
        Ok(())
    }

    // failures here are cosmetic; the resource is usable regardless
    async fn intro(&self, listener: &mut ShutdownListener) {
        let mut inner = self.inner.lock().await;
        let Some(display) = inner.session.display_mut() else {
            return;
        };
        if let Err(e) = self.dispatcher.print(display, INTRO_BANNER, listener).await {
            warn!("{}: intro failed: {}", self.name, e);
        }
        if let Err(e) = display.clear() {
            warn!("{}: clear after intro failed: {}", self.name, e);
        }
    }
}

impl<P: BusProvider + 'static> GenericResource for Seg14x4<P> {
    fn name(&self) -> &str {
        &self.name
    }

    fn reconfigure<'a>(&'a self, config: &'a ResourceConfig) -> BoxFuture<'a, Result<(), ResourceError>> {
        Box::pin(Seg14x4::reconfigure(self, config.attributes.clone()))
    }

    fn do_command(&self, request: Map<String, Value>) -> BoxFuture<'_, Result<Map<String, Value>, ResourceError>> {
        Box::pin(async move { Ok(Seg14x4::do_command(self, &request).await?.into_map()) })
    }

    fn close(&self) -> BoxFuture<'_, Result<(), ResourceError>> {
        Box::pin(Seg14x4::close(self))
    }
}

/// Registry constructor building a fresh provider for every resource.
///
/// Raising `host` cuts short any intro still running.
pub fn constructor<P, F>(make_provider: F, dispatcher: CommandDispatcher, host: ShutdownListener) -> Constructor
where
    P: BusProvider + 'static,
    F: Fn() -> P + Send + Sync + 'static,
{
    Box::new(move |config: ResourceConfig| -> BoxFuture<'static, Result<Arc<dyn GenericResource>, ResourceError>> {
        let provider = make_provider();
        let host = host.clone();
        Box::pin(async move {
            let resource =
                Seg14x4::with_shutdown(config.name, config.attributes, provider, dispatcher, host).await?;
            Ok(Arc::new(resource) as Arc<dyn GenericResource>)
        })
    })
}
