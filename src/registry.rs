/*
 *  registry.rs
 *
 *  ht16k33-display - seg_14_x_4 model
 *  (c) 2020-26 Stuart Hunter
 *
 *  Model registry - the host bootstrap registers constructors explicitly
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

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::config::ResourceConfig;
use crate::error::ResourceError;

use log::info;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// `namespace:family:name` triple identifying a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Model {
    pub namespace: &'static str,
    pub family: &'static str,
    pub name: &'static str,
}

impl Model {
    pub const fn new(namespace: &'static str, family: &'static str, name: &'static str) -> Self {
        Self { namespace, family, name }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.namespace, self.family, self.name)
    }
}

/// The 14-segment x 4 alphanumeric backpack
pub const SEG_14_X_4: Model = Model::new("1c614556-2ff9-4234-9a94-d59b0a6d3378", "ht16k33-display", "seg_14_x_4");

/// What the host can do with a constructed resource
pub trait GenericResource: Send + Sync {
    fn name(&self) -> &str;

    /// Apply a new configuration
    fn reconfigure<'a>(&'a self, config: &'a ResourceConfig) -> BoxFuture<'a, Result<(), ResourceError>>;

    /// Run one command; replies are plain maps
    fn do_command(&self, request: Map<String, Value>) -> BoxFuture<'_, Result<Map<String, Value>, ResourceError>>;

    /// Release the hardware. Safe to call more than once.
    fn close(&self) -> BoxFuture<'_, Result<(), ResourceError>>;
}

pub type Constructor =
    Box<dyn Fn(ResourceConfig) -> BoxFuture<'static, Result<Arc<dyn GenericResource>, ResourceError>> + Send + Sync>;

/// Constructors keyed by model
#[derive(Default)]
pub struct Registry {
    constructors: HashMap<String, Constructor>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, model: Model, constructor: Constructor) -> Result<(), ResourceError> {
        let key = model.to_string();
        if self.constructors.contains_key(&key) {
            return Err(ResourceError::DuplicateModel(key));
        }
        info!("Registered model {}", key);
        self.constructors.insert(key, constructor);
        Ok(())
    }

    pub fn is_registered(&self, model: &str) -> bool {
        self.constructors.contains_key(model)
    }

    /// Build the resource `config` describes
    pub async fn construct(&self, config: ResourceConfig) -> Result<Arc<dyn GenericResource>, ResourceError> {
        let constructor = self
            .constructors
            .get(&config.model)
            .ok_or_else(|| ResourceError::UnknownModel(config.model.clone()))?;
        constructor(config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Nothing(String);

    impl GenericResource for Nothing {
        fn name(&self) -> &str {
            &self.0
        }
        fn reconfigure<'a>(&'a self, _config: &'a ResourceConfig) -> BoxFuture<'a, Result<(), ResourceError>> {
            Box::pin(async { Ok(()) })
        }
        fn do_command(&self, request: Map<String, Value>) -> BoxFuture<'_, Result<Map<String, Value>, ResourceError>> {
            Box::pin(async move { Ok(request) })
        }
        fn close(&self) -> BoxFuture<'_, Result<(), ResourceError>> {
            Box::pin(async { Ok(()) })
        }
    }

    fn nothing() -> Constructor {
        Box::new(|config: ResourceConfig| -> BoxFuture<'static, Result<Arc<dyn GenericResource>, ResourceError>> {
            Box::pin(async move { Ok(Arc::new(Nothing(config.name)) as Arc<dyn GenericResource>) })
        })
    }

    fn config(model: &str) -> ResourceConfig {
        ResourceConfig {
            name: "front".into(),
            model: model.into(),
            attributes: Default::default(),
        }
    }

    #[test]
    fn test_model_triple() {
        assert_eq!(
            SEG_14_X_4.to_string(),
            "1c614556-2ff9-4234-9a94-d59b0a6d3378:ht16k33-display:seg_14_x_4"
        );
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = Registry::new();
        registry.register(SEG_14_X_4, nothing()).unwrap();
        assert!(matches!(
            registry.register(SEG_14_X_4, nothing()),
            Err(ResourceError::DuplicateModel(_))
        ));
    }

    #[tokio::test]
    async fn test_construct_dispatches_on_model() {
        let mut registry = Registry::new();
        registry.register(SEG_14_X_4, nothing()).unwrap();
        assert!(registry.is_registered(&SEG_14_X_4.to_string()));

        let resource = registry.construct(config(&SEG_14_X_4.to_string())).await.unwrap();
        assert_eq!(resource.name(), "front");
    }

    #[tokio::test]
    async fn test_construct_unknown_model() {
        let registry = Registry::new();
        let result = registry.construct(config("acme:clock:big")).await;
        assert!(matches!(result, Err(ResourceError::UnknownModel(_))));
    }
}
