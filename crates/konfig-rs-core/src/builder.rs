//! Fluent assembly of a config object from a definition and plugins.

use crate::object::{ConfigDefinition, ConfigObject};
use crate::plugin::{
    ConfigCache, ConfigEncryptor, ConfigLoader, ConfigPlugins, ConfigSerializer, ConfigValidator,
};
use std::sync::Arc;

/// Builder for [`ConfigObject`]. Plugins are optional and may be given in any order.
pub struct ConfigBuilder {
    definition: Arc<dyn ConfigDefinition>,
    plugins: ConfigPlugins,
}

impl ConfigBuilder {
    /// Start a builder for the given definition.
    pub fn new(definition: Arc<dyn ConfigDefinition>) -> Self {
        Self {
            definition,
            plugins: ConfigPlugins::none(),
        }
    }

    /// Start a builder from an owned definition.
    pub fn for_definition(definition: impl ConfigDefinition + 'static) -> Self {
        Self::new(Arc::new(definition))
    }

    pub fn with_validator(mut self, validator: Arc<dyn ConfigValidator>) -> Self {
        self.plugins.validator = Some(validator);
        self
    }

    pub fn with_loader(mut self, loader: Arc<dyn ConfigLoader>) -> Self {
        self.plugins.loader = Some(loader);
        self
    }

    pub fn with_serializer(mut self, serializer: Arc<dyn ConfigSerializer>) -> Self {
        self.plugins.serializer = Some(serializer);
        self
    }

    pub fn with_encryptor(mut self, encryptor: Arc<dyn ConfigEncryptor>) -> Self {
        self.plugins.encryptor = Some(encryptor);
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn ConfigCache>) -> Self {
        self.plugins.cache = Some(cache);
        self
    }

    /// Source identifier passed to the loader by `load(None)`.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.plugins.source = Some(source.into());
        self
    }

    /// Replace every plugin at once.
    pub fn with_plugins(mut self, plugins: ConfigPlugins) -> Self {
        self.plugins = plugins;
        self
    }

    /// Produce an unloaded config object.
    pub fn build(self) -> ConfigObject {
        ConfigObject::new(self.definition, self.plugins)
    }
}
