//! Module and directive registry
//!
//! The registry is an ordinary value owned by the host application. Plugins
//! add themselves through an explicit registration function called during
//! startup, so tests can build as many isolated registries as they like.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut registry = Registry::new();
//! visitorip::register(&mut registry)?;
//!
//! let chain = registry.load_config("Caddyfile", "visitor_ip stdout\n", &Context::new())?;
//! ```

use crate::dispenser::{Dispenser, Helper};
use crate::error::ConfigError;
use crate::middleware::LayerStack;
use crate::module::{Context, HandlerModule, ModuleId, ModuleInfo};
use std::collections::BTreeMap;
use tracing::debug;

/// Parser bound to a directive keyword
pub type DirectiveParser = fn(&mut Helper) -> Result<Box<dyn HandlerModule>, ConfigError>;

/// Registry of handler modules and their configuration directives
#[derive(Default)]
pub struct Registry {
    modules: BTreeMap<ModuleId, ModuleInfo>,
    directives: BTreeMap<String, DirectiveParser>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module under its id
    pub fn register_module(&mut self, info: ModuleInfo) -> Result<(), ConfigError> {
        let id = ModuleId::new(info.id)?;
        if self.modules.contains_key(&id) {
            return Err(ConfigError::DuplicateModule(id.to_string()));
        }
        debug!(module = %id, "registered module");
        self.modules.insert(id, info);
        Ok(())
    }

    /// Bind a textual configuration keyword to a parser
    pub fn register_handler_directive(
        &mut self,
        name: impl Into<String>,
        parser: DirectiveParser,
    ) -> Result<(), ConfigError> {
        let name = name.into();
        if self.directives.contains_key(&name) {
            return Err(ConfigError::DuplicateDirective(name));
        }
        debug!(directive = %name, "registered handler directive");
        self.directives.insert(name, parser);
        Ok(())
    }

    /// Look up a module by its full id
    pub fn get_module(&self, id: &str) -> Option<&ModuleInfo> {
        self.modules.get(id)
    }

    /// Look up a directive parser by keyword
    pub fn directive(&self, name: &str) -> Option<DirectiveParser> {
        self.directives.get(name).copied()
    }

    /// All registered modules, sorted by id
    pub fn modules(&self) -> impl Iterator<Item = &ModuleInfo> {
        self.modules.values()
    }

    /// Build, configure from JSON, provision and validate a module
    pub fn load_module(
        &self,
        id: &str,
        raw: &serde_json::Value,
        ctx: &Context,
    ) -> Result<Box<dyn HandlerModule>, ConfigError> {
        let info = self
            .get_module(id)
            .ok_or_else(|| ConfigError::UnknownModule(id.to_string()))?;

        let mut module = (info.new)();
        module.load_json(raw)?;
        start(module, ctx, id)
    }

    /// Parse textual configuration into a ready handler chain
    ///
    /// Handlers appear in the chain in the order their directives appear in
    /// the text. The first failure aborts the whole load.
    pub fn load_config(
        &self,
        file: &str,
        input: &str,
        ctx: &Context,
    ) -> Result<LayerStack, ConfigError> {
        let mut stack = LayerStack::new();

        for mut segment in Dispenser::new(file, input)?.segments()? {
            segment.next_token();
            let name = segment.val().to_string();
            let line = segment.line();
            segment.reset();

            let parser = self
                .directive(&name)
                .ok_or_else(|| ConfigError::UnknownDirective {
                    file: file.to_string(),
                    line,
                    name: name.clone(),
                })?;

            let mut helper = Helper::new(name.as_str(), segment);
            let module = parser(&mut helper)?;
            stack.push(start(module, ctx, &name)?.into_handler());
        }

        Ok(stack)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("modules", &self.modules.keys().collect::<Vec<_>>())
            .field("directives", &self.directives.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Provision then validate a configured module
fn start(
    mut module: Box<dyn HandlerModule>,
    ctx: &Context,
    name: &str,
) -> Result<Box<dyn HandlerModule>, ConfigError> {
    module.provision(ctx)?;
    module.validate()?;
    debug!(module = %name, "module ready");
    Ok(module)
}
