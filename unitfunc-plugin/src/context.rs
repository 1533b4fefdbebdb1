//! Evaluation Context

use unitfunc_core::Value;
use crate::PluginRegistry;
use std::sync::Arc;

/// Evaluation context passed to plugins
#[derive(Clone)]
pub struct EvalContext {
    pub registry: Arc<PluginRegistry>,
}

impl EvalContext {
    pub fn new(registry: Arc<PluginRegistry>) -> Self {
        Self { registry }
    }

    /// Call a registered function by name through this context
    pub fn call(&self, name: &str, args: &[Value]) -> Value {
        self.registry.call_function(name, args, self)
    }
}
