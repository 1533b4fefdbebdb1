//! unitfunc Plugin System
//!
//! The registration seam between named functions and the host
//! evaluator: function metadata with static signatures, a registry
//! that validates calls against those signatures, and the context
//! passed to every call.

mod traits;
mod registry;
mod context;

pub use traits::{FunctionPlugin, FunctionMeta, ArgMeta};
pub use registry::PluginRegistry;
pub use context::EvalContext;

/// Re-export core types for plugin authors
pub mod prelude {
    pub use crate::{
        FunctionPlugin, FunctionMeta, ArgMeta, PluginRegistry, EvalContext,
    };
    pub use unitfunc_core::prelude::*;
}
