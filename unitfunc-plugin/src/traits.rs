//! Plugin traits

use unitfunc_core::{Value, ValueType};
use crate::EvalContext;
use serde::Serialize;

/// Metadata about a function argument
#[derive(Debug, Clone, Serialize)]
pub struct ArgMeta {
    pub name: &'static str,
    pub typ: ValueType,
    pub description: &'static str,
    pub optional: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<&'static str>,
}

impl ArgMeta {
    pub const fn required(name: &'static str, typ: ValueType, description: &'static str) -> Self {
        Self { name, typ, description, optional: false, default: None }
    }

    pub const fn optional(name: &'static str, typ: ValueType, description: &'static str, default: &'static str) -> Self {
        Self { name, typ, description, optional: true, default: Some(default) }
    }
}

/// Metadata for a function plugin
///
/// Everything the evaluator needs to type-check a call without running it.
#[derive(Debug, Clone, Serialize)]
pub struct FunctionMeta {
    pub name: &'static str,
    pub description: &'static str,
    pub args: &'static [ArgMeta],
    pub returns: ValueType,
    pub examples: &'static [&'static str],
    pub category: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<&'static str>,
    pub related: &'static [&'static str],
}

impl FunctionMeta {
    /// Call shape, e.g. `SizeKBFunc(size)`
    pub fn usage(&self) -> String {
        let args: Vec<String> = self.args.iter()
            .map(|a| if a.optional { format!("[{}]", a.name) } else { a.name.to_string() })
            .collect();
        format!("{}({})", self.name, args.join(", "))
    }

    pub fn required_args(&self) -> usize {
        self.args.iter().filter(|a| !a.optional).count()
    }
}

/// Pure function plugin
pub trait FunctionPlugin: Send + Sync {
    fn meta(&self) -> FunctionMeta;
    fn call(&self, args: &[Value], ctx: &EvalContext) -> Value;

    /// Declared return type, known before the function is called
    fn return_type(&self) -> ValueType {
        self.meta().returns
    }
}
