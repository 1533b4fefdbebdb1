//! Plugin Registry

use crate::{EvalContext, FunctionMeta, FunctionPlugin};
use unitfunc_core::{codes, EvalError, Value, ValueType};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{trace, warn};

/// Central function registry
///
/// Lookups are case-insensitive; the registered spelling is kept in
/// each function's metadata and reported verbatim.
pub struct PluginRegistry {
    functions: HashMap<String, Arc<dyn FunctionPlugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self {
            functions: HashMap::new(),
        }
    }

    pub fn with_function<F: FunctionPlugin + 'static>(mut self, f: F) -> Self {
        let meta = f.meta();
        let key = meta.name.to_lowercase();
        trace!(function = meta.name, returns = %meta.returns, "registering function");
        if self.functions.insert(key, Arc::new(f)).is_some() {
            warn!(function = meta.name, "function registered twice, keeping the latest");
        }
        self
    }

    pub fn get_function(&self, name: &str) -> Option<&dyn FunctionPlugin> {
        self.functions.get(&name.to_lowercase()).map(|f| f.as_ref())
    }

    /// Registered function names, sorted, in their declared spelling
    pub fn function_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.functions.values()
            .map(|f| f.meta().name)
            .collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Declared return type of a function, without calling it
    pub fn return_type(&self, name: &str) -> Option<ValueType> {
        self.get_function(name).map(|f| f.return_type())
    }

    /// Type-check a call against the function's declared signature.
    /// Returns the call's result type on success.
    pub fn check_call(&self, name: &str, arg_types: &[ValueType]) -> Result<ValueType, EvalError> {
        let f = self.get_function(name).ok_or_else(|| self.undefined(name))?;
        let meta = f.meta();

        if arg_types.len() < meta.required_args() || arg_types.len() > meta.args.len() {
            return Err(EvalError::arg_count(meta.name, meta.args.len(), arg_types.len()));
        }

        for (arg, actual) in meta.args.iter().zip(arg_types) {
            if !arg.typ.accepts(*actual) {
                return Err(EvalError::arg_type(meta.name, arg.name, arg.typ.name(), actual.name()));
            }
        }

        Ok(meta.returns)
    }

    /// Validate the arguments against the signature, then invoke
    pub fn call_function(&self, name: &str, args: &[Value], ctx: &EvalContext) -> Value {
        let arg_types: Vec<ValueType> = args.iter().map(Value::value_type).collect();
        if let Err(e) = self.check_call(name, &arg_types) {
            return Value::Error(e);
        }

        match self.get_function(name) {
            Some(f) => f.call(args, ctx),
            None => Value::Error(self.undefined(name)),
        }
    }

    fn undefined(&self, name: &str) -> EvalError {
        let similar = self.find_similar_functions(name);
        let err = EvalError::undefined_func(name);
        if similar.is_empty() {
            return err.with_suggestion("Use help() for the full list");
        }
        let suggestions: Vec<&str> = similar.iter().take(5).copied().collect();
        err.with_suggestion(format!(
            "Similar: {}. Use help() for full list.",
            suggestions.join(", ")
        ))
    }

    /// Find function names similar to the given name (for error suggestions)
    fn find_similar_functions(&self, name: &str) -> Vec<&'static str> {
        let name_lower = name.to_lowercase();
        let mut matches: Vec<(&'static str, usize)> = self.functions.iter()
            .filter_map(|(key, f)| {
                let score = Self::similarity_score(&name_lower, key);
                if score > 0 {
                    Some((f.meta().name, score))
                } else {
                    None
                }
            })
            .collect();

        // Higher score first, then name for a stable order
        matches.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        matches.into_iter().map(|(name, _)| name).collect()
    }

    /// Calculate similarity score between two strings
    fn similarity_score(query: &str, candidate: &str) -> usize {
        let mut score = 0;

        if candidate.starts_with(query) {
            score += 100;
        } else if candidate.contains(query) {
            score += 50;
        } else if query.contains(candidate) {
            score += 30;
        }

        // Shared characters count only once a substring relation exists
        if score > 0 {
            let query_chars: std::collections::HashSet<char> = query.chars().collect();
            let candidate_chars: std::collections::HashSet<char> = candidate.chars().collect();
            score += query_chars.intersection(&candidate_chars).count() * 2;

            let len_diff = query.len().abs_diff(candidate.len());
            if len_diff < 5 {
                score += 5 - len_diff;
            }
        }

        score
    }

    pub fn help(&self, name: Option<&str>) -> Value {
        match name {
            Some(n) => self.help_for(n),
            None => self.general_help(),
        }
    }

    fn help_for(&self, name: &str) -> Value {
        match self.get_function(name) {
            Some(f) => Value::Object(Self::function_to_help(f.meta())),
            None => Value::Error(EvalError::new(codes::NOT_FOUND,
                format!("No function named '{}'", name))),
        }
    }

    fn general_help(&self) -> Value {
        let mut help = HashMap::new();

        let mut funcs_by_cat: HashMap<String, Vec<&'static str>> = HashMap::new();
        for f in self.functions.values() {
            let meta = f.meta();
            funcs_by_cat.entry(meta.category.to_string()).or_default().push(meta.name);
        }
        help.insert("functions".to_string(),
            Value::Object(funcs_by_cat.into_iter()
                .map(|(k, mut v)| {
                    v.sort_unstable();
                    (k, Value::List(v.into_iter().map(Value::from).collect()))
                })
                .collect()));

        help.insert("usage".to_string(),
            Value::from("Call help('function_name') for detailed help."));

        Value::Object(help)
    }

    fn function_to_help(meta: FunctionMeta) -> HashMap<String, Value> {
        let mut help = HashMap::new();
        help.insert("name".to_string(), Value::from(meta.name));
        help.insert("type".to_string(), Value::from("function"));
        help.insert("description".to_string(), Value::from(meta.description));
        help.insert("usage".to_string(), Value::Text(meta.usage()));
        help.insert("returns".to_string(), Value::from(meta.returns.name()));
        help.insert("category".to_string(), Value::from(meta.category));
        help.insert("args".to_string(), Value::List(
            meta.args.iter().map(|a| {
                let mut arg = HashMap::new();
                arg.insert("name".to_string(), Value::from(a.name));
                arg.insert("type".to_string(), Value::from(a.typ.name()));
                arg.insert("description".to_string(), Value::from(a.description));
                arg.insert("optional".to_string(), Value::Bool(a.optional));
                Value::Object(arg)
            }).collect()
        ));
        help.insert("examples".to_string(), Value::List(
            meta.examples.iter().map(|e| Value::from(*e)).collect()
        ));
        if let Some(source) = meta.source {
            help.insert("source".to_string(), Value::from(source));
        }
        help
    }

    pub fn list_functions(&self, category: Option<&str>) -> Value {
        let mut metas: Vec<FunctionMeta> = self.functions.values()
            .map(|f| f.meta())
            .filter(|m| category.map_or(true, |c| m.category == c))
            .collect();
        metas.sort_by_key(|m| m.name);

        let funcs: Vec<Value> = metas.into_iter()
            .map(|meta| {
                let mut obj = HashMap::new();
                obj.insert("name".to_string(), Value::from(meta.name));
                obj.insert("description".to_string(), Value::from(meta.description));
                obj.insert("usage".to_string(), Value::Text(meta.usage()));
                obj.insert("category".to_string(), Value::from(meta.category));
                Value::Object(obj)
            })
            .collect();
        Value::List(funcs)
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ArgMeta;
    use unitfunc_core::Number;

    struct Double;

    static DOUBLE_ARGS: [ArgMeta; 1] = [
        ArgMeta::required("x", ValueType::Number, "Value to double"),
    ];

    impl FunctionPlugin for Double {
        fn meta(&self) -> FunctionMeta {
            FunctionMeta {
                name: "Double",
                description: "Multiply by two",
                args: &DOUBLE_ARGS,
                returns: ValueType::Number,
                examples: &["Double(2) → 4"],
                category: "test",
                source: None,
                related: &[],
            }
        }

        fn call(&self, args: &[Value], _ctx: &EvalContext) -> Value {
            match args.first() {
                Some(Value::Number(n)) => Value::Number(n.mul(&Number::from_i64(2))),
                Some(Value::Error(e)) => Value::Error(e.clone()),
                _ => Value::Error(EvalError::arg_type("Double", "x", "Number", "?")),
            }
        }
    }

    struct Scale;

    static SCALE_ARGS: [ArgMeta; 2] = [
        ArgMeta::required("x", ValueType::Number, "Value"),
        ArgMeta::optional("by", ValueType::Number, "Factor", "1"),
    ];

    impl FunctionPlugin for Scale {
        fn meta(&self) -> FunctionMeta {
            FunctionMeta {
                name: "Scale",
                description: "Multiply by an optional factor",
                args: &SCALE_ARGS,
                returns: ValueType::Number,
                examples: &[],
                category: "other",
                source: None,
                related: &[],
            }
        }

        fn call(&self, args: &[Value], _ctx: &EvalContext) -> Value {
            args[0].clone()
        }
    }

    fn registry() -> Arc<PluginRegistry> {
        Arc::new(PluginRegistry::new().with_function(Double).with_function(Scale))
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let reg = registry();
        assert!(reg.get_function("double").is_some());
        assert!(reg.get_function("DOUBLE").is_some());
        assert_eq!(reg.get_function("double").map(|f| f.meta().name), Some("Double"));
    }

    #[test]
    fn test_function_names_sorted_verbatim() {
        let reg = registry();
        assert_eq!(reg.function_names(), vec!["Double", "Scale"]);
        assert_eq!(reg.len(), 2);
        assert!(!reg.is_empty());
    }

    #[test]
    fn test_duplicate_registration_replaces() {
        let reg = PluginRegistry::new().with_function(Double).with_function(Double);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_return_type_without_calling() {
        let reg = registry();
        assert_eq!(reg.return_type("Double"), Some(ValueType::Number));
        assert_eq!(reg.return_type("Missing"), None);
    }

    #[test]
    fn test_check_call_accepts_matching_signature() {
        let reg = registry();
        assert_eq!(reg.check_call("Double", &[ValueType::Number]), Ok(ValueType::Number));
        assert_eq!(reg.check_call("Scale", &[ValueType::Number]), Ok(ValueType::Number));
        assert_eq!(reg.check_call("Scale", &[ValueType::Number, ValueType::Number]), Ok(ValueType::Number));
    }

    #[test]
    fn test_check_call_rejects_arity() {
        let reg = registry();
        let err = reg.check_call("Double", &[]).unwrap_err();
        assert_eq!(err.code, codes::ARG_COUNT);
        let err = reg.check_call("Double", &[ValueType::Number, ValueType::Number]).unwrap_err();
        assert_eq!(err.code, codes::ARG_COUNT);
    }

    #[test]
    fn test_check_call_rejects_type() {
        let reg = registry();
        let err = reg.check_call("Double", &[ValueType::Text]).unwrap_err();
        assert_eq!(err.code, codes::ARG_TYPE);
        assert!(err.message.contains("expected Number, got Text"));
    }

    #[test]
    fn test_call_function_validates_before_invoking() {
        let reg = registry();
        let ctx = EvalContext::new(reg.clone());
        let result = ctx.call("Double", &[Value::from("two")]);
        assert_eq!(result.as_error().map(|e| e.code.as_str()), Some(codes::ARG_TYPE));

        let result = ctx.call("Double", &[Value::from(21)]);
        assert_eq!(result.as_number().and_then(|n| n.to_i64()), Some(42));
    }

    #[test]
    fn test_call_function_propagates_error_argument() {
        let reg = registry();
        let ctx = EvalContext::new(reg.clone());
        let result = ctx.call("Double", &[Value::Error(EvalError::div_zero())]);
        assert_eq!(result.as_error().map(|e| e.code.as_str()), Some(codes::DIV_ZERO));
    }

    #[test]
    fn test_unknown_function_suggests_similar() {
        let reg = registry();
        let ctx = EvalContext::new(reg.clone());
        let result = ctx.call("doub", &[Value::from(1)]);
        let err = result.as_error().unwrap();
        assert_eq!(err.code, codes::UNDEFINED_FUNC);
        assert!(err.suggestion.as_deref().unwrap_or("").contains("Double"));
    }

    #[test]
    fn test_help_for_function() {
        let reg = registry();
        let help = reg.help(Some("scale"));
        let obj = help.as_object().unwrap();
        assert_eq!(obj.get("usage").and_then(|v| v.as_text()), Some("Scale(x, [by])"));
        assert_eq!(obj.get("returns").and_then(|v| v.as_text()), Some("Number"));
        assert!(reg.help(Some("nope")).is_error());
    }

    #[test]
    fn test_general_help_groups_by_category() {
        let reg = registry();
        let help = reg.help(None);
        let funcs = help.as_object().and_then(|o| o.get("functions")).and_then(|v| v.as_object()).unwrap();
        assert_eq!(funcs.get("test").and_then(|v| v.as_list()).map(|l| l.len()), Some(1));
        assert_eq!(funcs.get("other").and_then(|v| v.as_list()).map(|l| l.len()), Some(1));
    }

    #[test]
    fn test_list_functions_by_category() {
        let reg = registry();
        assert_eq!(reg.list_functions(None).as_list().map(|l| l.len()), Some(2));
        assert_eq!(reg.list_functions(Some("test")).as_list().map(|l| l.len()), Some(1));
        assert_eq!(reg.list_functions(Some("none")).as_list().map(|l| l.len()), Some(0));
    }
}
