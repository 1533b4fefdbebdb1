//! Scale-by-constant conversion functions
//!
//! One implementation serves every unit: multiply the argument by the
//! unit's factor, exactly.

use unitfunc_core::{EvalError, Number, Value, ValueType};
use unitfunc_plugin::{ArgMeta, EvalContext, FunctionMeta, FunctionPlugin};

use crate::table::{ConstantTable, Family, UnitConstant};

static SIZE_ARGS: [ArgMeta; 1] = [
    ArgMeta::required("size", ValueType::Number, "Amount in the function's unit"),
];

static DURATION_ARGS: [ArgMeta; 1] = [
    ArgMeta::required("duration", ValueType::Number, "Amount in the function's unit"),
];

fn family_args(family: Family) -> &'static [ArgMeta] {
    match family {
        Family::Size => &SIZE_ARGS,
        Family::Time => &DURATION_ARGS,
    }
}

fn family_category(family: Family) -> &'static str {
    match family {
        Family::Size => "size",
        Family::Time => "time",
    }
}

/// Conversion function for a single unit
#[derive(Debug, Clone)]
pub struct ScaleFunction {
    name: &'static str,
    unit: &'static str,
    family: Family,
    factor: Number,
    description: &'static str,
    examples: &'static [&'static str],
}

impl ScaleFunction {
    pub fn new(constant: &UnitConstant) -> Self {
        Self {
            name: constant.function,
            unit: constant.unit,
            family: constant.family,
            factor: constant.value.clone(),
            description: constant.description,
            examples: constant.examples,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn unit(&self) -> &'static str {
        self.unit
    }

    pub fn family(&self) -> Family {
        self.family
    }

    pub fn factor(&self) -> &Number {
        &self.factor
    }

    /// `value × factor`, with no rounding
    pub fn apply(&self, value: &Number) -> Number {
        value.mul(&self.factor)
    }
}

impl FunctionPlugin for ScaleFunction {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: self.name,
            description: self.description,
            args: family_args(self.family),
            returns: ValueType::Number,
            examples: self.examples,
            category: family_category(self.family),
            source: None,
            related: &[],
        }
    }

    fn call(&self, args: &[Value], _ctx: &EvalContext) -> Value {
        let arg = match args.first() {
            Some(v) => v,
            None => return Value::Error(EvalError::arg_count(self.name, 1, 0)),
        };

        match extract_number(arg, self.name, self.family.param()) {
            Ok(n) => Value::Number(self.apply(n)),
            Err(e) => Value::Error(e),
        }
    }
}

/// Borrow the Number out of a Value, or report a type mismatch.
/// Error values pass through unchanged.
fn extract_number<'a>(value: &'a Value, func: &str, arg: &str) -> Result<&'a Number, EvalError> {
    match value {
        Value::Number(n) => Ok(n),
        Value::Error(e) => Err(e.clone()),
        other => Err(EvalError::arg_type(func, arg, "Number", other.type_name())),
    }
}

/// One conversion function per constant, in table order
pub fn conversion_functions(table: &ConstantTable) -> Vec<ScaleFunction> {
    table.iter().map(ScaleFunction::new).collect()
}
