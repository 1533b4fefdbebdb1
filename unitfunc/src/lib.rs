//! unitfunc - Unit conversion functions for configuration evaluators
//!
//! Normalizes human units into one base unit per family:
//! - Size: `SizeBFunc` ... `SizePBFunc`, `SizeKiBFunc` ... `SizePiBFunc` → bytes
//! - Time: `TimeMillisecondFunc` ... `TimeYearFunc` → milliseconds
//!
//! Every function takes one Number and returns `argument × factor`,
//! computed exactly.
//!
//! ```ignore
//! let registry = unitfunc::unit_registry()?;
//! let ctx = EvalContext::new(Arc::new(registry));
//! ctx.call("SizeGiBFunc", &[Value::from(2)]); // 2147483648
//! ```

mod table;
mod scale;

pub use table::{
    ConstantTable, Factor, Family, TableError, UnitConstant, UnitDef,
    SIZE_UNITS, TIME_UNITS,
};
pub use scale::{conversion_functions, ScaleFunction};

use tracing::debug;
use unitfunc_plugin::PluginRegistry;

/// Load one conversion function per constant of `table` into registry
pub fn load_unit_library(registry: PluginRegistry, table: &ConstantTable) -> PluginRegistry {
    conversion_functions(table)
        .into_iter()
        .fold(registry, |registry, f| {
            debug!(function = f.name(), unit = f.unit(), base = f.family().base_unit(),
                factor = %f.factor(), "loading unit function");
            registry.with_function(f)
        })
}

/// Create registry with the standard size and time functions
pub fn unit_registry() -> Result<PluginRegistry, TableError> {
    let table = ConstantTable::standard()?;
    Ok(load_unit_library(PluginRegistry::new(), table))
}


/// Arithmetic properties of every unit function, checked against an
/// independent big-integer computation.
#[cfg(test)]
mod property_tests {
    use super::*;
    use dashu_int::IBig;
    use proptest::prelude::*;
    use std::sync::Arc;
    use unitfunc_core::{Number, Value};
    use unitfunc_plugin::{EvalContext, FunctionPlugin};

    fn functions() -> Vec<ScaleFunction> {
        conversion_functions(ConstantTable::standard().unwrap())
    }

    fn ctx() -> EvalContext {
        EvalContext::new(Arc::new(PluginRegistry::new()))
    }

    fn call(f: &ScaleFunction, x: &Number) -> Number {
        match f.call(&[Value::Number(x.clone())], &ctx()) {
            Value::Number(n) => n,
            other => panic!("{} returned {:?}", f.name(), other),
        }
    }

    /// Non-negative decimal literal with up to 12 integer and 9 fractional digits
    fn decimal() -> impl Strategy<Value = (u64, String)> {
        (0u64..1_000_000_000_000, "[0-9]{0,9}")
    }

    proptest! {
        #[test]
        fn decimal_input_scales_exactly((int_part, frac) in decimal()) {
            let literal = if frac.is_empty() {
                int_part.to_string()
            } else {
                format!("{}.{}", int_part, frac)
            };
            let x = Number::from_str(&literal).unwrap();

            // literal = digits / 10^k
            let digits: IBig = format!("{}{}", int_part, frac).parse().unwrap();
            let ten_k = IBig::from(10u8).pow(frac.len());

            for f in functions() {
                let factor = f.factor().to_ibig().unwrap();
                let expected = Number::from_str(&format!("{}/{}", &digits * &factor, ten_k)).unwrap();
                prop_assert_eq!(call(&f, &x), expected, "{}({})", f.name(), literal);
            }
        }

        #[test]
        fn rational_input_scales_exactly(num in 0i64..1_000_000_000, den in 1i64..1_000_000) {
            let x = Number::from_ratio(num, den).unwrap();
            for f in functions() {
                let expected = Number::from_i64(num).mul(f.factor()).checked_div(&Number::from_i64(den)).unwrap();
                prop_assert_eq!(call(&f, &x), expected);
            }
        }

        #[test]
        fn strictly_monotonic(a in 0i64..1_000_000_000, b in 0i64..1_000_000_000, scale in 1i64..10_000) {
            prop_assume!(a != b);
            let (lo, hi) = if a < b { (a, b) } else { (b, a) };
            let x1 = Number::from_ratio(lo, scale).unwrap();
            let x2 = Number::from_ratio(hi, scale).unwrap();
            for f in functions() {
                prop_assert!(call(&f, &x1) < call(&f, &x2), "{}", f.name());
            }
        }

        #[test]
        fn repeated_calls_agree_bit_for_bit((int_part, frac) in decimal()) {
            let x = Number::from_str(&format!("{}.{}0", int_part, frac)).unwrap();
            for f in functions() {
                let first = call(&f, &x);
                let second = call(&f, &x);
                prop_assert_eq!(first.numerator(), second.numerator());
                prop_assert_eq!(first.denominator(), second.denominator());
                prop_assert_eq!(first.to_string(), second.to_string());
            }
        }

        #[test]
        fn larger_unit_never_yields_less(num in 1i64..1_000_000, den in 1i64..1_000) {
            let x = Number::from_ratio(num, den).unwrap();
            let table = ConstantTable::standard().unwrap();
            for family in [Family::Size, Family::Time] {
                let funcs: Vec<ScaleFunction> = functions().into_iter().filter(|f| f.family() == family).collect();
                for f in &funcs {
                    for g in &funcs {
                        if table.factor(f.unit()) < table.factor(g.unit()) {
                            prop_assert!(call(f, &x) < call(g, &x));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn cross_constant_consistency() {
        let funcs = functions();
        let get = |name: &str| funcs.iter().find(|f| f.name() == name).unwrap();
        let one = Number::from_i64(1);

        assert_eq!(call(get("SizeKiBFunc"), &one), Number::from_i64(1024));
        assert_eq!(call(get("SizeMiBFunc"), &one), Number::from_i64(1024 * 1024));
        assert_eq!(call(get("SizeGBFunc"), &one), Number::from_i64(1000).pow(3));
        assert_eq!(call(get("SizePBFunc"), &one), Number::from_i64(1000).pow(5));

        let hour = call(get("TimeHourFunc"), &one);
        assert_eq!(call(get("TimeHourFunc"), &Number::from_i64(2)), Number::from_i64(2 * 60 * 60 * 60));
        assert_eq!(call(get("TimeDayFunc"), &one), hour.mul(&Number::from_i64(24)));
    }

    #[test]
    fn petabyte_and_a_half_is_exact() {
        let funcs = functions();
        let pb = funcs.iter().find(|f| f.name() == "SizePBFunc").unwrap();
        let result = call(pb, &Number::from_str("1.5").unwrap());
        assert_eq!(result, Number::from_ratio(3, 2).unwrap().mul(&Number::from_i64(1000).pow(5)));
        assert!(result.is_integer());
        assert_eq!(result.to_i64(), Some(1_500_000_000_000_000));
    }
}
