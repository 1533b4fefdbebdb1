//! Unit constant table
//!
//! Every scaling factor is declared once as a `UnitDef`, either as a
//! literal or as another unit times a multiplier. `ConstantTable::build`
//! resolves the definitions as a DAG and fails before any function is
//! registered if the graph is inconsistent.

use dashu_int::IBig;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::{debug, warn};
use unitfunc_core::{EvalError, Number};

/// Unit family. Families share no constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    /// Base unit: 1 byte
    Size,
    /// Base unit: 1 millisecond
    Time,
}

impl Family {
    /// Parameter name of the conversion functions in this family
    pub fn param(self) -> &'static str {
        match self {
            Family::Size => "size",
            Family::Time => "duration",
        }
    }

    pub fn base_unit(self) -> &'static str {
        match self {
            Family::Size => "byte",
            Family::Time => "millisecond",
        }
    }
}

/// How a constant's value is obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Factor {
    Literal(u64),
    /// `of × by`
    Scaled { of: &'static str, by: u64 },
}

/// Definition of one unit and the function that converts from it
#[derive(Debug, Clone, Copy)]
pub struct UnitDef {
    pub unit: &'static str,
    pub function: &'static str,
    pub family: Family,
    pub factor: Factor,
    pub description: &'static str,
    pub examples: &'static [&'static str],
}

/// A resolved unit constant
#[derive(Debug, Clone, Serialize)]
pub struct UnitConstant {
    pub unit: &'static str,
    pub function: &'static str,
    pub family: Family,
    /// Multiples of the family's base unit
    pub value: Number,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub derived_from: Option<&'static str>,
    pub description: &'static str,
    pub examples: &'static [&'static str],
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("unit '{0}' is defined more than once")]
    Duplicate(&'static str),

    #[error("function '{function}' is bound to both '{first}' and '{second}'")]
    DuplicateFunction { function: &'static str, first: &'static str, second: &'static str },

    #[error("unit '{unit}' is derived from undefined unit '{base}'")]
    MissingBase { unit: &'static str, base: &'static str },

    #[error("unit '{unit}' ({unit_family:?}) is derived from '{base}' of another family")]
    FamilyMismatch { unit: &'static str, unit_family: Family, base: &'static str },

    #[error("unit '{0}' has a zero factor")]
    ZeroFactor(&'static str),

    #[error("cyclic unit definitions: {}", .0.join(" → "))]
    Cycle(Vec<&'static str>),
}

impl From<TableError> for EvalError {
    fn from(err: TableError) -> Self {
        EvalError::init_error(err.to_string())
    }
}

const fn size(
    unit: &'static str,
    function: &'static str,
    factor: Factor,
    description: &'static str,
    examples: &'static [&'static str],
) -> UnitDef {
    UnitDef { unit, function, family: Family::Size, factor, description, examples }
}

const fn time(
    unit: &'static str,
    function: &'static str,
    factor: Factor,
    description: &'static str,
    examples: &'static [&'static str],
) -> UnitDef {
    UnitDef { unit, function, family: Family::Time, factor, description, examples }
}

const fn times(of: &'static str, by: u64) -> Factor {
    Factor::Scaled { of, by }
}

/// Size units, base = 1 byte. Decimal (SI) and binary (IEC) scales
/// are independent chains sharing only the byte.
pub static SIZE_UNITS: [UnitDef; 11] = [
    size("B", "SizeBFunc", Factor::Literal(1),
        "Size in bytes", &["SizeBFunc(512) → 512"]),
    size("KB", "SizeKBFunc", times("B", 1000),
        "Size in kilobytes (1000 B), as bytes", &["SizeKBFunc(4) → 4000"]),
    size("MB", "SizeMBFunc", times("KB", 1000),
        "Size in megabytes (1000 KB), as bytes", &["SizeMBFunc(1.5) → 1500000"]),
    size("GB", "SizeGBFunc", times("MB", 1000),
        "Size in gigabytes (1000 MB), as bytes", &["SizeGBFunc(2) → 2000000000"]),
    size("TB", "SizeTBFunc", times("GB", 1000),
        "Size in terabytes (1000 GB), as bytes", &["SizeTBFunc(1) → 1000000000000"]),
    size("PB", "SizePBFunc", times("TB", 1000),
        "Size in petabytes (1000 TB), as bytes", &["SizePBFunc(1.5) → 1500000000000000"]),
    size("KiB", "SizeKiBFunc", times("B", 1024),
        "Size in kibibytes (1024 B), as bytes", &["SizeKiBFunc(4) → 4096"]),
    size("MiB", "SizeMiBFunc", times("KiB", 1024),
        "Size in mebibytes (1024 KiB), as bytes", &["SizeMiBFunc(0.5) → 524288"]),
    size("GiB", "SizeGiBFunc", times("MiB", 1024),
        "Size in gibibytes (1024 MiB), as bytes", &["SizeGiBFunc(1) → 1073741824"]),
    size("TiB", "SizeTiBFunc", times("GiB", 1024),
        "Size in tebibytes (1024 GiB), as bytes", &["SizeTiBFunc(1) → 1099511627776"]),
    size("PiB", "SizePiBFunc", times("TiB", 1024),
        "Size in pebibytes (1024 TiB), as bytes", &["SizePiBFunc(1) → 1125899906842624"]),
];

/// Time units, base = 1 millisecond.
///
/// Values are kept as historically shipped: a second is 60 ms, a week
/// is 72 days and a month 36 days. Configurations depend on them.
pub static TIME_UNITS: [UnitDef; 8] = [
    time("Millisecond", "TimeMillisecondFunc", Factor::Literal(1),
        "Duration in milliseconds", &["TimeMillisecondFunc(250) → 250"]),
    time("Second", "TimeSecondFunc", times("Millisecond", 60),
        "Duration in seconds (60 ms), as milliseconds", &["TimeSecondFunc(10) → 600"]),
    time("Minute", "TimeMinuteFunc", times("Second", 60),
        "Duration in minutes (60 s), as milliseconds", &["TimeMinuteFunc(1) → 3600"]),
    time("Hour", "TimeHourFunc", times("Minute", 60),
        "Duration in hours (60 min), as milliseconds", &["TimeHourFunc(2) → 432000"]),
    time("Day", "TimeDayFunc", times("Hour", 24),
        "Duration in days (24 h), as milliseconds", &["TimeDayFunc(1) → 5184000"]),
    time("Week", "TimeWeekFunc", times("Day", 72),
        "Duration in weeks (72 d), as milliseconds", &["TimeWeekFunc(1) → 373248000"]),
    time("Month", "TimeMonthFunc", times("Day", 36),
        "Duration in months (36 d), as milliseconds", &["TimeMonthFunc(1) → 186624000"]),
    time("Year", "TimeYearFunc", times("Day", 365),
        "Duration in years (365 d), as milliseconds", &["TimeYearFunc(1) → 1892160000"]),
];

static STANDARD_TABLE: LazyLock<Result<ConstantTable, TableError>> = LazyLock::new(|| {
    let defs = [SIZE_UNITS.as_slice(), TIME_UNITS.as_slice()].concat();
    ConstantTable::build(&defs)
});

/// Resolved, immutable unit constants in definition order
#[derive(Debug, Clone)]
pub struct ConstantTable {
    constants: Vec<UnitConstant>,
    index: HashMap<&'static str, usize>,
}

/// Depth-first resolution state over the definition graph
struct Resolver<'a> {
    defs: &'a [UnitDef],
    by_name: HashMap<&'static str, usize>,
    values: Vec<Option<Number>>,
    visiting: Vec<bool>,
    stack: Vec<&'static str>,
}

impl<'a> Resolver<'a> {
    fn new(defs: &'a [UnitDef]) -> Result<Self, TableError> {
        let mut by_name = HashMap::with_capacity(defs.len());
        // Registry lookup ignores case, so function names must differ case-insensitively
        let mut by_function: HashMap<String, &'static str> = HashMap::with_capacity(defs.len());
        for (i, def) in defs.iter().enumerate() {
            if by_name.insert(def.unit, i).is_some() {
                return Err(TableError::Duplicate(def.unit));
            }
            if let Some(first) = by_function.insert(def.function.to_lowercase(), def.unit) {
                return Err(TableError::DuplicateFunction {
                    function: def.function,
                    first,
                    second: def.unit,
                });
            }
        }
        Ok(Self {
            defs,
            by_name,
            values: vec![None; defs.len()],
            visiting: vec![false; defs.len()],
            stack: Vec::new(),
        })
    }

    fn resolve(&mut self, i: usize) -> Result<Number, TableError> {
        if let Some(v) = &self.values[i] {
            return Ok(v.clone());
        }

        let def = self.defs[i];
        if self.visiting[i] {
            let start = self.stack.iter().position(|u| *u == def.unit).unwrap_or(0);
            let mut cycle = self.stack[start..].to_vec();
            cycle.push(def.unit);
            return Err(TableError::Cycle(cycle));
        }

        self.visiting[i] = true;
        self.stack.push(def.unit);

        let value = match def.factor {
            Factor::Literal(0) | Factor::Scaled { by: 0, .. } => {
                return Err(TableError::ZeroFactor(def.unit));
            }
            Factor::Literal(n) => Number::from_ibig(IBig::from(n)),
            Factor::Scaled { of, by } => {
                let j = *self.by_name.get(of)
                    .ok_or(TableError::MissingBase { unit: def.unit, base: of })?;
                if self.defs[j].family != def.family {
                    return Err(TableError::FamilyMismatch {
                        unit: def.unit,
                        unit_family: def.family,
                        base: of,
                    });
                }
                self.resolve(j)?.mul(&Number::from_ibig(IBig::from(by)))
            }
        };

        self.stack.pop();
        self.visiting[i] = false;
        self.values[i] = Some(value.clone());
        debug!(unit = def.unit, value = %value, "resolved unit constant");
        Ok(value)
    }
}

impl ConstantTable {
    /// Resolve definitions in dependency order.
    ///
    /// Definitions may appear in any order; the result keeps the order
    /// they were given in.
    pub fn build(defs: &[UnitDef]) -> Result<Self, TableError> {
        let result = Self::resolve_all(defs);
        match &result {
            Ok(table) => debug!(units = table.len(), "unit table built"),
            Err(e) => warn!(error = %e, "unit table rejected"),
        }
        result
    }

    fn resolve_all(defs: &[UnitDef]) -> Result<Self, TableError> {
        let mut resolver = Resolver::new(defs)?;
        let mut constants = Vec::with_capacity(defs.len());
        let mut index = HashMap::with_capacity(defs.len());

        for (i, def) in defs.iter().enumerate() {
            let value = resolver.resolve(i)?;
            let derived_from = match def.factor {
                Factor::Scaled { of, .. } => Some(of),
                Factor::Literal(_) => None,
            };
            index.insert(def.unit, constants.len());
            constants.push(UnitConstant {
                unit: def.unit,
                function: def.function,
                family: def.family,
                value,
                derived_from,
                description: def.description,
                examples: def.examples,
            });
        }

        Ok(Self { constants, index })
    }

    /// The size and time tables, built once per process
    pub fn standard() -> Result<&'static ConstantTable, TableError> {
        STANDARD_TABLE.as_ref().map_err(Clone::clone)
    }

    pub fn get(&self, unit: &str) -> Option<&UnitConstant> {
        self.index.get(unit).map(|&i| &self.constants[i])
    }

    pub fn factor(&self, unit: &str) -> Option<&Number> {
        self.get(unit).map(|c| &c.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &UnitConstant> {
        self.constants.iter()
    }

    pub fn family(&self, family: Family) -> impl Iterator<Item = &UnitConstant> {
        self.constants.iter().filter(move |c| c.family == family)
    }

    pub fn len(&self) -> usize {
        self.constants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constants.is_empty()
    }
}
