//! unitfunc Core - Fundamental types
//!
//! This crate provides the core types shared by the unit functions and
//! the host evaluator:
//! - `Number`: Exact arbitrary precision rational numbers
//! - `Value` / `ValueType`: Runtime values and their static types
//! - `EvalError`: Structured errors returned from function calls

mod number;
mod value;
mod error;

pub use number::{Number, NumberError};
pub use value::{Value, ValueType};
pub use error::{EvalError, Severity, codes};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{Number, Value, ValueType, EvalError, Severity};
    pub use crate::error::codes;
}
