//! Arbitrary precision numbers using dashu
//!
//! Backed by dashu-ratio (RBig): every value is an exact, reduced
//! rational. Construction from decimal text, multiplication and export
//! never pass through fixed-width floating point.

use dashu_base::UnsignedAbs;
use dashu_int::{IBig, UBig};
use dashu_ratio::RBig;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Error type for number operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NumberError {
    #[error("Invalid number format: {0}")]
    ParseError(String),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Overflow: decimal exponent {0} out of range")]
    Overflow(i64),
}

/// Largest decimal exponent accepted by the parser
const MAX_DECIMAL_EXPONENT: i64 = 4096;

/// Arbitrary precision rational number
///
/// Always kept in canonical reduced form, so two numbers that compare
/// equal are also structurally identical.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Number {
    inner: RBig,
}

impl Number {
    // ========== Construction ==========

    /// Create from string representation
    /// Supports: "123", "3.14", "1/3", "1.5e15", "-42", "602214076e15"
    pub fn from_str(s: &str) -> Result<Self, NumberError> {
        let s = s.trim();

        if let Some((num_str, den_str)) = s.split_once('/') {
            let num = Self::parse_decimal(num_str.trim(), s)?;
            let den = Self::parse_decimal(den_str.trim(), s)?;
            return num.checked_div(&den);
        }

        Self::parse_decimal(s, s)
    }

    /// Exact decimal parsing: `[sign] digits [. digits] [e|E [sign] digits]`
    fn parse_decimal(s: &str, original: &str) -> Result<Self, NumberError> {
        let parse_err = || NumberError::ParseError(original.to_string());

        let (mantissa, exponent) = match s.find(['e', 'E']) {
            Some(pos) => {
                let exp: i64 = s[pos + 1..].parse().map_err(|_| parse_err())?;
                (&s[..pos], exp)
            }
            None => (s, 0),
        };

        let (negative, unsigned) = match mantissa.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, mantissa.strip_prefix('+').unwrap_or(mantissa)),
        };

        let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));
        let digits = format!("{}{}", int_part, frac_part);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(parse_err());
        }

        if !(-MAX_DECIMAL_EXPONENT..=MAX_DECIMAL_EXPONENT).contains(&exponent) {
            return Err(NumberError::Overflow(exponent));
        }
        // value = digits × 10^-scale
        let scale = i64::try_from(frac_part.len())
            .ok()
            .and_then(|len| len.checked_sub(exponent))
            .ok_or(NumberError::Overflow(exponent))?;
        if scale.abs() > MAX_DECIMAL_EXPONENT {
            return Err(NumberError::Overflow(-scale));
        }

        let mut significand: IBig = digits.parse().map_err(|_| parse_err())?;
        if negative {
            significand = -significand;
        }

        let inner = if scale >= 0 {
            RBig::from_parts(significand, pow10(scale as usize))
        } else {
            RBig::from(significand * IBig::from(pow10((-scale) as usize)))
        };
        Ok(Self { inner })
    }

    /// Create from i64
    pub fn from_i64(n: i64) -> Self {
        Self { inner: RBig::from(IBig::from(n)) }
    }

    /// Create from an arbitrary precision integer
    pub fn from_ibig(n: IBig) -> Self {
        Self { inner: RBig::from(n) }
    }

    /// Create from ratio (exact division)
    pub fn from_ratio(num: i64, den: i64) -> Result<Self, NumberError> {
        Self::from_i64(num).checked_div(&Self::from_i64(den))
    }

    // ========== Predicates ==========

    /// Check if zero
    pub fn is_zero(&self) -> bool {
        self.inner == RBig::ZERO
    }

    /// Check if negative
    pub fn is_negative(&self) -> bool {
        *self.inner.numerator() < IBig::ZERO
    }

    /// Check if value is an integer
    pub fn is_integer(&self) -> bool {
        *self.inner.denominator() == UBig::ONE
    }

    // ========== Basic Arithmetic ==========

    /// Addition
    pub fn add(&self, other: &Self) -> Self {
        Self { inner: &self.inner + &other.inner }
    }

    /// Subtraction
    pub fn sub(&self, other: &Self) -> Self {
        Self { inner: &self.inner - &other.inner }
    }

    /// Multiplication (exact)
    pub fn mul(&self, other: &Self) -> Self {
        Self { inner: &self.inner * &other.inner }
    }

    /// Safe division (returns Result, never panics)
    pub fn checked_div(&self, other: &Self) -> Result<Self, NumberError> {
        if other.is_zero() {
            Err(NumberError::DivisionByZero)
        } else {
            Ok(Self { inner: &self.inner / &other.inner })
        }
    }

    /// Integer power (exact)
    pub fn pow(&self, exp: u32) -> Self {
        let num = self.inner.numerator().pow(exp as usize);
        let den = self.inner.denominator().pow(exp as usize);
        Self { inner: RBig::from_parts(num, den) }
    }

    // ========== Lossless Export ==========

    /// Numerator of the reduced fraction
    pub fn numerator(&self) -> &IBig {
        self.inner.numerator()
    }

    /// Denominator of the reduced fraction (always positive)
    pub fn denominator(&self) -> &UBig {
        self.inner.denominator()
    }

    /// Exact integer value, if this number is an integer
    pub fn to_ibig(&self) -> Option<IBig> {
        if self.is_integer() {
            Some(self.inner.numerator().clone())
        } else {
            None
        }
    }

    /// Try to convert to i64
    pub fn to_i64(&self) -> Option<i64> {
        self.to_ibig()?.try_into().ok()
    }

    /// Number of decimal places needed to write this value exactly,
    /// or None when the expansion does not terminate (e.g. 1/3).
    pub fn exact_decimal_places(&self) -> Option<usize> {
        let two = UBig::from(2u8);
        let five = UBig::from(5u8);
        let mut den = self.inner.denominator().clone();
        let (mut twos, mut fives) = (0usize, 0usize);

        while &den % &two == UBig::ZERO {
            den = &den / &two;
            twos += 1;
        }
        while &den % &five == UBig::ZERO {
            den = &den / &five;
            fives += 1;
        }

        if den == UBig::ONE {
            Some(twos.max(fives))
        } else {
            None
        }
    }

    /// Convert to f64 (lossy, for display only)
    pub fn to_f64(&self) -> Option<f64> {
        let f: f64 = self.as_decimal(20).parse().ok()?;
        if f.is_finite() {
            Some(f)
        } else {
            None
        }
    }

    // ========== Display ==========

    /// Render as decimal string with specified decimal places,
    /// rounding half away from zero
    pub fn as_decimal(&self, places: u32) -> String {
        let places = places as usize;
        let magnitude = self.inner.numerator().clone().unsigned_abs();
        let den = self.inner.denominator();

        let scaled = magnitude * pow10(places);
        let mut quotient = &scaled / den;
        let remainder = &scaled % den;
        if remainder * UBig::from(2u8) >= *den {
            quotient += UBig::ONE;
        }

        let digits = quotient.to_string();
        let sign = if self.is_negative() && quotient != UBig::ZERO { "-" } else { "" };

        if places == 0 {
            return format!("{}{}", sign, digits);
        }

        let padded = format!("{:0>width$}", digits, width = places + 1);
        let (int_part, frac_part) = padded.split_at(padded.len() - places);
        format!("{}{}.{}", sign, int_part, frac_part)
    }
}

/// 10^exp as an unsigned big integer
fn pow10(exp: usize) -> UBig {
    UBig::from(10u8).pow(exp)
}

// ========== Trait Implementations ==========

/// Exact rendering: the shortest terminating decimal, or `num/den`
/// when no finite decimal expansion exists.
impl std::fmt::Display for Number {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.exact_decimal_places() {
            Some(places) => write!(f, "{}", self.as_decimal(places as u32)),
            None => write!(f, "{}/{}", self.inner.numerator(), self.inner.denominator()),
        }
    }
}

impl std::str::FromStr for Number {
    type Err = NumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Number::from_str(s)
    }
}

impl From<i64> for Number {
    fn from(n: i64) -> Self {
        Self::from_i64(n)
    }
}

impl From<IBig> for Number {
    fn from(n: IBig) -> Self {
        Self::from_ibig(n)
    }
}

impl Serialize for Number {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Number {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}
