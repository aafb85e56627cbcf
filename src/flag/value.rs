//! Flag values bound to fields of a parameter object.
//!
//! A [`Value`] knows how to store raw text into a parameter object, how to
//! render the current value back as text, and whether it is boolean-valued.
//! [`Field`] is the stock implementation used by the typed
//! [`FlagSet`](super::FlagSet) definers.

use std::fmt::Display;
use std::num::IntErrorKind;
use std::str::FromStr;

use crate::error::ValueError;

/// A flag value stored in a parameter object of type `P`.
pub trait Value<P> {
    /// Parse `raw` and store it in `params`.
    fn set(&self, params: &mut P, raw: &str) -> Result<(), ValueError>;

    /// Render the value currently stored in `params`.
    fn get(&self, params: &mut P) -> String;

    /// Store the default value in `params`.
    fn reset(&self, params: &mut P);

    /// Boolean flags take no separate argument on the command line, and
    /// are reported as boolean values in error messages.
    fn is_bool(&self) -> bool {
        false
    }
}

/// A typed field of `P`, reached through an accessor closure.
///
/// # Example
///
/// ```
/// use cmdtree::flag::{parse_int, Field, Value};
///
/// #[derive(Default)]
/// struct Params {
///     workers: i64,
/// }
///
/// let field = Field::new(4, |p: &mut Params| &mut p.workers, parse_int, i64::to_string);
/// let mut params = Params::default();
///
/// field.reset(&mut params);
/// assert_eq!(params.workers, 4);
///
/// field.set(&mut params, "0x10").unwrap();
/// assert_eq!(field.get(&mut params), "16");
/// ```
pub struct Field<T, F> {
    default: T,
    access: F,
    parse: fn(&str) -> Result<T, ValueError>,
    format: fn(&T) -> String,
    is_bool: bool,
}

impl<T, F> Field<T, F> {
    pub fn new<P>(
        default: T,
        access: F,
        parse: fn(&str) -> Result<T, ValueError>,
        format: fn(&T) -> String,
    ) -> Self
    where
        F: Fn(&mut P) -> &mut T,
    {
        Self {
            default,
            access,
            parse,
            format,
            is_bool: false,
        }
    }

    /// Mark the field as boolean-valued.
    pub fn boolean(mut self) -> Self {
        self.is_bool = true;
        self
    }
}

impl<P, T, F> Value<P> for Field<T, F>
where
    T: Clone,
    F: Fn(&mut P) -> &mut T,
{
    fn set(&self, params: &mut P, raw: &str) -> Result<(), ValueError> {
        let value = (self.parse)(raw)?;
        *(self.access)(params) = value;
        Ok(())
    }

    fn get(&self, params: &mut P) -> String {
        (self.format)((self.access)(params))
    }

    fn reset(&self, params: &mut P) {
        *(self.access)(params) = self.default.clone();
    }

    fn is_bool(&self) -> bool {
        self.is_bool
    }
}

pub fn parse_string(raw: &str) -> Result<String, ValueError> {
    Ok(raw.to_string())
}

/// Parse a boolean.
///
/// Accepts `1`, `t`, `T`, `TRUE`, `true`, `True` and the matching
/// `0`/`f`/`false` spellings.
pub fn parse_bool(raw: &str) -> Result<bool, ValueError> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(ValueError::Parse),
    }
}

/// Split an optional base prefix off an unsigned digit string.
///
/// `0x`, `0o` and `0b` select hex, octal and binary; a bare leading `0`
/// selects octal.
fn split_radix(digits: &str) -> (u32, &str) {
    let lower = digits.get(..2).map(str::to_ascii_lowercase);
    match lower.as_deref() {
        Some("0x") => (16, &digits[2..]),
        Some("0o") => (8, &digits[2..]),
        Some("0b") => (2, &digits[2..]),
        _ if digits.len() > 1 && digits.starts_with('0') => (8, &digits[1..]),
        _ => (10, digits),
    }
}

fn int_error(kind: &IntErrorKind) -> ValueError {
    match kind {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => ValueError::Range,
        _ => ValueError::Parse,
    }
}

/// Parse a signed integer with an optional sign and base prefix.
pub fn parse_int(raw: &str) -> Result<i64, ValueError> {
    let (negative, unsigned) = match raw.as_bytes().first() {
        Some(b'-') => (true, &raw[1..]),
        Some(b'+') => (false, &raw[1..]),
        _ => (false, raw),
    };
    let (radix, digits) = split_radix(unsigned);
    // from_str_radix accepts its own sign; a second one is a syntax error.
    if digits.is_empty() || digits.starts_with(|c: char| c == '+' || c == '-') {
        return Err(ValueError::Parse);
    }
    let text = if negative {
        format!("-{digits}")
    } else {
        digits.to_string()
    };
    i64::from_str_radix(&text, radix).map_err(|e| int_error(e.kind()))
}

/// Parse an unsigned integer with an optional base prefix.
pub fn parse_uint(raw: &str) -> Result<u64, ValueError> {
    let (radix, digits) = split_radix(raw);
    if digits.is_empty() || digits.starts_with(|c: char| c == '+' || c == '-') {
        return Err(ValueError::Parse);
    }
    u64::from_str_radix(digits, radix).map_err(|e| int_error(e.kind()))
}

pub fn parse_float(raw: &str) -> Result<f64, ValueError> {
    let value: f64 = raw.parse().map_err(|_| ValueError::Parse)?;
    if value.is_infinite() && !raw.to_ascii_lowercase().contains("inf") {
        return Err(ValueError::Range);
    }
    Ok(value)
}

/// Parse any [`FromStr`] type, keeping the parser's message as the cause.
pub fn parse_from_str<T>(raw: &str) -> Result<T, ValueError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.parse().map_err(|e: T::Err| ValueError::Invalid(e.to_string()))
}
