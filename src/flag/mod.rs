//! Single-dash command-line flags bound to a parameter object.
//!
//! A [`FlagSet`] holds named flags, each bound to a field of a caller-owned
//! parameter object `P`. Parsing consumes leading flag tokens and keeps the
//! rest as positional arguments.
//!
//! # Grammar
//!
//! - `-name` or `--name` for boolean flags
//! - `-name=value`, `--name=value` or `-name value` for the rest
//! - parsing stops at the first non-flag token, at a lone `-`, or after a
//!   `--` terminator, which is consumed
//! - `-h` and `-help` request help unless defined as flags
//!
//! # Example
//!
//! ```
//! use cmdtree::flag::FlagSet;
//!
//! #[derive(Default)]
//! struct Params {
//!     env: String,
//!     verbose: bool,
//!     port: u64,
//! }
//!
//! let mut fs = FlagSet::new("serve");
//! fs.string("env", "production", "environment name", |p: &mut Params| &mut p.env);
//! fs.bool("v", false, "verbose output", |p: &mut Params| &mut p.verbose);
//! fs.uint("port", 5000, "listen port", |p: &mut Params| &mut p.port);
//!
//! let mut params = Params::default();
//! fs.apply_defaults(&mut params);
//! fs.parse(&mut params, ["-v", "-port", "8080", "start", "-env=dev"]).unwrap();
//!
//! assert!(params.verbose);
//! assert_eq!(params.port, 8080);
//! assert_eq!(params.env, "production");
//! assert_eq!(fs.args(), ["start", "-env=dev"]);
//! ```

mod value;

pub use value::{
    parse_bool, parse_float, parse_from_str, parse_int, parse_string, parse_uint, Field, Value,
};

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt::Display;
use std::str::FromStr;

use crate::error::FlagError;

/// A named flag and the value it is bound to.
pub struct Flag<P> {
    name: String,
    usage: String,
    value: Box<dyn Value<P>>,
}

impl<P> Flag<P> {
    /// The flag's name, without dashes.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// One-line description given at definition.
    pub fn usage(&self) -> &str {
        &self.usage
    }

    /// Whether the flag may be given without a value.
    pub fn is_bool(&self) -> bool {
        self.value.is_bool()
    }

    /// Text form of the value currently stored in `params`.
    pub fn value(&self, params: &mut P) -> String {
        self.value.get(params)
    }
}

/// A set of flags for one command.
pub struct FlagSet<P> {
    name: String,
    flags: BTreeMap<String, Flag<P>>,
    actual: BTreeSet<String>,
    args: Vec<String>,
}

impl<P> FlagSet<P> {
    /// Create an empty set named after its command.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            flags: BTreeMap::new(),
            actual: BTreeSet::new(),
            args: Vec::new(),
        }
    }

    /// The name of the command that owns this set.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Define a flag with a custom [`Value`].
    ///
    /// # Panics
    ///
    /// Panics if a flag with the same name is already defined.
    pub fn var(&mut self, name: &str, usage: &str, value: impl Value<P> + 'static) {
        if self.flags.contains_key(name) {
            panic!("{} flag redefined: {}", self.name, name);
        }
        self.flags.insert(
            name.to_string(),
            Flag {
                name: name.to_string(),
                usage: usage.to_string(),
                value: Box::new(value),
            },
        );
    }

    /// Define a string flag.
    pub fn string<F>(&mut self, name: &str, default: &str, usage: &str, field: F)
    where
        F: Fn(&mut P) -> &mut String + 'static,
    {
        let value = Field::new(default.to_string(), field, parse_string, String::clone);
        self.var(name, usage, value);
    }

    /// Define a boolean flag; `-name` alone sets it to true.
    pub fn bool<F>(&mut self, name: &str, default: bool, usage: &str, field: F)
    where
        F: Fn(&mut P) -> &mut bool + 'static,
    {
        let value = Field::new(default, field, parse_bool, bool::to_string).boolean();
        self.var(name, usage, value);
    }

    /// Define a signed integer flag. Accepts `0x`, `0o`, `0b` and leading `0` prefixes.
    pub fn int<F>(&mut self, name: &str, default: i64, usage: &str, field: F)
    where
        F: Fn(&mut P) -> &mut i64 + 'static,
    {
        let value = Field::new(default, field, parse_int, i64::to_string);
        self.var(name, usage, value);
    }

    /// Define an unsigned integer flag with the same prefixes as [`int`](Self::int).
    pub fn uint<F>(&mut self, name: &str, default: u64, usage: &str, field: F)
    where
        F: Fn(&mut P) -> &mut u64 + 'static,
    {
        let value = Field::new(default, field, parse_uint, u64::to_string);
        self.var(name, usage, value);
    }

    /// Define a floating point flag.
    pub fn float<F>(&mut self, name: &str, default: f64, usage: &str, field: F)
    where
        F: Fn(&mut P) -> &mut f64 + 'static,
    {
        let value = Field::new(default, field, parse_float, f64::to_string);
        self.var(name, usage, value);
    }

    /// Define a flag for any type that parses with [`FromStr`].
    pub fn parsed<T, F>(&mut self, name: &str, default: T, usage: &str, field: F)
    where
        T: FromStr + Display + Clone + 'static,
        T::Err: Display,
        F: Fn(&mut P) -> &mut T + 'static,
    {
        let value = Field::new(default, field, parse_from_str::<T>, ToString::to_string);
        self.var(name, usage, value);
    }

    /// The flag with this name, if defined.
    pub fn lookup(&self, name: &str) -> Option<&Flag<P>> {
        self.flags.get(name)
    }

    /// All defined flags, in name order.
    pub fn all(&self) -> impl Iterator<Item = &Flag<P>> {
        self.flags.values()
    }

    /// Flags given a value by [`parse`](Self::parse) or [`set`](Self::set),
    /// in name order.
    pub fn explicit(&self) -> impl Iterator<Item = &Flag<P>> {
        self.actual.iter().filter_map(|name| self.flags.get(name))
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Store every flag's default in `params`.
    pub fn apply_defaults(&self, params: &mut P) {
        for flag in self.flags.values() {
            flag.value.reset(params);
        }
    }

    /// Parse flag tokens from `args` into `params`.
    ///
    /// Tokens left after the last flag are available from
    /// [`args`](Self::args).
    pub fn parse<I>(&mut self, params: &mut P, args: I) -> Result<(), FlagError>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut args: VecDeque<String> = args.into_iter().map(Into::into).collect();
        while self.parse_one(params, &mut args)? {}
        self.args = args.into();
        Ok(())
    }

    fn parse_one(
        &mut self,
        params: &mut P,
        args: &mut VecDeque<String>,
    ) -> Result<bool, FlagError> {
        let Some(token) = args.front() else {
            return Ok(false);
        };
        if token.len() < 2 || !token.starts_with('-') {
            return Ok(false);
        }

        let dashes = if token[1..].starts_with('-') {
            if token.len() == 2 {
                args.pop_front();
                return Ok(false);
            }
            2
        } else {
            1
        };
        let body = &token[dashes..];
        if body.is_empty() || body.starts_with('-') || body.starts_with('=') {
            return Err(FlagError::BadSyntax(token.clone()));
        }
        let (name, inline) = match body.split_once('=') {
            Some((name, value)) => (name.to_string(), Some(value.to_string())),
            None => (body.to_string(), None),
        };
        args.pop_front();

        let Some(flag) = self.flags.get(&name) else {
            if name == "help" || name == "h" {
                return Err(FlagError::Help);
            }
            return Err(FlagError::Undefined(name));
        };

        if flag.is_bool() {
            let value = inline.unwrap_or_else(|| "true".to_string());
            if let Err(cause) = flag.value.set(params, &value) {
                return Err(FlagError::InvalidBoolValue { name, value, cause });
            }
        } else {
            let value = match inline {
                Some(value) => value,
                None => match args.pop_front() {
                    Some(value) => value,
                    None => return Err(FlagError::MissingArgument(name)),
                },
            };
            if let Err(cause) = flag.value.set(params, &value) {
                return Err(FlagError::InvalidValue { name, value, cause });
            }
        }

        self.actual.insert(name);
        Ok(true)
    }

    /// Store `raw` in the named flag.
    pub fn set(&mut self, params: &mut P, name: &str, raw: &str) -> Result<(), FlagError> {
        let flag = self
            .flags
            .get(name)
            .ok_or_else(|| FlagError::NoSuchFlag(name.to_string()))?;
        flag.value.set(params, raw)?;
        self.actual.insert(name.to_string());
        Ok(())
    }

    /// Positional arguments left after parsing.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Take the positional arguments left after parsing.
    pub fn into_args(self) -> Vec<String> {
        self.args
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValueError;

    #[derive(Debug, Default)]
    struct Params {
        name: String,
        count: i64,
        debug: bool,
        ratio: f64,
    }

    fn flag_set() -> FlagSet<Params> {
        let mut fs = FlagSet::new("test");
        fs.string("name", "anon", "", |p: &mut Params| &mut p.name);
        fs.int("count", 1, "", |p: &mut Params| &mut p.count);
        fs.bool("debug", false, "", |p: &mut Params| &mut p.debug);
        fs.float("ratio", 0.5, "", |p: &mut Params| &mut p.ratio);
        fs
    }

    fn parse(args: &[&str]) -> (FlagSet<Params>, Params, Result<(), FlagError>) {
        let mut fs = flag_set();
        let mut params = Params::default();
        fs.apply_defaults(&mut params);
        let result = fs.parse(&mut params, args.iter().copied());
        (fs, params, result)
    }

    #[test]
    fn defaults_are_applied() {
        let (fs, params, result) = parse(&[]);
        assert!(result.is_ok());
        assert_eq!(params.name, "anon");
        assert_eq!(params.count, 1);
        assert!(!params.debug);
        assert_eq!(params.ratio, 0.5);
        assert_eq!(fs.explicit().count(), 0);
    }

    #[test]
    fn accepts_all_value_forms() {
        let (fs, params, result) = parse(&["-name=a", "--count", "7", "-debug", "--ratio=2"]);
        assert!(result.is_ok());
        assert_eq!(params.name, "a");
        assert_eq!(params.count, 7);
        assert!(params.debug);
        assert_eq!(params.ratio, 2.0);
        let explicit: Vec<_> = fs.explicit().map(Flag::name).collect();
        assert_eq!(explicit, ["count", "debug", "name", "ratio"]);
    }

    #[test]
    fn bool_flag_does_not_consume_next_token() {
        let (fs, params, result) = parse(&["-debug", "false"]);
        assert!(result.is_ok());
        assert!(params.debug);
        assert_eq!(fs.args(), ["false"]);
    }

    #[test]
    fn stops_at_first_positional() {
        let (fs, params, result) = parse(&["-count=2", "sub", "-name=x"]);
        assert!(result.is_ok());
        assert_eq!(params.count, 2);
        assert_eq!(params.name, "anon");
        assert_eq!(fs.args(), ["sub", "-name=x"]);
    }

    #[test]
    fn double_dash_terminates_and_is_consumed() {
        let (fs, _, result) = parse(&["-debug", "--", "-name=x"]);
        assert!(result.is_ok());
        assert_eq!(fs.args(), ["-name=x"]);
    }

    #[test]
    fn lone_dash_is_positional() {
        let (fs, _, result) = parse(&["-", "x"]);
        assert!(result.is_ok());
        assert_eq!(fs.args(), ["-", "x"]);
    }

    #[test]
    fn help_is_requested() {
        assert_eq!(parse(&["-h"]).2, Err(FlagError::Help));
        assert_eq!(parse(&["--help"]).2, Err(FlagError::Help));
    }

    #[test]
    fn defined_help_flag_is_not_help() {
        let mut fs = flag_set();
        fs.bool("h", false, "", |p: &mut Params| &mut p.debug);
        let mut params = Params::default();
        assert!(fs.parse(&mut params, ["-h"]).is_ok());
        assert!(params.debug);
    }

    #[test]
    fn reports_grammar_errors() {
        assert_eq!(
            parse(&["---x"]).2,
            Err(FlagError::BadSyntax("---x".into()))
        );
        assert_eq!(parse(&["-=x"]).2, Err(FlagError::BadSyntax("-=x".into())));
        assert_eq!(parse(&["-nope"]).2, Err(FlagError::Undefined("nope".into())));
        assert_eq!(
            parse(&["-count"]).2,
            Err(FlagError::MissingArgument("count".into()))
        );
    }

    #[test]
    fn reports_invalid_values() {
        let err = parse(&["-count=invalid"]).2.unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"invalid value "invalid" for flag -count: parse error"#
        );

        let err = parse(&["-debug=invalid"]).2.unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"invalid boolean value "invalid" for -debug: parse error"#
        );
    }

    #[test]
    fn set_assigns_by_name() {
        let mut fs = flag_set();
        let mut params = Params::default();
        fs.set(&mut params, "count", "12").unwrap();
        assert_eq!(params.count, 12);
        assert_eq!(
            fs.set(&mut params, "count", "x"),
            Err(FlagError::Value(ValueError::Parse))
        );
        assert_eq!(
            fs.set(&mut params, "missing", "x"),
            Err(FlagError::NoSuchFlag("missing".into()))
        );
    }

    #[test]
    fn lookup_reports_value_and_kind() {
        let fs = flag_set();
        let mut params = Params::default();
        fs.apply_defaults(&mut params);
        let flag = fs.lookup("debug").unwrap();
        assert!(flag.is_bool());
        assert_eq!(flag.value(&mut params), "false");
        assert!(!fs.lookup("name").unwrap().is_bool());
        assert_eq!(fs.len(), 4);
    }

    #[test]
    fn parsed_flag_uses_from_str() {
        use std::net::{IpAddr, Ipv4Addr};

        struct Net {
            addr: IpAddr,
        }
        let mut fs = FlagSet::new("net");
        fs.parsed(
            "addr",
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            "",
            |p: &mut Net| &mut p.addr,
        );
        let mut params = Net {
            addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        };
        fs.apply_defaults(&mut params);
        assert_eq!(params.addr, IpAddr::V4(Ipv4Addr::LOCALHOST));

        assert!(fs.parse(&mut params, ["-addr=10.0.0.1"]).is_ok());
        assert_eq!(params.addr.to_string(), "10.0.0.1");

        let err = fs.parse(&mut params, ["-addr=nope"]).unwrap_err();
        assert!(matches!(
            err,
            FlagError::InvalidValue {
                cause: ValueError::Invalid(_),
                ..
            }
        ));
    }

    #[test]
    #[should_panic(expected = "flag redefined: name")]
    fn redefinition_panics() {
        let mut fs = flag_set();
        fs.string("name", "", "", |p: &mut Params| &mut p.name);
    }
}
