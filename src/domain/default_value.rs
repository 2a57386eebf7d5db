// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed default values and their string form.
//!
//! Every source answers lookups with strings, so defaults registered with a richer
//! type are converted once, when they are registered. The conversion is explicit:
//! one variant per supported type plus [`DefaultValue::Unsupported`], which always
//! renders as the empty string.

use chrono::{DateTime, Utc};
use std::time::Duration;
use url::Url;

/// A default configuration value prior to its conversion to a string.
///
/// Most callers never name this type directly; the `From` impls let
/// [`DefaultSource::with`](crate::adapters::DefaultSource::with) accept plain
/// values.
///
/// ```
/// use layercfg::domain::DefaultValue;
/// use std::time::Duration;
///
/// assert_eq!(DefaultValue::from(-5i8).to_config_string(), "-5");
/// assert_eq!(DefaultValue::from(1.2345678901234567f64).to_config_string(), "1.2345678901234567");
/// assert_eq!(DefaultValue::from(Duration::from_secs(90)).to_config_string(), "1m 30s");
/// assert_eq!(DefaultValue::Unsupported.to_config_string(), "");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum DefaultValue {
    /// A string, used as-is.
    Str(String),
    /// A boolean, rendered as `true` or `false`.
    Bool(bool),
    /// Any signed integer.
    Int(i64),
    /// Any unsigned integer.
    Uint(u64),
    /// A 64-bit float, rendered at full precision without an exponent.
    Float(f64),
    /// A 32-bit float, rendered at 32-bit precision.
    Float32(f32),
    /// A URL, rendered in its serialized form.
    Url(Url),
    /// A duration, rendered in the humantime format read back by `Reader::duration`.
    Duration(Duration),
    /// A point in time, rendered as RFC 3339.
    Time(DateTime<Utc>),
    /// A value of a type without a string form.
    Unsupported,
}

impl DefaultValue {
    /// Converts the value to the string a source will return for it.
    pub fn to_config_string(&self) -> String {
        match self {
            DefaultValue::Str(s) => s.clone(),
            DefaultValue::Bool(b) => b.to_string(),
            DefaultValue::Int(i) => i.to_string(),
            DefaultValue::Uint(u) => u.to_string(),
            DefaultValue::Float(f) => f.to_string(),
            DefaultValue::Float32(f) => f.to_string(),
            DefaultValue::Url(url) => url.to_string(),
            DefaultValue::Duration(d) => humantime::format_duration(*d).to_string(),
            DefaultValue::Time(t) => t.to_rfc3339(),
            DefaultValue::Unsupported => String::new(),
        }
    }
}

impl From<String> for DefaultValue {
    fn from(value: String) -> Self {
        DefaultValue::Str(value)
    }
}

impl From<&str> for DefaultValue {
    fn from(value: &str) -> Self {
        DefaultValue::Str(value.to_string())
    }
}

impl From<bool> for DefaultValue {
    fn from(value: bool) -> Self {
        DefaultValue::Bool(value)
    }
}

macro_rules! impl_from_int {
    ($variant:ident, $wide:ty, $($t:ty),+) => {
        $(
            impl From<$t> for DefaultValue {
                fn from(value: $t) -> Self {
                    DefaultValue::$variant(<$wide>::from(value))
                }
            }
        )+
    };
}

impl_from_int!(Int, i64, i8, i16, i32, i64);
impl_from_int!(Uint, u64, u8, u16, u32, u64);

impl From<isize> for DefaultValue {
    fn from(value: isize) -> Self {
        DefaultValue::Int(value as i64)
    }
}

impl From<usize> for DefaultValue {
    fn from(value: usize) -> Self {
        DefaultValue::Uint(value as u64)
    }
}

impl From<f64> for DefaultValue {
    fn from(value: f64) -> Self {
        DefaultValue::Float(value)
    }
}

impl From<f32> for DefaultValue {
    fn from(value: f32) -> Self {
        DefaultValue::Float32(value)
    }
}

impl From<Url> for DefaultValue {
    fn from(value: Url) -> Self {
        DefaultValue::Url(value)
    }
}

impl From<&Url> for DefaultValue {
    fn from(value: &Url) -> Self {
        DefaultValue::Url(value.clone())
    }
}

impl From<Duration> for DefaultValue {
    fn from(value: Duration) -> Self {
        DefaultValue::Duration(value)
    }
}

impl From<DateTime<Utc>> for DefaultValue {
    fn from(value: DateTime<Utc>) -> Self {
        DefaultValue::Time(value)
    }
}
