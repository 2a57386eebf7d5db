// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration value type with type-safe conversions.
//!
//! Sources answer lookups with plain strings. `ConfigValue` wraps one of those
//! strings and converts it to the types the [`Reader`](crate::service::Reader)
//! accessors return. Every conversion failure is reported as
//! [`ConfigError::MalformedValue`].

use crate::domain::errors::{ConfigError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// A type-safe wrapper for a single configuration value.
///
/// # Examples
///
/// ```
/// use layercfg::domain::config_value::ConfigValue;
///
/// let value = ConfigValue::new("42".to_string());
/// assert_eq!(value.as_str(), "42");
/// assert_eq!(value.as_int("test-key").unwrap(), 42);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigValue(String);

impl ConfigValue {
    /// Creates a new `ConfigValue` from a `String`.
    pub fn new(value: String) -> Self {
        ConfigValue(value)
    }

    /// Returns the value as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Converts the value into a `String`.
    pub fn as_string(&self) -> String {
        self.0.clone()
    }

    /// Converts the value to a boolean.
    ///
    /// Recognizes exactly these spellings:
    /// - `true`: "1", "t", "T", "true", "TRUE", "True"
    /// - `false`: "0", "f", "F", "false", "FALSE", "False"
    ///
    /// Anything else, including "yes", "on" and mixed case such as "tRUE", is a
    /// malformed value.
    ///
    /// ```
    /// use layercfg::domain::config_value::ConfigValue;
    ///
    /// assert!(ConfigValue::from("T").as_bool("debug").unwrap());
    /// assert!(!ConfigValue::from("False").as_bool("debug").unwrap());
    /// assert!(ConfigValue::from("off").as_bool("debug").is_err());
    /// ```
    pub fn as_bool(&self, key: &str) -> Result<bool> {
        match self.0.as_str() {
            "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
            "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
            _ => self
                .0
                .parse::<bool>()
                .map_err(|e| ConfigError::from_parse_bool_error(key.to_string(), e)),
        }
    }

    /// Converts the value to an `i64`.
    pub fn as_int(&self, key: &str) -> Result<i64> {
        self.0
            .parse::<i64>()
            .map_err(|e| ConfigError::from_parse_int_error(key.to_string(), e))
    }

    /// Converts the value to a `u64`.
    pub fn as_uint(&self, key: &str) -> Result<u64> {
        self.0
            .parse::<u64>()
            .map_err(|e| ConfigError::from_parse_int_error(key.to_string(), e))
    }

    /// Converts the value to an `f64`.
    pub fn as_float(&self, key: &str) -> Result<f64> {
        self.0
            .parse::<f64>()
            .map_err(|e| ConfigError::from_parse_float_error(key.to_string(), e))
    }

    /// Parses the value as an absolute URL.
    ///
    /// ```
    /// use layercfg::domain::config_value::ConfigValue;
    ///
    /// let url = ConfigValue::from("http://www.example.com").as_url("site").unwrap();
    /// assert_eq!(url.host_str(), Some("www.example.com"));
    /// assert!(ConfigValue::from("%%%%%%").as_url("site").is_err());
    /// ```
    pub fn as_url(&self, key: &str) -> Result<Url> {
        self.parse::<Url>(key)
    }

    /// Parses the value as a human readable duration such as `5s` or `1h 30m`.
    ///
    /// ```
    /// use layercfg::domain::config_value::ConfigValue;
    /// use std::time::Duration;
    ///
    /// let value = ConfigValue::from("5s");
    /// assert_eq!(value.as_duration("timeout").unwrap(), Duration::from_secs(5));
    /// ```
    pub fn as_duration(&self, key: &str) -> Result<Duration> {
        humantime::parse_duration(&self.0).map_err(|e| ConfigError::MalformedValue {
            key: key.to_string(),
            target_type: "duration".to_string(),
            source: Box::new(e),
        })
    }

    /// Parses the value as a point in time using a `chrono` format string.
    ///
    /// Formats carrying an offset are converted to UTC. Formats without one are read
    /// as UTC, and date-only formats as midnight UTC.
    ///
    /// ```
    /// use layercfg::domain::config_value::ConfigValue;
    ///
    /// let value = ConfigValue::from("2015-09-15T11:29:00Z");
    /// let instant = value.as_time("started", "%Y-%m-%dT%H:%M:%SZ").unwrap();
    /// assert_eq!(instant.to_rfc3339(), "2015-09-15T11:29:00+00:00");
    /// ```
    pub fn as_time(&self, key: &str, format: &str) -> Result<DateTime<Utc>> {
        if let Ok(parsed) = DateTime::parse_from_str(&self.0, format) {
            return Ok(parsed.with_timezone(&Utc));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(&self.0, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
        NaiveDate::parse_from_str(&self.0, format)
            .map(|date| Utc.from_utc_datetime(&date.and_time(NaiveTime::default())))
            .map_err(|e| ConfigError::MalformedValue {
                key: key.to_string(),
                target_type: "time".to_string(),
                source: Box::new(e),
            })
    }

    /// Parses the value into any type that implements `FromStr`.
    pub fn parse<T>(&self, key: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        self.0
            .parse::<T>()
            .map_err(|e| ConfigError::MalformedValue {
                key: key.to_string(),
                target_type: std::any::type_name::<T>().to_string(),
                source: Box::new(e),
            })
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        ConfigValue(s)
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        ConfigValue(s.to_string())
    }
}

impl From<ConfigValue> for String {
    fn from(value: ConfigValue) -> Self {
        value.0
    }
}

impl AsRef<str> for ConfigValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
