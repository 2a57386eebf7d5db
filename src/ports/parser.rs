// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration parser trait definition.
//!
//! This module defines the `ConfigParser` trait, which provides an interface for
//! parsing configuration documents into the multi-valued map sources serve from.

use crate::domain::Result;
use std::collections::HashMap;

/// A trait for parsing configuration documents.
///
/// Parsers turn raw content into a flat map from key to an ordered list of string
/// values. A key that maps to an empty list is still present.
///
/// # Examples
///
/// ```rust
/// use layercfg::ports::ConfigParser;
/// use layercfg::domain::Result;
/// use std::collections::HashMap;
///
/// struct LineParser;
///
/// impl ConfigParser for LineParser {
///     fn parse(&self, content: &str) -> Result<HashMap<String, Vec<String>>> {
///         Ok(content
///             .lines()
///             .filter_map(|line| line.split_once('='))
///             .map(|(k, v)| (k.to_string(), v.split(',').map(String::from).collect()))
///             .collect())
///     }
/// }
///
/// let parsed = LineParser.parse("hosts=a,b").unwrap();
/// assert_eq!(parsed["hosts"], vec!["a", "b"]);
/// ```
pub trait ConfigParser {
    /// Parses configuration content into a flat multi-valued map.
    ///
    /// # Returns
    ///
    /// * `Ok(HashMap<String, Vec<String>>)` - The parsed configuration
    /// * `Err(ConfigError::ParseError)` - The content is malformed
    fn parse(&self, content: &str) -> Result<HashMap<String, Vec<String>>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestParser;

    impl ConfigParser for TestParser {
        fn parse(&self, _content: &str) -> Result<HashMap<String, Vec<String>>> {
            let mut map = HashMap::new();
            map.insert("test.key".to_string(), vec!["test.value".to_string()]);
            map.insert("empty".to_string(), vec![]);
            Ok(map)
        }
    }

    #[test]
    fn test_parser_parse() {
        let result = TestParser.parse("dummy content").unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result["test.key"], vec!["test.value".to_string()]);
        assert!(result["empty"].is_empty());
    }
}
