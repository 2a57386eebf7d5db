// SPDX-License-Identifier: MIT OR Apache-2.0

//! Functions available to templates in addition to the engine's builtins.

use crate::ports::SecretFetcher;
use crate::service::template::resolve_field;
use crate::service::Reader;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use gtmpl::{Func, FuncError, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Secret store address and token, discovered from the reader on first use.
#[derive(Debug, Default)]
pub(crate) struct Credentials {
    address: String,
    token: String,
}

/// What the `secret` function needs while a template renders.
#[derive(Clone)]
pub(crate) struct SecretContext {
    pub(crate) reader: Arc<Reader>,
    pub(crate) fetcher: Arc<dyn SecretFetcher>,
    pub(crate) credentials: Arc<Mutex<Credentials>>,
}

thread_local! {
    static SECRETS: RefCell<Option<SecretContext>> = const { RefCell::new(None) };
}

/// Makes a [`SecretContext`] visible to `secret` on this thread until dropped.
pub(crate) struct SecretScope {
    previous: Option<SecretContext>,
}

impl SecretScope {
    pub(crate) fn enter(context: SecretContext) -> Self {
        let previous = SECRETS.with(|slot| slot.replace(Some(context)));
        Self { previous }
    }
}

impl Drop for SecretScope {
    fn drop(&mut self) {
        let previous = self.previous.take();
        SECRETS.with(|slot| *slot.borrow_mut() = previous);
    }
}

/// The functions registered on every template.
///
/// Argument order follows the usual template convention: the piped value comes
/// last, so `{{ .name | replace "-" "_" }}` works.
pub(crate) fn library() -> Vec<(&'static str, Func)> {
    vec![
        ("upper", upper as Func),
        ("lower", lower as Func),
        ("trim", trim as Func),
        ("trimPrefix", trim_prefix as Func),
        ("trimSuffix", trim_suffix as Func),
        ("replace", replace as Func),
        ("contains", contains as Func),
        ("hasPrefix", has_prefix as Func),
        ("hasSuffix", has_suffix as Func),
        ("split", split as Func),
        ("splitList", split as Func),
        ("join", join as Func),
        ("quote", quote as Func),
        ("repeat", repeat as Func),
        ("b64enc", b64enc as Func),
        ("b64dec", b64dec as Func),
        ("toJson", to_json as Func),
        ("default", default as Func),
        ("required", required as Func),
        ("env", env as Func),
        ("secret", secret as Func),
    ]
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Nil | Value::NoValue => String::new(),
        other => other.to_string(),
    }
}

fn arg(name: &str, args: &[Value], index: usize) -> Result<String, FuncError> {
    args.get(index)
        .map(text)
        .ok_or_else(|| FuncError::Generic(format!("{} requires {} arguments", name, index + 1)))
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Nil | Value::NoValue => true,
        Value::String(s) => s.is_empty(),
        Value::Bool(b) => !b,
        Value::Array(items) => items.is_empty(),
        Value::Map(map) | Value::Object(map) => map.is_empty(),
        Value::Number(_) => value.to_string() == "0",
        _ => false,
    }
}

fn upper(args: &[Value]) -> Result<Value, FuncError> {
    Ok(Value::String(arg("upper", args, 0)?.to_uppercase()))
}

fn lower(args: &[Value]) -> Result<Value, FuncError> {
    Ok(Value::String(arg("lower", args, 0)?.to_lowercase()))
}

fn trim(args: &[Value]) -> Result<Value, FuncError> {
    Ok(Value::String(arg("trim", args, 0)?.trim().to_string()))
}

/// `trimPrefix PREFIX STRING`
fn trim_prefix(args: &[Value]) -> Result<Value, FuncError> {
    let prefix = arg("trimPrefix", args, 0)?;
    let value = arg("trimPrefix", args, 1)?;
    let trimmed = value.strip_prefix(prefix.as_str()).unwrap_or(&value);
    Ok(Value::String(trimmed.to_string()))
}

/// `trimSuffix SUFFIX STRING`
fn trim_suffix(args: &[Value]) -> Result<Value, FuncError> {
    let suffix = arg("trimSuffix", args, 0)?;
    let value = arg("trimSuffix", args, 1)?;
    let trimmed = value.strip_suffix(suffix.as_str()).unwrap_or(&value);
    Ok(Value::String(trimmed.to_string()))
}

/// `replace OLD NEW STRING` replaces every occurrence.
fn replace(args: &[Value]) -> Result<Value, FuncError> {
    let old = arg("replace", args, 0)?;
    let new = arg("replace", args, 1)?;
    Ok(Value::String(arg("replace", args, 2)?.replace(&old, &new)))
}

/// `contains SUBSTRING STRING`
fn contains(args: &[Value]) -> Result<Value, FuncError> {
    let needle = arg("contains", args, 0)?;
    Ok(Value::Bool(arg("contains", args, 1)?.contains(&needle)))
}

fn has_prefix(args: &[Value]) -> Result<Value, FuncError> {
    let prefix = arg("hasPrefix", args, 0)?;
    Ok(Value::Bool(arg("hasPrefix", args, 1)?.starts_with(&prefix)))
}

fn has_suffix(args: &[Value]) -> Result<Value, FuncError> {
    let suffix = arg("hasSuffix", args, 0)?;
    Ok(Value::Bool(arg("hasSuffix", args, 1)?.ends_with(&suffix)))
}

/// `split SEPARATOR STRING` yields a list.
fn split(args: &[Value]) -> Result<Value, FuncError> {
    let separator = arg("split", args, 0)?;
    let value = arg("split", args, 1)?;
    if separator.is_empty() {
        return Err(FuncError::Generic("split requires a separator".to_string()));
    }
    Ok(Value::Array(
        value
            .split(separator.as_str())
            .map(|part| Value::String(part.to_string()))
            .collect(),
    ))
}

/// `join SEPARATOR LIST`. A non-list value is joined as a single element.
fn join(args: &[Value]) -> Result<Value, FuncError> {
    let separator = arg("join", args, 0)?;
    let joined = match args.get(1) {
        Some(Value::Array(items)) => {
            let items: Vec<String> = items.iter().map(text).collect();
            items.join(separator.as_str())
        }
        Some(value) => text(value),
        None => return Err(FuncError::Generic("join requires 2 arguments".to_string())),
    };
    Ok(Value::String(joined))
}

fn b64enc(args: &[Value]) -> Result<Value, FuncError> {
    Ok(Value::String(BASE64.encode(arg("b64enc", args, 0)?)))
}

fn b64dec(args: &[Value]) -> Result<Value, FuncError> {
    let encoded = arg("b64dec", args, 0)?;
    let bytes = BASE64
        .decode(encoded.trim())
        .map_err(|e| FuncError::Generic(format!("b64dec: {}", e)))?;
    String::from_utf8(bytes)
        .map(Value::String)
        .map_err(|e| FuncError::Generic(format!("b64dec: {}", e)))
}

fn to_serde(value: &Value) -> serde_json::Value {
    match value {
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Number(_) => {
            serde_json::from_str(&value.to_string()).unwrap_or(serde_json::Value::Null)
        }
        Value::Array(items) => serde_json::Value::Array(items.iter().map(to_serde).collect()),
        Value::Map(map) | Value::Object(map) => serde_json::Value::Object(
            map.iter()
                .map(|(key, value)| (key.clone(), to_serde(value)))
                .collect(),
        ),
        _ => serde_json::Value::Null,
    }
}

/// `toJson VALUE` encodes VALUE as compact JSON. Object keys come out sorted.
fn to_json(args: &[Value]) -> Result<Value, FuncError> {
    let value = args
        .first()
        .ok_or_else(|| FuncError::Generic("toJson requires 1 arguments".to_string()))?;
    Ok(Value::String(to_serde(value).to_string()))
}

/// `required MESSAGE VALUE` fails the render with MESSAGE when VALUE is empty.
fn required(args: &[Value]) -> Result<Value, FuncError> {
    let message = arg("required", args, 0)?;
    match args.get(1) {
        Some(value) if !is_empty(value) => Ok(value.clone()),
        _ => Err(FuncError::Generic(message)),
    }
}

/// Quotes every argument as a JSON string, separated by spaces.
fn quote(args: &[Value]) -> Result<Value, FuncError> {
    let quoted: Vec<String> = args
        .iter()
        .map(|value| serde_json::Value::String(text(value)).to_string())
        .collect();
    Ok(Value::String(quoted.join(" ")))
}

/// `repeat COUNT STRING`
fn repeat(args: &[Value]) -> Result<Value, FuncError> {
    let count = arg("repeat", args, 0)?;
    let count: usize = count
        .parse()
        .map_err(|_| FuncError::Generic(format!("repeat count is not a number: {}", count)))?;
    Ok(Value::String(arg("repeat", args, 1)?.repeat(count)))
}

/// `default FALLBACK VALUE` yields VALUE unless it is empty.
fn default(args: &[Value]) -> Result<Value, FuncError> {
    let fallback = args
        .first()
        .cloned()
        .ok_or_else(|| FuncError::Generic("default requires a fallback".to_string()))?;
    match args.get(1) {
        Some(value) if !is_empty(value) => Ok(value.clone()),
        _ => Ok(fallback),
    }
}

fn env(args: &[Value]) -> Result<Value, FuncError> {
    let name = arg("env", args, 0)?;
    Ok(Value::String(std::env::var(name).unwrap_or_default()))
}

/// Converts a secret document value. Numbers become strings, like every other
/// value a template sees.
fn from_json(value: serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Nil,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => Value::String(n.to_string()),
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(items) => Value::Array(items.into_iter().map(from_json).collect()),
        serde_json::Value::Object(map) => Value::Map(
            map.into_iter()
                .map(|(key, value)| (key, from_json(value)))
                .collect::<HashMap<_, _>>(),
        ),
    }
}

/// `secret PATH` fetches the secret document at PATH and yields its data.
///
/// The store address and token come from the `vault_addr` and `vault_token`
/// configuration keys, looked up the first time they are needed.
fn secret(args: &[Value]) -> Result<Value, FuncError> {
    let path = args.first().map(text).unwrap_or_default();
    if path.is_empty() {
        return Ok(Value::Map(HashMap::new()));
    }

    let context = SECRETS
        .with(|slot| slot.borrow().clone())
        .ok_or_else(|| FuncError::Generic("secret called outside of a template run".to_string()))?;

    let (address, token) = {
        let mut credentials = context
            .credentials
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if credentials.address.is_empty() {
            credentials.address = first_value(&context.reader, "vault_addr");
        }
        if credentials.token.is_empty() {
            credentials.token = first_value(&context.reader, "vault_token");
        }
        (credentials.address.clone(), credentials.token.clone())
    };

    let document = context
        .fetcher
        .fetch(&token, &address, &path)
        .map_err(|e| {
            FuncError::Generic(format!("No data from Vault: {} {}: {}", address, path, e))
        })?;
    Ok(from_json(serde_json::Value::Object(document.data)))
}

fn first_value(reader: &Reader, field: &str) -> String {
    resolve_field(reader, field)
        .and_then(|values| values.into_iter().next())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(value: &str) -> Value {
        Value::String(value.to_string())
    }

    #[test]
    fn test_string_functions() {
        assert_eq!(upper(&[s("abc")]).unwrap(), s("ABC"));
        assert_eq!(lower(&[s("ABC")]).unwrap(), s("abc"));
        assert_eq!(trim(&[s("  abc \n")]).unwrap(), s("abc"));
        assert_eq!(quote(&[s("a\"b")]).unwrap(), s(r#""a\"b""#));
        assert_eq!(repeat(&[s("3"), s("ab")]).unwrap(), s("ababab"));
        assert!(repeat(&[s("x"), s("ab")]).is_err());
        assert!(upper(&[]).is_err());
    }

    #[test]
    fn test_prefix_and_suffix() {
        assert_eq!(trim_prefix(&[s("v"), s("v1.2")]).unwrap(), s("1.2"));
        assert_eq!(trim_prefix(&[s("x"), s("v1.2")]).unwrap(), s("v1.2"));
        assert_eq!(trim_suffix(&[s(".json"), s("app.json")]).unwrap(), s("app"));
        assert_eq!(has_prefix(&[s("http"), s("https://a")]).unwrap(), Value::Bool(true));
        assert_eq!(has_suffix(&[s("/"), s("https://a")]).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_replace_and_contains() {
        assert_eq!(replace(&[s("-"), s("_"), s("a-b-c")]).unwrap(), s("a_b_c"));
        assert!(replace(&[s("-"), s("_")]).is_err());
        assert_eq!(contains(&[s("db"), s("prod-db-1")]).unwrap(), Value::Bool(true));
        assert_eq!(contains(&[s("cache"), s("prod-db-1")]).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_split_and_join() {
        assert_eq!(
            split(&[s(","), s("a,b,,c")]).unwrap(),
            Value::Array(vec![s("a"), s("b"), s(""), s("c")])
        );
        assert!(split(&[s(""), s("abc")]).is_err());

        let list = Value::Array(vec![s("a"), s("b")]);
        assert_eq!(join(&[s("|"), list]).unwrap(), s("a|b"));
        assert_eq!(join(&[s("|"), s("solo")]).unwrap(), s("solo"));
        assert!(join(&[s("|")]).is_err());
    }

    #[test]
    fn test_base64() {
        assert_eq!(b64enc(&[s("user:pass")]).unwrap(), s("dXNlcjpwYXNz"));
        assert_eq!(b64dec(&[s("dXNlcjpwYXNz")]).unwrap(), s("user:pass"));
        assert!(b64dec(&[s("not base64!")]).is_err());
    }

    #[test]
    fn test_to_json() {
        let mut map = HashMap::new();
        map.insert("b".to_string(), Value::Array(vec![s("x"), Value::Bool(true)]));
        map.insert("a".to_string(), Value::Nil);
        assert_eq!(
            to_json(&[Value::Map(map)]).unwrap(),
            s(r#"{"a":null,"b":["x",true]}"#)
        );
        assert_eq!(to_json(&[s("quo\"te")]).unwrap(), s(r#""quo\"te""#));
        assert!(to_json(&[]).is_err());
    }

    #[test]
    fn test_required() {
        assert_eq!(required(&[s("db host missing"), s("db")]).unwrap(), s("db"));
        let Err(FuncError::Generic(message)) = required(&[s("db host missing"), s("")]) else {
            panic!("expected an error");
        };
        assert_eq!(message, "db host missing");
        assert!(required(&[s("db host missing")]).is_err());
    }

    #[test]
    fn test_library_names_are_unique() {
        let names: std::collections::HashSet<_> =
            library().into_iter().map(|(name, _)| name).collect();
        assert_eq!(names.len(), library().len());
        assert!(names.contains("secret"));
    }

    #[test]
    fn test_default() {
        assert_eq!(default(&[s("fallback"), s("")]).unwrap(), s("fallback"));
        assert_eq!(default(&[s("fallback"), Value::NoValue]).unwrap(), s("fallback"));
        assert_eq!(default(&[s("fallback")]).unwrap(), s("fallback"));
        assert_eq!(default(&[s("fallback"), s("set")]).unwrap(), s("set"));
    }

    #[test]
    fn test_secret_without_path_is_empty() {
        assert_eq!(secret(&[s("")]).unwrap(), Value::Map(HashMap::new()));
    }

    #[test]
    fn test_secret_outside_run_fails() {
        assert!(secret(&[s("secret/app")]).is_err());
    }

    #[test]
    fn test_from_json() {
        let value = from_json(serde_json::json!({"n": 1.5, "list": ["a", null]}));
        let Value::Map(map) = value else {
            panic!("expected map");
        };
        assert_eq!(map["n"], s("1.5"));
        assert_eq!(map["list"], Value::Array(vec![s("a"), Value::Nil]));
    }
}
