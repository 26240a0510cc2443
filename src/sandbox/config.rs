//! Sandbox configuration: isolation mode, injection overlay and the callable
//! classification table. Loadable from JSON.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::runner::ds::object::PropertyDescriptor;
use crate::runner::ds::value::JsValue;
use crate::runner::host::Intrinsics;
use crate::sandbox::error::SandboxError;

lazy_static! {
    /// Names that resolve to the sandbox's own reference object.
    pub static ref IDENTITY_NAMES: HashSet<&'static str> =
        ["window", "self", "top", "globalThis", "parent"].iter().cloned().collect();

    /// Host bindings whose treatment is known up front. Anything not listed
    /// here or in the caller's table goes through the source-text heuristic.
    pub static ref DEFAULT_CLASSIFICATION: HashMap<&'static str, Classification> = {
        let mut m = HashMap::new();
        for name in [
            "Object", "Array", "Function", "String", "Number", "Boolean",
            "Error", "TypeError", "ReferenceError", "RangeError", "SyntaxError",
        ].iter() {
            m.insert(*name, Classification::Preserve);
        }
        for name in [
            "parseInt", "parseFloat", "isNaN", "dispatchEvent", "addEventListener",
            "removeEventListener", "setTimeout", "setInterval", "clearTimeout", "clearInterval",
        ].iter() {
            m.insert(*name, Classification::Rebind);
        }
        m
    };
}

/// How a callable read from the host is handed to hosted code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    /// Bind its receiver to the host global.
    Rebind,
    /// Return it unmodified (constructors and the like).
    Preserve,
}

/// Caller-declared classification by binding name. Entries here take
/// precedence over [`DEFAULT_CLASSIFICATION`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallableClassification {
    entries: BTreeMap<String, Classification>,
}

impl CallableClassification {
    pub fn new() -> Self {
        CallableClassification::default()
    }

    pub fn with(mut self, name: impl Into<String>, classification: Classification) -> Self {
        self.insert(name, classification);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, classification: Classification) {
        self.entries.insert(name.into(), classification);
    }

    pub fn lookup(&self, name: &str) -> Option<Classification> {
        self.entries
            .get(name)
            .cloned()
            .or_else(|| DEFAULT_CLASSIFICATION.get(name).cloned())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Options fixed at sandbox construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SandboxOptions {
    /// `false` mirrors writes into the host global, `true` isolates strictly.
    pub multi_mode: bool,
    /// Read-only overlay consulted after the sandbox's own bindings.
    pub injection: BTreeMap<String, Value>,
    pub classification: CallableClassification,
}

impl SandboxOptions {
    pub fn multi() -> Self {
        SandboxOptions {
            multi_mode: true,
            ..SandboxOptions::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, SandboxError> {
        serde_json::from_str(json).map_err(|e| SandboxError::Config(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SandboxError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| SandboxError::Config(format!("{}: {}", path.display(), e)))?;
        SandboxOptions::from_json_str(&text)
    }
}

/// Converts a JSON configuration value into a hosted value.
pub fn json_to_js(value: &Value, intrinsics: &Intrinsics) -> JsValue {
    match value {
        Value::Null => JsValue::Null,
        Value::Bool(b) => JsValue::Boolean(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => JsValue::integer(i),
            None => JsValue::number(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => JsValue::String(s.to_string()),
        Value::Array(items) => {
            intrinsics.new_array(items.iter().map(|v| json_to_js(v, intrinsics)).collect())
        }
        Value::Object(map) => {
            let o = intrinsics.new_plain_object();
            {
                let mut obj = o.borrow_mut();
                for (k, v) in map {
                    obj.define_own_property(k.as_str(), PropertyDescriptor::data(json_to_js(v, intrinsics)));
                }
            }
            JsValue::Object(o)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ds::operations::object::get_v;
    use crate::runner::host::HostEnvironment;

    #[test]
    fn test_options_default_to_single_mode() {
        let options = SandboxOptions::from_json_str("{}").unwrap();
        assert!(!options.multi_mode);
        assert!(options.injection.is_empty());
        assert!(options.classification.is_empty());
    }

    #[test]
    fn test_options_parse_camel_case_keys() {
        let options = SandboxOptions::from_json_str(
            r#"{"multiMode": true, "injection": {"appName": "guest"}, "classification": {"Widget": "rebind"}}"#,
        )
        .unwrap();
        assert!(options.multi_mode);
        assert_eq!(options.injection.get("appName"), Some(&Value::String("guest".to_string())));
        assert_eq!(options.classification.lookup("Widget"), Some(Classification::Rebind));
    }

    #[test]
    fn test_bad_json_is_config_error() {
        match SandboxOptions::from_json_str("{\"multiMode\": 3}") {
            Err(SandboxError::Config(_)) => {}
            other => panic!("expected config error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_caller_table_overrides_defaults() {
        let table = CallableClassification::new().with("Object", Classification::Rebind);
        assert_eq!(table.lookup("Object"), Some(Classification::Rebind));
        assert_eq!(table.lookup("Array"), Some(Classification::Preserve));
        assert_eq!(table.lookup("parseInt"), Some(Classification::Rebind));
        assert_eq!(table.lookup("myHelper"), None);
    }

    #[test]
    fn test_json_to_js_nested() {
        let host = HostEnvironment::new();
        let v: Value = serde_json::from_str(r#"{"a": [1, 2.5, "x"], "b": {"c": true}, "d": null}"#).unwrap();
        let js = json_to_js(&v, host.intrinsics());
        let a = get_v(&js, "a").unwrap();
        assert_eq!(get_v(&a, "length").unwrap(), JsValue::integer(3));
        assert_eq!(get_v(&a, "1").unwrap(), JsValue::number(2.5));
        let b = get_v(&js, "b").unwrap();
        assert_eq!(get_v(&b, "c").unwrap(), JsValue::Boolean(true));
        assert_eq!(get_v(&js, "d").unwrap(), JsValue::Null);
    }
}
