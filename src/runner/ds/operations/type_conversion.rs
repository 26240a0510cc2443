use crate::runner::ds::object::{JsObjectType, ObjectKind};
use crate::runner::ds::value::{JsNumberType, JsValue};

pub const TYPE_STR_UNDEFINED: &str = "undefined";
pub const TYPE_STR_NULL: &str = "null";
pub const TYPE_STR_BOOLEAN: &str = "boolean";
pub const TYPE_STR_STRING: &str = "string";
pub const TYPE_STR_NUMBER: &str = "number";
pub const TYPE_STR_OBJECT: &str = "object";
pub const TYPE_STR_FUNCTION: &str = "function";

/// Internal type tag. `null` keeps its own tag here; `typeof` maps it to "object".
pub fn get_type(a: &JsValue) -> &'static str {
    match a {
        JsValue::Undefined => TYPE_STR_UNDEFINED,
        JsValue::Null => TYPE_STR_NULL,
        JsValue::Boolean(_) => TYPE_STR_BOOLEAN,
        JsValue::String(_) => TYPE_STR_STRING,
        JsValue::Number(_) => TYPE_STR_NUMBER,
        JsValue::Object(o) => {
            if (**o).borrow().is_callable() {
                TYPE_STR_FUNCTION
            } else {
                TYPE_STR_OBJECT
            }
        }
    }
}

pub fn type_of(a: &JsValue) -> &'static str {
    match a {
        JsValue::Null => TYPE_STR_OBJECT,
        _ => get_type(a),
    }
}

pub fn to_boolean(v: &JsValue) -> bool {
    match v {
        JsValue::Undefined | JsValue::Null => false,
        JsValue::Boolean(b) => *b,
        JsValue::String(s) => !s.is_empty(),
        JsValue::Number(n) => match n {
            JsNumberType::Integer(i) => *i != 0,
            JsNumberType::Float(f) => *f != 0.0,
            JsNumberType::NaN => false,
            JsNumberType::PositiveInfinity | JsNumberType::NegativeInfinity => true,
        },
        JsValue::Object(_) => true,
    }
}

/// Primitive form of an object. User-defined `toString`/`valueOf` are not consulted.
pub fn to_primitive(v: &JsValue) -> JsValue {
    match v {
        JsValue::Object(o) => JsValue::String(object_to_string(o)),
        _ => v.clone(),
    }
}

fn object_to_string(o: &JsObjectType) -> String {
    let obj = o.borrow();
    match &obj.kind {
        ObjectKind::Array(items) => items
            .iter()
            .map(|i| match i {
                JsValue::Undefined | JsValue::Null => String::new(),
                _ => to_string(i),
            })
            .collect::<Vec<_>>()
            .join(","),
        ObjectKind::Function(f) => f.source_text(),
        ObjectKind::Error => {
            let field = |key: &str| {
                let mut current = Some(o.clone());
                while let Some(c) = current {
                    if let Some(d) = c.borrow().get_own_property(key) {
                        return to_string(&d.value);
                    }
                    current = c.borrow().prototype.clone();
                }
                String::new()
            };
            let name = field("name");
            let message = field("message");
            if message.is_empty() {
                name
            } else {
                format!("{}: {}", name, message)
            }
        }
        ObjectKind::Namespace(_) => "[object Window]".to_string(),
        ObjectKind::Ordinary => "[object Object]".to_string(),
    }
}

pub fn to_string(v: &JsValue) -> String {
    match v {
        JsValue::Undefined => TYPE_STR_UNDEFINED.to_string(),
        JsValue::Null => TYPE_STR_NULL.to_string(),
        JsValue::Boolean(b) => b.to_string(),
        JsValue::String(s) => s.to_string(),
        JsValue::Number(n) => n.to_string(),
        JsValue::Object(o) => object_to_string(o),
    }
}

pub fn string_to_number(s: &str) -> JsNumberType {
    let t = s.trim();
    if t.is_empty() {
        return JsNumberType::Integer(0);
    }
    if let Some(hex) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        return match i64::from_str_radix(hex, 16) {
            Ok(i) => JsNumberType::Integer(i),
            Err(_) => JsNumberType::NaN,
        };
    }
    match t {
        "Infinity" | "+Infinity" => return JsNumberType::PositiveInfinity,
        "-Infinity" => return JsNumberType::NegativeInfinity,
        _ => {}
    }
    // Rust accepts "inf"/"nan" spellings that JS does not.
    if t.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return JsNumberType::NaN;
    }
    match t.parse::<f64>() {
        Ok(f) => JsNumberType::from_f64(f),
        Err(_) => JsNumberType::NaN,
    }
}

pub fn to_number(v: &JsValue) -> JsNumberType {
    match v {
        JsValue::Undefined => JsNumberType::NaN,
        JsValue::Null => JsNumberType::Integer(0),
        JsValue::Boolean(b) => JsNumberType::Integer(if *b { 1 } else { 0 }),
        JsValue::String(s) => string_to_number(s),
        JsValue::Number(n) => n.clone(),
        JsValue::Object(_) => to_number(&to_primitive(v)),
    }
}

/// Integer conversion used by native functions for counts and indices.
pub fn to_integer(v: &JsValue) -> i64 {
    match to_number(v) {
        JsNumberType::Integer(i) => i,
        JsNumberType::Float(f) => f.trunc() as i64,
        JsNumberType::NaN => 0,
        JsNumberType::PositiveInfinity => i64::MAX,
        JsNumberType::NegativeInfinity => i64::MIN,
    }
}

/// Rendering used by `console.*` and the CLI: strings unquoted, arrays and
/// plain objects shown structurally one level deep.
pub fn to_display_string(v: &JsValue) -> String {
    match v {
        JsValue::Object(o) => {
            let obj = o.borrow();
            match &obj.kind {
                ObjectKind::Array(items) => format!(
                    "[{}]",
                    items.iter().map(display_nested).collect::<Vec<_>>().join(", ")
                ),
                ObjectKind::Ordinary => {
                    let parts = obj
                        .own_enumerable_keys()
                        .into_iter()
                        .map(|k| {
                            let value = obj
                                .get_own_property(&k)
                                .map(|d| display_nested(&d.value))
                                .unwrap_or_default();
                            format!("{}: {}", k, value)
                        })
                        .collect::<Vec<_>>();
                    if parts.is_empty() {
                        "{}".to_string()
                    } else {
                        format!("{{ {} }}", parts.join(", "))
                    }
                }
                ObjectKind::Function(f) => format!("[Function: {}]", f.name),
                _ => to_string(v),
            }
        }
        _ => to_string(v),
    }
}

fn display_nested(v: &JsValue) -> String {
    match v {
        JsValue::String(s) => format!("'{}'", s),
        JsValue::Object(o) => match &o.borrow().kind {
            ObjectKind::Array(_) => "[Array]".to_string(),
            ObjectKind::Function(f) => format!("[Function: {}]", f.name),
            ObjectKind::Ordinary => "[Object]".to_string(),
            _ => "[object]".to_string(),
        },
        _ => to_string(v),
    }
}
