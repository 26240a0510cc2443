use std::collections::HashSet;
use std::rc::{Rc, Weak};

use crate::runner::ds::env_record::GlobalBindings;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::{JsObjectType, ObjectKind, PropertyDescriptor};
use crate::runner::ds::operations::type_conversion::{to_number, to_string};
use crate::runner::ds::value::JsValue;

pub fn upgrade_namespace(ns: &Weak<dyn GlobalBindings>) -> Result<Rc<dyn GlobalBindings>, JErrorType> {
    ns.upgrade().ok_or_else(|| {
        JErrorType::TypeError("namespace backing this object has been dropped".to_string())
    })
}

/// Canonical array index form of `key`, if any.
/// Largest length an array may have.
pub const MAX_ARRAY_LENGTH: u64 = u32::MAX as u64;

/// Arrays are stored densely; longer ones are refused rather than allocated.
pub const MAX_DENSE_ARRAY_LENGTH: usize = 1 << 24;

/// Validates a requested array length.
pub fn checked_array_length(n: f64) -> Result<usize, JErrorType> {
    if n.is_nan() || n < 0.0 || n.fract() != 0.0 || n > MAX_ARRAY_LENGTH as f64 {
        return Err(JErrorType::RangeError("Invalid array length".to_string()));
    }
    if n > MAX_DENSE_ARRAY_LENGTH as f64 {
        return Err(JErrorType::RangeError(format!(
            "Array length {} exceeds the supported maximum of {}",
            n, MAX_DENSE_ARRAY_LENGTH
        )));
    }
    Ok(n as usize)
}

pub fn array_index(key: &str) -> Option<usize> {
    if key.is_empty() || (key.len() > 1 && key.starts_with('0')) {
        return None;
    }
    if key.bytes().all(|b| b.is_ascii_digit()) {
        key.parse::<usize>().ok()
    } else {
        None
    }
}

pub fn get(o: &JsObjectType, key: &str) -> Result<JsValue, JErrorType> {
    let ns = o.borrow().namespace();
    if let Some(ns) = ns {
        return upgrade_namespace(&ns)?.get_binding_value(key);
    }
    let mut current = o.clone();
    loop {
        let next = {
            let obj = current.borrow();
            match &obj.kind {
                ObjectKind::Array(items) => {
                    if key == "length" {
                        return Ok(JsValue::integer(items.len() as i64));
                    }
                    if let Some(i) = array_index(key) {
                        return Ok(items.get(i).cloned().unwrap_or(JsValue::Undefined));
                    }
                }
                ObjectKind::Function(f) => {
                    if key == "name" && !obj.has_own_property(key) {
                        return Ok(JsValue::String(f.name.to_string()));
                    }
                }
                _ => {}
            }
            if let Some(d) = obj.get_own_property(key) {
                return Ok(d.value.clone());
            }
            match &obj.prototype {
                Some(p) => p.clone(),
                None => return Ok(JsValue::Undefined),
            }
        };
        current = next;
    }
}

/// Property read on any value. Primitives other than strings have no own properties.
pub fn get_v(v: &JsValue, key: &str) -> Result<JsValue, JErrorType> {
    match v {
        JsValue::Object(o) => get(o, key),
        JsValue::String(s) => {
            if key == "length" {
                Ok(JsValue::integer(s.chars().count() as i64))
            } else if let Some(i) = array_index(key) {
                Ok(s.chars()
                    .nth(i)
                    .map(|c| JsValue::String(c.to_string()))
                    .unwrap_or(JsValue::Undefined))
            } else {
                Ok(JsValue::Undefined)
            }
        }
        JsValue::Undefined | JsValue::Null => Err(JErrorType::TypeError(format!(
            "Cannot read properties of {} (reading '{}')",
            to_string(v),
            key
        ))),
        _ => Ok(JsValue::Undefined),
    }
}

pub fn set(o: &JsObjectType, key: &str, value: JsValue) -> Result<(), JErrorType> {
    let ns = o.borrow().namespace();
    if let Some(ns) = ns {
        return upgrade_namespace(&ns)?.set_mutable_binding(key, value);
    }
    let mut obj = o.borrow_mut();
    if let ObjectKind::Array(items) = &mut obj.kind {
        if key == "length" {
            let n = checked_array_length(to_number(&value).as_f64())?;
            items.resize(n, JsValue::Undefined);
            return Ok(());
        }
        if let Some(i) = array_index(key) {
            if i >= items.len() {
                let len = checked_array_length(i as f64 + 1.0)?;
                items.resize(len, JsValue::Undefined);
            }
            items[i] = value;
            return Ok(());
        }
    }
    let existing = obj.get_own_property(key).cloned();
    match existing {
        Some(d) if !d.writable => Err(JErrorType::TypeError(format!(
            "Cannot assign to read only property '{}' of object",
            key
        ))),
        Some(mut d) => {
            d.value = value;
            obj.define_own_property(key, d);
            Ok(())
        }
        None => {
            obj.put(key, value);
            Ok(())
        }
    }
}

pub fn set_v(v: &JsValue, key: &str, value: JsValue) -> Result<(), JErrorType> {
    match v {
        JsValue::Object(o) => set(o, key, value),
        JsValue::Undefined | JsValue::Null => Err(JErrorType::TypeError(format!(
            "Cannot set properties of {} (setting '{}')",
            to_string(v),
            key
        ))),
        // Writes to primitive wrappers are lost.
        _ => Ok(()),
    }
}

pub fn has_own_property(o: &JsObjectType, key: &str) -> Result<bool, JErrorType> {
    let ns = o.borrow().namespace();
    if let Some(ns) = ns {
        return Ok(upgrade_namespace(&ns)?.has_property(key));
    }
    let obj = o.borrow();
    if let ObjectKind::Array(items) = &obj.kind {
        if key == "length" {
            return Ok(true);
        }
        if let Some(i) = array_index(key) {
            return Ok(i < items.len());
        }
    }
    Ok(obj.has_own_property(key))
}

/// The `in` operator.
pub fn has_property(v: &JsValue, key: &str) -> Result<bool, JErrorType> {
    let o = match v {
        JsValue::Object(o) => o.clone(),
        _ => {
            return Err(JErrorType::TypeError(format!(
                "Cannot use 'in' operator to search for '{}' in {}",
                key,
                to_string(v)
            )))
        }
    };
    let mut current = Some(o);
    while let Some(obj) = current {
        if has_own_property(&obj, key)? {
            return Ok(true);
        }
        current = obj.borrow().prototype.clone();
    }
    Ok(false)
}

pub fn delete(o: &JsObjectType, key: &str) -> Result<bool, JErrorType> {
    let ns = o.borrow().namespace();
    if let Some(ns) = ns {
        return upgrade_namespace(&ns)?.delete_binding(key);
    }
    let mut obj = o.borrow_mut();
    if let ObjectKind::Array(items) = &mut obj.kind {
        if let Some(i) = array_index(key) {
            if i < items.len() {
                items[i] = JsValue::Undefined;
            }
            return Ok(true);
        }
    }
    let configurable = obj.get_own_property(key).map(|d| d.configurable);
    match configurable {
        Some(false) => Err(JErrorType::TypeError(format!(
            "Cannot delete property '{}' of object",
            key
        ))),
        Some(true) => {
            obj.remove_own_property(key);
            Ok(true)
        }
        None => Ok(true),
    }
}

pub fn define_hidden(o: &JsObjectType, key: &str, value: JsValue) {
    o.borrow_mut()
        .define_own_property(key, PropertyDescriptor::hidden(value));
}

/// Own enumerable keys: array indices first, then named properties in insertion order.
pub fn own_enumerable_keys(o: &JsObjectType) -> Result<Vec<String>, JErrorType> {
    let ns = o.borrow().namespace();
    if let Some(ns) = ns {
        return Ok(upgrade_namespace(&ns)?.own_keys());
    }
    let obj = o.borrow();
    let mut keys = vec![];
    if let ObjectKind::Array(items) = &obj.kind {
        keys.extend((0..items.len()).map(|i| i.to_string()));
    }
    keys.extend(obj.own_enumerable_keys());
    Ok(keys)
}

/// Keys visited by `for-in`, walking the prototype chain.
pub fn enumerable_keys(v: &JsValue) -> Result<Vec<String>, JErrorType> {
    match v {
        JsValue::Object(o) => {
            let mut seen = HashSet::new();
            let mut keys = vec![];
            let mut current = Some(o.clone());
            while let Some(obj) = current {
                for k in own_enumerable_keys(&obj)? {
                    if seen.insert(k.clone()) {
                        keys.push(k);
                    }
                }
                current = obj.borrow().prototype.clone();
            }
            Ok(keys)
        }
        JsValue::String(s) => Ok((0..s.chars().count()).map(|i| i.to_string()).collect()),
        _ => Ok(vec![]),
    }
}
