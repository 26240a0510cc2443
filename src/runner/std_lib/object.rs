//! Object built-in.
//!
//! Provides the `Object` constructor, `Object.keys` and the
//! `Object.prototype` methods every ordinary object (the host global included)
//! inherits.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::{JsObjectType, ObjectKind};
use crate::runner::ds::operations::object::{has_own_property, own_enumerable_keys};
use crate::runner::ds::operations::type_conversion::to_string;
use crate::runner::ds::value::JsValue;
use crate::runner::host::types::{BuiltInObject, EvalContext};
use crate::runner::host::Intrinsics;

use super::{arg, define_global};

pub fn install(global: &JsObjectType, intrinsics: &Intrinsics) {
    let object = BuiltInObject::new("Object")
        .with_prototype(intrinsics.object_prototype.clone())
        .with_constructor(object_constructor)
        .add_method("keys", object_keys)
        .add_prototype_method("hasOwnProperty", object_has_own_property)
        .add_prototype_method("toString", object_to_string)
        .build(intrinsics);
    define_global(global, "Object", JsValue::Object(object));
}

/// Object constructor: objects pass through, everything else yields `{}`.
fn object_constructor(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    match arg(&args, 0) {
        v @ JsValue::Object(_) => Ok(v),
        _ => Ok(JsValue::Object(ctx.intrinsics().new_plain_object())),
    }
}

/// Object.keys
fn object_keys(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let keys = match arg(&args, 0) {
        JsValue::Object(o) => own_enumerable_keys(&o)?,
        JsValue::String(s) => (0..s.chars().count()).map(|i| i.to_string()).collect(),
        v @ JsValue::Undefined | v @ JsValue::Null => {
            return Err(JErrorType::TypeError(format!(
                "Cannot convert {} to object",
                to_string(&v)
            )))
        }
        _ => vec![],
    };
    Ok(ctx
        .intrinsics()
        .new_array(keys.into_iter().map(JsValue::String).collect()))
}

/// Object.prototype.hasOwnProperty
fn object_has_own_property(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let key = to_string(&arg(&args, 0));
    Ok(JsValue::Boolean(match &this {
        JsValue::Object(o) => has_own_property(o, &key)?,
        JsValue::String(s) => key == "length" || key.parse::<usize>().map_or(false, |i| i < s.chars().count()),
        JsValue::Undefined | JsValue::Null => {
            return Err(JErrorType::TypeError(
                "Cannot convert undefined or null to object".to_string(),
            ))
        }
        _ => false,
    }))
}

/// Object.prototype.toString
fn object_to_string(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let tag = match &this {
        JsValue::Undefined => "Undefined",
        JsValue::Null => "Null",
        JsValue::Boolean(_) => "Boolean",
        JsValue::Number(_) => "Number",
        JsValue::String(_) => "String",
        JsValue::Object(o) => match &o.borrow().kind {
            ObjectKind::Array(_) => "Array",
            ObjectKind::Function(_) => "Function",
            ObjectKind::Error => "Error",
            ObjectKind::Namespace(_) => "Window",
            ObjectKind::Ordinary => "Object",
        },
    };
    Ok(JsValue::String(format!("[object {}]", tag)))
}
