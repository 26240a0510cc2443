//! Array built-in.
//!
//! Provides the `Array` constructor, `Array.isArray` and the
//! `Array.prototype` methods.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::{JsObjectType, ObjectKind};
use crate::runner::ds::operations::object::checked_array_length;
use crate::runner::ds::operations::test_and_comparison::{is_callable, is_strictly_equal};
use crate::runner::ds::operations::type_conversion::{to_boolean, to_integer, to_string};
use crate::runner::ds::value::{JsNumberType, JsValue};
use crate::runner::eval::function::call_function;
use crate::runner::host::types::{BuiltInObject, EvalContext};
use crate::runner::host::Intrinsics;

use super::{arg, define_global};

pub fn install(global: &JsObjectType, intrinsics: &Intrinsics) {
    let array = BuiltInObject::new("Array")
        .with_prototype(intrinsics.array_prototype.clone())
        .with_constructor(array_constructor)
        .add_method("isArray", array_is_array)
        .add_prototype_method("push", array_push)
        .add_prototype_method("pop", array_pop)
        .add_prototype_method("join", array_join)
        .add_prototype_method("indexOf", array_index_of)
        .add_prototype_method("includes", array_includes)
        .add_prototype_method("forEach", array_for_each)
        .add_prototype_method("map", array_map)
        .add_prototype_method("filter", array_filter)
        .add_prototype_method("slice", array_slice)
        .build(intrinsics);
    define_global(global, "Array", JsValue::Object(array));
}

fn this_array(this: &JsValue, method: &str) -> Result<JsObjectType, JErrorType> {
    match this {
        JsValue::Object(o) if matches!(o.borrow().kind, ObjectKind::Array(_)) => Ok(o.clone()),
        _ => Err(JErrorType::TypeError(format!(
            "Array.prototype.{} called on a non-array",
            method
        ))),
    }
}

/// Copy of the elements, so callbacks may mutate the array while we iterate.
fn elements(o: &JsObjectType) -> Vec<JsValue> {
    match &o.borrow().kind {
        ObjectKind::Array(items) => items.clone(),
        _ => vec![],
    }
}

fn with_items<R>(o: &JsObjectType, f: impl FnOnce(&mut Vec<JsValue>) -> R) -> Option<R> {
    match &mut o.borrow_mut().kind {
        ObjectKind::Array(items) => Some(f(items)),
        _ => None,
    }
}

/// Array constructor: a single numeric argument is a length.
fn array_constructor(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    if let [JsValue::Number(n)] = args.as_slice() {
        let len = match n {
            JsNumberType::Integer(len) => checked_array_length(*len as f64)?,
            _ => return Err(JErrorType::RangeError("Invalid array length".to_string())),
        };
        return Ok(ctx.intrinsics().new_array(vec![JsValue::Undefined; len]));
    }
    Ok(ctx.intrinsics().new_array(args))
}

fn array_is_array(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Boolean(match arg(&args, 0) {
        JsValue::Object(o) => matches!(o.borrow().kind, ObjectKind::Array(_)),
        _ => false,
    }))
}

fn array_push(_ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let o = this_array(&this, "push")?;
    let len = with_items(&o, |items| {
        items.extend(args);
        items.len()
    })
    .unwrap_or(0);
    Ok(JsValue::integer(len as i64))
}

fn array_pop(_ctx: &mut EvalContext, this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let o = this_array(&this, "pop")?;
    Ok(with_items(&o, |items| items.pop())
        .flatten()
        .unwrap_or(JsValue::Undefined))
}

fn array_join(_ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let o = this_array(&this, "join")?;
    let separator = match arg(&args, 0) {
        JsValue::Undefined => ",".to_string(),
        s => to_string(&s),
    };
    let joined = elements(&o)
        .iter()
        .map(|v| match v {
            JsValue::Undefined | JsValue::Null => String::new(),
            _ => to_string(v),
        })
        .collect::<Vec<_>>()
        .join(&separator);
    Ok(JsValue::String(joined))
}

fn array_index_of(_ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let o = this_array(&this, "indexOf")?;
    let needle = arg(&args, 0);
    let index = elements(&o)
        .iter()
        .position(|v| is_strictly_equal(v, &needle))
        .map_or(-1, |i| i as i64);
    Ok(JsValue::integer(index))
}

fn array_includes(_ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let o = this_array(&this, "includes")?;
    let needle = arg(&args, 0);
    let nan_needle = matches!(needle, JsValue::Number(JsNumberType::NaN));
    Ok(JsValue::Boolean(elements(&o).iter().any(|v| {
        is_strictly_equal(v, &needle)
            || (nan_needle && matches!(v, JsValue::Number(JsNumberType::NaN)))
    })))
}

fn callback_arg(args: &[JsValue], method: &str) -> Result<JsValue, JErrorType> {
    let callback = arg(args, 0);
    if is_callable(&callback) {
        Ok(callback)
    } else {
        Err(JErrorType::TypeError(format!(
            "{} is not a function (Array.prototype.{})",
            to_string(&callback),
            method
        )))
    }
}

fn array_for_each(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let o = this_array(&this, "forEach")?;
    let callback = callback_arg(&args, "forEach")?;
    let receiver = arg(&args, 1);
    for (i, v) in elements(&o).into_iter().enumerate() {
        call_function(ctx, &callback, receiver.clone(), vec![v, JsValue::integer(i as i64), this.clone()])?;
    }
    Ok(JsValue::Undefined)
}

fn array_map(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let o = this_array(&this, "map")?;
    let callback = callback_arg(&args, "map")?;
    let receiver = arg(&args, 1);
    let mut mapped = vec![];
    for (i, v) in elements(&o).into_iter().enumerate() {
        mapped.push(call_function(
            ctx,
            &callback,
            receiver.clone(),
            vec![v, JsValue::integer(i as i64), this.clone()],
        )?);
    }
    Ok(ctx.intrinsics().new_array(mapped))
}

fn array_filter(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let o = this_array(&this, "filter")?;
    let callback = callback_arg(&args, "filter")?;
    let receiver = arg(&args, 1);
    let mut kept = vec![];
    for (i, v) in elements(&o).into_iter().enumerate() {
        let keep = call_function(
            ctx,
            &callback,
            receiver.clone(),
            vec![v.clone(), JsValue::integer(i as i64), this.clone()],
        )?;
        if to_boolean(&keep) {
            kept.push(v);
        }
    }
    Ok(ctx.intrinsics().new_array(kept))
}

/// Resolves a relative index (negative counts from the end) into `0..=len`.
pub(crate) fn relative_index(v: &JsValue, len: usize, default: usize) -> usize {
    match v {
        JsValue::Undefined => default,
        _ => {
            let i = to_integer(v);
            if i < 0 {
                (len as i64 + i).max(0) as usize
            } else {
                (i as usize).min(len)
            }
        }
    }
}

fn array_slice(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let o = this_array(&this, "slice")?;
    let items = elements(&o);
    let start = relative_index(&arg(&args, 0), items.len(), 0);
    let end = relative_index(&arg(&args, 1), items.len(), items.len());
    let slice = if start < end {
        items[start..end].to_vec()
    } else {
        vec![]
    };
    Ok(ctx.intrinsics().new_array(slice))
}
