//! `Function.prototype` methods shared by every callable.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::function_object::{BoundFunction, FunctionKind, FunctionObject};
use crate::runner::ds::object::{new_object, ObjectKind};
use crate::runner::ds::value::JsValue;
use crate::runner::eval::function::call_function;
use crate::runner::host::types::EvalContext;
use crate::runner::host::Intrinsics;

use super::{arg, define_methods};

pub fn install(intrinsics: &Intrinsics) {
    define_methods(
        &intrinsics.function_prototype,
        intrinsics,
        &[
            ("call", function_call),
            ("apply", function_apply),
            ("bind", function_bind),
            ("toString", function_to_string),
        ],
    );
}

fn require_callable(this: &JsValue, method: &str) -> Result<(), JErrorType> {
    match this {
        JsValue::Object(o) if o.borrow().is_callable() => Ok(()),
        _ => Err(JErrorType::TypeError(format!(
            "Function.prototype.{} called on a non-function",
            method
        ))),
    }
}

/// Function.prototype.call
fn function_call(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    require_callable(&this, "call")?;
    let mut args = args.into_iter();
    let receiver = args.next().unwrap_or(JsValue::Undefined);
    call_function(ctx, &this, receiver, args.collect())
}

/// Function.prototype.apply
fn function_apply(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    require_callable(&this, "apply")?;
    let list = match arg(&args, 1) {
        JsValue::Undefined | JsValue::Null => vec![],
        JsValue::Object(o) => match &o.borrow().kind {
            ObjectKind::Array(items) => items.clone(),
            _ => vec![],
        },
        _ => {
            return Err(JErrorType::TypeError(
                "CreateListFromArrayLike called on non-object".to_string(),
            ))
        }
    };
    call_function(ctx, &this, arg(&args, 0), list)
}

/// Function.prototype.bind
fn function_bind(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let target = match &this {
        JsValue::Object(o) if o.borrow().is_callable() => o.clone(),
        _ => {
            return Err(JErrorType::TypeError(
                "Bind must be called on a function".to_string(),
            ))
        }
    };
    let name = target
        .borrow()
        .as_function()
        .map_or(String::new(), |f| f.name.to_string());
    let mut args = args.into_iter();
    let bound_this = args.next().unwrap_or(JsValue::Undefined);
    let bound = new_object(
        ObjectKind::Function(FunctionObject {
            name: format!("bound {}", name),
            kind: FunctionKind::Bound(BoundFunction {
                target,
                this: bound_this,
                args: args.collect(),
            }),
        }),
        Some(ctx.intrinsics().function_prototype.clone()),
    );
    Ok(JsValue::Object(bound))
}

/// Function.prototype.toString
fn function_to_string(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let source = match &this {
        JsValue::Object(o) => o.borrow().as_function().map(|f| f.source_text()),
        _ => None,
    };
    source.map(JsValue::String).ok_or_else(|| {
        JErrorType::TypeError(
            "Function.prototype.toString requires that 'this' be a Function".to_string(),
        )
    })
}
