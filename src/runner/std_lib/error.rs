//! Error built-in objects.
//!
//! Provides Error, TypeError, ReferenceError, SyntaxError, RangeError constructors.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::{new_object, JsObjectType, ObjectKind, PropertyDescriptor};
use crate::runner::ds::operations::object::get_v;
use crate::runner::ds::operations::type_conversion::to_string;
use crate::runner::ds::value::JsValue;
use crate::runner::host::types::{BuiltInObject, EvalContext, NativeFn};
use crate::runner::host::Intrinsics;

use super::{arg, define_global};

pub fn install(global: &JsObjectType, intrinsics: &Intrinsics) {
    let constructors: [(&str, NativeFn); 5] = [
        ("Error", error_constructor),
        ("TypeError", type_error_constructor),
        ("ReferenceError", reference_error_constructor),
        ("RangeError", range_error_constructor),
        ("SyntaxError", syntax_error_constructor),
    ];
    for (name, constructor) in constructors.iter() {
        let prototype = intrinsics.error_prototype_for(name);
        {
            let mut p = prototype.borrow_mut();
            p.define_own_property("name", PropertyDescriptor::hidden(JsValue::string(*name)));
            p.define_own_property("message", PropertyDescriptor::hidden(JsValue::string("")));
        }
        let mut builder = BuiltInObject::new(*name)
            .with_prototype(prototype)
            .with_constructor(*constructor);
        if *name == "Error" {
            builder = builder.add_prototype_method("toString", error_to_string);
        }
        define_global(global, name, JsValue::Object(builder.build(intrinsics)));
    }
}

fn make_error(ctx: &EvalContext, name: &str, args: &[JsValue]) -> JsValue {
    let e = new_object(
        ObjectKind::Error,
        Some(ctx.intrinsics().error_prototype_for(name)),
    );
    match arg(args, 0) {
        JsValue::Undefined => {}
        message => e.borrow_mut().define_own_property(
            "message",
            PropertyDescriptor::hidden(JsValue::String(to_string(&message))),
        ),
    }
    JsValue::Object(e)
}

fn error_constructor(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(make_error(ctx, "Error", &args))
}

fn type_error_constructor(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(make_error(ctx, "TypeError", &args))
}

fn reference_error_constructor(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(make_error(ctx, "ReferenceError", &args))
}

fn range_error_constructor(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(make_error(ctx, "RangeError", &args))
}

fn syntax_error_constructor(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(make_error(ctx, "SyntaxError", &args))
}

/// Error.prototype.toString
fn error_to_string(_ctx: &mut EvalContext, this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let name = to_string(&get_v(&this, "name")?);
    let message = to_string(&get_v(&this, "message")?);
    Ok(JsValue::String(if message.is_empty() {
        name
    } else if name.is_empty() {
        message
    } else {
        format!("{}: {}", name, message)
    }))
}
