//! Math built-in object.
//!
//! Provides mathematical constants and functions.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::operations::type_conversion::to_number;
use crate::runner::ds::value::{JsNumberType, JsValue};
use crate::runner::host::types::{BuiltInObject, EvalContext};
use crate::runner::host::Intrinsics;

use super::{arg, define_global};

pub fn install(global: &JsObjectType, intrinsics: &Intrinsics) {
    let math = BuiltInObject::new("Math")
        .add_property("E", JsValue::number(std::f64::consts::E))
        .add_property("PI", JsValue::number(std::f64::consts::PI))
        .add_method("abs", math_abs)
        .add_method("floor", math_floor)
        .add_method("ceil", math_ceil)
        .add_method("round", math_round)
        .add_method("max", math_max)
        .add_method("min", math_min)
        .add_method("pow", math_pow)
        .add_method("sqrt", math_sqrt)
        .build(intrinsics);
    define_global(global, "Math", JsValue::Object(math));
}

fn number_arg(args: &[JsValue], i: usize) -> f64 {
    to_number(&arg(args, i)).as_f64()
}

fn unary(args: &[JsValue], f: impl Fn(f64) -> f64) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Number(JsNumberType::from_f64(f(number_arg(args, 0)))))
}

fn math_abs(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    unary(&args, f64::abs)
}

fn math_floor(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    unary(&args, f64::floor)
}

fn math_ceil(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    unary(&args, f64::ceil)
}

/// Rounds half up, unlike `f64::round` which rounds half away from zero.
fn math_round(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    unary(&args, |x| (x + 0.5).floor())
}

fn math_sqrt(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    unary(&args, f64::sqrt)
}

fn math_pow(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let base = number_arg(&args, 0);
    let exponent = number_arg(&args, 1);
    Ok(JsValue::Number(JsNumberType::from_f64(base.powf(exponent))))
}

fn fold(args: &[JsValue], initial: f64, pick: impl Fn(f64, f64) -> f64) -> Result<JsValue, JErrorType> {
    let mut result = initial;
    for v in args {
        let n = to_number(v).as_f64();
        if n.is_nan() {
            return Ok(JsValue::Number(JsNumberType::NaN));
        }
        result = pick(result, n);
    }
    Ok(JsValue::Number(JsNumberType::from_f64(result)))
}

fn math_max(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    fold(&args, f64::NEG_INFINITY, f64::max)
}

fn math_min(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    fold(&args, f64::INFINITY, f64::min)
}
