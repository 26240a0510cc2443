//! Global value properties and conversion functions.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::{JsObjectType, PropertyDescriptor};
use crate::runner::ds::operations::type_conversion::{to_boolean, to_integer, to_number, to_string};
use crate::runner::ds::value::{JsNumberType, JsValue};
use crate::runner::host::types::{BuiltInObject, EvalContext};
use crate::runner::host::Intrinsics;

use super::{arg, define_global, define_methods};

pub fn install(global: &JsObjectType, intrinsics: &Intrinsics) {
    {
        let mut g = global.borrow_mut();
        g.define_own_property("undefined", PropertyDescriptor::readonly(JsValue::Undefined));
        g.define_own_property("NaN", PropertyDescriptor::readonly(JsValue::Number(JsNumberType::NaN)));
        g.define_own_property(
            "Infinity",
            PropertyDescriptor::readonly(JsValue::Number(JsNumberType::PositiveInfinity)),
        );
    }
    define_methods(
        global,
        intrinsics,
        &[
            ("parseInt", parse_int),
            ("parseFloat", parse_float),
            ("isNaN", is_nan),
        ],
    );

    let string = BuiltInObject::new("String")
        .with_prototype(intrinsics.string_prototype.clone())
        .with_call(string_call)
        .build(intrinsics);
    define_global(global, "String", JsValue::Object(string));

    let number = BuiltInObject::new("Number")
        .with_call(number_call)
        .add_property("MAX_SAFE_INTEGER", JsValue::integer(9007199254740991))
        .build(intrinsics);
    define_global(global, "Number", JsValue::Object(number));

    let boolean = BuiltInObject::new("Boolean")
        .with_call(boolean_call)
        .build(intrinsics);
    define_global(global, "Boolean", JsValue::Object(boolean));
}

fn string_call(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(JsValue::String(match args.first() {
        Some(v) => to_string(v),
        None => String::new(),
    }))
}

fn number_call(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(match args.first() {
        Some(v) => JsValue::Number(to_number(v)),
        None => JsValue::integer(0),
    })
}

fn boolean_call(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Boolean(to_boolean(&arg(&args, 0))))
}

fn is_nan(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Boolean(matches!(to_number(&arg(&args, 0)), JsNumberType::NaN)))
}

/// Reads the longest prefix of digits valid in the radix.
fn parse_int(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let text = to_string(&arg(&args, 0));
    let mut s = text.trim_start();
    let mut sign = 1;
    if let Some(rest) = s.strip_prefix('-') {
        sign = -1;
        s = rest;
    } else if let Some(rest) = s.strip_prefix('+') {
        s = rest;
    }
    let mut radix = match arg(&args, 1) {
        JsValue::Undefined => 0,
        r => to_integer(&r),
    };
    if radix == 0 || radix == 16 {
        if let Some(rest) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            s = rest;
            radix = 16;
        }
    }
    if radix == 0 {
        radix = 10;
    }
    if !(2..=36).contains(&radix) {
        return Ok(JsValue::Number(JsNumberType::NaN));
    }
    let digits: String = s
        .chars()
        .take_while(|c| c.is_digit(radix as u32))
        .collect();
    if digits.is_empty() {
        return Ok(JsValue::Number(JsNumberType::NaN));
    }
    let value = digits.chars().fold(0f64, |acc, c| {
        acc * radix as f64 + c.to_digit(radix as u32).map_or(0.0, f64::from)
    });
    Ok(JsValue::number(sign as f64 * value))
}

fn parse_float(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let text = to_string(&arg(&args, 0));
    let s = text.trim_start();
    if s.starts_with("Infinity") || s.starts_with("+Infinity") {
        return Ok(JsValue::Number(JsNumberType::PositiveInfinity));
    }
    if s.starts_with("-Infinity") {
        return Ok(JsValue::Number(JsNumberType::NegativeInfinity));
    }
    // Longest prefix that still parses; exponent and sign make this non-monotonic.
    let candidate: String = s
        .chars()
        .take_while(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
        .collect();
    let parsed = (1..=candidate.len())
        .rev()
        .find_map(|end| candidate[..end].parse::<f64>().ok());
    Ok(match parsed {
        Some(f) => JsValue::number(f),
        None => JsValue::Number(JsNumberType::NaN),
    })
}
