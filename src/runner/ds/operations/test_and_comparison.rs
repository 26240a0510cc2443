use std::rc::Rc;

use crate::runner::ds::operations::type_conversion::{to_number, to_primitive};
use crate::runner::ds::value::{JsNumberType, JsValue};

pub fn is_callable(v: &JsValue) -> bool {
    match v {
        JsValue::Object(o) => o.borrow().is_callable(),
        _ => false,
    }
}

pub fn is_constructor(v: &JsValue) -> bool {
    match v {
        JsValue::Object(o) => o.borrow().as_function().map_or(false, |f| f.is_constructor()),
        _ => false,
    }
}

/// `===`
pub fn is_strictly_equal(a: &JsValue, b: &JsValue) -> bool {
    match (a, b) {
        (JsValue::Number(x), JsValue::Number(y)) => x == y,
        (JsValue::Object(x), JsValue::Object(y)) => Rc::ptr_eq(x, y),
        _ => a == b,
    }
}

/// `==`
pub fn is_loosely_equal(a: &JsValue, b: &JsValue) -> bool {
    match (a, b) {
        (JsValue::Undefined, JsValue::Undefined)
        | (JsValue::Null, JsValue::Null)
        | (JsValue::Undefined, JsValue::Null)
        | (JsValue::Null, JsValue::Undefined) => true,
        (JsValue::Undefined, _) | (JsValue::Null, _) | (_, JsValue::Undefined) | (_, JsValue::Null) => {
            false
        }
        (JsValue::Number(_), JsValue::String(_)) | (JsValue::String(_), JsValue::Number(_)) => {
            to_number(a) == to_number(b)
        }
        (JsValue::Boolean(_), _) => is_loosely_equal(&JsValue::Number(to_number(a)), b),
        (_, JsValue::Boolean(_)) => is_loosely_equal(a, &JsValue::Number(to_number(b))),
        (JsValue::Object(_), JsValue::Object(_)) => is_strictly_equal(a, b),
        (JsValue::Object(_), _) => is_loosely_equal(&to_primitive(a), b),
        (_, JsValue::Object(_)) => is_loosely_equal(a, &to_primitive(b)),
        _ => is_strictly_equal(a, b),
    }
}

/// `a < b`. `None` stands for the undefined result produced by NaN operands.
pub fn is_less_than(a: &JsValue, b: &JsValue) -> Option<bool> {
    let pa = to_primitive(a);
    let pb = to_primitive(b);
    if let (JsValue::String(x), JsValue::String(y)) = (&pa, &pb) {
        return Some(x < y);
    }
    match (to_number(&pa), to_number(&pb)) {
        (JsNumberType::NaN, _) | (_, JsNumberType::NaN) => None,
        (JsNumberType::Integer(x), JsNumberType::Integer(y)) => Some(x < y),
        (x, y) => Some(x.as_f64() < y.as_f64()),
    }
}
