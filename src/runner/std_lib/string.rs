//! String built-in.
//!
//! Provides the `String.prototype` methods. Primitive strings find them
//! through the shared string prototype.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::operations::type_conversion::{to_integer, to_string};
use crate::runner::ds::value::JsValue;
use crate::runner::host::types::EvalContext;
use crate::runner::host::Intrinsics;

use super::array::relative_index;

/// Longest string `repeat` will build, in bytes.
const MAX_STRING_LENGTH: usize = (1 << 29) - 24;
use super::{arg, define_methods};

pub fn install(_global: &JsObjectType, intrinsics: &Intrinsics) {
    define_methods(
        &intrinsics.string_prototype,
        intrinsics,
        &[
            ("charAt", string_char_at),
            ("indexOf", string_index_of),
            ("includes", string_includes),
            ("startsWith", string_starts_with),
            ("endsWith", string_ends_with),
            ("slice", string_slice),
            ("substring", string_substring),
            ("toUpperCase", string_to_upper_case),
            ("toLowerCase", string_to_lower_case),
            ("trim", string_trim),
            ("split", string_split),
            ("repeat", string_repeat),
            ("replace", string_replace),
            ("toString", string_to_string),
        ],
    );
}

fn this_string(this: &JsValue) -> Result<String, JErrorType> {
    match this {
        JsValue::Undefined | JsValue::Null => Err(JErrorType::TypeError(
            "String.prototype method called on null or undefined".to_string(),
        )),
        v => Ok(to_string(v)),
    }
}

fn chars(s: &str) -> Vec<char> {
    s.chars().collect()
}

fn string_char_at(_ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let s = this_string(&this)?;
    let i = to_integer(&arg(&args, 0));
    Ok(JsValue::String(if i < 0 {
        String::new()
    } else {
        s.chars().nth(i as usize).map(String::from).unwrap_or_default()
    }))
}

/// Character index of `needle` in `s`, searching from character `from`.
fn char_index_of(s: &str, needle: &str, from: usize) -> Option<usize> {
    let cs = chars(s);
    let ns = chars(needle);
    if ns.len() > cs.len() {
        return None;
    }
    (from.min(cs.len())..=cs.len() - ns.len()).find(|&i| cs[i..i + ns.len()] == ns[..])
}

fn string_index_of(_ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let s = this_string(&this)?;
    let needle = to_string(&arg(&args, 0));
    let from = to_integer(&arg(&args, 1)).max(0) as usize;
    Ok(JsValue::integer(
        char_index_of(&s, &needle, from).map_or(-1, |i| i as i64),
    ))
}

fn string_includes(_ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let s = this_string(&this)?;
    Ok(JsValue::Boolean(s.contains(to_string(&arg(&args, 0)).as_str())))
}

fn string_starts_with(_ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let s = this_string(&this)?;
    Ok(JsValue::Boolean(s.starts_with(to_string(&arg(&args, 0)).as_str())))
}

fn string_ends_with(_ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let s = this_string(&this)?;
    Ok(JsValue::Boolean(s.ends_with(to_string(&arg(&args, 0)).as_str())))
}

fn string_slice(_ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let cs = chars(&this_string(&this)?);
    let start = relative_index(&arg(&args, 0), cs.len(), 0);
    let end = relative_index(&arg(&args, 1), cs.len(), cs.len());
    Ok(JsValue::String(if start < end {
        cs[start..end].iter().collect()
    } else {
        String::new()
    }))
}

fn string_substring(_ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let cs = chars(&this_string(&this)?);
    let clamp = |v: &JsValue, default: usize| match v {
        JsValue::Undefined => default,
        v => to_integer(v).max(0).min(cs.len() as i64) as usize,
    };
    let a = clamp(&arg(&args, 0), 0);
    let b = clamp(&arg(&args, 1), cs.len());
    let (start, end) = if a <= b { (a, b) } else { (b, a) };
    Ok(JsValue::String(cs[start..end].iter().collect()))
}

fn string_to_upper_case(_ctx: &mut EvalContext, this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(JsValue::String(this_string(&this)?.to_uppercase()))
}

fn string_to_lower_case(_ctx: &mut EvalContext, this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(JsValue::String(this_string(&this)?.to_lowercase()))
}

fn string_trim(_ctx: &mut EvalContext, this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(JsValue::String(this_string(&this)?.trim().to_string()))
}

fn string_split(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let s = this_string(&this)?;
    let parts: Vec<JsValue> = match arg(&args, 0) {
        JsValue::Undefined => vec![JsValue::String(s)],
        sep => {
            let sep = to_string(&sep);
            if sep.is_empty() {
                s.chars().map(|c| JsValue::String(c.to_string())).collect()
            } else {
                s.split(sep.as_str()).map(JsValue::string).collect()
            }
        }
    };
    Ok(ctx.intrinsics().new_array(parts))
}

fn string_repeat(_ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let s = this_string(&this)?;
    let count = to_integer(&arg(&args, 0));
    if count < 0 || count == i64::MAX {
        return Err(JErrorType::RangeError(format!("Invalid count value: {}", count)));
    }
    match s.len().checked_mul(count as usize) {
        Some(len) if len <= MAX_STRING_LENGTH => Ok(JsValue::String(s.repeat(count as usize))),
        _ => Err(JErrorType::RangeError("Invalid string length".to_string())),
    }
}

/// Replaces the first occurrence of a string pattern.
fn string_replace(_ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let s = this_string(&this)?;
    let pattern = to_string(&arg(&args, 0));
    let replacement = to_string(&arg(&args, 1));
    Ok(JsValue::String(s.replacen(pattern.as_str(), &replacement, 1)))
}

fn string_to_string(_ctx: &mut EvalContext, this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(JsValue::String(this_string(&this)?))
}
