//! Console built-in object.
//!
//! Provides console.log, console.info, console.warn, console.error and
//! console.debug. Output is captured on the host and forwarded to the `log`
//! facade under the `console` target.

use log::{debug, error, info, warn};

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::operations::type_conversion::to_display_string;
use crate::runner::ds::value::JsValue;
use crate::runner::host::types::{BuiltInObject, EvalContext};
use crate::runner::host::Intrinsics;

use super::define_global;

pub fn install(global: &JsObjectType, intrinsics: &Intrinsics) {
    let console = BuiltInObject::new("console")
        .add_method("log", console_log)
        .add_method("info", console_info)
        .add_method("warn", console_warn)
        .add_method("error", console_error)
        .add_method("debug", console_debug)
        .build(intrinsics);
    define_global(global, "console", JsValue::Object(console));
}

/// Formats all arguments space-separated and records the line on the host.
fn emit(ctx: &EvalContext, args: &[JsValue]) -> String {
    let line = args
        .iter()
        .map(to_display_string)
        .collect::<Vec<_>>()
        .join(" ");
    ctx.host.record_console(line.clone());
    line
}

fn console_log(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    info!(target: "console", "{}", emit(ctx, &args));
    Ok(JsValue::Undefined)
}

fn console_info(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    info!(target: "console", "{}", emit(ctx, &args));
    Ok(JsValue::Undefined)
}

fn console_warn(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    warn!(target: "console", "{}", emit(ctx, &args));
    Ok(JsValue::Undefined)
}

fn console_error(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    error!(target: "console", "{}", emit(ctx, &args));
    Ok(JsValue::Undefined)
}

fn console_debug(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    debug!(target: "console", "{}", emit(ctx, &args));
    Ok(JsValue::Undefined)
}
