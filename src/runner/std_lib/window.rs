//! Window-style natives: event listeners, timers and the evaluation primitive.
//!
//! All of these except `eval` are receiver-checked. Calling them with an
//! object receiver other than the host global fails with
//! `TypeError: Illegal invocation`, like the native functions of a browser.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::operations::object::get_v;
use crate::runner::ds::operations::test_and_comparison::is_callable;
use crate::runner::ds::operations::type_conversion::{to_integer, to_string};
use crate::runner::ds::value::JsValue;
use crate::runner::eval::statement::perform_indirect_eval;
use crate::runner::host::types::{EvalContext, NativeFn};
use crate::runner::host::{HostEnvironment, Intrinsics};

use super::arg;

pub fn install(global: &JsObjectType, intrinsics: &Intrinsics) {
    let natives: [(&str, NativeFn); 7] = [
        ("addEventListener", add_event_listener),
        ("removeEventListener", remove_event_listener),
        ("dispatchEvent", dispatch_event),
        ("setTimeout", set_timeout),
        ("setInterval", set_interval),
        ("clearTimeout", clear_timer),
        ("clearInterval", clear_timer),
    ];
    for (name, func) in natives.iter() {
        HostEnvironment::install_native(global, intrinsics, name, *func);
    }
    HostEnvironment::install_eval(global, intrinsics, eval);
}

fn add_event_listener(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    ctx.host.check_receiver(&this)?;
    let event = to_string(&arg(&args, 0));
    match arg(&args, 1) {
        JsValue::Undefined | JsValue::Null => {}
        listener => {
            ctx.host.add_event_listener(&event, listener);
        }
    }
    Ok(JsValue::Undefined)
}

fn remove_event_listener(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    ctx.host.check_receiver(&this)?;
    let event = to_string(&arg(&args, 0));
    ctx.host.remove_event_listener(&event, &arg(&args, 1));
    Ok(JsValue::Undefined)
}

/// Accepts an event name or an object with a `type` (and optional `detail`).
fn dispatch_event(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    ctx.host.check_receiver(&this)?;
    let (event, detail) = match arg(&args, 0) {
        v @ JsValue::Object(_) => (to_string(&get_v(&v, "type")?), get_v(&v, "detail")?),
        JsValue::Undefined | JsValue::Null => {
            return Err(JErrorType::TypeError(
                "Failed to execute 'dispatchEvent': parameter 1 is not of type 'Event'".to_string(),
            ))
        }
        v => (to_string(&v), arg(&args, 1)),
    };
    let host = ctx.host.clone();
    let fired = host.dispatch_event_from(ctx, &event, detail)?;
    Ok(JsValue::Boolean(fired > 0))
}

fn schedule(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>, repeat: bool) -> Result<JsValue, JErrorType> {
    ctx.host.check_receiver(&this)?;
    let callback = arg(&args, 0);
    if !is_callable(&callback) {
        return Err(JErrorType::TypeError(format!(
            "{} callback must be a function",
            if repeat { "setInterval" } else { "setTimeout" }
        )));
    }
    let delay = to_integer(&arg(&args, 1)).max(0) as u64;
    let extra = args.into_iter().skip(2).collect();
    let id = ctx.host.schedule_timer(callback, delay, extra, repeat);
    Ok(JsValue::integer(id))
}

fn set_timeout(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    schedule(ctx, this, args, false)
}

fn set_interval(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    schedule(ctx, this, args, true)
}

/// Shared by `clearTimeout` and `clearInterval`; ids come from one sequence.
fn clear_timer(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    ctx.host.check_receiver(&this)?;
    if let JsValue::Number(_) = arg(&args, 0) {
        ctx.host.clear_timer(to_integer(&arg(&args, 0)));
    }
    Ok(JsValue::Undefined)
}

/// Indirect evaluation. Direct `eval(..)` calls never reach this function.
fn eval(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    perform_indirect_eval(ctx, arg(&args, 0))
}
