//! Built-in bindings installed on every host global object.
//!
//! Each submodule installs one family of globals: the window-style event and
//! timer natives, `console`, conversion functions, `Object`, `Array`, the
//! error constructors, `Math` and the string and function prototype methods.

pub mod array;
pub mod console;
pub mod core;
pub mod error;
pub mod function;
pub mod math;
pub mod object;
pub mod string;
pub mod window;

use crate::runner::ds::object::{JsObjectType, PropertyDescriptor};
use crate::runner::ds::value::JsValue;
use crate::runner::host::types::{BuiltInFn, NativeFn};
use crate::runner::host::Intrinsics;

pub fn install_globals(global: &JsObjectType, intrinsics: &Intrinsics) {
    core::install(global, intrinsics);
    object::install(global, intrinsics);
    function::install(intrinsics);
    array::install(global, intrinsics);
    string::install(global, intrinsics);
    error::install(global, intrinsics);
    math::install(global, intrinsics);
    console::install(global, intrinsics);
    window::install(global, intrinsics);
}

/// Argument `i`, or `undefined` when the caller passed fewer.
pub(crate) fn arg(args: &[JsValue], i: usize) -> JsValue {
    args.get(i).cloned().unwrap_or(JsValue::Undefined)
}

pub(crate) fn define_global(global: &JsObjectType, name: &str, value: JsValue) {
    global
        .borrow_mut()
        .define_own_property(name, PropertyDescriptor::hidden(value));
}

/// Adds non-enumerable native methods to an existing object.
pub(crate) fn define_methods(target: &JsObjectType, intrinsics: &Intrinsics, methods: &[(&str, NativeFn)]) {
    for (name, func) in methods {
        let f = intrinsics.new_native_function(name, BuiltInFn::Native(*func), false);
        target
            .borrow_mut()
            .define_own_property(*name, PropertyDescriptor::hidden(f));
    }
}
