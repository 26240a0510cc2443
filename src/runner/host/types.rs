//! Core types shared by the interpreter and the host natives.

use std::rc::Rc;

use crate::runner::ds::env_record::GlobalBindings;
use crate::runner::ds::error::{JErrorType, CALL_STACK_EXCEEDED};
use crate::runner::ds::function_object::FunctionObject;
use crate::runner::ds::lex_env::{JsLexEnvironmentType, LexEnvironment, ScopeKind};
use crate::runner::ds::object::{new_object, JsObjectType, ObjectKind, PropertyDescriptor};
use crate::runner::ds::operations::lex_env::get_identifier_value;
use crate::runner::ds::value::JsValue;
use crate::runner::host::{HostEnvironment, Intrinsics};

/// Deepest nesting of hosted function calls before a `RangeError`. Each
/// hosted call costs several evaluator frames, so this stays within the
/// default 2 MiB stack of a spawned thread.
pub const MAX_CALL_DEPTH: usize = 64;

/// Execution context passed to the evaluator and to native functions.
pub struct EvalContext {
    pub host: Rc<HostEnvironment>,
    /// Innermost lexical environment; its chain ends in the active global layer.
    pub lex_env: JsLexEnvironmentType,
    pub this_value: JsValue,
    pub call_depth: usize,
}

impl EvalContext {
    /// Context for a script running against `global`.
    pub fn new(host: Rc<HostEnvironment>, global: Rc<dyn GlobalBindings>) -> Self {
        let this_value = global.reference();
        EvalContext {
            host,
            lex_env: LexEnvironment::new_script_scope(global),
            this_value,
            call_depth: 0,
        }
    }

    /// Context for code running directly on the host global, outside any sandbox.
    pub fn for_host(host: &Rc<HostEnvironment>) -> Self {
        let global: Rc<dyn GlobalBindings> = host.clone();
        EvalContext::new(host.clone(), global)
    }

    /// Host context that continues the call depth of `self`, for host code
    /// re-entered from a native.
    pub fn nested_host_context(&self) -> Self {
        let mut ctx = EvalContext::for_host(&self.host);
        ctx.call_depth = self.call_depth;
        ctx
    }

    pub fn global(&self) -> Rc<dyn GlobalBindings> {
        self.lex_env.global.clone()
    }

    pub fn intrinsics(&self) -> &Intrinsics {
        self.host.intrinsics()
    }

    pub fn push_block_scope(&mut self) {
        self.lex_env = LexEnvironment::new_child_scope(&self.lex_env, ScopeKind::Block);
    }

    pub fn pop_block_scope(&mut self) {
        if let Some(outer) = self.lex_env.outer.clone() {
            self.lex_env = outer;
        }
    }

    pub fn enter_call(&mut self) -> Result<(), JErrorType> {
        if self.call_depth >= MAX_CALL_DEPTH {
            return Err(JErrorType::RangeError(CALL_STACK_EXCEEDED.to_string()));
        }
        self.call_depth += 1;
        Ok(())
    }

    pub fn exit_call(&mut self) {
        self.call_depth = self.call_depth.saturating_sub(1);
    }

    /// Value of `name` as seen from the current scope.
    pub fn get_binding(&self, name: &str) -> Result<JsValue, JErrorType> {
        get_identifier_value(&self.lex_env, name)
    }
}

/// Function signature for built-in methods.
/// Native functions receive the evaluation context, `this` value, and arguments.
pub type NativeFn = fn(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType>;

/// Built-in function: a plain function pointer or a capturing closure.
#[derive(Clone)]
pub enum BuiltInFn {
    /// Direct function pointer for compiled-in natives.
    Native(NativeFn),

    /// Closure-backed native, used where the function needs captured state.
    Closure(Rc<dyn Fn(&mut EvalContext, JsValue, Vec<JsValue>) -> Result<JsValue, JErrorType>>),
}

impl BuiltInFn {
    pub fn call(
        &self,
        ctx: &mut EvalContext,
        this: JsValue,
        args: Vec<JsValue>,
    ) -> Result<JsValue, JErrorType> {
        match self {
            BuiltInFn::Native(f) => f(ctx, this, args),
            BuiltInFn::Closure(f) => f(ctx, this, args),
        }
    }
}

/// Built-in object definition, materialized by [`BuiltInObject::build`].
pub struct BuiltInObject {
    pub name: String,
    /// Existing object that receives the prototype methods, if not a fresh one.
    pub prototype: Option<JsObjectType>,
    pub methods: Vec<(String, BuiltInFn)>,
    pub prototype_methods: Vec<(String, BuiltInFn)>,
    pub properties: Vec<(String, JsValue)>,
    /// Present for callable built-ins; the flag tells whether `new` is allowed.
    pub constructor: Option<(BuiltInFn, bool)>,
}

impl BuiltInObject {
    pub fn new(name: impl Into<String>) -> Self {
        BuiltInObject {
            name: name.into(),
            prototype: None,
            methods: vec![],
            prototype_methods: vec![],
            properties: vec![],
            constructor: None,
        }
    }

    pub fn with_prototype(mut self, prototype: JsObjectType) -> Self {
        self.prototype = Some(prototype);
        self
    }

    pub fn add_method(mut self, name: impl Into<String>, func: NativeFn) -> Self {
        self.methods.push((name.into(), BuiltInFn::Native(func)));
        self
    }

    pub fn add_prototype_method(mut self, name: impl Into<String>, func: NativeFn) -> Self {
        self.prototype_methods
            .push((name.into(), BuiltInFn::Native(func)));
        self
    }

    pub fn add_property(mut self, name: impl Into<String>, value: JsValue) -> Self {
        self.properties.push((name.into(), value));
        self
    }

    pub fn with_constructor(mut self, constructor: NativeFn) -> Self {
        self.constructor = Some((BuiltInFn::Native(constructor), true));
        self
    }

    /// A callable that refuses `new` (conversion functions like `parseInt`-style globals).
    pub fn with_call(mut self, func: NativeFn) -> Self {
        self.constructor = Some((BuiltInFn::Native(func), false));
        self
    }

    pub fn build(self, intrinsics: &Intrinsics) -> JsObjectType {
        let object = match self.constructor {
            Some((func, constructor)) => {
                let f = new_object(
                    ObjectKind::Function(FunctionObject::new_native(
                        self.name.to_string(),
                        func,
                        constructor,
                    )),
                    Some(intrinsics.function_prototype.clone()),
                );
                let prototype = self
                    .prototype
                    .unwrap_or_else(|| intrinsics.new_plain_object());
                {
                    let mut p = prototype.borrow_mut();
                    p.define_own_property(
                        "constructor",
                        PropertyDescriptor::hidden(JsValue::Object(f.clone())),
                    );
                    for (name, method) in self.prototype_methods {
                        let m = intrinsics.new_native_function(&name, method, false);
                        p.define_own_property(name, PropertyDescriptor::hidden(m));
                    }
                }
                f.borrow_mut().define_own_property(
                    "prototype",
                    PropertyDescriptor {
                        value: JsValue::Object(prototype),
                        writable: false,
                        enumerable: false,
                        configurable: false,
                    },
                );
                f
            }
            None => {
                let o = intrinsics.new_plain_object();
                if let Some(prototype) = self.prototype {
                    let mut p = prototype.borrow_mut();
                    for (name, method) in self.prototype_methods {
                        let m = intrinsics.new_native_function(&name, method, false);
                        p.define_own_property(name, PropertyDescriptor::hidden(m));
                    }
                }
                o
            }
        };
        {
            let mut o = object.borrow_mut();
            for (name, method) in self.methods {
                let m = intrinsics.new_native_function(&name, method, false);
                o.define_own_property(name, PropertyDescriptor::hidden(m));
            }
            for (name, value) in self.properties {
                o.define_own_property(name, PropertyDescriptor::readonly(value));
            }
        }
        object
    }
}
