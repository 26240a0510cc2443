//! Model of the process-wide shared global environment.
//!
//! A [`HostEnvironment`] is created once and shared by reference. It owns the
//! real global object, the real listener registry, a virtual-clock timer queue
//! and the output captured from hosted `console` calls.

pub mod events;
pub mod timers;
pub mod types;

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, error};

use crate::runner::api::run_script;
use crate::runner::ds::env_record::GlobalBindings;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::function_object::{FunctionObject, FunctionKind, NativeFunction};
use crate::runner::ds::object::{new_object, JsObjectType, ObjectKind, PropertyDescriptor};
use crate::runner::ds::operations::object::{delete, get, has_property, set};
use crate::runner::ds::value::JsValue;
use crate::runner::eval::function::call_function;
use crate::runner::std_lib;

use self::events::ListenerRegistry;
use self::timers::TimerQueue;
use self::types::{BuiltInFn, EvalContext, NativeFn};

/// Names under which the global object refers to itself.
pub const SELF_REFERENCES: [&str; 4] = ["window", "self", "top", "globalThis"];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HostCapabilities {
    /// Whether the host can route global-namespace access through an interceptor.
    pub interception: bool,
}

impl Default for HostCapabilities {
    fn default() -> Self {
        HostCapabilities { interception: true }
    }
}

/// Prototype objects every value created on this host links to.
pub struct Intrinsics {
    pub object_prototype: JsObjectType,
    pub function_prototype: JsObjectType,
    pub array_prototype: JsObjectType,
    pub string_prototype: JsObjectType,
    pub error_prototype: JsObjectType,
    pub type_error_prototype: JsObjectType,
    pub reference_error_prototype: JsObjectType,
    pub range_error_prototype: JsObjectType,
    pub syntax_error_prototype: JsObjectType,
}

impl Intrinsics {
    fn new() -> Self {
        let object_prototype = new_object(ObjectKind::Ordinary, None);
        let child = || new_object(ObjectKind::Ordinary, Some(object_prototype.clone()));
        let function_prototype = child();
        let array_prototype = child();
        let string_prototype = child();
        let error_prototype = child();
        let sub_error = || new_object(ObjectKind::Ordinary, Some(error_prototype.clone()));
        Intrinsics {
            type_error_prototype: sub_error(),
            reference_error_prototype: sub_error(),
            range_error_prototype: sub_error(),
            syntax_error_prototype: sub_error(),
            object_prototype,
            function_prototype,
            array_prototype,
            string_prototype,
            error_prototype,
        }
    }

    pub fn new_plain_object(&self) -> JsObjectType {
        new_object(ObjectKind::Ordinary, Some(self.object_prototype.clone()))
    }

    pub fn new_array(&self, items: Vec<JsValue>) -> JsValue {
        JsValue::Object(new_object(
            ObjectKind::Array(items),
            Some(self.array_prototype.clone()),
        ))
    }

    pub fn new_native_function(&self, name: &str, func: BuiltInFn, constructor: bool) -> JsValue {
        JsValue::Object(new_object(
            ObjectKind::Function(FunctionObject::new_native(name, func, constructor)),
            Some(self.function_prototype.clone()),
        ))
    }

    pub fn error_prototype_for(&self, name: &str) -> JsObjectType {
        match name {
            "TypeError" => self.type_error_prototype.clone(),
            "ReferenceError" => self.reference_error_prototype.clone(),
            "RangeError" => self.range_error_prototype.clone(),
            "SyntaxError" => self.syntax_error_prototype.clone(),
            _ => self.error_prototype.clone(),
        }
    }

    /// Materializes an interpreter error as the value `catch` receives.
    pub fn error_to_js_value(&self, error: &JErrorType) -> JsValue {
        match error {
            JErrorType::Thrown(v) => v.clone(),
            _ => {
                let name = error.error_name().unwrap_or("Error");
                let o = new_object(ObjectKind::Error, Some(self.error_prototype_for(name)));
                o.borrow_mut().define_own_property(
                    "message",
                    PropertyDescriptor::hidden(JsValue::String(error.message())),
                );
                JsValue::Object(o)
            }
        }
    }
}

pub struct HostEnvironment {
    global: JsObjectType,
    intrinsics: Intrinsics,
    capabilities: HostCapabilities,
    listeners: RefCell<ListenerRegistry>,
    timers: RefCell<TimerQueue>,
    console: RefCell<Vec<String>>,
}

impl HostEnvironment {
    pub fn new() -> Rc<Self> {
        HostEnvironment::with_capabilities(HostCapabilities::default())
    }

    pub fn with_capabilities(capabilities: HostCapabilities) -> Rc<Self> {
        let intrinsics = Intrinsics::new();
        let global = intrinsics.new_plain_object();
        std_lib::install_globals(&global, &intrinsics);
        {
            let mut g = global.borrow_mut();
            for name in SELF_REFERENCES.iter() {
                g.define_own_property(*name, PropertyDescriptor::readonly(JsValue::Object(global.clone())));
            }
        }
        debug!(
            "host environment ready (interception: {})",
            capabilities.interception
        );
        Rc::new(HostEnvironment {
            global,
            intrinsics,
            capabilities,
            listeners: RefCell::new(ListenerRegistry::new()),
            timers: RefCell::new(TimerQueue::new()),
            console: RefCell::new(vec![]),
        })
    }

    pub fn capabilities(&self) -> HostCapabilities {
        self.capabilities
    }

    pub fn intrinsics(&self) -> &Intrinsics {
        &self.intrinsics
    }

    pub fn global_object(&self) -> JsObjectType {
        self.global.clone()
    }

    pub fn global(&self) -> JsValue {
        JsValue::Object(self.global.clone())
    }

    pub fn is_global(&self, v: &JsValue) -> bool {
        match v {
            JsValue::Object(o) => Rc::ptr_eq(o, &self.global),
            _ => false,
        }
    }

    /// Own binding on the global object.
    pub fn has(&self, name: &str) -> bool {
        self.global.borrow().has_own_property(name)
    }

    pub fn get(&self, name: &str) -> Option<JsValue> {
        self.global
            .borrow()
            .get_own_property(name)
            .map(|d| d.value.clone())
    }

    pub fn set(&self, name: &str, value: JsValue) -> Result<(), JErrorType> {
        set(&self.global, name, value)
    }

    pub fn delete(&self, name: &str) -> Result<bool, JErrorType> {
        delete(&self.global, name)
    }

    /// Defines a binding hosted code can read but neither reassign nor delete.
    pub fn define_readonly(&self, name: &str, value: JsValue) {
        self.global
            .borrow_mut()
            .define_own_property(name, PropertyDescriptor::readonly(value));
    }

    /// Runs `source` directly against the global object, outside any sandbox.
    pub fn run_script(self: &Rc<Self>, source: &str) -> Result<JsValue, JErrorType> {
        let global: Rc<dyn GlobalBindings> = self.clone();
        run_script(self, global, source)
    }

    pub fn add_event_listener(&self, event: &str, listener: JsValue) -> bool {
        self.listeners.borrow_mut().add(event, listener)
    }

    pub fn remove_event_listener(&self, event: &str, listener: &JsValue) -> bool {
        self.listeners.borrow_mut().remove(event, listener)
    }

    pub fn has_listener(&self, event: &str, listener: &JsValue) -> bool {
        self.listeners.borrow().contains(event, listener)
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.borrow().count(event)
    }

    pub fn total_listeners(&self) -> usize {
        self.listeners.borrow().total()
    }

    /// Calls every listener of `event` with `{type, detail}`. Listener errors are
    /// reported and do not stop the remaining listeners. Returns how many ran.
    pub fn dispatch_event(self: &Rc<Self>, event: &str, detail: JsValue) -> usize {
        let mut ctx = EvalContext::for_host(self);
        match self.dispatch_event_from(&mut ctx, event, detail) {
            Ok(count) => count,
            Err(e) => {
                error!("dispatch of '{}' aborted: {}", event, e);
                self.listener_count(event)
            }
        }
    }

    /// Dispatch on behalf of hosted code already running in `ctx`. Listener
    /// calls continue its call depth, and exceeding the depth limit aborts the
    /// dispatch with that error.
    pub fn dispatch_event_from(
        self: &Rc<Self>,
        ctx: &mut EvalContext,
        event: &str,
        detail: JsValue,
    ) -> Result<usize, JErrorType> {
        let listeners = self.listeners.borrow().snapshot(event);
        let event_object = self.intrinsics.new_plain_object();
        {
            let mut e = event_object.borrow_mut();
            e.put("type", JsValue::string(event));
            e.put("detail", detail);
        }
        let event_object = JsValue::Object(event_object);
        let mut host_ctx = ctx.nested_host_context();
        for listener in listeners.iter() {
            match call_function(&mut host_ctx, listener, self.global(), vec![event_object.clone()]) {
                Err(e) if e.is_call_stack_exceeded() => return Err(e),
                Err(e) => error!("listener for '{}' failed: {}", event, e),
                Ok(_) => {}
            }
        }
        Ok(listeners.len())
    }

    pub fn schedule_timer(&self, callback: JsValue, delay: u64, args: Vec<JsValue>, repeat: bool) -> i64 {
        self.timers.borrow_mut().schedule(callback, delay, args, repeat)
    }

    pub fn clear_timer(&self, id: i64) -> bool {
        self.timers.borrow_mut().cancel(id)
    }

    pub fn is_timer_pending(&self, id: i64) -> bool {
        self.timers.borrow().is_pending(id)
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.borrow().pending()
    }

    pub fn now(&self) -> u64 {
        self.timers.borrow().now()
    }

    /// Moves the virtual clock forward by `ms`, running due callbacks in due-time
    /// order. Callback errors are reported and do not stop the clock. Returns
    /// how many callbacks ran.
    pub fn advance_timers(self: &Rc<Self>, ms: u64) -> usize {
        let until = self.now() + ms;
        let mut fired = 0;
        loop {
            let next = self.timers.borrow_mut().pop_due(until);
            let (callback, args) = match next {
                Some(t) => t,
                None => break,
            };
            let mut ctx = EvalContext::for_host(self);
            if let Err(e) = call_function(&mut ctx, &callback, self.global(), args) {
                error!("timer callback failed: {}", e);
            }
            fired += 1;
        }
        self.timers.borrow_mut().set_now(until);
        fired
    }

    pub fn record_console(&self, line: String) {
        self.console.borrow_mut().push(line);
    }

    /// Lines written through hosted `console.*` calls.
    pub fn console_output(&self) -> Vec<String> {
        self.console.borrow().clone()
    }

    /// Whether `this` is an acceptable receiver for a receiver-checked native.
    pub fn check_receiver(&self, this: &JsValue) -> Result<(), JErrorType> {
        match this {
            JsValue::Undefined | JsValue::Null => Ok(()),
            v if self.is_global(v) => Ok(()),
            _ => Err(JErrorType::TypeError("Illegal invocation".to_string())),
        }
    }

    /// Installs a native as a hidden global binding.
    pub(crate) fn install_native(global: &JsObjectType, intrinsics: &Intrinsics, name: &str, func: NativeFn) {
        let f = intrinsics.new_native_function(name, BuiltInFn::Native(func), false);
        global
            .borrow_mut()
            .define_own_property(name, PropertyDescriptor::hidden(f));
    }

    /// Installs the evaluation primitive.
    pub(crate) fn install_eval(global: &JsObjectType, intrinsics: &Intrinsics, func: NativeFn) {
        let f = new_object(
            ObjectKind::Function(FunctionObject {
                name: "eval".to_string(),
                kind: FunctionKind::Native(NativeFunction {
                    func: BuiltInFn::Native(func),
                    constructor: false,
                    is_eval: true,
                }),
            }),
            Some(intrinsics.function_prototype.clone()),
        );
        global
            .borrow_mut()
            .define_own_property("eval", PropertyDescriptor::hidden(JsValue::Object(f)));
    }
}

impl GlobalBindings for HostEnvironment {
    fn has_binding(&self, name: &str) -> bool {
        self.has_property(name)
    }

    fn has_property(&self, name: &str) -> bool {
        has_property(&self.global(), name).unwrap_or(false)
    }

    fn get_binding_value(&self, name: &str) -> Result<JsValue, JErrorType> {
        get(&self.global, name)
    }

    fn set_mutable_binding(&self, name: &str, value: JsValue) -> Result<(), JErrorType> {
        self.set(name, value)
    }

    fn delete_binding(&self, name: &str) -> Result<bool, JErrorType> {
        self.delete(name)
    }

    fn own_keys(&self) -> Vec<String> {
        self.global.borrow().own_enumerable_keys()
    }

    fn reference(&self) -> JsValue {
        self.global()
    }
}
