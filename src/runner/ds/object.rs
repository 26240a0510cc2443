use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::rc::{Rc, Weak};

use crate::runner::ds::env_record::GlobalBindings;
use crate::runner::ds::function_object::FunctionObject;
use crate::runner::ds::value::JsValue;

pub type JsObjectType = Rc<RefCell<JsObject>>;

#[derive(Clone, Debug)]
pub struct PropertyDescriptor {
    pub value: JsValue,
    pub writable: bool,
    pub enumerable: bool,
    pub configurable: bool,
}
impl PropertyDescriptor {
    /// Plain data property, as created by assignment.
    pub fn data(value: JsValue) -> Self {
        PropertyDescriptor {
            value,
            writable: true,
            enumerable: true,
            configurable: true,
        }
    }

    /// Writable but skipped by enumeration (methods, `constructor`).
    pub fn hidden(value: JsValue) -> Self {
        PropertyDescriptor {
            value,
            writable: true,
            enumerable: false,
            configurable: true,
        }
    }

    pub fn readonly(value: JsValue) -> Self {
        PropertyDescriptor {
            value,
            writable: false,
            enumerable: true,
            configurable: false,
        }
    }
}

pub enum ObjectKind {
    Ordinary,
    Array(Vec<JsValue>),
    Function(FunctionObject),
    Error,
    /// Stand-in object for a global layer; every property access is routed to it.
    Namespace(Weak<dyn GlobalBindings>),
}

pub struct JsObject {
    pub kind: ObjectKind,
    pub prototype: Option<JsObjectType>,
    properties: HashMap<String, PropertyDescriptor>,
    order: Vec<String>,
}
impl JsObject {
    pub fn new(kind: ObjectKind, prototype: Option<JsObjectType>) -> Self {
        JsObject {
            kind,
            prototype,
            properties: HashMap::new(),
            order: vec![],
        }
    }

    pub fn get_own_property(&self, key: &str) -> Option<&PropertyDescriptor> {
        self.properties.get(key)
    }

    pub fn has_own_property(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    pub fn define_own_property(&mut self, key: impl Into<String>, descriptor: PropertyDescriptor) {
        let key = key.into();
        if !self.properties.contains_key(&key) {
            self.order.push(key.clone());
        }
        self.properties.insert(key, descriptor);
    }

    /// Shorthand for defining a plain enumerable data property.
    pub fn put(&mut self, key: impl Into<String>, value: JsValue) {
        self.define_own_property(key, PropertyDescriptor::data(value));
    }

    pub fn remove_own_property(&mut self, key: &str) -> Option<PropertyDescriptor> {
        let removed = self.properties.remove(key);
        if removed.is_some() {
            self.order.retain(|k| k != key);
        }
        removed
    }

    /// Own property keys in insertion order.
    pub fn own_property_keys(&self) -> Vec<String> {
        self.order.clone()
    }

    pub fn own_enumerable_keys(&self) -> Vec<String> {
        self.order
            .iter()
            .filter(|k| self.properties.get(*k).map_or(false, |d| d.enumerable))
            .cloned()
            .collect()
    }

    pub fn as_function(&self) -> Option<&FunctionObject> {
        match &self.kind {
            ObjectKind::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self.kind, ObjectKind::Function(_))
    }

    pub fn namespace(&self) -> Option<Weak<dyn GlobalBindings>> {
        match &self.kind {
            ObjectKind::Namespace(ns) => Some(ns.clone()),
            _ => None,
        }
    }
}

impl Display for JsObject {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ObjectKind::Ordinary => write!(f, "[object Object]"),
            ObjectKind::Array(items) => write!(f, "[object Array({})]", items.len()),
            ObjectKind::Function(func) => write!(f, "[Function: {}]", func.name),
            ObjectKind::Error => write!(f, "[object Error]"),
            ObjectKind::Namespace(_) => write!(f, "[object Window]"),
        }
    }
}

pub fn new_object(kind: ObjectKind, prototype: Option<JsObjectType>) -> JsObjectType {
    Rc::new(RefCell::new(JsObject::new(kind, prototype)))
}
