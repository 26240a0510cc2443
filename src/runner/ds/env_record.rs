use std::collections::HashMap;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::value::JsValue;

/// The outermost scope layer. Identifier lookups that miss every declarative
/// environment end up here. Implemented by the host's real global and by
/// the sandbox's virtual namespace.
pub trait GlobalBindings {
    /// Whether an unqualified identifier resolves against this layer.
    fn has_binding(&self, name: &str) -> bool;
    /// Answer for `name in <reference>`.
    fn has_property(&self, name: &str) -> bool;
    fn get_binding_value(&self, name: &str) -> Result<JsValue, JErrorType>;
    fn set_mutable_binding(&self, name: &str, value: JsValue) -> Result<(), JErrorType>;
    fn delete_binding(&self, name: &str) -> Result<bool, JErrorType>;
    fn own_keys(&self) -> Vec<String>;
    /// The object hosted code sees as `this`, `window` and friends.
    fn reference(&self) -> JsValue;
}

struct Binding {
    value: Option<JsValue>,
    mutable: bool,
}

#[derive(Default)]
pub struct DeclarativeEnvironmentRecord {
    bindings: HashMap<String, Binding>,
}
impl DeclarativeEnvironmentRecord {
    pub fn new() -> Self {
        DeclarativeEnvironmentRecord {
            bindings: HashMap::new(),
        }
    }

    pub fn has_binding(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Creates an uninitialized binding (temporal dead zone until initialized).
    pub fn create_mutable_binding(&mut self, name: String) {
        self.bindings.insert(
            name,
            Binding {
                value: None,
                mutable: true,
            },
        );
    }

    pub fn create_immutable_binding(&mut self, name: String) {
        self.bindings.insert(
            name,
            Binding {
                value: None,
                mutable: false,
            },
        );
    }

    pub fn initialize_binding(&mut self, name: &str, value: JsValue) {
        if let Some(b) = self.bindings.get_mut(name) {
            b.value = Some(value);
        }
    }

    /// Creates and initializes a mutable binding in one go (parameters, `var`).
    pub fn declare(&mut self, name: String, value: JsValue) {
        self.bindings.insert(
            name,
            Binding {
                value: Some(value),
                mutable: true,
            },
        );
    }

    pub fn set_mutable_binding(&mut self, name: &str, value: JsValue) -> Result<(), JErrorType> {
        match self.bindings.get_mut(name) {
            None => Err(JErrorType::ReferenceError(format!("{} is not defined", name))),
            Some(b) if b.value.is_none() => Err(JErrorType::ReferenceError(format!(
                "Cannot access '{}' before initialization",
                name
            ))),
            Some(b) if !b.mutable => Err(JErrorType::TypeError(
                "Assignment to constant variable".to_string(),
            )),
            Some(b) => {
                b.value = Some(value);
                Ok(())
            }
        }
    }

    pub fn get_binding_value(&self, name: &str) -> Result<JsValue, JErrorType> {
        match self.bindings.get(name) {
            None => Err(JErrorType::ReferenceError(format!("{} is not defined", name))),
            Some(Binding { value: None, .. }) => Err(JErrorType::ReferenceError(format!(
                "Cannot access '{}' before initialization",
                name
            ))),
            Some(Binding { value: Some(v), .. }) => Ok(v.clone()),
        }
    }
}
