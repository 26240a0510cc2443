use std::rc::Rc;

use crate::runner::ds::env_record::GlobalBindings;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::lex_env::{JsLexEnvironmentType, ScopeKind};
use crate::runner::ds::value::JsValue;

pub enum ResolvedBinding {
    Declarative(JsLexEnvironmentType),
    Global(Rc<dyn GlobalBindings>),
    Unresolvable(Rc<dyn GlobalBindings>),
}

pub fn resolve_binding(lex: &JsLexEnvironmentType, name: &str) -> ResolvedBinding {
    let mut current = Some(lex.clone());
    while let Some(env) = current {
        if env.inner.borrow().has_binding(name) {
            return ResolvedBinding::Declarative(env);
        }
        current = env.outer.clone();
    }
    if lex.global.has_binding(name) {
        ResolvedBinding::Global(lex.global.clone())
    } else {
        ResolvedBinding::Unresolvable(lex.global.clone())
    }
}

/// Resolves `name` and returns its value together with the receiver a call
/// through this identifier gets: the layer reference for global bindings,
/// `undefined` for declarative ones.
pub fn get_identifier_value_and_this(
    lex: &JsLexEnvironmentType,
    name: &str,
) -> Result<(JsValue, JsValue), JErrorType> {
    match resolve_binding(lex, name) {
        ResolvedBinding::Declarative(env) => {
            let value = env.inner.borrow().get_binding_value(name)?;
            Ok((value, JsValue::Undefined))
        }
        ResolvedBinding::Global(global) => {
            Ok((global.get_binding_value(name)?, global.reference()))
        }
        ResolvedBinding::Unresolvable(_) => {
            Err(JErrorType::ReferenceError(format!("{} is not defined", name)))
        }
    }
}

pub fn get_identifier_value(lex: &JsLexEnvironmentType, name: &str) -> Result<JsValue, JErrorType> {
    get_identifier_value_and_this(lex, name).map(|(v, _)| v)
}

/// Assignment to an identifier. Unresolvable names become implicit globals.
pub fn put_identifier_value(
    lex: &JsLexEnvironmentType,
    name: &str,
    value: JsValue,
) -> Result<(), JErrorType> {
    match resolve_binding(lex, name) {
        ResolvedBinding::Declarative(env) => env.inner.borrow_mut().set_mutable_binding(name, value),
        ResolvedBinding::Global(global) | ResolvedBinding::Unresolvable(global) => {
            global.set_mutable_binding(name, value)
        }
    }
}

/// Nearest function scope, `None` when `var` declarations land on the global layer.
pub fn var_scope(lex: &JsLexEnvironmentType) -> Option<JsLexEnvironmentType> {
    let mut current = Some(lex.clone());
    while let Some(env) = current {
        match env.kind {
            ScopeKind::Function => return Some(env),
            ScopeKind::Script => return None,
            ScopeKind::Block => current = env.outer.clone(),
        }
    }
    None
}

/// Hoists a `var` name: `undefined` unless the target scope already knows it.
pub fn declare_var(lex: &JsLexEnvironmentType, name: &str) -> Result<(), JErrorType> {
    match var_scope(lex) {
        Some(env) => {
            if !env.inner.borrow().has_binding(name) {
                env.inner
                    .borrow_mut()
                    .declare(name.to_string(), JsValue::Undefined);
            }
            Ok(())
        }
        None => {
            if lex.global.has_binding(name) {
                Ok(())
            } else {
                lex.global.set_mutable_binding(name, JsValue::Undefined)
            }
        }
    }
}

/// Binds a hoisted function declaration in its var scope.
pub fn declare_function(
    lex: &JsLexEnvironmentType,
    name: &str,
    value: JsValue,
) -> Result<(), JErrorType> {
    match var_scope(lex) {
        Some(env) => {
            env.inner.borrow_mut().declare(name.to_string(), value);
            Ok(())
        }
        None => lex.global.set_mutable_binding(name, value),
    }
}
