use std::cell::RefCell;
use std::rc::Rc;

use crate::runner::ds::env_record::{DeclarativeEnvironmentRecord, GlobalBindings};

pub type JsLexEnvironmentType = Rc<LexEnvironment>;

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum ScopeKind {
    /// Per-execution script scope: holds program-level `let`/`const`/`class`.
    Script,
    Function,
    Block,
}

pub struct LexEnvironment {
    pub inner: RefCell<DeclarativeEnvironmentRecord>,
    pub outer: Option<JsLexEnvironmentType>,
    pub global: Rc<dyn GlobalBindings>,
    pub kind: ScopeKind,
}
impl LexEnvironment {
    pub fn new_script_scope(global: Rc<dyn GlobalBindings>) -> JsLexEnvironmentType {
        Rc::new(LexEnvironment {
            inner: RefCell::new(DeclarativeEnvironmentRecord::new()),
            outer: None,
            global,
            kind: ScopeKind::Script,
        })
    }

    pub fn new_child_scope(outer: &JsLexEnvironmentType, kind: ScopeKind) -> JsLexEnvironmentType {
        Rc::new(LexEnvironment {
            inner: RefCell::new(DeclarativeEnvironmentRecord::new()),
            outer: Some(outer.clone()),
            global: outer.global.clone(),
            kind,
        })
    }
}
