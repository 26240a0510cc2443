use std::rc::Rc;

use crate::parser::ast::{ClassData, FunctionData};
use crate::runner::ds::lex_env::JsLexEnvironmentType;
use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::value::JsValue;
use crate::runner::host::types::BuiltInFn;

pub enum ScriptCode {
    Function(Rc<FunctionData>),
    Class(Rc<ClassData>),
}

pub struct ScriptFunction {
    pub code: ScriptCode,
    pub environment: JsLexEnvironmentType,
    /// Lexically captured `this`, set for arrow functions only.
    pub lexical_this: Option<JsValue>,
}

pub struct NativeFunction {
    pub func: BuiltInFn,
    pub constructor: bool,
    /// Marks the host's evaluation primitive, which gets direct-eval treatment.
    pub is_eval: bool,
}

pub struct BoundFunction {
    pub target: JsObjectType,
    pub this: JsValue,
    pub args: Vec<JsValue>,
}

pub enum FunctionKind {
    Script(ScriptFunction),
    Native(NativeFunction),
    Bound(BoundFunction),
}

pub struct FunctionObject {
    pub name: String,
    pub kind: FunctionKind,
}
impl FunctionObject {
    pub fn new_native(name: impl Into<String>, func: BuiltInFn, constructor: bool) -> Self {
        FunctionObject {
            name: name.into(),
            kind: FunctionKind::Native(NativeFunction {
                func,
                constructor,
                is_eval: false,
            }),
        }
    }

    /// Text returned by `Function.prototype.toString`.
    pub fn source_text(&self) -> String {
        match &self.kind {
            FunctionKind::Script(s) => match &s.code {
                ScriptCode::Function(f) => f.source.to_string(),
                ScriptCode::Class(c) => c.source.to_string(),
            },
            FunctionKind::Native(_) => format!("function {}() {{ [native code] }}", self.name),
            FunctionKind::Bound(_) => "function () { [native code] }".to_string(),
        }
    }

    pub fn is_arrow(&self) -> bool {
        match &self.kind {
            FunctionKind::Script(ScriptFunction {
                code: ScriptCode::Function(f),
                ..
            }) => f.is_arrow,
            _ => false,
        }
    }

    pub fn is_class(&self) -> bool {
        matches!(
            &self.kind,
            FunctionKind::Script(ScriptFunction {
                code: ScriptCode::Class(_),
                ..
            })
        )
    }

    pub fn is_constructor(&self) -> bool {
        match &self.kind {
            FunctionKind::Script(_) => !self.is_arrow(),
            FunctionKind::Native(n) => n.constructor,
            FunctionKind::Bound(b) => b
                .target
                .borrow()
                .as_function()
                .map_or(false, |f| f.is_constructor()),
        }
    }

    pub fn is_eval(&self) -> bool {
        matches!(&self.kind, FunctionKind::Native(NativeFunction { is_eval: true, .. }))
    }
}
