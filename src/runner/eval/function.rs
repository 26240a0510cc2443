//! Function objects: creation, calls and construction.

use std::mem;
use std::rc::Rc;

use crate::parser::ast::{ClassData, FunctionBodyType, FunctionData};
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::function_object::{
    FunctionKind, FunctionObject, ScriptCode, ScriptFunction,
};
use crate::runner::ds::lex_env::{JsLexEnvironmentType, LexEnvironment, ScopeKind};
use crate::runner::ds::object::{new_object, JsObjectType, ObjectKind, PropertyDescriptor};
use crate::runner::ds::operations::object::get;
use crate::runner::ds::operations::type_conversion::to_string;
use crate::runner::ds::value::JsValue;
use crate::runner::host::types::{BuiltInFn, EvalContext};
use crate::runner::host::Intrinsics;

use super::expression::evaluate_expression;
use super::statement::execute_function_body;
use super::types::{CompletionType, ValueResult};

/// Everything needed to run a callable, cloned out of the object so no borrow
/// is held while hosted code runs.
enum CallTarget {
    Function {
        code: Rc<FunctionData>,
        environment: JsLexEnvironmentType,
        lexical_this: Option<JsValue>,
    },
    Class {
        name: String,
        constructor: Option<Rc<FunctionData>>,
        environment: JsLexEnvironmentType,
    },
    Native {
        func: BuiltInFn,
        constructor: bool,
    },
    Bound {
        target: JsObjectType,
        this: JsValue,
        args: Vec<JsValue>,
    },
}

fn call_target(f: &JsValue) -> Result<(JsObjectType, CallTarget), JErrorType> {
    let o = match f {
        JsValue::Object(o) => o.clone(),
        _ => {
            return Err(JErrorType::TypeError(format!(
                "{} is not a function",
                to_string(f)
            )))
        }
    };
    let target = match &o.borrow().kind {
        ObjectKind::Function(func) => match &func.kind {
            FunctionKind::Script(s) => match &s.code {
                ScriptCode::Function(code) => CallTarget::Function {
                    code: code.clone(),
                    environment: s.environment.clone(),
                    lexical_this: s.lexical_this.clone(),
                },
                ScriptCode::Class(class) => CallTarget::Class {
                    name: func.name.to_string(),
                    constructor: class.constructor.clone(),
                    environment: s.environment.clone(),
                },
            },
            FunctionKind::Native(n) => CallTarget::Native {
                func: n.func.clone(),
                constructor: n.constructor,
            },
            FunctionKind::Bound(b) => CallTarget::Bound {
                target: b.target.clone(),
                this: b.this.clone(),
                args: b.args.clone(),
            },
        },
        _ => {
            return Err(JErrorType::TypeError(format!(
                "{} is not a function",
                to_string(f)
            )))
        }
    };
    Ok((o, target))
}

/// Builds a script function object closed over `environment`.
fn make_function(
    intrinsics: &Intrinsics,
    data: &Rc<FunctionData>,
    name: &str,
    environment: JsLexEnvironmentType,
    lexical_this: Option<JsValue>,
) -> JsObjectType {
    let f = new_object(
        ObjectKind::Function(FunctionObject {
            name: name.to_string(),
            kind: FunctionKind::Script(ScriptFunction {
                code: ScriptCode::Function(data.clone()),
                environment,
                lexical_this,
            }),
        }),
        Some(intrinsics.function_prototype.clone()),
    );
    if !data.is_arrow {
        let prototype = intrinsics.new_plain_object();
        prototype.borrow_mut().define_own_property(
            "constructor",
            PropertyDescriptor::hidden(JsValue::Object(f.clone())),
        );
        f.borrow_mut().define_own_property(
            "prototype",
            PropertyDescriptor {
                value: JsValue::Object(prototype),
                writable: true,
                enumerable: false,
                configurable: false,
            },
        );
    }
    f
}

/// Creates a function object for a declaration or expression in the current
/// scope. A named function expression can see its own name.
pub fn create_function_object(
    ctx: &EvalContext,
    data: &Rc<FunctionData>,
    is_expression: bool,
) -> JsValue {
    let lexical_this = if data.is_arrow {
        Some(ctx.this_value.clone())
    } else {
        None
    };
    let named_expression = is_expression && !data.is_arrow && data.id.is_some();
    let environment = if named_expression {
        LexEnvironment::new_child_scope(&ctx.lex_env, ScopeKind::Block)
    } else {
        ctx.lex_env.clone()
    };
    let f = make_function(
        ctx.intrinsics(),
        data,
        data.name(),
        environment.clone(),
        lexical_this,
    );
    if named_expression {
        let mut record = environment.inner.borrow_mut();
        record.create_immutable_binding(data.name().to_string());
        record.initialize_binding(data.name(), JsValue::Object(f.clone()));
    }
    JsValue::Object(f)
}

pub fn create_class_object(ctx: &EvalContext, data: &Rc<ClassData>) -> JsValue {
    let intrinsics = ctx.intrinsics();
    let environment = if data.id.is_some() {
        LexEnvironment::new_child_scope(&ctx.lex_env, ScopeKind::Block)
    } else {
        ctx.lex_env.clone()
    };
    let class = new_object(
        ObjectKind::Function(FunctionObject {
            name: data.name().to_string(),
            kind: FunctionKind::Script(ScriptFunction {
                code: ScriptCode::Class(data.clone()),
                environment: environment.clone(),
                lexical_this: None,
            }),
        }),
        Some(intrinsics.function_prototype.clone()),
    );
    let prototype = intrinsics.new_plain_object();
    prototype.borrow_mut().define_own_property(
        "constructor",
        PropertyDescriptor::hidden(JsValue::Object(class.clone())),
    );
    for method in data.methods.iter() {
        let m = make_function(
            intrinsics,
            &method.function,
            &method.key,
            environment.clone(),
            None,
        );
        let holder = if method.is_static { &class } else { &prototype };
        holder
            .borrow_mut()
            .define_own_property(method.key.to_string(), PropertyDescriptor::hidden(JsValue::Object(m)));
    }
    class.borrow_mut().define_own_property(
        "prototype",
        PropertyDescriptor {
            value: JsValue::Object(prototype),
            writable: false,
            enumerable: false,
            configurable: false,
        },
    );
    if data.id.is_some() {
        let mut record = environment.inner.borrow_mut();
        record.create_immutable_binding(data.name().to_string());
        record.initialize_binding(data.name(), JsValue::Object(class.clone()));
    }
    JsValue::Object(class)
}

/// Calls `f` with the given receiver and arguments.
pub fn call_function(
    ctx: &mut EvalContext,
    f: &JsValue,
    this: JsValue,
    args: Vec<JsValue>,
) -> ValueResult {
    let (_, target) = call_target(f)?;
    ctx.enter_call()?;
    let result = match target {
        CallTarget::Function {
            code,
            environment,
            lexical_this,
        } => {
            let this = match lexical_this {
                Some(t) => t,
                // Sloppy-mode receiver: a missing `this` is the function's global layer.
                None if this.is_nullish() => environment.global.reference(),
                None => this,
            };
            run_function_body(ctx, &code, environment, this, args)
        }
        CallTarget::Class { name, .. } => Err(JErrorType::TypeError(format!(
            "Class constructor {} cannot be invoked without 'new'",
            name
        ))),
        CallTarget::Native { func, .. } => func.call(ctx, this, args),
        CallTarget::Bound {
            target,
            this,
            args: bound_args,
        } => {
            let mut all = bound_args;
            all.extend(args);
            call_function(ctx, &JsValue::Object(target), this, all)
        }
    };
    ctx.exit_call();
    result
}

/// The `new` operator.
pub fn construct(ctx: &mut EvalContext, f: &JsValue, args: Vec<JsValue>) -> ValueResult {
    let (o, target) = call_target(f)?;
    let not_a_constructor = || {
        JErrorType::TypeError(format!(
            "{} is not a constructor",
            o.borrow().as_function().map_or("value".to_string(), |f| f.name.to_string())
        ))
    };
    ctx.enter_call()?;
    let result = match target {
        CallTarget::Native { func, constructor } => {
            if constructor {
                func.call(ctx, JsValue::Undefined, args)
            } else {
                Err(not_a_constructor())
            }
        }
        CallTarget::Bound {
            target,
            args: bound_args,
            ..
        } => {
            let mut all = bound_args;
            all.extend(args);
            construct(ctx, &JsValue::Object(target), all)
        }
        CallTarget::Function {
            code, environment, ..
        } => {
            if code.is_arrow {
                Err(not_a_constructor())
            } else {
                allocate_instance(ctx, &o).and_then(|instance| {
                    let returned = run_function_body(ctx, &code, environment, instance.clone(), args)?;
                    Ok(if let JsValue::Object(_) = returned {
                        returned
                    } else {
                        instance
                    })
                })
            }
        }
        CallTarget::Class {
            constructor,
            environment,
            ..
        } => allocate_instance(ctx, &o).and_then(|instance| match constructor {
            Some(code) => {
                let returned = run_function_body(ctx, &code, environment, instance.clone(), args)?;
                Ok(if let JsValue::Object(_) = returned {
                    returned
                } else {
                    instance
                })
            }
            None => Ok(instance),
        }),
    };
    ctx.exit_call();
    result
}

/// Fresh object whose prototype is `f.prototype`.
fn allocate_instance(ctx: &EvalContext, f: &JsObjectType) -> ValueResult {
    let prototype = match get(f, "prototype")? {
        JsValue::Object(p) => p,
        _ => ctx.intrinsics().object_prototype.clone(),
    };
    Ok(JsValue::Object(new_object(ObjectKind::Ordinary, Some(prototype))))
}

fn run_function_body(
    ctx: &mut EvalContext,
    code: &Rc<FunctionData>,
    environment: JsLexEnvironmentType,
    this: JsValue,
    args: Vec<JsValue>,
) -> ValueResult {
    let scope = LexEnvironment::new_child_scope(&environment, ScopeKind::Function);
    {
        let mut record = scope.inner.borrow_mut();
        if !code.is_arrow && !code.params.iter().any(|p| p.name == "arguments") {
            record.declare(
                "arguments".to_string(),
                ctx.intrinsics().new_array(args.clone()),
            );
        }
        for (i, param) in code.params.iter().enumerate() {
            record.declare(
                param.name.to_string(),
                args.get(i).cloned().unwrap_or(JsValue::Undefined),
            );
        }
    }
    let saved_env = mem::replace(&mut ctx.lex_env, scope);
    let saved_this = mem::replace(&mut ctx.this_value, this);
    let result = match &code.body {
        FunctionBodyType::Block(body) => execute_function_body(body, ctx).map(|c| {
            if c.completion_type == CompletionType::Return {
                c.get_value()
            } else {
                JsValue::Undefined
            }
        }),
        FunctionBodyType::Expression(e) => evaluate_expression(e, ctx),
    };
    ctx.lex_env = saved_env;
    ctx.this_value = saved_this;
    result
}
