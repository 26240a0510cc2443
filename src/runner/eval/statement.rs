//! Statement execution.
//!
//! Also holds the entry points that run a whole statement list in a given
//! context: programs, function bodies and `eval` code.

use crate::parser::ast::{
    BlockStatementData, CatchClauseData, ExpressionType, ForInTarget, StatementType,
    VariableDeclarationData, VariableDeclarationKind, VariableDeclarationOrExpression,
};
use crate::parser::JsParser;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::lex_env::{JsLexEnvironmentType, LexEnvironment, ScopeKind};
use crate::runner::ds::operations::lex_env::{declare_function, declare_var, put_identifier_value};
use crate::runner::ds::operations::object::enumerable_keys;
use crate::runner::ds::operations::type_conversion::to_boolean;
use crate::runner::ds::value::JsValue;
use crate::runner::host::types::EvalContext;

use super::expression::evaluate_expression;
use super::function::{create_class_object, create_function_object};
use super::types::{Completion, CompletionType, EvalResult, ValueResult};

/// Execute a statement and return its completion.
pub fn execute_statement(stmt: &StatementType, ctx: &mut EvalContext) -> EvalResult {
    match stmt {
        StatementType::EmptyStatement { .. } => Ok(Completion::normal()),

        StatementType::ExpressionStatement { expression, .. } => {
            let value = evaluate_expression(expression, ctx)?;
            Ok(Completion::normal_with_value(value))
        }

        StatementType::BlockStatement(block) => execute_block_statement(block, ctx),

        StatementType::VariableDeclaration(decl) => {
            execute_variable_declaration(decl, ctx)?;
            Ok(Completion::normal())
        }

        // Hoisted when the enclosing body was entered.
        StatementType::FunctionDeclaration(_) => Ok(Completion::normal()),

        StatementType::ClassDeclaration(data) => {
            let class = create_class_object(ctx, data);
            bind_lexical(&ctx.lex_env, data.name(), class, true)?;
            Ok(Completion::normal())
        }

        StatementType::IfStatement {
            test,
            consequent,
            alternate,
            ..
        } => {
            if to_boolean(&evaluate_expression(test, ctx)?) {
                execute_statement(consequent, ctx)
            } else if let Some(alt) = alternate {
                execute_statement(alt, ctx)
            } else {
                Ok(Completion::normal())
            }
        }

        StatementType::WhileStatement { test, body, .. } => {
            let mut last = None;
            while to_boolean(&evaluate_expression(test, ctx)?) {
                let c = execute_statement(body, ctx)?;
                if c.value.is_some() {
                    last = c.value.clone();
                }
                if let Some(exit) = loop_exit(c, &last) {
                    return Ok(exit);
                }
            }
            Ok(Completion { completion_type: CompletionType::Normal, value: last })
        }

        StatementType::DoWhileStatement { body, test, .. } => {
            let mut last = None;
            loop {
                let c = execute_statement(body, ctx)?;
                if c.value.is_some() {
                    last = c.value.clone();
                }
                if let Some(exit) = loop_exit(c, &last) {
                    return Ok(exit);
                }
                if !to_boolean(&evaluate_expression(test, ctx)?) {
                    break;
                }
            }
            Ok(Completion { completion_type: CompletionType::Normal, value: last })
        }

        StatementType::ForStatement {
            init,
            test,
            update,
            body,
            ..
        } => {
            let saved = ctx.lex_env.clone();
            ctx.push_block_scope();
            let result = execute_for_statement(
                init.as_ref(),
                test.as_deref(),
                update.as_deref(),
                body,
                ctx,
            );
            ctx.lex_env = saved;
            result
        }

        StatementType::ForInStatement {
            left, right, body, ..
        } => execute_for_in_statement(left, right, body, ctx),

        StatementType::ReturnStatement { argument, .. } => {
            let value = match argument {
                Some(arg) => evaluate_expression(arg, ctx)?,
                None => JsValue::Undefined,
            };
            Ok(Completion::return_value(value))
        }

        StatementType::BreakStatement { .. } => Ok(Completion::break_completion()),

        StatementType::ContinueStatement { .. } => Ok(Completion::continue_completion()),

        StatementType::ThrowStatement { argument, .. } => {
            let value = evaluate_expression(argument, ctx)?;
            Err(JErrorType::Thrown(value))
        }

        StatementType::TryStatement {
            block,
            handler,
            finalizer,
            ..
        } => execute_try_statement(block, handler.as_ref(), finalizer.as_ref(), ctx),
    }
}

/// Decides whether a loop stops after a body completion. Returns the
/// completion to leave the loop with, if any.
fn loop_exit(c: Completion, last: &Option<JsValue>) -> Option<Completion> {
    match c.completion_type {
        CompletionType::Break => Some(Completion {
            completion_type: CompletionType::Normal,
            value: last.clone(),
        }),
        CompletionType::Return => Some(c),
        CompletionType::Continue | CompletionType::Normal => None,
    }
}

/// Runs a statement list, returning the first abrupt completion or the value
/// of the last statement that produced one.
pub fn execute_statement_list(body: &[StatementType], ctx: &mut EvalContext) -> EvalResult {
    let mut last: Option<JsValue> = None;
    for stmt in body {
        let c = execute_statement(stmt, ctx)?;
        if c.is_abrupt() {
            return Ok(c.update_empty(last));
        }
        if c.value.is_some() {
            last = c.value;
        }
    }
    Ok(Completion {
        completion_type: CompletionType::Normal,
        value: last,
    })
}

fn execute_block_statement(block: &BlockStatementData, ctx: &mut EvalContext) -> EvalResult {
    let saved = ctx.lex_env.clone();
    ctx.push_block_scope();
    let result = hoist_block_functions(&block.body, ctx)
        .and_then(|_| execute_statement_list(&block.body, ctx));
    ctx.lex_env = saved;
    result
}

/// Body of a script function; the context already points at its function scope.
pub fn execute_function_body(body: &[StatementType], ctx: &mut EvalContext) -> EvalResult {
    hoist_declarations(body, ctx)?;
    execute_statement_list(body, ctx)
}

/// Runs a parsed program in `ctx`. `var` and function declarations land on the
/// global layer; `let`/`const`/`class` stay in the context's script scope.
pub fn execute_program(body: &[StatementType], ctx: &mut EvalContext) -> ValueResult {
    hoist_declarations(body, ctx)?;
    let c = execute_statement_list(body, ctx)?;
    Ok(c.get_value())
}

/// `eval(src)` called through the identifier `eval`: runs in the caller's scope.
pub fn perform_direct_eval(ctx: &mut EvalContext, source: JsValue) -> ValueResult {
    let source = match source {
        JsValue::String(s) => s,
        other => return Ok(other),
    };
    let program = JsParser::parse_to_ast_from_str(&source)
        .map_err(|e| JErrorType::SyntaxError(e.to_string()))?;
    let saved = ctx.lex_env.clone();
    ctx.push_block_scope();
    let result = hoist_declarations(&program.body, ctx)
        .and_then(|_| execute_statement_list(&program.body, ctx));
    ctx.lex_env = saved;
    Ok(result?.get_value())
}

/// Any other call of the evaluation primitive: runs against the host global.
pub fn perform_indirect_eval(ctx: &mut EvalContext, source: JsValue) -> ValueResult {
    let source = match source {
        JsValue::String(s) => s,
        other => return Ok(other),
    };
    let program = JsParser::parse_to_ast_from_str(&source)
        .map_err(|e| JErrorType::SyntaxError(e.to_string()))?;
    let mut host_ctx = ctx.nested_host_context();
    execute_program(&program.body, &mut host_ctx)
}

/// Hoists `var` names and function declarations of a function, program or
/// `eval` body into the surrounding var scope.
fn hoist_declarations(body: &[StatementType], ctx: &mut EvalContext) -> Result<(), JErrorType> {
    let mut names = vec![];
    for stmt in body {
        collect_var_names(stmt, &mut names);
    }
    for name in names.iter() {
        declare_var(&ctx.lex_env, name)?;
    }
    for stmt in body {
        if let StatementType::FunctionDeclaration(data) = stmt {
            let f = create_function_object(ctx, data, false);
            declare_function(&ctx.lex_env, data.name(), f)?;
        }
    }
    Ok(())
}

/// Function declarations directly inside a block are scoped to the block.
fn hoist_block_functions(body: &[StatementType], ctx: &mut EvalContext) -> Result<(), JErrorType> {
    for stmt in body {
        if let StatementType::FunctionDeclaration(data) = stmt {
            let f = create_function_object(ctx, data, false);
            ctx.lex_env
                .inner
                .borrow_mut()
                .declare(data.name().to_string(), f);
        }
    }
    Ok(())
}

fn push_name(names: &mut Vec<String>, name: &str) {
    if !names.iter().any(|n| n == name) {
        names.push(name.to_string());
    }
}

fn collect_var_names(stmt: &StatementType, names: &mut Vec<String>) {
    match stmt {
        StatementType::VariableDeclaration(decl) if decl.kind == VariableDeclarationKind::Var => {
            for d in decl.declarations.iter() {
                push_name(names, &d.id.name);
            }
        }
        StatementType::BlockStatement(block) => {
            for s in block.body.iter() {
                collect_var_names(s, names);
            }
        }
        StatementType::IfStatement {
            consequent,
            alternate,
            ..
        } => {
            collect_var_names(consequent, names);
            if let Some(alt) = alternate {
                collect_var_names(alt, names);
            }
        }
        StatementType::WhileStatement { body, .. } | StatementType::DoWhileStatement { body, .. } => {
            collect_var_names(body, names)
        }
        StatementType::ForStatement { init, body, .. } => {
            if let Some(VariableDeclarationOrExpression::VariableDeclaration(decl)) = init {
                if decl.kind == VariableDeclarationKind::Var {
                    for d in decl.declarations.iter() {
                        push_name(names, &d.id.name);
                    }
                }
            }
            collect_var_names(body, names);
        }
        StatementType::ForInStatement { left, body, .. } => {
            if left.kind == Some(VariableDeclarationKind::Var) {
                push_name(names, &left.id.name);
            }
            collect_var_names(body, names);
        }
        StatementType::TryStatement {
            block,
            handler,
            finalizer,
            ..
        } => {
            let blocks = Some(block)
                .into_iter()
                .chain(handler.as_ref().map(|h| &h.body))
                .chain(finalizer.as_ref());
            for b in blocks {
                for s in b.body.iter() {
                    collect_var_names(s, names);
                }
            }
        }
        _ => {}
    }
}

/// Creates and initializes a `let`/`const`/`class` binding in `env`.
fn bind_lexical(
    env: &JsLexEnvironmentType,
    name: &str,
    value: JsValue,
    mutable: bool,
) -> Result<(), JErrorType> {
    let mut record = env.inner.borrow_mut();
    if record.has_binding(name) {
        return Err(JErrorType::SyntaxError(format!(
            "Identifier '{}' has already been declared",
            name
        )));
    }
    if mutable {
        record.create_mutable_binding(name.to_string());
    } else {
        record.create_immutable_binding(name.to_string());
    }
    record.initialize_binding(name, value);
    Ok(())
}

fn execute_variable_declaration(
    decl: &VariableDeclarationData,
    ctx: &mut EvalContext,
) -> Result<(), JErrorType> {
    for d in decl.declarations.iter() {
        match decl.kind {
            VariableDeclarationKind::Var => {
                if let Some(init) = &d.init {
                    let value = evaluate_expression(init, ctx)?;
                    put_identifier_value(&ctx.lex_env, &d.id.name, value)?;
                }
            }
            kind => {
                let value = match &d.init {
                    Some(init) => evaluate_expression(init, ctx)?,
                    None => JsValue::Undefined,
                };
                bind_lexical(
                    &ctx.lex_env,
                    &d.id.name,
                    value,
                    kind == VariableDeclarationKind::Let,
                )?;
            }
        }
    }
    Ok(())
}

/// Runs inside the loop's own scope, pushed by the caller.
fn execute_for_statement(
    init: Option<&VariableDeclarationOrExpression>,
    test: Option<&ExpressionType>,
    update: Option<&ExpressionType>,
    body: &StatementType,
    ctx: &mut EvalContext,
) -> EvalResult {
    let mut per_iteration = vec![];
    match init {
        Some(VariableDeclarationOrExpression::VariableDeclaration(decl)) => {
            execute_variable_declaration(decl, ctx)?;
            if decl.kind == VariableDeclarationKind::Let {
                per_iteration = decl.declarations.iter().map(|d| d.id.name.to_string()).collect();
            }
        }
        Some(VariableDeclarationOrExpression::Expression(e)) => {
            evaluate_expression(e, ctx)?;
        }
        None => {}
    }
    let outer = ctx.lex_env.outer.clone();
    let mut last = None;
    loop {
        // Closures created in one iteration keep that iteration's `let` values.
        if !per_iteration.is_empty() {
            if let Some(outer) = &outer {
                let next = LexEnvironment::new_child_scope(outer, ScopeKind::Block);
                for name in per_iteration.iter() {
                    let value = ctx.lex_env.inner.borrow().get_binding_value(name)?;
                    next.inner.borrow_mut().declare(name.to_string(), value);
                }
                ctx.lex_env = next;
            }
        }
        if let Some(t) = test {
            if !to_boolean(&evaluate_expression(t, ctx)?) {
                break;
            }
        }
        let c = execute_statement(body, ctx)?;
        if c.value.is_some() {
            last = c.value.clone();
        }
        if let Some(exit) = loop_exit(c, &last) {
            return Ok(exit);
        }
        if let Some(u) = update {
            evaluate_expression(u, ctx)?;
        }
    }
    Ok(Completion {
        completion_type: CompletionType::Normal,
        value: last,
    })
}

fn execute_for_in_statement(
    left: &ForInTarget,
    right: &ExpressionType,
    body: &StatementType,
    ctx: &mut EvalContext,
) -> EvalResult {
    let object = evaluate_expression(right, ctx)?;
    let keys = enumerable_keys(&object)?;
    let mut last = None;
    for key in keys {
        let saved = ctx.lex_env.clone();
        let result = match left.kind {
            Some(VariableDeclarationKind::Let) | Some(VariableDeclarationKind::Const) => {
                ctx.push_block_scope();
                bind_lexical(
                    &ctx.lex_env,
                    &left.id.name,
                    JsValue::String(key),
                    left.kind == Some(VariableDeclarationKind::Let),
                )
                .and_then(|_| execute_statement(body, ctx))
            }
            _ => put_identifier_value(&ctx.lex_env, &left.id.name, JsValue::String(key))
                .and_then(|_| execute_statement(body, ctx)),
        };
        ctx.lex_env = saved;
        let c = result?;
        if c.value.is_some() {
            last = c.value.clone();
        }
        if let Some(exit) = loop_exit(c, &last) {
            return Ok(exit);
        }
    }
    Ok(Completion {
        completion_type: CompletionType::Normal,
        value: last,
    })
}

fn execute_try_statement(
    block: &BlockStatementData,
    handler: Option<&CatchClauseData>,
    finalizer: Option<&BlockStatementData>,
    ctx: &mut EvalContext,
) -> EvalResult {
    let result = match (execute_block_statement(block, ctx), handler) {
        (Err(e), Some(h)) => {
            let thrown = ctx.intrinsics().error_to_js_value(&e);
            let saved = ctx.lex_env.clone();
            ctx.push_block_scope();
            if let Some(param) = &h.param {
                ctx.lex_env
                    .inner
                    .borrow_mut()
                    .declare(param.name.to_string(), thrown);
            }
            let r = execute_block_statement(&h.body, ctx);
            ctx.lex_env = saved;
            r
        }
        (r, _) => r,
    };
    if let Some(f) = finalizer {
        let c = execute_block_statement(f, ctx)?;
        if c.is_abrupt() {
            return Ok(c);
        }
    }
    result
}
