//! Expression evaluation.
//!
//! Every expression form of the AST is handled here. Identifier lookups go
//! through the lexical environment chain of the context, which ends in the
//! active global layer (the host global or a sandbox namespace).

use std::rc::Rc;

use crate::parser::ast::{
    AssignmentOperator, BinaryOperator, ExpressionType, LiteralData, LiteralType,
    LogicalOperator, MemberProperty, NumberLiteralType, PropertyKeyType, UnaryOperator,
    UpdateOperator,
};
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::function_object::FunctionKind;
use crate::runner::ds::object::ObjectKind;
use crate::runner::ds::operations::lex_env::{
    get_identifier_value, get_identifier_value_and_this, put_identifier_value, resolve_binding,
    ResolvedBinding,
};
use crate::runner::ds::operations::object::{delete, get, get_v, has_property, set_v};
use crate::runner::ds::operations::test_and_comparison::{
    is_callable, is_less_than, is_loosely_equal, is_strictly_equal,
};
use crate::runner::ds::operations::type_conversion::{
    to_boolean, to_number, to_primitive, to_string, type_of,
};
use crate::runner::ds::value::{JsNumberType, JsValue};
use crate::runner::host::types::EvalContext;

use super::function::{call_function, construct, create_class_object, create_function_object};
use super::statement::perform_direct_eval;
use super::types::{Reference, ValueResult};

/// Evaluate an expression and return its value.
pub fn evaluate_expression(expr: &ExpressionType, ctx: &mut EvalContext) -> ValueResult {
    match expr {
        ExpressionType::Literal(lit) => Ok(evaluate_literal(lit)),

        ExpressionType::Identifier(id) => get_identifier_value(&ctx.lex_env, &id.name),

        ExpressionType::ThisExpression { .. } => Ok(ctx.this_value.clone()),

        ExpressionType::ArrayExpression { elements, .. } => {
            let mut items = Vec::with_capacity(elements.len());
            for e in elements {
                items.push(evaluate_expression(e, ctx)?);
            }
            Ok(ctx.intrinsics().new_array(items))
        }

        ExpressionType::ObjectExpression { properties, .. } => {
            let o = ctx.intrinsics().new_plain_object();
            for p in properties {
                let key = match &p.key {
                    PropertyKeyType::Static(k) => k.to_string(),
                    PropertyKeyType::Computed(e) => to_string(&evaluate_expression(e, ctx)?),
                };
                let value = evaluate_expression(&p.value, ctx)?;
                o.borrow_mut().put(key, value);
            }
            Ok(JsValue::Object(o))
        }

        ExpressionType::FunctionExpression(data) => Ok(create_function_object(ctx, data, true)),

        ExpressionType::ArrowFunctionExpression(data) => {
            Ok(create_function_object(ctx, data, true))
        }

        ExpressionType::ClassExpression(data) => Ok(create_class_object(ctx, data)),

        ExpressionType::UnaryExpression {
            operator, argument, ..
        } => evaluate_unary_expression(operator, argument, ctx),

        ExpressionType::UpdateExpression {
            operator,
            argument,
            prefix,
            ..
        } => evaluate_update_expression(operator, argument, *prefix, ctx),

        ExpressionType::BinaryExpression {
            operator,
            left,
            right,
            ..
        } => {
            let left_val = evaluate_expression(left, ctx)?;
            let right_val = evaluate_expression(right, ctx)?;
            evaluate_binary_operator(operator, &left_val, &right_val)
        }

        ExpressionType::LogicalExpression {
            operator,
            left,
            right,
            ..
        } => evaluate_logical_expression(operator, left, right, ctx),

        ExpressionType::AssignmentExpression {
            operator,
            left,
            right,
            ..
        } => evaluate_assignment_expression(operator, left, right, ctx),

        ExpressionType::ConditionalExpression {
            test,
            consequent,
            alternate,
            ..
        } => {
            if to_boolean(&evaluate_expression(test, ctx)?) {
                evaluate_expression(consequent, ctx)
            } else {
                evaluate_expression(alternate, ctx)
            }
        }

        ExpressionType::CallExpression {
            callee, arguments, ..
        } => evaluate_call_expression(callee, arguments, ctx),

        ExpressionType::NewExpression {
            callee, arguments, ..
        } => {
            let f = evaluate_expression(callee, ctx)?;
            let args = evaluate_arguments(arguments, ctx)?;
            if !is_callable(&f) {
                return Err(JErrorType::TypeError(format!(
                    "{} is not a constructor",
                    describe_callee(callee)
                )));
            }
            construct(ctx, &f, args)
        }

        ExpressionType::MemberExpression {
            object, property, ..
        } => {
            let base = evaluate_expression(object, ctx)?;
            let key = evaluate_member_key(property, ctx)?;
            get_property(ctx, &base, &key)
        }

        ExpressionType::SequenceExpression { expressions, .. } => {
            let mut result = JsValue::Undefined;
            for e in expressions {
                result = evaluate_expression(e, ctx)?;
            }
            Ok(result)
        }
    }
}

fn evaluate_literal(lit: &LiteralData) -> JsValue {
    match &lit.value {
        LiteralType::NullLiteral => JsValue::Null,
        LiteralType::BooleanLiteral(b) => JsValue::Boolean(*b),
        LiteralType::StringLiteral(s) => JsValue::String(s.to_string()),
        LiteralType::NumberLiteral(NumberLiteralType::IntegerLiteral(i)) => JsValue::integer(*i),
        LiteralType::NumberLiteral(NumberLiteralType::FloatLiteral(f)) => JsValue::number(*f),
    }
}

fn evaluate_member_key(property: &MemberProperty, ctx: &mut EvalContext) -> Result<String, JErrorType> {
    Ok(match property {
        MemberProperty::Static(id) => id.name.to_string(),
        MemberProperty::Computed(e) => to_string(&evaluate_expression(e, ctx)?),
    })
}

/// Property read that also finds the string methods for primitive strings.
pub fn get_property(ctx: &EvalContext, base: &JsValue, key: &str) -> ValueResult {
    if let JsValue::String(_) = base {
        let v = get_v(base, key)?;
        if v.is_undefined() {
            return get(&ctx.intrinsics().string_prototype, key);
        }
        return Ok(v);
    }
    get_v(base, key)
}

pub fn evaluate_arguments(
    arguments: &[ExpressionType],
    ctx: &mut EvalContext,
) -> Result<Vec<JsValue>, JErrorType> {
    let mut args = Vec::with_capacity(arguments.len());
    for a in arguments {
        args.push(evaluate_expression(a, ctx)?);
    }
    Ok(args)
}

/// Readable name of a callee, for error messages.
fn describe_callee(callee: &ExpressionType) -> String {
    match callee {
        ExpressionType::Identifier(id) => id.name.to_string(),
        ExpressionType::ThisExpression { .. } => "this".to_string(),
        ExpressionType::MemberExpression {
            object,
            property: MemberProperty::Static(id),
            ..
        } => format!("{}.{}", describe_callee(object), id.name),
        ExpressionType::MemberExpression { object, .. } => {
            format!("{}[...]", describe_callee(object))
        }
        _ => "expression".to_string(),
    }
}

fn evaluate_call_expression(
    callee: &ExpressionType,
    arguments: &[ExpressionType],
    ctx: &mut EvalContext,
) -> ValueResult {
    let (func, this) = match callee {
        ExpressionType::MemberExpression {
            object, property, ..
        } => {
            let base = evaluate_expression(object, ctx)?;
            let key = evaluate_member_key(property, ctx)?;
            (get_property(ctx, &base, &key)?, base)
        }
        ExpressionType::Identifier(id) => get_identifier_value_and_this(&ctx.lex_env, &id.name)?,
        _ => (evaluate_expression(callee, ctx)?, JsValue::Undefined),
    };
    let args = evaluate_arguments(arguments, ctx)?;

    if let ExpressionType::Identifier(id) = callee {
        if id.name == "eval" && is_eval_primitive(&func) {
            return perform_direct_eval(ctx, args.into_iter().next().unwrap_or(JsValue::Undefined));
        }
    }

    if !is_callable(&func) {
        return Err(JErrorType::TypeError(format!(
            "{} is not a function",
            describe_callee(callee)
        )));
    }
    call_function(ctx, &func, this, args)
}

fn is_eval_primitive(v: &JsValue) -> bool {
    match v {
        JsValue::Object(o) => o.borrow().as_function().map_or(false, |f| f.is_eval()),
        _ => false,
    }
}

/// Evaluate an assignment or update target into a [`Reference`].
fn evaluate_reference(expr: &ExpressionType, ctx: &mut EvalContext) -> Result<Reference, JErrorType> {
    match expr {
        ExpressionType::Identifier(id) => Ok(Reference::Identifier {
            env: ctx.lex_env.clone(),
            name: id.name.to_string(),
        }),
        ExpressionType::MemberExpression {
            object, property, ..
        } => {
            let base = evaluate_expression(object, ctx)?;
            let name = evaluate_member_key(property, ctx)?;
            Ok(Reference::Property { base, name })
        }
        _ => Err(JErrorType::SyntaxError(
            "Invalid left-hand side in assignment".to_string(),
        )),
    }
}

fn get_reference_value(reference: &Reference, ctx: &EvalContext) -> ValueResult {
    match reference {
        Reference::Identifier { env, name } => get_identifier_value(env, name),
        Reference::Property { base, name } => get_property(ctx, base, name),
    }
}

fn put_reference_value(reference: &Reference, value: JsValue) -> Result<(), JErrorType> {
    match reference {
        Reference::Identifier { env, name } => {
            put_identifier_value(env, name, value)
        }
        Reference::Property { base, name } => set_v(base, name, value),
    }
}

fn evaluate_assignment_expression(
    operator: &AssignmentOperator,
    left: &ExpressionType,
    right: &ExpressionType,
    ctx: &mut EvalContext,
) -> ValueResult {
    let reference = evaluate_reference(left, ctx)?;
    let final_value = match operator {
        AssignmentOperator::Equals => evaluate_expression(right, ctx)?,
        op => {
            let current = get_reference_value(&reference, ctx)?;
            let rhs = evaluate_expression(right, ctx)?;
            let binary = match op {
                AssignmentOperator::AddEquals => BinaryOperator::Add,
                AssignmentOperator::SubtractEquals => BinaryOperator::Subtract,
                AssignmentOperator::MultiplyEquals => BinaryOperator::Multiply,
                AssignmentOperator::DivideEquals => BinaryOperator::Divide,
                _ => BinaryOperator::Modulo,
            };
            evaluate_binary_operator(&binary, &current, &rhs)?
        }
    };
    put_reference_value(&reference, final_value.clone())?;
    Ok(final_value)
}

fn evaluate_update_expression(
    operator: &UpdateOperator,
    argument: &ExpressionType,
    prefix: bool,
    ctx: &mut EvalContext,
) -> ValueResult {
    let reference = evaluate_reference(argument, ctx)?;
    let old = JsValue::Number(to_number(&get_reference_value(&reference, ctx)?));
    let delta = match operator {
        UpdateOperator::PlusPlus => JsValue::integer(1),
        UpdateOperator::MinusMinus => JsValue::integer(-1),
    };
    let new = add_numbers(&old, &delta);
    put_reference_value(&reference, new.clone())?;
    Ok(if prefix { new } else { old })
}

fn evaluate_unary_expression(
    operator: &UnaryOperator,
    argument: &ExpressionType,
    ctx: &mut EvalContext,
) -> ValueResult {
    match operator {
        UnaryOperator::TypeOf => {
            // `typeof` of an undeclared identifier is not an error.
            if let ExpressionType::Identifier(id) = argument {
                if let ResolvedBinding::Unresolvable(_) = resolve_binding(&ctx.lex_env, &id.name) {
                    return Ok(JsValue::string("undefined"));
                }
            }
            let value = evaluate_expression(argument, ctx)?;
            Ok(JsValue::string(type_of(&value)))
        }
        UnaryOperator::Void => {
            evaluate_expression(argument, ctx)?;
            Ok(JsValue::Undefined)
        }
        UnaryOperator::LogicalNot => {
            let value = evaluate_expression(argument, ctx)?;
            Ok(JsValue::Boolean(!to_boolean(&value)))
        }
        UnaryOperator::Minus => {
            let value = evaluate_expression(argument, ctx)?;
            Ok(negate_number(to_number(&value)))
        }
        UnaryOperator::Plus => {
            let value = evaluate_expression(argument, ctx)?;
            Ok(JsValue::Number(to_number(&value)))
        }
        UnaryOperator::Delete => evaluate_delete(argument, ctx),
    }
}

fn evaluate_delete(argument: &ExpressionType, ctx: &mut EvalContext) -> ValueResult {
    match argument {
        ExpressionType::Identifier(id) => match resolve_binding(&ctx.lex_env, &id.name) {
            ResolvedBinding::Declarative(_) => Ok(JsValue::Boolean(false)),
            ResolvedBinding::Global(global) => Ok(JsValue::Boolean(global.delete_binding(&id.name)?)),
            ResolvedBinding::Unresolvable(_) => Ok(JsValue::Boolean(true)),
        },
        ExpressionType::MemberExpression {
            object, property, ..
        } => {
            let base = evaluate_expression(object, ctx)?;
            let key = evaluate_member_key(property, ctx)?;
            match base {
                JsValue::Object(o) => Ok(JsValue::Boolean(delete(&o, &key)?)),
                JsValue::Undefined | JsValue::Null => Err(JErrorType::TypeError(format!(
                    "Cannot convert {} to object",
                    to_string(&base)
                ))),
                _ => Ok(JsValue::Boolean(true)),
            }
        }
        other => {
            evaluate_expression(other, ctx)?;
            Ok(JsValue::Boolean(true))
        }
    }
}

fn negate_number(n: JsNumberType) -> JsValue {
    JsValue::Number(match n {
        JsNumberType::Integer(0) => JsNumberType::Float(-0.0),
        JsNumberType::Integer(i) => JsNumberType::Integer(-i),
        JsNumberType::Float(f) => JsNumberType::from_f64(-f),
        JsNumberType::PositiveInfinity => JsNumberType::NegativeInfinity,
        JsNumberType::NegativeInfinity => JsNumberType::PositiveInfinity,
        JsNumberType::NaN => JsNumberType::NaN,
    })
}

fn evaluate_logical_expression(
    operator: &LogicalOperator,
    left: &ExpressionType,
    right: &ExpressionType,
    ctx: &mut EvalContext,
) -> ValueResult {
    let left_val = evaluate_expression(left, ctx)?;
    match operator {
        LogicalOperator::And => {
            if !to_boolean(&left_val) {
                Ok(left_val)
            } else {
                evaluate_expression(right, ctx)
            }
        }
        LogicalOperator::Or => {
            if to_boolean(&left_val) {
                Ok(left_val)
            } else {
                evaluate_expression(right, ctx)
            }
        }
        LogicalOperator::NullishCoalescing => {
            if left_val.is_nullish() {
                evaluate_expression(right, ctx)
            } else {
                Ok(left_val)
            }
        }
    }
}

/// Applies a binary operator to two evaluated operands.
pub fn evaluate_binary_operator(
    operator: &BinaryOperator,
    left: &JsValue,
    right: &JsValue,
) -> ValueResult {
    Ok(match operator {
        BinaryOperator::Add => {
            let lp = to_primitive(left);
            let rp = to_primitive(right);
            if matches!(lp, JsValue::String(_)) || matches!(rp, JsValue::String(_)) {
                JsValue::String(format!("{}{}", to_string(&lp), to_string(&rp)))
            } else {
                add_numbers(&lp, &rp)
            }
        }
        BinaryOperator::Subtract => {
            apply_numeric_op(left, right, i64::checked_sub, |a, b| a - b)
        }
        BinaryOperator::Multiply => {
            apply_numeric_op(left, right, i64::checked_mul, |a, b| a * b)
        }
        BinaryOperator::Divide => {
            let a = to_number(left).as_f64();
            let b = to_number(right).as_f64();
            JsValue::Number(JsNumberType::from_f64(a / b))
        }
        BinaryOperator::Modulo => {
            let a = to_number(left).as_f64();
            let b = to_number(right).as_f64();
            JsValue::Number(JsNumberType::from_f64(a % b))
        }
        BinaryOperator::LessThan => JsValue::Boolean(is_less_than(left, right) == Some(true)),
        BinaryOperator::GreaterThan => JsValue::Boolean(is_less_than(right, left) == Some(true)),
        BinaryOperator::LessThanEqual => {
            JsValue::Boolean(is_less_than(right, left) == Some(false))
        }
        BinaryOperator::GreaterThanEqual => {
            JsValue::Boolean(is_less_than(left, right) == Some(false))
        }
        BinaryOperator::StrictlyEqual => JsValue::Boolean(is_strictly_equal(left, right)),
        BinaryOperator::StrictlyUnequal => JsValue::Boolean(!is_strictly_equal(left, right)),
        BinaryOperator::LooselyEqual => JsValue::Boolean(is_loosely_equal(left, right)),
        BinaryOperator::LooselyUnequal => JsValue::Boolean(!is_loosely_equal(left, right)),
        BinaryOperator::In => JsValue::Boolean(has_property(right, &to_string(left))?),
        BinaryOperator::InstanceOf => JsValue::Boolean(instance_of(left, right)?),
    })
}

fn add_numbers(left: &JsValue, right: &JsValue) -> JsValue {
    apply_numeric_op(left, right, i64::checked_add, |a, b| a + b)
}

/// Integer arithmetic while it stays exact, `f64` otherwise.
fn apply_numeric_op<F, G>(left: &JsValue, right: &JsValue, int_op: F, float_op: G) -> JsValue
where
    F: Fn(i64, i64) -> Option<i64>,
    G: Fn(f64, f64) -> f64,
{
    let a = to_number(left);
    let b = to_number(right);
    if let (JsNumberType::Integer(x), JsNumberType::Integer(y)) = (&a, &b) {
        if let Some(r) = int_op(*x, *y) {
            return JsValue::Number(JsNumberType::from_f64(r as f64));
        }
    }
    JsValue::Number(JsNumberType::from_f64(float_op(a.as_f64(), b.as_f64())))
}

fn instance_of(left: &JsValue, right: &JsValue) -> Result<bool, JErrorType> {
    let target = match right {
        JsValue::Object(o) if o.borrow().is_callable() => o.clone(),
        _ => {
            return Err(JErrorType::TypeError(
                "Right-hand side of 'instanceof' is not callable".to_string(),
            ))
        }
    };
    // A bound function tests against its target.
    let bound_target = match &target.borrow().kind {
        ObjectKind::Function(f) => match &f.kind {
            FunctionKind::Bound(b) => Some(b.target.clone()),
            _ => None,
        },
        _ => None,
    };
    if let Some(t) = bound_target {
        return instance_of(left, &JsValue::Object(t));
    }
    let prototype = match get(&target, "prototype")? {
        JsValue::Object(p) => p,
        _ => return Ok(false),
    };
    let mut current = match left {
        JsValue::Object(o) => o.borrow().prototype.clone(),
        _ => return Ok(false),
    };
    while let Some(p) = current {
        if Rc::ptr_eq(&p, &prototype) {
            return Ok(true);
        }
        current = p.borrow().prototype.clone();
    }
    Ok(false)
}
