use std::rc::Rc;

use pest::error::{Error, ErrorVariant};
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

use super::ast::*;

#[derive(Parser)]
#[grammar = "parser/js_grammar.pest"] // relative to src
pub struct JsParser;

type BuildResult<T> = Result<T, Error<Rule>>;

impl JsParser {
    /// Parses a complete script into its AST.
    pub fn parse_to_ast_from_str(script: &str) -> BuildResult<ProgramData> {
        let mut pairs = JsParser::parse(Rule::script, script)?;
        let meta = Meta {
            start_index: 0,
            end_index: script.len(),
        };
        let mut body = vec![];
        if let Some(script_pair) = pairs.next() {
            for pair in script_pair.into_inner() {
                match pair.as_rule() {
                    Rule::statement => body.push(build_ast_from_statement(pair)?),
                    Rule::EOI => { /* Do nothing */ }
                    _ => return Err(get_unexpected_error("script", &pair)),
                }
            }
        }
        Ok(ProgramData { meta, body })
    }
}

fn get_meta(pair: &Pair<Rule>) -> Meta {
    let span = pair.as_span();
    Meta {
        start_index: span.start(),
        end_index: span.end(),
    }
}

fn joined_meta(start: &Meta, end: &Meta) -> Meta {
    Meta {
        start_index: start.start_index,
        end_index: end.end_index,
    }
}

fn get_unexpected_error(context: &str, pair: &Pair<Rule>) -> Error<Rule> {
    Error::new_from_span(
        ErrorVariant::CustomError {
            message: format!("Unexpected {:?} while building {}", pair.as_rule(), context),
        },
        pair.as_span(),
    )
}

fn get_custom_error(message: &str, pair: &Pair<Rule>) -> Error<Rule> {
    Error::new_from_span(
        ErrorVariant::CustomError {
            message: message.to_string(),
        },
        pair.as_span(),
    )
}

fn is_keyword(rule: Rule) -> bool {
    matches!(
        rule,
        Rule::k_break
            | Rule::k_catch
            | Rule::k_class
            | Rule::k_continue
            | Rule::k_delete
            | Rule::k_do
            | Rule::k_else
            | Rule::k_finally
            | Rule::k_for
            | Rule::k_function
            | Rule::k_if
            | Rule::k_in
            | Rule::k_instanceof
            | Rule::k_new
            | Rule::k_return
            | Rule::k_static
            | Rule::k_throw
            | Rule::k_try
            | Rule::k_typeof
            | Rule::k_void
            | Rule::k_while
    )
}

/// Inner pairs of `pair` with keyword tokens dropped.
fn significant<'i>(pair: Pair<'i, Rule>) -> impl Iterator<Item = Pair<'i, Rule>> {
    pair.into_inner().filter(|p| !is_keyword(p.as_rule()))
}

fn first_inner<'i>(pair: &Pair<'i, Rule>) -> BuildResult<Pair<'i, Rule>> {
    significant(pair.clone())
        .next()
        .ok_or_else(|| get_custom_error("Unexpected end of rule", pair))
}

fn next_pair<'i>(
    iter: &mut impl Iterator<Item = Pair<'i, Rule>>,
    parent: &Pair<'i, Rule>,
) -> BuildResult<Pair<'i, Rule>> {
    iter.next()
        .ok_or_else(|| get_custom_error("Unexpected end of rule", parent))
}

fn get_identifier_data(pair: &Pair<Rule>) -> IdentifierData {
    IdentifierData {
        name: pair.as_str().to_string(),
        meta: get_meta(pair),
    }
}

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

fn build_ast_from_statement(pair: Pair<Rule>) -> BuildResult<StatementType> {
    let inner_pair = first_inner(&pair)?;
    let meta = get_meta(&inner_pair);
    Ok(match inner_pair.as_rule() {
        Rule::block_statement => StatementType::BlockStatement(build_ast_from_block(inner_pair)?),
        Rule::variable_statement => {
            let declaration = first_inner(&inner_pair)?;
            StatementType::VariableDeclaration(build_ast_from_variable_declaration(declaration)?)
        }
        Rule::function_declaration => {
            StatementType::FunctionDeclaration(Rc::new(build_ast_from_function(inner_pair)?))
        }
        Rule::class_declaration => {
            StatementType::ClassDeclaration(Rc::new(build_ast_from_class(inner_pair)?))
        }
        Rule::empty_statement => StatementType::EmptyStatement { meta },
        Rule::if_statement => {
            let parent = inner_pair.clone();
            let mut inner = significant(inner_pair);
            let test = build_ast_from_expression(next_pair(&mut inner, &parent)?)?;
            let consequent = build_ast_from_statement(next_pair(&mut inner, &parent)?)?;
            let alternate = match inner.next() {
                Some(p) => Some(Box::new(build_ast_from_statement(p)?)),
                None => None,
            };
            StatementType::IfStatement {
                meta,
                test: Box::new(test),
                consequent: Box::new(consequent),
                alternate,
            }
        }
        Rule::while_statement => {
            let parent = inner_pair.clone();
            let mut inner = significant(inner_pair);
            let test = build_ast_from_expression(next_pair(&mut inner, &parent)?)?;
            let body = build_ast_from_statement(next_pair(&mut inner, &parent)?)?;
            StatementType::WhileStatement {
                meta,
                test: Box::new(test),
                body: Box::new(body),
            }
        }
        Rule::do_while_statement => {
            let parent = inner_pair.clone();
            let mut inner = significant(inner_pair);
            let body = build_ast_from_statement(next_pair(&mut inner, &parent)?)?;
            let test = build_ast_from_expression(next_pair(&mut inner, &parent)?)?;
            StatementType::DoWhileStatement {
                meta,
                body: Box::new(body),
                test: Box::new(test),
            }
        }
        Rule::for_statement => build_ast_from_for_statement(inner_pair)?,
        Rule::for_in_statement => build_ast_from_for_in_statement(inner_pair)?,
        Rule::continue_statement => StatementType::ContinueStatement { meta },
        Rule::break_statement => StatementType::BreakStatement { meta },
        Rule::return_statement => {
            let argument = match significant(inner_pair).next() {
                Some(p) => Some(Box::new(build_ast_from_expression(p)?)),
                None => None,
            };
            StatementType::ReturnStatement { meta, argument }
        }
        Rule::throw_statement => {
            let argument = build_ast_from_expression(first_inner(&inner_pair)?)?;
            StatementType::ThrowStatement {
                meta,
                argument: Box::new(argument),
            }
        }
        Rule::try_statement => build_ast_from_try_statement(inner_pair)?,
        Rule::expression_statement => {
            let expression = build_ast_from_expression(first_inner(&inner_pair)?)?;
            StatementType::ExpressionStatement {
                meta,
                expression: Box::new(expression),
            }
        }
        _ => return Err(get_unexpected_error("statement", &inner_pair)),
    })
}

fn build_ast_from_statement_list(pair: Pair<Rule>) -> BuildResult<Vec<StatementType>> {
    let mut statements = vec![];
    for p in significant(pair) {
        statements.push(build_ast_from_statement(p)?);
    }
    Ok(statements)
}

fn build_ast_from_block(pair: Pair<Rule>) -> BuildResult<BlockStatementData> {
    let meta = get_meta(&pair);
    Ok(BlockStatementData {
        meta,
        body: build_ast_from_statement_list(pair)?,
    })
}

fn get_declaration_kind(pair: &Pair<Rule>) -> BuildResult<VariableDeclarationKind> {
    match pair.as_str() {
        "var" => Ok(VariableDeclarationKind::Var),
        "let" => Ok(VariableDeclarationKind::Let),
        "const" => Ok(VariableDeclarationKind::Const),
        _ => Err(get_unexpected_error("declaration kind", pair)),
    }
}

fn build_ast_from_variable_declaration(pair: Pair<Rule>) -> BuildResult<VariableDeclarationData> {
    let meta = get_meta(&pair);
    let parent = pair.clone();
    let mut inner = significant(pair);
    let kind = get_declaration_kind(&next_pair(&mut inner, &parent)?)?;
    let mut declarations = vec![];
    for declarator in inner {
        let declarator_meta = get_meta(&declarator);
        let mut parts = significant(declarator.clone());
        let id = get_identifier_data(&next_pair(&mut parts, &declarator)?);
        let init = match parts.next() {
            Some(p) => Some(Box::new(build_ast_from_assignment_expression(p)?)),
            None => None,
        };
        if init.is_none() && kind == VariableDeclarationKind::Const {
            return Err(get_custom_error(
                "Missing initializer in const declaration",
                &declarator,
            ));
        }
        declarations.push(VariableDeclaratorData {
            meta: declarator_meta,
            id,
            init,
        });
    }
    Ok(VariableDeclarationData {
        meta,
        kind,
        declarations,
    })
}

fn build_ast_from_for_statement(pair: Pair<Rule>) -> BuildResult<StatementType> {
    let meta = get_meta(&pair);
    let mut init = None;
    let mut test = None;
    let mut update = None;
    let mut body = None;
    for p in significant(pair.clone()) {
        match p.as_rule() {
            Rule::for_init => {
                let inner = first_inner(&p)?;
                init = Some(match inner.as_rule() {
                    Rule::variable_declaration => VariableDeclarationOrExpression::VariableDeclaration(
                        build_ast_from_variable_declaration(inner)?,
                    ),
                    _ => VariableDeclarationOrExpression::Expression(Box::new(
                        build_ast_from_expression(inner)?,
                    )),
                });
            }
            Rule::for_test => test = Some(Box::new(build_ast_from_expression(first_inner(&p)?)?)),
            Rule::for_update => {
                update = Some(Box::new(build_ast_from_expression(first_inner(&p)?)?))
            }
            Rule::statement => body = Some(Box::new(build_ast_from_statement(p)?)),
            _ => return Err(get_unexpected_error("for statement", &p)),
        }
    }
    let body = body.ok_or_else(|| get_custom_error("Missing for loop body", &pair))?;
    Ok(StatementType::ForStatement {
        meta,
        init,
        test,
        update,
        body,
    })
}

fn build_ast_from_for_in_statement(pair: Pair<Rule>) -> BuildResult<StatementType> {
    let meta = get_meta(&pair);
    let parent = pair.clone();
    let mut inner = significant(pair);
    let left_pair = next_pair(&mut inner, &parent)?;
    let mut kind = None;
    let mut id = None;
    for p in significant(left_pair.clone()) {
        match p.as_rule() {
            Rule::declaration_kind => kind = Some(get_declaration_kind(&p)?),
            Rule::identifier => id = Some(get_identifier_data(&p)),
            _ => return Err(get_unexpected_error("for-in target", &p)),
        }
    }
    let id = id.ok_or_else(|| get_custom_error("Missing for-in binding", &left_pair))?;
    let right = build_ast_from_expression(next_pair(&mut inner, &parent)?)?;
    let body = build_ast_from_statement(next_pair(&mut inner, &parent)?)?;
    Ok(StatementType::ForInStatement {
        meta,
        left: ForInTarget { kind, id },
        right: Box::new(right),
        body: Box::new(body),
    })
}

fn build_ast_from_try_statement(pair: Pair<Rule>) -> BuildResult<StatementType> {
    let meta = get_meta(&pair);
    let mut block = None;
    let mut handler = None;
    let mut finalizer = None;
    for p in significant(pair.clone()) {
        match p.as_rule() {
            Rule::block_statement => block = Some(build_ast_from_block(p)?),
            Rule::catch_clause => {
                let catch_meta = get_meta(&p);
                let mut param = None;
                let mut body = None;
                for c in significant(p) {
                    match c.as_rule() {
                        Rule::identifier => param = Some(get_identifier_data(&c)),
                        Rule::block_statement => body = Some(build_ast_from_block(c)?),
                        _ => return Err(get_unexpected_error("catch clause", &c)),
                    }
                }
                let body = body.ok_or_else(|| get_custom_error("Missing catch block", &pair))?;
                handler = Some(CatchClauseData {
                    meta: catch_meta,
                    param,
                    body,
                });
            }
            Rule::finally_clause => finalizer = Some(build_ast_from_block(first_inner(&p)?)?),
            _ => return Err(get_unexpected_error("try statement", &p)),
        }
    }
    let block = block.ok_or_else(|| get_custom_error("Missing try block", &pair))?;
    if handler.is_none() && finalizer.is_none() {
        return Err(get_custom_error("Missing catch or finally after try", &pair));
    }
    Ok(StatementType::TryStatement {
        meta,
        block,
        handler,
        finalizer,
    })
}

// ---------------------------------------------------------------------------
// Functions and classes
// ---------------------------------------------------------------------------

fn build_ast_from_formal_parameters(pair: Pair<Rule>) -> Vec<IdentifierData> {
    significant(pair)
        .map(|p| get_identifier_data(&p))
        .collect()
}

/// Builds `function_declaration`, `function_expression` and `method_definition`.
fn build_ast_from_function(pair: Pair<Rule>) -> BuildResult<FunctionData> {
    let meta = get_meta(&pair);
    let source = pair.as_str().to_string();
    let mut id = None;
    let mut params = vec![];
    let mut body = None;
    for p in significant(pair.clone()) {
        match p.as_rule() {
            Rule::identifier => id = Some(get_identifier_data(&p)),
            Rule::property_name => {
                if let PropertyKeyType::Static(name) = build_ast_from_property_name(p.clone())? {
                    id = Some(IdentifierData {
                        name,
                        meta: get_meta(&p),
                    });
                }
            }
            Rule::formal_parameters => params = build_ast_from_formal_parameters(p),
            Rule::function_body => body = Some(build_ast_from_statement_list(p)?),
            _ => return Err(get_unexpected_error("function", &p)),
        }
    }
    let body = body.ok_or_else(|| get_custom_error("Missing function body", &pair))?;
    Ok(FunctionData {
        meta,
        id,
        params,
        body: FunctionBodyType::Block(body),
        is_arrow: false,
        source,
    })
}

fn build_ast_from_arrow_function(pair: Pair<Rule>) -> BuildResult<FunctionData> {
    let meta = get_meta(&pair);
    let source = pair.as_str().to_string();
    let parent = pair.clone();
    let mut inner = significant(pair);
    let params = build_ast_from_formal_parameters(next_pair(&mut inner, &parent)?);
    let body_pair = first_inner(&next_pair(&mut inner, &parent)?)?;
    let body = match body_pair.as_rule() {
        Rule::function_body => FunctionBodyType::Block(build_ast_from_statement_list(body_pair)?),
        _ => FunctionBodyType::Expression(Box::new(build_ast_from_assignment_expression(
            body_pair,
        )?)),
    };
    Ok(FunctionData {
        meta,
        id: None,
        params,
        body,
        is_arrow: true,
        source,
    })
}

fn build_ast_from_class(pair: Pair<Rule>) -> BuildResult<ClassData> {
    let meta = get_meta(&pair);
    let source = pair.as_str().to_string();
    let mut id = None;
    let mut constructor = None;
    let mut methods = vec![];
    for p in significant(pair) {
        match p.as_rule() {
            Rule::identifier => id = Some(get_identifier_data(&p)),
            Rule::class_body => {
                for element in p.into_inner() {
                    let mut is_static = false;
                    for part in element.clone().into_inner() {
                        match part.as_rule() {
                            Rule::k_static => is_static = true,
                            Rule::method_definition => {
                                let function = build_ast_from_function(part.clone())?;
                                let key = match &function.id {
                                    Some(id) => id.name.clone(),
                                    None => {
                                        return Err(get_custom_error(
                                            "Computed class member names are not supported",
                                            &part,
                                        ))
                                    }
                                };
                                if key == "constructor" && !is_static {
                                    constructor = Some(Rc::new(function));
                                } else {
                                    methods.push(ClassMethodData {
                                        key,
                                        is_static,
                                        function: Rc::new(function),
                                    });
                                }
                            }
                            _ => return Err(get_unexpected_error("class element", &part)),
                        }
                    }
                }
            }
            _ => return Err(get_unexpected_error("class", &p)),
        }
    }
    Ok(ClassData {
        meta,
        id,
        constructor,
        methods,
        source,
    })
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

fn build_ast_from_expression(pair: Pair<Rule>) -> BuildResult<ExpressionType> {
    let meta = get_meta(&pair);
    let mut expressions = vec![];
    for p in significant(pair) {
        expressions.push(build_ast_from_assignment_expression(p)?);
    }
    if expressions.len() == 1 {
        Ok(expressions.remove(0))
    } else {
        Ok(ExpressionType::SequenceExpression { meta, expressions })
    }
}

fn is_assignment_target(expr: &ExpressionType) -> bool {
    matches!(
        expr,
        ExpressionType::Identifier(_) | ExpressionType::MemberExpression { .. }
    )
}

fn build_ast_from_assignment_expression(pair: Pair<Rule>) -> BuildResult<ExpressionType> {
    let meta = get_meta(&pair);
    let parent = pair.clone();
    let mut inner = significant(pair);
    let first = next_pair(&mut inner, &parent)?;
    if first.as_rule() == Rule::arrow_function {
        return Ok(ExpressionType::ArrowFunctionExpression(Rc::new(
            build_ast_from_arrow_function(first)?,
        )));
    }
    let left = build_ast_from_conditional_expression(first)?;
    let operator_pair = match inner.next() {
        Some(p) => p,
        None => return Ok(left),
    };
    if !is_assignment_target(&left) {
        return Err(get_custom_error("Invalid left-hand side in assignment", &parent));
    }
    let operator = match operator_pair.as_str() {
        "=" => AssignmentOperator::Equals,
        "+=" => AssignmentOperator::AddEquals,
        "-=" => AssignmentOperator::SubtractEquals,
        "*=" => AssignmentOperator::MultiplyEquals,
        "/=" => AssignmentOperator::DivideEquals,
        "%=" => AssignmentOperator::ModuloEquals,
        _ => return Err(get_unexpected_error("assignment operator", &operator_pair)),
    };
    let right = build_ast_from_assignment_expression(next_pair(&mut inner, &parent)?)?;
    Ok(ExpressionType::AssignmentExpression {
        meta,
        operator,
        left: Box::new(left),
        right: Box::new(right),
    })
}

fn build_ast_from_conditional_expression(pair: Pair<Rule>) -> BuildResult<ExpressionType> {
    let meta = get_meta(&pair);
    let parent = pair.clone();
    let mut inner = significant(pair);
    let test = build_ast_from_logical_chain(next_pair(&mut inner, &parent)?)?;
    match inner.next() {
        None => Ok(test),
        Some(consequent) => {
            let consequent = build_ast_from_assignment_expression(consequent)?;
            let alternate = build_ast_from_assignment_expression(next_pair(&mut inner, &parent)?)?;
            Ok(ExpressionType::ConditionalExpression {
                meta,
                test: Box::new(test),
                consequent: Box::new(consequent),
                alternate: Box::new(alternate),
            })
        }
    }
}

/// `??`, `||` and `&&` levels. Their operators are bare literals in the grammar,
/// so the children are operands only.
fn build_ast_from_logical_chain(pair: Pair<Rule>) -> BuildResult<ExpressionType> {
    let operator = match pair.as_rule() {
        Rule::coalesce_expression => LogicalOperator::NullishCoalescing,
        Rule::logical_or_expression => LogicalOperator::Or,
        Rule::logical_and_expression => LogicalOperator::And,
        Rule::equality_expression => return build_ast_from_binary_chain(pair),
        _ => return Err(get_unexpected_error("logical expression", &pair)),
    };
    let parent = pair.clone();
    let mut inner = significant(pair);
    let mut left = build_ast_from_logical_chain(next_pair(&mut inner, &parent)?)?;
    for p in inner {
        let right = build_ast_from_logical_chain(p)?;
        left = ExpressionType::LogicalExpression {
            meta: joined_meta(left.get_meta(), right.get_meta()),
            operator,
            left: Box::new(left),
            right: Box::new(right),
        };
    }
    Ok(left)
}

fn get_binary_operator(pair: &Pair<Rule>) -> BuildResult<BinaryOperator> {
    Ok(match pair.as_str() {
        "===" => BinaryOperator::StrictlyEqual,
        "!==" => BinaryOperator::StrictlyUnequal,
        "==" => BinaryOperator::LooselyEqual,
        "!=" => BinaryOperator::LooselyUnequal,
        "<" => BinaryOperator::LessThan,
        "<=" => BinaryOperator::LessThanEqual,
        ">" => BinaryOperator::GreaterThan,
        ">=" => BinaryOperator::GreaterThanEqual,
        "instanceof" => BinaryOperator::InstanceOf,
        "in" => BinaryOperator::In,
        "+" => BinaryOperator::Add,
        "-" => BinaryOperator::Subtract,
        "*" => BinaryOperator::Multiply,
        "/" => BinaryOperator::Divide,
        "%" => BinaryOperator::Modulo,
        _ => return Err(get_unexpected_error("binary operator", pair)),
    })
}

/// Equality, relational, additive and multiplicative levels: operands
/// interleaved with operator tokens, folded left to right.
fn build_ast_from_binary_chain(pair: Pair<Rule>) -> BuildResult<ExpressionType> {
    match pair.as_rule() {
        Rule::equality_expression
        | Rule::relational_expression
        | Rule::additive_expression
        | Rule::multiplicative_expression => {}
        Rule::unary_expression => return build_ast_from_unary_expression(pair),
        _ => return Err(get_unexpected_error("binary expression", &pair)),
    }
    let parent = pair.clone();
    let mut inner = significant(pair);
    let mut left = build_ast_from_binary_chain(next_pair(&mut inner, &parent)?)?;
    while let Some(operator_pair) = inner.next() {
        let operator = get_binary_operator(&operator_pair)?;
        let right = build_ast_from_binary_chain(next_pair(&mut inner, &parent)?)?;
        left = ExpressionType::BinaryExpression {
            meta: joined_meta(left.get_meta(), right.get_meta()),
            operator,
            left: Box::new(left),
            right: Box::new(right),
        };
    }
    Ok(left)
}

fn get_update_operator(pair: &Pair<Rule>) -> BuildResult<UpdateOperator> {
    match pair.as_str() {
        "++" => Ok(UpdateOperator::PlusPlus),
        "--" => Ok(UpdateOperator::MinusMinus),
        _ => Err(get_unexpected_error("update operator", pair)),
    }
}

fn build_ast_from_unary_expression(pair: Pair<Rule>) -> BuildResult<ExpressionType> {
    let meta = get_meta(&pair);
    let parent = pair.clone();
    let mut inner = significant(pair);
    let first = next_pair(&mut inner, &parent)?;
    match first.as_rule() {
        Rule::prefix_update => {
            let mut parts = significant(first.clone());
            let operator = get_update_operator(&next_pair(&mut parts, &first)?)?;
            let argument = build_ast_from_unary_expression(next_pair(&mut parts, &first)?)?;
            if !is_assignment_target(&argument) {
                return Err(get_custom_error(
                    "Invalid left-hand side expression in prefix operation",
                    &first,
                ));
            }
            Ok(ExpressionType::UpdateExpression {
                meta,
                operator,
                argument: Box::new(argument),
                prefix: true,
            })
        }
        Rule::unary_operator => {
            let operator = match first.as_str() {
                "typeof" => UnaryOperator::TypeOf,
                "void" => UnaryOperator::Void,
                "delete" => UnaryOperator::Delete,
                "!" => UnaryOperator::LogicalNot,
                "-" => UnaryOperator::Minus,
                "+" => UnaryOperator::Plus,
                _ => return Err(get_unexpected_error("unary operator", &first)),
            };
            let argument = build_ast_from_unary_expression(next_pair(&mut inner, &parent)?)?;
            Ok(ExpressionType::UnaryExpression {
                meta,
                operator,
                argument: Box::new(argument),
            })
        }
        Rule::postfix_expression => {
            let mut parts = significant(first.clone());
            let argument = build_ast_from_left_hand_side_expression(next_pair(&mut parts, &first)?)?;
            match parts.next() {
                None => Ok(argument),
                Some(operator_pair) => {
                    if !is_assignment_target(&argument) {
                        return Err(get_custom_error(
                            "Invalid left-hand side expression in postfix operation",
                            &first,
                        ));
                    }
                    Ok(ExpressionType::UpdateExpression {
                        meta,
                        operator: get_update_operator(&operator_pair)?,
                        argument: Box::new(argument),
                        prefix: false,
                    })
                }
            }
        }
        _ => Err(get_unexpected_error("unary expression", &first)),
    }
}

fn get_arguments(pair: Pair<Rule>) -> BuildResult<Vec<ExpressionType>> {
    let mut arguments = vec![];
    for p in significant(pair) {
        arguments.push(build_ast_from_assignment_expression(p)?);
    }
    Ok(arguments)
}

fn apply_member_suffix(object: ExpressionType, suffix: Pair<Rule>) -> BuildResult<ExpressionType> {
    let meta = Meta {
        start_index: object.get_meta().start_index,
        end_index: suffix.as_span().end(),
    };
    Ok(match suffix.as_rule() {
        Rule::member_dot => ExpressionType::MemberExpression {
            meta,
            object: Box::new(object),
            property: MemberProperty::Static(get_identifier_data(&first_inner(&suffix)?)),
        },
        Rule::member_computed => ExpressionType::MemberExpression {
            meta,
            object: Box::new(object),
            property: MemberProperty::Computed(Box::new(build_ast_from_expression(
                first_inner(&suffix)?,
            )?)),
        },
        Rule::arguments => ExpressionType::CallExpression {
            meta,
            callee: Box::new(object),
            arguments: get_arguments(suffix)?,
        },
        _ => return Err(get_unexpected_error("member suffix", &suffix)),
    })
}

fn build_ast_from_member_base(pair: Pair<Rule>) -> BuildResult<ExpressionType> {
    match pair.as_rule() {
        Rule::new_expression => build_ast_from_new_expression(pair),
        Rule::primary_expression => build_ast_from_primary_expression(pair),
        _ => Err(get_unexpected_error("member base", &pair)),
    }
}

fn build_ast_from_left_hand_side_expression(pair: Pair<Rule>) -> BuildResult<ExpressionType> {
    let parent = pair.clone();
    let mut inner = significant(pair);
    let mut expression = build_ast_from_member_base(next_pair(&mut inner, &parent)?)?;
    for suffix in inner {
        expression = apply_member_suffix(expression, suffix)?;
    }
    Ok(expression)
}

fn build_ast_from_new_expression(pair: Pair<Rule>) -> BuildResult<ExpressionType> {
    let meta = get_meta(&pair);
    let parent = pair.clone();
    let mut inner = significant(pair);
    let callee_pair = next_pair(&mut inner, &parent)?;
    let mut callee_parts = significant(callee_pair.clone());
    let mut callee = build_ast_from_member_base(next_pair(&mut callee_parts, &callee_pair)?)?;
    for suffix in callee_parts {
        callee = apply_member_suffix(callee, suffix)?;
    }
    let arguments = match inner.next() {
        Some(p) => get_arguments(p)?,
        None => vec![],
    };
    Ok(ExpressionType::NewExpression {
        meta,
        callee: Box::new(callee),
        arguments,
    })
}

fn build_ast_from_primary_expression(pair: Pair<Rule>) -> BuildResult<ExpressionType> {
    let inner = first_inner(&pair)?;
    let meta = get_meta(&inner);
    Ok(match inner.as_rule() {
        Rule::this_expression => ExpressionType::ThisExpression { meta },
        Rule::function_expression => {
            ExpressionType::FunctionExpression(Rc::new(build_ast_from_function(inner)?))
        }
        Rule::class_expression => ExpressionType::ClassExpression(Rc::new(build_ast_from_class(inner)?)),
        Rule::literal => build_ast_from_literal(inner)?,
        Rule::identifier => ExpressionType::Identifier(get_identifier_data(&inner)),
        Rule::array_literal => {
            let mut elements = vec![];
            for p in significant(inner) {
                elements.push(build_ast_from_assignment_expression(p)?);
            }
            ExpressionType::ArrayExpression { meta, elements }
        }
        Rule::object_literal => build_ast_from_object_literal(inner)?,
        Rule::parenthesized_expression => build_ast_from_expression(first_inner(&inner)?)?,
        _ => return Err(get_unexpected_error("primary expression", &inner)),
    })
}

fn build_ast_from_object_literal(pair: Pair<Rule>) -> BuildResult<ExpressionType> {
    let meta = get_meta(&pair);
    let mut properties = vec![];
    for definition in significant(pair) {
        let inner = first_inner(&definition)?;
        let property_meta = get_meta(&inner);
        let property = match inner.as_rule() {
            Rule::method_definition => {
                let key = build_ast_from_property_name(first_inner(&inner)?)?;
                let function = build_ast_from_function(inner)?;
                PropertyData {
                    meta: property_meta,
                    key,
                    value: ExpressionType::FunctionExpression(Rc::new(function)),
                }
            }
            Rule::property_assignment => {
                let mut parts = significant(inner.clone());
                let key = build_ast_from_property_name(next_pair(&mut parts, &inner)?)?;
                let value = build_ast_from_assignment_expression(next_pair(&mut parts, &inner)?)?;
                PropertyData {
                    meta: property_meta,
                    key,
                    value,
                }
            }
            Rule::identifier => {
                let id = get_identifier_data(&inner);
                PropertyData {
                    meta: property_meta,
                    key: PropertyKeyType::Static(id.name.clone()),
                    value: ExpressionType::Identifier(id),
                }
            }
            _ => return Err(get_unexpected_error("object literal", &inner)),
        };
        properties.push(property);
    }
    Ok(ExpressionType::ObjectExpression { meta, properties })
}

fn build_ast_from_property_name(pair: Pair<Rule>) -> BuildResult<PropertyKeyType> {
    let inner = first_inner(&pair)?;
    Ok(match inner.as_rule() {
        Rule::identifier_name => PropertyKeyType::Static(inner.as_str().to_string()),
        Rule::string_literal => PropertyKeyType::Static(get_string_value(&inner)?),
        Rule::numeric_literal => PropertyKeyType::Static(match get_number_value(&inner)? {
            NumberLiteralType::IntegerLiteral(i) => i.to_string(),
            NumberLiteralType::FloatLiteral(f) => f.to_string(),
        }),
        Rule::computed_property_name => PropertyKeyType::Computed(Box::new(
            build_ast_from_assignment_expression(first_inner(&inner)?)?,
        )),
        _ => return Err(get_unexpected_error("property name", &inner)),
    })
}

// ---------------------------------------------------------------------------
// Literals
// ---------------------------------------------------------------------------

fn build_ast_from_literal(pair: Pair<Rule>) -> BuildResult<ExpressionType> {
    let inner = first_inner(&pair)?;
    let meta = get_meta(&inner);
    let value = match inner.as_rule() {
        Rule::null_literal => LiteralType::NullLiteral,
        Rule::boolean_literal => LiteralType::BooleanLiteral(inner.as_str() == "true"),
        Rule::numeric_literal => LiteralType::NumberLiteral(get_number_value(&inner)?),
        Rule::string_literal => LiteralType::StringLiteral(get_string_value(&inner)?),
        _ => return Err(get_unexpected_error("literal", &inner)),
    };
    Ok(ExpressionType::Literal(LiteralData { meta, value }))
}

fn get_number_value(pair: &Pair<Rule>) -> BuildResult<NumberLiteralType> {
    let text = pair.as_str();
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        return match i64::from_str_radix(hex, 16) {
            Ok(i) => Ok(NumberLiteralType::IntegerLiteral(i)),
            Err(_) => Err(get_custom_error("Hex literal out of range", pair)),
        };
    }
    if !text.contains(|c| c == '.' || c == 'e' || c == 'E') {
        if let Ok(i) = text.parse::<i64>() {
            return Ok(NumberLiteralType::IntegerLiteral(i));
        }
    }
    text.parse::<f64>()
        .map(NumberLiteralType::FloatLiteral)
        .map_err(|_| get_custom_error("Invalid numeric literal", pair))
}

fn get_string_value(pair: &Pair<Rule>) -> BuildResult<String> {
    let raw = match pair.clone().into_inner().next() {
        Some(chars) => chars.as_str(),
        None => "",
    };
    unescape(raw).ok_or_else(|| get_custom_error("Invalid escape sequence", pair))
}

fn read_hex(chars: &mut std::iter::Peekable<std::str::Chars>, count: usize) -> Option<u32> {
    let mut value = 0;
    for _ in 0..count {
        value = value * 16 + chars.next()?.to_digit(16)?;
    }
    Some(value)
}

fn unescape(raw: &str) -> Option<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' => out.push('\0'),
            '\n' => { /* line continuation */ }
            'x' => out.push(char::from_u32(read_hex(&mut chars, 2)?)?),
            'u' => {
                if chars.peek() == Some(&'{') {
                    chars.next();
                    let mut value = 0u32;
                    loop {
                        let d = chars.next()?;
                        if d == '}' {
                            break;
                        }
                        value = value.checked_mul(16)?.checked_add(d.to_digit(16)?)?;
                    }
                    out.push(char::from_u32(value)?);
                } else {
                    out.push(char::from_u32(read_hex(&mut chars, 4)?).unwrap_or('\u{FFFD}'));
                }
            }
            other => out.push(other),
        }
    }
    Some(out)
}
