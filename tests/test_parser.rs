//! Parser integration tests.
//!
//! These check the AST shapes produced for the constructs hosted programs use
//! to reach the global namespace.

extern crate justbox;

use justbox::parser::ast::*;
use justbox::parser::JsParser;
use justbox::runner::api::parse_script;
use justbox::runner::ds::error::JErrorType;

fn parse(code: &str) -> ProgramData {
    match JsParser::parse_to_ast_from_str(code) {
        Ok(p) => p,
        Err(e) => panic!("Failed to parse {:?}: {}", code, e),
    }
}

fn only_statement(code: &str) -> StatementType {
    let mut program = parse(code);
    assert_eq!(program.body.len(), 1, "expected one statement in {:?}", code);
    program.body.remove(0)
}

fn only_expression(code: &str) -> ExpressionType {
    match only_statement(code) {
        StatementType::ExpressionStatement { expression, .. } => *expression,
        s => panic!("Expected an expression statement, got {:?}", s),
    }
}

#[test]
fn test_statements_without_semicolons() {
    let program = parse("var a = 1\nlet b = 2\nb = a");
    assert_eq!(program.body.len(), 3);
}

#[test]
fn test_comments_are_skipped() {
    let program = parse("// leading\nvar a = 1; /* block\ncomment */ a");
    assert_eq!(program.body.len(), 2);
}

#[test]
fn test_implicit_global_assignment() {
    match only_expression("counter = 1") {
        ExpressionType::AssignmentExpression { operator, left, .. } => {
            assert_eq!(operator, AssignmentOperator::Equals);
            assert!(matches!(*left, ExpressionType::Identifier(ref id) if id.name == "counter"));
        }
        e => panic!("Expected assignment, got {:?}", e),
    }
}

#[test]
fn test_computed_member_assignment() {
    match only_expression("window['a' + 1] += 2") {
        ExpressionType::AssignmentExpression { operator, left, .. } => {
            assert_eq!(operator, AssignmentOperator::AddEquals);
            match *left {
                ExpressionType::MemberExpression { property: MemberProperty::Computed(_), .. } => {}
                e => panic!("Expected computed member, got {:?}", e),
            }
        }
        e => panic!("Expected assignment, got {:?}", e),
    }
}

#[test]
fn test_call_on_member_chain() {
    match only_expression("window.addEventListener('resize', handler)") {
        ExpressionType::CallExpression { callee, arguments, .. } => {
            assert_eq!(arguments.len(), 2);
            match *callee {
                ExpressionType::MemberExpression { property: MemberProperty::Static(id), .. } => {
                    assert_eq!(id.name, "addEventListener")
                }
                e => panic!("Expected member callee, got {:?}", e),
            }
        }
        e => panic!("Expected call, got {:?}", e),
    }
}

#[test]
fn test_function_declaration_keeps_source() {
    let code = "function Widget(a, b) { return a + b; }";
    match only_statement(code) {
        StatementType::FunctionDeclaration(f) => {
            assert_eq!(f.name(), "Widget");
            assert_eq!(f.params.len(), 2);
            assert_eq!(f.source, code);
            assert!(!f.is_arrow);
        }
        s => panic!("Expected function declaration, got {:?}", s),
    }
}

#[test]
fn test_arrow_function_with_expression_body() {
    match only_expression("(a, b) => a * b") {
        ExpressionType::ArrowFunctionExpression(f) => {
            assert!(f.is_arrow);
            assert_eq!(f.params.len(), 2);
            assert!(matches!(f.body, FunctionBodyType::Expression(_)));
            assert_eq!(f.source, "(a, b) => a * b");
        }
        e => panic!("Expected arrow function, got {:?}", e),
    }
}

#[test]
fn test_class_declaration() {
    let code = "class Store { constructor(v) { this.v = v; } get() { return this.v; } static create() { return new Store(1); } }";
    match only_statement(code) {
        StatementType::ClassDeclaration(c) => {
            assert_eq!(c.name(), "Store");
            assert!(c.constructor.is_some());
            assert_eq!(c.methods.len(), 2);
            assert!(c.methods.iter().any(|m| m.key == "create" && m.is_static));
            assert!(c.source.starts_with("class Store"));
        }
        s => panic!("Expected class declaration, got {:?}", s),
    }
}

#[test]
fn test_for_in_with_declaration() {
    match only_statement("for (var key in window) { keys.push(key); }") {
        StatementType::ForInStatement { left, .. } => {
            assert_eq!(left.kind, Some(VariableDeclarationKind::Var));
            assert_eq!(left.id.name, "key");
        }
        s => panic!("Expected for-in, got {:?}", s),
    }
}

#[test]
fn test_for_statement_parts() {
    match only_statement("for (let i = 0; i < 3; i++) {}") {
        StatementType::ForStatement { init, test, update, .. } => {
            assert!(matches!(init, Some(VariableDeclarationOrExpression::VariableDeclaration(_))));
            assert!(test.is_some());
            match update.map(|u| *u) {
                Some(ExpressionType::UpdateExpression { prefix, operator, .. }) => {
                    assert!(!prefix);
                    assert_eq!(operator, UpdateOperator::PlusPlus);
                }
                e => panic!("Expected postfix update, got {:?}", e),
            }
        }
        s => panic!("Expected for statement, got {:?}", s),
    }
}

#[test]
fn test_try_catch_finally() {
    match only_statement("try { risky(); } catch (e) { log(e); } finally { done(); }") {
        StatementType::TryStatement { handler, finalizer, .. } => {
            let handler = handler.expect("catch clause");
            assert_eq!(handler.param.map(|p| p.name), Some("e".to_string()));
            assert!(finalizer.is_some());
        }
        s => panic!("Expected try statement, got {:?}", s),
    }
}

#[test]
fn test_operator_precedence() {
    match only_expression("a || b && c") {
        ExpressionType::LogicalExpression { operator, right, .. } => {
            assert_eq!(operator, LogicalOperator::Or);
            assert!(matches!(
                *right,
                ExpressionType::LogicalExpression { operator: LogicalOperator::And, .. }
            ));
        }
        e => panic!("Expected logical or, got {:?}", e),
    }
    match only_expression("1 + 2 * 3") {
        ExpressionType::BinaryExpression { operator, right, .. } => {
            assert_eq!(operator, BinaryOperator::Add);
            assert!(matches!(
                *right,
                ExpressionType::BinaryExpression { operator: BinaryOperator::Multiply, .. }
            ));
        }
        e => panic!("Expected addition, got {:?}", e),
    }
}

#[test]
fn test_typeof_and_in_operators() {
    assert!(matches!(
        only_expression("typeof missing"),
        ExpressionType::UnaryExpression { operator: UnaryOperator::TypeOf, .. }
    ));
    assert!(matches!(
        only_expression("'title' in window"),
        ExpressionType::BinaryExpression { operator: BinaryOperator::In, .. }
    ));
}

#[test]
fn test_object_literal_forms() {
    match only_expression("({ a: 1, b, ['c' + 1]: 2, run() { return 1; } })") {
        ExpressionType::ObjectExpression { properties, .. } => {
            assert_eq!(properties.len(), 4);
            assert!(matches!(properties[2].key, PropertyKeyType::Computed(_)));
        }
        e => panic!("Expected object literal, got {:?}", e),
    }
}

#[test]
fn test_keywords_are_not_identifiers() {
    assert!(JsParser::parse_to_ast_from_str("var if = 1;").is_err());
    assert!(JsParser::parse_to_ast_from_str("var iffy = 1; var classy = 2;").is_ok());
}

#[test]
fn test_parse_error_is_syntax_error() {
    match parse_script("var = ;") {
        Err(JErrorType::SyntaxError(message)) => assert!(message.contains("1:")),
        other => panic!("Expected syntax error, got {:?}", other.map(|p| p.body.len())),
    }
}
