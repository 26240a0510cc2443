//! Tests for the tree-walking interpreter.
//!
//! Scripts run directly against a fresh host global; the completion value of
//! the last statement is checked.

extern crate justbox;

use justbox::runner::ds::error::JErrorType;
use justbox::runner::ds::value::{JsNumberType, JsValue};
use justbox::runner::host::HostEnvironment;

fn eval(code: &str) -> JsValue {
    let host = HostEnvironment::new();
    match host.run_script(code) {
        Ok(v) => v,
        Err(e) => panic!("script {:?} failed: {}", code, e),
    }
}

fn eval_err(code: &str) -> JErrorType {
    let host = HostEnvironment::new();
    match host.run_script(code) {
        Ok(v) => panic!("script {:?} should fail, got {:?}", code, v),
        Err(e) => e,
    }
}

fn int(i: i64) -> JsValue {
    JsValue::Number(JsNumberType::Integer(i))
}

fn string(s: &str) -> JsValue {
    JsValue::String(s.to_string())
}

// ============================================================================
// Expressions
// ============================================================================

mod expression_tests {
    use super::*;

    #[test]
    fn test_arithmetic() {
        assert_eq!(eval("1 + 2 * 3"), int(7));
        assert_eq!(eval("(1 + 2) * 3"), int(9));
        assert_eq!(eval("7 % 3"), int(1));
        assert_eq!(eval("1 / 2"), JsValue::Number(JsNumberType::Float(0.5)));
        assert_eq!(eval("1 / 0"), JsValue::Number(JsNumberType::PositiveInfinity));
    }

    #[test]
    fn test_string_concatenation() {
        assert_eq!(eval("'a' + 1"), string("a1"));
        assert_eq!(eval("1 + '1'"), string("11"));
        assert_eq!(eval("'x' + null + undefined"), string("xnullundefined"));
    }

    #[test]
    fn test_nan_is_not_equal_to_itself() {
        assert_eq!(eval("var n = 0 / 0; n === n"), JsValue::Boolean(false));
        assert_eq!(eval("isNaN(0 / 0)"), JsValue::Boolean(true));
    }

    #[test]
    fn test_equality() {
        assert_eq!(eval("1 == '1'"), JsValue::Boolean(true));
        assert_eq!(eval("1 === '1'"), JsValue::Boolean(false));
        assert_eq!(eval("null == undefined"), JsValue::Boolean(true));
        assert_eq!(eval("null === undefined"), JsValue::Boolean(false));
        assert_eq!(eval("var o = {}; o === o"), JsValue::Boolean(true));
        assert_eq!(eval("({}) === ({})"), JsValue::Boolean(false));
    }

    #[test]
    fn test_logical_operators_short_circuit() {
        assert_eq!(eval("0 || 'fallback'"), string("fallback"));
        assert_eq!(eval("1 && 2"), int(2));
        assert_eq!(eval("0 ?? 5"), int(0));
        assert_eq!(eval("null ?? 5"), int(5));
        assert_eq!(eval("var hit = false; false && (hit = true); hit"), JsValue::Boolean(false));
    }

    #[test]
    fn test_typeof() {
        assert_eq!(eval("typeof 1"), string("number"));
        assert_eq!(eval("typeof 'a'"), string("string"));
        assert_eq!(eval("typeof undefined"), string("undefined"));
        assert_eq!(eval("typeof null"), string("object"));
        assert_eq!(eval("typeof function () {}"), string("function"));
        assert_eq!(eval("typeof notDeclaredAnywhere"), string("undefined"));
    }

    #[test]
    fn test_update_expressions() {
        assert_eq!(eval("var i = 1; var j = i++; j * 10 + i"), int(12));
        assert_eq!(eval("var i = 1; var j = ++i; j * 10 + i"), int(22));
        assert_eq!(eval("var o = { n: 5 }; o.n--; o.n"), int(4));
    }

    #[test]
    fn test_compound_assignment() {
        assert_eq!(eval("var a = 10; a += 5; a -= 3; a *= 2; a"), int(24));
        assert_eq!(eval("var s = 'a'; s += 'b'; s"), string("ab"));
    }

    #[test]
    fn test_conditional_and_sequence() {
        assert_eq!(eval("true ? 'yes' : 'no'"), string("yes"));
        assert_eq!(eval("var a = (1, 2, 3); a"), int(3));
    }

    #[test]
    fn test_in_and_instanceof() {
        assert_eq!(eval("'a' in { a: 1 }"), JsValue::Boolean(true));
        assert_eq!(eval("'b' in { a: 1 }"), JsValue::Boolean(false));
        assert_eq!(eval("function F() {} new F() instanceof F"), JsValue::Boolean(true));
        assert_eq!(eval("[] instanceof Array"), JsValue::Boolean(true));
    }

    #[test]
    fn test_delete_member() {
        assert_eq!(eval("var o = { a: 1 }; delete o.a; 'a' in o"), JsValue::Boolean(false));
    }

    #[test]
    fn test_object_and_array_literals() {
        assert_eq!(eval("var o = { a: { b: [1, 2, 3] } }; o.a.b[2]"), int(3));
        assert_eq!(eval("var k = 'dyn'; var o = { [k + 1]: 7 }; o.dyn1"), int(7));
        assert_eq!(eval("var x = 4; var o = { x }; o.x"), int(4));
        assert_eq!(eval("[1, 2, 3].length"), int(3));
    }
}

// ============================================================================
// Statements and scoping
// ============================================================================

mod statement_tests {
    use super::*;

    #[test]
    fn test_if_else() {
        assert_eq!(eval("var r; if (1 > 2) { r = 'a'; } else { r = 'b'; } r"), string("b"));
    }

    #[test]
    fn test_while_and_do_while() {
        assert_eq!(eval("var i = 0; while (i < 5) { i++; } i"), int(5));
        assert_eq!(eval("var i = 10; do { i++; } while (i < 5); i"), int(11));
    }

    #[test]
    fn test_for_with_break_and_continue() {
        let code = "var sum = 0;
            for (var i = 0; i < 10; i++) {
                if (i % 2 === 0) continue;
                if (i > 7) break;
                sum += i;
            }
            sum";
        assert_eq!(eval(code), int(1 + 3 + 5 + 7));
    }

    #[test]
    fn test_for_in_visits_enumerable_keys() {
        assert_eq!(
            eval("var o = { a: 1, b: 2 }; var keys = ''; for (var k in o) { keys += k; } keys"),
            string("ab")
        );
    }

    #[test]
    fn test_let_is_block_scoped() {
        assert_eq!(eval("var x = 1; { let x = 2; } x"), int(1));
        assert_eq!(eval("let y = 1; if (true) { let y = 2; y = 3; } y"), int(1));
    }

    #[test]
    fn test_let_per_iteration_binding() {
        let code = "var fns = [];
            for (let i = 0; i < 3; i++) { fns.push(function () { return i; }); }
            fns[0]() + fns[1]() + fns[2]()";
        assert_eq!(eval(code), int(3));
    }

    #[test]
    fn test_const_cannot_be_reassigned() {
        match eval_err("const c = 1; c = 2;") {
            JErrorType::TypeError(m) => assert!(m.contains("constant")),
            e => panic!("expected type error, got {:?}", e),
        }
    }

    #[test]
    fn test_redeclaring_let_is_syntax_error() {
        assert!(matches!(eval_err("let a = 1; let a = 2;"), JErrorType::SyntaxError(_)));
    }

    #[test]
    fn test_var_hoisting() {
        assert_eq!(eval("var seen = typeof later; var later = 1; seen"), string("undefined"));
        assert_eq!(eval("var r = early(); function early() { return 'hoisted'; } r"), string("hoisted"));
    }

    #[test]
    fn test_undefined_identifier_is_reference_error() {
        match eval_err("missingName + 1") {
            JErrorType::ReferenceError(m) => assert_eq!(m, "missingName is not defined"),
            e => panic!("expected reference error, got {:?}", e),
        }
    }

    #[test]
    fn test_try_catch_finally() {
        let code = "var log = '';
            try { log += 'a'; throw 'boom'; } catch (e) { log += e; } finally { log += '!'; }
            log";
        assert_eq!(eval(code), string("aboom!"));
    }

    #[test]
    fn test_catch_builtin_error_object() {
        let code = "var r; try { null.x; } catch (e) { r = e instanceof TypeError; } r";
        assert_eq!(eval(code), JsValue::Boolean(true));
        let code = "var m; try { nope(); } catch (e) { m = e.name; } m";
        assert_eq!(eval(code), string("ReferenceError"));
    }

    #[test]
    fn test_uncaught_throw_carries_value() {
        match eval_err("throw new Error('bad');") {
            JErrorType::Thrown(v) => assert_eq!(v.to_string(), "[object Error]"),
            e => panic!("expected thrown value, got {:?}", e),
        }
        let e = eval_err("throw new TypeError('bad');");
        assert_eq!(e.message(), "TypeError: bad");
    }

    #[test]
    fn test_finally_return_overrides() {
        let code = "function f() { try { return 1; } finally { return 2; } } f()";
        assert_eq!(eval(code), int(2));
    }
}

// ============================================================================
// Functions and classes
// ============================================================================

mod function_tests {
    use super::*;

    #[test]
    fn test_closures_capture_environment() {
        let code = "function counter() { var n = 0; return function () { n++; return n; }; }
            var c = counter(); c(); c(); c()";
        assert_eq!(eval(code), int(3));
    }

    #[test]
    fn test_arguments_object() {
        assert_eq!(eval("function f() { return arguments.length; } f(1, 2, 3)"), int(3));
    }

    #[test]
    fn test_missing_arguments_are_undefined() {
        assert_eq!(eval("function f(a, b) { return b; } typeof f(1)"), string("undefined"));
    }

    #[test]
    fn test_method_call_receives_object() {
        assert_eq!(eval("var o = { v: 3, get() { return this.v; } }; o.get()"), int(3));
    }

    #[test]
    fn test_arrow_captures_this() {
        let code = "var o = { v: 5, run() { var f = () => this.v; return f(); } }; o.run()";
        assert_eq!(eval(code), int(5));
    }

    #[test]
    fn test_sloppy_this_is_global() {
        assert_eq!(eval("var marker = 9; function f() { return this.marker; } f()"), int(9));
        assert_eq!(eval("this === window"), JsValue::Boolean(true));
    }

    #[test]
    fn test_constructor_function() {
        let code = "function Point(x, y) { this.x = x; this.y = y; }
            Point.prototype.sum = function () { return this.x + this.y; };
            new Point(2, 3).sum()";
        assert_eq!(eval(code), int(5));
    }

    #[test]
    fn test_class_with_static_method() {
        let code = "class Counter {
                constructor(start) { this.n = start; }
                inc() { this.n++; return this; }
                static from(v) { return new Counter(v); }
            }
            Counter.from(4).inc().inc().n";
        assert_eq!(eval(code), int(6));
    }

    #[test]
    fn test_class_requires_new() {
        match eval_err("class A {} A();") {
            JErrorType::TypeError(m) => assert!(m.contains("without 'new'")),
            e => panic!("expected type error, got {:?}", e),
        }
    }

    #[test]
    fn test_calling_non_function_is_type_error() {
        match eval_err("var x = 1; x();") {
            JErrorType::TypeError(m) => assert!(m.contains("is not a function")),
            e => panic!("expected type error, got {:?}", e),
        }
    }

    #[test]
    fn test_named_function_expression_sees_itself() {
        let code = "var fact = function f(n) { return n <= 1 ? 1 : n * f(n - 1); }; fact(5)";
        assert_eq!(eval(code), int(120));
    }

    #[test]
    fn test_runaway_recursion_is_range_error() {
        let host = HostEnvironment::new();
        match host.run_script("function down() { return down(); } down();") {
            Err(e) => assert!(e.is_call_stack_exceeded(), "unexpected error {:?}", e),
            Ok(v) => panic!("expected range error, got {:?}", v),
        }
    }

    #[test]
    fn test_recursion_below_the_limit_completes() {
        let host = HostEnvironment::new();
        let v = host
            .run_script("function f(n) { return n ? f(n - 1) : 0; } f(50)")
            .unwrap();
        assert_eq!(v, int(0));
    }
}

// ============================================================================
// eval
// ============================================================================

mod eval_tests {
    use super::*;

    #[test]
    fn test_direct_eval_sees_local_scope() {
        assert_eq!(eval("function f() { var local = 3; return eval('local * 2'); } f()"), int(6));
    }

    #[test]
    fn test_direct_eval_var_lands_in_function_scope() {
        let code = "function f() { eval('var inner = 1'); return typeof inner; }
            var r = f(); r + ':' + typeof inner";
        assert_eq!(eval(code), string("number:undefined"));
    }

    #[test]
    fn test_indirect_eval_uses_global_scope() {
        let code = "var scope = 'global';
            function f() { var scope = 'local'; var e = eval; return e('scope'); }
            f()";
        assert_eq!(eval(code), string("global"));
    }

    #[test]
    fn test_eval_of_non_string_returns_it() {
        assert_eq!(eval("eval(42)"), int(42));
    }

    #[test]
    fn test_eval_syntax_error() {
        assert!(matches!(eval_err("eval('var = ;')"), JErrorType::SyntaxError(_)));
    }
}
