//! Tests for the built-ins installed on the host global.

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

fn int(i: i64) -> JsValue {
    JsValue::Number(JsNumberType::Integer(i))
}

fn float(f: f64) -> JsValue {
    JsValue::Number(JsNumberType::Float(f))
}

fn string(s: &str) -> JsValue {
    JsValue::String(s.to_string())
}

// ============================================================================
// Math tests
// ============================================================================

mod math_tests {
    use super::*;

    #[test]
    fn test_math_abs() {
        assert_eq!(eval("Math.abs(-5)"), int(5));
        assert_eq!(eval("Math.abs(5)"), int(5));
    }

    #[test]
    fn test_math_rounding() {
        assert_eq!(eval("Math.floor(3.7)"), int(3));
        assert_eq!(eval("Math.ceil(3.2)"), int(4));
        assert_eq!(eval("Math.round(3.4)"), int(3));
        assert_eq!(eval("Math.round(3.5)"), int(4));
        assert_eq!(eval("Math.round(-3.5)"), int(-3));
    }

    #[test]
    fn test_math_max_min() {
        assert_eq!(eval("Math.max(1, 9, 3)"), int(9));
        assert_eq!(eval("Math.min(4, -2, 8)"), int(-2));
        assert_eq!(eval("Math.max()"), JsValue::Number(JsNumberType::NegativeInfinity));
        assert_eq!(eval("isNaN(Math.max(1, 'x'))"), JsValue::Boolean(true));
    }

    #[test]
    fn test_math_pow_sqrt() {
        assert_eq!(eval("Math.pow(2, 10)"), int(1024));
        assert_eq!(eval("Math.sqrt(16)"), int(4));
        assert_eq!(eval("Math.sqrt(2) > 1.41"), JsValue::Boolean(true));
    }

    #[test]
    fn test_math_constants_are_read_only() {
        assert_eq!(eval("Math.PI > 3.14 && Math.PI < 3.15"), JsValue::Boolean(true));
        let host = HostEnvironment::new();
        assert!(matches!(host.run_script("Math.PI = 3;"), Err(JErrorType::TypeError(_))));
    }
}

// ============================================================================
// Conversion functions
// ============================================================================

mod conversion_tests {
    use super::*;

    #[test]
    fn test_parse_int() {
        assert_eq!(eval("parseInt('42px')"), int(42));
        assert_eq!(eval("parseInt('  -7')"), int(-7));
        assert_eq!(eval("parseInt('ff', 16)"), int(255));
        assert_eq!(eval("parseInt('0x1A')"), int(26));
        assert_eq!(eval("isNaN(parseInt('abc'))"), JsValue::Boolean(true));
    }

    #[test]
    fn test_parse_float() {
        assert_eq!(eval("parseFloat('3.25abc')"), float(3.25));
        assert_eq!(eval("parseFloat('10')"), int(10));
    }

    #[test]
    fn test_string_number_boolean_calls() {
        assert_eq!(eval("String(12)"), string("12"));
        assert_eq!(eval("Number('12')"), int(12));
        assert_eq!(eval("Boolean('')"), JsValue::Boolean(false));
        assert_eq!(eval("Boolean('x')"), JsValue::Boolean(true));
    }
}

// ============================================================================
// String tests
// ============================================================================

mod string_tests {
    use super::*;

    #[test]
    fn test_string_length_and_index() {
        assert_eq!(eval("'hello'.length"), int(5));
        assert_eq!(eval("'hello'[1]"), string("e"));
        assert_eq!(eval("'hello'.charAt(4)"), string("o"));
    }

    #[test]
    fn test_string_search() {
        assert_eq!(eval("'hello world'.indexOf('o')"), int(4));
        assert_eq!(eval("'hello world'.indexOf('o', 5)"), int(7));
        assert_eq!(eval("'hello'.indexOf('z')"), int(-1));
        assert_eq!(eval("'hello'.includes('ell')"), JsValue::Boolean(true));
        assert_eq!(eval("'hello'.startsWith('he')"), JsValue::Boolean(true));
        assert_eq!(eval("'hello'.endsWith('lo')"), JsValue::Boolean(true));
    }

    #[test]
    fn test_string_slicing() {
        assert_eq!(eval("'hello'.slice(1, 3)"), string("el"));
        assert_eq!(eval("'hello'.slice(-3)"), string("llo"));
        assert_eq!(eval("'hello'.substring(3, 1)"), string("el"));
    }

    #[test]
    fn test_string_transforms() {
        assert_eq!(eval("'Hello'.toUpperCase()"), string("HELLO"));
        assert_eq!(eval("'Hello'.toLowerCase()"), string("hello"));
        assert_eq!(eval("'  pad  '.trim()"), string("pad"));
        assert_eq!(eval("'ab'.repeat(3)"), string("ababab"));
        assert_eq!(eval("'a-b-c'.replace('-', '+')"), string("a+b-c"));
    }

    #[test]
    fn test_string_repeat_limits() {
        let host = HostEnvironment::new();
        assert!(matches!(host.run_script("'x'.repeat(4294967296)"), Err(JErrorType::RangeError(_))));
        assert!(matches!(host.run_script("'x'.repeat(-1)"), Err(JErrorType::RangeError(_))));
        assert_eq!(eval("''.repeat(4294967296)"), string(""));
    }

    #[test]
    fn test_string_split() {
        assert_eq!(eval("'a,b,c'.split(',').length"), int(3));
        assert_eq!(eval("'abc'.split('').join('|')"), string("a|b|c"));
    }
}

// ============================================================================
// Object, Array, Function tests
// ============================================================================

mod object_tests {
    use super::*;

    #[test]
    fn test_object_keys() {
        assert_eq!(eval("Object.keys({ a: 1, b: 2 }).join(',')"), string("a,b"));
    }

    #[test]
    fn test_has_own_property() {
        assert_eq!(eval("({ a: 1 }).hasOwnProperty('a')"), JsValue::Boolean(true));
        assert_eq!(eval("({ a: 1 }).hasOwnProperty('toString')"), JsValue::Boolean(false));
    }

    #[test]
    fn test_object_to_string_tag() {
        assert_eq!(eval("Object.prototype.toString.call([])"), string("[object Array]"));
    }

    #[test]
    fn test_array_methods() {
        assert_eq!(eval("var a = [1, 2]; a.push(3, 4); a.length"), int(4));
        assert_eq!(eval("[1, 2, 3].pop()"), int(3));
        assert_eq!(eval("[1, 2, 3].map(function (x) { return x * 2; }).join('-')"), string("2-4-6"));
        assert_eq!(eval("[1, 2, 3, 4].filter(x => x % 2 === 0).length"), int(2));
        assert_eq!(eval("[3, 4, 5].indexOf(4)"), int(1));
        assert_eq!(eval("[1, 2, 3].slice(1).join(',')"), string("2,3"));
        assert_eq!(eval("var s = 0; [1, 2, 3].forEach(function (x) { s += x; }); s"), int(6));
        assert_eq!(eval("Array.isArray([])"), JsValue::Boolean(true));
        assert_eq!(eval("Array.isArray({})"), JsValue::Boolean(false));
    }

    #[test]
    fn test_oversized_arrays_are_range_errors() {
        let host = HostEnvironment::new();
        for code in [
            "new Array(4294967296)",
            "new Array(4294967295)",
            "new Array(-1)",
            "var a = []; a.length = 4294967295;",
            "var a = []; a[4000000000] = 1;",
        ]
        .iter()
        {
            assert!(
                matches!(host.run_script(code), Err(JErrorType::RangeError(_))),
                "{} should be a range error",
                code
            );
        }
        assert_eq!(eval("new Array(3).length"), int(3));
        assert_eq!(eval("var a = [1]; a.length = 4; a.length"), int(4));
    }

    #[test]
    fn test_function_call_apply_bind() {
        let code = "function who(greeting) { return greeting + ' ' + this.name; }
            var o = { name: 'box' };
            who.call(o, 'hi') + '|' + who.apply(o, ['yo']) + '|' + who.bind(o, 'hey')()";
        assert_eq!(eval(code), string("hi box|yo box|hey box"));
    }

    #[test]
    fn test_function_to_string_returns_source() {
        assert_eq!(eval("function f(a) { return a; } f.toString()"), string("function f(a) { return a; }"));
        assert_eq!(eval("parseInt.toString()"), string("function parseInt() { [native code] }"));
    }

    #[test]
    fn test_error_constructors() {
        assert_eq!(eval("new TypeError('bad').message"), string("bad"));
        assert_eq!(eval("String(new RangeError('r'))"), string("RangeError: r"));
        assert_eq!(eval("new Error('x') instanceof Error"), JsValue::Boolean(true));
        assert_eq!(eval("new TypeError('x') instanceof Error"), JsValue::Boolean(true));
    }
}

// ============================================================================
// Console tests
// ============================================================================

mod console_tests {
    use super::*;

    #[test]
    fn test_console_output_is_captured() {
        let host = HostEnvironment::new();
        host.run_script("console.log('a', 1, [1, 2], { k: 'v' }); console.warn('careful');")
            .unwrap();
        assert_eq!(
            host.console_output(),
            vec!["a 1 [1, 2] { k: 'v' }".to_string(), "careful".to_string()]
        );
    }
}
