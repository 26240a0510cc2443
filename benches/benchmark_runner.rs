/// Benchmark runner for sandboxed execution.
///
/// Compares scripts run directly on the host global against the same scripts
/// run through a virtual namespace in single- and multi-instance mode.

extern crate justbox;

use std::time::{Duration, Instant};

use justbox::runner::ds::value::{JsNumberType, JsValue};
use justbox::runner::host::HostEnvironment;
use justbox::sandbox::{Sandbox, SandboxOptions};

#[derive(Clone, Copy)]
enum Mode {
    Host,
    Single,
    Multi,
}

/// Run a benchmark and return the execution time.
fn run_benchmark(code: &str, iterations: u32, mode: Mode) -> Duration {
    let start = Instant::now();
    for _ in 0..iterations {
        let host = HostEnvironment::new();
        match mode {
            Mode::Host => {
                let _ = host.run_script(code);
            }
            Mode::Single | Mode::Multi => {
                let options = match mode {
                    Mode::Multi => SandboxOptions::multi(),
                    _ => SandboxOptions::default(),
                };
                let mut sandbox = Sandbox::new(&host, options);
                let _ = sandbox.execute(code, None);
                let _ = sandbox.teardown();
            }
        }
    }
    start.elapsed()
}

/// Value of `var_name` after running `code` in a multi-instance sandbox.
fn run_and_get_var(code: &str, var_name: &str) -> JsValue {
    let host = HostEnvironment::new();
    let mut sandbox = Sandbox::new(&host, SandboxOptions::multi());
    if sandbox.execute(code, None).is_err() {
        return JsValue::Undefined;
    }
    sandbox.execute(var_name, None).unwrap_or(JsValue::Undefined)
}

// ============================================================================
// Benchmark definitions
// ============================================================================

const BENCH_FIBONACCI: &str = r#"
var n = 20;
var a = 0;
var b = 1;
for (var i = 0; i < n; i = i + 1) {
    var temp = a;
    a = b;
    b = temp + b;
}
"#;

const BENCH_LOOP_SUM: &str = r#"
var sum = 0;
for (var i = 0; i < 10000; i = i + 1) {
    sum = sum + i;
}
"#;

const BENCH_LOCAL_LOOP: &str = r#"
function work() {
    let sum = 0;
    for (let i = 0; i < 10000; i++) {
        sum += i;
    }
    return sum;
}
var total = work();
"#;

const BENCH_HOST_CALLS: &str = r#"
var acc = 0;
for (var i = 0; i < 1000; i = i + 1) {
    acc = acc + Math.abs(-i) + parseInt("1");
}
"#;

const BENCH_GLOBAL_WRITES: &str = r#"
for (var i = 0; i < 500; i = i + 1) {
    window["key" + (i % 50)] = i;
}
"#;

const BENCH_PRIME_SIEVE: &str = r#"
var count = 0;
for (var n = 2; n < 100; n = n + 1) {
    var isPrime = true;
    for (var i = 2; i * i <= n; i = i + 1) {
        if (n % i === 0) {
            isPrime = false;
            break;
        }
    }
    if (isPrime) {
        count = count + 1;
    }
}
"#;

fn main() {
    println!("=======================================================");
    println!("  justbox - Sandbox Overhead Benchmarks");
    println!("  Host global vs virtual namespace");
    println!("=======================================================\n");

    let benchmarks: Vec<(&str, &str, u32)> = vec![
        ("Fibonacci (n=20)", BENCH_FIBONACCI, 500),
        ("Loop Sum (10K globals)", BENCH_LOOP_SUM, 20),
        ("Loop Sum (10K locals)", BENCH_LOCAL_LOOP, 20),
        ("Host calls (1K)", BENCH_HOST_CALLS, 50),
        ("Global writes (500)", BENCH_GLOBAL_WRITES, 50),
        ("Prime Sieve (<100)", BENCH_PRIME_SIEVE, 100),
    ];

    println!(
        "{:<26} {:>12} {:>12} {:>12} {:>9}",
        "Benchmark", "Host", "Single", "Multi", "Overhead"
    );
    println!("{}", "-".repeat(75));

    for (name, code, iterations) in &benchmarks {
        let host = run_benchmark(code, *iterations, Mode::Host);
        let single = run_benchmark(code, *iterations, Mode::Single);
        let multi = run_benchmark(code, *iterations, Mode::Multi);
        let overhead = multi.as_secs_f64() / host.as_secs_f64();
        println!(
            "{:<26} {:>10.2?} {:>10.2?} {:>10.2?} {:>8.2}x",
            name, host, single, multi, overhead
        );
    }

    println!("\n=======================================================");
    println!("  Correctness Verification");
    println!("=======================================================\n");

    let verifications: Vec<(&str, &str, &str, i64)> = vec![
        ("Fibonacci", BENCH_FIBONACCI, "a", 6765),
        ("Loop Sum", BENCH_LOOP_SUM, "sum", 49995000),
        ("Local Loop", BENCH_LOCAL_LOOP, "total", 49995000),
        ("Prime Count", BENCH_PRIME_SIEVE, "count", 25),
    ];

    println!("{:<20} {:>12} {:>12}", "Test", "Expected", "Sandbox");
    println!("{}", "-".repeat(46));

    for (name, code, var, expected) in verifications {
        let value = match run_and_get_var(code, var) {
            JsValue::Number(JsNumberType::Integer(n)) => n,
            _ => -1,
        };
        let status = if value == expected { "ok" } else { "FAIL" };
        println!("{:<20} {:>12} {:>5} {:>6}", name, expected, status, value);
    }
}
