//! CLI for running hosted scripts inside a sandbox.
//!
//! Usage:
//!   justbox app.js                       # Run app.js sandboxed, then tear down
//!   justbox --prelude host.js app.js     # Seed the host global first
//!   justbox -e "counter = 1" --keep      # Evaluate code, skip teardown
//!   justbox --multi --advance 1000 a.js  # Strict isolation, run 1s of timers

use std::fs;
use std::path::PathBuf;
use std::process;
use std::rc::Rc;

use clap::Parser;
use log::info;

use justbox::runner::ds::operations::type_conversion::to_display_string;
use justbox::runner::ds::value::JsValue;
use justbox::runner::host::HostEnvironment;
use justbox::sandbox::{Sandbox, SandboxOptions};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Script files executed in order inside one sandbox
    files: Vec<PathBuf>,
    /// Source text evaluated after the files
    #[arg(short = 'e', long = "eval", value_name = "CODE")]
    eval: Option<String>,
    /// Script run directly against the host global before sandboxing
    #[arg(long, value_name = "FILE")]
    prelude: Option<PathBuf>,
    /// Isolate writes instead of mirroring them to the host global
    #[arg(long)]
    multi: bool,
    /// JSON sandbox options (multiMode, injection, classification)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Milliseconds of host timers to run before teardown
    #[arg(long, value_name = "MS", default_value_t = 0)]
    advance: u64,
    /// Leave the sandbox active instead of tearing it down
    #[arg(long)]
    keep: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if cli.files.is_empty() && cli.eval.is_none() {
        eprintln!("justbox: nothing to run (pass script files or -e CODE)");
        process::exit(2);
    }

    let mut options = match &cli.config {
        Some(path) => SandboxOptions::load(path).unwrap_or_else(|e| fail(&e.to_string())),
        None => SandboxOptions::default(),
    };
    if cli.multi {
        options.multi_mode = true;
    }

    let host = HostEnvironment::new();
    if let Some(path) = &cli.prelude {
        let source = read_source(path);
        if let Err(e) = host.run_script(&source) {
            fail(&format!("prelude {}: {}", path.display(), e));
        }
    }

    let mut sandbox = Sandbox::new(&host, options);
    let mut last = JsValue::Undefined;
    for path in cli.files.iter() {
        let source = read_source(path);
        info!("running {}", path.display());
        last = sandbox
            .execute(&source, None)
            .unwrap_or_else(|e| fail(&format!("{}: {}", path.display(), e)));
    }
    if let Some(code) = &cli.eval {
        last = sandbox
            .execute(code, None)
            .unwrap_or_else(|e| fail(&e.to_string()));
    }
    if !last.is_undefined() {
        println!("{}", to_display_string(&last));
    }

    if cli.advance > 0 {
        let fired = host.advance_timers(cli.advance);
        println!("timers fired: {}", fired);
    }

    print_bindings("added", &sandbox.added_bindings().into_iter().collect::<Vec<_>>());
    print_bindings("overridden", &sandbox.original_values().into_iter().collect::<Vec<_>>());

    if cli.keep {
        println!("sandbox {} kept active", sandbox.id());
    } else {
        if let Err(e) = sandbox.teardown() {
            fail(&e.to_string());
        }
        print_host_state(&host, &sandbox);
    }
}

fn read_source(path: &PathBuf) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| fail(&format!("{}: {}", path.display(), e)))
}

fn print_bindings(label: &str, bindings: &[(String, JsValue)]) {
    println!("{} bindings: {}", label, bindings.len());
    for (name, value) in bindings {
        println!("  {} = {}", name, to_display_string(value));
    }
}

fn print_host_state(host: &Rc<HostEnvironment>, sandbox: &Sandbox) {
    println!("after teardown:");
    for name in sandbox.added_bindings().keys() {
        println!("  {} present on host: {}", name, host.has(name));
    }
    for name in sandbox.original_values().keys() {
        let value = host.get(name).unwrap_or(JsValue::Undefined);
        println!("  {} = {}", name, to_display_string(&value));
    }
    println!("  listeners: {}", host.total_listeners());
    println!("  pending timers: {}", host.pending_timers());
    for line in host.console_output() {
        println!("  console: {}", line);
    }
}

fn fail(message: &str) -> ! {
    eprintln!("justbox: {}", message);
    process::exit(1);
}
