//! # justbox - global-namespace sandbox for hosted scripts
//!
//! Several independently written programs often have to share one global
//! namespace. `justbox` runs each of them in a sandbox that intercepts every
//! read, write and existence check against that namespace, remembers what the
//! program added, overrode and registered, and can undo all of it.
//!
//! Hosted programs are JavaScript. They are parsed with a PEG grammar and run
//! by a tree-walking interpreter whose scope chain ends in a pluggable global
//! layer: either the shared [`HostEnvironment`](runner::host::HostEnvironment)
//! itself or a sandbox's [`VirtualNamespace`](sandbox::VirtualNamespace).
//!
//! ## Quick Start
//!
//! ### Parsing JavaScript
//!
//! ```
//! use justbox::parser::JsParser;
//!
//! let code = "var x = 5 + 3;";
//! let ast = JsParser::parse_to_ast_from_str(code).unwrap();
//! println!("Parsed {} statements", ast.body.len());
//! ```
//!
//! ### Running code on the shared host
//!
//! ```
//! use justbox::runner::ds::value::JsValue;
//! use justbox::runner::host::HostEnvironment;
//!
//! let host = HostEnvironment::new();
//! host.run_script("var title = 'Host';").unwrap();
//! assert_eq!(host.get("title"), Some(JsValue::string("Host")));
//! ```
//!
//! ### Sandboxing a hosted program
//!
//! ```
//! use justbox::runner::ds::value::JsValue;
//! use justbox::runner::host::HostEnvironment;
//! use justbox::sandbox::{Sandbox, SandboxOptions};
//!
//! let host = HostEnvironment::new();
//! host.run_script("var title = 'Host';").unwrap();
//!
//! let mut sandbox = Sandbox::new(&host, SandboxOptions::default());
//! sandbox
//!     .execute("title = 'Guest'; window.addEventListener('resize', function () {});", None)
//!     .unwrap();
//! assert_eq!(host.get("title"), Some(JsValue::string("Guest")));
//! assert_eq!(host.listener_count("resize"), 1);
//!
//! sandbox.teardown().unwrap();
//! assert_eq!(host.get("title"), Some(JsValue::string("Host")));
//! assert_eq!(host.listener_count("resize"), 0);
//! ```
//!
//! ## Isolation modes
//!
//! - **Single-instance** (`multi_mode: false`, the default): writes land in the
//!   sandbox and are mirrored to the host global, so code running outside the
//!   sandbox sees them until teardown.
//! - **Multi-instance** (`multi_mode: true`): writes never leave the sandbox.
//!
//! ## Architecture
//!
//! - **[`parser`]** - PEG parser and AST types
//! - **[`runner`]** - Tree-walking interpreter
//!   - **[`runner::ds`]** - Data structures (values, objects, environments)
//!   - **[`runner::eval`]** - Statement and expression evaluation
//!   - **[`runner::host`]** - The shared global environment: global object,
//!     listener registry, virtual-clock timers
//!   - **[`runner::std_lib`]** - Built-ins installed on the host global
//! - **[`sandbox`]** - Virtual namespace, callable normalizer, registration
//!   tracker, lifecycle controller and sandbox registry

#[macro_use]
extern crate lazy_static;

pub mod parser;
pub mod runner;
pub mod sandbox;
