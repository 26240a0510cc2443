//! Entry points for running hosted source text against a global layer.

use std::rc::Rc;

use crate::parser::ast::ProgramData;
use crate::parser::JsParser;
use crate::runner::ds::env_record::GlobalBindings;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::value::JsValue;
use crate::runner::eval::statement::execute_program;
use crate::runner::host::types::EvalContext;
use crate::runner::host::HostEnvironment;

/// Parses `source`, turning pest errors (with line/column) into `SyntaxError`.
pub fn parse_script(source: &str) -> Result<ProgramData, JErrorType> {
    JsParser::parse_to_ast_from_str(source).map_err(|e| JErrorType::SyntaxError(e.to_string()))
}

/// Runs an already parsed program with `global` as the outermost scope layer.
/// Program-level `this` is the layer's reference object. Returns the
/// completion value of the last value-producing statement.
pub fn run_program(
    host: &Rc<HostEnvironment>,
    global: Rc<dyn GlobalBindings>,
    program: &ProgramData,
) -> Result<JsValue, JErrorType> {
    let mut ctx = EvalContext::new(host.clone(), global);
    execute_program(&program.body, &mut ctx)
}

pub fn run_script(
    host: &Rc<HostEnvironment>,
    global: Rc<dyn GlobalBindings>,
    source: &str,
) -> Result<JsValue, JErrorType> {
    let program = parse_script(source)?;
    run_program(host, global, &program)
}
