pub mod codegen;
pub mod error;
pub mod lexer;
pub mod symbol_table;

use codegen::{CompilationEngine, CompiledClass};
use error::Result;
use lexer::Tokenizer;

/// Compiles one unit's cleaned source lines (line comments already
/// stripped, no blank lines) into one class's VM instructions.
pub fn compile(source_lines: &[String]) -> Result<CompiledClass> {
    let tokens = Tokenizer::tokenize(source_lines)?;

    let engine = CompilationEngine::new(tokens);
    engine.compile()
}
