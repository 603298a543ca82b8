//! Lexer, AST and parser for the nob language.

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod visitor;

use ast::Program;
use nob_source::{CompileResult, Source};

/// Lexes and parses `source` into a [`Program`].
pub fn parse(source: &Source) -> CompileResult<Program> {
    let tokens = lexer::tokenize(source)?;
    parser::Parser::new(tokens).parse_program()
}
