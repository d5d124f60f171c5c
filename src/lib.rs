//! Lexer, parser and tree-walking interpreter for the Bawal scripting
//! language: a sentinel-framed, Hindi-keyword language with dynamic typing
//! and resource-bounded execution.

pub mod ast;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod token;

pub use interpreter::{Interpreter, RuntimeError, Value};
pub use lexer::{tokenize, LexError};
pub use parser::{parse, SyntaxError};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// Runs a source program through the whole pipeline with a fresh
/// interpreter and returns its output. Programs that read input need a
/// dedicated [`Interpreter`] with a callback installed.
pub fn run(source: &str) -> Result<String, Error> {
    let tokens = tokenize(source)?;
    let program = parse(&tokens)?;
    let mut interpreter = Interpreter::new();
    Ok(interpreter.interpret(&program)?)
}
