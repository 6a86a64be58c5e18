//! Microcode compiler front end.
//!
//! A strictly linear pipeline that turns microcode source text into
//! fixed-width control words:
//!
//! - [`source`] opens and buffers the input, with position tracking.
//! - [`lexer`] produces a lazy token stream.
//! - [`parser`] is pass 1: grammar-directed parsing into a provisional
//!   instruction list plus a symbol table.
//! - [`resolve`] is pass 2: deferred symbol binding and structural
//!   validation, producing an immutable [`mcode::Program`].
//! - [`printer`] serializes the program to any sink, deterministically.
//!
//! Every error is fatal to the compilation; a failed run emits nothing.

pub mod cancel;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod printer;
pub mod resolve;
pub mod source;
pub mod symbols;
pub mod token;

pub use cancel::CancelToken;
pub use error::Error;
pub use printer::Format;
pub use source::Source;

pub use mcode::Program;

/// Compile one source unit into a validated [`Program`].
pub fn compile(source: &Source) -> Result<Program, Error> {
    compile_with_cancel(source, &CancelToken::new())
}

/// Like [`compile`], but checks `cancel` at stage boundaries and
/// between instructions.
pub fn compile_with_cancel(source: &Source, cancel: &CancelToken) -> Result<Program, Error> {
    cancel.check()?;
    let parsed = parser::Parser::new(lexer::Lexer::new(source))?.parse(cancel)?;
    resolve::resolve(parsed, cancel)
}
