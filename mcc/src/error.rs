use color_print::ceprintln;
use thiserror::Error;

use mcode::Pos;

use crate::source::Source;
use crate::symbols::SymbolKind;

/// Everything that can abort a compilation. All variants are fatal:
/// there is no recovery and no partial output.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot open source `{0}`")]
    SourceNotFound(String, #[source] std::io::Error),

    #[error("cannot read source `{0}`")]
    SourceRead(String, #[source] std::io::Error),

    #[error("unrecognized character `{found}`")]
    Lex { pos: Pos, found: char },

    #[error("invalid numeric literal `{lexeme}`")]
    InvalidNumber { pos: Pos, lexeme: String },

    #[error("expected {expected}, found {found}")]
    Syntax {
        pos: Pos,
        expected: String,
        found: String,
    },

    #[error("unknown operation `{name}`")]
    UnknownOp { pos: Pos, name: String },

    #[error("`{op}` takes {want} operand(s), got {got}")]
    OperandCount {
        pos: Pos,
        op: String,
        want: usize,
        got: usize,
    },

    #[error("`{name}` is already defined")]
    Redefined { pos: Pos, name: String },

    #[error("undefined symbol `{name}`")]
    UndefinedSymbol { pos: Pos, name: String },

    #[error("`{name}` is a {found}, {expected} expected")]
    WrongSymbolKind {
        pos: Pos,
        name: String,
        expected: SymbolKind,
        found: SymbolKind,
    },

    #[error("field `{field}` assigned twice in one instruction")]
    DuplicateField { pos: Pos, field: String },

    #[error("missing `width` declaration")]
    MissingWidth,

    #[error("{source}")]
    ModelAt {
        pos: Pos,
        #[source]
        source: mcode::Error,
    },

    #[error("failed to write output")]
    SinkWrite(#[source] std::io::Error),

    #[error("compilation cancelled")]
    Cancelled,
}

impl Error {
    /// Source position the error points at, when it has one.
    pub fn pos(&self) -> Option<Pos> {
        match self {
            Error::Lex { pos, .. }
            | Error::InvalidNumber { pos, .. }
            | Error::Syntax { pos, .. }
            | Error::UnknownOp { pos, .. }
            | Error::OperandCount { pos, .. }
            | Error::Redefined { pos, .. }
            | Error::UndefinedSymbol { pos, .. }
            | Error::WrongSymbolKind { pos, .. }
            | Error::DuplicateField { pos, .. }
            | Error::ModelAt { pos, .. } => Some(*pos),
            _ => None,
        }
    }

    /// Print the error with file location and the offending source line.
    pub fn diag(&self, source: &Source) {
        ceprintln!("<red,bold>error</>: {}", self);
        if let Some(pos) = self.pos() {
            ceprintln!("     <blue>--></> <underline>{}:{}</>", source.name(), pos);
            ceprintln!("      <blue>|</>");
            let content = source.line(pos.line).unwrap_or("");
            ceprintln!(" <blue>{:>4} |</> {}", pos.line, content);
            ceprintln!(
                "      <blue>|</> {}<red,bold>^</>",
                " ".repeat(pos.col.saturating_sub(1) as usize)
            );
        }
    }
}
