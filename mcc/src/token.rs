use std::fmt;

use mcode::Pos;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use strum::Display;

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: Pos,
}

impl Token {
    pub fn new(kind: TokenKind, pos: Pos) -> Self {
        Token { kind, pos }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.kind, self.pos)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Single character symbols
    Equal,  // '='
    Comma,  // ','
    Colon,  // ':'
    Dollar, // '$'
    LBrace, // '{'
    RBrace, // '}'

    Keyword(Keyword),

    Ident(String),

    /// Unsigned literal; `0x`/`0o`/`0b` prefixes and `_` separators
    /// are already folded into the value.
    Number(u64),

    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Equal => write!(f, "`=`"),
            TokenKind::Comma => write!(f, "`,`"),
            TokenKind::Colon => write!(f, "`:`"),
            TokenKind::Dollar => write!(f, "`$`"),
            TokenKind::LBrace => write!(f, "`{{`"),
            TokenKind::RBrace => write!(f, "`}}`"),
            TokenKind::Keyword(kw) => write!(f, "`{kw}`"),
            TokenKind::Ident(name) => write!(f, "`{name}`"),
            TokenKind::Number(n) => write!(f, "`{n}`"),
            TokenKind::Eof => write!(f, "end of file"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Keyword {
    Width,
    Field,
    Const,
    Op,
}

static KEYWORDS: Lazy<HashMap<&'static str, Keyword>> = Lazy::new(|| {
    HashMap::from([
        ("width", Keyword::Width),
        ("field", Keyword::Field),
        ("const", Keyword::Const),
        ("op", Keyword::Op),
    ])
});

/// Keyword lookup for an identifier-shaped lexeme.
pub fn keyword(lexeme: &str) -> Option<Keyword> {
    KEYWORDS.get(lexeme).copied()
}
