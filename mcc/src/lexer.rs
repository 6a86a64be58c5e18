//! Lexical analysis: a lazy, pull-based token stream over a [`Source`].
//!
//! The lexer yields tokens on demand and terminates with a single `Eof`
//! token, after which the iterator fuses. Any unrecognized character is
//! fatal; there is no recovery because no partial control store is safe
//! to emit.

use mcode::Pos;

use crate::error::Error;
use crate::source::{Cursor, Source};
use crate::token::{keyword, Token, TokenKind};

pub struct Lexer<'a> {
    cur: Cursor<'a>,
    done: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a Source) -> Self {
        Lexer {
            cur: source.cursor(),
            done: false,
        }
    }

    fn next_token(&mut self) -> Result<Token, Error> {
        loop {
            while matches!(self.cur.peek(), Some(c) if c.is_whitespace()) {
                self.cur.bump();
            }

            let pos = self.cur.pos();
            let (start, c) = match self.cur.bump() {
                None => return Ok(Token::new(TokenKind::Eof, pos)),
                Some(pair) => pair,
            };

            // Line comment
            if c == '/' && self.cur.peek() == Some('/') {
                while matches!(self.cur.peek(), Some(ch) if ch != '\n') {
                    self.cur.bump();
                }
                continue;
            }

            if let Some(kind) = single_char_token(c) {
                return Ok(Token::new(kind, pos));
            }

            if c.is_ascii_alphabetic() || c == '_' {
                while matches!(self.cur.peek(), Some(ch) if ch.is_ascii_alphanumeric() || ch == '_')
                {
                    self.cur.bump();
                }
                let end = self.cur.offset();
                let lexeme = self.cur.slice(start, end);
                let kind = match keyword(lexeme) {
                    Some(kw) => TokenKind::Keyword(kw),
                    None => TokenKind::Ident(lexeme.to_string()),
                };
                return Ok(Token::new(kind, pos));
            }

            if c.is_ascii_digit() {
                while matches!(self.cur.peek(), Some(ch) if ch.is_ascii_alphanumeric() || ch == '_')
                {
                    self.cur.bump();
                }
                let end = self.cur.offset();
                let lexeme = self.cur.slice(start, end);
                let value = parse_number(lexeme, pos)?;
                return Ok(Token::new(TokenKind::Number(value), pos));
            }

            return Err(Error::Lex { pos, found: c });
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self.next_token();
        if matches!(
            item,
            Err(_)
                | Ok(Token {
                    kind: TokenKind::Eof,
                    ..
                })
        ) {
            self.done = true;
        }
        Some(item)
    }
}

fn single_char_token(c: char) -> Option<TokenKind> {
    match c {
        '=' => Some(TokenKind::Equal),
        ',' => Some(TokenKind::Comma),
        ':' => Some(TokenKind::Colon),
        '$' => Some(TokenKind::Dollar),
        '{' => Some(TokenKind::LBrace),
        '}' => Some(TokenKind::RBrace),
        _ => None,
    }
}

/// Parse an unsigned literal, honoring `0x`/`0o`/`0b` prefixes and `_`
/// digit separators.
fn parse_number(lexeme: &str, pos: Pos) -> Result<u64, Error> {
    let cleaned = lexeme.replace('_', "");
    let (radix, digits) = match cleaned.get(..2) {
        Some("0x") | Some("0X") => (16, &cleaned[2..]),
        Some("0o") | Some("0O") => (8, &cleaned[2..]),
        Some("0b") | Some("0B") => (2, &cleaned[2..]),
        _ => (10, cleaned.as_str()),
    };
    u64::from_str_radix(digits, radix).map_err(|_| Error::InvalidNumber {
        pos,
        lexeme: lexeme.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Keyword;

    fn lex(text: &str) -> Vec<TokenKind> {
        let src = Source::from_text("test", text);
        Lexer::new(&src)
            .map(|t| t.expect("lex failure").kind)
            .collect()
    }

    #[test]
    fn symbols_keywords_idents_numbers() {
        assert_eq!(
            lex("field SEQ 15:12"),
            vec![
                TokenKind::Keyword(Keyword::Field),
                TokenKind::Ident("SEQ".into()),
                TokenKind::Number(15),
                TokenKind::Colon,
                TokenKind::Number(12),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn numeric_prefixes() {
        assert_eq!(
            lex("10 0x1F 0b101 0o17 1_000"),
            vec![
                TokenKind::Number(10),
                TokenKind::Number(0x1F),
                TokenKind::Number(0b101),
                TokenKind::Number(0o17),
                TokenKind::Number(1000),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn comments_and_whitespace_are_skipped() {
        assert_eq!(
            lex("a // trailing comment = { }\n  b"),
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::Ident("b".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn empty_input_yields_only_eof() {
        assert_eq!(lex(""), vec![TokenKind::Eof]);
        assert_eq!(lex("// only a comment"), vec![TokenKind::Eof]);
    }

    #[test]
    fn iterator_fuses_after_eof() {
        let src = Source::from_text("test", "x");
        let mut lexer = Lexer::new(&src);
        assert!(matches!(lexer.next(), Some(Ok(_)))); // ident
        assert!(
            matches!(lexer.next(), Some(Ok(Token { kind: TokenKind::Eof, .. })))
        );
        assert!(lexer.next().is_none());
        assert!(lexer.next().is_none());
    }

    #[test]
    fn unrecognized_character_is_fatal_at_exact_position() {
        let src = Source::from_text("test", "width 16\nSEQ = #5");
        let err = Lexer::new(&src)
            .collect::<Result<Vec<_>, _>>()
            .unwrap_err();
        match err {
            Error::Lex { pos, found } => {
                assert_eq!(found, '#');
                assert_eq!(pos, Pos::new(2, 7));
            }
            other => panic!("expected lex error, got {other:?}"),
        }
    }

    #[test]
    fn bad_numeric_literal() {
        let src = Source::from_text("test", "0xZZ");
        let err = Lexer::new(&src)
            .collect::<Result<Vec<_>, _>>()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidNumber { .. }));
    }

    #[test]
    fn positions_are_one_based() {
        let src = Source::from_text("test", "ab =\ncd");
        let tokens: Vec<Token> = Lexer::new(&src).map(|t| t.unwrap()).collect();
        assert_eq!(tokens[0].pos, Pos::new(1, 1));
        assert_eq!(tokens[1].pos, Pos::new(1, 4));
        assert_eq!(tokens[2].pos, Pos::new(2, 1));
    }

    #[test]
    fn lexing_is_restartable_from_source() {
        let src = Source::from_text("test", "a = 1");
        let first = lex("a = 1");
        let second: Vec<TokenKind> = Lexer::new(&src).map(|t| t.unwrap().kind).collect();
        assert_eq!(first, second);
    }
}
