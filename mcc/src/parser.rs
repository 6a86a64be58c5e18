//! Syntactic analysis, pass 1 of the front end.
//!
//! Recursive descent over the token stream with a single-token
//! lookahead buffer. The output is deliberately provisional: operand
//! references stay symbolic (`Expr::Sym`) so that labels and constants
//! can be used before their defining line; pass 2 (`resolve`) binds
//! them against the completed symbol table.
//!
//! Grammar:
//!
//! ```text
//! program  := { decl | label | instr }
//! decl     := "width" NUMBER
//!           | "field" IDENT NUMBER ":" NUMBER      // hi:lo, inclusive
//!           | "const" IDENT "=" NUMBER
//!           | "op" IDENT "{" assign { "," assign } "}"
//! label    := IDENT ":"
//! instr    := IDENT [ value { "," value } ]        // declared op mnemonic
//!           | assign { "," assign }                // raw field assignments
//! assign   := IDENT "=" value
//! value    := NUMBER | IDENT | "$" NUMBER          // "$n" only in op bodies
//! ```

use indexmap::IndexMap;

use mcode::{BitRange, Pos};

use crate::cancel::CancelToken;
use crate::error::Error;
use crate::lexer::Lexer;
use crate::symbols::{Symbol, Symbols};
use crate::token::{Keyword, Token, TokenKind};

/// A value before symbol resolution.
#[derive(Debug, Clone)]
pub enum Expr {
    Literal(u64),
    /// Label or constant reference, resolved in pass 2.
    Sym(String, Pos),
    /// `$n` operand placeholder, only valid inside an `op` body.
    Param(usize, Pos),
}

/// One `FIELD = value` pair, field still unresolved by name.
#[derive(Debug, Clone)]
pub struct ProtoAssign {
    pub field: String,
    pub field_pos: Pos,
    pub value: Expr,
}

/// A provisional micro-instruction, keyed by field name so a duplicate
/// assignment is caught where it is written.
#[derive(Debug, Clone)]
pub struct ProtoInstr {
    pub pos: Pos,
    pub assigns: IndexMap<String, ProtoAssign>,
}

/// A declared `op` mnemonic: a reusable instruction body with
/// positional `$n` parameters.
#[derive(Debug, Clone)]
struct OpTemplate {
    arity: usize,
    assigns: IndexMap<String, ProtoAssign>,
}

/// Upper bound on `$n` parameter indices. An op body can drive at most
/// one operand per field, and a 64-bit word holds at most 64 fields.
const MAX_OPERANDS: usize = 64;

/// Everything pass 1 hands to pass 2.
#[derive(Debug)]
pub struct ParseOutput {
    pub width: u32,
    pub instructions: Vec<ProtoInstr>,
    pub symbols: Symbols,
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    symbols: Symbols,
    ops: IndexMap<String, OpTemplate>,
    instructions: Vec<ProtoInstr>,
    width: Option<u32>,
}

impl<'a> Parser<'a> {
    pub fn new(mut lexer: Lexer<'a>) -> Result<Self, Error> {
        let current = match lexer.next() {
            Some(tok) => tok?,
            None => Token::new(TokenKind::Eof, Pos::default()),
        };
        Ok(Parser {
            lexer,
            current,
            symbols: Symbols::new(),
            ops: IndexMap::new(),
            instructions: Vec::new(),
            width: None,
        })
    }

    pub fn parse(mut self, cancel: &CancelToken) -> Result<ParseOutput, Error> {
        loop {
            cancel.check()?;
            match &self.current.kind {
                TokenKind::Eof => break,
                TokenKind::Keyword(Keyword::Width) => self.parse_width()?,
                TokenKind::Keyword(Keyword::Field) => self.parse_field()?,
                TokenKind::Keyword(Keyword::Const) => self.parse_const()?,
                TokenKind::Keyword(Keyword::Op) => self.parse_op()?,
                TokenKind::Ident(_) => self.parse_line()?,
                _ => {
                    return Err(self.syntax_error("a declaration, label or instruction"));
                }
            }
        }

        let width = match self.width {
            Some(w) => w,
            None => {
                let has_fields = self
                    .symbols
                    .iter()
                    .any(|(_, sym)| matches!(sym, Symbol::Field { .. }));
                if has_fields || !self.instructions.is_empty() {
                    return Err(Error::MissingWidth);
                }
                0
            }
        };

        Ok(ParseOutput {
            width,
            instructions: self.instructions,
            symbols: self.symbols,
        })
    }

    // ------------------------------------------------------------------
    // Token plumbing

    /// Consume the lookahead token and pull the next one.
    fn advance(&mut self) -> Result<Token, Error> {
        let next = match self.lexer.next() {
            Some(tok) => tok?,
            // The lexer fuses after Eof; pulling further is a pipeline bug.
            None => {
                return Err(Error::Syntax {
                    pos: self.current.pos,
                    expected: "nothing".to_string(),
                    found: "a read past end of file".to_string(),
                })
            }
        };
        Ok(std::mem::replace(&mut self.current, next))
    }

    /// Consume the lookahead if it matches `kind` exactly.
    fn eat(&mut self, kind: &TokenKind) -> Result<bool, Error> {
        if self.current.kind == *kind {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> Result<Token, Error> {
        if self.current.kind == *kind {
            self.advance()
        } else {
            Err(self.syntax_error(what))
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<(String, Pos), Error> {
        if !matches!(self.current.kind, TokenKind::Ident(_)) {
            return Err(self.syntax_error(what));
        }
        let tok = self.advance()?;
        match tok.kind {
            TokenKind::Ident(name) => Ok((name, tok.pos)),
            _ => Err(self.syntax_error(what)),
        }
    }

    fn expect_number(&mut self, what: &str) -> Result<(u64, Pos), Error> {
        if !matches!(self.current.kind, TokenKind::Number(_)) {
            return Err(self.syntax_error(what));
        }
        let tok = self.advance()?;
        match tok.kind {
            TokenKind::Number(value) => Ok((value, tok.pos)),
            _ => Err(self.syntax_error(what)),
        }
    }

    fn syntax_error(&self, expected: &str) -> Error {
        Error::Syntax {
            pos: self.current.pos,
            expected: expected.to_string(),
            found: self.current.kind.to_string(),
        }
    }

    // ------------------------------------------------------------------
    // Declarations

    fn parse_width(&mut self) -> Result<(), Error> {
        let kw = self.advance()?;
        let (value, pos) = self.expect_number("the control-word width")?;
        if self.width.is_some() {
            return Err(Error::Redefined {
                pos: kw.pos,
                name: "width".to_string(),
            });
        }
        if value == 0 || value > 64 {
            return Err(Error::ModelAt {
                pos,
                source: mcode::Error::BadWordWidth(value.min(u32::MAX as u64) as u32),
            });
        }
        self.width = Some(value as u32);
        Ok(())
    }

    fn parse_field(&mut self) -> Result<(), Error> {
        self.advance()?;
        let (name, pos) = self.expect_ident("a field name")?;
        let (hi, hi_pos) = self.expect_number("the field's high bit")?;
        self.expect(&TokenKind::Colon, "`:` between high and low bit")?;
        let (lo, _) = self.expect_number("the field's low bit")?;
        if hi > 63 || hi < lo {
            return Err(Error::Syntax {
                pos: hi_pos,
                expected: "a bit range `hi:lo` with 63 >= hi >= lo".to_string(),
                found: format!("`{hi}:{lo}`"),
            });
        }
        self.symbols
            .define_field(&name, pos, BitRange::new(hi as u32, lo as u32))
    }

    fn parse_const(&mut self) -> Result<(), Error> {
        self.advance()?;
        let (name, pos) = self.expect_ident("a constant name")?;
        self.expect(&TokenKind::Equal, "`=` after the constant name")?;
        let (value, _) = self.expect_number("the constant value")?;
        self.symbols.define(&name, pos, Symbol::Const { pos, value })
    }

    fn parse_op(&mut self) -> Result<(), Error> {
        self.advance()?;
        let (name, pos) = self.expect_ident("an op name")?;
        if self.ops.contains_key(&name) {
            return Err(Error::Redefined { pos, name });
        }
        self.expect(&TokenKind::LBrace, "`{` to open the op body")?;

        let mut assigns = IndexMap::new();
        let mut arity = 0usize;
        loop {
            let assign = self.parse_assign(true)?;
            if let Expr::Param(n, param_pos) = assign.value {
                if n >= MAX_OPERANDS {
                    return Err(Error::Syntax {
                        pos: param_pos,
                        expected: format!("an operand index below {MAX_OPERANDS}"),
                        found: format!("`${n}`"),
                    });
                }
                arity = arity.max(n + 1);
            }
            let field_pos = assign.field_pos;
            let field = assign.field.clone();
            if assigns.insert(field.clone(), assign).is_some() {
                return Err(Error::DuplicateField {
                    pos: field_pos,
                    field,
                });
            }
            if !self.eat(&TokenKind::Comma)? {
                break;
            }
        }
        self.expect(&TokenKind::RBrace, "`}` to close the op body")?;

        self.ops.insert(name, OpTemplate { arity, assigns });
        Ok(())
    }

    // ------------------------------------------------------------------
    // Labels and instructions

    fn parse_line(&mut self) -> Result<(), Error> {
        let tok = self.advance()?;
        let (name, pos) = match tok.kind {
            TokenKind::Ident(name) => (name, tok.pos),
            _ => return Err(self.syntax_error("an identifier")),
        };

        if self.eat(&TokenKind::Colon)? {
            let pc = self.instructions.len() as u64;
            return self.symbols.define(&name, pos, Symbol::Label { pos, pc });
        }

        if self.eat(&TokenKind::Equal)? {
            return self.parse_raw_instr(name, pos);
        }

        self.parse_mnemonic_instr(name, pos)
    }

    /// `FIELD = value, FIELD = value, ...`; the leading assignment's
    /// field name and `=` are already consumed.
    fn parse_raw_instr(&mut self, first: String, pos: Pos) -> Result<(), Error> {
        let mut assigns = IndexMap::new();
        let value = self.parse_value(false)?;
        assigns.insert(
            first.clone(),
            ProtoAssign {
                field: first,
                field_pos: pos,
                value,
            },
        );

        while self.eat(&TokenKind::Comma)? {
            let assign = self.parse_assign(false)?;
            let field_pos = assign.field_pos;
            let field = assign.field.clone();
            if assigns.insert(field.clone(), assign).is_some() {
                return Err(Error::DuplicateField {
                    pos: field_pos,
                    field,
                });
            }
        }

        self.instructions.push(ProtoInstr { pos, assigns });
        Ok(())
    }

    /// A declared mnemonic plus its operands, expanded from the op
    /// template by substituting each `$n` placeholder.
    fn parse_mnemonic_instr(&mut self, name: String, pos: Pos) -> Result<(), Error> {
        let template = match self.ops.get(&name) {
            Some(t) => t.clone(),
            None => return Err(Error::UnknownOp { pos, name }),
        };

        let mut operands = Vec::new();
        if template.arity > 0 {
            operands.push(self.parse_value(false)?);
            while self.eat(&TokenKind::Comma)? {
                operands.push(self.parse_value(false)?);
            }
        }
        if operands.len() != template.arity {
            return Err(Error::OperandCount {
                pos,
                op: name,
                want: template.arity,
                got: operands.len(),
            });
        }

        let mut assigns = IndexMap::new();
        for (field, proto) in &template.assigns {
            let value = match &proto.value {
                Expr::Param(n, _) => operands[*n].clone(),
                other => other.clone(),
            };
            assigns.insert(
                field.clone(),
                ProtoAssign {
                    field: field.clone(),
                    field_pos: pos,
                    value,
                },
            );
        }

        self.instructions.push(ProtoInstr { pos, assigns });
        Ok(())
    }

    fn parse_assign(&mut self, allow_param: bool) -> Result<ProtoAssign, Error> {
        let (field, field_pos) = self.expect_ident("a field name")?;
        self.expect(&TokenKind::Equal, "`=` after the field name")?;
        let value = self.parse_value(allow_param)?;
        Ok(ProtoAssign {
            field,
            field_pos,
            value,
        })
    }

    fn parse_value(&mut self, allow_param: bool) -> Result<Expr, Error> {
        match &self.current.kind {
            TokenKind::Number(_) => {
                let (value, _) = self.expect_number("a value")?;
                Ok(Expr::Literal(value))
            }
            TokenKind::Ident(_) => {
                let (name, pos) = self.expect_ident("a value")?;
                Ok(Expr::Sym(name, pos))
            }
            TokenKind::Dollar if allow_param => {
                self.advance()?;
                let (n, pos) = self.expect_number("an operand index after `$`")?;
                Ok(Expr::Param(n as usize, pos))
            }
            _ => Err(self.syntax_error("a number or identifier")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Source;

    fn parse(text: &str) -> Result<ParseOutput, Error> {
        let src = Source::from_text("test", text);
        Parser::new(Lexer::new(&src))?.parse(&CancelToken::new())
    }

    const HEADER: &str = "\
width 8
field OPC 7:4
field ARG 3:0
";

    #[test]
    fn empty_source_parses_to_nothing() {
        let out = parse("").unwrap();
        assert!(out.instructions.is_empty());
        assert_eq!(out.width, 0);
    }

    #[test]
    fn raw_instruction() {
        let out = parse(&format!("{HEADER}OPC = 3, ARG = 0xF")).unwrap();
        assert_eq!(out.width, 8);
        assert_eq!(out.instructions.len(), 1);
        let inst = &out.instructions[0];
        assert_eq!(inst.assigns.len(), 2);
        assert!(matches!(inst.assigns["OPC"].value, Expr::Literal(3)));
        assert!(matches!(inst.assigns["ARG"].value, Expr::Literal(0xF)));
    }

    #[test]
    fn label_binds_to_next_instruction_index() {
        let out = parse(&format!(
            "{HEADER}OPC = 0, ARG = 0\nHERE:\nOPC = 1, ARG = 0"
        ))
        .unwrap();
        match out.symbols.get("HERE") {
            Some(Symbol::Label { pc, .. }) => assert_eq!(*pc, 1),
            other => panic!("unexpected symbol: {other:?}"),
        }
    }

    #[test]
    fn op_template_expansion() {
        let out = parse(&format!(
            "{HEADER}op EMIT {{ OPC = $0, ARG = $1 }}\nEMIT 2, 5"
        ))
        .unwrap();
        let inst = &out.instructions[0];
        assert!(matches!(inst.assigns["OPC"].value, Expr::Literal(2)));
        assert!(matches!(inst.assigns["ARG"].value, Expr::Literal(5)));
    }

    #[test]
    fn op_operands_may_be_symbolic() {
        let out = parse(&format!(
            "{HEADER}op JMP {{ OPC = 7, ARG = $0 }}\nSTART:\nJMP START"
        ))
        .unwrap();
        let inst = &out.instructions[0];
        assert!(matches!(inst.assigns["OPC"].value, Expr::Literal(7)));
        assert!(
            matches!(&inst.assigns["ARG"].value, Expr::Sym(name, _) if name == "START")
        );
    }

    #[test]
    fn operand_count_mismatch() {
        let err = parse(&format!(
            "{HEADER}op EMIT {{ OPC = $0, ARG = $1 }}\nEMIT 2"
        ))
        .unwrap_err();
        assert!(matches!(
            err,
            Error::OperandCount { want: 2, got: 1, .. }
        ));
    }

    #[test]
    fn unknown_mnemonic() {
        let err = parse(&format!("{HEADER}BOGUS 1")).unwrap_err();
        assert!(matches!(err, Error::UnknownOp { name, .. } if name == "BOGUS"));
    }

    #[test]
    fn duplicate_field_in_one_instruction() {
        let err = parse(&format!("{HEADER}OPC = 1, OPC = 2")).unwrap_err();
        assert!(matches!(err, Error::DuplicateField { field, .. } if field == "OPC"));
    }

    #[test]
    fn syntax_error_reports_expected_and_found() {
        let err = parse("width width").unwrap_err();
        match err {
            Error::Syntax { expected, found, pos } => {
                assert_eq!(expected, "the control-word width");
                assert_eq!(found, "`width`");
                assert_eq!(pos, Pos::new(1, 7));
            }
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn width_must_be_declared_once() {
        assert!(matches!(
            parse("width 8\nwidth 16").unwrap_err(),
            Error::Redefined { name, .. } if name == "width"
        ));
        assert!(matches!(
            parse("field OPC 7:4").unwrap_err(),
            Error::MissingWidth
        ));
        assert!(matches!(
            parse("width 65").unwrap_err(),
            Error::ModelAt { .. }
        ));
    }

    #[test]
    fn op_parameter_index_is_bounded() {
        // u64::MAX would overflow the arity computation if let through.
        let err = parse(&format!(
            "{HEADER}op X {{ OPC = $18446744073709551615, ARG = 0 }}"
        ))
        .unwrap_err();
        assert!(matches!(
            err,
            Error::Syntax { found, .. } if found == "`$18446744073709551615`"
        ));

        let err = parse(&format!("{HEADER}op X {{ OPC = $64, ARG = 0 }}")).unwrap_err();
        assert!(matches!(err, Error::Syntax { .. }));

        assert!(parse(&format!("{HEADER}op X {{ OPC = $0, ARG = $1 }}")).is_ok());
    }

    #[test]
    fn dollar_parameter_outside_op_body_is_rejected() {
        let err = parse(&format!("{HEADER}OPC = $0, ARG = 0")).unwrap_err();
        assert!(matches!(err, Error::Syntax { .. }));
    }

    #[test]
    fn reversed_bit_range_is_rejected() {
        let err = parse("width 8\nfield OPC 4:7").unwrap_err();
        assert!(matches!(err, Error::Syntax { .. }));
    }

    #[test]
    fn cancellation_stops_the_parse() {
        let src = Source::from_text("test", &format!("{HEADER}OPC = 1, ARG = 2"));
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = Parser::new(Lexer::new(&src))
            .unwrap()
            .parse(&cancel)
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }
}
