//! Pass 2: bind symbolic placeholders against the completed symbol
//! table and validate each instruction's control-word structure.
//!
//! Running strictly after pass 1 is what makes forward references work:
//! by the time anything is looked up here, every label, constant and
//! field the source defines is already in the table.

use mcode::{Field, FieldValue, MicroInstruction, Program};

use crate::cancel::CancelToken;
use crate::error::Error;
use crate::parser::{Expr, ParseOutput, ProtoAssign};
use crate::symbols::{Symbol, SymbolKind, Symbols};

/// Resolve and validate a parsed unit into an immutable [`Program`].
pub fn resolve(parsed: ParseOutput, cancel: &CancelToken) -> Result<Program, Error> {
    let ParseOutput {
        width,
        instructions,
        symbols,
    } = parsed;

    let mut resolved = Vec::with_capacity(instructions.len());
    for proto in instructions {
        cancel.check()?;
        let mut fields = Vec::with_capacity(proto.assigns.len());
        for (_, assign) in proto.assigns {
            fields.push(resolve_assign(assign, &symbols)?);
        }
        let inst = MicroInstruction::new(proto.pos, fields);
        inst.validate(width).map_err(|source| Error::ModelAt {
            pos: proto.pos,
            source,
        })?;
        resolved.push(inst);
    }
    Ok(Program::new(width, resolved))
}

fn resolve_assign(assign: ProtoAssign, symbols: &Symbols) -> Result<FieldValue, Error> {
    let range = match symbols.get(&assign.field) {
        Some(Symbol::Field { range, .. }) => *range,
        Some(other) => {
            return Err(Error::WrongSymbolKind {
                pos: assign.field_pos,
                name: assign.field,
                expected: SymbolKind::Field,
                found: other.kind(),
            })
        }
        None => {
            return Err(Error::UndefinedSymbol {
                pos: assign.field_pos,
                name: assign.field,
            })
        }
    };
    let value = resolve_value(&assign.value, symbols)?;
    Ok(FieldValue::new(
        Field {
            name: assign.field,
            range,
        },
        value,
    ))
}

fn resolve_value(expr: &Expr, symbols: &Symbols) -> Result<u64, Error> {
    match expr {
        Expr::Literal(value) => Ok(*value),
        Expr::Sym(name, pos) => match symbols.get(name) {
            Some(Symbol::Label { pc, .. }) => Ok(*pc),
            Some(Symbol::Const { value, .. }) => Ok(*value),
            Some(other) => Err(Error::WrongSymbolKind {
                pos: *pos,
                name: name.clone(),
                expected: SymbolKind::Const,
                found: other.kind(),
            }),
            None => Err(Error::UndefinedSymbol {
                pos: *pos,
                name: name.clone(),
            }),
        },
        // Templates are substituted during pass 1; a parameter here is
        // a front-end bug surfaced as a syntax error, not a panic.
        Expr::Param(n, pos) => Err(Error::Syntax {
            pos: *pos,
            expected: "a resolved operand".to_string(),
            found: format!("`${n}`"),
        }),
    }
}
