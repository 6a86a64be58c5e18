//! Symbol table for one compilation: labels, field declarations and
//! constant aliases, in an insertion-ordered map so that diagnostics
//! and listings stay deterministic.

use indexmap::IndexMap;
use log::warn;
use strum::Display;

use mcode::{BitRange, Pos};

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum SymbolKind {
    Label,
    Field,
    Const,
}

#[derive(Debug, Clone)]
pub enum Symbol {
    /// Bound to the index of the instruction that follows it.
    Label { pos: Pos, pc: u64 },
    /// A declared control-word field.
    Field { pos: Pos, range: BitRange },
    /// A named constant.
    Const { pos: Pos, value: u64 },
}

impl Symbol {
    pub fn kind(&self) -> SymbolKind {
        match self {
            Symbol::Label { .. } => SymbolKind::Label,
            Symbol::Field { .. } => SymbolKind::Field,
            Symbol::Const { .. } => SymbolKind::Const,
        }
    }
}

#[derive(Debug, Default)]
pub struct Symbols(IndexMap<String, Symbol>);

impl Symbols {
    pub fn new() -> Self {
        Symbols(IndexMap::new())
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Symbol)> {
        self.0.iter()
    }

    /// Define a label or constant. Any name clash is an error.
    pub fn define(&mut self, name: &str, pos: Pos, sym: Symbol) -> Result<(), Error> {
        if self.0.contains_key(name) {
            return Err(Error::Redefined {
                pos,
                name: name.to_string(),
            });
        }
        self.0.insert(name.to_string(), sym);
        Ok(())
    }

    /// Define a field. Re-declaring a field with a different range
    /// replaces the old one (the last declaration wins); re-declaring
    /// the identical range, or clashing with a non-field symbol, is an
    /// error.
    pub fn define_field(&mut self, name: &str, pos: Pos, range: BitRange) -> Result<(), Error> {
        match self.0.get(name) {
            Some(Symbol::Field { range: old, .. }) if *old != range => {
                warn!("field `{name}` re-declared at {pos}: {old} replaced by {range}");
            }
            Some(_) => {
                return Err(Error::Redefined {
                    pos,
                    name: name.to_string(),
                });
            }
            None => {}
        }
        self.0.insert(name.to_string(), Symbol::Field { pos, range });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_and_lookup() {
        let mut syms = Symbols::new();
        syms.define("START", Pos::new(1, 1), Symbol::Label { pos: Pos::new(1, 1), pc: 2 })
            .unwrap();
        match syms.get("START") {
            Some(Symbol::Label { pc, .. }) => assert_eq!(*pc, 2),
            other => panic!("unexpected entry: {other:?}"),
        }
        assert!(syms.get("start").is_none());
    }

    #[test]
    fn clash_is_an_error() {
        let mut syms = Symbols::new();
        let pos = Pos::new(1, 1);
        syms.define("X", pos, Symbol::Const { pos, value: 1 }).unwrap();
        let err = syms
            .define("X", Pos::new(2, 1), Symbol::Label { pos: Pos::new(2, 1), pc: 0 })
            .unwrap_err();
        assert!(matches!(err, Error::Redefined { .. }));
    }

    #[test]
    fn field_redeclaration_policy() {
        let mut syms = Symbols::new();
        let pos = Pos::new(1, 1);
        syms.define_field("F", pos, BitRange::new(7, 4)).unwrap();

        // Different range: last declaration wins.
        syms.define_field("F", Pos::new(2, 1), BitRange::new(3, 0)).unwrap();
        match syms.get("F") {
            Some(Symbol::Field { range, .. }) => assert_eq!(*range, BitRange::new(3, 0)),
            other => panic!("unexpected entry: {other:?}"),
        }

        // Identical range: never a silent overwrite.
        let err = syms
            .define_field("F", Pos::new(3, 1), BitRange::new(3, 0))
            .unwrap_err();
        assert!(matches!(err, Error::Redefined { .. }));
    }
}
