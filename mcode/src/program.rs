use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::field::Field;
use crate::pos::Pos;

/// One resolved control signal: a field and the value driven onto it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldValue {
    pub field: Field,
    pub value: u64,
}

impl FieldValue {
    pub fn new(field: Field, value: u64) -> Self {
        FieldValue { field, value }
    }
}

/// One micro-instruction: an exact partition of the control word into
/// named fields, each carrying a resolved value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MicroInstruction {
    pub pos: Pos,
    pub fields: Vec<FieldValue>,
}

impl MicroInstruction {
    pub fn new(pos: Pos, fields: Vec<FieldValue>) -> Self {
        MicroInstruction { pos, fields }
    }

    /// Check the structural invariants against a `width`-bit word:
    /// every value fits its field, no two fields overlap, and the field
    /// widths sum to exactly `width`.
    pub fn validate(&self, width: u32) -> Result<(), Error> {
        if width == 0 || width > 64 {
            return Err(Error::BadWordWidth(width));
        }
        for fv in &self.fields {
            if fv.field.range.hi >= width {
                return Err(Error::FieldOutOfWord(fv.field.clone(), width));
            }
            if fv.value > fv.field.range.max_value() {
                return Err(Error::ValueTooWide {
                    field: fv.field.clone(),
                    value: fv.value,
                    width: fv.field.range.width(),
                });
            }
        }

        let mut sorted: Vec<&Field> = self.fields.iter().map(|fv| &fv.field).collect();
        sorted.sort_by_key(|f| f.range.lo);
        for pair in sorted.windows(2) {
            if pair[0].range.overlaps(&pair[1].range) {
                return Err(Error::FieldOverlap(pair[0].clone(), pair[1].clone()));
            }
        }

        let got: u32 = self.fields.iter().map(|fv| fv.field.range.width()).sum();
        if got != width {
            return Err(Error::FieldWidth { got, want: width });
        }
        Ok(())
    }

    /// Fold the field values into one control word.
    pub fn encode(&self) -> u64 {
        self.fields
            .iter()
            .fold(0u64, |word, fv| word | (fv.value << fv.field.range.lo))
    }

    /// Recover per-field values from a control word, using this
    /// instruction's own field layout. Symmetric with [`encode`].
    ///
    /// [`encode`]: MicroInstruction::encode
    pub fn decode(&self, word: u64) -> Vec<FieldValue> {
        self.fields
            .iter()
            .map(|fv| FieldValue::new(fv.field.clone(), (word & fv.field.range.mask()) >> fv.field.range.lo))
            .collect()
    }
}

/// A complete compiled unit: the control-word width plus the
/// instructions in source order. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub width: u32,
    pub instructions: Vec<MicroInstruction>,
}

impl Program {
    pub fn new(width: u32, instructions: Vec<MicroInstruction>) -> Self {
        Program {
            width,
            instructions,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Validate every instruction against the program's word width.
    pub fn validate(&self) -> Result<(), Error> {
        for inst in &self.instructions {
            inst.validate(self.width)?;
        }
        Ok(())
    }

    /// Encode all instructions, in program order.
    pub fn encode(&self) -> Vec<u64> {
        self.instructions.iter().map(|i| i.encode()).collect()
    }

    /// Bytes needed to hold one control word in raw output.
    pub fn word_bytes(&self) -> usize {
        ((self.width + 7) / 8) as usize
    }
}
