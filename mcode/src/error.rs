use thiserror::Error;

use crate::field::Field;

/// Structural violations of the control-word model.
///
/// These are target-level rules: they do not know about source text,
/// only about fields and the word they must partition. The compiler
/// wraps them with a source position for diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    #[error("control word width must be between 1 and 64 bits, got {0}")]
    BadWordWidth(u32),

    #[error("field `{0}` lies outside the {1}-bit control word")]
    FieldOutOfWord(Field, u32),

    #[error("fields `{0}` and `{1}` claim overlapping bit ranges")]
    FieldOverlap(Field, Field),

    #[error("instruction covers {got} of {want} control-word bits")]
    FieldWidth { got: u32, want: u32 },

    #[error("value 0x{value:X} does not fit field `{field}` ({width} bits)")]
    ValueTooWide { field: Field, value: u64, width: u32 },
}
