//! Shared model for the microcode toolchain.
//!
//! The compiler front-end (`mcc`) produces a [`Program`]; the simulator /
//! viewer consumes it, either directly or re-encoded as control words.
//! Everything here is plain data plus the structural rules a valid
//! control word must satisfy.

pub mod error;
pub mod field;
pub mod pos;
pub mod program;

pub use error::Error;
pub use field::{BitRange, Field};
pub use pos::Pos;
pub use program::{FieldValue, MicroInstruction, Program};
