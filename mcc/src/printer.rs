//! Serialization of a validated [`Program`] into its external forms.
//!
//! The encoded stream is the compiler's versioned output contract:
//! one control word per micro-instruction, in program order.
//!
//! - `hex` (default): uppercase hexadecimal, zero-padded to
//!   ceil(width/4) digits, one word per line, `\n` terminated.
//! - `bin`: `0`/`1` text, zero-padded to `width` digits, one word per
//!   line.
//! - `raw`: little-endian bytes, ceil(width/8) bytes per word, no
//!   separators.
//!
//! Output is deterministic: equal programs produce byte-identical
//! streams.

use std::io::Write;

use clap::ValueEnum;
use color_print::cformat;
use strum::Display;

use mcode::Program;

use crate::cancel::CancelToken;
use crate::error::Error;
use crate::source::Source;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, ValueEnum)]
#[strum(serialize_all = "lowercase")]
pub enum Format {
    #[default]
    Hex,
    Bin,
    Raw,
}

/// Write every control word of `program` to `sink`.
pub fn write_program(
    program: &Program,
    sink: &mut dyn Write,
    format: Format,
    cancel: &CancelToken,
) -> Result<(), Error> {
    let hex_digits = ((program.width + 3) / 4) as usize;
    let bin_digits = program.width as usize;
    let word_bytes = program.word_bytes();

    for inst in &program.instructions {
        cancel.check()?;
        let word = inst.encode();
        match format {
            Format::Hex => {
                writeln!(sink, "{word:0>hex_digits$X}").map_err(Error::SinkWrite)?
            }
            Format::Bin => {
                writeln!(sink, "{word:0>bin_digits$b}").map_err(Error::SinkWrite)?
            }
            Format::Raw => sink
                .write_all(&word.to_le_bytes()[..word_bytes])
                .map_err(Error::SinkWrite)?,
        }
    }
    sink.flush().map_err(Error::SinkWrite)
}

/// Colored side-by-side listing of encoded words and the source lines
/// they came from, for `--dump`.
pub fn listing(program: &Program, source: &Source) -> String {
    let hex_digits = ((program.width + 3) / 4) as usize;
    let mut out = String::new();
    out.push_str(&cformat!(
        "---------[<underline>{}</>]---------\n",
        source.name()
    ));
    for (pc, inst) in program.instructions.iter().enumerate() {
        let text = source.line(inst.pos.line).unwrap_or("").trim_end();
        out.push_str(&cformat!(
            "<green>[{:04X}]</> <yellow>{:0>digits$X}</> | {:>4}: {}\n",
            pc,
            inst.encode(),
            inst.pos.line,
            text,
            digits = hex_digits,
        ));
    }
    out
}
