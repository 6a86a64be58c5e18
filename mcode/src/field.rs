use serde::{Deserialize, Serialize};
use std::fmt;

/// Inclusive bit range `hi:lo` inside a control word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitRange {
    pub hi: u32,
    pub lo: u32,
}

impl BitRange {
    /// `hi` must be >= `lo`; callers validate user input before building one.
    pub fn new(hi: u32, lo: u32) -> Self {
        debug_assert!(hi >= lo);
        BitRange { hi, lo }
    }

    pub fn width(&self) -> u32 {
        self.hi - self.lo + 1
    }

    pub fn overlaps(&self, other: &BitRange) -> bool {
        self.lo <= other.hi && other.lo <= self.hi
    }

    /// Largest value the range can hold.
    pub fn max_value(&self) -> u64 {
        if self.width() >= 64 {
            u64::MAX
        } else {
            (1u64 << self.width()) - 1
        }
    }

    /// Mask of the range's bits within the control word.
    pub fn mask(&self) -> u64 {
        self.max_value() << self.lo
    }
}

impl fmt::Display for BitRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.hi, self.lo)
    }
}

/// A named control signal occupying a fixed bit range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub range: BitRange,
}

impl Field {
    pub fn new(name: impl Into<String>, hi: u32, lo: u32) -> Self {
        Field {
            name: name.into(),
            range: BitRange::new(hi, lo),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.range)
    }
}
