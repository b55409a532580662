//! Truth-table cell grammar.
//!
//! | Token        | Meaning                                         |
//! |--------------|-------------------------------------------------|
//! | `-`          | any value accepted                              |
//! | `?`          | inside a list, this position accepts any value  |
//! | `*<value>`   | collimator only: must NOT equal `<value>`       |
//! | `no wedge`   | zero wedges                                     |
//! | `a,b,c`      | positional per-beam/per-sample values           |

/// Any value accepted.
pub const ANY_VALUE: &str = "-";
/// Any value accepted at this list position.
pub const ANY_POSITION: &str = "?";
/// Prefix that negates a collimator cell.
pub const NEGATION_PREFIX: char = '*';
/// Zero wedges on a beam.
pub const NO_WEDGE: &str = "no wedge";
/// Field size that could not be resolved from jaw positions.
pub const NOT_EXTRACTED: &str = "Not Extracted";

/// Grammars enforced on specific parameter columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellGrammar {
    /// Integer degrees or `-`.
    Angles,
    /// Integer centimetres, `?` or `-`.
    Distances,
    /// Integer degrees, `no wedge` or `-`.
    Wedges,
    /// Integer degrees, `*<degrees>` or `-`.
    Collimator,
}

impl CellGrammar {
    /// Whether every comma-separated entry of `cell` is allowed.
    pub fn accepts(&self, cell: &str) -> bool {
        split_list(cell).all(|entry| self.accepts_entry(entry))
    }

    fn accepts_entry(&self, entry: &str) -> bool {
        if is_digits(entry) || entry == ANY_VALUE {
            return true;
        }
        match self {
            CellGrammar::Angles => false,
            CellGrammar::Distances => entry == ANY_POSITION,
            CellGrammar::Wedges => entry == NO_WEDGE,
            CellGrammar::Collimator => entry
                .strip_prefix(NEGATION_PREFIX)
                .is_some_and(is_digits),
        }
    }
}

/// Split a positional list cell into its entries.
pub fn split_list(cell: &str) -> impl Iterator<Item = &str> {
    cell.split(',').map(str::trim)
}

/// Non-empty and ASCII digits only.
pub fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Whether a list entry places no constraint on its position.
pub fn is_open_position(entry: &str) -> bool {
    entry == ANY_POSITION || entry == ANY_VALUE
}
