//! Human-readable sequential identifiers: `TK-2025-00001`, `INT-2025-00001`.
//!
//! Formatting and parsing live here; allocation is an atomic counter
//! increment done by the store inside the insert transaction.

const SEQUENCE_WIDTH: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SequenceKind {
    Ticket,
    Intervento,
}

impl SequenceKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            SequenceKind::Ticket => "TK",
            SequenceKind::Intervento => "INT",
        }
    }

    /// LIKE pattern matching every number of this kind for `year`.
    pub fn year_pattern(&self, year: i32) -> String {
        format!("{}-{}-%", self.prefix(), year)
    }
}

pub fn format_number(kind: SequenceKind, year: i32, sequence: i32) -> String {
    format!(
        "{}-{}-{:0width$}",
        kind.prefix(),
        year,
        sequence,
        width = SEQUENCE_WIDTH
    )
}

/// Trailing sequence of a number of the given kind and year. The SQL
/// counter seeds itself in the database; the in-memory store uses this.
#[cfg(test)]
pub fn parse_sequence(kind: SequenceKind, year: i32, numero: &str) -> Option<i32> {
    let rest = numero.strip_prefix(kind.prefix())?.strip_prefix('-')?;
    let (anno, sequenza) = rest.split_once('-')?;
    if anno.parse::<i32>().ok()? != year {
        return None;
    }
    sequenza.parse::<i32>().ok().filter(|n| *n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_zero_padding() {
        assert_eq!(format_number(SequenceKind::Ticket, 2025, 1), "TK-2025-00001");
        assert_eq!(format_number(SequenceKind::Intervento, 2025, 1234), "INT-2025-01234");
    }

    #[test]
    fn parses_only_matching_kind_and_year() {
        assert_eq!(parse_sequence(SequenceKind::Ticket, 2025, "TK-2025-00042"), Some(42));
        assert_eq!(parse_sequence(SequenceKind::Ticket, 2024, "TK-2025-00042"), None);
        assert_eq!(parse_sequence(SequenceKind::Intervento, 2025, "TK-2025-00042"), None);
        assert_eq!(parse_sequence(SequenceKind::Ticket, 2025, "TK-2025-abc"), None);
    }

    #[test]
    fn year_pattern_scopes_by_prefix() {
        assert_eq!(SequenceKind::Intervento.year_pattern(2026), "INT-2026-%");
    }
}
