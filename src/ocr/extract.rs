use std::fmt;

use crate::log;

/// The three loot counters shown on the attack screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LootReading {
    pub gold: u64,
    pub elixir: u64,
    pub dark: u64,
}

impl LootReading {
    pub fn new(gold: u64, elixir: u64, dark: u64) -> Self {
        Self { gold, elixir, dark }
    }

    /// All three counters are zero: no base on screen, or OCR read nothing.
    pub fn is_zero(&self) -> bool {
        self.gold == 0 && self.elixir == 0 && self.dark == 0
    }
}

impl fmt::Display for LootReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Gold {}  Elixir {}  Dark {}",
            with_thousands(self.gold),
            with_thousands(self.elixir),
            with_thousands(self.dark)
        )
    }
}

/// Formats `1234567` as `1,234,567`.
pub fn with_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Outcome of parsing OCR text.
///
/// Both failure kinds resolve to the zero reading, which the decision layer
/// treats like an empty screen. They are kept apart so the log can say why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LootParse {
    Read(LootReading),
    /// Fewer than three non-empty lines.
    Shortfall { lines: Vec<String> },
    /// Three lines found but at least one held no parsable number.
    Unreadable { lines: Vec<String> },
}

impl LootParse {
    pub fn reading(&self) -> LootReading {
        match self {
            LootParse::Read(reading) => *reading,
            LootParse::Shortfall { .. } | LootParse::Unreadable { .. } => LootReading::default(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        !matches!(self, LootParse::Read(_))
    }
}

/// Keeps only the ASCII digits of `line` and parses them.
fn parse_counter(line: &str) -> Option<u64> {
    let digits: String = line.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Extracts gold, elixir and dark elixir from multi-line OCR text.
///
/// The first three non-empty lines are used in order. Separators such as
/// `,` or spaces are stripped. If any of the three lines has no number the
/// whole reading is discarded rather than mixing zeros with real values.
pub fn parse_loot(text: &str) -> LootParse {
    let lines: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect();

    if lines.len() < 3 {
        log(&format!(
            "[WARN] loot parse failed; expected >=3 lines, got {}: {:?}",
            lines.len(),
            lines
        ));
        return LootParse::Shortfall { lines };
    }

    let counters: Option<Vec<u64>> = lines[..3].iter().map(|l| parse_counter(l)).collect();
    match counters.as_deref() {
        Some(&[gold, elixir, dark]) => LootParse::Read(LootReading::new(gold, elixir, dark)),
        _ => {
            let lines = lines[..3].to_vec();
            log(&format!(
                "[WARN] loot parse failed; non-numeric lines: {:?}",
                lines
            ));
            LootParse::Unreadable { lines }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_loot_strips_separators() {
        let parsed = parse_loot("1,234,567\n2,000,000\n15,000");
        assert_eq!(parsed, LootParse::Read(LootReading::new(1_234_567, 2_000_000, 15_000)));
    }

    #[test]
    fn test_parse_loot_skips_blank_lines_and_extra_lines() {
        let parsed = parse_loot("\n  812 345 \n\n\t\n790000\n 9,876\n1234\n");
        assert_eq!(parsed.reading(), LootReading::new(812_345, 790_000, 9_876));
    }

    #[test]
    fn test_parse_loot_empty_text() {
        let parsed = parse_loot("");
        assert!(matches!(parsed, LootParse::Shortfall { ref lines } if lines.is_empty()));
        assert_eq!(parsed.reading(), LootReading::default());
        assert!(parsed.is_degraded());
    }

    #[test]
    fn test_parse_loot_two_lines_is_shortfall() {
        let parsed = parse_loot("100\n200\n");
        assert!(matches!(parsed, LootParse::Shortfall { ref lines } if lines.len() == 2));
        assert!(parsed.reading().is_zero());
    }

    #[test]
    fn test_parse_loot_non_numeric() {
        let parsed = parse_loot("abc\ndef\nxyz");
        assert!(matches!(parsed, LootParse::Unreadable { .. }));
        assert_eq!(parsed.reading(), LootReading::default());
    }

    #[test]
    fn test_parse_loot_partial_success_is_discarded() {
        let parsed = parse_loot("900000\n900000\n--");
        assert!(matches!(parsed, LootParse::Unreadable { .. }));
        assert_eq!(parsed.reading(), LootReading::default());
    }

    #[test]
    fn test_parse_loot_overflow_is_unreadable() {
        let parsed = parse_loot("1\n2\n99999999999999999999999");
        assert!(matches!(parsed, LootParse::Unreadable { .. }));
    }

    #[test]
    fn test_with_thousands() {
        assert_eq!(with_thousands(0), "0");
        assert_eq!(with_thousands(999), "999");
        assert_eq!(with_thousands(1000), "1,000");
        assert_eq!(with_thousands(1_234_567), "1,234,567");
    }

    #[test]
    fn test_reading_display() {
        let reading = LootReading::new(900_000, 12_345, 20_000);
        assert_eq!(reading.to_string(), "Gold 900,000  Elixir 12,345  Dark 20,000");
    }
}
