// Copyright (c) 2026 rezky_nightky

use std::char;

/// Glyph sets a field can draw from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CharacterSet {
    Latin,
    Greek,
    Numbers,
    Symbols,
    #[default]
    Mixed,
}

const SYMBOLS: &str = "!@#$%^&*()-_+=[]{}|\\:;\"'<>,.?/";

impl CharacterSet {
    pub const ALL: [CharacterSet; 5] = [
        CharacterSet::Latin,
        CharacterSet::Greek,
        CharacterSet::Numbers,
        CharacterSet::Symbols,
        CharacterSet::Mixed,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CharacterSet::Latin => "latin",
            CharacterSet::Greek => "greek",
            CharacterSet::Numbers => "numbers",
            CharacterSet::Symbols => "symbols",
            CharacterSet::Mixed => "mixed",
        }
    }

    pub fn parse(s: &str) -> Option<CharacterSet> {
        let s = s.trim().to_ascii_lowercase();
        CharacterSet::ALL.into_iter().find(|c| c.name() == s)
    }

    pub fn next(self) -> CharacterSet {
        let i = CharacterSet::ALL
            .iter()
            .position(|&c| c == self)
            .unwrap_or(0);
        CharacterSet::ALL[(i + 1) % CharacterSet::ALL.len()]
    }

    /// Every glyph of the set, in table order. Never empty.
    pub fn glyphs(self) -> Vec<char> {
        let mut out = Vec::new();
        match self {
            CharacterSet::Latin => push_latin(&mut out),
            CharacterSet::Greek => push_greek(&mut out),
            CharacterSet::Numbers => push_range(&mut out, 0x30, 0x39),
            CharacterSet::Symbols => out.extend(SYMBOLS.chars()),
            CharacterSet::Mixed => {
                push_greek(&mut out);
                push_latin(&mut out);
                push_range(&mut out, 0x30, 0x39);
            }
        }
        if out.is_empty() {
            out.push('0');
            out.push('1');
        }
        out
    }
}

fn push_range(out: &mut Vec<char>, start: u32, end: u32) {
    for v in start..=end {
        if let Some(ch) = char::from_u32(v) {
            out.push(ch);
        }
    }
}

fn push_latin(out: &mut Vec<char>) {
    push_range(out, 0x41, 0x5A);
    push_range(out, 0x61, 0x7A);
}

// U+03A2 and U+03C2 (final sigma) are skipped.
fn push_greek(out: &mut Vec<char>) {
    push_range(out, 0x0391, 0x03A1);
    push_range(out, 0x03A3, 0x03A9);
    push_range(out, 0x03B1, 0x03C1);
    push_range(out, 0x03C3, 0x03C9);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_sizes_match_their_alphabets() {
        assert_eq!(CharacterSet::Latin.glyphs().len(), 52);
        assert_eq!(CharacterSet::Greek.glyphs().len(), 48);
        assert_eq!(CharacterSet::Numbers.glyphs().len(), 10);
        assert_eq!(CharacterSet::Symbols.glyphs().len(), 30);
        assert_eq!(CharacterSet::Mixed.glyphs().len(), 110);
    }

    #[test]
    fn greek_has_no_final_sigma() {
        let g = CharacterSet::Greek.glyphs();
        assert!(g.contains(&'Ω'));
        assert!(g.contains(&'σ'));
        assert!(!g.contains(&'ς'));
        assert_eq!(g.first(), Some(&'Α'));
        assert_eq!(g.last(), Some(&'ω'));
    }

    #[test]
    fn mixed_is_greek_latin_numbers() {
        let mut expected = CharacterSet::Greek.glyphs();
        expected.extend(CharacterSet::Latin.glyphs());
        expected.extend(CharacterSet::Numbers.glyphs());
        assert_eq!(CharacterSet::Mixed.glyphs(), expected);
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(CharacterSet::parse("GREEK"), Some(CharacterSet::Greek));
        assert_eq!(CharacterSet::parse("katakana"), None);
        assert_eq!(CharacterSet::Mixed.next(), CharacterSet::Latin);
    }
}
