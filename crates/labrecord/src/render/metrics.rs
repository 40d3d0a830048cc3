//! Glyph metrics for the built-in Times faces and text wrapping.
//!
//! Widths are the Adobe AFM advance widths for printable ASCII, in 1/1000 em.
//! Characters outside that range are measured as 500. Text headed for the
//! built-in fonts goes through [`fold_to_ascii`] first, so in practice every
//! measured character has a real width.

use std::borrow::Cow;

/// Points per millimetre.
pub const PT_PER_MM: f32 = 72.0 / 25.4;

const FALLBACK_WIDTH: u16 = 500;

/// Times-Roman, code points 32..=126.
const TIMES_ROMAN: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 333, 333, 333, 500, 564, 250, 333, 250, 278, // ' '..'/'
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278, 564, 564, 564, 444, // '0'..'?'
    921, 722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722, // '@'..'O'
    556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, 333, 278, 333, 469, 500, // 'P'..'_'
    333, 444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500, // '`'..'o'
    500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541, // 'p'..'~'
];

/// Times-Bold, code points 32..=126.
const TIMES_BOLD: [u16; 95] = [
    250, 333, 555, 500, 500, 1000, 833, 333, 333, 333, 500, 570, 250, 333, 250, 278, // ' '..'/'
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 570, 570, 570, 500, // '0'..'?'
    930, 722, 667, 722, 722, 667, 611, 778, 778, 389, 500, 778, 667, 944, 722, 778, // '@'..'O'
    611, 778, 722, 556, 667, 722, 722, 1000, 722, 722, 667, 333, 278, 333, 581, 500, // 'P'..'_'
    333, 500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556, 278, 833, 556, 500, // '`'..'o'
    556, 556, 444, 389, 333, 556, 500, 722, 500, 500, 444, 394, 220, 394, 520, // 'p'..'~'
];

/// The two faces the PDF uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontFace {
    /// Times-Roman.
    Regular,
    /// Times-Bold.
    Bold,
}

impl FontFace {
    fn widths(self) -> &'static [u16; 95] {
        match self {
            Self::Regular => &TIMES_ROMAN,
            Self::Bold => &TIMES_BOLD,
        }
    }

    /// Advance width of one character, in 1/1000 em.
    #[must_use]
    pub fn char_width(self, c: char) -> u16 {
        let code = c as u32;
        if (32..=126).contains(&code) {
            self.widths()[(code - 32) as usize]
        } else {
            FALLBACK_WIDTH
        }
    }
}

/// Fold `text` into printable ASCII for the built-in Times faces.
///
/// Typographic quotes and dashes, the ellipsis and no-break space map to their
/// ASCII forms, and Latin-1 letters lose their accents. Newlines are kept, tabs
/// become spaces and other control characters are dropped. Anything else the
/// fonts cannot encode becomes `?`. ASCII input is returned unchanged.
#[must_use]
pub fn fold_to_ascii(text: &str) -> Cow<'_, str> {
    if text
        .chars()
        .all(|c| c == '\n' || (' '..='~').contains(&c))
    {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\n' | ' '..='~' => out.push(c),
            '\t' | '\u{a0}' => out.push(' '),
            c if c.is_control() => {}
            '\u{2018}' | '\u{2019}' | '\u{201a}' | '\u{2032}' => out.push('\''),
            '\u{201c}' | '\u{201d}' | '\u{201e}' | '\u{2033}' => out.push('"'),
            '\u{2010}'..='\u{2015}' | '\u{2212}' => out.push('-'),
            '\u{2026}' => out.push_str("..."),
            '\u{2022}' | '\u{b7}' => out.push('*'),
            'À'..='Å' => out.push('A'),
            'Æ' => out.push_str("AE"),
            'Ç' => out.push('C'),
            'È'..='Ë' => out.push('E'),
            'Ì'..='Ï' => out.push('I'),
            'Ð' => out.push('D'),
            'Ñ' => out.push('N'),
            'Ò'..='Ö' | 'Ø' => out.push('O'),
            '×' => out.push('x'),
            'Ù'..='Ü' => out.push('U'),
            'Ý' => out.push('Y'),
            'Þ' => out.push_str("Th"),
            'ß' => out.push_str("ss"),
            'à'..='å' => out.push('a'),
            'æ' => out.push_str("ae"),
            'ç' => out.push('c'),
            'è'..='ë' => out.push('e'),
            'ì'..='ï' => out.push('i'),
            'ð' => out.push('d'),
            'ñ' => out.push('n'),
            'ò'..='ö' | 'ø' => out.push('o'),
            '÷' => out.push('/'),
            'ù'..='ü' => out.push('u'),
            'ý' | 'ÿ' => out.push('y'),
            'þ' => out.push_str("th"),
            _ => out.push('?'),
        }
    }
    Cow::Owned(out)
}

/// Width of `text` in millimetres at `size_pt`.
#[must_use]
pub fn text_width_mm(text: &str, face: FontFace, size_pt: f32) -> f32 {
    let units: u32 = text.chars().map(|c| u32::from(face.char_width(c))).sum();
    #[allow(clippy::cast_precision_loss)]
    let em = units as f32 / 1000.0;
    em * size_pt / PT_PER_MM
}

/// Break `text` into lines no wider than `max_width_mm`.
///
/// Words are separated on spaces; a word wider than the limit on its own is
/// split between characters. Explicit newlines always break. The result is
/// never truncated; callers cap the line count themselves.
#[must_use]
pub fn wrap_text(text: &str, face: FontFace, size_pt: f32, max_width_mm: f32) -> Vec<String> {
    let fits = |s: &str| text_width_mm(s, face, size_pt) <= max_width_mm;
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split(' ').filter(|w| !w.is_empty()) {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if fits(&candidate) {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if fits(word) {
                current = word.to_string();
            } else {
                // Hard-break an over-long word (typically a URL).
                for c in word.chars() {
                    current.push(c);
                    if !fits(&current) && current.chars().count() > 1 {
                        current.pop();
                        lines.push(std::mem::take(&mut current));
                        current.push(c);
                    }
                }
            }
        }
        if !current.is_empty() || lines.is_empty() {
            lines.push(current);
        }
    }

    lines
}
