//! Rendered-width measurement for the font the text is drawn with.
use crate::error::{FillError, Result};

/// Measures how wide a string renders, in page units.
pub trait TextMeasure: Send + Sync {
    /// PDF base font name the widths belong to.
    fn base_font(&self) -> &str;

    fn text_width(&self, text: &str, size: f32) -> Result<f32>;
}

/// Advance widths of the standard Helvetica face, in 1/1000 em, for
/// printable ASCII starting at the space character.
const ASCII_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p'..'~'
];

/// Helvetica widths for WinAnsi codes 0xA0..=0xFF (Latin-1 supplement).
const LATIN1_WIDTHS: [u16; 96] = [
    278, 333, 556, 556, 556, 556, 260, 556, 333, 737, 370, 556, 584, 333, 737, 333, //
    400, 584, 333, 333, 333, 556, 537, 278, 333, 333, 365, 556, 834, 834, 834, 611, //
    667, 667, 667, 667, 667, 667, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278, //
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611, //
    556, 556, 556, 556, 556, 556, 889, 500, 556, 556, 556, 556, 278, 278, 278, 278, //
    556, 556, 556, 556, 556, 556, 556, 584, 611, 556, 556, 556, 556, 500, 556, 500, //
];

/// Characters WinAnsi places in 0x80..=0x9F, with their code and width.
const WIN_ANSI_EXTRAS: [(char, u8, u16); 27] = [
    ('€', 0x80, 556),
    ('‚', 0x82, 222),
    ('ƒ', 0x83, 556),
    ('„', 0x84, 333),
    ('…', 0x85, 1000),
    ('†', 0x86, 556),
    ('‡', 0x87, 556),
    ('ˆ', 0x88, 333),
    ('‰', 0x89, 1000),
    ('Š', 0x8A, 667),
    ('‹', 0x8B, 333),
    ('Œ', 0x8C, 1000),
    ('Ž', 0x8E, 611),
    ('‘', 0x91, 222),
    ('’', 0x92, 222),
    ('“', 0x93, 333),
    ('”', 0x94, 333),
    ('•', 0x95, 350),
    ('–', 0x96, 556),
    ('—', 0x97, 1000),
    ('˜', 0x98, 333),
    ('™', 0x99, 1000),
    ('š', 0x9A, 500),
    ('›', 0x9B, 333),
    ('œ', 0x9C, 944),
    ('ž', 0x9E, 500),
    ('Ÿ', 0x9F, 667),
];

/// The standard Helvetica Type1 font with WinAnsi encoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct Helvetica;

impl Helvetica {
    fn glyph(ch: char) -> Option<(u8, u16)> {
        let code = ch as u32;
        match code {
            0x20..=0x7E => Some((code as u8, ASCII_WIDTHS[(code - 0x20) as usize])),
            0xA0..=0xFF => Some((code as u8, LATIN1_WIDTHS[(code - 0xA0) as usize])),
            _ => WIN_ANSI_EXTRAS
                .iter()
                .find(|(c, _, _)| *c == ch)
                .map(|&(_, byte, width)| (byte, width)),
        }
    }

    /// Encodes text as WinAnsi bytes for a `Tj` operand.
    pub fn encode(text: &str) -> Result<Vec<u8>> {
        text.chars()
            .map(|ch| {
                Self::glyph(ch).map(|(byte, _)| byte).ok_or_else(|| {
                    FillError::Measurement(format!(
                        "Helvetica (WinAnsi) cannot encode {:?} (U+{:04X})",
                        ch, ch as u32
                    ))
                })
            })
            .collect()
    }
}

impl TextMeasure for Helvetica {
    fn base_font(&self) -> &str {
        "Helvetica"
    }

    fn text_width(&self, text: &str, size: f32) -> Result<f32> {
        let mut units = 0u32;
        for ch in text.chars() {
            let (_, width) = Self::glyph(ch).ok_or_else(|| {
                FillError::Measurement(format!(
                    "no Helvetica width for {:?} (U+{:04X})",
                    ch, ch as u32
                ))
            })?;
            units += width as u32;
        }
        Ok(units as f32 * size / 1000.0)
    }
}
