//! Helvetica-Bold 字宽与 WinAnsi 编码
//!
//! 标准 14 字体不嵌入 PDF，字宽来自 AFM（千分之一 em）。

use super::fit::TextMeasure;
use phf::phf_map;

/// PDF 中引用的字体名
pub const BASE_FONT: &str = "Helvetica-Bold";

/// 无法编码时的替代字符
const REPLACEMENT: u8 = b'?';

/// 0x80..=0x9F 区段：Unicode → WinAnsi
static WIN_ANSI_SPECIALS: phf::Map<char, u8> = phf_map! {
    '\u{20AC}' => 0x80, '\u{201A}' => 0x82, '\u{0192}' => 0x83, '\u{201E}' => 0x84,
    '\u{2026}' => 0x85, '\u{2020}' => 0x86, '\u{2021}' => 0x87, '\u{02C6}' => 0x88,
    '\u{2030}' => 0x89, '\u{0160}' => 0x8A, '\u{2039}' => 0x8B, '\u{0152}' => 0x8C,
    '\u{017D}' => 0x8E, '\u{2018}' => 0x91, '\u{2019}' => 0x92, '\u{201C}' => 0x93,
    '\u{201D}' => 0x94, '\u{2022}' => 0x95, '\u{2013}' => 0x96, '\u{2014}' => 0x97,
    '\u{02DC}' => 0x98, '\u{2122}' => 0x99, '\u{0161}' => 0x9A, '\u{203A}' => 0x9B,
    '\u{0153}' => 0x9C, '\u{017E}' => 0x9E, '\u{0178}' => 0x9F,
};

/// 0x20..=0xFF 的字宽，未定义的位置为 0
#[rustfmt::skip]
static WIDTHS: [u16; 224] = [
    // 0x20
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    // 0x30
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    // 0x40
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    // 0x50
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    // 0x60
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    // 0x70
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, 0,
    // 0x80
    556, 0, 278, 556, 500, 1000, 556, 556, 333, 1000, 667, 333, 1000, 0, 611, 0,
    // 0x90
    0, 278, 278, 500, 500, 350, 556, 1000, 333, 1000, 556, 333, 944, 0, 500, 667,
    // 0xA0
    278, 333, 556, 556, 556, 556, 280, 556, 333, 737, 370, 556, 584, 333, 737, 333,
    // 0xB0
    400, 584, 333, 333, 333, 611, 556, 278, 333, 333, 365, 556, 834, 834, 834, 611,
    // 0xC0
    722, 722, 722, 722, 722, 722, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278,
    // 0xD0
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611,
    // 0xE0
    556, 556, 556, 556, 556, 556, 889, 556, 556, 556, 556, 556, 278, 278, 278, 278,
    // 0xF0
    611, 611, 611, 611, 611, 611, 611, 584, 611, 611, 611, 611, 611, 556, 611, 556,
];

/// 单个字符的 WinAnsi 编码；无法表示时为 `None`
pub fn win_ansi_byte(c: char) -> Option<u8> {
    match c {
        '\t' | '\n' | '\r' => Some(b' '),
        ' '..='~' => Some(c as u8),
        '\u{00A0}'..='\u{00FF}' => Some(c as u32 as u8),
        _ => WIN_ANSI_SPECIALS.get(&c).copied(),
    }
}

/// 编码整段文字，无法表示的字符替换为 `?`
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| win_ansi_byte(c).unwrap_or(REPLACEMENT))
        .collect()
}

fn glyph_width(byte: u8) -> u16 {
    if byte < 0x20 {
        return 0;
    }
    WIDTHS[(byte - 0x20) as usize]
}

/// Helvetica-Bold 字宽测量
#[derive(Debug, Clone, Copy, Default)]
pub struct HelveticaBold;

impl TextMeasure for HelveticaBold {
    fn width(&self, text: &str, size: f32) -> f32 {
        let units: u32 = encode_win_ansi(text)
            .into_iter()
            .map(|b| glyph_width(b) as u32)
            .sum();
        units as f32 * size / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_win_ansi() {
        assert_eq!(encode_win_ansi("Aé€"), vec![b'A', 0xE9, 0x80]);
        assert_eq!(encode_win_ansi("a\tb"), b"a b".to_vec());
        assert_eq!(encode_win_ansi("क"), b"?".to_vec());
    }

    #[test]
    fn test_helvetica_bold_widths() {
        // H=722 e=556 l=278 l=278 o=611
        let width = HelveticaBold.width("Hello", 10.0);
        assert!((width - 24.45).abs() < 1e-4);
        assert_eq!(HelveticaBold.width("", 24.0), 0.0);
        assert_eq!(HelveticaBold.width("W", 1000.0), 944.0);
    }
}
