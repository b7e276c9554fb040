//! 矢量文字绘制（Helvetica-Bold）

use super::fit::{fit_font_size, TextMeasure};
use super::metrics::{encode_win_ansi, HelveticaBold};
use super::PageBox;
use lopdf::content::Operation;
use lopdf::{Object, StringFormat};
use std::f32::consts::FRAC_1_SQRT_2;

const HEADER_START: f32 = 24.0;
const HEADER_FLOOR: f32 = 12.0;
const HEADER_STEP: f32 = 2.0;
/// 标题基线到页面顶边的距离
const HEADER_TOP_OFFSET: f32 = 35.0;

const STAMP_MAX: f32 = 180.0;
const STAMP_FLOOR: f32 = 30.0;
const STAMP_STEP: f32 = 5.0;
const STAMP_GRAY: f32 = 0.45;

/// 文字最大宽度占页宽的比例
const MAX_WIDTH_RATIO: f32 = 0.8;

/// 标题字号
pub fn header_font_size(text: &str, page_width: f32) -> f32 {
    fit_font_size(
        &HelveticaBold,
        text,
        HEADER_START,
        HEADER_FLOOR,
        HEADER_STEP,
        page_width * MAX_WIDTH_RATIO,
    )
}

/// 斜向水印字号：起始值随文字长度变化
pub fn stamp_font_size(text: &str, page_width: f32) -> f32 {
    let len = text.chars().count().max(1) as f32;
    let start = (page_width / len * 2.0).min(STAMP_MAX);
    fit_font_size(
        &HelveticaBold,
        text,
        start,
        STAMP_FLOOR,
        STAMP_STEP,
        page_width * MAX_WIDTH_RATIO,
    )
}

fn show_text(text: &str) -> Operation {
    Operation::new(
        "Tj",
        vec![Object::String(encode_win_ansi(text), StringFormat::Hexadecimal)],
    )
}

/// 顶部居中标题，黑色
///
/// # 参数
/// - `text`: 标题
/// - `page`: 页面尺寸
/// - `font`: 页面资源中的字体名
pub fn header_ops(text: &str, page: &PageBox, font: &str) -> Vec<Operation> {
    let size = header_font_size(text, page.width);
    let width = HelveticaBold.width(text, size);
    let x = page.x0 + (page.width - width) / 2.0;
    let y = page.y0 + page.height - HEADER_TOP_OFFSET;

    vec![
        Operation::new("q", vec![]),
        Operation::new("rg", vec![0.into(), 0.into(), 0.into()]),
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![font.into(), size.into()]),
        Operation::new("Td", vec![x.into(), y.into()]),
        show_text(text),
        Operation::new("ET", vec![]),
        Operation::new("Q", vec![]),
    ]
}

/// 绕页面中心旋转 45° 的灰色半透明水印
///
/// # 参数
/// - `gstate`: 页面资源中设置了透明度的 ExtGState 名
pub fn stamp_ops(text: &str, page: &PageBox, font: &str, gstate: &str) -> Vec<Operation> {
    let size = stamp_font_size(text, page.width);
    let width = HelveticaBold.width(text, size);
    let (cx, cy) = page.center();

    vec![
        Operation::new("q", vec![]),
        Operation::new("gs", vec![gstate.into()]),
        Operation::new(
            "cm",
            vec![1.into(), 0.into(), 0.into(), 1.into(), cx.into(), cy.into()],
        ),
        Operation::new(
            "cm",
            vec![
                FRAC_1_SQRT_2.into(),
                FRAC_1_SQRT_2.into(),
                (-FRAC_1_SQRT_2).into(),
                FRAC_1_SQRT_2.into(),
                0.into(),
                0.into(),
            ],
        ),
        Operation::new("rg", vec![STAMP_GRAY.into(), STAMP_GRAY.into(), STAMP_GRAY.into()]),
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![font.into(), size.into()]),
        Operation::new("Td", vec![(-width / 2.0).into(), (-size / 2.0).into()]),
        show_text(text),
        Operation::new("ET", vec![]),
        Operation::new("Q", vec![]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    const A4: PageBox = PageBox {
        x0: 0.0,
        y0: 0.0,
        width: 595.0,
        height: 842.0,
    };

    #[test]
    fn test_short_header_keeps_start_size() {
        assert_eq!(header_font_size("Algebra Chapter 1", A4.width), 24.0);
    }

    #[test]
    fn test_overflowing_header_clamps_to_floor() {
        let title = "Extremely Long Chapter Title ".repeat(40);
        assert_eq!(header_font_size(&title, A4.width), 12.0);
    }

    #[test]
    fn test_stamp_size_start_is_capped() {
        // 短文字：595 / 3 × 2 ≈ 396 → 上限 180，再收缩到页宽 80% 以内
        let size = stamp_font_size("ABC", A4.width);
        assert!(size <= 180.0);
        assert!(HelveticaBold.width("ABC", size) <= A4.width * 0.8);
    }

    #[test]
    fn test_header_is_centered_below_top() {
        let ops = header_ops("Algebra", &A4, "WmF1");
        let td = ops.iter().find(|op| op.operator == "Td").unwrap();
        let x = td.operands[0].as_float().unwrap();
        let y = td.operands[1].as_float().unwrap();
        let width = HelveticaBold.width("Algebra", 24.0);
        assert!((x - (595.0 - width) / 2.0).abs() < 1e-3);
        assert_eq!(y, 842.0 - 35.0);
    }

    #[test]
    fn test_stamp_is_balanced_and_translucent() {
        let ops = stamp_ops("Shivaji Vidyalaya Pune", &A4, "WmF1", "WmGS1");
        assert_eq!(ops.first().unwrap().operator, "q");
        assert_eq!(ops.last().unwrap().operator, "Q");
        assert!(ops.iter().any(|op| op.operator == "gs"));
    }
}
