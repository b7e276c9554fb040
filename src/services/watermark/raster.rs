//! 光栅文字绘制
//!
//! 标准字体无法表示的文字（天城文等）先用 rustybuzz 整形、tiny-skia 画到画布上，
//! 再以图片 XObject（RGB + SMask）嵌入页面。

use super::fit::{fit_font_size, TextMeasure};
use super::PageBox;
use crate::error::{AppError, AppResult};
use lopdf::content::Operation;
use lopdf::{dictionary, Object, Stream};
use rustybuzz::UnicodeBuffer;
use std::f32::consts::FRAC_1_SQRT_2;
use std::path::Path;
use std::sync::Arc;
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Transform};
use tracing::{debug, warn};

/// 按名称优先查找的光栅字体族
pub const DEVANAGARI_FAMILIES: &[&str] = &[
    "Noto Sans Devanagari",
    "Noto Serif Devanagari",
    "Lohit Devanagari",
    "Mangal",
];

/// 判定系统字体能否绘制天城文时抽查的字符
const COVERAGE_SAMPLE: &str = "कखगअआइ िीु्ं";

const HEADER_CHAR_WIDTH: u32 = 25;
const HEADER_MIN_WIDTH: u32 = 800;
const HEADER_MAX_WIDTH: u32 = 1400;
const HEADER_HEIGHT: u32 = 100;
const HEADER_START: f32 = 42.0;
const HEADER_FLOOR: f32 = 16.0;
const HEADER_STEP: f32 = 2.0;
/// 标题图片底边到页面顶边的距离
const HEADER_TOP_OFFSET: f32 = 45.0;
const HEADER_MAX_SCALE: f32 = 0.5;

const STAMP_WIDTH: u32 = 2000;
const STAMP_HEIGHT: u32 = 600;
const STAMP_START: f32 = 200.0;
const STAMP_FLOOR: f32 = 40.0;
const STAMP_STEP: f32 = 5.0;
const STAMP_RGBA: [u8; 4] = [120, 120, 120, 89];

/// 文字最大宽度占画布宽度的比例
const CANVAS_FILL_RATIO: f32 = 0.9;
const PAGE_FILL_RATIO: f32 = 0.8;

/// 光栅化使用的字体
#[derive(Clone)]
pub struct RasterFont {
    data: Arc<Vec<u8>>,
    index: u32,
}

impl std::fmt::Debug for RasterFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterFont")
            .field("bytes", &self.data.len())
            .field("index", &self.index)
            .finish()
    }
}

impl RasterFont {
    /// 从字体数据创建，数据无法解析时返回 `None`
    pub fn from_bytes(data: Vec<u8>, index: u32) -> Option<Self> {
        ttf_parser::Face::parse(&data, index).ok()?;
        Some(Self {
            data: Arc::new(data),
            index,
        })
    }

    /// 从字体文件加载
    pub fn from_path(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| AppError::file(path.display().to_string(), e))?;
        Self::from_bytes(data, 0)
            .ok_or_else(|| AppError::Other(format!("无法解析字体文件: {}", path.display())))
    }

    /// 在系统字体中查找
    ///
    /// 先按名称查找常见天城文字体（粗体优先），找不到再扫描全部系统字体，
    /// 只接受能覆盖天城文的字体。
    pub fn discover() -> Option<Self> {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();

        let families: Vec<fontdb::Family<'_>> = DEVANAGARI_FAMILIES
            .iter()
            .map(|name| fontdb::Family::Name(name))
            .collect();
        let query = fontdb::Query {
            families: &families,
            weight: fontdb::Weight::BOLD,
            stretch: fontdb::Stretch::Normal,
            style: fontdb::Style::Normal,
        };
        let named = db.query(&query);
        let candidates = named.into_iter().chain(db.faces().map(|face| face.id));

        for id in candidates {
            let loaded = db
                .with_face_data(id, |data, index| {
                    let face = ttf_parser::Face::parse(data, index).ok()?;
                    covers_all(&face, COVERAGE_SAMPLE).then(|| (data.to_vec(), index))
                })
                .flatten();
            let Some((data, index)) = loaded else {
                continue;
            };
            if let Some(face) = db.face(id) {
                debug!("光栅字体: {:?} ({})", face.families, face.post_script_name);
            }
            if let Some(font) = Self::from_bytes(data, index) {
                return Some(font);
            }
        }
        None
    }

    /// 按配置加载：优先使用指定路径，否则在系统字体中查找
    pub fn load(font_path: Option<&str>, load_system_fonts: bool) -> Option<Self> {
        if let Some(path) = font_path.filter(|p| !p.trim().is_empty()) {
            match Self::from_path(path) {
                Ok(font) => return Some(font),
                Err(e) => warn!("⚠️  指定的光栅字体不可用: {}", e),
            }
        }
        if load_system_fonts {
            let found = Self::discover();
            if found.is_none() {
                warn!("⚠️  系统中没有可用的光栅字体");
            }
            return found;
        }
        None
    }

    fn face(&self) -> Option<rustybuzz::Face<'_>> {
        rustybuzz::Face::from_slice(&self.data, self.index)
    }

    /// 字体中没有字形的字符（去重，按出现顺序；空白和零宽连接符不计）
    pub fn missing_glyphs(&self, text: &str) -> Vec<char> {
        let face = ttf_parser::Face::parse(&self.data, self.index).ok();
        let mut missing = Vec::new();
        for c in text.chars().filter(|c| needs_glyph(*c)) {
            let found = face.as_ref().and_then(|face| face.glyph_index(c)).is_some();
            if !found && !missing.contains(&c) {
                missing.push(c);
            }
        }
        missing
    }

    /// 能否完整绘制这段文字
    pub fn covers(&self, text: &str) -> bool {
        self.missing_glyphs(text).is_empty()
    }
}

fn needs_glyph(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '\u{200C}' | '\u{200D}')
}

fn covers_all(face: &ttf_parser::Face<'_>, text: &str) -> bool {
    text.chars()
        .filter(|c| needs_glyph(*c))
        .all(|c| face.glyph_index(c).is_some())
}

/// 整形后的单个字形（单位：像素）
struct PlacedGlyph {
    id: u16,
    x: f32,
    y: f32,
}

struct ShapedLine {
    glyphs: Vec<PlacedGlyph>,
    width: f32,
}

fn shape(face: &rustybuzz::Face<'_>, text: &str, size: f32) -> ShapedLine {
    let scale = size / face.units_per_em() as f32;
    let mut buffer = UnicodeBuffer::new();
    buffer.push_str(text);
    buffer.guess_segment_properties();

    let glyph_buffer = rustybuzz::shape(face, &[], buffer);
    let mut pen = 0.0;
    let mut glyphs = Vec::with_capacity(glyph_buffer.len());
    for (info, pos) in glyph_buffer
        .glyph_infos()
        .iter()
        .zip(glyph_buffer.glyph_positions())
    {
        glyphs.push(PlacedGlyph {
            id: info.glyph_id as u16,
            x: pen + pos.x_offset as f32 * scale,
            y: pos.y_offset as f32 * scale,
        });
        pen += pos.x_advance as f32 * scale;
    }
    ShapedLine { glyphs, width: pen }
}

impl TextMeasure for RasterFont {
    fn width(&self, text: &str, size: f32) -> f32 {
        match self.face() {
            Some(face) => shape(&face, text, size).width,
            None => 0.0,
        }
    }
}

/// 把字形轮廓转换到画布坐标（y 轴向下）
struct OutlineSink {
    builder: PathBuilder,
    origin_x: f32,
    baseline: f32,
    scale: f32,
}

impl OutlineSink {
    fn pt(&self, x: f32, y: f32) -> (f32, f32) {
        (self.origin_x + x * self.scale, self.baseline - y * self.scale)
    }
}

impl ttf_parser::OutlineBuilder for OutlineSink {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.pt(x, y);
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.pt(x, y);
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (x1, y1) = self.pt(x1, y1);
        let (x, y) = self.pt(x, y);
        self.builder.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (x1, y1) = self.pt(x1, y1);
        let (x2, y2) = self.pt(x2, y2);
        let (x, y) = self.pt(x, y);
        self.builder.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

/// 画好文字的画布
#[derive(Debug, Clone)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
    /// RGB，每像素 3 字节
    pub rgb: Vec<u8>,
    /// 透明度，每像素 1 字节
    pub alpha: Vec<u8>,
    /// 最终使用的字号（像素）
    pub font_size: f32,
}

impl Canvas {
    /// 转成图片 XObject：RGB 主图 + 灰度 SMask
    ///
    /// # 返回
    /// (主图, 蒙版)；主图的 `SMask` 需要调用方填入蒙版对象引用
    pub fn to_streams(&self) -> (Stream, Stream) {
        let mut mask = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => self.width as i64,
                "Height" => self.height as i64,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            self.alpha.clone(),
        );
        let mut image = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => self.width as i64,
                "Height" => self.height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            self.rgb.clone(),
        );
        let _ = mask.compress();
        let _ = image.compress();
        (image, mask)
    }
}

/// 在透明画布中央画一行文字
fn draw_centered(
    font: &RasterFont,
    text: &str,
    width: u32,
    height: u32,
    size: f32,
    rgba: [u8; 4],
) -> Option<Canvas> {
    let face = font.face()?;
    let line = shape(&face, text, size);
    let scale = size / face.units_per_em() as f32;

    // 近似 textBaseline = middle：让 ascender / descender 的中点落在画布中线
    let ascender = face.ascender() as f32 * scale;
    let descender = face.descender() as f32 * scale;
    let baseline = height as f32 / 2.0 + (ascender + descender) / 2.0;
    let left = (width as f32 - line.width) / 2.0;

    let mut sink = OutlineSink {
        builder: PathBuilder::new(),
        origin_x: 0.0,
        baseline: 0.0,
        scale,
    };
    for glyph in &line.glyphs {
        sink.origin_x = left + glyph.x;
        sink.baseline = baseline - glyph.y;
        face.outline_glyph(ttf_parser::GlyphId(glyph.id), &mut sink);
    }

    let mut pixmap = Pixmap::new(width, height)?;
    if let Some(path) = sink.builder.finish() {
        let mut paint = Paint::default();
        paint.set_color_rgba8(rgba[0], rgba[1], rgba[2], rgba[3]);
        paint.anti_alias = true;
        pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
    }

    let pixel_count = (width * height) as usize;
    let mut rgb = Vec::with_capacity(pixel_count * 3);
    let mut alpha = Vec::with_capacity(pixel_count);
    for pixel in pixmap.pixels() {
        let color = pixel.demultiply();
        rgb.extend_from_slice(&[color.red(), color.green(), color.blue()]);
        alpha.push(color.alpha());
    }

    Some(Canvas {
        width,
        height,
        rgb,
        alpha,
        font_size: size,
    })
}

/// 标题画布宽度：随文字长度变化，限制在 800..=1400
pub fn header_canvas_width(text: &str) -> u32 {
    (text.chars().count() as u32)
        .saturating_mul(HEADER_CHAR_WIDTH)
        .clamp(HEADER_MIN_WIDTH, HEADER_MAX_WIDTH)
}

/// 画标题
pub fn render_header(font: &RasterFont, text: &str) -> Option<Canvas> {
    let width = header_canvas_width(text);
    let size = fit_font_size(
        font,
        text,
        HEADER_START,
        HEADER_FLOOR,
        HEADER_STEP,
        width as f32 * CANVAS_FILL_RATIO,
    );
    draw_centered(font, text, width, HEADER_HEIGHT, size, [0, 0, 0, 255])
}

/// 画斜向水印（尚未旋转）
pub fn render_stamp(font: &RasterFont, text: &str) -> Option<Canvas> {
    let size = fit_font_size(
        font,
        text,
        STAMP_START,
        STAMP_FLOOR,
        STAMP_STEP,
        STAMP_WIDTH as f32 * CANVAS_FILL_RATIO,
    );
    draw_centered(font, text, STAMP_WIDTH, STAMP_HEIGHT, size, STAMP_RGBA)
}

/// 标题图片的放置：缩放到不超过页宽 80% 且不超过原尺寸一半，水平居中
pub fn header_image_ops(canvas: &Canvas, page: &PageBox, name: &str) -> Vec<Operation> {
    let scale = (page.width * PAGE_FILL_RATIO / canvas.width as f32).min(HEADER_MAX_SCALE);
    let w = canvas.width as f32 * scale;
    let h = canvas.height as f32 * scale;
    let x = page.x0 + (page.width - w) / 2.0;
    let y = page.y0 + page.height - HEADER_TOP_OFFSET;

    vec![
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![w.into(), 0.into(), 0.into(), h.into(), x.into(), y.into()],
        ),
        Operation::new("Do", vec![name.into()]),
        Operation::new("Q", vec![]),
    ]
}

/// 水印图片的放置：平移到页面中心、旋转 45°、按原尺寸居中绘制
pub fn stamp_image_ops(canvas: &Canvas, page: &PageBox, name: &str) -> Vec<Operation> {
    let (cx, cy) = page.center();
    let w = canvas.width as f32;
    let h = canvas.height as f32;

    vec![
        Operation::new("q", vec![]),
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
        Operation::new(
            "cm",
            vec![
                w.into(),
                0.into(),
                0.into(),
                h.into(),
                (-w / 2.0).into(),
                (-h / 2.0).into(),
            ],
        ),
        Operation::new("Do", vec![name.into()]),
        Operation::new("Q", vec![]),
    ]
}

/// 把画布嵌入文档，返回主图对象 id
pub fn embed_canvas(doc: &mut lopdf::Document, canvas: &Canvas) -> lopdf::ObjectId {
    let (mut image, mask) = canvas.to_streams();
    let mask_id = doc.add_object(Object::Stream(mask));
    image.dict.set("SMask", Object::Reference(mask_id));
    doc.add_object(Object::Stream(image))
}
