//! 盖章服务 - 业务能力层
//!
//! 只负责"给一份 PDF 的每一页加标题和斜向水印"能力：
//! - 标准字体能表示的文字走矢量绘制
//! - 其余文字光栅化后以图片嵌入
//! - 文字过长只会缩到最小字号，不会报错
//! - 只有源文档无法解析才是致命错误

use super::raster::{self, Canvas, RasterFont};
use super::script::{classify_script, ScriptClass};
use super::vector;
use super::PageBox;
use crate::config::Config;
use crate::error::{AppError, AppResult, DocumentError};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use tracing::{debug, warn};

const FONT_NAME: &str = "WmF1";
const GSTATE_NAME: &str = "WmGS1";
const HEADER_IMAGE_NAME: &str = "WmHdr";
const STAMP_IMAGE_NAME: &str = "WmStamp";
const STAMP_OPACITY: f32 = 0.35;

/// 页面树继承链的最大深度
const MAX_TREE_DEPTH: usize = 32;

/// 一次盖章任务
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatermarkJob {
    /// 源文档位置（只用于错误信息）
    pub source_ref: String,
    /// 标题（章节标题）
    pub header_text: String,
    /// 水印（学校名称）
    pub stamp_text: String,
}

impl WatermarkJob {
    pub fn new(
        source_ref: impl Into<String>,
        header_text: impl Into<String>,
        stamp_text: impl Into<String>,
    ) -> Self {
        Self {
            source_ref: source_ref.into(),
            header_text: header_text.into(),
            stamp_text: stamp_text.into(),
        }
    }

    pub fn header_script(&self) -> ScriptClass {
        classify_script(&self.header_text)
    }

    pub fn stamp_script(&self) -> ScriptClass {
        classify_script(&self.stamp_text)
    }
}

/// 本次文档共享的资源对象
#[derive(Default)]
struct SharedResources {
    font: Option<ObjectId>,
    gstate: Option<ObjectId>,
    header_image: Option<(ObjectId, Canvas)>,
    stamp_image: Option<(ObjectId, Canvas)>,
    save: Option<ObjectId>,
    restore: Option<ObjectId>,
}

/// 盖章服务
///
/// 职责：
/// - 解析源文档
/// - 每一页叠加同样的标题和水印
/// - 序列化为新的字节，不修改输入
#[derive(Debug, Clone, Default)]
pub struct WatermarkRenderer {
    raster_font: Option<RasterFont>,
}

impl WatermarkRenderer {
    pub fn new(raster_font: Option<RasterFont>) -> Self {
        Self { raster_font }
    }

    /// 按配置加载光栅字体
    pub fn from_config(config: &Config) -> Self {
        Self::new(RasterFont::load(
            config.devanagari_font_path.as_deref(),
            config.load_system_fonts,
        ))
    }

    pub fn has_raster_font(&self) -> bool {
        self.raster_font.is_some()
    }

    /// 盖章
    ///
    /// # 参数
    /// - `source`: 源 PDF 字节
    /// - `header_text`: 标题
    /// - `stamp_text`: 水印文字
    ///
    /// # 返回
    /// 新的 PDF 字节
    pub fn stamp(&self, source: &[u8], header_text: &str, stamp_text: &str) -> AppResult<Vec<u8>> {
        self.stamp_job(source, &WatermarkJob::new("<memory>", header_text, stamp_text))
    }

    /// 按任务盖章
    pub fn stamp_job(&self, source: &[u8], job: &WatermarkJob) -> AppResult<Vec<u8>> {
        let mut doc = Document::load_mem(source)
            .map_err(|e| AppError::document_load_failed(&job.source_ref, e.to_string()))?;

        let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
        debug!(
            "盖章: {} 页 | 标题 {:?} | 水印 {:?}",
            pages.len(),
            job.header_script(),
            job.stamp_script()
        );

        let shared = self.prepare_resources(&mut doc, job);
        for page_id in pages {
            self.stamp_page(&mut doc, page_id, job, &shared)?;
        }

        let mut out = Vec::with_capacity(source.len());
        doc.save_to(&mut out)
            .map_err(|e| DocumentError::SaveFailed(e.to_string()))?;
        Ok(out)
    }

    fn rasterize(
        &self,
        text: &str,
        what: &str,
        render: fn(&RasterFont, &str) -> Option<Canvas>,
    ) -> Option<Canvas> {
        let Some(font) = &self.raster_font else {
            warn!("⚠️  没有可用的光栅字体，跳过{}: {}", what, text);
            return None;
        };
        let missing = font.missing_glyphs(text);
        if !missing.is_empty() {
            let sample: String = missing.iter().take(8).collect();
            warn!("⚠️  光栅字体缺少字形 \"{}\"，跳过{}: {}", sample, what, text);
            return None;
        }
        let canvas = render(font, text);
        if canvas.is_none() {
            warn!("⚠️  {}光栅化失败，跳过: {}", what, text);
        }
        canvas
    }

    fn prepare_resources(&self, doc: &mut Document, job: &WatermarkJob) -> SharedResources {
        let mut shared = SharedResources::default();
        let header_vector = !job.header_script().needs_rasterization();
        let stamp_vector = !job.stamp_script().needs_rasterization();
        let has_header = !job.header_text.trim().is_empty();
        let has_stamp = !job.stamp_text.trim().is_empty();

        if (has_header && header_vector) || (has_stamp && stamp_vector) {
            shared.font = Some(doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => super::metrics::BASE_FONT,
                "Encoding" => "WinAnsiEncoding",
            }));
        }
        if has_stamp && stamp_vector {
            shared.gstate = Some(doc.add_object(dictionary! {
                "Type" => "ExtGState",
                "ca" => STAMP_OPACITY,
                "CA" => STAMP_OPACITY,
            }));
        }
        if has_header && !header_vector {
            shared.header_image = self
                .rasterize(&job.header_text, "标题", raster::render_header)
                .map(|canvas| (raster::embed_canvas(doc, &canvas), canvas));
        }
        if has_stamp && !stamp_vector {
            shared.stamp_image = self
                .rasterize(&job.stamp_text, "水印", raster::render_stamp)
                .map(|canvas| (raster::embed_canvas(doc, &canvas), canvas));
        }

        shared.save = Some(doc.add_object(Stream::new(dictionary! {}, b"q\n".to_vec())));
        shared.restore = Some(doc.add_object(Stream::new(dictionary! {}, b"\nQ\n".to_vec())));
        shared
    }

    fn stamp_page(
        &self,
        doc: &mut Document,
        page_id: ObjectId,
        job: &WatermarkJob,
        shared: &SharedResources,
    ) -> AppResult<()> {
        let page = page_box(doc, page_id);
        let mut operations: Vec<Operation> = Vec::new();
        let mut fonts: Vec<(&str, ObjectId)> = Vec::new();
        let mut gstates: Vec<(&str, ObjectId)> = Vec::new();
        let mut xobjects: Vec<(&str, ObjectId)> = Vec::new();

        if !job.header_text.trim().is_empty() {
            if let Some((id, canvas)) = &shared.header_image {
                operations.extend(raster::header_image_ops(canvas, &page, HEADER_IMAGE_NAME));
                xobjects.push((HEADER_IMAGE_NAME, *id));
            } else if !job.header_script().needs_rasterization() {
                if let Some(font) = shared.font {
                    operations.extend(vector::header_ops(&job.header_text, &page, FONT_NAME));
                    fonts.push((FONT_NAME, font));
                }
            }
        }

        if !job.stamp_text.trim().is_empty() {
            if let Some((id, canvas)) = &shared.stamp_image {
                operations.extend(raster::stamp_image_ops(canvas, &page, STAMP_IMAGE_NAME));
                xobjects.push((STAMP_IMAGE_NAME, *id));
            } else if let (Some(font), Some(gstate)) = (shared.font, shared.gstate) {
                operations.extend(vector::stamp_ops(&job.stamp_text, &page, FONT_NAME, GSTATE_NAME));
                fonts.push((FONT_NAME, font));
                gstates.push((GSTATE_NAME, gstate));
            }
        }

        if operations.is_empty() {
            return Ok(());
        }

        let overlay = Content { operations }.encode()?;
        let overlay_id = doc.add_object(Stream::new(dictionary! {}, overlay));

        let mut resources = inherited_dictionary(doc, page_id, b"Resources").unwrap_or_default();
        merge_category(doc, &mut resources, b"Font", &fonts);
        merge_category(doc, &mut resources, b"ExtGState", &gstates);
        merge_category(doc, &mut resources, b"XObject", &xobjects);

        let mut contents: Vec<Object> = Vec::new();
        let page_dict = doc.get_dictionary(page_id)?;
        if let Ok(existing) = page_dict.get(b"Contents") {
            let existing = match existing.as_array() {
                Ok(array) => array.clone(),
                Err(_) => vec![existing.clone()],
            };
            if let Some(save) = shared.save {
                contents.push(Object::Reference(save));
            }
            contents.extend(existing);
            if let Some(restore) = shared.restore {
                contents.push(Object::Reference(restore));
            }
        }
        contents.push(Object::Reference(overlay_id));

        let page_dict = doc.get_object_mut(page_id)?.as_dict_mut()?;
        page_dict.set("Contents", Object::Array(contents));
        page_dict.set("Resources", Object::Dictionary(resources));
        Ok(())
    }
}

fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Object> {
    match object {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

/// 沿页面树向上查找可继承的属性
fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut current = page_id;
    for _ in 0..MAX_TREE_DEPTH {
        let dict = doc.get_dictionary(current).ok()?;
        if let Ok(value) = dict.get(key) {
            return resolve(doc, value);
        }
        current = dict.get(b"Parent").ok()?.as_reference().ok()?;
    }
    None
}

fn inherited_dictionary(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Dictionary> {
    inherited(doc, page_id, key)?.as_dict().ok().cloned()
}

/// 页面尺寸（MediaBox，缺省为 Letter）
fn page_box(doc: &Document, page_id: ObjectId) -> PageBox {
    let numbers: Option<Vec<f32>> = inherited(doc, page_id, b"MediaBox")
        .and_then(|obj| obj.as_array().ok())
        .map(|array| {
            array
                .iter()
                .filter_map(|v| resolve(doc, v).and_then(|v| v.as_float().ok()))
                .collect()
        });

    match numbers.as_deref() {
        Some([x0, y0, x1, y1]) => PageBox {
            x0: x0.min(*x1),
            y0: y0.min(*y1),
            width: (x1 - x0).abs(),
            height: (y1 - y0).abs(),
        },
        _ => PageBox::LETTER,
    }
}

/// 把条目加入资源字典的某个分类（分类本身可能是引用）
fn merge_category(
    doc: &Document,
    resources: &mut Dictionary,
    category: &[u8],
    entries: &[(&str, ObjectId)],
) {
    if entries.is_empty() {
        return;
    }
    let mut sub = resources
        .get(category)
        .ok()
        .and_then(|obj| resolve(doc, obj))
        .and_then(|obj| obj.as_dict().ok())
        .cloned()
        .unwrap_or_default();
    for (name, id) in entries {
        sub.set(name.as_bytes().to_vec(), Object::Reference(*id));
    }
    resources.set(category.to_vec(), Object::Dictionary(sub));
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 两页的简单 PDF，资源放在父节点上（测试继承）
    fn sample_pdf() -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids = Vec::new();
        for i in 0..2 {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 700.into()]),
                    Operation::new(
                        "Tj",
                        vec![Object::string_literal(format!("Page {}", i + 1))],
                    ),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => 2,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_unparseable_source_is_load_error() {
        let err = WatermarkRenderer::default()
            .stamp(b"not a pdf", "Title", "School Name Here")
            .unwrap_err();
        assert!(matches!(err, AppError::Document(DocumentError::LoadFailed { .. })));
    }

    #[test]
    fn test_latin_stamp_on_every_page() {
        let stamped = WatermarkRenderer::default()
            .stamp(&sample_pdf(), "Algebra Chapter 1", "Shivaji Vidyalaya Pune")
            .unwrap();

        let doc = Document::load_mem(&stamped).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 2);
        for page_id in pages.values() {
            let page = doc.get_dictionary(*page_id).unwrap();
            let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
            let fonts = resources.get(b"Font").unwrap().as_dict().unwrap();
            assert!(fonts.has(b"F1"), "原有资源必须保留");
            assert!(fonts.has(FONT_NAME.as_bytes()));
            assert!(resources.get(b"ExtGState").unwrap().as_dict().unwrap().has(b"WmGS1"));
            assert_eq!(page.get(b"Contents").unwrap().as_array().unwrap().len(), 4);
        }
    }

    #[test]
    fn test_stamp_is_deterministic() {
        let renderer = WatermarkRenderer::default();
        let source = sample_pdf();
        let a = renderer.stamp(&source, "Algebra", "Shivaji Vidyalaya Pune").unwrap();
        let b = renderer.stamp(&source, "Algebra", "Shivaji Vidyalaya Pune").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_overflowing_header_never_fails() {
        let title = "A Very Long Chapter Title That Keeps Going ".repeat(50);
        let stamped = WatermarkRenderer::default()
            .stamp(&sample_pdf(), &title, "Shivaji Vidyalaya Pune")
            .unwrap();
        assert!(Document::load_mem(&stamped).is_ok());
    }

    #[test]
    fn test_missing_raster_font_skips_element() {
        let renderer = WatermarkRenderer::new(None);
        assert!(!renderer.has_raster_font());
        let stamped = renderer
            .stamp(&sample_pdf(), "बीजगणित प्रकरण १", "Shivaji Vidyalaya Pune")
            .unwrap();

        let doc = Document::load_mem(&stamped).unwrap();
        for page_id in doc.get_pages().values() {
            let page = doc.get_dictionary(*page_id).unwrap();
            let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
            assert!(resources.get(b"XObject").is_err());
            assert!(resources.get(b"ExtGState").is_ok());
        }
    }

    fn fixture_font() -> RasterFont {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures/DevaTest-Bold.ttf");
        RasterFont::from_path(path).unwrap()
    }

    fn xobject_names(doc: &Document, page_id: ObjectId) -> Vec<Vec<u8>> {
        let page = doc.get_dictionary(page_id).unwrap();
        let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
        match resources.get(b"XObject") {
            Ok(xobjects) => xobjects.as_dict().unwrap().iter().map(|(k, _)| k.clone()).collect(),
            Err(_) => Vec::new(),
        }
    }

    #[test]
    fn test_uncovered_script_skips_only_that_element() {
        let renderer = WatermarkRenderer::new(Some(fixture_font()));
        // 测试字体只有 ASCII 和天城文：孟加拉文标题跳过，天城文水印照常
        let stamped = renderer
            .stamp(&sample_pdf(), "বীজগণিত অধ্যায়", "शिवाजी विद्यालय पुणे")
            .unwrap();

        let doc = Document::load_mem(&stamped).unwrap();
        for page_id in doc.get_pages().values() {
            let names = xobject_names(&doc, *page_id);
            assert!(names.contains(&STAMP_IMAGE_NAME.as_bytes().to_vec()));
            assert!(!names.contains(&HEADER_IMAGE_NAME.as_bytes().to_vec()));
        }
    }

    #[test]
    fn test_page_box_defaults_to_letter() {
        let mut doc = Document::with_version("1.5");
        let page_id = doc.add_object(dictionary! { "Type" => "Page" });
        assert_eq!(page_box(&doc, page_id), PageBox::LETTER);
    }
}
