//! 水印 / 标题盖章
//!
//! - `script`：书写系统判定
//! - `fit`：字号收缩
//! - `metrics`：Helvetica-Bold 字宽与编码
//! - `vector` / `raster`：两条绘制路径
//! - `renderer`：逐页叠加

pub mod fit;
pub mod metrics;
pub mod raster;
pub mod renderer;
pub mod script;
pub mod vector;

pub use fit::{fit_font_size, TextMeasure};
pub use raster::RasterFont;
pub use renderer::{WatermarkJob, WatermarkRenderer};
pub use script::{classify_script, ScriptClass};

/// 页面可见区域（PDF 坐标，原点在左下）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    pub x0: f32,
    pub y0: f32,
    pub width: f32,
    pub height: f32,
}

impl PageBox {
    pub const LETTER: PageBox = PageBox {
        x0: 0.0,
        y0: 0.0,
        width: 612.0,
        height: 792.0,
    };

    pub fn center(&self) -> (f32, f32) {
        (self.x0 + self.width / 2.0, self.y0 + self.height / 2.0)
    }
}
