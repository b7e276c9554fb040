//! 字号收缩

/// 给定字号下的文字宽度
pub trait TextMeasure {
    fn width(&self, text: &str, size: f32) -> f32;
}

/// 从 `start` 开始按 `step` 缩小字号，直到宽度不超过 `max_width` 或字号不再大于 `floor`
///
/// 文字再长也不会报错；起始字号本身不大于 `floor` 时原样返回。
pub fn fit_font_size<M: TextMeasure + ?Sized>(
    measure: &M,
    text: &str,
    start: f32,
    floor: f32,
    step: f32,
    max_width: f32,
) -> f32 {
    let mut size = start;
    while measure.width(text, size) > max_width && size > floor {
        size -= step;
    }
    size
}
