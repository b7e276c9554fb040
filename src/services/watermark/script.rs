//! 文字书写系统判定

use super::metrics::win_ansi_byte;

/// 书写系统分类
///
/// 只有 `Latin` 走矢量字体；其余全部光栅化。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptClass {
    /// 标准字体（WinAnsi）可以完整表示
    Latin,
    /// 含天城文字符
    Devanagari,
    /// 其他标准字体无法表示的文字
    Other,
}

impl ScriptClass {
    pub fn needs_rasterization(self) -> bool {
        !matches!(self, ScriptClass::Latin)
    }
}

fn is_devanagari(c: char) -> bool {
    matches!(c, '\u{0900}'..='\u{097F}' | '\u{A8E0}'..='\u{A8FF}')
}

/// 判定文字的书写系统
pub fn classify_script(text: &str) -> ScriptClass {
    if text.chars().any(is_devanagari) {
        return ScriptClass::Devanagari;
    }
    if text.chars().all(|c| win_ansi_byte(c).is_some()) {
        ScriptClass::Latin
    } else {
        ScriptClass::Other
    }
}
