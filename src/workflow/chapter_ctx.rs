//! 章节处理上下文
//!
//! 封装"我正在处理本批第几个章节"这一信息

use std::fmt::Display;

/// 章节处理上下文
#[derive(Debug, Clone)]
pub struct ChapterCtx {
    /// 章节 id
    pub chapter_id: String,

    /// 在本批中的序号（从 1 开始，仅用于日志显示）
    pub index: usize,

    /// 本批章节总数
    pub total: usize,
}

impl ChapterCtx {
    /// 创建新的章节上下文
    pub fn new(chapter_id: impl Into<String>, index: usize, total: usize) -> Self {
        Self {
            chapter_id: chapter_id.into(),
            index,
            total,
        }
    }
}

impl Display for ChapterCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[章节 {}/{} {}]", self.index, self.total, self.chapter_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_prefix_names_chapter() {
        let ctx = ChapterCtx::new("alg-10-q3", 3, 12);
        assert_eq!(ctx.to_string(), "[章节 3/12 alg-10-q3]");
    }
}
