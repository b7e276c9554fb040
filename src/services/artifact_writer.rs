//! 交付文件写入服务 - 业务能力层
//!
//! 只负责"把盖好章的 PDF 写进输出目录"能力，不关心流程

use crate::error::{AppError, AppResult};
use crate::models::{Chapter, UserInfo};
use regex::Regex;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// 交付文件写入服务
///
/// 职责：
/// - 按 `{学校名}_{年级}_{科目}_{试卷类型}.pdf` 生成文件名
/// - 同名文件已存在时追加序号，不覆盖本批已交付的文件
/// - 只处理单个章节
pub struct ArtifactWriter {
    output_folder: PathBuf,
    whitespace: Regex,
}

impl ArtifactWriter {
    /// 创建新的写入服务
    pub fn new(output_folder: impl Into<PathBuf>) -> AppResult<Self> {
        let whitespace =
            Regex::new(r"\s+").map_err(|e| AppError::Other(format!("正则编译失败: {}", e)))?;
        Ok(Self {
            output_folder: output_folder.into(),
            whitespace,
        })
    }

    pub fn output_folder(&self) -> &Path {
        &self.output_folder
    }

    /// 生成文件名
    ///
    /// # 参数
    /// - `user`: 下载人信息（取学校名称）
    /// - `chapter`: 章节
    ///
    /// # 返回
    /// 空白连续段替换为单个 `_`（首尾空白同样替换，不裁剪），路径分隔符替换为 `_`
    pub fn file_name(&self, user: &UserInfo, chapter: &Chapter) -> String {
        let college = self
            .whitespace
            .replace_all(&user.institution_name, "_")
            .replace(['/', '\\'], "_");
        format!(
            "{}_{}_{}_{}.pdf",
            college, chapter.standard, chapter.subject, chapter.paper_type
        )
    }

    /// 写入交付文件
    ///
    /// # 返回
    /// 实际写入的路径
    pub async fn write(
        &self,
        user: &UserInfo,
        chapter: &Chapter,
        bytes: &[u8],
    ) -> AppResult<PathBuf> {
        fs::create_dir_all(&self.output_folder)
            .await
            .map_err(|e| AppError::file(self.output_folder.display().to_string(), e))?;

        let path = self.free_path(&self.file_name(user, chapter)).await;
        debug!("写入交付文件: {} ({} 字节)", path.display(), bytes.len());

        fs::write(&path, bytes)
            .await
            .map_err(|e| AppError::file(path.display().to_string(), e))?;
        Ok(path)
    }

    async fn free_path(&self, file_name: &str) -> PathBuf {
        let first = self.output_folder.join(file_name);
        if !fs::try_exists(&first).await.unwrap_or(false) {
            return first;
        }

        let stem = file_name.trim_end_matches(".pdf");
        let mut n = 2;
        loop {
            let candidate = self.output_folder.join(format!("{} ({}).pdf", stem, n));
            if !fs::try_exists(&candidate).await.unwrap_or(false) {
                return candidate;
            }
            n += 1;
        }
    }
}
