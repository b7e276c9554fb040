use crate::error::{AppError, AppResult, ConfigError};
use crate::models::chapter::PaperType;
use crate::models::user::UserInfo;
use serde::Deserialize;
use std::path::Path;
use tokio::fs;

/// 一次提交（批次）的请求内容
///
/// ```toml
/// standard = "10"
/// subjects = ["algebra", "geometry"]
/// paper_type = "question"
/// selected = ["chapter-1", "chapter-2"]
///
/// [user]
/// institution_name = "Shivaji Vidyalaya Pune"
/// email = "office@example.in"
/// phone = "9876543210"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct BatchRequest {
    pub standard: String,
    pub subjects: Vec<String>,
    pub paper_type: PaperType,
    /// 选中的章节 id，按选择顺序处理
    pub selected: Vec<String>,
    pub user: UserInfo,
}

/// 从 TOML 文件加载批次请求
pub async fn load_batch_request(toml_file_path: &Path) -> AppResult<BatchRequest> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .map_err(|e| AppError::file(toml_file_path.display().to_string(), e))?;

    let request: BatchRequest = toml::from_str(&content).map_err(|e| {
        AppError::Config(ConfigError::FileParseFailed {
            path: toml_file_path.display().to_string(),
            message: e.to_string(),
        })
    })?;

    tracing::info!(
        "成功加载批次请求: {} 个章节 ({})",
        request.selected.len(),
        toml_file_path.file_name().unwrap_or_default().to_string_lossy()
    );

    Ok(request)
}
