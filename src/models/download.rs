use crate::models::user::UserInfo;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 下载记录（只追加，不修改不删除）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadRecord {
    pub id: String,
    pub chapter_id: String,
    /// 下载时的用户信息快照
    pub user: UserInfo,
    pub downloaded_at: DateTime<Utc>,
    /// 查询时关联出的章节概要（用于重新下载）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter: Option<ChapterSummary>,
}

/// 章节概要
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterSummary {
    pub title: String,
    pub standard: String,
    pub subject: String,
    #[serde(default)]
    pub paper_type: Option<String>,
    #[serde(default)]
    pub file_url: Option<String>,
}

/// 待写入的下载记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDownload {
    pub chapter_id: String,
    pub user: UserInfo,
    pub downloaded_at: DateTime<Utc>,
}
