//! 下载记录服务 - 业务能力层
//!
//! 只负责"记一笔 / 查历史"能力，写入失败不影响交付

use crate::clients::DownloadStore;
use crate::error::AppResult;
use crate::models::{DownloadRecord, NewDownload, UserInfo};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

/// 下载记录服务
///
/// 职责：
/// - 追加写入下载记录（失败只记日志）
/// - 按邮箱查询历史，时间倒序
#[derive(Clone)]
pub struct DownloadRecorder {
    store: Arc<dyn DownloadStore>,
}

impl DownloadRecorder {
    pub fn new(store: Arc<dyn DownloadStore>) -> Self {
        Self { store }
    }

    /// 写入一条下载记录
    ///
    /// # 返回
    /// 是否写入成功；失败已记录日志，调用方无需处理
    pub async fn record(
        &self,
        chapter_id: &str,
        user: &UserInfo,
        downloaded_at: DateTime<Utc>,
    ) -> bool {
        let record = NewDownload {
            chapter_id: chapter_id.to_string(),
            user: user.clone(),
            downloaded_at,
        };

        match self.store.insert(&record).await {
            Ok(()) => {
                debug!("下载记录已写入: 章节 {} | {}", chapter_id, user.email);
                true
            }
            Err(e) => {
                warn!("⚠️  下载记录写入失败 (章节 {}): {}", chapter_id, e);
                false
            }
        }
    }

    /// 查询某个邮箱的下载历史
    ///
    /// # 参数
    /// - `email`: 下载人邮箱
    ///
    /// # 返回
    /// 按下载时间倒序排列的记录；没有记录时为空列表
    pub async fn history(&self, email: &str) -> AppResult<Vec<DownloadRecord>> {
        let email = email.trim();
        if email.is_empty() {
            return Ok(Vec::new());
        }

        let mut records = self.store.list_by_email(email).await?;
        records.sort_by(|a, b| b.downloaded_at.cmp(&a.downloaded_at));
        Ok(records)
    }
}
