/// 下载记录存储客户端
///
/// user_downloads 表只追加；查询时关联出章节概要
use crate::config::Config;
use crate::error::{AppResult, RecordError};
use crate::models::{ChapterSummary, DownloadRecord, NewDownload, UserInfo};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

/// 下载记录存储
#[async_trait]
pub trait DownloadStore: Send + Sync {
    /// 追加一条记录
    async fn insert(&self, record: &NewDownload) -> AppResult<()>;

    /// 按邮箱查询，下载时间倒序
    async fn list_by_email(&self, email: &str) -> AppResult<Vec<DownloadRecord>>;
}

/// 表中的一行
#[derive(Debug, Serialize, Deserialize)]
struct DownloadRow {
    #[serde(default, skip_serializing)]
    id: Option<serde_json::Value>,
    chapter_id: String,
    college_name: String,
    email: String,
    phone: String,
    downloaded_at: DateTime<Utc>,
    #[serde(default, skip_serializing)]
    chapters: Option<ChapterSummary>,
}

impl From<&NewDownload> for DownloadRow {
    fn from(record: &NewDownload) -> Self {
        Self {
            id: None,
            chapter_id: record.chapter_id.clone(),
            college_name: record.user.institution_name.clone(),
            email: record.user.email.clone(),
            phone: record.user.phone.clone(),
            downloaded_at: record.downloaded_at,
            chapters: None,
        }
    }
}

impl From<DownloadRow> for DownloadRecord {
    fn from(row: DownloadRow) -> Self {
        let id = match row.id {
            Some(serde_json::Value::String(s)) => s,
            Some(other) => other.to_string(),
            None => String::new(),
        };
        Self {
            id,
            chapter_id: row.chapter_id,
            user: UserInfo::new(row.college_name, row.email, row.phone),
            downloaded_at: row.downloaded_at,
            chapter: row.chapters,
        }
    }
}

/// 基于 REST 接口的下载记录存储
pub struct RestDownloadStore {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RestDownloadStore {
    pub fn new(config: &Config) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            http,
            base_url: config.store_api_base_url.trim_end_matches('/').to_string(),
            api_key: config.store_api_key.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/rest/v1/user_downloads", self.base_url)
    }
}

#[async_trait]
impl DownloadStore for RestDownloadStore {
    async fn insert(&self, record: &NewDownload) -> AppResult<()> {
        debug!("写入下载记录: 章节 {} | {}", record.chapter_id, record.user.email);

        let response = self
            .http
            .post(self.endpoint())
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=minimal")
            .json(&DownloadRow::from(record))
            .send()
            .await
            .map_err(|e| RecordError::WriteFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RecordError::WriteFailed(format!("HTTP {}: {}", status, body)).into());
        }
        Ok(())
    }

    async fn list_by_email(&self, email: &str) -> AppResult<Vec<DownloadRecord>> {
        let response = self
            .http
            .get(self.endpoint())
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .query(&[
                (
                    "select",
                    "*,chapters(title,standard,subject,paper_type,file_url)".to_string(),
                ),
                ("email", format!("eq.{}", email)),
                ("order", "downloaded_at.desc".to_string()),
            ])
            .send()
            .await
            .map_err(|e| RecordError::QueryFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RecordError::QueryFailed(format!("HTTP {}: {}", status, body)).into());
        }

        let rows: Vec<DownloadRow> = response
            .json()
            .await
            .map_err(|e| RecordError::QueryFailed(e.to_string()))?;
        Ok(rows.into_iter().map(DownloadRecord::from).collect())
    }
}

/// 进程内存储（离线运行与测试使用）
#[derive(Default)]
pub struct InMemoryDownloadStore {
    records: RwLock<Vec<DownloadRecord>>,
    next_id: AtomicU64,
}

impl InMemoryDownloadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置已有记录
    pub fn with_records(records: Vec<DownloadRecord>) -> Self {
        let next_id = AtomicU64::new(records.len() as u64);
        Self {
            records: RwLock::new(records),
            next_id,
        }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// 全部记录（插入顺序）
    pub async fn snapshot(&self) -> Vec<DownloadRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl DownloadStore for InMemoryDownloadStore {
    async fn insert(&self, record: &NewDownload) -> AppResult<()> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.records.write().await.push(DownloadRecord {
            id: id.to_string(),
            chapter_id: record.chapter_id.clone(),
            user: record.user.clone(),
            downloaded_at: record.downloaded_at,
            chapter: None,
        });
        Ok(())
    }

    async fn list_by_email(&self, email: &str) -> AppResult<Vec<DownloadRecord>> {
        let mut found: Vec<DownloadRecord> = self
            .records
            .read()
            .await
            .iter()
            .filter(|r| r.user.email == email)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.downloaded_at.cmp(&a.downloaded_at));
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_row_with_joined_chapter() {
        let row: DownloadRow = serde_json::from_value(serde_json::json!({
            "id": 7,
            "chapter_id": "c1",
            "college_name": "Shivaji Vidyalaya Pune",
            "email": "t@example.in",
            "phone": "98",
            "downloaded_at": "2025-03-01T10:00:00+00:00",
            "chapters": {"title": "Algebra 1", "standard": "10", "subject": "algebra",
                         "paper_type": "question", "file_url": "https://x/a.pdf"}
        }))
        .unwrap();

        let record = DownloadRecord::from(row);
        assert_eq!(record.id, "7");
        assert_eq!(record.user.institution_name, "Shivaji Vidyalaya Pune");
        assert_eq!(record.chapter.unwrap().file_url.as_deref(), Some("https://x/a.pdf"));
    }

    #[test]
    fn test_insert_body_has_no_id() {
        let record = NewDownload {
            chapter_id: "c1".to_string(),
            user: UserInfo::new("Shivaji Vidyalaya Pune", "t@example.in", "98"),
            downloaded_at: Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap(),
        };
        let body = serde_json::to_value(DownloadRow::from(&record)).unwrap();
        assert!(body.get("id").is_none());
        assert!(body.get("chapters").is_none());
        assert_eq!(body["college_name"], "Shivaji Vidyalaya Pune");
    }

    #[tokio::test]
    async fn test_in_memory_filters_and_sorts() {
        let store = InMemoryDownloadStore::new();
        let user = UserInfo::new("Shivaji Vidyalaya Pune", "t@example.in", "98");
        let other = UserInfo::new("Shivaji Vidyalaya Pune", "x@example.in", "98");
        for (chapter, who, hour) in [("c1", &user, 9), ("c2", &user, 11), ("c3", &other, 12)] {
            store
                .insert(&NewDownload {
                    chapter_id: chapter.to_string(),
                    user: who.clone(),
                    downloaded_at: Utc.with_ymd_and_hms(2025, 3, 1, hour, 0, 0).unwrap(),
                })
                .await
                .unwrap();
        }

        let found = store.list_by_email("t@example.in").await.unwrap();
        let ids: Vec<_> = found.iter().map(|r| r.chapter_id.as_str()).collect();
        assert_eq!(ids, vec!["c2", "c1"]);
        assert_eq!(store.len().await, 3);
    }
}
