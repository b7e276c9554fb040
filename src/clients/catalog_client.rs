/// 目录存储客户端
///
/// 封装对 chapters 表的查询调用
use crate::config::Config;
use crate::error::{AppError, AppResult, CatalogError};
use crate::models::{Chapter, PaperType};
use async_trait::async_trait;
use tracing::debug;

/// 目录查询条件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogFilter {
    pub standard: String,
    /// 已去重的科目 id
    pub subjects: Vec<String>,
    pub paper_type: PaperType,
}

/// 目录存储
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// 查询满足条件的章节，按创建时间倒序
    async fn query_chapters(&self, filter: &CatalogFilter) -> AppResult<Vec<Chapter>>;
}

/// 基于 REST 接口的目录存储
pub struct RestCatalogStore {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RestCatalogStore {
    /// 创建新的目录客户端
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
        format!("{}/rest/v1/chapters", self.base_url)
    }
}

/// `in.(a,b,c)` 形式的集合过滤条件
pub fn in_filter(values: &[String]) -> String {
    format!("in.({})", values.join(","))
}

#[async_trait]
impl CatalogStore for RestCatalogStore {
    async fn query_chapters(&self, filter: &CatalogFilter) -> AppResult<Vec<Chapter>> {
        let endpoint = self.endpoint();
        debug!(
            "查询目录: standard={} subjects={:?} paper_type={}",
            filter.standard, filter.subjects, filter.paper_type
        );

        let response = self
            .http
            .get(&endpoint)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .query(&[
                ("select", "*".to_string()),
                ("standard", format!("eq.{}", filter.standard)),
                ("paper_type", format!("eq.{}", filter.paper_type)),
                ("subject", in_filter(&filter.subjects)),
                ("order", "created_at.desc".to_string()),
            ])
            .send()
            .await
            .map_err(|e| AppError::catalog_unavailable(&endpoint, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::catalog_unavailable(
                &endpoint,
                format!("HTTP {}: {}", status, body),
            ));
        }

        let chapters: Vec<Chapter> = response
            .json()
            .await
            .map_err(|e| CatalogError::BadPayload(e.to_string()))?;

        debug!("目录返回 {} 个章节", chapters.len());
        Ok(chapters)
    }
}
