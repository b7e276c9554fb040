/// 源文档客户端
///
/// 根据章节的 source_ref 取回原始 PDF 字节：http(s) 地址走网络，其余按本地路径读取
use crate::config::Config;
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use tracing::debug;

/// 源文档来源
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn fetch(&self, source_ref: &str) -> AppResult<Vec<u8>>;
}

/// 默认来源：URL 或本地文件
pub struct HttpDocumentSource {
    http: reqwest::Client,
}

impl HttpDocumentSource {
    pub fn new(config: &Config) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self { http })
    }

    async fn fetch_remote(&self, url: &str) -> AppResult<Vec<u8>> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::document_load_failed(url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::document_load_failed(url, format!("HTTP {}", status)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::document_load_failed(url, e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

pub fn is_remote(source_ref: &str) -> bool {
    let lower = source_ref.trim().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

#[async_trait]
impl DocumentSource for HttpDocumentSource {
    async fn fetch(&self, source_ref: &str) -> AppResult<Vec<u8>> {
        let source_ref = source_ref.trim();
        if source_ref.is_empty() {
            return Err(AppError::document_load_failed(source_ref, "章节没有源文件"));
        }

        debug!("获取源文档: {}", source_ref);
        let bytes = if is_remote(source_ref) {
            self.fetch_remote(source_ref).await?
        } else {
            tokio::fs::read(source_ref)
                .await
                .map_err(|e| AppError::document_load_failed(source_ref, e.to_string()))?
        };

        if bytes.is_empty() {
            return Err(AppError::document_load_failed(source_ref, "源文件为空"));
        }
        Ok(bytes)
    }
}
