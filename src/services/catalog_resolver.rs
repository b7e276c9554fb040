//! 目录解析服务 - 业务能力层
//!
//! 只负责"(年级, 科目集合, 试卷类型) → 章节列表"能力

use crate::clients::{CatalogFilter, CatalogStore};
use crate::error::{AppResult, ValidationError};
use crate::models::{Chapter, PaperType};
use std::sync::Arc;
use tracing::{debug, warn};

/// 目录解析服务
///
/// 职责：
/// - 校验查询条件
/// - 查询目录存储
/// - 不做重试，不关心选择和支付
#[derive(Clone)]
pub struct CatalogResolver {
    store: Arc<dyn CatalogStore>,
}

impl CatalogResolver {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// 解析章节列表
    ///
    /// # 参数
    /// - `standard`: 年级 id
    /// - `subjects`: 科目 id 集合（重复项忽略）
    /// - `paper_type`: 试卷类型
    ///
    /// # 返回
    /// 匹配的章节；没有匹配时为空列表。后端不可达时返回 `CatalogError::Unavailable`
    pub async fn resolve(
        &self,
        standard: &str,
        subjects: &[String],
        paper_type: PaperType,
    ) -> AppResult<Vec<Chapter>> {
        let standard = standard.trim();
        if standard.is_empty() {
            return Err(ValidationError::EmptyStandard.into());
        }

        let mut unique: Vec<String> = Vec::with_capacity(subjects.len());
        for subject in subjects.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
            if !unique.iter().any(|u| u == subject) {
                unique.push(subject.to_string());
            }
        }
        if unique.is_empty() {
            return Err(ValidationError::EmptySubjects.into());
        }

        let filter = CatalogFilter {
            standard: standard.to_string(),
            subjects: unique,
            paper_type,
        };
        let chapters: Vec<Chapter> = self
            .store
            .query_chapters(&filter)
            .await?
            .into_iter()
            .filter(|c| {
                c.standard == filter.standard
                    && c.paper_type == filter.paper_type
                    && filter.subjects.contains(&c.subject)
            })
            .collect();

        debug!("目录解析完成: {} 个章节", chapters.len());
        Ok(chapters)
    }

    /// 解析章节列表，后端不可达时降级为空列表
    pub async fn resolve_or_empty(
        &self,
        standard: &str,
        subjects: &[String],
        paper_type: PaperType,
    ) -> AppResult<Vec<Chapter>> {
        match self.resolve(standard, subjects, paper_type).await {
            Err(e) if e.is_catalog_unavailable() => {
                warn!("⚠️  目录暂时不可用，按空列表处理: {}", e);
                Ok(Vec::new())
            }
            other => other,
        }
    }
}
