//! 批次交付控制器 - 编排层
//!
//! ## 职责
//!
//! 本模块负责一次提交（批次）中所有选中章节的交付，是批次级别的编排器。
//!
//! ## 核心功能
//!
//! 1. **入口校验**：空选择或用户信息不合法时直接失败，一个章节都不处理
//! 2. **顺序处理**：按选择顺序逐个交给 `ChapterFlow`，不并发
//! 3. **尽力而为**：单个章节失败只记日志，继续下一个，不回滚
//! 4. **统计输出**：汇总成功数量和每个章节的结果

use crate::error::{AppError, AppResult, ValidationError};
use crate::models::{Chapter, DownloadRecord, PaperType, UserInfo};
use crate::workflow::{ChapterCtx, ChapterFlow, ChapterOutcome};
use std::path::PathBuf;
use tracing::{info, warn};

/// 批次交付报告
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FulfillmentReport {
    pub success_count: usize,
    pub total: usize,
    /// 每个选中 id 的结果，顺序与选择顺序一致
    pub outcomes: Vec<(String, ChapterOutcome)>,
}

impl FulfillmentReport {
    pub fn failed_count(&self) -> usize {
        self.total - self.success_count
    }

    pub fn delivered_paths(&self) -> Vec<&PathBuf> {
        self.outcomes
            .iter()
            .filter_map(|(_, outcome)| match outcome {
                ChapterOutcome::Delivered { path } => Some(path),
                _ => None,
            })
            .collect()
    }
}

/// 批次交付控制器
pub struct BatchFulfillmentController {
    flow: ChapterFlow,
}

impl BatchFulfillmentController {
    pub fn new(flow: ChapterFlow) -> Self {
        Self { flow }
    }

    pub fn flow(&self) -> &ChapterFlow {
        &self.flow
    }

    /// 交付一批章节
    ///
    /// # 参数
    /// - `selected_ids`: 选中的章节 id（按选择顺序）
    /// - `catalog`: 批次开始时取得的目录快照
    /// - `user`: 下载人信息（整批共用）
    ///
    /// # 返回
    /// 返回交付报告；只有入口校验失败才返回错误
    pub async fn fulfill(
        &self,
        selected_ids: &[String],
        catalog: &[Chapter],
        user: &UserInfo,
    ) -> AppResult<FulfillmentReport> {
        if selected_ids.is_empty() {
            return Err(ValidationError::EmptySelection.into());
        }
        user.validate()?;

        let total = selected_ids.len();
        let mut report = FulfillmentReport {
            success_count: 0,
            total,
            outcomes: Vec::with_capacity(total),
        };

        for (index, chapter_id) in selected_ids.iter().enumerate() {
            let ctx = ChapterCtx::new(chapter_id.clone(), index + 1, total);

            let outcome = match catalog.iter().find(|c| &c.id == chapter_id) {
                Some(chapter) => self.flow.run(chapter, user, &ctx).await,
                None => {
                    warn!("{} ⚠️  章节 {} 不在目录中，跳过", ctx, chapter_id);
                    ChapterOutcome::Missing
                }
            };

            if outcome.is_delivered() {
                report.success_count += 1;
            }
            report.outcomes.push((chapter_id.clone(), outcome));
        }

        info!(
            "📊 本批完成: 成功 {}/{}",
            report.success_count, report.total
        );
        Ok(report)
    }

    /// 按历史记录重新交付（不支付、不新增记录）
    ///
    /// 水印使用记录中的用户信息。
    pub async fn redeliver(&self, record: &DownloadRecord) -> AppResult<PathBuf> {
        let chapter = chapter_from_record(record)?;
        let ctx = ChapterCtx::new(record.chapter_id.clone(), 1, 1);
        info!("{} 🔁 重新交付: {}", ctx, chapter.title);
        self.flow.deliver(&chapter, &record.user, &ctx).await
    }
}

/// 由历史记录中的章节概要还原章节
fn chapter_from_record(record: &DownloadRecord) -> AppResult<Chapter> {
    let summary = record.chapter.as_ref().ok_or_else(|| {
        AppError::Other(format!("下载记录 {} 缺少章节信息", record.id))
    })?;
    let source_ref = summary
        .file_url
        .clone()
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| {
            AppError::document_load_failed(
                record.chapter_id.clone(),
                "章节没有源文件",
            )
        })?;

    Ok(Chapter {
        id: record.chapter_id.clone(),
        title: summary.title.clone(),
        standard: summary.standard.clone(),
        subject: summary.subject.clone(),
        paper_type: summary
            .paper_type
            .as_deref()
            .and_then(PaperType::parse)
            .unwrap_or(PaperType::Question),
        price: 0.0,
        source_ref,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChapterSummary;
    use chrono::Utc;

    fn record(summary: Option<ChapterSummary>) -> DownloadRecord {
        DownloadRecord {
            id: "r1".to_string(),
            chapter_id: "c1".to_string(),
            user: UserInfo::new("Shivaji Vidyalaya Pune", "t@example.in", "1"),
            downloaded_at: Utc::now(),
            chapter: summary,
        }
    }

    #[test]
    fn test_chapter_from_record() {
        let chapter = chapter_from_record(&record(Some(ChapterSummary {
            title: "Algebra 1".to_string(),
            standard: "10".to_string(),
            subject: "algebra".to_string(),
            paper_type: Some("answer".to_string()),
            file_url: Some("https://cdn.example.in/a.pdf".to_string()),
        })))
        .unwrap();
        assert_eq!(chapter.paper_type, PaperType::Answer);
        assert!(chapter.is_free());
        assert_eq!(chapter.source_ref, "https://cdn.example.in/a.pdf");
    }

    #[test]
    fn test_record_without_source_cannot_redeliver() {
        assert!(chapter_from_record(&record(None)).is_err());
        let summary = ChapterSummary {
            title: "Algebra 1".to_string(),
            standard: "10".to_string(),
            subject: "algebra".to_string(),
            paper_type: None,
            file_url: None,
        };
        assert!(chapter_from_record(&record(Some(summary))).is_err());
    }

    #[test]
    fn test_report_counts() {
        let report = FulfillmentReport {
            success_count: 1,
            total: 3,
            outcomes: vec![
                ("a".to_string(), ChapterOutcome::Delivered { path: PathBuf::from("a.pdf") }),
                ("b".to_string(), ChapterOutcome::Cancelled),
                ("c".to_string(), ChapterOutcome::Missing),
            ],
        };
        assert_eq!(report.failed_count(), 2);
        assert_eq!(report.delivered_paths(), vec![&PathBuf::from("a.pdf")]);
    }
}
