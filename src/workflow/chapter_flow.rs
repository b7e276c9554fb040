//! 章节处理流程 - 流程层
//!
//! 核心职责：定义"一个章节"的完整交付流程
//!
//! 流程顺序：
//! 1. 收费章节：下单 → 收银台 → 校验（只有 VERIFIED 才继续）
//! 2. 取源文档 → 盖章 → 写入输出目录
//! 3. 写下载记录（失败只记日志）

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};

use crate::clients::DocumentSource;
use crate::error::AppResult;
use crate::models::{Chapter, UserInfo};
use crate::services::{
    ArtifactWriter, DownloadRecorder, PaymentOrchestrator, PaymentOutcome, WatermarkJob,
    WatermarkRenderer,
};
use crate::utils::logging::truncate_text;
use crate::workflow::chapter_ctx::ChapterCtx;

/// 章节处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChapterOutcome {
    /// 已交付
    Delivered { path: PathBuf },
    /// 下单或校验失败
    PaymentFailed { reason: String },
    /// 用户关闭收银台
    Cancelled,
    /// 源文档获取 / 盖章 / 写文件失败
    DocumentFailed { reason: String },
    /// 选中的 id 不在目录快照中
    Missing,
}

impl ChapterOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, ChapterOutcome::Delivered { .. })
    }
}

impl fmt::Display for ChapterOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChapterOutcome::Delivered { path } => write!(f, "已交付: {}", path.display()),
            ChapterOutcome::PaymentFailed { reason } => write!(f, "支付失败: {}", reason),
            ChapterOutcome::Cancelled => f.write_str("用户取消支付"),
            ChapterOutcome::DocumentFailed { reason } => write!(f, "文档处理失败: {}", reason),
            ChapterOutcome::Missing => f.write_str("不在目录中"),
        }
    }
}

/// 章节处理流程
///
/// - 编排单个章节的支付、盖章、保存和记录
/// - 决定什么情况下继续、什么情况下放弃
/// - 不关心批次顺序和统计
pub struct ChapterFlow {
    payment: PaymentOrchestrator,
    documents: Arc<dyn DocumentSource>,
    renderer: WatermarkRenderer,
    writer: ArtifactWriter,
    recorder: DownloadRecorder,
}

impl ChapterFlow {
    /// 创建新的章节处理流程
    pub fn new(
        payment: PaymentOrchestrator,
        documents: Arc<dyn DocumentSource>,
        renderer: WatermarkRenderer,
        writer: ArtifactWriter,
        recorder: DownloadRecorder,
    ) -> Self {
        Self {
            payment,
            documents,
            renderer,
            writer,
            recorder,
        }
    }

    pub fn recorder(&self) -> &DownloadRecorder {
        &self.recorder
    }

    pub async fn run(&self, chapter: &Chapter, user: &UserInfo, ctx: &ChapterCtx) -> ChapterOutcome {
        info!(
            "{} 📄 {} (₹{:.2})",
            ctx,
            truncate_text(&chapter.title, 60),
            chapter.price
        );

        // ========== 流程 1: 收费章节先支付 ==========
        let mut recorded_by_gateway = false;
        if !chapter.is_free() {
            info!("{} 💳 需要支付，创建订单...", ctx);
            match self.payment.run(chapter, user).await {
                PaymentOutcome::Verified {
                    recorded_by_gateway: recorded,
                    ..
                } => {
                    recorded_by_gateway = recorded;
                }
                PaymentOutcome::Cancelled { .. } => {
                    warn!("{} 🚫 支付已取消，跳过", ctx);
                    return ChapterOutcome::Cancelled;
                }
                PaymentOutcome::Failed { order, error: e } => {
                    let order_id = order.as_ref().map_or("-", |o| o.order_id.as_str());
                    error!("{} ❌ 支付失败 (订单 {})，跳过: {}", ctx, order_id, e);
                    return ChapterOutcome::PaymentFailed {
                        reason: e.to_string(),
                    };
                }
            }
        }

        // ========== 流程 2: 盖章并保存 ==========
        let path = match self.deliver(chapter, user, ctx).await {
            Ok(path) => path,
            Err(e) => {
                error!("{} ❌ 文档处理失败: {}", ctx, e);
                return ChapterOutcome::DocumentFailed {
                    reason: e.to_string(),
                };
            }
        };

        // ========== 流程 3: 下载记录 ==========
        if !recorded_by_gateway {
            self.recorder.record(&chapter.id, user, Utc::now()).await;
        }

        info!("{} ✅ 已交付: {}", ctx, path.display());
        ChapterOutcome::Delivered { path }
    }

    /// 取源文档、盖章、写文件（不涉及支付和记录）
    pub async fn deliver(
        &self,
        chapter: &Chapter,
        user: &UserInfo,
        ctx: &ChapterCtx,
    ) -> AppResult<PathBuf> {
        info!("{} 📥 获取源文档...", ctx);
        let source = self.documents.fetch(&chapter.source_ref).await?;

        info!("{} 🖋️  盖章中 ({} 字节)...", ctx, source.len());
        let job = WatermarkJob::new(
            chapter.source_ref.clone(),
            chapter.title.clone(),
            user.institution_name.clone(),
        );
        let stamped = self.renderer.stamp_job(&source, &job)?;

        self.writer.write(user, chapter, &stamped).await
    }
}
