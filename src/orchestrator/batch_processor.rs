//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 本模块负责组装整个应用并对外提供四个动作。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：日志文件、存储客户端、支付网关、光栅字体
//! 2. **批次交付**：加载批次请求 → 目录快照 → 交给 `BatchFulfillmentController`
//! 3. **目录浏览**：列出某个年级 / 科目 / 试卷类型下的章节
//! 4. **下载历史**：按邮箱查询、按记录重新交付
//!
//! ## 设计特点
//!
//! - **资源所有者**：唯一创建网关、存储和收银台的模块
//! - **向下委托**：单个章节的处理全部交给 workflow 层

use crate::clients::{
    CatalogStore, DirectGatewayClient, DocumentSource, DownloadStore, HttpDocumentSource,
    HttpGatewayClient, PaymentGatewayClient, RestCatalogStore, RestDownloadStore,
};
use crate::config::{Config, GatewayMode};
use crate::error::{AppError, AppResult};
use crate::infrastructure::{CheckoutSurface, ConsoleCheckout};
use crate::models::{load_batch_request, Chapter, DownloadRecord, PaperType, Standard};
use crate::orchestrator::fulfillment::{BatchFulfillmentController, FulfillmentReport};
use crate::services::{
    pricing, ArtifactWriter, CatalogResolver, DownloadRecorder, PaymentOrchestrator,
    WatermarkRenderer,
};
use crate::utils::logging;
use crate::workflow::ChapterFlow;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// 应用主结构
pub struct App {
    config: Config,
    resolver: CatalogResolver,
    recorder: DownloadRecorder,
    controller: BatchFulfillmentController,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> AppResult<Self> {
        // 初始化日志文件
        logging::init_log_file(&config.output_log_file)?;

        let gateway_name = match config.gateway_mode {
            GatewayMode::Http => "托管函数",
            GatewayMode::Direct => "直连支付商",
        };
        logging::log_startup(gateway_name, &config.output_folder);

        let catalog: Arc<dyn CatalogStore> = Arc::new(RestCatalogStore::new(&config)?);
        let downloads: Arc<dyn DownloadStore> = Arc::new(RestDownloadStore::new(&config)?);
        let documents: Arc<dyn DocumentSource> = Arc::new(HttpDocumentSource::new(&config)?);
        let surface: Arc<dyn CheckoutSurface> = Arc::new(ConsoleCheckout::new());
        let recorder = DownloadRecorder::new(downloads);

        let gateway: Arc<dyn PaymentGatewayClient> = match config.gateway_mode {
            GatewayMode::Http => Arc::new(HttpGatewayClient::new(&config, surface)?),
            GatewayMode::Direct => Arc::new(DirectGatewayClient::new(
                &config,
                surface,
                Some(recorder.clone()),
            )?),
        };

        let renderer = WatermarkRenderer::from_config(&config);
        if !renderer.has_raster_font() {
            warn!("⚠️  未加载光栅字体：天城文标题 / 水印将被跳过");
        }

        let flow = ChapterFlow::new(
            PaymentOrchestrator::new(gateway),
            documents,
            renderer,
            ArtifactWriter::new(&config.output_folder)?,
            recorder.clone(),
        );

        Ok(Self::from_parts(
            config,
            CatalogResolver::new(catalog),
            recorder,
            BatchFulfillmentController::new(flow),
        ))
    }

    /// 由已组装好的组件创建（测试中注入替身）
    pub fn from_parts(
        config: Config,
        resolver: CatalogResolver,
        recorder: DownloadRecorder,
        controller: BatchFulfillmentController,
    ) -> Self {
        Self {
            config,
            resolver,
            recorder,
            controller,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn controller(&self) -> &BatchFulfillmentController {
        &self.controller
    }

    /// 按批次请求文件交付
    pub async fn run_batch(&self, request_path: &Path) -> AppResult<FulfillmentReport> {
        let request = load_batch_request(request_path).await?;
        check_taxonomy(&request.standard, &request.subjects);

        // 目录快照：本批只取一次
        let catalog = self
            .resolver
            .resolve_or_empty(&request.standard, &request.subjects, request.paper_type)
            .await?;
        info!("✓ 目录中找到 {} 个章节", catalog.len());

        logging::log_batch_start(
            request.selected.len(),
            pricing::total_price(&request.selected, &catalog),
        );

        let report = self
            .controller
            .fulfill(&request.selected, &catalog, &request.user)
            .await?;

        for (chapter_id, outcome) in &report.outcomes {
            logging::append_log_line(
                &self.config.output_log_file,
                &format!("{} | {}", chapter_id, outcome),
            );
        }

        logging::print_final_stats(
            report.success_count,
            report.total,
            &self.config.output_log_file,
        );
        Ok(report)
    }

    /// 列出章节
    pub async fn list_catalog(
        &self,
        standard: &str,
        subjects: &[String],
        paper_type: PaperType,
    ) -> AppResult<Vec<Chapter>> {
        check_taxonomy(standard, subjects);
        let chapters = self
            .resolver
            .resolve_or_empty(standard, subjects, paper_type)
            .await?;

        if chapters.is_empty() {
            info!("没有找到符合条件的章节");
        }
        for chapter in &chapters {
            let price = if chapter.is_free() {
                "免费".to_string()
            } else {
                format!("₹{:.2}", chapter.price)
            };
            info!("  {} | {} | {}", chapter.id, chapter, price);
        }
        Ok(chapters)
    }

    /// 查询下载历史
    pub async fn history(&self, email: &str) -> AppResult<Vec<DownloadRecord>> {
        let records = self.recorder.history(email).await?;
        info!("📜 {} 共 {} 条下载记录", email, records.len());
        for record in &records {
            let title = record
                .chapter
                .as_ref()
                .map(|c| c.title.as_str())
                .unwrap_or("(未知章节)");
            info!(
                "  #{} | {} | {} | {}",
                record.id,
                record.downloaded_at.format("%Y-%m-%d %H:%M"),
                record.chapter_id,
                title
            );
        }
        Ok(records)
    }

    /// 按记录重新交付
    pub async fn redeliver(&self, email: &str, record_id: &str) -> AppResult<PathBuf> {
        let records = self.recorder.history(email).await?;
        let record = records
            .iter()
            .find(|r| r.id == record_id)
            .ok_or_else(|| AppError::Other(format!("找不到下载记录 {} ({})", record_id, email)))?;
        let path = self.controller.redeliver(record).await?;
        info!("✅ 已重新交付: {}", path.display());
        Ok(path)
    }
}

/// 年级 / 科目不在固定目录中时只提示，不阻止查询
fn check_taxonomy(standard: &str, subjects: &[String]) {
    match Standard::from_id(standard) {
        Some(known) => {
            for subject in subjects {
                if !known.has_subject(subject) {
                    warn!("⚠️  科目 {} 不属于 {}", subject, known);
                }
            }
        }
        None => warn!("⚠️  未知年级: {}", standard),
    }
}
