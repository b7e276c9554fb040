//! # Paper Fulfillment
//!
//! 试卷 PDF 商店的交付流水线：目录解析 → 支付 → 盖章 → 保存 → 下载记录
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（收银台），只暴露能力
//! - `CheckoutGate` - 全局唯一的收银台闸门
//! - `CheckoutSurface` / `ConsoleCheckout` - 收银台本身
//!
//! ### ② 业务能力层（Services + Clients）
//! - `clients/` - 目录 / 下载记录存储、源文档、支付网关
//! - `services/` - 描述"我能做什么"，只处理单个章节
//! - `CatalogResolver` - 目录解析能力
//! - `PaymentOrchestrator` / `PaymentVerifier` - 支付与签名校验能力
//! - `WatermarkRenderer` - 盖章能力
//! - `ArtifactWriter` / `DownloadRecorder` - 写文件、记一笔
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个章节"的完整交付流程
//! - `ChapterCtx` - 上下文封装（章节 id + 序号）
//! - `ChapterFlow` - 流程编排（支付 → 盖章 → 保存 → 记录）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 应用入口，组装资源
//! - `orchestrator/fulfillment` - 批次交付控制器，遍历选中章节
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{Config, GatewayMode};
pub use error::{AppError, AppResult};
pub use models::{Chapter, DownloadRecord, PaperType, UserInfo};
pub use orchestrator::{App, BatchFulfillmentController, FulfillmentReport};
pub use services::{PaymentVerifier, WatermarkRenderer};
pub use workflow::{ChapterCtx, ChapterFlow, ChapterOutcome};
