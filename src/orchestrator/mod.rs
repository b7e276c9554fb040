//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批次处理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 应用入口
//! - 管理应用生命周期（初始化、运行）
//! - 组装存储、支付网关、收银台和盖章服务
//! - 加载批次请求，取目录快照
//! - 输出全局统计信息
//!
//! ### `fulfillment` - 批次交付控制器
//! - 按选择顺序遍历章节（`Vec<String>`）
//! - 复用同一个 ChapterFlow
//! - 单个章节失败不影响其他章节
//! - 汇总每个章节的结果
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (App：加载请求、目录快照)
//!     ↓
//! fulfillment (处理 Vec<章节 id>)
//!     ↓
//! workflow::ChapterFlow (处理单个章节)
//!     ↓
//! services (能力层：支付 / 盖章 / 写文件 / 记录)
//!     ↓
//! clients + infrastructure (存储、网关、收银台)
//! ```

pub mod batch_processor;
pub mod fulfillment;

// 重新导出主要类型
pub use batch_processor::App;
pub use fulfillment::{BatchFulfillmentController, FulfillmentReport};
