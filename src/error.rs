//! 错误类型
//!
//! 按照能力划分错误：目录查询、支付、文档、下载记录、配置、输入校验。
//! 所有错误最终汇总到 [`AppError`]，调用方通过 [`AppResult`] 传播。

use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 目录查询错误
    #[error("目录错误: {0}")]
    Catalog(#[from] CatalogError),
    /// 支付相关错误
    #[error("支付错误: {0}")]
    Payment(#[from] PaymentError),
    /// 文档加载 / 盖章错误
    #[error("文档错误: {0}")]
    Document(#[from] DocumentError),
    /// 下载记录错误
    #[error("记录错误: {0}")]
    Record(#[from] RecordError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 输入校验错误
    #[error("输入错误: {0}")]
    Validation(#[from] ValidationError),
    /// 文件操作错误
    #[error("文件错误 ({path}): {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 其他错误（用于包装第三方库错误）
    #[error("错误: {0}")]
    Other(String),
}

/// 目录查询错误
#[derive(Debug, Error)]
pub enum CatalogError {
    /// 后端不可达（可恢复，调用方降级为空列表）
    #[error("目录后端不可达 ({endpoint}): {message}")]
    Unavailable { endpoint: String, message: String },
    /// 返回数据无法解析
    #[error("目录数据解析失败: {0}")]
    BadPayload(String),
}

/// 支付相关错误
#[derive(Debug, Error)]
pub enum PaymentError {
    /// 创建订单失败（金额非法、字段缺失、网关错误）
    #[error("创建订单失败 (章节: {chapter_id}): {reason}")]
    OrderCreationFailed { chapter_id: String, reason: String },
    /// 签名校验失败
    #[error("支付校验失败 (订单: {order_id}): {reason}")]
    VerificationFailed { order_id: String, reason: String },
    /// 收银台无法打开
    #[error("无法打开收银台 (订单: {order_id}): {reason}")]
    CheckoutUnavailable { order_id: String, reason: String },
}

/// 文档错误
#[derive(Debug, Error)]
pub enum DocumentError {
    /// 源文档无法获取或解析（盖章唯一的致命错误）
    #[error("源文档加载失败 ({source_ref}): {reason}")]
    LoadFailed { source_ref: String, reason: String },
    /// 盖章结果无法写出
    #[error("文档保存失败: {0}")]
    SaveFailed(String),
}

/// 下载记录错误
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("写入下载记录失败: {0}")]
    WriteFailed(String),
    #[error("查询下载记录失败: {0}")]
    QueryFailed(String),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 配置文件解析失败
    #[error("配置文件解析失败 ({path}): {message}")]
    FileParseFailed { path: String, message: String },
    /// 缺少必填项
    #[error("缺少配置项: {0}")]
    Missing(String),
}

/// 输入校验错误
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("未选择任何章节")]
    EmptySelection,
    #[error("未选择年级")]
    EmptyStandard,
    #[error("未选择科目")]
    EmptySubjects,
    #[error("字段 {0} 不能为空")]
    MissingField(&'static str),
    #[error("学校名称至少需要 {min} 个字符 (当前 {actual})")]
    InstitutionNameTooShort { min: usize, actual: usize },
    #[error("邮箱格式不正确: {0}")]
    InvalidEmail(String),
    #[error("金额必须大于 0 (当前 {0})")]
    InvalidAmount(f64),
}

// ========== 从常见错误类型转换 ==========

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::File {
            path: String::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Other(format!("JSON 解析失败: {}", err))
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::Config(ConfigError::FileParseFailed {
            path: String::new(), // TOML错误通常不包含路径信息
            message: err.to_string(),
        })
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Other(format!("HTTP 请求失败: {}", err))
    }
}

impl From<lopdf::Error> for AppError {
    fn from(err: lopdf::Error) -> Self {
        AppError::Document(DocumentError::SaveFailed(err.to_string()))
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件读写错误
    pub fn file(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File {
            path: path.into(),
            source,
        }
    }

    /// 创建订单失败错误
    pub fn order_failed(chapter_id: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::Payment(PaymentError::OrderCreationFailed {
            chapter_id: chapter_id.into(),
            reason: reason.into(),
        })
    }

    /// 创建支付校验失败错误
    pub fn verification_failed(order_id: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::Payment(PaymentError::VerificationFailed {
            order_id: order_id.into(),
            reason: reason.into(),
        })
    }

    /// 创建文档加载失败错误
    pub fn document_load_failed(source_ref: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::Document(DocumentError::LoadFailed {
            source_ref: source_ref.into(),
            reason: reason.into(),
        })
    }

    /// 创建目录不可达错误
    pub fn catalog_unavailable(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Catalog(CatalogError::Unavailable {
            endpoint: endpoint.into(),
            message: message.into(),
        })
    }

    /// 是否为可降级的目录不可达错误
    pub fn is_catalog_unavailable(&self) -> bool {
        matches!(self, AppError::Catalog(CatalogError::Unavailable { .. }))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
