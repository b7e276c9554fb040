use crate::error::{AppError, AppResult, ConfigError};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// 支付网关接入方式
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayMode {
    /// 通过托管的 create-order / verify 函数（密钥不在本进程）
    Http,
    /// 本进程即可信端：直接调用支付商 API 并本地校验签名
    Direct,
}

impl GatewayMode {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "http" => Some(GatewayMode::Http),
            "direct" => Some(GatewayMode::Direct),
            _ => None,
        }
    }
}

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- 目录 / 下载记录存储 ---
    /// 存储 REST 接口地址（chapters / user_downloads 两张表）
    pub store_api_base_url: String,
    pub store_api_key: String,
    // --- 支付配置 ---
    pub gateway_mode: GatewayMode,
    /// 托管函数地址（Http 模式）
    pub functions_base_url: String,
    /// 支付商 API 地址（Direct 模式）
    pub razorpay_api_base_url: String,
    pub razorpay_key_id: String,
    pub razorpay_key_secret: String,
    // --- 输出 ---
    /// 盖章后 PDF 的输出目录
    pub output_folder: String,
    /// 输出日志文件
    pub output_log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- 渲染 ---
    /// 天城文字体路径（为空时通过系统字体查找）
    pub devanagari_font_path: Option<String>,
    /// 是否加载系统字体
    pub load_system_fonts: bool,
    /// HTTP 请求超时（秒）
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_api_base_url: "http://localhost:54321".to_string(),
            store_api_key: String::new(),
            gateway_mode: GatewayMode::Http,
            functions_base_url: "http://localhost:54321/functions/v1".to_string(),
            razorpay_api_base_url: "https://api.razorpay.com/v1".to_string(),
            razorpay_key_id: String::new(),
            razorpay_key_secret: String::new(),
            output_folder: "output_pdf".to_string(),
            output_log_file: "output.txt".to_string(),
            verbose_logging: false,
            devanagari_font_path: None,
            load_system_fonts: true,
            request_timeout_secs: 30,
        }
    }
}

impl Config {
    /// 默认配置 + 环境变量覆盖
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件加载，缺省字段取默认值，再叠加环境变量
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| AppError::file(path.display().to_string(), e))?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            AppError::Config(ConfigError::FileParseFailed {
                path: path.display().to_string(),
                message: e.to_string(),
            })
        })?;
        Ok(config.with_env_overrides())
    }

    /// 用环境变量覆盖已有值
    pub fn with_env_overrides(self) -> Self {
        let env = |name: &str| std::env::var(name).ok();
        Self {
            store_api_base_url: env("STORE_API_BASE_URL").unwrap_or(self.store_api_base_url),
            store_api_key: env("STORE_API_KEY").unwrap_or(self.store_api_key),
            gateway_mode: env("GATEWAY_MODE").and_then(|v| GatewayMode::parse(&v)).unwrap_or(self.gateway_mode),
            functions_base_url: env("FUNCTIONS_BASE_URL").unwrap_or(self.functions_base_url),
            razorpay_api_base_url: env("RAZORPAY_API_BASE_URL").unwrap_or(self.razorpay_api_base_url),
            razorpay_key_id: env("RAZORPAY_KEY_ID").unwrap_or(self.razorpay_key_id),
            razorpay_key_secret: env("RAZORPAY_KEY_SECRET").unwrap_or(self.razorpay_key_secret),
            output_folder: env("OUTPUT_FOLDER").unwrap_or(self.output_folder),
            output_log_file: env("OUTPUT_LOG_FILE").unwrap_or(self.output_log_file),
            verbose_logging: env("VERBOSE_LOGGING").and_then(|v| v.parse().ok()).unwrap_or(self.verbose_logging),
            devanagari_font_path: env("DEVANAGARI_FONT_PATH").or(self.devanagari_font_path),
            load_system_fonts: env("LOAD_SYSTEM_FONTS").and_then(|v| v.parse().ok()).unwrap_or(self.load_system_fonts),
            request_timeout_secs: env("REQUEST_TIMEOUT_SECS").and_then(|v| v.parse().ok()).unwrap_or(self.request_timeout_secs),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Direct 模式下必须同时配置 key id 与 secret
    pub fn require_gateway_credentials(&self) -> AppResult<(&str, &str)> {
        if self.razorpay_key_id.is_empty() {
            return Err(ConfigError::Missing("RAZORPAY_KEY_ID".to_string()).into());
        }
        if self.razorpay_key_secret.is_empty() {
            return Err(ConfigError::Missing("RAZORPAY_KEY_SECRET".to_string()).into());
        }
        Ok((&self.razorpay_key_id, &self.razorpay_key_secret))
    }
}
