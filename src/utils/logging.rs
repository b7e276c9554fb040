/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use crate::error::{AppError, AppResult};
use std::fs::{self, OpenOptions};
use std::io::Write;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// 初始化 tracing 日志（可重复调用，只有第一次生效）
///
/// 未设置 `RUST_LOG` 时：`verbose` 为真用 debug，否则用 info。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_target(false).try_init();
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> AppResult<()> {
    let log_header = format!(
        "{}\n资料下载处理日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header).map_err(|e| AppError::file(log_file_path, e))?;
    Ok(())
}

/// 向日志文件追加一行
///
/// 写入失败只记 debug，不影响交付
pub fn append_log_line(log_file_path: &str, line: &str) {
    let result = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)
        .and_then(|mut file| writeln!(file, "{}", line));
    if let Err(e) = result {
        debug!("写入日志文件失败 ({}): {}", log_file_path, e);
    }
}

/// 记录程序启动信息
pub fn log_startup(gateway_mode: &str, output_folder: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 顺序下载处理模式");
    info!("💳 支付网关: {}", gateway_mode);
    info!("📁 输出目录: {}", output_folder);
    info!("{}", "=".repeat(60));
}

/// 记录批次开始信息
///
/// # 参数
/// - `total`: 选中章节数
/// - `total_price`: 总价
pub fn log_batch_start(total: usize, total_price: f64) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始处理本次提交: 共 {} 个章节", total);
    if total_price > 0.0 {
        info!("💰 应付总额: ₹{:.2}", total_price);
    } else {
        info!("🎁 全部免费");
    }
    info!("{}", "=".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `success`: 成功数量
/// - `total`: 总数
/// - `log_file_path`: 日志文件路径
pub fn print_final_stats(success: usize, total: usize, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!("完成时间: {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", success, total);
    info!("❌ 失败: {}", total - success);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text_counts_chars() {
        assert_eq!(truncate_text("abc", 5), "abc");
        assert_eq!(truncate_text("विज्ञान भाग", 3), "विज्...");
    }

    #[test]
    fn test_append_log_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.txt");
        let path = path.to_str().unwrap();
        init_log_file(path).unwrap();
        append_log_line(path, "c1 | 已交付");
        append_log_line(path, "c2 | 用户取消支付");

        let content = fs::read_to_string(path).unwrap();
        assert!(content.contains("资料下载处理日志"));
        assert!(content.ends_with("c1 | 已交付\nc2 | 用户取消支付\n"));
    }
}
