use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use paper_fulfillment::utils::logging;
use paper_fulfillment::{App, Config, PaperType};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "paper-fulfillment", version, about = "试卷 PDF 交付工具")]
struct Cli {
    /// 配置文件（TOML，可选；环境变量优先）
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 按批次请求文件支付并交付
    Fulfill {
        #[arg(short, long)]
        request: PathBuf,
    },
    /// 列出目录中的章节
    Catalog {
        #[arg(long)]
        standard: String,
        #[arg(long = "subject", required = true)]
        subjects: Vec<String>,
        #[arg(long, default_value = "question")]
        paper_type: String,
    },
    /// 查询下载历史
    History {
        #[arg(long)]
        email: String,
    },
    /// 按下载记录重新交付
    Redeliver {
        #[arg(long)]
        email: String,
        #[arg(long)]
        record_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置
    let config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("无法加载配置文件 {}", path.display()))?,
        None => Config::from_env(),
    };

    // 初始化日志
    logging::init(config.verbose_logging);

    let app = App::initialize(config).await.context("应用初始化失败")?;

    match cli.command {
        Command::Fulfill { request } => {
            let report = app
                .run_batch(&request)
                .await
                .with_context(|| format!("处理批次请求 {} 失败", request.display()))?;
            if report.success_count == 0 {
                bail!("没有任何章节交付成功");
            }
        }
        Command::Catalog {
            standard,
            subjects,
            paper_type,
        } => {
            let Some(paper_type) = PaperType::parse(&paper_type) else {
                bail!("未知的试卷类型: {}", paper_type);
            };
            app.list_catalog(&standard, &subjects, paper_type).await?;
        }
        Command::History { email } => {
            app.history(&email).await?;
        }
        Command::Redeliver { email, record_id } => {
            app.redeliver(&email, &record_id).await?;
        }
    }

    Ok(())
}
